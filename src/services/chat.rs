use chrono::{Local, NaiveDateTime};

use crate::db::queries;
use crate::models::booking::{DETAILS_DATETIME_FORMAT, SENTENCE_DATETIME_FORMAT};
use crate::models::{ActionType, Booking, BookingAction, MessageContent, NewBooking};
use crate::services::ai::intent::{extract_action, parse_requested_datetime};
use crate::services::ai::assistant;
use crate::services::scheduling::{validate_booking_time, BusinessHours, SchedulingError};
use crate::state::AppState;

/// Interprets one chat message for `owner` (`None` = anonymous caller) and
/// performs the resulting booking action. Never fails: any error becomes an
/// `Error` reply.
pub async fn process_message(state: &AppState, owner: Option<i64>, message: &str) -> MessageContent {
    let now = Local::now().naive_local();
    match handle_message(state, owner, message, now).await {
        Ok(reply) => reply,
        Err(e) => {
            tracing::error!(error = %e, "chat processing failed");
            MessageContent::error(format!("Sorry, I couldn't process that request: {e}"))
        }
    }
}

async fn handle_message(
    state: &AppState,
    owner: Option<i64>,
    message: &str,
    now: NaiveDateTime,
) -> anyhow::Result<MessageContent> {
    let hours = BusinessHours::new(
        state.config.business_hours_start,
        state.config.business_hours_end,
    );

    let bookings = {
        let conn = state.conn()?;
        queries::get_bookings_for_owner(&conn, owner)?
    };
    let context = build_context(&now, &hours, &bookings);

    let action = match extract_action(state.llm.as_ref(), &context, message).await {
        Ok(action) => action.unwrap_or_default(),
        Err(e) => {
            tracing::warn!(error = %e, "intent extraction failed, falling back to general answer");
            BookingAction::default()
        }
    };

    let Some(action_type) = action.action_type else {
        let answer = assistant::answer(state.llm.as_ref(), &context, message).await?;
        return Ok(MessageContent::markdown(answer));
    };

    tracing::info!(owner = ?owner, action = ?action_type, "processing booking action");

    match action_type {
        ActionType::CancelBooking => cancel_booking(state, owner, &action),
        ActionType::GetBookingId => get_booking(state, owner, &action),
        ActionType::NewBooking => new_booking(state, owner, &action, &now, &hours),
        ActionType::EditBooking => edit_booking(state, owner, &action, &now, &hours),
        ActionType::ListBookings => Ok(list_bookings(&bookings)),
    }
}

fn build_context(now: &NaiveDateTime, hours: &BusinessHours, bookings: &[Booking]) -> String {
    let listing = if bookings.is_empty() {
        "(none)".to_string()
    } else {
        bookings
            .iter()
            .map(|b| {
                format!(
                    "- id {}: {} with {} at {}",
                    b.id,
                    b.service,
                    b.technician_name,
                    b.booking_datetime.format(DETAILS_DATETIME_FORMAT)
                )
            })
            .collect::<Vec<_>>()
            .join("\n")
    };

    format!(
        "Current date and time is: {}\nBusiness hours: {}\nUser's bookings:\n{}",
        now.format("%Y-%m-%d %H:%M:%S"),
        hours.to_human_readable(),
        listing
    )
}

fn requested_datetime(action: &BookingAction) -> Option<NaiveDateTime> {
    action
        .booking_datetime
        .as_deref()
        .and_then(parse_requested_datetime)
}

fn non_empty(value: &Option<String>) -> Option<String> {
    value
        .as_deref()
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
}

fn cancel_booking(
    state: &AppState,
    owner: Option<i64>,
    action: &BookingAction,
) -> anyhow::Result<MessageContent> {
    let Some(id) = action.booking_id else {
        return Ok(MessageContent::text("No booking ID provided in cancellation command."));
    };

    let conn = state.conn()?;
    if queries::get_owned_booking(&conn, id, owner)?.is_none() {
        return Ok(MessageContent::text(format!(
            "Booking ID {id} not found for the current user"
        )));
    }
    queries::delete_booking(&conn, id)?;
    tracing::info!(booking_id = id, "booking cancelled via chat");

    Ok(MessageContent::text(format!("Booking ID {id} cancelled")))
}

fn get_booking(
    state: &AppState,
    owner: Option<i64>,
    action: &BookingAction,
) -> anyhow::Result<MessageContent> {
    let conn = state.conn()?;
    let found = match action.booking_id {
        Some(id) => queries::get_owned_booking(&conn, id, owner)?,
        None => queries::get_latest_booking_for_owner(&conn, owner)?,
    };

    Ok(match (found, action.booking_id) {
        (Some(booking), _) => MessageContent::booking(None, booking.to_details()),
        (None, Some(_)) => MessageContent::text("No booking found with that ID."),
        (None, None) => MessageContent::text("No bookings found."),
    })
}

fn new_booking(
    state: &AppState,
    owner: Option<i64>,
    action: &BookingAction,
    now: &NaiveDateTime,
    hours: &BusinessHours,
) -> anyhow::Result<MessageContent> {
    let (Some(service), Some(booking_datetime)) = (non_empty(&action.service), requested_datetime(action))
    else {
        return Ok(MessageContent::text(
            "Could not determine service type or time for booking.",
        ));
    };
    let technician_name = non_empty(&action.technician_name).unwrap_or_else(|| service.clone());

    let conn = state.conn()?;
    match validate_booking_time(&conn, &technician_name, &booking_datetime, now, hours, None) {
        Ok(()) => {}
        Err(SchedulingError::Store(e)) => anyhow::bail!(e),
        Err(e) => return Ok(MessageContent::text(e.to_string())),
    }

    let booking = queries::create_booking(
        &conn,
        &NewBooking {
            technician_name,
            service,
            booking_datetime,
        },
        owner,
    )?;
    tracing::info!(booking_id = booking.id, technician = %booking.technician_name, "booking created via chat");

    Ok(MessageContent::booking(
        Some("Booking confirmed:".to_string()),
        booking.to_details(),
    ))
}

fn edit_booking(
    state: &AppState,
    owner: Option<i64>,
    action: &BookingAction,
    now: &NaiveDateTime,
    hours: &BusinessHours,
) -> anyhow::Result<MessageContent> {
    let (Some(id), Some(new_datetime)) = (action.booking_id, requested_datetime(action)) else {
        return Ok(MessageContent::text(
            "Missing booking ID or new datetime for editing.",
        ));
    };

    let conn = state.conn()?;
    let Some(mut booking) = queries::get_owned_booking(&conn, id, owner)? else {
        return Ok(MessageContent::text(format!(
            "No booking found with ID {id} for the current user."
        )));
    };

    match validate_booking_time(&conn, &booking.technician_name, &new_datetime, now, hours, Some(id)) {
        Ok(()) => {}
        Err(SchedulingError::InPast { .. }) => {
            return Ok(MessageContent::text("Cannot set booking to a past time."));
        }
        Err(SchedulingError::Store(e)) => anyhow::bail!(e),
        Err(e) => return Ok(MessageContent::text(e.to_string())),
    }

    queries::update_booking_datetime(&conn, id, &new_datetime)?;
    booking.booking_datetime = new_datetime;
    tracing::info!(booking_id = id, "booking moved via chat");

    Ok(MessageContent::booking(
        Some(format!(
            "Booking {id} updated to {}",
            new_datetime.format(SENTENCE_DATETIME_FORMAT)
        )),
        booking.to_details(),
    ))
}

fn list_bookings(bookings: &[Booking]) -> MessageContent {
    if bookings.is_empty() {
        return MessageContent::text("No bookings found.");
    }

    let mut text = String::from("Here are your bookings:\n\n");
    for b in bookings {
        text.push_str(&format!(
            "- **#{}** {} with {} on {}\n",
            b.id,
            b.service,
            b.technician_name,
            b.booking_datetime.format(DETAILS_DATETIME_FORMAT)
        ));
    }
    MessageContent::markdown(text)
}
