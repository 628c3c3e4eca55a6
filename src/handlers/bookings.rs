use std::sync::Arc;

use axum::extract::{Path, State};
use axum::http::HeaderMap;
use axum::Json;

use crate::db::queries;
use crate::errors::AppError;
use crate::handlers::auth::require_user;
use crate::models::booking::SENTENCE_DATETIME_FORMAT;
use crate::models::{Booking, NewBooking};
use crate::state::AppState;

// GET /my-bookings
pub async fn my_bookings(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
) -> Result<Json<Vec<Booking>>, AppError> {
    let user = require_user(&state, &headers)?;
    let conn = state.conn()?;
    let bookings = queries::get_bookings_for_owner(&conn, Some(user.id))?;
    Ok(Json(bookings))
}

// GET /bookings
pub async fn list_bookings(
    State(state): State<Arc<AppState>>,
) -> Result<Json<Vec<Booking>>, AppError> {
    let conn = state.conn()?;
    Ok(Json(queries::get_all_bookings(&conn)?))
}

// GET /bookings/:id
pub async fn get_booking(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i64>,
) -> Result<Json<Booking>, AppError> {
    let conn = state.conn()?;
    queries::get_booking_by_id(&conn, id)?
        .map(Json)
        .ok_or_else(|| AppError::NotFound("Booking not found".to_string()))
}

// POST /bookings
pub async fn create_booking(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Json(body): Json<NewBooking>,
) -> Result<Json<Booking>, AppError> {
    let user = require_user(&state, &headers)?;

    let conn = state.conn()?;
    if queries::technician_booked_at(&conn, &body.technician_name, &body.booking_datetime)? {
        return Err(AppError::BadRequest(format!(
            "Technician {} is already booked at {}",
            body.technician_name,
            body.booking_datetime.format(SENTENCE_DATETIME_FORMAT)
        )));
    }

    let booking = queries::create_booking(&conn, &body, Some(user.id))?;
    tracing::info!(booking_id = booking.id, user_id = user.id, "booking created");
    Ok(Json(booking))
}

// DELETE /bookings/:id
pub async fn delete_booking(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Path(id): Path<i64>,
) -> Result<Json<serde_json::Value>, AppError> {
    let user = require_user(&state, &headers)?;

    let conn = state.conn()?;
    if queries::get_owned_booking(&conn, id, Some(user.id))?.is_none() {
        return Err(AppError::NotFound(
            "Booking not found for the current user".to_string(),
        ));
    }
    queries::delete_booking(&conn, id)?;
    tracing::info!(booking_id = id, user_id = user.id, "booking deleted");

    Ok(Json(serde_json::json!({"detail": format!("Booking ID {id} cancelled")})))
}
