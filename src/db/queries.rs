use chrono::NaiveDateTime;
use rusqlite::{params, Connection, OptionalExtension, Row};

use crate::models::{Booking, NewBooking, User};

const DB_DATETIME_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

const BOOKING_COLUMNS: &str = "id, service, technician_name, booking_datetime, user_id";

fn format_dt(dt: &NaiveDateTime) -> String {
    dt.format(DB_DATETIME_FORMAT).to_string()
}

// ── Users ──

pub fn create_user(conn: &Connection, username: &str, hashed_password: &str) -> anyhow::Result<User> {
    conn.execute(
        "INSERT INTO users (username, hashed_password) VALUES (?1, ?2)",
        params![username, hashed_password],
    )?;
    Ok(User {
        id: conn.last_insert_rowid(),
        username: username.to_string(),
        hashed_password: hashed_password.to_string(),
    })
}

pub fn get_user_by_username(conn: &Connection, username: &str) -> anyhow::Result<Option<User>> {
    let user = conn
        .query_row(
            "SELECT id, username, hashed_password FROM users WHERE username = ?1",
            params![username],
            |row| {
                Ok(User {
                    id: row.get(0)?,
                    username: row.get(1)?,
                    hashed_password: row.get(2)?,
                })
            },
        )
        .optional()?;
    Ok(user)
}

// ── Bookings ──

fn parse_booking_row(row: &Row<'_>) -> rusqlite::Result<Booking> {
    let dt_str: String = row.get(3)?;
    let booking_datetime = NaiveDateTime::parse_from_str(&dt_str, DB_DATETIME_FORMAT).map_err(|e| {
        rusqlite::Error::FromSqlConversionFailure(3, rusqlite::types::Type::Text, Box::new(e))
    })?;

    Ok(Booking {
        id: row.get(0)?,
        service: row.get(1)?,
        technician_name: row.get(2)?,
        booking_datetime,
        user_id: row.get(4)?,
    })
}

fn query_bookings<P: rusqlite::Params>(
    conn: &Connection,
    sql: &str,
    params: P,
) -> anyhow::Result<Vec<Booking>> {
    let mut stmt = conn.prepare(sql)?;
    let rows = stmt.query_map(params, parse_booking_row)?;

    let mut bookings = vec![];
    for row in rows {
        bookings.push(row?);
    }
    Ok(bookings)
}

pub fn create_booking(
    conn: &Connection,
    booking: &NewBooking,
    owner: Option<i64>,
) -> anyhow::Result<Booking> {
    conn.execute(
        "INSERT INTO bookings (service, technician_name, booking_datetime, user_id)
         VALUES (?1, ?2, ?3, ?4)",
        params![
            booking.service,
            booking.technician_name,
            format_dt(&booking.booking_datetime),
            owner,
        ],
    )?;

    Ok(Booking {
        id: conn.last_insert_rowid(),
        service: booking.service.clone(),
        technician_name: booking.technician_name.clone(),
        booking_datetime: booking.booking_datetime,
        user_id: owner,
    })
}

pub fn get_all_bookings(conn: &Connection) -> anyhow::Result<Vec<Booking>> {
    query_bookings(
        conn,
        &format!("SELECT {BOOKING_COLUMNS} FROM bookings ORDER BY id ASC"),
        [],
    )
}

/// Bookings belonging to `owner`; `None` selects the unowned (anonymous) ones.
pub fn get_bookings_for_owner(conn: &Connection, owner: Option<i64>) -> anyhow::Result<Vec<Booking>> {
    query_bookings(
        conn,
        &format!(
            "SELECT {BOOKING_COLUMNS} FROM bookings WHERE user_id IS ?1 ORDER BY booking_datetime ASC"
        ),
        params![owner],
    )
}

pub fn get_booking_by_id(conn: &Connection, id: i64) -> anyhow::Result<Option<Booking>> {
    let booking = conn
        .query_row(
            &format!("SELECT {BOOKING_COLUMNS} FROM bookings WHERE id = ?1"),
            params![id],
            parse_booking_row,
        )
        .optional()?;
    Ok(booking)
}

pub fn get_owned_booking(
    conn: &Connection,
    id: i64,
    owner: Option<i64>,
) -> anyhow::Result<Option<Booking>> {
    let booking = conn
        .query_row(
            &format!("SELECT {BOOKING_COLUMNS} FROM bookings WHERE id = ?1 AND user_id IS ?2"),
            params![id, owner],
            parse_booking_row,
        )
        .optional()?;
    Ok(booking)
}

pub fn get_latest_booking_for_owner(
    conn: &Connection,
    owner: Option<i64>,
) -> anyhow::Result<Option<Booking>> {
    let booking = conn
        .query_row(
            &format!(
                "SELECT {BOOKING_COLUMNS} FROM bookings WHERE user_id IS ?1 ORDER BY id DESC LIMIT 1"
            ),
            params![owner],
            parse_booking_row,
        )
        .optional()?;
    Ok(booking)
}

pub fn delete_booking(conn: &Connection, id: i64) -> anyhow::Result<bool> {
    let count = conn.execute("DELETE FROM bookings WHERE id = ?1", params![id])?;
    Ok(count > 0)
}

pub fn update_booking_datetime(
    conn: &Connection,
    id: i64,
    booking_datetime: &NaiveDateTime,
) -> anyhow::Result<bool> {
    let count = conn.execute(
        "UPDATE bookings SET booking_datetime = ?1 WHERE id = ?2",
        params![format_dt(booking_datetime), id],
    )?;
    Ok(count > 0)
}

/// Exact-slot check used by the REST create endpoint.
pub fn technician_booked_at(
    conn: &Connection,
    technician_name: &str,
    booking_datetime: &NaiveDateTime,
) -> anyhow::Result<bool> {
    let exists: bool = conn.query_row(
        "SELECT COUNT(*) > 0 FROM bookings WHERE technician_name = ?1 AND booking_datetime = ?2",
        params![technician_name, format_dt(booking_datetime)],
        |row| row.get(0),
    )?;
    Ok(exists)
}

/// Bookings of one technician starting within `[start, end)`, optionally
/// skipping one booking (the one being edited).
pub fn get_technician_bookings_in_range(
    conn: &Connection,
    technician_name: &str,
    start: &NaiveDateTime,
    end: &NaiveDateTime,
    exclude_id: Option<i64>,
) -> anyhow::Result<Vec<Booking>> {
    query_bookings(
        conn,
        &format!(
            "SELECT {BOOKING_COLUMNS} FROM bookings
             WHERE technician_name = ?1 AND booking_datetime >= ?2 AND booking_datetime < ?3
               AND (?4 IS NULL OR id != ?4)
             ORDER BY booking_datetime ASC"
        ),
        params![technician_name, format_dt(start), format_dt(end), exclude_id],
    )
}

pub fn count_bookings(conn: &Connection) -> anyhow::Result<i64> {
    let count = conn.query_row("SELECT COUNT(*) FROM bookings", [], |row| row.get(0))?;
    Ok(count)
}

/// Inserts the demo bookings when the table is empty. Returns how many rows were added.
pub fn seed_bookings(conn: &Connection) -> anyhow::Result<usize> {
    if count_bookings(conn)? > 0 {
        return Ok(0);
    }

    let seeds = [
        ("Nicolas Woollett", "Plumber", "2022-10-15 10:00:00"),
        ("Franky Flay", "Electrician", "2022-10-16 18:00:00"),
        ("Griselda Dickson", "Welder", "2022-10-18 11:00:00"),
    ];

    for (technician, service, when) in seeds {
        let booking_datetime = NaiveDateTime::parse_from_str(when, DB_DATETIME_FORMAT)?;
        create_booking(
            conn,
            &NewBooking {
                technician_name: technician.to_string(),
                service: service.to_string(),
                booking_datetime,
            },
            None,
        )?;
    }

    Ok(seeds.len())
}
