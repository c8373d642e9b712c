use sqlx::SqlitePool;
use time::{macros::format_description, Date, Time};
use tracing::{info, instrument, warn};

use crate::{
    appointments::repo_types::Appointment,
    auth::{repo_types::User, session::Identity},
    error::{AppError, AppResult},
};

/// Patient name recorded when nobody is logged in.
pub const ANONYMOUS_PATIENT: &str = "Anonymous";

/// Parse a `YYYY-MM-DD` date and an `HH:MM` time. Month, day, hour and
/// minute may drop their leading zero; the year must be unsigned.
pub fn parse_slot(date_str: &str, time_str: &str) -> AppResult<(Date, Time)> {
    let date_str = date_str.trim();
    let time_str = time_str.trim();
    let invalid_date =
        || AppError::Validation(format!("Invalid date '{date_str}', expected YYYY-MM-DD"));

    // stored dates sort as text, which only holds for years 0000..=9999
    if !date_str.starts_with(|c: char| c.is_ascii_digit()) {
        return Err(invalid_date());
    }
    let date = Date::parse(
        date_str,
        format_description!("[year]-[month padding:none]-[day padding:none]"),
    )
    .map_err(|_| invalid_date())?;
    let time = Time::parse(
        time_str,
        format_description!("[hour padding:none]:[minute padding:none]"),
    )
    .map_err(|_| AppError::Validation(format!("Invalid time '{time_str}', expected HH:MM")))?;
    Ok((date, time))
}

/// Resolve the target of a booking page.
pub async fn get_doctor(db: &SqlitePool, doctor_id: i64) -> AppResult<User> {
    Ok(User::get_by_id(db, doctor_id).await?)
}

/// Book a slot with `doctor_id` on behalf of whoever holds the session.
///
/// Looking up the doctor and inserting the row share one transaction, so a
/// failed lookup or a malformed slot leaves nothing behind. No overlap check
/// is made.
#[instrument(skip(db, identity))]
pub async fn book_appointment(
    db: &SqlitePool,
    doctor_id: i64,
    date_str: &str,
    time_str: &str,
    identity: Option<&Identity>,
) -> AppResult<Appointment> {
    let mut tx = db.begin().await.map_err(anyhow::Error::from)?;

    let doctor = User::get_by_id(&mut *tx, doctor_id).await.map_err(|e| {
        warn!(doctor_id, "booking for unknown doctor");
        AppError::from(e)
    })?;

    let patient_name = identity
        .map(|i| i.username.as_str())
        .unwrap_or(ANONYMOUS_PATIENT);

    let (date, time) = parse_slot(date_str, time_str)?;

    let appointment = Appointment::create(&mut *tx, doctor.id, patient_name, date, time).await?;
    tx.commit().await.map_err(anyhow::Error::from)?;

    info!(
        appointment_id = appointment.id,
        doctor_id = doctor.id,
        %patient_name,
        %date,
        "appointment booked"
    );
    Ok(appointment)
}

/// Appointments for the logged-in doctor. Anyone else is denied.
#[instrument(skip(db, identity))]
pub async fn doctor_dashboard(
    db: &SqlitePool,
    identity: Option<&Identity>,
) -> AppResult<Vec<Appointment>> {
    let doctor = match identity {
        Some(i) if i.role.is_doctor() => i,
        _ => {
            warn!(user_id = ?identity.map(|i| i.user_id), "dashboard access denied");
            return Err(AppError::AccessDenied);
        }
    };
    Ok(Appointment::list_by_doctor(db, doctor.user_id).await?)
}
