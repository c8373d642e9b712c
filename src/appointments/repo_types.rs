use sqlx::FromRow;
use time::{Date, OffsetDateTime, Time};

/// Appointment record in the database.
#[derive(Debug, Clone, FromRow)]
pub struct Appointment {
    pub id: i64,
    pub doctor_id: i64,
    pub patient_name: String, // snapshot, not a reference to a user
    pub date: Date,
    pub time: Time,
    pub created_at: OffsetDateTime,
}
