use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

use crate::{
    appointments::repo_types::Appointment,
    auth::{
        dto::{FormView, PublicUser},
        session::{Flash, Identity},
    },
};

/// `POST /book/:doctor_id` form body.
#[derive(Debug, Default, Deserialize)]
pub struct BookForm {
    #[serde(default)]
    pub date: String, // YYYY-MM-DD
    #[serde(default)]
    pub time: String, // HH:MM
}

#[derive(Debug, Serialize)]
pub struct AppointmentView {
    pub id: i64,
    pub doctor_id: i64,
    pub patient_name: String,
    pub date: String,
    pub time: String,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
}

impl From<Appointment> for AppointmentView {
    fn from(a: Appointment) -> Self {
        Self {
            id: a.id,
            doctor_id: a.doctor_id,
            patient_name: a.patient_name,
            date: a.date.to_string(),
            time: format!("{:02}:{:02}", a.time.hour(), a.time.minute()),
            created_at: a.created_at,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct BookingView {
    pub doctor: PublicUser,
    #[serde(flatten)]
    pub form: FormView,
}

#[derive(Debug, Serialize)]
pub struct DashboardView {
    pub identity: Identity,
    pub appointments: Vec<AppointmentView>,
    pub flashes: Vec<Flash>,
}
