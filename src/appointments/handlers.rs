use axum::{
    extract::{rejection::PathRejection, Path, State},
    response::{IntoResponse, Redirect, Response},
    routing::get,
    Form, Json, Router,
};
use tracing::instrument;

use crate::{
    appointments::{
        dto::{AppointmentView, BookForm, BookingView, DashboardView},
        services,
    },
    auth::{
        dto::{FormView, IndexView, PublicUser},
        repo_types::User,
        session::{Flash, Session},
    },
    error::{AppError, AppResult},
    state::AppState,
};

/// `/book/:doctor_id` only matches integer ids; anything else is a 404.
fn parse_doctor_id(path: Result<Path<i64>, PathRejection>) -> AppResult<i64> {
    path.map(|Path(id)| id).map_err(|_| AppError::NotFound)
}

pub fn appointment_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(index))
        .route("/book/:doctor_id", get(booking_form).post(book))
        .route("/doctor/dashboard", get(dashboard))
}

/// GET / — the doctor directory.
#[instrument(skip(state, session))]
pub async fn index(
    State(state): State<AppState>,
    mut session: Session,
) -> AppResult<(Session, Json<IndexView>)> {
    let doctors = User::list_doctors(&state.db).await?;
    let view = IndexView {
        identity: session.identity().cloned(),
        doctors: doctors.into_iter().map(PublicUser::from).collect(),
        flashes: session.take_flashes(),
    };
    Ok((session, Json(view)))
}

#[instrument(skip(state, session))]
pub async fn booking_form(
    State(state): State<AppState>,
    mut session: Session,
    path: Result<Path<i64>, PathRejection>,
) -> AppResult<(Session, Json<BookingView>)> {
    let doctor_id = parse_doctor_id(path)?;
    let doctor = services::get_doctor(&state.db, doctor_id).await?;
    let view = BookingView {
        doctor: doctor.into(),
        form: FormView {
            form: "book",
            action: format!("/book/{doctor_id}"),
            fields: &["date", "time"],
            flashes: session.take_flashes(),
        },
    };
    Ok((session, Json(view)))
}

#[instrument(skip(state, session, form))]
pub async fn book(
    State(state): State<AppState>,
    mut session: Session,
    path: Result<Path<i64>, PathRejection>,
    Form(form): Form<BookForm>,
) -> AppResult<(Session, Redirect)> {
    let doctor_id = parse_doctor_id(path)?;
    services::book_appointment(
        &state.db,
        doctor_id,
        &form.date,
        &form.time,
        session.identity(),
    )
    .await?;

    session.flash(Flash::success("Appointment booked successfully!"));
    Ok((session, Redirect::to("/")))
}

#[instrument(skip(state, session))]
pub async fn dashboard(
    State(state): State<AppState>,
    mut session: Session,
) -> AppResult<Response> {
    let result = services::doctor_dashboard(&state.db, session.identity()).await;
    match result {
        Ok(appointments) => {
            // doctor_dashboard only succeeds with an identity present
            let Some(identity) = session.identity().cloned() else {
                return Err(AppError::AccessDenied);
            };
            let view = DashboardView {
                identity,
                appointments: appointments.into_iter().map(AppointmentView::from).collect(),
                flashes: session.take_flashes(),
            };
            Ok((session, Json(view)).into_response())
        }
        Err(AppError::AccessDenied) => {
            session.flash(Flash::danger("Access denied"));
            Ok((session, Redirect::to("/")).into_response())
        }
        Err(e) => Err(e),
    }
}
