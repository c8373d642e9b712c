use axum::{
    extract::State,
    response::Redirect,
    routing::get,
    Form, Json, Router,
};
use tracing::instrument;

use crate::{
    auth::{
        dto::{FormView, LoginForm, RegisterForm},
        repo_types::Role,
        services,
        session::{Flash, Session},
    },
    error::AppResult,
    state::AppState,
};

pub fn auth_routes() -> Router<AppState> {
    Router::new()
        .route("/register", get(register_form).post(register))
        .route("/login", get(login_form).post(login))
        .route("/logout", get(logout))
}

pub async fn register_form(mut session: Session) -> (Session, Json<FormView>) {
    let view = FormView {
        form: "register",
        action: "/register".into(),
        fields: &["username", "email", "password", "is_doctor"],
        flashes: session.take_flashes(),
    };
    (session, Json(view))
}

#[instrument(skip(state, session, form))]
pub async fn register(
    State(state): State<AppState>,
    mut session: Session,
    Form(form): Form<RegisterForm>,
) -> AppResult<(Session, Redirect)> {
    services::register(
        &state.db,
        &form.username,
        &form.email,
        &form.password,
        form.role(),
    )
    .await?;

    session.flash(Flash::success("Registered successfully!"));
    Ok((session, Redirect::to("/login")))
}

pub async fn login_form(mut session: Session) -> (Session, Json<FormView>) {
    let view = FormView {
        form: "login",
        action: "/login".into(),
        fields: &["email", "password"],
        flashes: session.take_flashes(),
    };
    (session, Json(view))
}

#[instrument(skip(state, session, form))]
pub async fn login(
    State(state): State<AppState>,
    mut session: Session,
    Form(form): Form<LoginForm>,
) -> AppResult<(Session, Redirect)> {
    let identity = services::login(&state.db, &form.email, &form.password).await?;

    let landing = match identity.role {
        Role::Doctor => "/doctor/dashboard",
        Role::Patient => "/",
    };
    session.log_in(identity);
    session.flash(Flash::success("Login successful!"));
    Ok((session, Redirect::to(landing)))
}

pub async fn logout(mut session: Session) -> (Session, Redirect) {
    services::logout(&mut session);
    session.flash(Flash::success("Logged out successfully!"));
    (session, Redirect::to("/"))
}
