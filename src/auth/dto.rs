use serde::{Deserialize, Serialize};

use crate::auth::{
    repo_types::{Role, User},
    session::{Flash, Identity},
};

/// `POST /register` form body. `is_doctor` counts as set when present at all.
#[derive(Debug, Default, Deserialize)]
pub struct RegisterForm {
    #[serde(default)]
    pub username: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub password: String,
    pub is_doctor: Option<String>,
}

impl RegisterForm {
    pub fn role(&self) -> Role {
        Role::from(self.is_doctor.is_some())
    }
}

/// `POST /login` form body.
#[derive(Debug, Default, Deserialize)]
pub struct LoginForm {
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub password: String,
}

/// Describes a form the client should render and submit.
#[derive(Debug, Serialize)]
pub struct FormView {
    pub form: &'static str,
    pub action: String,
    pub fields: &'static [&'static str],
    pub flashes: Vec<Flash>,
}

/// Public part of a user returned to the client.
#[derive(Debug, Serialize)]
pub struct PublicUser {
    pub id: i64,
    pub username: String,
    pub role: Role,
}

impl From<User> for PublicUser {
    fn from(u: User) -> Self {
        Self {
            id: u.id,
            username: u.username,
            role: u.role,
        }
    }
}

/// Landing page: the doctor directory.
#[derive(Debug, Serialize)]
pub struct IndexView {
    pub identity: Option<Identity>,
    pub doctors: Vec<PublicUser>,
    pub flashes: Vec<Flash>,
}
