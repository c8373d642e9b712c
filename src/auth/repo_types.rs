use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// Account role, stored as the `is_doctor` flag.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Patient,
    Doctor,
}

impl Role {
    pub fn is_doctor(self) -> bool {
        matches!(self, Role::Doctor)
    }
}

impl From<bool> for Role {
    fn from(is_doctor: bool) -> Self {
        if is_doctor {
            Role::Doctor
        } else {
            Role::Patient
        }
    }
}

/// Raw `users` row.
#[derive(Debug, FromRow)]
pub struct UserRow {
    pub id: i64,
    pub username: String,
    pub email: String,
    pub password_hash: String,
    pub is_doctor: bool,
}

/// User record in the database.
#[derive(Debug, Clone, Serialize)]
pub struct User {
    pub id: i64,
    pub username: String,
    pub email: String,
    #[serde(skip_serializing)]
    pub password_hash: String, // argon2 PHC string
    pub role: Role,
}

impl From<UserRow> for User {
    fn from(r: UserRow) -> Self {
        Self {
            id: r.id,
            username: r.username,
            email: r.email,
            password_hash: r.password_hash,
            role: Role::from(r.is_doctor),
        }
    }
}
