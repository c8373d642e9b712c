use lazy_static::lazy_static;
use regex::Regex;
use sqlx::SqlitePool;
use tracing::{info, instrument, warn};

use crate::{
    auth::{
        password::{hash_secret, verify_decoy, verify_secret},
        repo_types::{Role, User},
        session::{Identity, Session},
    },
    error::{AppError, AppResult, StoreError},
};

pub(crate) fn is_valid_email(email: &str) -> bool {
    lazy_static! {
        static ref EMAIL_RE: Regex = Regex::new(r"^[^@\s]+@[^@\s]+\.[^@\s]+$").unwrap();
    }
    EMAIL_RE.is_match(email)
}

pub(crate) fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

/// Create an account. The secret is hashed before it reaches the store.
#[instrument(skip(db, secret))]
pub async fn register(
    db: &SqlitePool,
    username: &str,
    email: &str,
    secret: &str,
    role: Role,
) -> AppResult<User> {
    let username = username.trim();
    let email = normalize_email(email);

    if username.is_empty() || email.is_empty() || secret.is_empty() {
        return Err(AppError::Validation(
            "Username, email and password are required".into(),
        ));
    }
    if !is_valid_email(&email) {
        warn!(%email, "invalid email");
        return Err(AppError::Validation("Invalid email".into()));
    }

    if User::find_by_email(db, &email).await?.is_some() {
        warn!(%email, "email already registered");
        return Err(AppError::EmailTaken);
    }

    let hash = hash_secret(secret)?;

    // The UNIQUE constraint still catches a concurrent registration.
    let user = User::create(db, username, &email, &hash, role)
        .await
        .map_err(|e| match e {
            StoreError::Uniqueness => {
                warn!(%email, "email registered concurrently");
                AppError::EmailTaken
            }
            other => other.into(),
        })?;

    info!(user_id = user.id, email = %user.email, role = ?user.role, "user registered");
    Ok(user)
}

/// Check credentials and return the identity to store in the session.
#[instrument(skip(db, secret))]
pub async fn login(db: &SqlitePool, email: &str, secret: &str) -> AppResult<Identity> {
    let email = normalize_email(email);
    if email.is_empty() || secret.is_empty() {
        return Err(AppError::Validation("Email and password are required".into()));
    }

    let Some(user) = User::find_by_email(db, &email).await? else {
        warn!(%email, "login unknown email");
        verify_decoy(secret);
        return Err(AppError::InvalidCredentials);
    };

    if !verify_secret(secret, &user.password_hash)? {
        warn!(%email, user_id = user.id, "login invalid password");
        return Err(AppError::InvalidCredentials);
    }

    info!(user_id = user.id, %email, "user logged in");
    Ok(Identity {
        user_id: user.id,
        username: user.username,
        role: user.role,
    })
}

pub fn logout(session: &mut Session) {
    if let Some(identity) = session.identity() {
        info!(user_id = identity.user_id, sid = %session.sid(), "user logged out");
    }
    session.log_out();
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db;

    #[test]
    fn email_validation() {
        assert!(is_valid_email("a@b.co"));
        assert!(!is_valid_email("no-at-sign.com"));
        assert!(!is_valid_email("spaces in@b.co"));
        assert_eq!(normalize_email("  Mixed@Case.Org "), "mixed@case.org");
    }

    #[tokio::test]
    async fn each_registration_can_log_in() {
        let db = db::in_memory().await;
        let accounts = [
            ("alice", "alice@clinic.test", "pw-alice", Role::Patient),
            ("bob", "bob@clinic.test", "pw-bob", Role::Doctor),
            ("carol", "carol@clinic.test", "pw-carol", Role::Patient),
        ];
        for (name, email, secret, role) in accounts {
            register(&db, name, email, secret, role).await.expect("register");
        }
        for (name, email, secret, role) in accounts {
            let identity = login(&db, email, secret).await.expect("login");
            assert_eq!(identity.username, name);
            assert_eq!(identity.role, role);
        }
    }

    #[tokio::test]
    async fn wrong_secret_and_unknown_email_look_the_same() {
        let db = db::in_memory().await;
        register(&db, "alice", "alice@clinic.test", "right", Role::Patient)
            .await
            .expect("register");

        let wrong = login(&db, "alice@clinic.test", "wrong").await.unwrap_err();
        let unknown = login(&db, "nobody@clinic.test", "right").await.unwrap_err();
        assert!(matches!(wrong, AppError::InvalidCredentials));
        assert!(matches!(unknown, AppError::InvalidCredentials));
        assert_eq!(wrong.to_string(), unknown.to_string());
    }

    #[tokio::test]
    async fn unknown_email_still_pays_for_a_hash_check() {
        let db = db::in_memory().await;
        register(&db, "alice", "alice@clinic.test", "right", Role::Patient)
            .await
            .expect("register");
        // warm the decoy so its one-off hashing is not timed
        login(&db, "warmup@clinic.test", "x").await.unwrap_err();

        let started = std::time::Instant::now();
        login(&db, "alice@clinic.test", "wrong").await.unwrap_err();
        let wrong = started.elapsed();

        let started = std::time::Instant::now();
        login(&db, "nobody@clinic.test", "wrong").await.unwrap_err();
        let unknown = started.elapsed();

        assert!(unknown * 4 >= wrong, "unknown {unknown:?} vs wrong {wrong:?}");
    }

    #[tokio::test]
    async fn login_normalizes_email() {
        let db = db::in_memory().await;
        register(&db, "alice", "Alice@Clinic.test", "pw", Role::Patient)
            .await
            .expect("register");
        login(&db, " ALICE@clinic.TEST ", "pw").await.expect("login");
    }

    #[tokio::test]
    async fn duplicate_email_fails_without_partial_state() {
        let db = db::in_memory().await;
        register(&db, "first", "dup@clinic.test", "pw1", Role::Patient)
            .await
            .expect("first");
        let err = register(&db, "second", "dup@clinic.test", "pw2", Role::Doctor)
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::EmailTaken));

        let (count,): (i64,) = sqlx::query_as("SELECT COUNT(*) FROM users")
            .fetch_one(&db)
            .await
            .expect("count");
        assert_eq!(count, 1);
        let identity = login(&db, "dup@clinic.test", "pw1").await.expect("original kept");
        assert_eq!(identity.username, "first");
    }

    #[tokio::test]
    async fn register_rejects_missing_fields_and_bad_email() {
        let db = db::in_memory().await;
        let missing = register(&db, " ", "a@b.co", "pw", Role::Patient).await.unwrap_err();
        assert!(matches!(missing, AppError::Validation(_)));
        let bad = register(&db, "a", "not-an-email", "pw", Role::Patient).await.unwrap_err();
        assert!(matches!(bad, AppError::Validation(_)));
    }

    #[tokio::test]
    async fn stored_password_is_not_plaintext() {
        let db = db::in_memory().await;
        let user = register(&db, "alice", "alice@clinic.test", "hunter2", Role::Patient)
            .await
            .expect("register");
        assert_ne!(user.password_hash, "hunter2");
        assert!(user.password_hash.starts_with("$argon2"));
    }
}
