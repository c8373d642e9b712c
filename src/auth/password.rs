//! Secret hashing for user accounts.
//!
//! Stored values are Argon2id PHC strings (`$argon2id$v=19$...`) carrying
//! their own salt and parameters, so verification needs no extra state.

use argon2::{
    password_hash::{self, PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Argon2,
};
use lazy_static::lazy_static;
use rand::rngs::OsRng;
use tracing::error;

lazy_static! {
    /// Stand-in hash verified when a login names no account, so unknown
    /// emails cost the same argon2 work as wrong passwords.
    static ref DECOY_HASH: String = hash_secret("clinic-decoy-secret").unwrap_or_default();
}

fn argon_failure(context: &'static str) -> impl FnOnce(password_hash::Error) -> anyhow::Error {
    move |e| {
        error!(error = %e, context, "argon2 failure");
        anyhow::anyhow!("{context}: {e}")
    }
}

/// Hash a user secret under a fresh random salt.
pub fn hash_secret(secret: &str) -> anyhow::Result<String> {
    let salt = SaltString::generate(&mut OsRng);
    let phc = Argon2::default()
        .hash_password(secret.as_bytes(), &salt)
        .map_err(argon_failure("hash secret"))?;
    Ok(phc.to_string())
}

/// Check `secret` against a stored PHC string. A mismatch is `Ok(false)`;
/// only an unreadable stored hash is an error.
pub fn verify_secret(secret: &str, stored: &str) -> anyhow::Result<bool> {
    let parsed = PasswordHash::new(stored).map_err(argon_failure("parse stored hash"))?;
    match Argon2::default().verify_password(secret.as_bytes(), &parsed) {
        Ok(()) => Ok(true),
        Err(password_hash::Error::Password) => Ok(false),
        Err(e) => Err(argon_failure("verify secret")(e)),
    }
}

/// Spend one verification on the decoy hash. The outcome is irrelevant.
pub fn verify_decoy(secret: &str) {
    let _ = verify_secret(secret, &DECOY_HASH);
}
