//! Signed, client-held session.
//!
//! The session lives in an HttpOnly cookie holding an HS256 JWT. The token
//! carries the logged-in identity (if any) and the flash messages queued for
//! the next rendered view. A token that fails validation for any reason is
//! treated as an anonymous, empty session.

use std::convert::Infallible;

use axum::{
    async_trait,
    extract::{FromRef, FromRequestParts},
    http::request::Parts,
    response::{IntoResponseParts, ResponseParts},
};
use axum_extra::extract::cookie::{Cookie, CookieJar, SameSite};
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use time::{Duration, OffsetDateTime};
use tracing::{debug, warn};
use uuid::Uuid;

use crate::{auth::repo_types::Role, config::SessionConfig, error::AppError, state::AppState};

pub const COOKIE_NAME: &str = "session";

/// Pending flashes kept in the cookie; older ones are dropped first.
pub const MAX_FLASHES: usize = 5;

/// Who the current client is logged in as.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Identity {
    pub user_id: i64,
    pub username: String,
    pub role: Role,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum FlashCategory {
    Success,
    Danger,
}

/// One-shot message shown by the next view.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Flash {
    pub category: FlashCategory,
    pub message: String,
}

impl Flash {
    pub fn success(message: impl Into<String>) -> Self {
        Self {
            category: FlashCategory::Success,
            message: message.into(),
        }
    }

    pub fn danger(message: impl Into<String>) -> Self {
        Self {
            category: FlashCategory::Danger,
            message: message.into(),
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct SessionData {
    #[serde(default)]
    pub identity: Option<Identity>,
    #[serde(default)]
    pub flashes: Vec<Flash>,
}

/// JWT payload of the session cookie.
#[derive(Debug, Serialize, Deserialize)]
pub struct Claims {
    #[serde(flatten)]
    pub data: SessionData,
    pub sid: Uuid,
    pub iat: usize,
    pub exp: usize,
    pub iss: String,
    pub aud: String,
}

/// Signing and verification keys for session tokens.
#[derive(Clone)]
pub struct SessionKeys {
    pub encoding: EncodingKey,
    pub decoding: DecodingKey,
    pub issuer: String,
    pub audience: String,
    pub ttl: Duration,
}

impl From<&SessionConfig> for SessionKeys {
    fn from(cfg: &SessionConfig) -> Self {
        Self {
            encoding: EncodingKey::from_secret(cfg.secret.as_bytes()),
            decoding: DecodingKey::from_secret(cfg.secret.as_bytes()),
            issuer: cfg.issuer.clone(),
            audience: cfg.audience.clone(),
            ttl: Duration::minutes(cfg.ttl_minutes),
        }
    }
}

impl FromRef<AppState> for SessionKeys {
    fn from_ref(state: &AppState) -> Self {
        SessionKeys::from(&state.config.session)
    }
}

impl SessionKeys {
    pub fn sign(&self, data: &SessionData, sid: Uuid) -> anyhow::Result<String> {
        let now = OffsetDateTime::now_utc();
        let exp = now + self.ttl;
        let claims = Claims {
            data: data.clone(),
            sid,
            iat: now.unix_timestamp() as usize,
            exp: exp.unix_timestamp().max(0) as usize,
            iss: self.issuer.clone(),
            aud: self.audience.clone(),
        };
        let token = encode(&Header::default(), &claims, &self.encoding)?;
        debug!(%sid, "session signed");
        Ok(token)
    }

    pub fn verify(&self, token: &str) -> anyhow::Result<Claims> {
        let mut validation = Validation::default();
        validation.set_audience(std::slice::from_ref(&self.audience));
        validation.set_issuer(std::slice::from_ref(&self.issuer));
        let data = decode::<Claims>(token, &self.decoding, &validation)?;
        Ok(data.claims)
    }

    fn cookie(&self, data: &SessionData, sid: Uuid) -> anyhow::Result<Cookie<'static>> {
        let token = self.sign(data, sid)?;
        Ok(Cookie::build((COOKIE_NAME, token))
            .path("/")
            .http_only(true)
            .same_site(SameSite::Lax)
            .build())
    }
}

/// The current request's session. Returning it from a handler re-signs the
/// cookie with whatever changed.
pub struct Session {
    data: SessionData,
    sid: Uuid,
    keys: SessionKeys,
}

impl Session {
    pub fn new(keys: SessionKeys, data: SessionData) -> Self {
        Self {
            data,
            sid: Uuid::new_v4(),
            keys,
        }
    }

    pub fn identity(&self) -> Option<&Identity> {
        self.data.identity.as_ref()
    }

    pub fn sid(&self) -> Uuid {
        self.sid
    }

    /// Start an authenticated session under a fresh session id.
    pub fn log_in(&mut self, identity: Identity) {
        self.sid = Uuid::new_v4();
        self.data.identity = Some(identity);
    }

    /// Drop the identity. Safe to call on an anonymous session.
    pub fn log_out(&mut self) {
        self.sid = Uuid::new_v4();
        self.data.identity = None;
    }

    pub fn flash(&mut self, flash: Flash) {
        self.data.flashes.push(flash);
        let excess = self.data.flashes.len().saturating_sub(MAX_FLASHES);
        self.data.flashes.drain(..excess);
    }

    pub fn take_flashes(&mut self) -> Vec<Flash> {
        std::mem::take(&mut self.data.flashes)
    }
}

#[async_trait]
impl<S> FromRequestParts<S> for Session
where
    S: Send + Sync,
    SessionKeys: FromRef<S>,
{
    type Rejection = Infallible;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let keys = SessionKeys::from_ref(state);
        let jar = CookieJar::from_headers(&parts.headers);

        let Some(cookie) = jar.get(COOKIE_NAME) else {
            return Ok(Session::new(keys, SessionData::default()));
        };

        match keys.verify(cookie.value()) {
            Ok(claims) => Ok(Session {
                data: claims.data,
                sid: claims.sid,
                keys,
            }),
            Err(e) => {
                warn!(error = %e, "rejected session cookie; treating as anonymous");
                Ok(Session::new(keys, SessionData::default()))
            }
        }
    }
}

impl IntoResponseParts for Session {
    type Error = AppError;

    fn into_response_parts(self, res: ResponseParts) -> Result<ResponseParts, Self::Error> {
        let cookie = self.keys.cookie(&self.data, self.sid)?;
        CookieJar::new()
            .add(cookie)
            .into_response_parts(res)
            .map_err(|never| match never {})
    }
}
