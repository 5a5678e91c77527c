use crate::error::{Error, Result};
use crate::middleware::rate_limit::KeyedRateLimiter;
use crate::utils::token::{issue_session, verify_session, Claims, INSTRUCTOR_ROLE};
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::net::IpAddr;
use std::sync::Arc;
use std::time::Duration;
use subtle::ConstantTimeEq;

#[derive(Debug, Clone, Serialize)]
pub struct Session {
    pub token: String,
    pub expires_at: DateTime<Utc>,
}

/// Instructor gate: shared-secret login with per-client failure throttling,
/// then signed sessions. Clients without a known address share one bucket.
#[derive(Clone)]
pub struct AuthService {
    password: Arc<str>,
    jwt_secret: Arc<str>,
    session_ttl_hours: i64,
    failures: KeyedRateLimiter<Option<IpAddr>>,
}

impl AuthService {
    pub fn new(
        password: &str,
        jwt_secret: &str,
        session_ttl_hours: i64,
        max_failures: u32,
        failure_window: Duration,
    ) -> Self {
        Self {
            password: Arc::from(password),
            jwt_secret: Arc::from(jwt_secret),
            session_ttl_hours,
            failures: KeyedRateLimiter::new(max_failures, failure_window),
        }
    }

    /// Each attempt takes a slot from the client's window; a successful one
    /// gives it back, so only failures count.
    pub fn login(&self, password: &str, client: Option<IpAddr>) -> Result<Session> {
        if !self.failures.allow(&client) {
            tracing::warn!(?client, "instructor login throttled");
            return Err(Error::TooManyAttempts);
        }

        let matches: bool = password.as_bytes().ct_eq(self.password.as_bytes()).into();
        if !matches {
            tracing::info!(?client, "instructor login rejected");
            return Err(Error::Unauthorized("invalid_password".into()));
        }
        self.failures.release(&client);

        let (token, expires_at) = issue_session(&self.jwt_secret, self.session_ttl_hours)
            .map_err(|e| Error::Internal(format!("Failed to sign session: {}", e)))?;
        tracing::info!(%expires_at, "instructor session opened");
        Ok(Session { token, expires_at })
    }

    pub fn verify(&self, token: &str) -> Result<Claims> {
        let claims = verify_session(&self.jwt_secret, token)
            .map_err(|_| Error::Unauthorized("invalid_token".into()))?;
        let role = claims.role.clone().unwrap_or_default();
        if !role.eq_ignore_ascii_case(INSTRUCTOR_ROLE) {
            return Err(Error::Unauthorized("forbidden".into()));
        }
        Ok(claims)
    }
}
