use chrono::{DateTime, Duration, Utc};
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use rand::{distributions::Alphanumeric, thread_rng, Rng};
use serde::{Deserialize, Serialize};

pub const INSTRUCTOR_ROLE: &str = "instructor";
pub const MAX_SESSION_TTL_HOURS: i64 = 24 * 366;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    pub sub: String,
    pub exp: usize,
    pub role: Option<String>,
}

pub fn generate_access_token(length: usize) -> String {
    thread_rng()
        .sample_iter(&Alphanumeric)
        .take(length)
        .map(char::from)
        .collect()
}

/// Signs an instructor session token valid for `ttl_hours`, clamped to
/// `1..=MAX_SESSION_TTL_HOURS`.
pub fn issue_session(
    secret: &str,
    ttl_hours: i64,
) -> jsonwebtoken::errors::Result<(String, DateTime<Utc>)> {
    let expires_at = Utc::now() + Duration::hours(ttl_hours.clamp(1, MAX_SESSION_TTL_HOURS));
    let claims = Claims {
        sub: INSTRUCTOR_ROLE.to_string(),
        exp: expires_at.timestamp() as usize,
        role: Some(INSTRUCTOR_ROLE.to_string()),
    };
    let token = encode(
        &Header::new(Algorithm::HS256),
        &claims,
        &EncodingKey::from_secret(secret.as_bytes()),
    )?;
    Ok((token, expires_at))
}

pub fn verify_session(secret: &str, token: &str) -> jsonwebtoken::errors::Result<Claims> {
    let mut validation = Validation::new(Algorithm::HS256);
    validation.validate_exp = true;
    let data = decode::<Claims>(
        token,
        &DecodingKey::from_secret(secret.as_bytes()),
        &validation,
    )?;
    Ok(data.claims)
}
