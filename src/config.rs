use crate::error::{Error, Result};
use crate::utils::token::{generate_access_token, MAX_SESSION_TTL_HOURS};
use dotenvy::dotenv;
use std::env;
use std::path::PathBuf;
use std::sync::OnceLock;

#[derive(Debug, Clone)]
pub struct Config {
    pub server_address: String,
    pub data_dir: PathBuf,
    pub gemini_api_key: String,
    pub gemini_model: String,
    pub gemini_api_base: String,
    pub instructor_password: String,
    pub jwt_secret: String,
    pub session_ttl_hours: i64,
    pub generation_timeout_secs: u64,
    pub question_count: usize,
    pub public_rps: u32,
    pub login_max_failures: u32,
    pub login_window_secs: u64,
}

pub static CONFIG: OnceLock<Config> = OnceLock::new();

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenv().ok();

        let gemini_api_key = get_env("GEMINI_API_KEY").or_else(|_| get_env("GEMINI_API"))?;

        Ok(Self {
            server_address: get_env_or("SERVER_ADDRESS", "127.0.0.1:8080"),
            data_dir: PathBuf::from(get_env_or("DATA_DIR", "./data")),
            gemini_api_key,
            gemini_model: get_env_or("GEMINI_MODEL", "gemini-2.5-flash"),
            gemini_api_base: get_env_or(
                "GEMINI_API_BASE",
                "https://generativelanguage.googleapis.com/v1beta/",
            ),
            instructor_password: get_env("INSTRUCTOR_PASSWORD")?,
            // Sessions do not survive a restart without an explicit secret.
            jwt_secret: secret_or_random("JWT_SECRET"),
            session_ttl_hours: get_env_bounded_or(
                "SESSION_TTL_HOURS",
                8,
                1,
                MAX_SESSION_TTL_HOURS,
            )?,
            generation_timeout_secs: get_env_parse_or("GENERATION_TIMEOUT_SECS", 60)?,
            question_count: get_env_parse_or("QUESTION_COUNT", 10)?,
            public_rps: get_env_parse_or("PUBLIC_RPS", 50)?,
            login_max_failures: get_env_parse_or("LOGIN_MAX_FAILURES", 5)?,
            login_window_secs: get_env_parse_or("LOGIN_WINDOW_SECS", 60)?,
        })
    }
}

fn get_env(name: &str) -> Result<String> {
    env::var(name)
        .ok()
        .filter(|v| !v.trim().is_empty())
        .ok_or_else(|| Error::Config(format!("Missing environment variable: {}", name)))
}

fn get_env_or(name: &str, default: &str) -> String {
    env::var(name).unwrap_or_else(|_| default.to_string())
}

fn get_env_parse_or<T>(name: &str, default: T) -> Result<T>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    match env::var(name) {
        Ok(raw) => raw
            .trim()
            .parse()
            .map_err(|e| Error::Config(format!("Invalid value for {}: {}", name, e))),
        Err(_) => Ok(default),
    }
}

/// Blank counts as unset.
fn secret_or_random(name: &str) -> String {
    get_env(name).unwrap_or_else(|_| generate_access_token(48))
}

fn get_env_bounded_or<T>(name: &str, default: T, min: T, max: T) -> Result<T>
where
    T: std::str::FromStr + PartialOrd + std::fmt::Display,
    T::Err: std::fmt::Display,
{
    let value = get_env_parse_or(name, default)?;
    if value < min || value > max {
        return Err(Error::Config(format!(
            "{} must be between {} and {}, got {}",
            name, min, max, value
        )));
    }
    Ok(value)
}

pub fn init_config() -> Result<()> {
    let config = Config::from_env()?;
    CONFIG
        .set(config)
        .map_err(|_| Error::Config("Configuration has already been initialized".to_string()))?;
    Ok(())
}

pub fn get_config() -> &'static Config {
    CONFIG
        .get()
        .expect("Configuration has not been initialized")
}
