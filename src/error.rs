use axum::{
    http::StatusCode,
    response::{IntoResponse, Json},
};
use chrono::{DateTime, Utc};
use serde_json::json;

pub type Result<T> = std::result::Result<T, Error>;

/// Failure decoding generated quiz text.
#[derive(Debug, thiserror::Error)]
pub enum ParseError {
    #[error("invalid JSON: {0}")]
    InvalidJson(String),

    #[error("unexpected schema: {0}")]
    UnexpectedSchema(String),

    #[error("question {index}: {reason}")]
    InvalidQuestion { index: usize, reason: String },
}

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Bad request: {0}")]
    BadRequest(String),

    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    #[error("Too many failed login attempts")]
    TooManyAttempts,

    #[error("Quiz has not started yet (starts at {0})")]
    QuizNotStarted(DateTime<Utc>),

    #[error("Quiz has expired (ended at {0})")]
    QuizExpired(DateTime<Utc>),

    #[error("No quiz is available")]
    QuizUnavailable,

    #[error("Submission rejected: {0}")]
    Submission(String),

    #[error("Generation error: {0}")]
    Generation(String),

    #[error("Quiz parse error: {0}")]
    Parse(#[from] ParseError),

    #[error("Persistence error: {0}")]
    Persistence(#[from] std::io::Error),

    #[error("Validation error: {0}")]
    Validation(#[from] validator::ValidationErrors),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("HTTP error: {0}")]
    Reqwest(#[from] reqwest::Error),

    #[error("Multipart error: {0}")]
    Multipart(#[from] axum::extract::multipart::MultipartError),

    #[error("Excel export error: {0}")]
    Xlsx(#[from] rust_xlsxwriter::XlsxError),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl Error {
    /// Expected user-facing rejections; these are not system faults.
    pub fn is_rejection(&self) -> bool {
        matches!(
            self,
            Error::BadRequest(_)
                | Error::Unauthorized(_)
                | Error::TooManyAttempts
                | Error::QuizNotStarted(_)
                | Error::QuizExpired(_)
                | Error::QuizUnavailable
                | Error::Submission(_)
                | Error::Validation(_)
                | Error::Multipart(_)
        )
    }
}

impl IntoResponse for Error {
    fn into_response(self) -> axum::response::Response {
        if !self.is_rejection() {
            tracing::error!(error = %self, "request failed");
        }

        let body = match self {
            Error::BadRequest(msg) => (StatusCode::BAD_REQUEST, json!({ "error": msg })),
            Error::Unauthorized(msg) => (StatusCode::UNAUTHORIZED, json!({ "error": msg })),
            Error::TooManyAttempts => (
                StatusCode::TOO_MANY_REQUESTS,
                json!({ "error": "Too many failed attempts. Please wait and try again." }),
            ),
            Error::QuizNotStarted(start) => (
                StatusCode::FORBIDDEN,
                json!({
                    "error": "quiz_not_started",
                    "message": format!("Quiz will start at: {}", start.to_rfc3339()),
                    "start_time": start,
                }),
            ),
            Error::QuizExpired(end) => (
                StatusCode::FORBIDDEN,
                json!({
                    "error": "quiz_expired",
                    "message": format!("Quiz expired at: {}", end.to_rfc3339()),
                    "end_time": end,
                }),
            ),
            Error::QuizUnavailable => (
                StatusCode::NOT_FOUND,
                json!({ "error": "Quiz not created yet." }),
            ),
            Error::Submission(msg) => (StatusCode::BAD_REQUEST, json!({ "error": msg })),
            Error::Validation(err) => (StatusCode::BAD_REQUEST, json!({ "error": err.to_string() })),
            Error::Multipart(err) => (StatusCode::BAD_REQUEST, json!({ "error": err.to_string() })),
            Error::Generation(_) | Error::Reqwest(_) => (
                StatusCode::BAD_GATEWAY,
                json!({ "error": "Quiz generation failed. Please try again." }),
            ),
            Error::Parse(_) => (
                StatusCode::UNPROCESSABLE_ENTITY,
                json!({ "error": "The generated quiz was malformed. Please regenerate it." }),
            ),
            Error::Persistence(_) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                json!({ "error": "Could not read or write quiz data." }),
            ),
            Error::Xlsx(_) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                json!({ "error": "Could not build the marks sheet." }),
            ),
            _ => (
                StatusCode::INTERNAL_SERVER_ERROR,
                json!({ "error": "An unexpected error occurred" }),
            ),
        };

        let (status, payload) = body;
        (status, Json(payload)).into_response()
    }
}
