use crate::models::question::{PublicQuestion, Question};
use crate::models::quiz::{QuizRecord, WindowState};
use crate::models::result::{ResultRecord, ResultRow};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use validator::Validate;

pub const PREVIEW_QUESTIONS: usize = 3;

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct LoginRequest {
    #[validate(length(min = 1))]
    pub password: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct LoginResponse {
    pub token: String,
    pub expires_at: DateTime<Utc>,
}

/// Timestamps accept RFC 3339 or a naive local date-time.
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct CreateQuizPayload {
    #[validate(length(min = 1, max = 500))]
    pub topic: String,
    #[serde(default)]
    #[validate(length(max = 200000))]
    pub supporting_text: Option<String>,
    pub start_time: String,
    pub end_time: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct QuizWindow {
    pub start_time: DateTime<Utc>,
    pub end_time: DateTime<Utc>,
}

impl From<&QuizRecord> for QuizWindow {
    fn from(r: &QuizRecord) -> Self {
        Self {
            start_time: r.start_time,
            end_time: r.end_time,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct CreateQuizResponse {
    pub window: QuizWindow,
    pub total_questions: usize,
    pub preview: Vec<PublicQuestion>,
}

impl CreateQuizResponse {
    pub fn new(record: &QuizRecord, questions: &[Question]) -> Self {
        Self {
            window: QuizWindow::from(record),
            total_questions: questions.len(),
            preview: questions
                .iter()
                .take(PREVIEW_QUESTIONS)
                .enumerate()
                .map(|(i, q)| PublicQuestion::from_question(i, q))
                .collect(),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct InstructorQuizResponse {
    pub window: QuizWindow,
    pub state: WindowState,
    pub questions: Vec<Question>,
}

#[derive(Debug, Clone, Serialize)]
pub struct ResultsResponse {
    pub total: usize,
    pub rows: Vec<ResultRow>,
    pub results: Vec<ResultRecord>,
}
