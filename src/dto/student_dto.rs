use crate::dto::instructor_dto::QuizWindow;
use crate::models::question::PublicQuestion;
use serde::{Deserialize, Serialize};
use validator::Validate;

#[derive(Debug, Clone, Serialize)]
pub struct StudentQuizResponse {
    pub window: QuizWindow,
    pub total_questions: usize,
    pub questions: Vec<PublicQuestion>,
}

/// `answers[i]` is the chosen option for question `i + 1`; `null` when unanswered.
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct SubmitAnswersRequest {
    #[serde(default)]
    #[validate(length(max = 200))]
    pub student_name: String,
    #[validate(length(max = 500))]
    pub answers: Vec<Option<String>>,
}
