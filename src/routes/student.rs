use axum::{extract::State, Json};
use validator::Validate;

use crate::dto::instructor_dto::QuizWindow;
use crate::dto::student_dto::{StudentQuizResponse, SubmitAnswersRequest};
use crate::error::Result;
use crate::models::question::PublicQuestion;
use crate::services::quiz_service::SubmissionOutcome;
use crate::utils::time::now;
use crate::AppState;

/// The open quiz without its answer key.
#[axum::debug_handler]
pub async fn get_quiz(State(state): State<AppState>) -> Result<Json<StudentQuizResponse>> {
    let (record, questions) = state.quiz_service.open_quiz(now()).await?;

    Ok(Json(StudentQuizResponse {
        window: QuizWindow::from(&record),
        total_questions: questions.len(),
        questions: questions
            .iter()
            .enumerate()
            .map(|(i, q)| PublicQuestion::from_question(i, q))
            .collect(),
    }))
}

#[axum::debug_handler]
pub async fn submit(
    State(state): State<AppState>,
    Json(req): Json<SubmitAnswersRequest>,
) -> Result<Json<SubmissionOutcome>> {
    req.validate()?;
    let outcome = state
        .quiz_service
        .submit(now(), &req.student_name, &req.answers)
        .await?;
    Ok(Json(outcome))
}
