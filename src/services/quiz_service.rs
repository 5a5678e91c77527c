use crate::error::{Error, Result};
use crate::models::question::Question;
use crate::models::quiz::{QuizRecord, WindowState};
use crate::models::result::{AnswerRecord, ResultRecord};
use crate::services::export_service::ExportService;
use crate::services::generator_service::QuizGenerator;
use crate::services::grading_service::GradingService;
use crate::services::parser_service::parse_quiz;
use crate::services::quiz_store::QuizStore;
use crate::services::result_store::ResultStore;
use crate::utils::names::normalize_student_name;
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::sync::Arc;

#[derive(Debug, Clone)]
pub struct QuizRequest {
    pub topic: String,
    pub supporting_text: String,
    pub file_text: String,
    pub start_time: DateTime<Utc>,
    pub end_time: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize)]
pub struct SubmissionOutcome {
    pub student_name: String,
    pub score: u32,
    pub total: usize,
    pub result_id: String,
    pub answers: Vec<AnswerRecord>,
}

#[derive(Clone)]
pub struct QuizService {
    generator: QuizGenerator,
    quiz_store: Arc<dyn QuizStore>,
    result_store: Arc<dyn ResultStore>,
}

impl QuizService {
    pub fn new(
        generator: QuizGenerator,
        quiz_store: Arc<dyn QuizStore>,
        result_store: Arc<dyn ResultStore>,
    ) -> Self {
        Self {
            generator,
            quiz_store,
            result_store,
        }
    }

    /// Generates, validates and saves a new current quiz. A quiz that fails to
    /// parse is never saved, so the previous one stays active.
    pub async fn create_quiz(&self, req: QuizRequest) -> Result<(QuizRecord, Vec<Question>)> {
        if req.topic.trim().is_empty() {
            return Err(Error::BadRequest("Main quiz topic is required".to_string()));
        }
        if req.start_time > req.end_time {
            return Err(Error::BadRequest(
                "Quiz start time must not be after its end time".to_string(),
            ));
        }

        let quiz_text = self
            .generator
            .generate(&req.topic, &req.supporting_text, &req.file_text)
            .await?;

        let questions = parse_quiz(&quiz_text).map_err(|e| {
            tracing::warn!(error = %e, "generated quiz rejected");
            Error::Parse(e)
        })?;

        let record = QuizRecord {
            quiz_text,
            start_time: req.start_time,
            end_time: req.end_time,
        };
        self.quiz_store.save_current(&record).await?;

        tracing::info!(
            questions = questions.len(),
            start = %record.start_time,
            end = %record.end_time,
            "quiz created"
        );
        Ok((record, questions))
    }

    pub async fn current_quiz(&self) -> Result<(QuizRecord, Vec<Question>)> {
        let record = self
            .quiz_store
            .load_current()
            .await
            .ok_or(Error::QuizUnavailable)?;
        let questions = parse_quiz(&record.quiz_text)?;
        Ok((record, questions))
    }

    /// The current quiz, only while its window is open at `now`. A stored quiz
    /// that no longer parses is unavailable to students.
    pub async fn open_quiz(&self, now: DateTime<Utc>) -> Result<(QuizRecord, Vec<Question>)> {
        let record = self
            .quiz_store
            .load_current()
            .await
            .ok_or(Error::QuizUnavailable)?;
        check_window(&record, now)?;
        let questions = parse_quiz(&record.quiz_text).map_err(|e| {
            tracing::warn!(error = %e, "stored quiz is unusable");
            Error::QuizUnavailable
        })?;
        Ok((record, questions))
    }

    pub async fn submit(
        &self,
        now: DateTime<Utc>,
        student_name: &str,
        answers: &[Option<String>],
    ) -> Result<SubmissionOutcome> {
        let (_, questions) = self.open_quiz(now).await?;
        let student_name = normalize_student_name(student_name);

        let (score, graded) = GradingService::grade_submission(&questions, answers)?;
        let record = ResultRecord {
            student_name: student_name.clone(),
            score,
            answers: graded,
        };
        let result_id = self.result_store.append(&record, now).await?;

        Ok(SubmissionOutcome {
            student_name,
            score,
            total: questions.len(),
            result_id,
            answers: record.answers,
        })
    }

    pub async fn results(&self) -> Result<Vec<ResultRecord>> {
        self.result_store.list_all().await
    }

    pub async fn export_marks(&self) -> Result<Vec<u8>> {
        let results = self.result_store.list_all().await?;
        ExportService::generate_marks_xlsx(&results)
    }
}

/// Rejects access outside `[start_time, end_time]`.
pub fn check_window(record: &QuizRecord, now: DateTime<Utc>) -> Result<()> {
    match record.window_state(now) {
        WindowState::Open => Ok(()),
        WindowState::BeforeWindow => Err(Error::QuizNotStarted(record.start_time)),
        WindowState::Expired => Err(Error::QuizExpired(record.end_time)),
    }
}
