use axum::{
    extract::{ConnectInfo, Multipart, State},
    http::StatusCode,
    Json,
};
use std::net::SocketAddr;
use validator::Validate;

use crate::dto::instructor_dto::{
    CreateQuizPayload, CreateQuizResponse, InstructorQuizResponse, LoginRequest, LoginResponse,
    QuizWindow, ResultsResponse,
};
use crate::error::{Error, Result};
use crate::services::document_service::DocumentService;
use crate::services::export_service::ExportService;
use crate::services::quiz_service::QuizRequest;
use crate::utils::time::{now, parse_timestamp};
use crate::AppState;

#[axum::debug_handler]
pub async fn login(
    State(state): State<AppState>,
    connect_info: Option<ConnectInfo<SocketAddr>>,
    Json(req): Json<LoginRequest>,
) -> Result<Json<LoginResponse>> {
    req.validate()
        .map_err(|_| Error::Unauthorized("invalid_password".into()))?;
    let client = connect_info.map(|ConnectInfo(addr)| addr.ip());
    let session = state.auth_service.login(&req.password, client)?;
    Ok(Json(LoginResponse {
        token: session.token,
        expires_at: session.expires_at,
    }))
}

fn parse_window_time(field: &str, raw: &str) -> Result<chrono::DateTime<chrono::Utc>> {
    parse_timestamp(raw).map_err(|e| Error::BadRequest(format!("Invalid {}: {}", field, e)))
}

fn quiz_request(payload: CreateQuizPayload, file_text: String) -> Result<QuizRequest> {
    payload.validate()?;
    Ok(QuizRequest {
        start_time: parse_window_time("start_time", &payload.start_time)?,
        end_time: parse_window_time("end_time", &payload.end_time)?,
        topic: payload.topic,
        supporting_text: payload.supporting_text.unwrap_or_default(),
        file_text,
    })
}

#[axum::debug_handler]
pub async fn create_quiz(
    State(state): State<AppState>,
    Json(payload): Json<CreateQuizPayload>,
) -> Result<(StatusCode, Json<CreateQuizResponse>)> {
    let req = quiz_request(payload, String::new())?;

    let (record, questions) = state.quiz_service.create_quiz(req).await?;
    Ok((
        StatusCode::CREATED,
        Json(CreateQuizResponse::new(&record, &questions)),
    ))
}

/// Multipart variant of quiz creation that also accepts a supporting document
/// (`file`: txt, pdf or docx).
#[axum::debug_handler]
pub async fn upload_quiz(
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> Result<(StatusCode, Json<CreateQuizResponse>)> {
    let mut topic = String::new();
    let mut supporting_text = String::new();
    let mut file_text = String::new();
    let mut start_time: Option<String> = None;
    let mut end_time: Option<String> = None;

    while let Some(field) = multipart.next_field().await.map_err(Error::Multipart)? {
        let name = field.name().unwrap_or("").to_string();
        match name.as_str() {
            "topic" => topic = field.text().await.map_err(Error::Multipart)?,
            "supporting_text" => supporting_text = field.text().await.map_err(Error::Multipart)?,
            "start_time" => start_time = Some(field.text().await.map_err(Error::Multipart)?),
            "end_time" => end_time = Some(field.text().await.map_err(Error::Multipart)?),
            "file" => {
                let file_name = field.file_name().unwrap_or("upload").to_string();
                let content_type = field.content_type().map(|c| c.to_string());
                let data = field.bytes().await.map_err(Error::Multipart)?;
                file_text =
                    DocumentService::extract_text(&file_name, content_type.as_deref(), &data).await;
            }
            _ => {}
        }
    }

    let payload = CreateQuizPayload {
        topic,
        supporting_text: Some(supporting_text),
        start_time: start_time.ok_or_else(|| Error::BadRequest("start_time is required".into()))?,
        end_time: end_time.ok_or_else(|| Error::BadRequest("end_time is required".into()))?,
    };
    let req = quiz_request(payload, file_text)?;

    let (record, questions) = state.quiz_service.create_quiz(req).await?;
    Ok((
        StatusCode::CREATED,
        Json(CreateQuizResponse::new(&record, &questions)),
    ))
}

#[axum::debug_handler]
pub async fn get_quiz(State(state): State<AppState>) -> Result<Json<InstructorQuizResponse>> {
    let (record, questions) = state.quiz_service.current_quiz().await?;
    Ok(Json(InstructorQuizResponse {
        window: QuizWindow::from(&record),
        state: record.window_state(now()),
        questions,
    }))
}

#[axum::debug_handler]
pub async fn list_results(State(state): State<AppState>) -> Result<Json<ResultsResponse>> {
    let results = state.quiz_service.results().await?;
    Ok(Json(ResultsResponse {
        total: results.len(),
        rows: ExportService::rows(&results),
        results,
    }))
}
