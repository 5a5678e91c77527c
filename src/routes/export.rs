use axum::{
    extract::State,
    http::{header, StatusCode},
    response::IntoResponse,
};

use crate::services::export_service::{MARKS_SHEET_FILE, XLSX_CONTENT_TYPE};
use crate::{error::Result, AppState};

/// Download every stored result as a (Student, Score) spreadsheet.
pub async fn export_marks(State(state): State<AppState>) -> Result<impl IntoResponse> {
    let buffer = state.quiz_service.export_marks().await?;
    let disposition = format!("attachment; filename=\"{}\"", MARKS_SHEET_FILE);

    Ok((
        StatusCode::OK,
        [
            (header::CONTENT_TYPE, XLSX_CONTENT_TYPE.to_string()),
            (header::CONTENT_DISPOSITION, disposition),
        ],
        buffer,
    ))
}
