use crate::error::{Error, Result};
use std::path::{Path, PathBuf};
use tokio::fs;
use tokio::process::Command;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DocumentKind {
    Text,
    Pdf,
    Docx,
}

impl DocumentKind {
    pub fn detect(file_name: &str, content_type: Option<&str>) -> Option<Self> {
        match content_type.map(|c| c.trim().to_ascii_lowercase()).as_deref() {
            Some("text/plain") => return Some(Self::Text),
            Some("application/pdf") => return Some(Self::Pdf),
            Some("application/vnd.openxmlformats-officedocument.wordprocessingml.document") => {
                return Some(Self::Docx)
            }
            _ => {}
        }

        let ext = Path::new(file_name)
            .extension()
            .and_then(|e| e.to_str())
            .unwrap_or("")
            .to_ascii_lowercase();
        match ext.as_str() {
            "txt" => Some(Self::Text),
            "pdf" => Some(Self::Pdf),
            "docx" => Some(Self::Docx),
            _ => None,
        }
    }
}

/// Pulls plain text out of an uploaded supporting document.
pub struct DocumentService;

impl DocumentService {
    /// Best effort: an unreadable document yields empty text.
    pub async fn extract_text(file_name: &str, content_type: Option<&str>, data: &[u8]) -> String {
        if data.is_empty() {
            return String::new();
        }
        match Self::try_extract(file_name, content_type, data).await {
            Ok(text) => {
                tracing::info!(file = file_name, chars = text.chars().count(), "document text extracted");
                text
            }
            Err(e) => {
                tracing::warn!(file = file_name, error = %e, "Unable to read uploaded file");
                String::new()
            }
        }
    }

    pub async fn try_extract(
        file_name: &str,
        content_type: Option<&str>,
        data: &[u8],
    ) -> Result<String> {
        let kind = DocumentKind::detect(file_name, content_type)
            .ok_or_else(|| Error::BadRequest(format!("Unsupported document: {}", file_name)))?;

        match kind {
            DocumentKind::Text => Ok(String::from_utf8_lossy(data).into_owned()),
            DocumentKind::Pdf => Self::with_temp_dir(|dir| Self::pdf_to_text(dir, data)).await,
            DocumentKind::Docx => Self::with_temp_dir(|dir| Self::docx_to_text(dir, data)).await,
        }
    }

    async fn with_temp_dir<F, Fut>(f: F) -> Result<String>
    where
        F: FnOnce(PathBuf) -> Fut,
        Fut: std::future::Future<Output = Result<String>>,
    {
        let dir = std::env::temp_dir().join(format!("quiz_upload_{}", uuid::Uuid::new_v4()));
        fs::create_dir_all(&dir).await?;
        let result = f(dir.clone()).await;
        let _ = fs::remove_dir_all(&dir).await;
        result
    }

    async fn pdf_to_text(dir: PathBuf, data: &[u8]) -> Result<String> {
        let input = dir.join("upload.pdf");
        fs::write(&input, data).await?;

        let out = Command::new("pdftotext")
            .arg("-enc")
            .arg("UTF-8")
            .arg(&input)
            .arg("-")
            .output()
            .await
            .map_err(|e| Error::Internal(format!("pdftotext not available: {}", e)))?;

        if !out.status.success() {
            return Err(Error::Internal(format!(
                "pdftotext failed: {}",
                String::from_utf8_lossy(&out.stderr)
            )));
        }
        Ok(String::from_utf8_lossy(&out.stdout).into_owned())
    }

    async fn docx_to_text(dir: PathBuf, data: &[u8]) -> Result<String> {
        let input = dir.join("upload.docx");
        fs::write(&input, data).await?;

        let out = Command::new("libreoffice")
            .arg("--headless")
            .arg("--norestore")
            .arg("--convert-to")
            .arg("txt:Text")
            .arg("--outdir")
            .arg(&dir)
            .arg(&input)
            .output()
            .await
            .map_err(|e| Error::Internal(format!("Failed to run libreoffice: {}", e)))?;

        if !out.status.success() {
            return Err(Error::Internal(format!(
                "LibreOffice text conversion failed: {}",
                String::from_utf8_lossy(&out.stderr)
            )));
        }

        let bytes = fs::read(dir.join("upload.txt")).await?;
        Ok(String::from_utf8_lossy(&bytes).into_owned())
    }
}
