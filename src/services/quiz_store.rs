use crate::error::Result;
use crate::models::quiz::QuizRecord;
use async_trait::async_trait;
use std::path::{Path, PathBuf};
use tokio::fs;

pub const CURRENT_QUIZ_FILE: &str = "latest_quiz.json";

/// Single-slot storage for the active quiz.
#[async_trait]
pub trait QuizStore: Send + Sync {
    /// Replaces any previously saved quiz.
    async fn save_current(&self, record: &QuizRecord) -> Result<()>;

    /// `None` when nothing was saved or the stored quiz is unusable.
    async fn load_current(&self) -> Option<QuizRecord>;
}

#[derive(Clone, Debug)]
pub struct FileQuizStore {
    path: PathBuf,
}

impl FileQuizStore {
    pub fn new(data_dir: &Path) -> Self {
        Self {
            path: data_dir.join(CURRENT_QUIZ_FILE),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn staging_path(&self) -> PathBuf {
        self.path.with_extension("json.tmp")
    }
}

#[async_trait]
impl QuizStore for FileQuizStore {
    async fn save_current(&self, record: &QuizRecord) -> Result<()> {
        if let Some(dir) = self.path.parent() {
            fs::create_dir_all(dir).await?;
        }

        let body = serde_json::to_vec_pretty(record)?;
        let tmp = self.staging_path();
        let written = async {
            fs::write(&tmp, body).await?;
            fs::rename(&tmp, &self.path).await
        }
        .await;
        if let Err(e) = written {
            let _ = fs::remove_file(&tmp).await;
            tracing::warn!(path = %self.path.display(), error = %e, "current quiz not saved");
            return Err(e.into());
        }

        tracing::info!(path = %self.path.display(), "current quiz saved");
        Ok(())
    }

    async fn load_current(&self) -> Option<QuizRecord> {
        let bytes = match fs::read(&self.path).await {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return None,
            Err(e) => {
                tracing::warn!(path = %self.path.display(), error = %e, "current quiz unreadable");
                return None;
            }
        };

        match serde_json::from_slice(&bytes) {
            Ok(record) => Some(record),
            Err(e) => {
                tracing::warn!(path = %self.path.display(), error = %e, "current quiz corrupt");
                None
            }
        }
    }
}
