use crate::error::{Error, Result};
use crate::models::result::ResultRecord;
use crate::utils::names::file_safe;
use async_trait::async_trait;
use chrono::{DateTime, Local, Utc};
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use tokio::fs;

const RESULT_PREFIX: &str = "results_";
const RESULT_SUFFIX: &str = ".json";
const MAX_SUFFIX: u32 = 1000;

/// Append-only collection of scored submissions.
#[async_trait]
pub trait ResultStore: Send + Sync {
    /// Stores a new result and returns its identifier.
    async fn append(&self, result: &ResultRecord, submitted_at: DateTime<Utc>) -> Result<String>;

    /// Every stored result. Undecodable entries are skipped.
    async fn list_all(&self) -> Result<Vec<ResultRecord>>;
}

/// One JSON file per submission, named `results_<student>_<timestamp>.json`.
#[derive(Clone, Debug)]
pub struct FileResultStore {
    dir: PathBuf,
}

impl FileResultStore {
    pub fn new(data_dir: &Path) -> Self {
        Self {
            dir: data_dir.to_path_buf(),
        }
    }

    fn is_result_file(name: &str) -> bool {
        name.starts_with(RESULT_PREFIX) && name.ends_with(RESULT_SUFFIX)
    }

    fn staging_path(&self) -> PathBuf {
        self.dir.join(format!(".pending_{}.tmp", uuid::Uuid::new_v4()))
    }

    /// Writes `body` to `staging` in full, then links it under the first free
    /// name derived from `stem`. A result file only appears once complete.
    async fn publish(&self, staging: &Path, stem: &str, body: &[u8]) -> Result<String> {
        fs::write(staging, body).await?;

        for attempt in 1..=MAX_SUFFIX {
            let filename = if attempt == 1 {
                format!("{}{}", stem, RESULT_SUFFIX)
            } else {
                format!("{}_{}{}", stem, attempt, RESULT_SUFFIX)
            };

            match fs::hard_link(staging, self.dir.join(&filename)).await {
                Ok(()) => return Ok(filename),
                Err(e) if e.kind() == ErrorKind::AlreadyExists => continue,
                Err(e) => return Err(e.into()),
            }
        }

        Err(Error::Internal(format!("no free result name for {}", stem)))
    }
}

pub fn result_file_stem(student_name: &str, submitted_at: DateTime<Utc>) -> String {
    format!(
        "{}{}_{}",
        RESULT_PREFIX,
        file_safe(student_name),
        submitted_at.with_timezone(&Local).format("%Y-%m-%d_%H-%M-%S")
    )
}

#[async_trait]
impl ResultStore for FileResultStore {
    async fn append(&self, result: &ResultRecord, submitted_at: DateTime<Utc>) -> Result<String> {
        fs::create_dir_all(&self.dir).await?;
        let body = serde_json::to_vec_pretty(result)?;
        let stem = result_file_stem(&result.student_name, submitted_at);

        let staging = self.staging_path();
        let published = self.publish(&staging, &stem, &body).await;
        let _ = fs::remove_file(&staging).await;

        match published {
            Ok(filename) => {
                tracing::info!(file = %filename, student = %result.student_name, score = result.score, "result stored");
                Ok(filename)
            }
            Err(e) => {
                tracing::warn!(student = %result.student_name, error = %e, "result not stored");
                Err(e)
            }
        }
    }

    async fn list_all(&self) -> Result<Vec<ResultRecord>> {
        let mut entries = match fs::read_dir(&self.dir).await {
            Ok(entries) => entries,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(vec![]),
            Err(e) => return Err(e.into()),
        };

        let mut files = Vec::new();
        while let Some(entry) = entries.next_entry().await? {
            let name = entry.file_name().to_string_lossy().to_string();
            if Self::is_result_file(&name) {
                files.push((name, entry.path()));
            }
        }
        files.sort_by(|a, b| a.0.cmp(&b.0));

        let mut results = Vec::with_capacity(files.len());
        for (name, path) in files {
            let bytes = match fs::read(&path).await {
                Ok(bytes) => bytes,
                Err(e) => {
                    tracing::warn!(file = %name, error = %e, "skipping unreadable result");
                    continue;
                }
            };
            match serde_json::from_slice::<ResultRecord>(&bytes) {
                Ok(record) => results.push(record),
                Err(e) => tracing::warn!(file = %name, error = %e, "skipping corrupt result"),
            }
        }

        Ok(results)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::result::AnswerRecord;
    use chrono::TimeZone;

    fn temp_dir() -> PathBuf {
        std::env::temp_dir().join(format!("result_store_{}", uuid::Uuid::new_v4()))
    }

    fn result(name: &str, score: u32) -> ResultRecord {
        ResultRecord {
            student_name: name.to_string(),
            score,
            answers: vec![AnswerRecord {
                question: "Q1".into(),
                student_answer: "A. yes".into(),
                correct_answer: "A".into(),
                explanation: "because".into(),
            }],
        }
    }

    #[tokio::test]
    async fn empty_directory_lists_nothing() {
        let store = FileResultStore::new(&temp_dir());
        assert!(store.list_all().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn appended_results_are_listed() {
        let dir = temp_dir();
        let store = FileResultStore::new(&dir);
        let at = Utc.with_ymd_and_hms(2025, 9, 1, 9, 30, 0).unwrap();

        let alice = result("Alice", 7);
        let bob = result("Bob", 3);
        store.append(&bob, at).await.unwrap();
        store.append(&alice, at).await.unwrap();

        let listed = store.list_all().await.unwrap();
        assert_eq!(listed.len(), 2);
        assert!(listed.contains(&alice));
        assert!(listed.contains(&bob));
        let _ = fs::remove_dir_all(&dir).await;
    }

    #[tokio::test]
    async fn same_second_submissions_do_not_collide() {
        let dir = temp_dir();
        let store = FileResultStore::new(&dir);
        let at = Utc.with_ymd_and_hms(2025, 9, 1, 9, 30, 0).unwrap();

        let first = store.append(&result("Alice", 4), at).await.unwrap();
        let second = store.append(&result("Alice", 9), at).await.unwrap();

        assert_ne!(first, second);
        assert!(second.ends_with("_2.json"));
        assert_eq!(store.list_all().await.unwrap().len(), 2);
        let _ = fs::remove_dir_all(&dir).await;
    }

    #[tokio::test]
    async fn corrupt_and_foreign_files_are_skipped() {
        let dir = temp_dir();
        let store = FileResultStore::new(&dir);
        let at = Utc.with_ymd_and_hms(2025, 9, 1, 9, 30, 0).unwrap();
        store.append(&result("Alice", 5), at).await.unwrap();
        fs::write(dir.join("results_Mallory_broken.json"), b"{\"student_name\":")
            .await
            .unwrap();
        fs::write(dir.join("latest_quiz.json"), b"{}").await.unwrap();

        let listed = store.list_all().await.unwrap();
        assert_eq!(listed, vec![result("Alice", 5)]);
        let _ = fs::remove_dir_all(&dir).await;
    }

    async fn file_names(dir: &Path) -> Vec<String> {
        let mut names = Vec::new();
        let mut entries = fs::read_dir(dir).await.unwrap();
        while let Some(entry) = entries.next_entry().await.unwrap() {
            names.push(entry.file_name().to_string_lossy().to_string());
        }
        names.sort();
        names
    }

    #[tokio::test]
    async fn append_leaves_only_the_result_file() {
        let dir = temp_dir();
        let store = FileResultStore::new(&dir);
        let at = Utc.with_ymd_and_hms(2025, 9, 1, 9, 30, 0).unwrap();
        let id = store.append(&result("Alice", 5), at).await.unwrap();

        assert_eq!(file_names(&dir).await, vec![id]);
        let _ = fs::remove_dir_all(&dir).await;
    }

    #[tokio::test]
    async fn failed_write_commits_no_result() {
        let dir = temp_dir();
        fs::create_dir_all(&dir).await.unwrap();
        let store = FileResultStore::new(&dir);
        let staging = dir.join(".pending_blocked.tmp");
        fs::create_dir_all(&staging).await.unwrap();

        let err = store
            .publish(&staging, "results_Alice_2025-09-01_09-30-00", b"{}")
            .await
            .unwrap_err();

        assert!(matches!(err, Error::Persistence(_)));
        assert_eq!(file_names(&dir).await, vec![".pending_blocked.tmp".to_string()]);
        assert!(store.list_all().await.unwrap().is_empty());
        let _ = fs::remove_dir_all(&dir).await;
    }

    #[tokio::test]
    async fn unwritable_data_dir_fails_append() {
        let base = temp_dir();
        fs::create_dir_all(&base).await.unwrap();
        let blocked = base.join("not_a_dir");
        fs::write(&blocked, b"file").await.unwrap();
        let store = FileResultStore::new(&blocked);
        let at = Utc.with_ymd_and_hms(2025, 9, 1, 9, 30, 0).unwrap();

        assert!(matches!(
            store.append(&result("Alice", 5), at).await,
            Err(Error::Persistence(_))
        ));
        let _ = fs::remove_dir_all(&base).await;
    }

    #[test]
    fn file_stem_uses_safe_name_and_second_resolution() {
        let at = Utc.with_ymd_and_hms(2025, 9, 1, 9, 30, 15).unwrap();
        let stem = result_file_stem("../Eve", at);
        assert!(stem.starts_with("results____Eve_2025-"));
        assert!(!stem.contains('/'));
    }
}
