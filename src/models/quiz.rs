use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// The single active quiz: the generated text plus its access window.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuizRecord {
    pub quiz_text: String,
    #[serde(with = "crate::utils::time::timestamp")]
    pub start_time: DateTime<Utc>,
    #[serde(with = "crate::utils::time::timestamp")]
    pub end_time: DateTime<Utc>,
}

/// Where `now` falls relative to the quiz window.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WindowState {
    BeforeWindow,
    Open,
    Expired,
}

impl QuizRecord {
    pub fn window_state(&self, now: DateTime<Utc>) -> WindowState {
        if now < self.start_time {
            WindowState::BeforeWindow
        } else if now > self.end_time {
            WindowState::Expired
        } else {
            WindowState::Open
        }
    }
}
