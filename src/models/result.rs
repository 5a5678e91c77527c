use serde::{Deserialize, Serialize};

/// One question of a submission, as stored for later review.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnswerRecord {
    pub question: String,
    pub student_answer: String,
    pub correct_answer: String,
    pub explanation: String,
}

/// A scored submission. Written once, never modified.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResultRecord {
    pub student_name: String,
    pub score: u32,
    pub answers: Vec<AnswerRecord>,
}

/// Row of the instructor's marks table.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResultRow {
    pub student: String,
    pub score: u32,
}

impl From<&ResultRecord> for ResultRow {
    fn from(r: &ResultRecord) -> Self {
        Self {
            student: r.student_name.clone(),
            score: r.score,
        }
    }
}
