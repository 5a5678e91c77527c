use serde::{Deserialize, Serialize};

/// One multiple-choice question as produced by the generation service.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Question {
    pub question: String,
    /// Four options, each starting with its letter label, e.g. `"A. ..."`.
    pub options: Vec<String>,
    /// Letter of the correct option.
    pub correct: String,
    pub explanation: String,
}

/// Top-level document the generation service is asked to return.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QuizDocument {
    #[serde(alias = "quiz")]
    pub questions: Vec<Question>,
}

impl Question {
    /// Letter labels of the options, in order. `None` for an unlabeled option.
    pub fn option_labels(&self) -> Vec<Option<char>> {
        self.options.iter().map(|o| option_label(o)).collect()
    }

    pub fn correct_letter(&self) -> Option<char> {
        let trimmed = self.correct.trim();
        let mut chars = trimmed.chars();
        match (chars.next(), chars.next()) {
            (Some(c), None) if c.is_ascii_alphabetic() => Some(c),
            _ => None,
        }
    }
}

/// Leading letter of an option or a submitted answer.
pub fn option_label(option: &str) -> Option<char> {
    option
        .trim_start()
        .chars()
        .next()
        .filter(|c| c.is_ascii_alphabetic())
}

/// A question as shown to students: no answer key.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PublicQuestion {
    pub number: usize,
    pub question: String,
    pub options: Vec<String>,
}

impl PublicQuestion {
    pub fn from_question(index: usize, q: &Question) -> Self {
        Self {
            number: index + 1,
            question: q.question.clone(),
            options: q.options.clone(),
        }
    }
}
