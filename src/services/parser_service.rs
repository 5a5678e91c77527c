use crate::error::ParseError;
use crate::models::question::{Question, QuizDocument};
use serde_json::Value as JsonValue;

pub const OPTIONS_PER_QUESTION: usize = 4;

/// Decodes generated quiz text into its questions, in document order.
///
/// Either every question is valid or the whole document is rejected; a partial
/// list is never returned.
pub fn parse_quiz(raw_text: &str) -> Result<Vec<Question>, ParseError> {
    let value: JsonValue =
        serde_json::from_str(raw_text).map_err(|e| ParseError::InvalidJson(e.to_string()))?;

    let document: QuizDocument =
        serde_json::from_value(value).map_err(|e| ParseError::UnexpectedSchema(e.to_string()))?;

    for (index, question) in document.questions.iter().enumerate() {
        validate_question(question).map_err(|reason| ParseError::InvalidQuestion {
            index: index + 1,
            reason,
        })?;
    }

    Ok(document.questions)
}

fn validate_question(q: &Question) -> Result<(), String> {
    if q.question.trim().is_empty() {
        return Err("empty question text".to_string());
    }

    if q.options.len() != OPTIONS_PER_QUESTION {
        return Err(format!(
            "expected {} options, found {}",
            OPTIONS_PER_QUESTION,
            q.options.len()
        ));
    }

    let labels = q.option_labels();
    if let Some(pos) = labels.iter().position(|l| l.is_none()) {
        return Err(format!("option {} has no letter label", pos + 1));
    }

    let Some(correct) = q.correct_letter() else {
        return Err(format!("correct answer {:?} is not a single letter", q.correct));
    };
    if !labels.contains(&Some(correct)) {
        return Err(format!("correct answer {} matches no option", correct));
    }

    Ok(())
}
