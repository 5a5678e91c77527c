use crate::error::{Error, Result};
use crate::models::question::{option_label, Question};
use crate::models::result::AnswerRecord;

pub struct GradingService;

impl GradingService {
    /// Counts answers whose leading letter equals the question's correct letter.
    ///
    /// `answers` must be positionally aligned with `questions`; an empty answer
    /// is malformed input, not a wrong answer.
    pub fn score(questions: &[Question], answers: &[String]) -> Result<u32> {
        if answers.len() != questions.len() {
            return Err(Error::Submission(format!(
                "expected {} answers, received {}",
                questions.len(),
                answers.len()
            )));
        }

        let mut earned = 0;
        for (idx, (q, answer)) in questions.iter().zip(answers).enumerate() {
            let Some(selected) = option_label(answer) else {
                return Err(Error::Submission(format!(
                    "answer to question {} has no option letter",
                    idx + 1
                )));
            };
            if q.correct_letter() == Some(selected) {
                earned += 1;
            }
        }
        Ok(earned)
    }

    /// Validates a raw submission, scores it and builds the review entries.
    pub fn grade_submission(
        questions: &[Question],
        answers: &[Option<String>],
    ) -> Result<(u32, Vec<AnswerRecord>)> {
        if answers.len() != questions.len() || answers.iter().any(|a| a.is_none()) {
            return Err(Error::Submission(
                "Answer all questions before submitting.".to_string(),
            ));
        }
        let answers: Vec<String> = answers.iter().flatten().cloned().collect();

        let score = Self::score(questions, &answers)?;

        let graded = questions
            .iter()
            .zip(answers)
            .map(|(q, student_answer)| AnswerRecord {
                question: q.question.clone(),
                student_answer,
                correct_answer: q.correct.clone(),
                explanation: q.explanation.clone(),
            })
            .collect();

        Ok((score, graded))
    }
}
