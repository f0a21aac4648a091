use serde::{Deserialize, Serialize};
use thiserror::Error;

//
// ─── ERRORS ────────────────────────────────────────────────────────────────────
//

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum QuestionError {
    #[error("question text cannot be empty")]
    EmptyText,

    #[error("a question needs at least 2 options, got {count}")]
    TooFewOptions { count: usize },

    #[error("correct answer {index} is out of range for {count} options")]
    CorrectIndexOutOfRange { index: i64, count: usize },
}

//
// ─── PERSISTED SHAPE ───────────────────────────────────────────────────────────
//

/// A question as it is stored in the bank document.
///
/// Nothing is validated here: stored documents may be hand-edited or come
/// from older versions, so invalid records are only rejected when a quiz is
/// started from them.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuestionRecord {
    pub question: String,
    pub options: Vec<String>,
    /// Zero-based index of the correct option.
    pub answer: i64,
}

impl QuestionRecord {
    #[must_use]
    pub fn new(question: impl Into<String>, options: Vec<String>, answer: i64) -> Self {
        Self {
            question: question.into(),
            options,
            answer,
        }
    }

    /// Check structural invariants and produce a session-ready `Question`.
    ///
    /// # Errors
    ///
    /// Returns `QuestionError` when the text is blank, there are fewer than
    /// two options, or `answer` does not point at an option.
    pub fn validate(&self) -> Result<Question, QuestionError> {
        let correct_index = usize::try_from(self.answer).map_err(|_| {
            QuestionError::CorrectIndexOutOfRange {
                index: self.answer,
                count: self.options.len(),
            }
        })?;
        Question::new(self.question.clone(), self.options.clone(), correct_index)
    }
}

//
// ─── VALIDATED QUESTION ────────────────────────────────────────────────────────
//

/// A multiple-choice question whose invariants have been checked.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Question {
    text: String,
    options: Vec<String>,
    correct_index: usize,
}

impl Question {
    /// # Errors
    ///
    /// Returns `QuestionError` if the text is blank, fewer than two options are
    /// given, or `correct_index` is out of range.
    pub fn new(
        text: impl Into<String>,
        options: Vec<String>,
        correct_index: usize,
    ) -> Result<Self, QuestionError> {
        let text = text.into();
        if text.trim().is_empty() {
            return Err(QuestionError::EmptyText);
        }
        if options.len() < 2 {
            return Err(QuestionError::TooFewOptions {
                count: options.len(),
            });
        }
        if correct_index >= options.len() {
            return Err(QuestionError::CorrectIndexOutOfRange {
                index: i64::try_from(correct_index).unwrap_or(i64::MAX),
                count: options.len(),
            });
        }

        Ok(Self {
            text,
            options,
            correct_index,
        })
    }

    #[must_use]
    pub fn text(&self) -> &str {
        &self.text
    }

    #[must_use]
    pub fn options(&self) -> &[String] {
        &self.options
    }

    #[must_use]
    pub fn option(&self, index: usize) -> Option<&str> {
        self.options.get(index).map(String::as_str)
    }

    #[must_use]
    pub fn option_count(&self) -> usize {
        self.options.len()
    }

    #[must_use]
    pub fn correct_index(&self) -> usize {
        self.correct_index
    }

    #[must_use]
    pub fn correct_option(&self) -> &str {
        &self.options[self.correct_index]
    }

    #[must_use]
    pub fn is_correct(&self, option: usize) -> bool {
        option == self.correct_index
    }

    /// Converts back into the persisted shape.
    #[must_use]
    pub fn to_record(&self) -> QuestionRecord {
        QuestionRecord {
            question: self.text.clone(),
            options: self.options.clone(),
            answer: i64::try_from(self.correct_index).unwrap_or(i64::MAX),
        }
    }
}
