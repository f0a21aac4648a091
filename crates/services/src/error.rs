//! Shared error types for the services crate.

use thiserror::Error;

use quiz_core::model::{BankError, QuestionError, SubjectKey, SubjectKeyError};
use storage::repository::StorageError;

use crate::quiz::QuizPhase;

/// A session operation that is not allowed right now.
///
/// Rejected operations leave the session untouched.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum InvalidOperation {
    #[error("{operation} needs a session that is {expected}, but it is {actual}")]
    WrongPhase {
        operation: &'static str,
        expected: QuizPhase,
        actual: QuizPhase,
    },
    #[error("question {index} is not the current question ({current})")]
    NotCurrent { index: usize, current: usize },
    #[error("question {index} is already locked")]
    AlreadyLocked { index: usize },
    #[error("option {option} does not exist, the question has {count} options")]
    OptionOutOfRange { option: usize, count: usize },
}

/// Errors emitted by `QuizSession`.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum QuizError {
    #[error("subject {subject} has no questions")]
    EmptyQuestionSet { subject: SubjectKey },
    #[error("question {position} is invalid: {source}")]
    InvalidQuestion {
        position: usize,
        source: QuestionError,
    },
    #[error(transparent)]
    InvalidOperation(#[from] InvalidOperation),
}

/// Errors emitted by `QuizLoopService`.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum QuizServiceError {
    #[error(transparent)]
    Quiz(#[from] QuizError),
    #[error(transparent)]
    Storage(#[from] StorageError),
}

/// Errors emitted by `BankService`.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum BankServiceError {
    #[error(transparent)]
    Bank(#[from] BankError),
    #[error(transparent)]
    Question(#[from] QuestionError),
    #[error(transparent)]
    SubjectKey(#[from] SubjectKeyError),
    #[error("could not read csv: {0}")]
    Csv(#[from] csv::Error),
    #[error(transparent)]
    Storage(#[from] StorageError),
}
