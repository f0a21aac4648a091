#![forbid(unsafe_code)]

pub mod bank_service;
pub mod csv_import;
pub mod error;
pub mod quiz;
pub mod timer;

pub use quiz_core::Clock;

pub use bank_service::BankService;
pub use csv_import::CsvImportSummary;
pub use error::{BankServiceError, InvalidOperation, QuizError, QuizServiceError};
pub use quiz::{
    AnswerOutcome, EntryOutcome, ExpiryOutcome, NO_ANSWER, OptionStatus, OptionView, QuestionView,
    QuizDriver, QuizLoopService, QuizPhase, QuizReport, QuizSession, ReportEntry, ScoreSummary,
    TimerEvent, TimerEvents, TimerOutcome,
};
pub use timer::{Countdown, ManualCountdown, TimerError, TokioCountdown};
