mod events;
mod session;
mod view;
mod workflow;

// Public API of the quiz subsystem.
pub use crate::error::{InvalidOperation, QuizError};
pub use events::{TimerEvent, TimerEvents};
pub use session::{AnswerOutcome, ExpiryOutcome, QuizPhase, QuizSession, TimerOutcome};
pub use view::{
    EntryOutcome, NO_ANSWER, OptionStatus, OptionView, QuestionView, QuizReport, ReportEntry,
    ScoreSummary,
};
pub use workflow::{QuizDriver, QuizLoopService};
