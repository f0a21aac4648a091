mod answer;
mod bank;
mod ids;
mod question;
mod settings;
mod subject;

pub use answer::AnswerRecord;
pub use bank::{BankError, QuestionBank};
pub use ids::{AttemptId, ParseIdError};
pub use question::{Question, QuestionError, QuestionRecord};
pub use settings::{QuizSettings, QuizSettingsDraft, QuizSettingsError};
pub use subject::{SubjectKey, SubjectKeyError};
