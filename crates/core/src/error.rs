use thiserror::Error;

use crate::model::{BankError, QuestionError, QuizSettingsError, SubjectKeyError};

/// Any validation failure from the core model.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum Error {
    #[error(transparent)]
    Question(#[from] QuestionError),
    #[error(transparent)]
    SubjectKey(#[from] SubjectKeyError),
    #[error(transparent)]
    Bank(#[from] BankError),
    #[error(transparent)]
    Settings(#[from] QuizSettingsError),
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{QuestionRecord, QuizSettings, SubjectKey};

    fn start_checks(record: &QuestionRecord, name: &str) -> Result<SubjectKey, Error> {
        record.validate()?;
        QuizSettings::default().with_question_time_secs(30)?;
        Ok(SubjectKey::from_display_name(name)?)
    }

    #[test]
    fn model_errors_convert_with_question_mark() {
        let good = QuestionRecord::new("q", vec!["a".into(), "b".into()], 0);
        assert_eq!(start_checks(&good, "Art").unwrap().as_str(), "art");

        let err = start_checks(&good, " ").unwrap_err();
        assert!(matches!(err, Error::SubjectKey(SubjectKeyError::Empty)));

        let bad = QuestionRecord::new("q", vec!["a".into()], 0);
        let err = start_checks(&bad, "Art").unwrap_err();
        assert_eq!(err.to_string(), "a question needs at least 2 options, got 1");
    }
}
