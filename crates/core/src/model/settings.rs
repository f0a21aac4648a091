use serde::{Deserialize, Serialize};
use std::time::Duration;
use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum QuizSettingsError {
    #[error("question time must be between 1 and 600 seconds, got {0}")]
    InvalidQuestionTime(u32),

    #[error("timeout pause must be at most 10000 ms, got {0}")]
    InvalidTimeoutPause(u64),
}

const MAX_QUESTION_TIME_SECS: u32 = 600;
const MAX_TIMEOUT_PAUSE_MS: u64 = 10_000;

/// Deployment-wide quiz configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct QuizSettings {
    question_time_secs: u32,
    timeout_pause_ms: u64,
    shuffle_questions: bool,
}

/// Unvalidated settings, as persisted or entered by an operator.
///
/// Missing fields fall back to the defaults.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct QuizSettingsDraft {
    pub question_time_secs: u32,
    pub timeout_pause_ms: u64,
    pub shuffle_questions: bool,
}

impl Default for QuizSettingsDraft {
    fn default() -> Self {
        QuizSettings::default().to_draft()
    }
}

impl QuizSettingsDraft {
    /// # Errors
    ///
    /// Returns `QuizSettingsError` when a value is outside its allowed range.
    pub fn validate(self) -> Result<QuizSettings, QuizSettingsError> {
        if !(1..=MAX_QUESTION_TIME_SECS).contains(&self.question_time_secs) {
            return Err(QuizSettingsError::InvalidQuestionTime(
                self.question_time_secs,
            ));
        }
        if self.timeout_pause_ms > MAX_TIMEOUT_PAUSE_MS {
            return Err(QuizSettingsError::InvalidTimeoutPause(self.timeout_pause_ms));
        }

        Ok(QuizSettings {
            question_time_secs: self.question_time_secs,
            timeout_pause_ms: self.timeout_pause_ms,
            shuffle_questions: self.shuffle_questions,
        })
    }
}

impl Default for QuizSettings {
    /// 30 seconds per question and a one second pause after a timeout.
    fn default() -> Self {
        Self {
            question_time_secs: 30,
            timeout_pause_ms: 1_000,
            shuffle_questions: false,
        }
    }
}

impl QuizSettings {
    /// Returns a copy with a different per-question time limit.
    ///
    /// # Errors
    ///
    /// Returns `QuizSettingsError::InvalidQuestionTime` if out of range.
    pub fn with_question_time_secs(self, secs: u32) -> Result<Self, QuizSettingsError> {
        QuizSettingsDraft {
            question_time_secs: secs,
            ..self.to_draft()
        }
        .validate()
    }

    #[must_use]
    pub fn question_time_secs(&self) -> u32 {
        self.question_time_secs
    }

    #[must_use]
    pub fn timeout_pause(&self) -> Duration {
        Duration::from_millis(self.timeout_pause_ms)
    }

    #[must_use]
    pub fn shuffle_questions(&self) -> bool {
        self.shuffle_questions
    }

    #[must_use]
    pub fn to_draft(&self) -> QuizSettingsDraft {
        QuizSettingsDraft {
            question_time_secs: self.question_time_secs,
            timeout_pause_ms: self.timeout_pause_ms,
            shuffle_questions: self.shuffle_questions,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_validate() {
        let settings = QuizSettingsDraft::default().validate().unwrap();
        assert_eq!(settings, QuizSettings::default());
        assert_eq!(settings.question_time_secs(), 30);
        assert_eq!(settings.timeout_pause(), Duration::from_secs(1));
    }

    #[test]
    fn zero_question_time_is_rejected() {
        let err = QuizSettings::default().with_question_time_secs(0).unwrap_err();
        assert_eq!(err, QuizSettingsError::InvalidQuestionTime(0));
    }

    #[test]
    fn long_pause_is_rejected() {
        let draft = QuizSettingsDraft {
            timeout_pause_ms: 60_000,
            ..QuizSettingsDraft::default()
        };
        assert_eq!(
            draft.validate().unwrap_err(),
            QuizSettingsError::InvalidTimeoutPause(60_000)
        );
    }

    #[test]
    fn partial_document_fills_defaults() {
        let draft: QuizSettingsDraft =
            serde_json::from_str(r#"{"question_time_secs":20}"#).unwrap();
        let settings = draft.validate().unwrap();
        assert_eq!(settings.question_time_secs(), 20);
        assert!(!settings.shuffle_questions());
    }
}
