use quiz_core::model::{QuestionBank, QuizSettings, QuizSettingsDraft};

use crate::repository::StorageError;

fn ser<E: core::fmt::Display>(e: E) -> StorageError {
    StorageError::Serialization(e.to_string())
}

pub(crate) fn encode_bank(bank: &QuestionBank) -> Result<String, StorageError> {
    serde_json::to_string(bank).map_err(ser)
}

pub(crate) fn decode_bank(raw: &str) -> Result<QuestionBank, StorageError> {
    serde_json::from_str(raw).map_err(ser)
}

pub(crate) fn encode_settings(settings: &QuizSettings) -> Result<String, StorageError> {
    serde_json::to_string(&settings.to_draft()).map_err(ser)
}

pub(crate) fn decode_settings(raw: &str) -> Result<QuizSettings, StorageError> {
    let draft: QuizSettingsDraft = serde_json::from_str(raw).map_err(ser)?;
    draft.validate().map_err(ser)
}
