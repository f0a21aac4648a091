use async_trait::async_trait;
use chrono::Utc;
use quiz_core::model::{QuestionBank, QuizSettings};
use sqlx::Row;

use crate::repository::{
    QUESTION_BANK_KEY, QuestionBankRepository, SETTINGS_KEY, SettingsRepository, StorageError,
};

use super::SqliteRepository;
use super::mapping::{decode_bank, decode_settings, encode_bank, encode_settings};

impl SqliteRepository {
    /// Fetch the raw document stored under `key`.
    ///
    /// # Errors
    ///
    /// Returns `StorageError::Connection` on query failures.
    pub async fn get_document(&self, key: &str) -> Result<Option<String>, StorageError> {
        let row = sqlx::query("SELECT value FROM documents WHERE key = ?1")
            .bind(key)
            .fetch_optional(&self.pool)
            .await
            .map_err(|err| StorageError::Connection(err.to_string()))?;

        let Some(row) = row else {
            tracing::debug!(key, "document not found");
            return Ok(None);
        };

        let value: String = row
            .try_get("value")
            .map_err(|err| StorageError::Serialization(err.to_string()))?;
        tracing::debug!(key, bytes = value.len(), "loaded document");
        Ok(Some(value))
    }

    /// Insert or replace the document stored under `key`.
    ///
    /// # Errors
    ///
    /// Returns `StorageError::Connection` on query failures.
    pub async fn put_document(&self, key: &str, value: &str) -> Result<(), StorageError> {
        sqlx::query(
            r"
            INSERT INTO documents (key, value, updated_at)
            VALUES (?1, ?2, ?3)
            ON CONFLICT(key) DO UPDATE SET
                value = excluded.value,
                updated_at = excluded.updated_at
            ",
        )
        .bind(key)
        .bind(value)
        .bind(Utc::now())
        .execute(&self.pool)
        .await
        .map_err(|err| StorageError::Connection(err.to_string()))?;

        tracing::debug!(key, bytes = value.len(), "stored document");
        Ok(())
    }
}

#[async_trait]
impl QuestionBankRepository for SqliteRepository {
    async fn load_bank(&self) -> Result<Option<QuestionBank>, StorageError> {
        self.get_document(QUESTION_BANK_KEY)
            .await?
            .map(|raw| decode_bank(&raw))
            .transpose()
    }

    async fn save_bank(&self, bank: &QuestionBank) -> Result<(), StorageError> {
        let raw = encode_bank(bank)?;
        self.put_document(QUESTION_BANK_KEY, &raw).await
    }
}

#[async_trait]
impl SettingsRepository for SqliteRepository {
    async fn get_settings(&self) -> Result<Option<QuizSettings>, StorageError> {
        self.get_document(SETTINGS_KEY)
            .await?
            .map(|raw| decode_settings(&raw))
            .transpose()
    }

    async fn save_settings(&self, settings: &QuizSettings) -> Result<(), StorageError> {
        let raw = encode_settings(settings)?;
        self.put_document(SETTINGS_KEY, &raw).await
    }
}
