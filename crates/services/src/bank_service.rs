use std::io;
use std::sync::Arc;

use quiz_core::model::{BankError, QuestionBank, QuestionRecord, SubjectKey};
use storage::repository::QuestionBankRepository;

use crate::csv_import::{self, CsvImportSummary};
use crate::error::BankServiceError;

/// Administration of the stored question bank.
///
/// Every write loads the current document, applies one change and stores the
/// whole bank again.
#[derive(Clone)]
pub struct BankService {
    banks: Arc<dyn QuestionBankRepository>,
}

impl BankService {
    #[must_use]
    pub fn new(banks: Arc<dyn QuestionBankRepository>) -> Self {
        Self { banks }
    }

    /// Load the stored bank, or the built-in seed when nothing is stored yet.
    ///
    /// # Errors
    ///
    /// Returns `BankServiceError::Storage` if the document cannot be read.
    pub async fn load_bank(&self) -> Result<QuestionBank, BankServiceError> {
        let bank = self.banks.load_bank().await?;
        Ok(bank.unwrap_or_else(|| {
            tracing::debug!("no stored question bank, using default seed");
            QuestionBank::default_seed()
        }))
    }

    /// # Errors
    ///
    /// Returns `BankServiceError::Storage` if the document cannot be read.
    pub async fn list_subjects(&self) -> Result<Vec<SubjectKey>, BankServiceError> {
        let bank = self.load_bank().await?;
        Ok(bank.subjects().cloned().collect())
    }

    /// Stored records for one subject, valid or not.
    ///
    /// # Errors
    ///
    /// Returns `BankError::SubjectNotFound` for unknown subjects.
    pub async fn questions(&self, subject: &SubjectKey) -> Result<Vec<QuestionRecord>, BankServiceError> {
        let bank = self.load_bank().await?;
        let questions = bank
            .questions(subject)
            .ok_or_else(|| BankError::SubjectNotFound(subject.clone()))?;
        Ok(questions.to_vec())
    }

    /// Create an empty subject from a display name such as `"World History"`.
    ///
    /// # Errors
    ///
    /// Returns `BankServiceError::SubjectKey` for a blank name and
    /// `BankError::SubjectExists` when the normalized key is taken.
    pub async fn add_subject(&self, display_name: &str) -> Result<SubjectKey, BankServiceError> {
        let key = SubjectKey::from_display_name(display_name)?;
        self.mutate(|bank| {
            bank.add_subject(key.clone())?;
            Ok(())
        })
        .await?;
        tracing::info!(subject = %key, "subject added");
        Ok(key)
    }

    /// # Errors
    ///
    /// Returns `BankError::SubjectNotFound` or `BankError::SubjectExists`.
    pub async fn rename_subject(
        &self,
        subject: &SubjectKey,
        display_name: &str,
    ) -> Result<SubjectKey, BankServiceError> {
        let key = SubjectKey::from_display_name(display_name)?;
        self.mutate(|bank| {
            bank.rename_subject(subject, key.clone())?;
            Ok(())
        })
        .await?;
        tracing::info!(from = %subject, to = %key, "subject renamed");
        Ok(key)
    }

    /// Delete a subject and its questions; returns how many questions went
    /// with it.
    ///
    /// # Errors
    ///
    /// Returns `BankError::SubjectNotFound` for unknown subjects.
    pub async fn remove_subject(&self, subject: &SubjectKey) -> Result<usize, BankServiceError> {
        let removed = self
            .mutate(|bank| Ok(bank.remove_subject(subject)?.len()))
            .await?;
        tracing::info!(subject = %subject, questions = removed, "subject removed");
        Ok(removed)
    }

    /// Append a question and return its index.
    ///
    /// # Errors
    ///
    /// Returns `BankServiceError::Question` if the record is malformed and
    /// `BankError::SubjectNotFound` for unknown subjects.
    pub async fn add_question(
        &self,
        subject: &SubjectKey,
        record: QuestionRecord,
    ) -> Result<usize, BankServiceError> {
        record.validate()?;
        let index = self
            .mutate(|bank| Ok(bank.push_question(subject, record)?))
            .await?;
        tracing::debug!(subject = %subject, index, "question added");
        Ok(index)
    }

    /// # Errors
    ///
    /// Returns `BankServiceError::Question` if the record is malformed, or
    /// `BankError` when the subject or index does not exist.
    pub async fn update_question(
        &self,
        subject: &SubjectKey,
        index: usize,
        record: QuestionRecord,
    ) -> Result<(), BankServiceError> {
        record.validate()?;
        self.mutate(|bank| {
            bank.replace_question(subject, index, record)?;
            Ok(())
        })
        .await?;
        tracing::debug!(subject = %subject, index, "question updated");
        Ok(())
    }

    /// # Errors
    ///
    /// Returns `BankError` when the subject or index does not exist.
    pub async fn delete_question(
        &self,
        subject: &SubjectKey,
        index: usize,
    ) -> Result<QuestionRecord, BankServiceError> {
        let removed = self
            .mutate(|bank| Ok(bank.remove_question(subject, index)?))
            .await?;
        tracing::debug!(subject = %subject, index, "question deleted");
        Ok(removed)
    }

    /// Append every valid question from a CSV source to `subject`.
    ///
    /// # Errors
    ///
    /// Returns `BankError::SubjectNotFound` for unknown subjects and
    /// `BankServiceError::Csv` if the source cannot be read.
    pub async fn import_csv<R: io::Read>(
        &self,
        subject: &SubjectKey,
        reader: R,
    ) -> Result<CsvImportSummary, BankServiceError> {
        let parsed = csv_import::parse_questions(reader)?;
        let skipped = parsed.skipped;

        let added = self
            .mutate(|bank| {
                if !bank.contains_subject(subject) {
                    return Err(BankError::SubjectNotFound(subject.clone()).into());
                }
                let added = parsed.records.len();
                for record in parsed.records {
                    bank.push_question(subject, record)?;
                }
                Ok(added)
            })
            .await?;

        tracing::info!(subject = %subject, added, skipped, "csv import finished");
        Ok(CsvImportSummary { added, skipped })
    }

    async fn mutate<T>(
        &self,
        change: impl FnOnce(&mut QuestionBank) -> Result<T, BankServiceError>,
    ) -> Result<T, BankServiceError> {
        let mut bank = self.load_bank().await?;
        let value = change(&mut bank)?;
        self.banks.save_bank(&bank).await?;
        Ok(value)
    }
}
