use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use thiserror::Error;

use crate::model::{QuestionRecord, SubjectKey};

//
// ─── ERRORS ────────────────────────────────────────────────────────────────────
//

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum BankError {
    #[error("subject `{0}` already exists")]
    SubjectExists(SubjectKey),

    #[error("subject `{0}` not found")]
    SubjectNotFound(SubjectKey),

    #[error("subject `{subject}` has no question at position {index}")]
    QuestionNotFound { subject: SubjectKey, index: usize },
}

//
// ─── BANK ──────────────────────────────────────────────────────────────────────
//

/// Every subject and its ordered questions.
///
/// Serialized as a single JSON object keyed by subject, which is the shape of
/// the stored document.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct QuestionBank {
    subjects: BTreeMap<SubjectKey, Vec<QuestionRecord>>,
}

impl QuestionBank {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// The bank used when nothing has been stored yet.
    #[must_use]
    pub fn default_seed() -> Self {
        fn record(question: &str, options: &[&str], answer: i64) -> Vec<QuestionRecord> {
            vec![QuestionRecord::new(
                question,
                options.iter().map(|s| (*s).to_string()).collect(),
                answer,
            )]
        }

        let mut bank = Self::new();
        bank.subjects.insert(
            SubjectKey::new("programming"),
            record(
                "What does HTML stand for?",
                &[
                    "Hyper Text Markup Language",
                    "Home Tool Markup Language",
                    "Hyperlinks and Text Markup Language",
                    "Hyper Tool Multi Language",
                ],
                0,
            ),
        );
        bank.subjects.insert(
            SubjectKey::new("geography"),
            record(
                "Which is the largest continent?",
                &["Africa", "Asia", "Europe", "Australia"],
                1,
            ),
        );
        bank.subjects.insert(
            SubjectKey::new("mathematics"),
            record("What is 2 + 2?", &["3", "4", "5", "6"], 1),
        );
        bank.subjects.insert(
            SubjectKey::new("entertainment"),
            record(
                "Who is known as the King of Pop?",
                &["Elvis Presley", "Michael Jackson", "Freddie Mercury", "Prince"],
                1,
            ),
        );
        bank
    }

    #[must_use]
    pub fn questions(&self, subject: &SubjectKey) -> Option<&[QuestionRecord]> {
        self.subjects.get(subject).map(Vec::as_slice)
    }

    pub fn subjects(&self) -> impl Iterator<Item = &SubjectKey> {
        self.subjects.keys()
    }

    #[must_use]
    pub fn contains_subject(&self, subject: &SubjectKey) -> bool {
        self.subjects.contains_key(subject)
    }

    #[must_use]
    pub fn subject_count(&self) -> usize {
        self.subjects.len()
    }

    /// Adds an empty subject.
    ///
    /// # Errors
    ///
    /// Returns `BankError::SubjectExists` if the key is taken.
    pub fn add_subject(&mut self, subject: SubjectKey) -> Result<(), BankError> {
        if self.subjects.contains_key(&subject) {
            return Err(BankError::SubjectExists(subject));
        }
        self.subjects.insert(subject, Vec::new());
        Ok(())
    }

    /// Moves a subject's questions under a new key.
    ///
    /// # Errors
    ///
    /// Returns `BankError::SubjectNotFound` if `from` is missing and
    /// `BankError::SubjectExists` if `to` is already used.
    pub fn rename_subject(&mut self, from: &SubjectKey, to: SubjectKey) -> Result<(), BankError> {
        if !self.subjects.contains_key(from) {
            return Err(BankError::SubjectNotFound(from.clone()));
        }
        if self.subjects.contains_key(&to) {
            return Err(BankError::SubjectExists(to));
        }
        let questions = self.subjects.remove(from).unwrap_or_default();
        self.subjects.insert(to, questions);
        Ok(())
    }

    /// Removes a subject with all its questions.
    ///
    /// # Errors
    ///
    /// Returns `BankError::SubjectNotFound` if the subject is missing.
    pub fn remove_subject(&mut self, subject: &SubjectKey) -> Result<Vec<QuestionRecord>, BankError> {
        self.subjects
            .remove(subject)
            .ok_or_else(|| BankError::SubjectNotFound(subject.clone()))
    }

    /// # Errors
    ///
    /// Returns `BankError::SubjectNotFound` if the subject is missing.
    pub fn push_question(
        &mut self,
        subject: &SubjectKey,
        question: QuestionRecord,
    ) -> Result<usize, BankError> {
        let questions = self.questions_mut(subject)?;
        questions.push(question);
        Ok(questions.len() - 1)
    }

    /// # Errors
    ///
    /// Returns `BankError::SubjectNotFound` or `BankError::QuestionNotFound`.
    pub fn replace_question(
        &mut self,
        subject: &SubjectKey,
        index: usize,
        question: QuestionRecord,
    ) -> Result<QuestionRecord, BankError> {
        let questions = self.questions_mut(subject)?;
        let slot = questions
            .get_mut(index)
            .ok_or_else(|| BankError::QuestionNotFound {
                subject: subject.clone(),
                index,
            })?;
        Ok(std::mem::replace(slot, question))
    }

    /// # Errors
    ///
    /// Returns `BankError::SubjectNotFound` or `BankError::QuestionNotFound`.
    pub fn remove_question(
        &mut self,
        subject: &SubjectKey,
        index: usize,
    ) -> Result<QuestionRecord, BankError> {
        let questions = self.questions_mut(subject)?;
        if index >= questions.len() {
            return Err(BankError::QuestionNotFound {
                subject: subject.clone(),
                index,
            });
        }
        Ok(questions.remove(index))
    }

    fn questions_mut(&mut self, subject: &SubjectKey) -> Result<&mut Vec<QuestionRecord>, BankError> {
        self.subjects
            .get_mut(subject)
            .ok_or_else(|| BankError::SubjectNotFound(subject.clone()))
    }
}
