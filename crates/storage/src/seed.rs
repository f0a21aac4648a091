//! First-run population of a store with the default question bank and
//! settings.

use quiz_core::model::{QuestionBank, QuizSettings};

use crate::repository::{Storage, StorageError};

#[derive(Debug, Clone, Copy, Default)]
pub struct SeedOptions {
    /// Replace stored data with the defaults.
    pub force: bool,
    /// Settings to store regardless of what is already there.
    pub settings: Option<QuizSettings>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SeedOutcome {
    pub bank_written: bool,
    pub settings_written: bool,
    /// The settings in effect after seeding.
    pub settings: QuizSettings,
}

/// Write the default bank and settings where nothing is stored yet.
///
/// Existing data is kept unless `force` is set. Explicit settings are always
/// written.
///
/// # Errors
///
/// Returns `StorageError` if reading or writing either document fails.
pub async fn seed(storage: &Storage, options: SeedOptions) -> Result<SeedOutcome, StorageError> {
    let bank_written = if storage.banks.load_bank().await?.is_none() || options.force {
        let bank = QuestionBank::default_seed();
        storage.banks.save_bank(&bank).await?;
        tracing::info!(subjects = bank.subject_count(), "seeded question bank");
        true
    } else {
        tracing::info!("question bank already present, leaving it untouched");
        false
    };

    let stored = storage.settings.get_settings().await?;
    let (settings, settings_written) = match (options.settings, stored) {
        (Some(explicit), _) => (explicit, true),
        (None, Some(stored)) if !options.force => {
            tracing::info!("settings already present, leaving them untouched");
            (stored, false)
        }
        (None, _) => (QuizSettings::default(), true),
    };
    if settings_written {
        storage.settings.save_settings(&settings).await?;
    }

    Ok(SeedOutcome {
        bank_written,
        settings_written,
        settings,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use quiz_core::model::SubjectKey;

    fn twelve_seconds() -> QuizSettings {
        QuizSettings::default().with_question_time_secs(12).unwrap()
    }

    #[tokio::test]
    async fn empty_store_gets_defaults() {
        let storage = Storage::in_memory();
        let outcome = seed(&storage, SeedOptions::default()).await.unwrap();

        assert!(outcome.bank_written);
        assert!(outcome.settings_written);
        assert_eq!(outcome.settings, QuizSettings::default());
        assert_eq!(
            storage.banks.load_bank().await.unwrap(),
            Some(QuestionBank::default_seed())
        );
    }

    #[tokio::test]
    async fn rerun_keeps_stored_time_limit() {
        let storage = Storage::in_memory();
        storage.settings.save_settings(&twelve_seconds()).await.unwrap();

        let outcome = seed(&storage, SeedOptions::default()).await.unwrap();

        assert!(!outcome.settings_written);
        assert_eq!(outcome.settings.question_time_secs(), 12);
        assert_eq!(
            storage.settings.get_settings().await.unwrap(),
            Some(twelve_seconds())
        );
    }

    #[tokio::test]
    async fn explicit_settings_replace_stored_ones() {
        let storage = Storage::in_memory();
        storage.settings.save_settings(&twelve_seconds()).await.unwrap();
        let wanted = QuizSettings::default().with_question_time_secs(45).unwrap();

        let outcome = seed(
            &storage,
            SeedOptions {
                force: false,
                settings: Some(wanted),
            },
        )
        .await
        .unwrap();

        assert!(outcome.settings_written);
        assert_eq!(storage.settings.get_settings().await.unwrap(), Some(wanted));
    }

    #[tokio::test]
    async fn force_restores_defaults() {
        let storage = Storage::in_memory();
        let mut bank = QuestionBank::new();
        bank.add_subject(SubjectKey::new("custom")).unwrap();
        storage.banks.save_bank(&bank).await.unwrap();
        storage.settings.save_settings(&twelve_seconds()).await.unwrap();

        let outcome = seed(
            &storage,
            SeedOptions {
                force: true,
                settings: None,
            },
        )
        .await
        .unwrap();

        assert!(outcome.bank_written);
        assert_eq!(outcome.settings, QuizSettings::default());
        assert_eq!(
            storage.banks.load_bank().await.unwrap(),
            Some(QuestionBank::default_seed())
        );
    }
}
