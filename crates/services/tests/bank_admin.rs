use quiz_core::model::{BankError, QuestionRecord, SubjectKey};
use quiz_core::time::fixed_clock;
use services::{
    BankService, BankServiceError, Countdown, CsvImportSummary, ManualCountdown, QuizLoopService,
    QuizPhase,
};
use storage::repository::Storage;

async fn sqlite_storage(name: &str) -> Storage {
    Storage::sqlite(&format!("sqlite:file:{name}?mode=memory&cache=shared"))
        .await
        .expect("sqlite storage")
}

#[tokio::test]
async fn imported_subject_can_be_played() {
    let storage = sqlite_storage("bank_admin_import_play").await;
    let banks = BankService::new(storage.banks.clone());

    let key = banks.add_subject("Space Facts").await.unwrap();
    let csv = "\
Largest planet?,Mars,Jupiter,Venus,2
Red planet?,Mars,Earth,1
Missing answer?,yes,no
";
    let summary = banks.import_csv(&key, csv.as_bytes()).await.unwrap();
    assert_eq!(summary, CsvImportSummary { added: 2, skipped: 1 });

    let service = QuizLoopService::new(fixed_clock(), storage.banks.clone(), storage.settings.clone());
    let timer = ManualCountdown::new();
    let mut driver = service.start_quiz(&key, Box::new(timer.clone())).await.unwrap();

    assert_eq!(driver.session().question_count(), 2);
    driver.session_mut().select_answer(0, 1).unwrap();
    driver.session_mut().go_next().unwrap();
    driver.session_mut().select_answer(1, 0).unwrap();
    let report = driver.session_mut().submit().unwrap();

    assert_eq!(report.subject, key);
    assert_eq!(report.score, 2);
    assert_eq!(driver.session().phase(), QuizPhase::Completed);
    assert!(!timer.is_running());
}

#[tokio::test]
async fn seeded_subjects_are_listed_in_key_order() {
    let storage = sqlite_storage("bank_admin_list").await;
    let banks = BankService::new(storage.banks.clone());

    let subjects: Vec<String> = banks
        .list_subjects()
        .await
        .unwrap()
        .into_iter()
        .map(|key| key.display_name())
        .collect();
    assert_eq!(
        subjects,
        vec!["Entertainment", "Geography", "Mathematics", "Programming"]
    );
}

#[tokio::test]
async fn edits_survive_a_new_service() {
    let storage = sqlite_storage("bank_admin_edits").await;
    let key = SubjectKey::new("programming");

    let banks = BankService::new(storage.banks.clone());
    banks
        .add_question(
            &key,
            QuestionRecord::new("Rust's package manager?", vec!["npm".into(), "cargo".into()], 1),
        )
        .await
        .unwrap();
    banks.remove_subject(&SubjectKey::new("entertainment")).await.unwrap();

    let reopened = BankService::new(storage.banks.clone());
    assert_eq!(reopened.questions(&key).await.unwrap().len(), 2);
    let err = reopened
        .remove_subject(&SubjectKey::new("entertainment"))
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        BankServiceError::Bank(BankError::SubjectNotFound(_))
    ));
}

#[tokio::test]
async fn blank_subject_name_is_rejected() {
    let storage = sqlite_storage("bank_admin_blank").await;
    let banks = BankService::new(storage.banks.clone());

    let err = banks.add_subject("   ").await.unwrap_err();
    assert!(matches!(err, BankServiceError::SubjectKey(_)));
}
