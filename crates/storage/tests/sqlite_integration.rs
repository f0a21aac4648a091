use quiz_core::model::{QuestionBank, QuestionRecord, QuizSettings, SubjectKey};
use storage::repository::{
    QUESTION_BANK_KEY, QuestionBankRepository, SettingsRepository, StorageError,
};
use storage::sqlite::SqliteRepository;

async fn connect(name: &str) -> SqliteRepository {
    let repo = SqliteRepository::connect(&format!("sqlite:file:{name}?mode=memory&cache=shared"))
        .await
        .expect("connect");
    repo.migrate().await.expect("migrate");
    repo
}

#[tokio::test]
async fn sqlite_bank_roundtrip() {
    let repo = connect("memdb_bank_roundtrip").await;
    assert!(repo.load_bank().await.unwrap().is_none());

    let mut bank = QuestionBank::default_seed();
    let key = SubjectKey::new("mathematics");
    bank.push_question(
        &key,
        QuestionRecord::new("3*3?", vec!["6".into(), "9".into()], 1),
    )
    .unwrap();
    repo.save_bank(&bank).await.unwrap();

    let loaded = repo.load_bank().await.unwrap().expect("bank stored");
    assert_eq!(loaded, bank);
    assert_eq!(loaded.questions(&key).unwrap().len(), 2);
}

#[tokio::test]
async fn sqlite_save_replaces_previous_document() {
    let repo = connect("memdb_bank_replace").await;
    repo.save_bank(&QuestionBank::default_seed()).await.unwrap();

    let mut smaller = QuestionBank::new();
    smaller.add_subject(SubjectKey::new("empty")).unwrap();
    repo.save_bank(&smaller).await.unwrap();

    let loaded = repo.load_bank().await.unwrap().unwrap();
    assert_eq!(loaded.subject_count(), 1);
}

#[tokio::test]
async fn sqlite_reports_corrupt_bank_document() {
    let repo = connect("memdb_bank_corrupt").await;
    repo.put_document(QUESTION_BANK_KEY, "{not json").await.unwrap();

    let err = repo.load_bank().await.unwrap_err();
    assert!(matches!(err, StorageError::Serialization(_)));
}

#[tokio::test]
async fn sqlite_settings_roundtrip() {
    let repo = connect("memdb_settings").await;
    assert!(repo.get_settings().await.unwrap().is_none());

    let settings = QuizSettings::default().with_question_time_secs(20).unwrap();
    repo.save_settings(&settings).await.unwrap();

    assert_eq!(repo.get_settings().await.unwrap(), Some(settings));
}

#[tokio::test]
async fn migrations_are_idempotent() {
    let repo = connect("memdb_migrate_twice").await;
    repo.migrate().await.expect("second migrate");
    repo.put_document("k", "v").await.unwrap();
    assert_eq!(repo.get_document("k").await.unwrap().as_deref(), Some("v"));
}
