use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use quiz_core::model::{QuestionBank, QuestionRecord, QuizSettings, SubjectKey};
use quiz_core::time::fixed_clock;
use services::{
    EntryOutcome, NO_ANSWER, QuizDriver, QuizLoopService, QuizPhase, QuizServiceError,
    TimerOutcome, TokioCountdown,
};
use storage::repository::{InMemoryRepository, QuestionBankRepository, StorageError};

fn science_bank() -> QuestionBank {
    let mut bank = QuestionBank::new();
    let key = SubjectKey::new("science");
    bank.add_subject(key.clone()).unwrap();
    bank.push_question(
        &key,
        QuestionRecord::new("H2O is?", vec!["Water".into(), "Salt".into()], 0),
    )
    .unwrap();
    bank.push_question(
        &key,
        QuestionRecord::new(
            "Closest star?",
            vec!["Sirius".into(), "Sun".into(), "Vega".into()],
            1,
        ),
    )
    .unwrap();
    bank
}

fn loop_service() -> QuizLoopService {
    let repo = Arc::new(InMemoryRepository::with_bank(science_bank()));
    QuizLoopService::new(fixed_clock(), repo.clone(), repo)
}

async fn start(service: &QuizLoopService, secs: u32) -> QuizDriver {
    let settings = QuizSettings::default().with_question_time_secs(secs).unwrap();
    let timer = TokioCountdown::from_current().unwrap();
    service
        .start_quiz_with(&SubjectKey::new("science"), settings, Box::new(timer))
        .await
        .unwrap()
}

/// Feed events to the driver until something other than a tick happens.
async fn next_change(driver: &mut QuizDriver) -> TimerOutcome {
    loop {
        let event = driver.next_event().await.expect("event channel open");
        match driver.dispatch(event).unwrap() {
            TimerOutcome::Tick { .. } => continue,
            other => return other,
        }
    }
}

#[tokio::test(start_paused = true)]
async fn timeout_pauses_then_moves_on() {
    let service = loop_service();
    let mut driver = start(&service, 3).await;

    let outcome = next_change(&mut driver).await;
    assert_eq!(
        outcome,
        TimerOutcome::TimedOut {
            index: 0,
            pause: Duration::from_millis(1_000)
        }
    );
    let view = driver.session().current_question_view().unwrap();
    assert!(view.locked);
    assert_eq!(view.index, 0);

    assert_eq!(next_change(&mut driver).await, TimerOutcome::Advanced { index: 1 });
    assert_eq!(driver.session().remaining_secs(), Some(3));

    driver.session_mut().select_answer(1, 1).unwrap();
    let report = driver.session_mut().submit().unwrap();

    assert_eq!(report.score, 1);
    assert_eq!(report.entries[0].chosen, NO_ANSWER);
    assert_eq!(report.entries[0].outcome, EntryOutcome::TimedOut);
    assert_eq!(report.entries[1].chosen, "Sun");
    assert_eq!(report.entries[1].outcome, EntryOutcome::Correct);
}

#[tokio::test(start_paused = true)]
async fn answering_silences_the_countdown() {
    let service = loop_service();
    let mut driver = start(&service, 5).await;

    driver.session_mut().select_answer(0, 0).unwrap();
    let waited = tokio::time::timeout(Duration::from_secs(30), driver.next_event()).await;
    assert!(waited.is_err(), "no timer event expected after answering");
    assert_eq!(driver.session().answer(0).and_then(|a| a.selected()), Some(0));
}

#[tokio::test(start_paused = true)]
async fn last_question_timeout_submits() {
    let service = loop_service();
    let mut driver = start(&service, 2).await;

    driver.session_mut().select_answer(0, 1).unwrap();
    driver.session_mut().go_next().unwrap();

    let TimerOutcome::Submitted(report) = next_change(&mut driver).await else {
        panic!("expected the attempt to be submitted");
    };
    assert_eq!(driver.session().phase(), QuizPhase::Completed);
    assert_eq!(report.score, 0);
    assert_eq!(report.entries[0].outcome, EntryOutcome::Wrong);
    assert_eq!(report.entries[1].outcome, EntryOutcome::TimedOut);
    assert_eq!(driver.session().report().unwrap(), report);
}

#[tokio::test(start_paused = true)]
async fn navigating_during_pause_keeps_position() {
    let service = loop_service();
    let mut driver = start(&service, 2).await;

    assert!(matches!(
        next_change(&mut driver).await,
        TimerOutcome::TimedOut { index: 0, .. }
    ));
    driver.session_mut().go_next().unwrap();
    driver.session_mut().select_answer(1, 0).unwrap();

    // The pause still fires but must not move the user.
    assert_eq!(next_change(&mut driver).await, TimerOutcome::Ignored);
    assert_eq!(driver.session().current_index(), Some(1));
}

#[tokio::test(start_paused = true)]
async fn stepping_back_during_pause_stays_put() {
    let service = loop_service();
    let mut driver = start(&service, 2).await;

    assert!(matches!(
        next_change(&mut driver).await,
        TimerOutcome::TimedOut { index: 0, .. }
    ));
    driver.session_mut().go_next().unwrap();
    driver.session_mut().go_previous().unwrap();

    assert_eq!(next_change(&mut driver).await, TimerOutcome::Ignored);
    assert_eq!(driver.session().current_index(), Some(0));
    assert!(driver.session().current_question_view().unwrap().locked);
}

struct BrokenBanks;

#[async_trait]
impl QuestionBankRepository for BrokenBanks {
    async fn load_bank(&self) -> Result<Option<QuestionBank>, StorageError> {
        Err(StorageError::Connection("database is locked".into()))
    }

    async fn save_bank(&self, _bank: &QuestionBank) -> Result<(), StorageError> {
        Err(StorageError::Connection("database is locked".into()))
    }
}

#[tokio::test]
async fn storage_failures_surface_as_service_errors() {
    let service = QuizLoopService::new(
        fixed_clock(),
        Arc::new(BrokenBanks),
        Arc::new(InMemoryRepository::new()),
    );

    let err = service.subjects().await.unwrap_err();
    assert!(matches!(
        err,
        QuizServiceError::Storage(StorageError::Connection(_))
    ));
}
