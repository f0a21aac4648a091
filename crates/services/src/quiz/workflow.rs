use std::sync::Arc;
use std::time::Duration;

use tokio::runtime::Handle;
use tokio::sync::mpsc::UnboundedReceiver;
use tokio::task::JoinHandle;

use quiz_core::model::{QuestionBank, QuizSettings, SubjectKey};
use storage::repository::{QuestionBankRepository, SettingsRepository};

use super::events::{TimerEvent, TimerEvents};
use super::session::{QuizSession, TimerOutcome};
use crate::Clock;
use crate::error::{QuizError, QuizServiceError};
use crate::timer::Countdown;

/// Starts quiz attempts from stored questions and settings.
#[derive(Clone)]
pub struct QuizLoopService {
    clock: Clock,
    banks: Arc<dyn QuestionBankRepository>,
    settings: Arc<dyn SettingsRepository>,
}

impl QuizLoopService {
    #[must_use]
    pub fn new(
        clock: Clock,
        banks: Arc<dyn QuestionBankRepository>,
        settings: Arc<dyn SettingsRepository>,
    ) -> Self {
        Self {
            clock,
            banks,
            settings,
        }
    }

    /// Stored settings, or the defaults when none were saved.
    ///
    /// # Errors
    ///
    /// Returns `QuizServiceError::Storage` if the settings cannot be read.
    pub async fn load_settings(&self) -> Result<QuizSettings, QuizServiceError> {
        let settings = self.settings.get_settings().await?;
        Ok(settings.unwrap_or_default())
    }

    /// # Errors
    ///
    /// Returns `QuizServiceError::Storage` if the bank cannot be read.
    pub async fn load_bank(&self) -> Result<QuestionBank, QuizServiceError> {
        let bank = self.banks.load_bank().await?;
        Ok(bank.unwrap_or_else(QuestionBank::default_seed))
    }

    /// # Errors
    ///
    /// Returns `QuizServiceError::Storage` if the bank cannot be read.
    pub async fn subjects(&self) -> Result<Vec<SubjectKey>, QuizServiceError> {
        let bank = self.load_bank().await?;
        Ok(bank.subjects().cloned().collect())
    }

    /// Start an attempt with the stored settings.
    ///
    /// # Errors
    ///
    /// Returns `QuizServiceError::Storage` for storage failures and
    /// `QuizServiceError::Quiz` when the subject cannot be started.
    pub async fn start_quiz(
        &self,
        subject: &SubjectKey,
        timer: Box<dyn Countdown>,
    ) -> Result<QuizDriver, QuizServiceError> {
        let settings = self.load_settings().await?;
        self.start_quiz_with(subject, settings, timer).await
    }

    /// Start an attempt with explicit settings.
    ///
    /// # Errors
    ///
    /// Returns `QuizServiceError::Storage` for storage failures and
    /// `QuizServiceError::Quiz` when the subject cannot be started.
    pub async fn start_quiz_with(
        &self,
        subject: &SubjectKey,
        settings: QuizSettings,
        timer: Box<dyn Countdown>,
    ) -> Result<QuizDriver, QuizServiceError> {
        let bank = self.load_bank().await?;
        let (events, rx) = TimerEvents::channel();
        let mut session = QuizSession::new(settings, self.clock, timer, events.clone());
        session.start(subject, &bank)?;

        Ok(QuizDriver {
            session,
            subject: subject.clone(),
            bank,
            events,
            rx,
            pause: None,
        })
    }
}

/// Owns one running session together with the receiving end of its timer
/// events.
///
/// User gestures go through `session_mut`; timer events are awaited with
/// `next_event` and applied with `dispatch`.
#[derive(Debug)]
pub struct QuizDriver {
    session: QuizSession,
    subject: SubjectKey,
    bank: QuestionBank,
    events: TimerEvents,
    rx: UnboundedReceiver<TimerEvent>,
    pause: Option<JoinHandle<()>>,
}

impl QuizDriver {
    #[must_use]
    pub fn session(&self) -> &QuizSession {
        &self.session
    }

    pub fn session_mut(&mut self) -> &mut QuizSession {
        &mut self.session
    }

    /// Wait for the next countdown or pause event.
    ///
    /// The driver keeps a sender alive, so this only returns `None` if the
    /// channel is closed from outside.
    pub async fn next_event(&mut self) -> Option<TimerEvent> {
        self.rx.recv().await
    }

    /// Apply a timer event to the session.
    ///
    /// A timeout on a question that is not the last schedules a
    /// `PauseElapsed` event after the configured pause.
    ///
    /// # Errors
    ///
    /// Propagates errors from the session.
    pub fn dispatch(&mut self, event: TimerEvent) -> Result<TimerOutcome, QuizError> {
        let outcome = self.session.handle_timer_event(event)?;
        if let TimerOutcome::TimedOut { index, pause } = &outcome {
            self.schedule_pause(*index, *pause);
        }
        Ok(outcome)
    }

    /// Reset the completed attempt and start the same subject again.
    ///
    /// # Errors
    ///
    /// Returns `InvalidOperation::WrongPhase` unless the attempt is completed.
    pub fn restart(&mut self) -> Result<(), QuizError> {
        self.cancel_pause();
        self.session.reset()?;
        self.session.start(&self.subject, &self.bank)
    }

    fn schedule_pause(&mut self, index: usize, pause: Duration) {
        let Some(attempt) = self.session.attempt_id() else {
            return;
        };
        self.cancel_pause();

        let event = TimerEvent::PauseElapsed { attempt, index };
        let events = self.events.clone();
        match Handle::try_current() {
            Ok(handle) => {
                self.pause = Some(handle.spawn(async move {
                    tokio::time::sleep(pause).await;
                    events.send(event);
                }));
            }
            Err(_) => {
                tracing::warn!(index, "no runtime for the timeout pause, advancing at once");
                events.send(event);
            }
        }
    }

    fn cancel_pause(&mut self) {
        if let Some(task) = self.pause.take() {
            task.abort();
        }
    }
}

impl Drop for QuizDriver {
    fn drop(&mut self) {
        self.cancel_pause();
    }
}
