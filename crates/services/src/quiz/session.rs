use std::collections::BTreeMap;
use std::fmt;
use std::time::Duration;

use chrono::{DateTime, Utc};
use rand::rng;
use rand::seq::SliceRandom;
use serde::Serialize;

use quiz_core::model::{
    AnswerRecord, AttemptId, Question, QuestionBank, QuizSettings, SubjectKey,
};
use quiz_core::{Clock, scoring};

use super::events::{TimerEvent, TimerEvents};
use super::view::{QuestionView, QuizReport, ReportEntry, ScoreSummary};
use crate::error::{InvalidOperation, QuizError};
use crate::timer::Countdown;

//
// ─── PHASE & OUTCOMES ──────────────────────────────────────────────────────────
//

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum QuizPhase {
    Configuring,
    InProgress,
    Completed,
}

impl fmt::Display for QuizPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            QuizPhase::Configuring => "configuring",
            QuizPhase::InProgress => "in progress",
            QuizPhase::Completed => "completed",
        };
        f.write_str(label)
    }
}

/// Result of a successful `select_answer`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AnswerOutcome {
    pub index: usize,
    pub correct: bool,
    pub score: u32,
}

/// What an expiry did to the session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ExpiryOutcome {
    /// The expiry no longer applies (answered, navigated away, not running).
    Ignored,
    /// The slot was frozen; call `advance_after_timeout(index)` once `pause`
    /// has elapsed.
    AdvanceAfter { index: usize, pause: Duration },
    /// The last question timed out and the attempt was submitted.
    Submitted(QuizReport),
}

/// What a routed `TimerEvent` did to the session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TimerOutcome {
    Ignored,
    Tick { index: usize, remaining: u32 },
    TimedOut { index: usize, pause: Duration },
    Advanced { index: usize },
    Submitted(QuizReport),
}

//
// ─── ATTEMPT ───────────────────────────────────────────────────────────────────
//

struct Attempt {
    id: AttemptId,
    subject: SubjectKey,
    questions: Vec<Question>,
    answers: BTreeMap<usize, AnswerRecord>,
    current: usize,
    score: u32,
    remaining_secs: Option<u32>,
    /// Slot waiting out its timeout pause. Any navigation clears it.
    pending_advance: Option<usize>,
    started_at: DateTime<Utc>,
}

impl Attempt {
    fn is_locked(&self, index: usize) -> bool {
        self.answers.contains_key(&index)
    }

    fn is_last(&self, index: usize) -> bool {
        index + 1 == self.questions.len()
    }

    /// Lock a slot. The score is always re-derived from the answers.
    fn record(&mut self, index: usize, record: AnswerRecord) {
        self.answers.insert(index, record);
        self.score = scoring::score(&self.questions, &self.answers);
    }

    fn question_view(&self, index: usize) -> Option<QuestionView> {
        let question = self.questions.get(index)?;
        Some(QuestionView::build(
            index,
            self.questions.len(),
            question,
            self.answers.get(&index).copied(),
        ))
    }

    fn summary(&self) -> ScoreSummary {
        ScoreSummary {
            score: self.score,
            total: self.questions.len(),
        }
    }

    fn report(&self, completed_at: DateTime<Utc>) -> QuizReport {
        let entries = self
            .questions
            .iter()
            .enumerate()
            .map(|(position, question)| {
                ReportEntry::build(position, question, self.answers.get(&position).copied())
            })
            .collect();

        QuizReport {
            attempt_id: self.id,
            subject: self.subject.clone(),
            score: self.score,
            total: self.questions.len(),
            started_at: self.started_at,
            completed_at,
            entries,
        }
    }
}

enum SessionState {
    Configuring,
    InProgress(Attempt),
    Completed {
        attempt: Attempt,
        completed_at: DateTime<Utc>,
    },
}

impl SessionState {
    fn phase(&self) -> QuizPhase {
        match self {
            SessionState::Configuring => QuizPhase::Configuring,
            SessionState::InProgress(_) => QuizPhase::InProgress,
            SessionState::Completed { .. } => QuizPhase::Completed,
        }
    }

    fn attempt(&self) -> Option<&Attempt> {
        match self {
            SessionState::Configuring => None,
            SessionState::InProgress(attempt) | SessionState::Completed { attempt, .. } => {
                Some(attempt)
            }
        }
    }
}

fn in_progress<'a>(
    state: &'a mut SessionState,
    operation: &'static str,
) -> Result<&'a mut Attempt, InvalidOperation> {
    match state {
        SessionState::InProgress(attempt) => Ok(attempt),
        other => Err(InvalidOperation::WrongPhase {
            operation,
            expected: QuizPhase::InProgress,
            actual: other.phase(),
        }),
    }
}

//
// ─── SESSION ───────────────────────────────────────────────────────────────────
//

/// One quiz attempt at a time: configuring, answering, then a frozen report.
///
/// The session owns its countdown. Countdown callbacks only post
/// `TimerEvent`s; whoever owns the session feeds them back through
/// `handle_timer_event`, so every mutation happens on one logical thread and
/// stale events are rejected by the guards below.
pub struct QuizSession {
    settings: QuizSettings,
    clock: Clock,
    timer: Box<dyn Countdown>,
    events: TimerEvents,
    shuffle: bool,
    state: SessionState,
}

impl QuizSession {
    #[must_use]
    pub fn new(
        settings: QuizSettings,
        clock: Clock,
        timer: Box<dyn Countdown>,
        events: TimerEvents,
    ) -> Self {
        Self {
            settings,
            clock,
            timer,
            events,
            shuffle: settings.shuffle_questions(),
            state: SessionState::Configuring,
        }
    }

    #[must_use]
    pub fn with_shuffle(mut self, shuffle: bool) -> Self {
        self.shuffle = shuffle;
        self
    }

    /// Snapshot the subject's questions and show the first one.
    ///
    /// # Errors
    ///
    /// Returns `QuizError::EmptyQuestionSet` when the subject is missing or has
    /// no questions, `QuizError::InvalidQuestion` when a stored record is
    /// malformed, and `InvalidOperation::WrongPhase` outside `Configuring`.
    /// The session stays in `Configuring` on every error.
    pub fn start(&mut self, subject: &SubjectKey, bank: &QuestionBank) -> Result<(), QuizError> {
        let phase = self.state.phase();
        if phase != QuizPhase::Configuring {
            return Err(InvalidOperation::WrongPhase {
                operation: "start",
                expected: QuizPhase::Configuring,
                actual: phase,
            }
            .into());
        }

        let records = bank
            .questions(subject)
            .filter(|records| !records.is_empty())
            .ok_or_else(|| QuizError::EmptyQuestionSet {
                subject: subject.clone(),
            })?;

        let mut questions = records
            .iter()
            .enumerate()
            .map(|(position, record)| {
                record
                    .validate()
                    .map_err(|source| QuizError::InvalidQuestion { position, source })
            })
            .collect::<Result<Vec<_>, _>>()?;

        if self.shuffle {
            questions.as_mut_slice().shuffle(&mut rng());
        }

        let attempt = Attempt {
            id: AttemptId::new(),
            subject: subject.clone(),
            questions,
            answers: BTreeMap::new(),
            current: 0,
            score: 0,
            remaining_secs: None,
            pending_advance: None,
            started_at: self.clock.now(),
        };
        tracing::info!(
            attempt = %attempt.id,
            subject = %subject,
            questions = attempt.questions.len(),
            "quiz started"
        );

        self.state = SessionState::InProgress(attempt);
        self.show_current();
        Ok(())
    }

    /// Lock the current question with the chosen option.
    ///
    /// # Errors
    ///
    /// Returns `InvalidOperation` when the session is not in progress, `index`
    /// is not the current question, the slot is already locked, or `option`
    /// does not exist. Nothing changes on error.
    pub fn select_answer(&mut self, index: usize, option: usize) -> Result<AnswerOutcome, QuizError> {
        let attempt = in_progress(&mut self.state, "select_answer")?;
        if index != attempt.current {
            return Err(InvalidOperation::NotCurrent {
                index,
                current: attempt.current,
            }
            .into());
        }
        if attempt.is_locked(index) {
            return Err(InvalidOperation::AlreadyLocked { index }.into());
        }
        let question = &attempt.questions[index];
        let count = question.option_count();
        if option >= count {
            return Err(InvalidOperation::OptionOutOfRange { option, count }.into());
        }
        let correct = question.is_correct(option);

        self.timer.stop();
        attempt.remaining_secs = None;
        attempt.record(index, AnswerRecord::Answered { selected: option });
        tracing::debug!(attempt = %attempt.id, index, option, correct, "answer recorded");

        Ok(AnswerOutcome {
            index,
            correct,
            score: attempt.score,
        })
    }

    /// Move to the next question. At the last question this does nothing.
    ///
    /// # Errors
    ///
    /// Returns `InvalidOperation::WrongPhase` unless the session is in progress.
    pub fn go_next(&mut self) -> Result<usize, QuizError> {
        self.navigate("go_next", true)
    }

    /// Move to the previous question. At the first question this does nothing.
    ///
    /// # Errors
    ///
    /// Returns `InvalidOperation::WrongPhase` unless the session is in progress.
    pub fn go_previous(&mut self) -> Result<usize, QuizError> {
        self.navigate("go_previous", false)
    }

    fn navigate(&mut self, operation: &'static str, forward: bool) -> Result<usize, QuizError> {
        let attempt = in_progress(&mut self.state, operation)?;
        let target = if forward {
            (attempt.current + 1).min(attempt.questions.len() - 1)
        } else {
            attempt.current.saturating_sub(1)
        };
        if target == attempt.current {
            return Ok(target);
        }

        attempt.current = target;
        attempt.pending_advance = None;
        tracing::debug!(attempt = %attempt.id, index = target, "navigated");
        self.show_current();
        Ok(target)
    }

    /// Stop any countdown and arm a fresh one if the current slot is open.
    /// Locked slots are re-shown with their feedback and no timer.
    fn show_current(&mut self) {
        self.timer.stop();
        let SessionState::InProgress(attempt) = &mut self.state else {
            return;
        };
        if attempt.is_locked(attempt.current) {
            attempt.remaining_secs = None;
            return;
        }

        let secs = self.settings.question_time_secs();
        let (id, index) = (attempt.id, attempt.current);
        attempt.remaining_secs = Some(secs);

        let tick_events = self.events.clone();
        let expire_events = self.events.clone();
        self.timer.start(
            secs,
            Box::new(move |remaining| {
                tick_events.send(TimerEvent::Tick {
                    attempt: id,
                    index,
                    remaining,
                });
            }),
            Box::new(move || {
                expire_events.send(TimerEvent::Expired { attempt: id, index });
            }),
        );
        tracing::debug!(attempt = %id, index, secs, "countdown armed");
    }

    /// Freeze the current question as timed out.
    ///
    /// Expiries for a question that is no longer current, is already locked,
    /// or belongs to a session that is not in progress are ignored.
    ///
    /// # Errors
    ///
    /// Propagates a failure of the automatic submit after the last question.
    pub fn on_timer_expire(&mut self, index: usize) -> Result<ExpiryOutcome, QuizError> {
        let SessionState::InProgress(attempt) = &mut self.state else {
            tracing::warn!(index, "expiry ignored, no quiz in progress");
            return Ok(ExpiryOutcome::Ignored);
        };
        if index != attempt.current || attempt.is_locked(index) {
            tracing::warn!(
                attempt = %attempt.id,
                index,
                current = attempt.current,
                "stale expiry ignored"
            );
            return Ok(ExpiryOutcome::Ignored);
        }

        self.timer.stop();
        attempt.remaining_secs = None;
        attempt.record(index, AnswerRecord::TimedOut);
        attempt.pending_advance = Some(index);
        tracing::info!(attempt = %attempt.id, index, "question timed out");

        if attempt.is_last(index) {
            let report = self.submit()?;
            return Ok(ExpiryOutcome::Submitted(report));
        }

        Ok(ExpiryOutcome::AdvanceAfter {
            index,
            pause: self.settings.timeout_pause(),
        })
    }

    /// Leave a timed-out question once its pause is over.
    ///
    /// Returns the new index, or `None` if the user navigated at all during
    /// the pause (even back to the same question) or the attempt ended.
    ///
    /// # Errors
    ///
    /// Propagates navigation failures.
    pub fn advance_after_timeout(&mut self, index: usize) -> Result<Option<usize>, QuizError> {
        let SessionState::InProgress(attempt) = &mut self.state else {
            return Ok(None);
        };
        let still_showing_timeout =
            attempt.current == index && attempt.pending_advance.take() == Some(index);
        if !still_showing_timeout {
            tracing::debug!(attempt = %attempt.id, index, "pause elapsed after navigation");
            return Ok(None);
        }

        self.go_next().map(Some)
    }

    /// Finish the attempt and produce its report.
    ///
    /// Submitting a completed attempt returns the same report again.
    ///
    /// # Errors
    ///
    /// Returns `InvalidOperation::WrongPhase` when no attempt was started.
    pub fn submit(&mut self) -> Result<QuizReport, QuizError> {
        match std::mem::replace(&mut self.state, SessionState::Configuring) {
            SessionState::InProgress(mut attempt) => {
                self.timer.stop();
                attempt.remaining_secs = None;
                let completed_at = self.clock.now();
                let report = attempt.report(completed_at);
                tracing::info!(
                    attempt = %attempt.id,
                    score = report.score,
                    total = report.total,
                    "quiz submitted"
                );
                self.state = SessionState::Completed {
                    attempt,
                    completed_at,
                };
                Ok(report)
            }
            SessionState::Completed {
                attempt,
                completed_at,
            } => {
                let report = attempt.report(completed_at);
                self.state = SessionState::Completed {
                    attempt,
                    completed_at,
                };
                Ok(report)
            }
            SessionState::Configuring => Err(InvalidOperation::WrongPhase {
                operation: "submit",
                expected: QuizPhase::InProgress,
                actual: QuizPhase::Configuring,
            }
            .into()),
        }
    }

    /// Discard the completed attempt and return to `Configuring`.
    ///
    /// # Errors
    ///
    /// Returns `InvalidOperation::WrongPhase` unless the attempt is completed.
    pub fn reset(&mut self) -> Result<(), QuizError> {
        match &self.state {
            SessionState::Completed { attempt, .. } => {
                tracing::info!(attempt = %attempt.id, "session reset");
            }
            other => {
                return Err(InvalidOperation::WrongPhase {
                    operation: "reset",
                    expected: QuizPhase::Completed,
                    actual: other.phase(),
                }
                .into());
            }
        }

        self.timer.stop();
        self.state = SessionState::Configuring;
        Ok(())
    }

    /// Route an event posted by the countdown or the timeout pause.
    ///
    /// Events for any attempt other than the live one are dropped.
    ///
    /// # Errors
    ///
    /// Propagates errors from the operation the event triggers.
    pub fn handle_timer_event(&mut self, event: TimerEvent) -> Result<TimerOutcome, QuizError> {
        let live = match &self.state {
            SessionState::InProgress(attempt) => Some(attempt.id),
            _ => None,
        };
        if live != Some(event.attempt()) {
            tracing::warn!(?event, "timer event outside the live attempt ignored");
            return Ok(TimerOutcome::Ignored);
        }

        match event {
            TimerEvent::Tick {
                index, remaining, ..
            } => {
                let SessionState::InProgress(attempt) = &mut self.state else {
                    return Ok(TimerOutcome::Ignored);
                };
                if index != attempt.current || attempt.is_locked(index) {
                    return Ok(TimerOutcome::Ignored);
                }
                attempt.remaining_secs = Some(remaining);
                tracing::trace!(attempt = %attempt.id, index, remaining, "tick");
                Ok(TimerOutcome::Tick { index, remaining })
            }
            TimerEvent::Expired { index, .. } => Ok(match self.on_timer_expire(index)? {
                ExpiryOutcome::Ignored => TimerOutcome::Ignored,
                ExpiryOutcome::AdvanceAfter { index, pause } => {
                    TimerOutcome::TimedOut { index, pause }
                }
                ExpiryOutcome::Submitted(report) => TimerOutcome::Submitted(report),
            }),
            TimerEvent::PauseElapsed { index, .. } => {
                Ok(match self.advance_after_timeout(index)? {
                    Some(index) => TimerOutcome::Advanced { index },
                    None => TimerOutcome::Ignored,
                })
            }
        }
    }

    //
    // ─── PROJECTIONS ───────────────────────────────────────────────────────
    //

    #[must_use]
    pub fn phase(&self) -> QuizPhase {
        self.state.phase()
    }

    #[must_use]
    pub fn settings(&self) -> &QuizSettings {
        &self.settings
    }

    #[must_use]
    pub fn attempt_id(&self) -> Option<AttemptId> {
        self.state.attempt().map(|attempt| attempt.id)
    }

    #[must_use]
    pub fn subject(&self) -> Option<&SubjectKey> {
        self.state.attempt().map(|attempt| &attempt.subject)
    }

    #[must_use]
    pub fn current_index(&self) -> Option<usize> {
        self.state.attempt().map(|attempt| attempt.current)
    }

    #[must_use]
    pub fn question_count(&self) -> usize {
        self.state
            .attempt()
            .map_or(0, |attempt| attempt.questions.len())
    }

    #[must_use]
    pub fn answer(&self, index: usize) -> Option<AnswerRecord> {
        self.state
            .attempt()
            .and_then(|attempt| attempt.answers.get(&index).copied())
    }

    /// Seconds left on the current question, while its countdown runs.
    #[must_use]
    pub fn remaining_secs(&self) -> Option<u32> {
        match &self.state {
            SessionState::InProgress(attempt) => attempt.remaining_secs,
            _ => None,
        }
    }

    #[must_use]
    pub fn score_summary(&self) -> ScoreSummary {
        self.state
            .attempt()
            .map_or(ScoreSummary { score: 0, total: 0 }, Attempt::summary)
    }

    #[must_use]
    pub fn question_view(&self, index: usize) -> Option<QuestionView> {
        self.state
            .attempt()
            .and_then(|attempt| attempt.question_view(index))
    }

    #[must_use]
    pub fn current_question_view(&self) -> Option<QuestionView> {
        self.state
            .attempt()
            .and_then(|attempt| attempt.question_view(attempt.current))
    }

    /// # Errors
    ///
    /// Returns `InvalidOperation::WrongPhase` unless the attempt is completed.
    pub fn report(&self) -> Result<QuizReport, QuizError> {
        match &self.state {
            SessionState::Completed {
                attempt,
                completed_at,
            } => Ok(attempt.report(*completed_at)),
            other => Err(InvalidOperation::WrongPhase {
                operation: "report",
                expected: QuizPhase::Completed,
                actual: other.phase(),
            }
            .into()),
        }
    }
}

impl Drop for QuizSession {
    fn drop(&mut self) {
        self.timer.stop();
    }
}

impl fmt::Debug for QuizSession {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("QuizSession")
            .field("phase", &self.phase())
            .field("attempt", &self.attempt_id())
            .field("current", &self.current_index())
            .field("score", &self.score_summary())
            .finish_non_exhaustive()
    }
}
