use quiz_core::model::AttemptId;
use tokio::sync::mpsc;

/// Asynchronous input produced by the countdown and the post-timeout pause.
///
/// Every event names the attempt and question it was produced for, so the
/// session can drop events that arrive after the user has moved on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimerEvent {
    Tick {
        attempt: AttemptId,
        index: usize,
        remaining: u32,
    },
    Expired {
        attempt: AttemptId,
        index: usize,
    },
    /// The display pause after a timeout on `index` has elapsed.
    PauseElapsed {
        attempt: AttemptId,
        index: usize,
    },
}

impl TimerEvent {
    #[must_use]
    pub fn attempt(&self) -> AttemptId {
        match self {
            TimerEvent::Tick { attempt, .. }
            | TimerEvent::Expired { attempt, .. }
            | TimerEvent::PauseElapsed { attempt, .. } => *attempt,
        }
    }
}

/// Sending half of the timer event channel.
#[derive(Debug, Clone)]
pub struct TimerEvents {
    tx: mpsc::UnboundedSender<TimerEvent>,
}

impl TimerEvents {
    #[must_use]
    pub fn channel() -> (Self, mpsc::UnboundedReceiver<TimerEvent>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self { tx }, rx)
    }

    /// Deliver an event. A closed channel means nobody is driving the session
    /// any more, so the event is dropped.
    pub fn send(&self, event: TimerEvent) {
        if self.tx.send(event).is_err() {
            tracing::trace!(?event, "timer event dropped, receiver closed");
        }
    }
}
