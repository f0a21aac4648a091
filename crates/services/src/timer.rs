//! Per-question countdown.
//!
//! A countdown ticks once per second and signals expiry exactly once. The
//! quiz session owns one and restarts it whenever an unlocked question is
//! shown.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use thiserror::Error;
use tokio::runtime::Handle;
use tokio::task::JoinHandle;

/// Called with the remaining seconds after every elapsed second.
pub type TickHandler = Box<dyn FnMut(u32) + Send + 'static>;

/// Called once when the countdown reaches zero.
pub type ExpireHandler = Box<dyn FnOnce() + Send + 'static>;

#[derive(Debug, Error)]
#[non_exhaustive]
pub enum TimerError {
    #[error("no tokio runtime is available to drive the countdown")]
    NoRuntime,
}

/// A restartable one-second-resolution countdown.
pub trait Countdown: Send {
    /// Begin counting down from `duration_secs`, cancelling any countdown
    /// that is still running. A duration of zero is treated as one second.
    ///
    /// `on_tick` runs once per elapsed second with the new remaining value,
    /// including the final `0`; `on_expire` runs once right after that.
    fn start(&mut self, duration_secs: u32, on_tick: TickHandler, on_expire: ExpireHandler);

    /// Cancel the running countdown. No callback of the cancelled countdown
    /// runs once this returns. Stopping an idle countdown does nothing.
    fn stop(&mut self);

    fn is_running(&self) -> bool;
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

//
// ─── TOKIO ─────────────────────────────────────────────────────────────────────
//

/// Countdown driven by a task on a tokio runtime.
///
/// Every callback runs while holding the generation lock and only if the
/// generation it was started with is still current; `stop` bumps the
/// generation under that same lock. Callbacks must therefore not call back
/// into the countdown.
pub struct TokioCountdown {
    handle: Handle,
    generation: Arc<Mutex<u64>>,
    task: Option<JoinHandle<()>>,
}

impl TokioCountdown {
    #[must_use]
    pub fn new(handle: Handle) -> Self {
        Self {
            handle,
            generation: Arc::new(Mutex::new(0)),
            task: None,
        }
    }

    /// Countdown bound to the runtime the caller is running on.
    ///
    /// # Errors
    ///
    /// Returns `TimerError::NoRuntime` outside of a tokio runtime.
    pub fn from_current() -> Result<Self, TimerError> {
        Handle::try_current()
            .map(Self::new)
            .map_err(|_| TimerError::NoRuntime)
    }
}

impl Countdown for TokioCountdown {
    fn start(&mut self, duration_secs: u32, mut on_tick: TickHandler, on_expire: ExpireHandler) {
        self.stop();

        let generation = *lock(&self.generation);
        let gate = Arc::clone(&self.generation);
        let mut on_expire = Some(on_expire);
        let mut remaining = duration_secs.max(1);

        self.task = Some(self.handle.spawn(async move {
            let period = Duration::from_secs(1);
            let mut ticker = tokio::time::interval_at(tokio::time::Instant::now() + period, period);

            loop {
                ticker.tick().await;
                remaining -= 1;

                let finished = {
                    let current = lock(&gate);
                    if *current != generation {
                        return;
                    }
                    on_tick(remaining);
                    if remaining == 0 {
                        if let Some(expire) = on_expire.take() {
                            expire();
                        }
                        true
                    } else {
                        false
                    }
                };

                if finished {
                    return;
                }
            }
        }));
    }

    fn stop(&mut self) {
        {
            let mut current = lock(&self.generation);
            *current = current.wrapping_add(1);
        }
        if let Some(task) = self.task.take() {
            task.abort();
        }
    }

    fn is_running(&self) -> bool {
        self.task.as_ref().is_some_and(|task| !task.is_finished())
    }
}

impl Drop for TokioCountdown {
    fn drop(&mut self) {
        self.stop();
    }
}

//
// ─── MANUAL ────────────────────────────────────────────────────────────────────
//

struct Armed {
    remaining: u32,
    on_tick: TickHandler,
    on_expire: Option<ExpireHandler>,
}

#[derive(Default)]
struct ManualState {
    armed: Option<Armed>,
    starts: u32,
    stops: u32,
    last_duration: Option<u32>,
}

/// Countdown that only moves when told to.
///
/// Clones share state, so a test can keep one handle while the session owns
/// another.
#[derive(Clone, Default)]
pub struct ManualCountdown {
    state: Arc<Mutex<ManualState>>,
}

impl ManualCountdown {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Let `secs` seconds elapse, firing ticks and the expiry as they fall due.
    pub fn advance(&self, secs: u32) {
        let mut state = lock(&self.state);
        for _ in 0..secs {
            let Some(armed) = state.armed.as_mut() else {
                return;
            };
            armed.remaining = armed.remaining.saturating_sub(1);
            (armed.on_tick)(armed.remaining);
            if armed.remaining == 0 {
                if let Some(expire) = armed.on_expire.take() {
                    expire();
                }
                state.armed = None;
            }
        }
    }

    /// Run the countdown to zero.
    pub fn expire_now(&self) {
        let remaining = self.remaining().unwrap_or(0);
        self.advance(remaining);
    }

    #[must_use]
    pub fn remaining(&self) -> Option<u32> {
        lock(&self.state).armed.as_ref().map(|armed| armed.remaining)
    }

    #[must_use]
    pub fn start_count(&self) -> u32 {
        lock(&self.state).starts
    }

    /// Number of `stop` calls that cancelled a running countdown.
    #[must_use]
    pub fn stop_count(&self) -> u32 {
        lock(&self.state).stops
    }

    #[must_use]
    pub fn last_duration(&self) -> Option<u32> {
        lock(&self.state).last_duration
    }
}

impl Countdown for ManualCountdown {
    fn start(&mut self, duration_secs: u32, on_tick: TickHandler, on_expire: ExpireHandler) {
        self.stop();
        let duration = duration_secs.max(1);
        let mut state = lock(&self.state);
        state.starts += 1;
        state.last_duration = Some(duration);
        state.armed = Some(Armed {
            remaining: duration,
            on_tick,
            on_expire: Some(on_expire),
        });
    }

    fn stop(&mut self) {
        let mut state = lock(&self.state);
        if state.armed.take().is_some() {
            state.stops += 1;
        }
    }

    fn is_running(&self) -> bool {
        lock(&self.state).armed.is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};

    fn recorder() -> (Arc<Mutex<Vec<u32>>>, TickHandler) {
        let ticks = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&ticks);
        (ticks, Box::new(move |r| sink.lock().unwrap().push(r)))
    }

    fn expiry_counter() -> (Arc<AtomicU32>, ExpireHandler) {
        let count = Arc::new(AtomicU32::new(0));
        let sink = Arc::clone(&count);
        (
            count,
            Box::new(move || {
                sink.fetch_add(1, Ordering::SeqCst);
            }),
        )
    }

    #[test]
    fn manual_countdown_ticks_down_and_expires_once() {
        let mut countdown = ManualCountdown::new();
        let (ticks, on_tick) = recorder();
        let (expired, on_expire) = expiry_counter();

        countdown.start(3, on_tick, on_expire);
        countdown.advance(5);

        assert_eq!(*ticks.lock().unwrap(), vec![2, 1, 0]);
        assert_eq!(expired.load(Ordering::SeqCst), 1);
        assert!(!countdown.is_running());
    }

    #[test]
    fn manual_stop_is_idempotent() {
        let mut countdown = ManualCountdown::new();
        let (ticks, on_tick) = recorder();
        let (expired, on_expire) = expiry_counter();

        countdown.start(2, on_tick, on_expire);
        countdown.stop();
        countdown.stop();
        countdown.advance(2);

        assert!(ticks.lock().unwrap().is_empty());
        assert_eq!(expired.load(Ordering::SeqCst), 0);
        assert_eq!(countdown.stop_count(), 1);
    }

    #[test]
    fn manual_restart_replaces_previous_countdown() {
        let mut countdown = ManualCountdown::new();
        let (first_ticks, first_tick) = recorder();
        let (first_expired, first_expire) = expiry_counter();
        let (second_ticks, second_tick) = recorder();
        let (_, second_expire) = expiry_counter();

        countdown.start(5, first_tick, first_expire);
        countdown.start(2, second_tick, second_expire);
        countdown.advance(1);

        assert!(first_ticks.lock().unwrap().is_empty());
        assert_eq!(first_expired.load(Ordering::SeqCst), 0);
        assert_eq!(*second_ticks.lock().unwrap(), vec![1]);
        assert_eq!(countdown.start_count(), 2);
    }

    #[test]
    fn zero_duration_is_clamped_to_one_second() {
        let mut countdown = ManualCountdown::new();
        let (_, on_tick) = recorder();
        let (expired, on_expire) = expiry_counter();

        countdown.start(0, on_tick, on_expire);
        assert_eq!(countdown.last_duration(), Some(1));
        countdown.advance(1);
        assert_eq!(expired.load(Ordering::SeqCst), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn tokio_countdown_ticks_each_second_then_expires() {
        let mut countdown = TokioCountdown::from_current().unwrap();
        let (ticks, on_tick) = recorder();
        let (expired, on_expire) = expiry_counter();

        countdown.start(3, on_tick, on_expire);
        tokio::time::sleep(Duration::from_millis(3_500)).await;

        assert_eq!(*ticks.lock().unwrap(), vec![2, 1, 0]);
        assert_eq!(expired.load(Ordering::SeqCst), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn tokio_countdown_is_silent_after_stop() {
        let mut countdown = TokioCountdown::from_current().unwrap();
        let (ticks, on_tick) = recorder();
        let (expired, on_expire) = expiry_counter();

        countdown.start(3, on_tick, on_expire);
        tokio::time::sleep(Duration::from_millis(1_500)).await;
        countdown.stop();
        tokio::time::sleep(Duration::from_secs(5)).await;

        assert_eq!(*ticks.lock().unwrap(), vec![2]);
        assert_eq!(expired.load(Ordering::SeqCst), 0);
        assert!(!countdown.is_running());
    }

    #[test]
    fn tokio_countdown_requires_runtime() {
        assert!(matches!(
            TokioCountdown::from_current(),
            Err(TimerError::NoRuntime)
        ));
    }
}
