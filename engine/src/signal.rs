//! One-shot completion signal.
//!
//! `CompletionSignal` is a manually-reset event: it starts unset, becomes set
//! exactly once per wait cycle and stays set. The bridge owns the signal and
//! hands a `CompletionNotifier` to the external job, which fires it from the
//! job's own completion thread.

use std::fmt;
use std::sync::{Arc, Condvar, Mutex};
use std::time::{Duration, Instant};

use serde::{Deserialize, Serialize};

use crate::dispatch::CallbackStatus;
use crate::error::SignalError;

/// How long a blocking wait may last.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "TimeoutRepr", into = "TimeoutRepr")]
pub enum Timeout {
    /// Block until the signal fires.
    Infinite,
    /// Give up after the given duration.
    After(Duration),
}

impl Timeout {
    pub fn from_millis(millis: u64) -> Self {
        Timeout::After(Duration::from_millis(millis))
    }

    /// The bounded duration, or `None` for `Infinite`.
    pub fn as_duration(&self) -> Option<Duration> {
        match self {
            Timeout::Infinite => None,
            Timeout::After(duration) => Some(*duration),
        }
    }
}

impl From<Duration> for Timeout {
    fn from(duration: Duration) -> Self {
        Timeout::After(duration)
    }
}

impl fmt::Display for Timeout {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Timeout::Infinite => write!(f, "infinite"),
            Timeout::After(duration) => write!(f, "{}ms", duration.as_millis()),
        }
    }
}

/// On-disk form of a timeout: a millisecond count or the word "infinite".
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
enum TimeoutRepr {
    Millis(u64),
    Keyword(String),
}

impl TryFrom<TimeoutRepr> for Timeout {
    type Error = String;

    fn try_from(repr: TimeoutRepr) -> Result<Self, Self::Error> {
        match repr {
            TimeoutRepr::Millis(millis) => Ok(Timeout::from_millis(millis)),
            TimeoutRepr::Keyword(word) if word.eq_ignore_ascii_case("infinite") => {
                Ok(Timeout::Infinite)
            }
            TimeoutRepr::Keyword(word) => Err(format!(
                "invalid timeout '{}': expected milliseconds or \"infinite\"",
                word
            )),
        }
    }
}

impl From<Timeout> for TimeoutRepr {
    fn from(timeout: Timeout) -> Self {
        match timeout {
            Timeout::Infinite => TimeoutRepr::Keyword("infinite".to_string()),
            Timeout::After(duration) => {
                TimeoutRepr::Millis(u64::try_from(duration.as_millis()).unwrap_or(u64::MAX))
            }
        }
    }
}

/// Manually-reset one-shot event with a bounded wait.
#[derive(Debug, Default)]
pub struct CompletionSignal {
    set: Mutex<bool>,
    cond: Condvar,
}

impl CompletionSignal {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the signal and wake the waiter. Setting an already-set signal is a no-op.
    pub fn notify(&self) -> Result<(), SignalError> {
        let mut set = self.set.lock().map_err(|_| SignalError::Poisoned)?;
        *set = true;
        self.cond.notify_all();
        Ok(())
    }

    /// Whether the signal is set. A poisoned lock is an error, as in `notify`.
    pub fn is_set(&self) -> Result<bool, SignalError> {
        let set = self.set.lock().map_err(|_| SignalError::Poisoned)?;
        Ok(*set)
    }

    /// Block until the signal is set or `timeout` elapses.
    ///
    /// Returns immediately if the signal is already set. Spurious wakeups are
    /// absorbed; the deadline is computed once on entry.
    pub fn wait(&self, timeout: Timeout) -> Result<(), SignalError> {
        let guard = self.set.lock().map_err(|_| SignalError::Poisoned)?;

        match timeout {
            Timeout::Infinite => {
                let _set = self
                    .cond
                    .wait_while(guard, |set| !*set)
                    .map_err(|_| SignalError::Poisoned)?;
                Ok(())
            }
            Timeout::After(duration) => {
                let deadline = Instant::now().checked_add(duration);
                let mut guard = guard;
                while !*guard {
                    let remaining = match deadline {
                        Some(deadline) => deadline.saturating_duration_since(Instant::now()),
                        // Deadline past the clock's range: treat as unbounded.
                        None => Duration::from_secs(u32::MAX as u64),
                    };
                    if remaining.is_zero() {
                        return Err(SignalError::TimedOut { timeout });
                    }
                    let (next, _) = self
                        .cond
                        .wait_timeout(guard, remaining)
                        .map_err(|_| SignalError::Poisoned)?;
                    guard = next;
                }
                Ok(())
            }
        }
    }
}

/// The job-side half of a `CompletionSignal`.
///
/// Handed to the external subsystem at `begin`; its completion callback calls
/// `complete`, which never panics and reports failure as a status code.
#[derive(Debug, Clone)]
pub struct CompletionNotifier {
    signal: Arc<CompletionSignal>,
}

impl CompletionNotifier {
    pub fn new(signal: Arc<CompletionSignal>) -> Self {
        CompletionNotifier { signal }
    }

    /// Fire the completion signal from the job's notification thread.
    pub fn complete(&self) -> CallbackStatus {
        match self.signal.notify() {
            Ok(()) => CallbackStatus::Ok,
            Err(err) => {
                tracing::error!(error = %err, "failed to signal job completion");
                CallbackStatus::Unexpected
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::thread;

    #[test]
    fn test_wait_returns_when_already_set() {
        let signal = CompletionSignal::new();
        signal.notify().expect("notify failed");
        signal
            .wait(Timeout::from_millis(0))
            .expect("set signal should not time out");
        assert!(signal.is_set().expect("signal lock poisoned"));
    }

    #[test]
    fn test_wait_times_out_when_never_set() {
        let signal = CompletionSignal::new();
        let started = Instant::now();
        let result = signal.wait(Timeout::from_millis(50));

        assert!(matches!(result, Err(SignalError::TimedOut { .. })));
        assert!(started.elapsed() >= Duration::from_millis(50));
        assert!(!signal.is_set().expect("signal lock poisoned"));
    }

    #[test]
    fn test_zero_timeout_on_unset_signal() {
        let signal = CompletionSignal::new();
        let result = signal.wait(Timeout::from_millis(0));
        assert!(matches!(result, Err(SignalError::TimedOut { .. })));
    }

    #[test]
    fn test_repeated_notify_keeps_signal_set() {
        let signal = CompletionSignal::new();
        signal.notify().expect("first notify failed");
        signal.notify().expect("second notify failed");
        assert!(signal.is_set().expect("signal lock poisoned"));
        signal.wait(Timeout::Infinite).expect("wait failed");
    }

    #[test]
    fn test_notifier_wakes_infinite_wait_from_other_thread() {
        let signal = Arc::new(CompletionSignal::new());
        let notifier = CompletionNotifier::new(Arc::clone(&signal));

        let worker = thread::spawn(move || {
            thread::sleep(Duration::from_millis(20));
            notifier.complete()
        });

        signal.wait(Timeout::Infinite).expect("wait failed");
        let status = worker.join().expect("notifier thread panicked");
        assert_eq!(status, CallbackStatus::Ok);
    }

    #[test]
    fn test_timeout_display() {
        assert_eq!(Timeout::Infinite.to_string(), "infinite");
        assert_eq!(Timeout::from_millis(1500).to_string(), "1500ms");
        assert_eq!(Timeout::Infinite.as_duration(), None);
    }

    #[test]
    fn test_poisoned_lock_is_reported_everywhere() {
        let signal = Arc::new(CompletionSignal::new());
        let holder = Arc::clone(&signal);
        let _ = thread::spawn(move || {
            let _guard = holder.set.lock().expect("lock should be free");
            panic!("poison the signal");
        })
        .join();

        assert_eq!(signal.is_set(), Err(SignalError::Poisoned));
        assert_eq!(signal.notify(), Err(SignalError::Poisoned));
        assert_eq!(signal.wait(Timeout::from_millis(0)), Err(SignalError::Poisoned));
    }
}
