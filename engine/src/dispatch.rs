//! Progress dispatch.
//!
//! The external subsystem calls `ProgressDispatcher::dispatch` from its own
//! notification thread. The dispatcher resolves the item the notification is
//! about, classifies that item's partial result and forwards everything to the
//! user's `ProgressCallback`. Nothing unwinds out of `dispatch`: bad indices,
//! unreadable snapshots, callback errors and callback panics all become a
//! `CallbackStatus` handed back to the subsystem.

use std::fmt;
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use crate::error::{CallbackError, SnapshotError};
use crate::outcome::{classify, Outcome};

/// Status code returned across the callback boundary to the external subsystem.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CallbackStatus {
    Ok,
    /// The notification named an item outside the collection.
    IndexOutOfRange,
    /// The user callback returned an error or panicked.
    UserCallbackFailed,
    /// The snapshot could not be read, or the completion signal failed.
    Unexpected,
}

impl CallbackStatus {
    /// HRESULT-style numeric form.
    pub fn code(&self) -> i32 {
        match self {
            CallbackStatus::Ok => 0,
            CallbackStatus::IndexOutOfRange => 0x8000_000B_u32 as i32,
            CallbackStatus::UserCallbackFailed => 0x8000_4005_u32 as i32,
            CallbackStatus::Unexpected => 0x8000_FFFF_u32 as i32,
        }
    }

    pub fn is_ok(&self) -> bool {
        matches!(self, CallbackStatus::Ok)
    }
}

impl fmt::Display for CallbackStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "0x{:08X}", self.code() as u32)
    }
}

/// Per-item result available while a job runs.
pub trait PartialResult {
    fn result_code(&self) -> i32;

    fn error_code(&self) -> i32 {
        0
    }
}

/// One progress notification as delivered by the external subsystem.
pub trait ProgressSnapshot {
    type Partial: PartialResult;

    /// Index of the item currently being processed. Signed because foreign
    /// subsystems report it that way; negative values are rejected.
    fn current_index(&self) -> Result<i64, SnapshotError>;

    /// The partial result for `index`, if the item has produced one yet.
    fn item_result(&self, index: usize) -> Result<Option<Self::Partial>, SnapshotError>;
}

/// Everything the user callback receives for one notification.
pub struct ProgressEvent<'a, I, P: ProgressSnapshot> {
    pub index: usize,
    pub outcome: Outcome,
    pub item: &'a I,
    pub partial: Option<&'a P::Partial>,
    pub progress: &'a P,
}

/// Receives progress for each work item of a running job.
///
/// Called synchronously on the subsystem's notification thread, so an
/// implementation must return promptly.
pub trait ProgressCallback<I, P: ProgressSnapshot>: Send + Sync {
    fn on_progress(&self, event: ProgressEvent<'_, I, P>) -> Result<(), CallbackError>;
}

struct FnCallback<F>(F);

impl<I, P, F> ProgressCallback<I, P> for FnCallback<F>
where
    P: ProgressSnapshot,
    F: Fn(ProgressEvent<'_, I, P>) -> Result<(), CallbackError> + Send + Sync,
{
    fn on_progress(&self, event: ProgressEvent<'_, I, P>) -> Result<(), CallbackError> {
        (self.0)(event)
    }
}

/// Counters describing what a dispatcher has done so far.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DispatchStats {
    pub delivered: u64,
    pub rejected: u64,
    pub callback_failures: u64,
}

#[derive(Debug, Default)]
struct Counters {
    delivered: AtomicU64,
    rejected: AtomicU64,
    callback_failures: AtomicU64,
}

/// Routes progress notifications for an immutable item collection to a callback.
///
/// Cheap to clone; clones share the items, the callback and the counters, so
/// the job can keep a clone on its notification thread while the caller keeps
/// another. A notification that arrives after completion but before cleanup
/// still finds its items alive.
pub struct ProgressDispatcher<I, P: ProgressSnapshot> {
    items: Arc<[I]>,
    callback: Arc<dyn ProgressCallback<I, P>>,
    counters: Arc<Counters>,
}

impl<I, P: ProgressSnapshot> Clone for ProgressDispatcher<I, P> {
    fn clone(&self) -> Self {
        ProgressDispatcher {
            items: Arc::clone(&self.items),
            callback: Arc::clone(&self.callback),
            counters: Arc::clone(&self.counters),
        }
    }
}

impl<I, P> ProgressDispatcher<I, P>
where
    I: Send + Sync + 'static,
    P: ProgressSnapshot + 'static,
{
    /// Build a dispatcher around a closure.
    pub fn new<F>(items: Arc<[I]>, callback: F) -> Self
    where
        F: Fn(ProgressEvent<'_, I, P>) -> Result<(), CallbackError> + Send + Sync + 'static,
    {
        Self::with_callback(items, Arc::new(FnCallback(callback)))
    }

    pub fn with_callback(items: Arc<[I]>, callback: Arc<dyn ProgressCallback<I, P>>) -> Self {
        ProgressDispatcher {
            items,
            callback,
            counters: Arc::new(Counters::default()),
        }
    }

    /// A dispatcher that accepts every notification and reports nothing.
    pub fn silent(items: Arc<[I]>) -> Self {
        Self::new(items, |_| Ok(()))
    }
}

impl<I, P: ProgressSnapshot> ProgressDispatcher<I, P> {
    pub fn items(&self) -> &Arc<[I]> {
        &self.items
    }

    pub fn stats(&self) -> DispatchStats {
        DispatchStats {
            delivered: self.counters.delivered.load(Ordering::Relaxed),
            rejected: self.counters.rejected.load(Ordering::Relaxed),
            callback_failures: self.counters.callback_failures.load(Ordering::Relaxed),
        }
    }

    /// Handle one progress notification. Never panics.
    pub fn dispatch(&self, progress: &P) -> CallbackStatus {
        let raw_index = match progress.current_index() {
            Ok(index) => index,
            Err(err) => {
                tracing::warn!(error = %err, "dropping progress notification");
                self.counters.rejected.fetch_add(1, Ordering::Relaxed);
                return CallbackStatus::Unexpected;
            }
        };

        let Some(index) = usize::try_from(raw_index)
            .ok()
            .filter(|index| *index < self.items.len())
        else {
            tracing::warn!(
                index = raw_index,
                items = self.items.len(),
                "progress notification index out of range"
            );
            self.counters.rejected.fetch_add(1, Ordering::Relaxed);
            return CallbackStatus::IndexOutOfRange;
        };

        let partial = match progress.item_result(index) {
            Ok(partial) => partial,
            Err(err) => {
                tracing::warn!(index, error = %err, "item result unavailable");
                self.counters.rejected.fetch_add(1, Ordering::Relaxed);
                return CallbackStatus::Unexpected;
            }
        };

        let outcome = partial
            .as_ref()
            .map_or(Outcome::NotStarted, |partial| classify(partial.result_code()));

        let event = ProgressEvent {
            index,
            outcome,
            item: &self.items[index],
            partial: partial.as_ref(),
            progress,
        };

        match catch_unwind(AssertUnwindSafe(|| self.callback.on_progress(event))) {
            Ok(Ok(())) => {
                self.counters.delivered.fetch_add(1, Ordering::Relaxed);
                CallbackStatus::Ok
            }
            Ok(Err(err)) => {
                tracing::warn!(index, error = %err, "progress callback failed");
                self.counters.callback_failures.fetch_add(1, Ordering::Relaxed);
                CallbackStatus::UserCallbackFailed
            }
            Err(_) => {
                tracing::error!(index, "progress callback panicked");
                self.counters.callback_failures.fetch_add(1, Ordering::Relaxed);
                CallbackStatus::UserCallbackFailed
            }
        }
    }
}
