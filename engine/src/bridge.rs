//! Blocking bridge over a callback-driven external job.
//!
//! `OperationBridge::wait` starts the job, blocks the calling thread on a
//! `CompletionSignal` until the job's completion notifier fires or the timeout
//! elapses, then either retrieves the result or aborts. In every case the job
//! is cleaned up exactly once before `wait` returns.
//!
//! State machine: `Idle -> Started -> (Completed | Aborting -> Aborted)`.
//! A start or retrieval failure ends in `Failed`. A bridge is single-use.

use std::sync::Arc;

use tracing::{debug, info_span, warn};
use uuid::Uuid;

use crate::error::{BridgeError, SignalError};
use crate::job::{AsyncOperation, JobGuard, OperationReport};
use crate::messages::{MessageTable, UpdateAgentMessages};
use crate::outcome::{classify, is_failure_code, Diagnostic, Outcome};
use crate::signal::{CompletionNotifier, CompletionSignal, Timeout};

/// Where a bridge is in its single run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BridgeState {
    Idle,
    Started,
    Completed,
    Aborting,
    Aborted,
    Failed,
}

/// A successfully completed job: its outcome is always `Succeeded` or
/// `SucceededWithErrors`.
#[derive(Debug, Clone)]
pub struct Completed<T> {
    pub outcome: Outcome,
    pub output: T,
}

/// Converts one callback-driven job into a blocking, timeout-bounded call.
pub struct OperationBridge<Op: AsyncOperation> {
    operation: Op,
    signal: Arc<CompletionSignal>,
    state: BridgeState,
    run_id: Uuid,
    messages: Arc<dyn MessageTable>,
}

impl<Op: AsyncOperation> OperationBridge<Op> {
    pub fn new(operation: Op) -> Self {
        OperationBridge {
            operation,
            signal: Arc::new(CompletionSignal::new()),
            state: BridgeState::Idle,
            run_id: Uuid::new_v4(),
            messages: Arc::new(UpdateAgentMessages),
        }
    }

    /// Use `messages` to describe failing result codes.
    pub fn with_messages(mut self, messages: Arc<dyn MessageTable>) -> Self {
        self.messages = messages;
        self
    }

    pub fn state(&self) -> BridgeState {
        self.state
    }

    pub fn run_id(&self) -> Uuid {
        self.run_id
    }

    /// Start the job with `request` and block until it completes or `timeout` elapses.
    ///
    /// Returns the retrieved output when the final outcome is `Succeeded` or
    /// `SucceededWithErrors`; every other outcome, and any failing error code,
    /// is reported as `BridgeError::Unsuccessful`.
    pub fn wait(
        &mut self,
        timeout: Timeout,
        request: Op::Request,
    ) -> Result<Completed<Op::Output>, BridgeError<Op::Error>> {
        if self.state != BridgeState::Idle {
            return Err(BridgeError::AlreadyUsed {
                operation: Op::KIND,
                state: self.state,
            });
        }

        let span = info_span!("bridge", operation = Op::KIND, run_id = %self.run_id);
        let _entered = span.enter();

        let notifier = CompletionNotifier::new(Arc::clone(&self.signal));
        let job = match self.operation.begin(request, notifier) {
            Ok(job) => job,
            Err(source) => {
                self.transition(BridgeState::Failed);
                return Err(BridgeError::StartFailed {
                    operation: Op::KIND,
                    source,
                });
            }
        };
        let mut guard = JobGuard::new(job);
        self.transition(BridgeState::Started);

        if let Err(err) = self.signal.wait(timeout) {
            self.transition(BridgeState::Aborting);
            guard.abort();
            guard.release();
            self.transition(BridgeState::Aborted);

            return Err(match err {
                SignalError::TimedOut { timeout } => {
                    warn!(%timeout, "job timed out; aborted");
                    BridgeError::TimedOut {
                        operation: Op::KIND,
                        timeout,
                    }
                }
                other => BridgeError::Signal {
                    operation: Op::KIND,
                    source: other,
                },
            });
        }

        self.transition(BridgeState::Completed);
        let retrieved = self.operation.end(guard.job_mut());
        guard.release();

        let output = match retrieved {
            Ok(output) => output,
            Err(source) => {
                self.transition(BridgeState::Failed);
                return Err(BridgeError::RetrievalFailed {
                    operation: Op::KIND,
                    source,
                });
            }
        };

        self.judge(output)
    }

    fn judge(&self, output: Op::Output) -> Result<Completed<Op::Output>, BridgeError<Op::Error>> {
        let outcome = classify(output.result_code());
        let error_code = output.error_code();
        debug!(%outcome, error_code, "job finished");

        if is_failure_code(error_code) || !outcome.is_success() {
            let code = if error_code != 0 {
                error_code
            } else {
                outcome.raw()
            };
            return Err(BridgeError::Unsuccessful {
                operation: Op::KIND,
                outcome,
                diagnostic: Diagnostic::describe(code, self.messages.as_ref(), Op::KIND),
            });
        }

        Ok(Completed { outcome, output })
    }

    fn transition(&mut self, next: BridgeState) {
        debug!(from = ?self.state, to = ?next, "bridge state");
        self.state = next;
    }
}
