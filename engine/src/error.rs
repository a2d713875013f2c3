//! Error types for the bridge.
//!
//! `BridgeError` is what a blocking `wait` returns; every variant is raised
//! only after the job (if one was started) has been cleaned up. Failures inside
//! the user's progress callback never appear here: the dispatcher turns them
//! into a `CallbackStatus` for the external subsystem instead.

use std::path::PathBuf;

use thiserror::Error;

use crate::bridge::BridgeState;
use crate::outcome::{Diagnostic, Outcome};
use crate::signal::Timeout;

/// Failures of the completion wait primitive.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum SignalError {
    #[error("timed out after {timeout}")]
    TimedOut { timeout: Timeout },

    /// A thread panicked while holding the signal's lock.
    #[error("completion signal lock poisoned")]
    Poisoned,
}

/// Errors returned by `OperationBridge::wait`.
#[derive(Debug, Error)]
pub enum BridgeError<E>
where
    E: std::error::Error + Send + Sync + 'static,
{
    #[error("failed to start {operation} job")]
    StartFailed {
        operation: &'static str,
        #[source]
        source: E,
    },

    /// The job did not signal completion in time; it was aborted and cleaned up.
    #[error("{operation} job did not complete within {timeout}")]
    TimedOut {
        operation: &'static str,
        timeout: Timeout,
    },

    #[error("waiting for {operation} job failed")]
    Signal {
        operation: &'static str,
        #[source]
        source: SignalError,
    },

    #[error("failed to retrieve {operation} result")]
    RetrievalFailed {
        operation: &'static str,
        #[source]
        source: E,
    },

    /// The job finished but its outcome is not good enough to proceed.
    #[error("{operation} finished with outcome {outcome}: {diagnostic}")]
    Unsuccessful {
        operation: &'static str,
        outcome: Outcome,
        diagnostic: Diagnostic,
    },

    #[error("{operation} bridge already used (state {state:?})")]
    AlreadyUsed {
        operation: &'static str,
        state: BridgeState,
    },
}

impl<E> BridgeError<E>
where
    E: std::error::Error + Send + Sync + 'static,
{
    pub fn is_timeout(&self) -> bool {
        matches!(self, BridgeError::TimedOut { .. })
    }

    /// The classified outcome, for errors that carry one.
    pub fn outcome(&self) -> Option<Outcome> {
        match self {
            BridgeError::Unsuccessful { outcome, .. } => Some(*outcome),
            _ => None,
        }
    }
}

/// Error returned by a user progress callback.
#[derive(Debug, Error)]
#[error("{message}")]
pub struct CallbackError {
    message: String,
}

impl CallbackError {
    pub fn new(message: impl Into<String>) -> Self {
        CallbackError {
            message: message.into(),
        }
    }
}

impl From<std::io::Error> for CallbackError {
    fn from(err: std::io::Error) -> Self {
        CallbackError::new(format!("progress output failed: {}", err))
    }
}

/// A progress snapshot could not be read.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("progress snapshot unavailable: {reason}")]
pub struct SnapshotError {
    pub reason: String,
}

impl SnapshotError {
    pub fn new(reason: impl Into<String>) -> Self {
        SnapshotError {
            reason: reason.into(),
        }
    }
}

/// Errors loading a `SessionConfig`.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file {}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid config: {0}")]
    Parse(#[from] toml::de::Error),
}

/// Errors from the update session layer.
#[derive(Debug, Error)]
pub enum SessionError<E>
where
    E: std::error::Error + Send + Sync + 'static,
{
    /// The update service itself failed outside any bridged job.
    #[error("update service error")]
    Service(#[source] E),

    #[error(transparent)]
    Bridge(#[from] BridgeError<E>),
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io;

    #[test]
    fn test_bridge_error_messages() {
        let err: BridgeError<io::Error> = BridgeError::TimedOut {
            operation: "search",
            timeout: Timeout::from_millis(100),
        };
        assert_eq!(err.to_string(), "search job did not complete within 100ms");
        assert!(err.is_timeout());
        assert_eq!(err.outcome(), None);

        let err: BridgeError<io::Error> = BridgeError::Unsuccessful {
            operation: "download",
            outcome: Outcome::Failed,
            diagnostic: Diagnostic {
                code: -1,
                message: "boom".to_string(),
            },
        };
        assert_eq!(err.outcome(), Some(Outcome::Failed));
        assert!(err.to_string().starts_with("download finished with outcome Failed: boom"));
    }

    #[test]
    fn test_start_failure_keeps_source() {
        let err = BridgeError::StartFailed {
            operation: "install",
            source: io::Error::new(io::ErrorKind::Other, "no service"),
        };
        let source = std::error::Error::source(&err).expect("source missing");
        assert_eq!(source.to_string(), "no service");
    }

    #[test]
    fn test_callback_error_from_io() {
        let err = CallbackError::from(io::Error::new(io::ErrorKind::BrokenPipe, "pipe closed"));
        assert_eq!(err.to_string(), "progress output failed: pipe closed");
    }
}
