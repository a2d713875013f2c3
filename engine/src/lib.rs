//! # Waffle Engine - Blocking Bridge for Callback-Driven Jobs
//!
//! A library for running long-running, callback-based external jobs (update
//! search, download and install) as plain blocking calls with a timeout.
//!
//! ## Overview
//!
//! The engine provides:
//! - A generic `OperationBridge` that starts a job, waits for its completion
//!   signal and either retrieves the result or aborts it
//! - Guaranteed cleanup of the job on every exit path
//! - Per-item progress dispatch from the job's own notification threads
//! - Classification of raw result codes into a small set of outcomes
//! - Human-readable diagnostics and byte-count formatting for progress output
//!
//! ## Basic Usage
//!
//! ```no_run
//! use engine::{classify, format_transfer, Outcome};
//!
//! assert_eq!(classify(2), Outcome::Succeeded);
//! assert!(classify(3).is_success());
//! assert_eq!(format_transfer(50 * 1024 * 1024, 80 * 1024 * 1024), "50/80MB");
//! ```
//!
//! A job kind implements `AsyncOperation`; the bridge does the rest:
//!
//! ```ignore
//! let mut bridge = OperationBridge::new(searcher);
//! let completed = bridge.wait(Timeout::from_millis(180_000), request)?;
//! println!("{}", completed.outcome);
//! ```
//!
//! ## Modules
//!
//! - **signal**: one-shot completion signal and timeouts
//! - **job**: external job traits and scoped cleanup
//! - **bridge**: the blocking state machine
//! - **dispatch**: progress notification routing
//! - **outcome**: result classification and diagnostics
//! - **messages**: error-code message tables
//! - **size**: byte and percentage formatting
//! - **config**: session configuration
//! - **agent**: update search/download/install session
//! - **error**: error types

pub mod agent;
pub mod bridge;
pub mod config;
pub mod dispatch;
pub mod error;
pub mod job;
pub mod messages;
pub mod outcome;
pub mod signal;
pub mod size;

// Re-export main types and functions
pub use bridge::{BridgeState, Completed, OperationBridge};
pub use config::SessionConfig;
pub use dispatch::{
    CallbackStatus, DispatchStats, PartialResult, ProgressCallback, ProgressDispatcher,
    ProgressEvent, ProgressSnapshot,
};
pub use error::{BridgeError, CallbackError, ConfigError, SessionError, SignalError, SnapshotError};
pub use job::{AsyncOperation, JobGuard, JobHandle, OperationReport};
pub use messages::{MessageTable, UpdateAgentMessages};
pub use outcome::{classify, Diagnostic, Outcome};
pub use signal::{CompletionNotifier, CompletionSignal, Timeout};
pub use size::{format_percent, format_transfer};
