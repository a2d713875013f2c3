//! Outcome classification.
//!
//! External jobs report their state as a raw operation result code. `classify`
//! maps every possible raw value onto the closed `Outcome` set; anything the
//! table does not know becomes `Outcome::Unexpected` with the raw value kept
//! for diagnostics.

use std::fmt;

use crate::messages::MessageTable;

/// Raw operation result codes as reported by the update agent.
pub mod code {
    pub const NOT_STARTED: i32 = 0;
    pub const IN_PROGRESS: i32 = 1;
    pub const SUCCEEDED: i32 = 2;
    pub const SUCCEEDED_WITH_ERRORS: i32 = 3;
    pub const FAILED: i32 = 4;
    pub const ABORTED: i32 = 5;
}

/// Classified state of a job or of one work item.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Outcome {
    NotStarted,
    InProgress,
    Succeeded,
    SucceededWithErrors,
    Failed,
    Aborted,
    /// A raw code outside the known table.
    Unexpected(i32),
}

impl Outcome {
    /// True for the only two outcomes that need no corrective action.
    pub fn is_success(&self) -> bool {
        matches!(self, Outcome::Succeeded | Outcome::SucceededWithErrors)
    }

    /// True for outcomes that are still moving and not yet actionable.
    pub fn is_pending(&self) -> bool {
        matches!(self, Outcome::NotStarted | Outcome::InProgress)
    }

    /// True for terminal outcomes that require attention.
    pub fn needs_attention(&self) -> bool {
        !self.is_success() && !self.is_pending()
    }

    /// The raw code this outcome was classified from.
    pub fn raw(&self) -> i32 {
        match self {
            Outcome::NotStarted => code::NOT_STARTED,
            Outcome::InProgress => code::IN_PROGRESS,
            Outcome::Succeeded => code::SUCCEEDED,
            Outcome::SucceededWithErrors => code::SUCCEEDED_WITH_ERRORS,
            Outcome::Failed => code::FAILED,
            Outcome::Aborted => code::ABORTED,
            Outcome::Unexpected(raw) => *raw,
        }
    }
}

impl fmt::Display for Outcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Outcome::NotStarted => write!(f, "Not Started"),
            Outcome::InProgress => write!(f, "In Progress"),
            Outcome::Succeeded => write!(f, "Succeeded"),
            Outcome::SucceededWithErrors => write!(f, "Succeeded With Errors"),
            Outcome::Failed => write!(f, "Failed"),
            Outcome::Aborted => write!(f, "Aborted"),
            Outcome::Unexpected(raw) => write!(f, "Unexpected ({})", raw),
        }
    }
}

/// Map a raw operation result code to an `Outcome`. Total over `i32`.
pub fn classify(raw: i32) -> Outcome {
    match raw {
        code::NOT_STARTED => Outcome::NotStarted,
        code::IN_PROGRESS => Outcome::InProgress,
        code::SUCCEEDED => Outcome::Succeeded,
        code::SUCCEEDED_WITH_ERRORS => Outcome::SucceededWithErrors,
        code::FAILED => Outcome::Failed,
        code::ABORTED => Outcome::Aborted,
        other => Outcome::Unexpected(other),
    }
}

/// True when an HRESULT-style error code has its severity bit set.
pub fn is_failure_code(code: i32) -> bool {
    code < 0
}

/// A numeric error code paired with its human-readable explanation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Diagnostic {
    pub code: i32,
    pub message: String,
}

impl Diagnostic {
    /// Resolve `code` through `table`, falling back to `"<subject> Result 0x%08X."`.
    pub fn describe(code: i32, table: &dyn MessageTable, subject: &str) -> Self {
        let message = match table.lookup(code) {
            Some(message) => message.to_string(),
            None => format!("{} Result 0x{:08X}.", subject, code as u32),
        };
        Diagnostic { code, message }
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} (0x{:08X})", self.message, self.code as u32)
    }
}
