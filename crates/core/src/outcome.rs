//! Step outcomes
//!
//! Every shopper-journey step returns [`StepResult`], so scenarios make
//! abort/continue decisions on one vocabulary instead of on logs, sentinel
//! booleans, or backend-specific exceptions.

use std::time::Duration;

use thiserror::Error;

use crate::page::PageError;

/// Result of a single journey step.
pub type StepResult<T> = std::result::Result<T, StepError>;

/// How a journey step can fail.
#[derive(Error, Debug)]
pub enum StepError {
    /// The page does not currently offer the target at all.
    #[error("{target} not found")]
    NotFound { target: String },

    /// A bounded wait expired before its condition held.
    #[error("timed out after {waited:?} waiting for {target}")]
    Timeout { target: String, waited: Duration },

    /// A required fixture or configuration value is absent.
    #[error("missing configuration: {what}")]
    ConfigMissing { what: String },

    /// A capped loop ran out of passes before converging.
    #[error("{operation} still incomplete after {attempts} passes")]
    ExhaustedRetries { operation: String, attempts: u32 },

    /// The target was found but carried the wrong content.
    #[error("{what}: expected {expected:?}, got {actual:?}")]
    Mismatch {
        what: String,
        expected: String,
        actual: String,
    },

    /// The driving backend failed underneath the step.
    #[error("page driver: {0}")]
    Page(#[from] PageError),
}

impl StepError {
    pub fn not_found(target: impl Into<String>) -> Self {
        StepError::NotFound {
            target: target.into(),
        }
    }

    pub fn timeout(target: impl Into<String>, waited: Duration) -> Self {
        StepError::Timeout {
            target: target.into(),
            waited,
        }
    }

    pub fn config_missing(what: impl Into<String>) -> Self {
        StepError::ConfigMissing { what: what.into() }
    }

    pub fn mismatch(
        what: impl Into<String>,
        expected: impl Into<String>,
        actual: impl Into<String>,
    ) -> Self {
        StepError::Mismatch {
            what: what.into(),
            expected: expected.into(),
            actual: actual.into(),
        }
    }
}

/// Answer from a capability probe.
///
/// `Unknown` means the probe could not decide, e.g. the surrounding panel
/// had not finished rendering. Callers choose their own fallback instead of
/// treating a failed lookup as "absent".
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Probe {
    Present,
    Absent,
    Unknown,
}

impl Probe {
    pub fn is_present(self) -> bool {
        self == Probe::Present
    }
}
