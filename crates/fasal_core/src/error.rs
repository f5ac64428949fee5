//! Error taxonomy for the advisory subsystem.
//!
//! The contract is "always return a usable recommendation list": almost every
//! failure is absorbed locally and surfaced only through logs and the
//! `data_sources` metadata of a report. The exceptions are enumerated here.
//! Feed-level errors live in `fasal_gateway::GatewayError`; the fusion engine
//! converts those into fallback defaults before they can reach a caller.

use thiserror::Error;

/// Caller-visible errors of the advisory subsystem.
#[derive(Debug, Error)]
pub enum AdvisoryError {
    /// The Base Recommendation Provider could not answer. This is the one
    /// failure that propagates: without baseline candidates there is nothing
    /// to degrade to.
    #[error("Data unavailable: {0}")]
    DataUnavailable(String),

    /// A training run was requested with fewer samples than the gate allows.
    /// Non-fatal; the current model set stays in place.
    #[error("Insufficient training data: {samples} samples, {required} required")]
    TrainingInsufficientData { samples: usize, required: usize },

    /// Store read/write or model load/save failure. Callers get best-effort
    /// in-memory results rather than this error wherever possible.
    #[error("Persistence failure: {0}")]
    Persistence(String),
}

impl AdvisoryError {
    /// Shorthand for wrapping storage-layer error strings.
    pub fn persistence(e: impl std::fmt::Display) -> Self {
        Self::Persistence(e.to_string())
    }
}
