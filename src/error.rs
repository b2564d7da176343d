//! Crate-wide error taxonomy.
//!
//! Infeasible sizings are never errors here: they surface as constraint
//! violation magnitudes and are handled by the external search. Errors are
//! reserved for configuration defects, unreadable profile data, and calculated
//! quantities leaving their designed range before the clamp point.

use thiserror::Error;

/// Configuration error with field path and constraint description.
#[derive(Debug, Clone, Error)]
#[error("config error: {field}: {message}")]
pub struct ConfigError {
    /// Dotted field path (e.g., `"technology.battery_efficiency"`).
    pub field: String,
    /// Human-readable constraint description.
    pub message: String,
}

impl ConfigError {
    pub fn new(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            message: message.into(),
        }
    }
}

/// Errors raised by the evaluation core.
#[derive(Debug, Error)]
pub enum EvalError {
    /// Invalid or missing configuration value.
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// Profile data could not be read, parsed, or has the wrong length.
    #[error("profile error: {source_name}: {message}")]
    Profile {
        /// File path or array name the error refers to.
        source_name: String,
        /// What went wrong.
        message: String,
    },

    /// A calculated quantity left its designed range before the clamp point.
    ///
    /// Signals a calculation defect upstream, not a legitimate edge case.
    #[error("invariant violation: {quantity} = {value}")]
    Invariant {
        /// Name of the offending quantity.
        quantity: &'static str,
        /// The out-of-range value.
        value: f64,
    },
}

impl EvalError {
    pub(crate) fn profile(source_name: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Profile {
            source_name: source_name.into(),
            message: message.into(),
        }
    }
}
