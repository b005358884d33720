//! Error types for the domain layer.

use thiserror::Error;

/// Errors that occur during value object construction or state changes.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("Field '{field}' cannot be empty")]
    EmptyField { field: String },

    #[error("Field '{field}' has invalid format: {reason}")]
    InvalidFormat { field: String, reason: String },

    #[error("Invalid state transition from {from} to {to}")]
    InvalidTransition { from: String, to: String },
}

impl ValidationError {
    /// Creates an empty field validation error.
    pub fn empty_field(field: impl Into<String>) -> Self {
        ValidationError::EmptyField { field: field.into() }
    }

    /// Creates an invalid format validation error.
    pub fn invalid_format(field: impl Into<String>, reason: impl Into<String>) -> Self {
        ValidationError::InvalidFormat {
            field: field.into(),
            reason: reason.into(),
        }
    }

    /// Creates an invalid transition error from the debug names of two states.
    pub fn invalid_transition(from: impl Into<String>, to: impl Into<String>) -> Self {
        ValidationError::InvalidTransition {
            from: from.into(),
            to: to.into(),
        }
    }
}
