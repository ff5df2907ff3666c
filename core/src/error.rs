//! Error types for the submission API client.
//!
//! # Design
//! `Validation` is the only variant carrying structured detail: every backend
//! rejection (400 error map or 422 detail list) is normalized into it before
//! it reaches a caller. Everything else is a transport failure of some kind
//! and is shown to users as a generic message.

use thiserror::Error;

use crate::types::{FieldErrors, SubmitFailure};

/// Errors returned by `SubmissionClient` parse methods and `FormApi`.
#[derive(Debug, Error)]
pub enum ApiError {
    /// The backend rejected the payload.
    #[error("submission rejected: {0}")]
    Validation(SubmitFailure),

    /// The backend answered with a status outside the contract.
    #[error("unexpected HTTP status {status}")]
    Transport { status: u16 },

    /// The request never produced a response.
    #[error("network failure: {0}")]
    Network(String),

    /// The response body did not match the shape expected for its status.
    #[error("deserialization failed: {0}")]
    Deserialization(String),

    /// The request payload could not be serialized to JSON.
    #[error("serialization failed: {0}")]
    Serialization(String),
}

impl ApiError {
    pub fn is_validation(&self) -> bool {
        matches!(self, ApiError::Validation(_))
    }

    /// Per-field messages when this is a validation failure.
    pub fn field_errors(&self) -> Option<&FieldErrors> {
        match self {
            ApiError::Validation(failure) => Some(&failure.errors),
            _ => None,
        }
    }

    /// HTTP status for `Transport` errors.
    pub fn status(&self) -> Option<u16> {
        match self {
            ApiError::Transport { status } => Some(*status),
            _ => None,
        }
    }
}
