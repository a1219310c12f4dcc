//! Error types for the remote API boundary and lifecycle operations.

use std::fmt;

use thiserror::Error;

use crate::clients::NetworkId;
use crate::state::NetworkState;

/// Classification of a failed remote call, decided once by the client.
///
/// Only `Conflict` changes control flow. `Transient` and `Fatal` are reported
/// to the caller as-is; the enable retry spends its budget on both.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// The requested state already holds (HTTP 409).
    Conflict,
    /// The remote side may accept the same call later.
    Transient,
    /// Any other rejection.
    Fatal,
    /// A success status arrived with a body that could not be decoded.
    Malformed,
}

impl ErrorKind {
    /// Classify an HTTP status code.
    pub fn from_status(status: u16) -> Self {
        match status {
            409 => ErrorKind::Conflict,
            408 | 429 => ErrorKind::Transient,
            s if s >= 500 => ErrorKind::Transient,
            _ => ErrorKind::Fatal,
        }
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ErrorKind::Conflict => write!(f, "conflict"),
            ErrorKind::Transient => write!(f, "transient"),
            ErrorKind::Fatal => write!(f, "fatal"),
            ErrorKind::Malformed => write!(f, "malformed"),
        }
    }
}

/// A failed call against the remote networking API.
#[derive(Debug, Clone, Error)]
#[error("{kind} remote error ({}): {message}", display_status(.status))]
pub struct ApiError {
    pub kind: ErrorKind,
    /// HTTP status, absent when the request never got a response.
    pub status: Option<u16>,
    pub message: String,
}

impl ApiError {
    /// Build an error from a response status, classifying it.
    pub fn from_status(status: u16, message: impl Into<String>) -> Self {
        Self {
            kind: ErrorKind::from_status(status),
            status: Some(status),
            message: message.into(),
        }
    }

    /// Build an error for a request that failed before a response arrived.
    pub fn transport(message: impl Into<String>) -> Self {
        Self {
            kind: ErrorKind::Transient,
            status: None,
            message: message.into(),
        }
    }

    /// Build an error for a success response whose body could not be decoded.
    pub fn malformed(message: impl Into<String>) -> Self {
        Self {
            kind: ErrorKind::Malformed,
            status: None,
            message: message.into(),
        }
    }

    /// Reclassify a 404 as transient, for calls that race with provisioning.
    pub fn not_found_is_transient(mut self) -> Self {
        if self.status == Some(404) {
            self.kind = ErrorKind::Transient;
        }
        self
    }

    pub fn is_conflict(&self) -> bool {
        self.kind == ErrorKind::Conflict
    }
}

fn display_status(status: &Option<u16>) -> String {
    match status {
        Some(s) => s.to_string(),
        None => "no status".to_string(),
    }
}

/// Errors surfaced by lifecycle operations.
#[derive(Debug, Error)]
pub enum ControllerError {
    /// Remote call failed; status and message are preserved.
    #[error(transparent)]
    Remote(#[from] ApiError),

    /// The backend returned the wrong number of records for a single-id query.
    #[error("internal: expected {expected} private network record, got {actual}")]
    Inconsistent { expected: usize, actual: usize },

    /// The operation needs a recorded network id but none is present.
    #[error("internal: resource has no recorded private network id")]
    MissingId,

    /// The network exists remotely but a later step of create failed.
    /// `state` holds the id and whatever a follow-up read returned.
    #[error("private network {network_id} was created but is not fully configured: {source}")]
    Incomplete {
        network_id: NetworkId,
        state: Box<NetworkState>,
        source: Box<ControllerError>,
    },
}

impl ControllerError {
    /// Internal errors come from broken backend contracts; retrying cannot help.
    pub fn is_internal(&self) -> bool {
        match self {
            ControllerError::Remote(_) => false,
            ControllerError::Incomplete { source, .. } => source.is_internal(),
            _ => true,
        }
    }
}

/// Result type for lifecycle operations.
pub type Result<T> = std::result::Result<T, ControllerError>;
