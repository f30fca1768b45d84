//! Shared error taxonomy for sqlgate.
//!
//! Every verification or collaborator failure is resolved into one of these
//! variants before crossing the core boundary; raw cryptographic or storage
//! errors never leak through. Error messages for rejected execute attempts
//! must not reveal the expected signature or the author secret.

use thiserror::Error;

use crate::ids::ExecutionRequestId;

/// Main error type for sqlgate operations.
#[derive(Error, Debug)]
pub enum GateError {
    /// A connection id did not resolve to a known datasource connection.
    #[error("Invalid connection: {0}")]
    InvalidConnection(String),

    /// A referenced execution request does not exist.
    #[error("Not found: {0}")]
    NotFound(String),

    /// Invalid input provided by the caller (e.g. an empty statement).
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// The submitted text/signature pair does not match what the author
    /// actually signed. Intentionally carries only the request id.
    #[error("Signature verification failed for execution request {0}")]
    SignatureMismatch(ExecutionRequestId),

    /// The approver is the author of the request.
    #[error("Self-approval is forbidden: the approver must differ from the request author")]
    SelfApprovalForbidden,

    /// The request was already executed; a session executes at most once.
    #[error("Execution request {0} has already been executed")]
    AlreadyExecuted(ExecutionRequestId),

    /// The signing primitive could not be instantiated. Configuration error,
    /// fatal at startup rather than a per-request condition.
    #[error("Signing primitive unavailable: {0}")]
    CryptoUnavailable(String),

    /// The underlying query execution failed. The approval record is kept;
    /// the request stays approved and the execute call may be retried.
    #[error("Execution failed: {0}")]
    ExecutionFailed(String),

    /// Unexpected internal state.
    #[error("Internal error: {0}")]
    Internal(String),
}

impl GateError {
    /// Creates a NotFound error for an execution request id.
    pub fn request_not_found(id: &ExecutionRequestId) -> Self {
        Self::NotFound(format!("execution request {}", id))
    }

    /// True when the caller may retry the same call unchanged.
    ///
    /// Only executor failures are retryable: the approval already exists and
    /// resubmitting the same text/signature is the documented recovery path.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::ExecutionFailed(_))
    }
}

/// Result type for sqlgate operations.
pub type Result<T> = std::result::Result<T, GateError>;
