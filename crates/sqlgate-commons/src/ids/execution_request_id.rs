//! Type-safe wrapper for execution request identifiers.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Opaque identifier of a reviewable execution request.
///
/// The id is owned by the execution request collaborator; this core never
/// parses it. All live-session state is keyed by this id, 1:1 with the
/// underlying request.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ExecutionRequestId(String);

impl ExecutionRequestId {
    /// Creates a new ExecutionRequestId from a string.
    #[inline]
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Returns the id as a string slice.
    #[inline]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Returns the id as bytes, for use in canonical signing input.
    #[inline]
    pub fn as_bytes(&self) -> &[u8] {
        self.0.as_bytes()
    }

    /// Consumes the wrapper and returns the inner String.
    pub fn into_string(self) -> String {
        self.0
    }
}

impl fmt::Display for ExecutionRequestId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<String> for ExecutionRequestId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl From<&str> for ExecutionRequestId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}
