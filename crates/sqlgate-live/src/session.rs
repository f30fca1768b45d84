//! Live session state.
//!
//! A `LiveSession` is the in-memory representation of one review session:
//! the execution request it belongs to, the author's current draft text, and
//! the integrity code derived over the two. There is exactly one author per
//! session (single writer) and any number of concurrent reviewers.

use serde::{Deserialize, Serialize};
use sqlgate_commons::protocol::ServerMessage;
use sqlgate_commons::ExecutionRequestId;

/// The live draft state of one query under review.
///
/// Invariant: `integrity_code`, when present, is always the signature of
/// (request id, `sql_text`) under the session author's secret — it is derived
/// by this core on every mutation, never accepted from a peer. A session
/// received with a mismatching code is rejected, not repaired.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LiveSession {
    /// The execution request this session reviews (1:1).
    pub execution_request_id: ExecutionRequestId,

    /// The author's current draft text. Author-writable only.
    pub sql_text: String,

    /// Integrity code over (request id, text) under the author secret.
    /// `None` only for the empty pre-edit view returned by the registry.
    pub integrity_code: Option<String>,
}

impl LiveSession {
    /// The empty view of a session that has seen no edits, as returned by
    /// `list_awaiting_review`. No live content is leaked until a subscriber
    /// joins the session topic.
    pub fn empty(execution_request_id: ExecutionRequestId) -> Self {
        Self {
            execution_request_id,
            sql_text: String::new(),
            integrity_code: None,
        }
    }

    /// A signed session view carrying the author's current draft.
    pub fn signed(
        execution_request_id: ExecutionRequestId,
        sql_text: impl Into<String>,
        integrity_code: impl Into<String>,
    ) -> Self {
        Self {
            execution_request_id,
            sql_text: sql_text.into(),
            integrity_code: Some(integrity_code.into()),
        }
    }

    /// The status message broadcast to subscribers for this session state.
    pub fn to_status_message(&self) -> ServerMessage {
        ServerMessage::status(
            self.execution_request_id.as_str(),
            self.sql_text.clone(),
            self.integrity_code.clone(),
        )
    }
}
