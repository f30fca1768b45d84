//! Session message protocol for live query review.
//!
//! This module defines the messages exchanged between clients and the core
//! for one live review session. The transport (WebSocket or otherwise) is out
//! of scope; these are the shapes it carries.
//!
//! # Protocol Flow
//!
//! ## 1. Author keystroke update
//! ```json
//! {
//!   "type": "update_content",
//!   "content": "SELECT * FROM accounts"
//! }
//! ```
//!
//! ## 2. Server status broadcast to every subscriber of `liveSession/{id}`
//! ```json
//! {
//!   "type": "status",
//!   "session_id": "req_1",
//!   "console_content": "SELECT * FROM accounts",
//!   "integrity_code": "9b2cf61c…"
//! }
//! ```
//!
//! ## 3. Reviewer execute request
//! ```json
//! {
//!   "type": "execute",
//!   "statement": "SELECT * FROM accounts",
//!   "signature": "9b2cf61c…"
//! }
//! ```
//!
//! ## 4. Server result / error
//! ```json
//! {
//!   "type": "result",
//!   "session_id": "req_1",
//!   "rows": [{"id": 1}],
//!   "rows_affected": null
//! }
//! ```
//! ```json
//! {
//!   "type": "error",
//!   "session_id": "req_1",
//!   "message": "Signature verification failed for execution request req_1"
//! }
//! ```
//!
//! The author secret never appears in any message: the author keeps it local
//! and only ever submits text; the integrity code it produces is the only
//! derived value that travels.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;

/// Type alias for row data in result messages (column name -> JSON value).
pub type RowData = HashMap<String, JsonValue>;

/// Client-to-server request messages for a live session.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ClientMessage {
    /// Author keystroke-level content update.
    ///
    /// Sent on every edit; the core signs the content with the author secret
    /// (supplied out-of-band, never inside this message) and broadcasts the
    /// resulting status to all subscribers. No buffering or coalescing.
    UpdateContent {
        /// The full current draft text.
        content: String,
    },

    /// Reviewer-triggered execution attempt.
    ///
    /// Carries the exact statement the reviewer saw and the integrity code
    /// that arrived with it. The gate re-verifies the pair against the
    /// author's original secret before anything runs.
    Execute {
        /// The statement to execute, exactly as observed.
        statement: String,
        /// The integrity code observed for that statement (lowercase hex).
        signature: String,
    },
}

/// Server-to-client messages for a live session.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ServerMessage {
    /// Current draft state, broadcast to every subscriber of the session
    /// topic after each author edit.
    Status {
        /// The execution request id the session belongs to.
        session_id: String,
        /// The current draft text.
        console_content: String,
        /// Integrity code over (session_id, console_content) under the author
        /// secret; `None` only for the empty pre-edit view.
        integrity_code: Option<String>,
    },

    /// Execution result after a successful four-eyes execute.
    Result {
        /// The execution request id the session belongs to.
        session_id: String,
        /// Result rows, if the statement produced any.
        rows: Vec<RowData>,
        /// Affected row count for DML statements.
        rows_affected: Option<u64>,
    },

    /// Error outcome for an execute attempt on this session.
    Error {
        /// The execution request id the session belongs to.
        session_id: String,
        /// Human-readable error. Never contains the expected signature or
        /// the author secret.
        message: String,
    },
}

impl ClientMessage {
    /// Create a content update message.
    pub fn update_content(content: impl Into<String>) -> Self {
        Self::UpdateContent {
            content: content.into(),
        }
    }

    /// Create an execute message.
    pub fn execute(statement: impl Into<String>, signature: impl Into<String>) -> Self {
        Self::Execute {
            statement: statement.into(),
            signature: signature.into(),
        }
    }
}

impl ServerMessage {
    /// Create a status message.
    pub fn status(
        session_id: impl Into<String>,
        console_content: impl Into<String>,
        integrity_code: Option<String>,
    ) -> Self {
        Self::Status {
            session_id: session_id.into(),
            console_content: console_content.into(),
            integrity_code,
        }
    }

    /// Create a result message.
    pub fn result(
        session_id: impl Into<String>,
        rows: Vec<RowData>,
        rows_affected: Option<u64>,
    ) -> Self {
        Self::Result {
            session_id: session_id.into(),
            rows,
            rows_affected,
        }
    }

    /// Create an error message.
    pub fn error(session_id: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Error {
            session_id: session_id.into(),
            message: message.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_update_content_serialization() {
        let msg = ClientMessage::update_content("SELECT 1");
        let json = serde_json::to_string(&msg).unwrap();
        assert!(json.contains("\"type\":\"update_content\""));
        assert!(json.contains("SELECT 1"));
    }

    #[test]
    fn test_execute_serialization() {
        let msg = ClientMessage::execute("SELECT 1", "abc123");
        let json = serde_json::to_string(&msg).unwrap();
        assert!(json.contains("\"type\":\"execute\""));
        assert!(json.contains("\"signature\":\"abc123\""));
    }

    #[test]
    fn test_status_round_trip() {
        let msg = ServerMessage::status("req_1", "SELECT 1", Some("abc123".to_string()));
        let json = serde_json::to_string(&msg).unwrap();
        assert!(json.contains("\"type\":\"status\""));

        let back: ServerMessage = serde_json::from_str(&json).unwrap();
        match back {
            ServerMessage::Status {
                session_id,
                console_content,
                integrity_code,
            } => {
                assert_eq!(session_id, "req_1");
                assert_eq!(console_content, "SELECT 1");
                assert_eq!(integrity_code.as_deref(), Some("abc123"));
            }
            other => panic!("expected status, got {:?}", other),
        }
    }

    #[test]
    fn test_result_serialization() {
        let mut row = RowData::new();
        row.insert("id".to_string(), serde_json::json!(1));
        let msg = ServerMessage::result("req_1", vec![row], None);

        let json = serde_json::to_string(&msg).unwrap();
        assert!(json.contains("\"type\":\"result\""));
        assert!(json.contains("\"id\":1"));
    }

    #[test]
    fn test_client_message_parse() {
        let json = r#"{"type":"execute","statement":"SELECT 1","signature":"ff00"}"#;
        let msg: ClientMessage = serde_json::from_str(json).unwrap();
        match msg {
            ClientMessage::Execute {
                statement,
                signature,
            } => {
                assert_eq!(statement, "SELECT 1");
                assert_eq!(signature, "ff00");
            }
            other => panic!("expected execute, got {:?}", other),
        }
    }
}
