//! sqlgate — tamper-evident, dual-control review for live SQL sessions.
//!
//! An author drafts a statement inside a live session; every edit is signed
//! with HMAC-SHA256 over the session id and statement text, keyed by a secret
//! minted at session creation. Reviewers watch the session over a broadcast
//! topic and see the current statement together with its integrity code.
//! Execution requires an approver (never the author) to submit the statement
//! they reviewed plus the matching integrity code; the gate re-derives the
//! signature, records an approval exactly once, and runs the statement at
//! most once.
//!
//! The facade crate wires the member crates together and adds configuration
//! and logging. Most applications only need [`SessionService`] plus the
//! collaborator traits in [`sqlgate_core::stores`].

pub mod config;
pub mod logging;

pub use config::{GateConfig, LoggingSettings, SessionSettings};
pub use logging::{init_logging, init_simple_logging, LogFormat};

pub use sqlgate_commons::errors::{GateError, Result};
pub use sqlgate_commons::ids::{
    ConnectionId, ExecutionRequestId, SubscriberId, TopicId, UserId,
};
pub use sqlgate_commons::protocol::{ClientMessage, RowData, ServerMessage};

pub use sqlgate_live::broadcaster::{SessionSender, TopicBroadcaster};
pub use sqlgate_live::session::LiveSession;

pub use sqlgate_core::gate::ReviewGate;
pub use sqlgate_core::registry::SessionRegistry;
pub use sqlgate_core::secret::AuthorSecret;
pub use sqlgate_core::service::SessionService;
pub use sqlgate_core::signing::PayloadSigner;
pub use sqlgate_core::stores::{
    ConnectionInfo, ExecutionRequestStore, ExecutionResult, QueryExecutor, RequestDetails,
    RequestPayload, ReviewAction, ReviewRecord, ReviewStatus, ReviewStore,
};
