//! # sqlgate-core
//!
//! The dual-control review protocol itself:
//! - `signing`: HMAC-SHA256 payload signer binding edits to their author
//! - `secret`: per-request author secrets
//! - `stores`: collaborator contracts (requests, reviews, executor)
//! - `registry`: session creation and awaiting-review enumeration
//! - `edit_channel`: sign-and-broadcast path for author edits
//! - `gate`: the four-eyes enforcement point — independent re-verification,
//!   exactly-once approval, at-most-once execution
//! - `service`: the facade the surrounding system talks to
//!
//! Transport, persistence, identity resolution, and the SQL engine live
//! behind the `stores` traits; this crate owns only the protocol.

pub mod edit_channel;
pub mod gate;
pub mod registry;
pub mod secret;
pub mod service;
pub mod signing;
pub mod stores;
pub mod test_support;

pub use edit_channel::EditChannel;
pub use gate::ReviewGate;
pub use registry::SessionRegistry;
pub use secret::AuthorSecret;
pub use service::SessionService;
pub use signing::PayloadSigner;
pub use stores::{
    ConnectionInfo, ExecutionRequestStore, ExecutionResult, QueryExecutor, RequestDetails,
    RequestPayload, ReviewAction, ReviewRecord, ReviewStatus, ReviewStore,
};
