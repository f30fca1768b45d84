//! # sqlgate-commons
//!
//! Shared building blocks for the sqlgate workspace:
//! - Type-safe identifier wrappers (`ids`)
//! - The cross-crate error taxonomy (`errors`)
//! - The session message protocol exchanged with clients (`protocol`)
//!
//! This crate carries no business logic and stays dependency-light so every
//! other crate in the workspace can depend on it.

pub mod errors;
pub mod ids;
pub mod protocol;

pub use errors::{GateError, Result};
pub use ids::{ConnectionId, ExecutionRequestId, SubscriberId, TopicId, UserId};
pub use protocol::{ClientMessage, RowData, ServerMessage};
