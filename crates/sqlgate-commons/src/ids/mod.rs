//! Type-safe identifier wrappers.
//!
//! Each identifier gets its own newtype so a datasource connection id cannot
//! be passed where an execution request id is expected. All wrappers share the
//! same surface: `new`, `as_str`, `into_string`, `Display`, and serde
//! round-tripping as a plain string.

mod connection_id;
mod execution_request_id;
mod subscriber_id;
mod topic_id;
mod user_id;

pub use connection_id::ConnectionId;
pub use execution_request_id::ExecutionRequestId;
pub use subscriber_id::SubscriberId;
pub use topic_id::TopicId;
pub use user_id::UserId;
