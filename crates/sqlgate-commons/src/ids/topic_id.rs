//! Type-safe wrapper for broadcast topic identifiers.

use std::fmt;

use serde::{Deserialize, Serialize};

use super::ExecutionRequestId;

/// Prefix for per-session live topics.
pub const LIVE_SESSION_TOPIC_PREFIX: &str = "liveSession/";

/// Identifier of a broadcast topic.
///
/// Topics are scoped to a single execution request: `liveSession/{request_id}`.
/// There are no wildcard or global topics; a subscriber always names the exact
/// session it wants to observe.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TopicId(String);

impl TopicId {
    /// Builds the topic for a live session.
    pub fn for_session(request_id: &ExecutionRequestId) -> Self {
        Self(format!("{}{}", LIVE_SESSION_TOPIC_PREFIX, request_id))
    }

    /// Returns the topic as a string slice.
    #[inline]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Extracts the execution request id if this is a live-session topic.
    pub fn session_request_id(&self) -> Option<ExecutionRequestId> {
        self.0
            .strip_prefix(LIVE_SESSION_TOPIC_PREFIX)
            .filter(|rest| !rest.is_empty())
            .map(ExecutionRequestId::new)
    }
}

impl fmt::Display for TopicId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}
