//! # sqlgate-live
//!
//! The ephemeral, broadcast-synchronized side of a review session:
//! - `session`: the `LiveSession` view (draft text plus derived integrity code)
//! - `broadcaster`: per-session topic fan-out to subscribed reviewers
//!
//! Nothing here is persisted; a live session exists exactly as long as its
//! underlying execution request does.

pub mod broadcaster;
pub mod session;

pub use broadcaster::{SessionSender, TopicBroadcaster};
pub use session::LiveSession;
