//! Edit channel: sign author keystrokes and broadcast them.
//!
//! Pure transport-and-signing step: no SQL linting, no buffering, no
//! coalescing. Every call signs the full draft and delivers it once to each
//! current subscriber of the session topic. Per-author ordering holds because
//! each author publishes from a single logical writer and `publish_edit` is
//! synchronous.

use std::sync::Arc;

use sqlgate_commons::{ExecutionRequestId, Result, TopicId};
use sqlgate_live::{LiveSession, TopicBroadcaster};

use crate::secret::AuthorSecret;
use crate::signing::PayloadSigner;

/// Accepts author edits, signs them, and hands them to the broadcaster.
pub struct EditChannel {
    signer: PayloadSigner,
    broadcaster: Arc<TopicBroadcaster>,
}

impl EditChannel {
    pub fn new(signer: PayloadSigner, broadcaster: Arc<TopicBroadcaster>) -> Self {
        Self {
            signer,
            broadcaster,
        }
    }

    /// Sign `text` under the author's secret and broadcast the resulting
    /// session state to `liveSession/{id}`.
    ///
    /// Delivery is at-most-once per call and fire-and-forget: a subscriber
    /// that misses an interim edit loses nothing security-relevant, since
    /// only the execute-time payload is verified by the gate.
    pub fn publish_edit(
        &self,
        request_id: &ExecutionRequestId,
        text: &str,
        secret: &AuthorSecret,
    ) -> Result<LiveSession> {
        let code = self.signer.sign(request_id, text, secret)?;
        let session = LiveSession::signed(request_id.clone(), text, code);

        let topic = TopicId::for_session(request_id);
        let delivered = self.broadcaster.publish(&topic, session.to_status_message());
        log::debug!(
            "published edit for {} to {} subscriber(s)",
            request_id,
            delivered
        );

        Ok(session)
    }
}
