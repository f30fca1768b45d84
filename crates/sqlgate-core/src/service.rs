//! Session service: the facade the surrounding system talks to.
//!
//! Wires the registry, the edit channel, the gate, and the broadcaster over
//! the injected collaborator stores. All components share one signer; signer
//! construction failure is surfaced here, at wiring time, so a misconfigured
//! crypto primitive is fatal at startup rather than per request.

use std::sync::Arc;

use sqlgate_commons::protocol::ServerMessage;
use sqlgate_commons::{ConnectionId, ExecutionRequestId, Result, SubscriberId, TopicId, UserId};
use sqlgate_live::{LiveSession, TopicBroadcaster};
use tokio::sync::mpsc;

use crate::edit_channel::EditChannel;
use crate::gate::ReviewGate;
use crate::registry::{SessionRegistry, DEFAULT_SECRET_LENGTH_BYTES};
use crate::secret::AuthorSecret;
use crate::signing::PayloadSigner;
use crate::stores::{
    ExecutionRequestStore, ExecutionResult, QueryExecutor, RequestPayload, ReviewStore,
};

/// The live query-review protocol, fully wired.
pub struct SessionService {
    registry: SessionRegistry,
    edit_channel: EditChannel,
    gate: ReviewGate,
    broadcaster: Arc<TopicBroadcaster>,
}

impl SessionService {
    /// Wire the service over the given collaborators.
    pub fn new(
        requests: Arc<dyn ExecutionRequestStore>,
        reviews: Arc<dyn ReviewStore>,
        executor: Arc<dyn QueryExecutor>,
    ) -> Result<Self> {
        Self::with_secret_length(requests, reviews, executor, DEFAULT_SECRET_LENGTH_BYTES)
    }

    /// Wire the service with a non-default secret length (config-driven).
    pub fn with_secret_length(
        requests: Arc<dyn ExecutionRequestStore>,
        reviews: Arc<dyn ReviewStore>,
        executor: Arc<dyn QueryExecutor>,
        secret_length_bytes: usize,
    ) -> Result<Self> {
        let signer = PayloadSigner::new()?;
        let broadcaster = Arc::new(TopicBroadcaster::new());
        Ok(Self {
            registry: SessionRegistry::with_secret_length(requests.clone(), secret_length_bytes),
            edit_channel: EditChannel::new(signer, broadcaster.clone()),
            gate: ReviewGate::new(requests, reviews, executor, signer),
            broadcaster,
        })
    }

    /// Sessions currently awaiting four-eyes review (empty text views).
    pub async fn list_sessions_awaiting_review(&self) -> Result<Vec<LiveSession>> {
        self.registry.list_awaiting_review().await
    }

    /// Create a session; the returned secret goes to the creator only.
    pub async fn create_session(
        &self,
        connection_id: &ConnectionId,
        payload: RequestPayload,
        author: &UserId,
    ) -> Result<(LiveSession, AuthorSecret)> {
        self.registry.create(connection_id, payload, author).await
    }

    /// Sign and broadcast an author edit; returns the signed session view.
    pub fn publish_edit(
        &self,
        request_id: &ExecutionRequestId,
        text: &str,
        secret: &AuthorSecret,
    ) -> Result<LiveSession> {
        self.edit_channel.publish_edit(request_id, text, secret)
    }

    /// Four-eyes execute: verify, approve exactly once, run at most once.
    pub async fn execute_query(
        &self,
        request_id: &ExecutionRequestId,
        submitted_text: &str,
        submitted_signature: &str,
        approver: &UserId,
    ) -> Result<ExecutionResult> {
        self.gate
            .execute_query(request_id, submitted_text, submitted_signature, approver)
            .await
    }

    /// Subscribe to a session's live topic.
    ///
    /// Fails with `NotFound` for unknown requests, so a subscriber cannot
    /// probe for topics. The transport layer performs its identity and
    /// authorization check before calling this.
    pub async fn subscribe(
        &self,
        request_id: &ExecutionRequestId,
        subscriber: SubscriberId,
    ) -> Result<mpsc::UnboundedReceiver<ServerMessage>> {
        let id = self.registry.get_request_id(request_id).await?;
        Ok(self
            .broadcaster
            .subscribe(TopicId::for_session(&id), subscriber))
    }

    /// Remove a subscriber from a session topic.
    pub fn unsubscribe(&self, request_id: &ExecutionRequestId, subscriber: &SubscriberId) {
        self.broadcaster
            .unsubscribe(&TopicId::for_session(request_id), subscriber);
    }

    /// The underlying broadcaster, for transport adapters that manage
    /// subscriber lifecycles directly.
    pub fn broadcaster(&self) -> &Arc<TopicBroadcaster> {
        &self.broadcaster
    }
}
