//! Session registry: creation and awaiting-review enumeration.
//!
//! A live session is created lazily, 1:1 with its execution request, and the
//! secret minted here is returned to the creating party only — listing never
//! leaks draft content or codes.

use std::sync::Arc;

use sqlgate_commons::{ConnectionId, ExecutionRequestId, Result, UserId};
use sqlgate_live::LiveSession;

use crate::secret::AuthorSecret;
use crate::stores::{ExecutionRequestStore, RequestPayload};

/// Default author secret size in bytes (hex-encoded to twice that).
pub const DEFAULT_SECRET_LENGTH_BYTES: usize = 32;

/// Creates sessions and lists those awaiting four-eyes review.
pub struct SessionRegistry {
    requests: Arc<dyn ExecutionRequestStore>,
    secret_length_bytes: usize,
}

impl SessionRegistry {
    pub fn new(requests: Arc<dyn ExecutionRequestStore>) -> Self {
        Self::with_secret_length(requests, DEFAULT_SECRET_LENGTH_BYTES)
    }

    pub fn with_secret_length(
        requests: Arc<dyn ExecutionRequestStore>,
        secret_length_bytes: usize,
    ) -> Self {
        Self {
            requests,
            secret_length_bytes,
        }
    }

    /// Create a new reviewable request and mint its author secret.
    ///
    /// Delegates durable creation to the request store (which validates the
    /// connection id and fails with `InvalidConnection` otherwise). Returns
    /// the empty session view plus the secret; the secret goes to the
    /// creating party out-of-band and is never echoed anywhere else.
    ///
    /// Two creates with identical payloads yield two independent requests.
    pub async fn create(
        &self,
        connection_id: &ConnectionId,
        payload: RequestPayload,
        author: &UserId,
    ) -> Result<(LiveSession, AuthorSecret)> {
        let secret = AuthorSecret::mint(self.secret_length_bytes);
        let details = self
            .requests
            .create(connection_id, payload, author, secret.clone())
            .await?;
        log::info!(
            "created execution request {} on connection {} (four_eyes={})",
            details.id,
            details.connection.id,
            details.connection.four_eyes_required
        );
        Ok((LiveSession::empty(details.id), secret))
    }

    /// Sessions currently awaiting four-eyes review.
    ///
    /// Filters all known requests to those whose connection carries the
    /// four-eyes flag and that are not yet approved or executed. Returned
    /// views have empty text and no code: no live content is exposed until a
    /// subscriber joins the session topic.
    pub async fn list_awaiting_review(&self) -> Result<Vec<LiveSession>> {
        let requests = self.requests.list().await?;
        Ok(requests
            .into_iter()
            .filter(|r| r.is_awaiting_review())
            .map(|r| LiveSession::empty(r.id))
            .collect())
    }

    /// Lookup helper used by the service facade.
    pub(crate) async fn get_request_id(&self, id: &ExecutionRequestId) -> Result<ExecutionRequestId> {
        Ok(self.requests.get(id).await?.id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::stores::{ExecutionRequestStore, ReviewStatus};
    use crate::test_support::InMemoryExecutionRequestStore;
    use sqlgate_commons::GateError;

    fn store() -> Arc<InMemoryExecutionRequestStore> {
        let store = InMemoryExecutionRequestStore::new();
        store.add_connection("conn_4eyes", "prod", true);
        store.add_connection("conn_free", "dev", false);
        Arc::new(store)
    }

    #[tokio::test]
    async fn test_create_returns_empty_view_and_secret() {
        let registry = SessionRegistry::new(store());
        let (session, secret) = registry
            .create(
                &ConnectionId::new("conn_4eyes"),
                RequestPayload::default(),
                &UserId::new("alice"),
            )
            .await
            .unwrap();

        assert_eq!(session.sql_text, "");
        assert!(session.integrity_code.is_none());
        assert_eq!(secret.expose().len(), DEFAULT_SECRET_LENGTH_BYTES * 2);
    }

    #[tokio::test]
    async fn test_create_unknown_connection_fails() {
        let registry = SessionRegistry::new(store());
        let result = registry
            .create(
                &ConnectionId::new("nope"),
                RequestPayload::default(),
                &UserId::new("alice"),
            )
            .await;
        assert!(matches!(result, Err(GateError::InvalidConnection(_))));
    }

    #[tokio::test]
    async fn test_duplicate_payloads_create_distinct_requests() {
        let registry = SessionRegistry::new(store());
        let payload = RequestPayload {
            title: "same".into(),
            description: "same".into(),
        };
        let (a, _) = registry
            .create(&ConnectionId::new("conn_4eyes"), payload.clone(), &UserId::new("alice"))
            .await
            .unwrap();
        let (b, _) = registry
            .create(&ConnectionId::new("conn_4eyes"), payload, &UserId::new("alice"))
            .await
            .unwrap();
        assert_ne!(a.execution_request_id, b.execution_request_id);
    }

    #[tokio::test]
    async fn test_list_awaiting_review_filters_by_policy_and_status() {
        let requests = store();
        let registry = SessionRegistry::new(requests.clone());

        let (gated, _) = registry
            .create(&ConnectionId::new("conn_4eyes"), RequestPayload::default(), &UserId::new("a"))
            .await
            .unwrap();
        let (free, _) = registry
            .create(&ConnectionId::new("conn_free"), RequestPayload::default(), &UserId::new("a"))
            .await
            .unwrap();

        let awaiting = registry.list_awaiting_review().await.unwrap();
        let ids: Vec<_> = awaiting.iter().map(|s| &s.execution_request_id).collect();
        assert!(ids.contains(&&gated.execution_request_id));
        assert!(!ids.contains(&&free.execution_request_id));

        // Executed requests drop off the list.
        requests
            .set_status(&gated.execution_request_id, ReviewStatus::Executed)
            .await
            .unwrap();
        let awaiting = registry.list_awaiting_review().await.unwrap();
        assert!(awaiting.is_empty());
    }
}
