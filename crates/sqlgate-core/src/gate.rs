//! The four-eyes review gate.
//!
//! This is the security-critical state transition of the protocol: an execute
//! attempt only proceeds after the submitted statement is re-verified against
//! the author's *original* secret — fetched from the request store, never
//! taken from the caller — and the exactly-once approval is recorded. A
//! forged, stale, or replayed payload can never execute.
//!
//! State space per request:
//! `DRAFT → REVIEW_REQUESTED → APPROVED → EXECUTED`, with `REJECTED` recorded
//! on verification failure. The first transition happens implicitly with any
//! published edit and is not separately tracked.

use std::sync::Arc;

use dashmap::DashMap;
use sqlgate_commons::{ExecutionRequestId, GateError, Result, UserId};
use tokio::sync::Mutex;

use crate::signing::PayloadSigner;
use crate::stores::{
    ExecutionRequestStore, ExecutionResult, QueryExecutor, ReviewStatus, ReviewStore,
};

/// Fixed annotation written on every gate-recorded approval.
pub const APPROVAL_COMMENT: &str = "auto-approved through four-eyes verification";

/// Verifies execute attempts and drives the approval/execution transition.
pub struct ReviewGate {
    requests: Arc<dyn ExecutionRequestStore>,
    reviews: Arc<dyn ReviewStore>,
    executor: Arc<dyn QueryExecutor>,
    signer: PayloadSigner,
    /// Per-request serialization of the approve/execute critical section.
    /// Entries live as long as the process; the request lifecycle (and its
    /// expiry) is owned by the collaborator store.
    locks: DashMap<ExecutionRequestId, Arc<Mutex<()>>>,
}

impl ReviewGate {
    pub fn new(
        requests: Arc<dyn ExecutionRequestStore>,
        reviews: Arc<dyn ReviewStore>,
        executor: Arc<dyn QueryExecutor>,
        signer: PayloadSigner,
    ) -> Self {
        Self {
            requests,
            reviews,
            executor,
            signer,
            locks: DashMap::new(),
        }
    }

    /// Execute `submitted_text` for a request after independent four-eyes
    /// verification.
    ///
    /// Fails closed:
    /// - `NotFound` — unknown request id
    /// - `AlreadyExecuted` — a session executes at most once
    /// - `SelfApprovalForbidden` — approver equals the request author, even
    ///   with a correct signature
    /// - `SignatureMismatch` — the pair does not verify under the author's
    ///   original secret; the request is marked rejected and neither an
    ///   approval nor an execution happens
    ///
    /// On success the approval (authored by `approver`, annotated with
    /// [`APPROVAL_COMMENT`]) is recorded exactly once, then the statement
    /// runs under `approver`'s identity. If the executor fails, the approval
    /// stands, the request stays `Approved`, and the same submission may be
    /// retried.
    pub async fn execute_query(
        &self,
        request_id: &ExecutionRequestId,
        submitted_text: &str,
        submitted_signature: &str,
        approver: &UserId,
    ) -> Result<ExecutionResult> {
        if submitted_text.trim().is_empty() {
            return Err(GateError::InvalidInput(
                "statement must not be empty".to_string(),
            ));
        }

        let lock = self
            .locks
            .entry(request_id.clone())
            .or_insert_with(|| Arc::new(Mutex::new(())))
            .clone();
        let _guard = lock.lock().await;

        let request = self.requests.get(request_id).await?;

        if request.status == ReviewStatus::Executed {
            return Err(GateError::AlreadyExecuted(request_id.clone()));
        }
        if &request.author == approver {
            return Err(GateError::SelfApprovalForbidden);
        }

        // Independent re-verification against the author's original secret.
        let verified = self.signer.verify(
            request_id,
            submitted_text,
            &request.author_secret,
            submitted_signature,
        )?;
        if !verified {
            self.requests
                .set_status(request_id, ReviewStatus::Rejected)
                .await?;
            log::warn!(
                "signature mismatch on execute attempt for {} by {}",
                request_id,
                approver
            );
            return Err(GateError::SignatureMismatch(request_id.clone()));
        }

        // Exactly-once approval; None means an approval already exists,
        // which is the retry path after an executor failure.
        if let Some(record) = self
            .reviews
            .approve_if_unapproved(request_id, APPROVAL_COMMENT, approver)
            .await?
        {
            self.requests
                .set_status(request_id, ReviewStatus::Approved)
                .await?;
            log::info!(
                "approval recorded for {} by {} at {}",
                request_id,
                record.approver,
                record.created_at
            );
        }

        let result = self
            .executor
            .execute(request_id, submitted_text, approver)
            .await?;

        self.requests
            .set_status(request_id, ReviewStatus::Executed)
            .await?;
        log::info!("executed {} under {}", request_id, approver);

        Ok(result)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::secret::AuthorSecret;
    use crate::stores::{ReviewAction, RequestPayload};
    use crate::test_support::{
        InMemoryExecutionRequestStore, InMemoryReviewStore, RecordingExecutor,
    };
    use sqlgate_commons::ConnectionId;

    struct Fixture {
        gate: ReviewGate,
        requests: Arc<InMemoryExecutionRequestStore>,
        reviews: Arc<InMemoryReviewStore>,
        executor: Arc<RecordingExecutor>,
        signer: PayloadSigner,
    }

    impl Fixture {
        fn new() -> Self {
            let requests = Arc::new(InMemoryExecutionRequestStore::new());
            requests.add_connection("conn_1", "prod", true);
            let reviews = Arc::new(InMemoryReviewStore::new());
            let executor = Arc::new(RecordingExecutor::new());
            let signer = PayloadSigner::new().unwrap();
            let gate = ReviewGate::new(
                requests.clone(),
                reviews.clone(),
                executor.clone(),
                signer,
            );
            Self {
                gate,
                requests,
                reviews,
                executor,
                signer,
            }
        }

        async fn request(&self, author: &str) -> (ExecutionRequestId, AuthorSecret) {
            let secret = AuthorSecret::mint(32);
            let details = self
                .requests
                .create(
                    &ConnectionId::new("conn_1"),
                    RequestPayload::default(),
                    &UserId::new(author),
                    secret.clone(),
                )
                .await
                .unwrap();
            (details.id, secret)
        }
    }

    #[tokio::test]
    async fn test_valid_signature_executes_and_records_approval() {
        let f = Fixture::new();
        let (id, secret) = f.request("alice").await;
        let code = f.signer.sign(&id, "SELECT 1", &secret).unwrap();

        f.gate
            .execute_query(&id, "SELECT 1", &code, &UserId::new("bob"))
            .await
            .unwrap();

        assert_eq!(f.executor.execution_count(), 1);
        assert_eq!(f.executor.last_statement().as_deref(), Some("SELECT 1"));

        let reviews = f.reviews.reviews_for(&id).await.unwrap();
        assert_eq!(reviews.len(), 1);
        assert_eq!(reviews[0].action, ReviewAction::Approve);
        assert_eq!(reviews[0].approver, UserId::new("bob"));
        assert_eq!(reviews[0].comment, APPROVAL_COMMENT);

        assert_eq!(
            f.requests.get(&id).await.unwrap().status,
            ReviewStatus::Executed
        );
    }

    #[tokio::test]
    async fn test_tampered_text_is_rejected_without_side_effects() {
        let f = Fixture::new();
        let (id, secret) = f.request("alice").await;
        let code = f.signer.sign(&id, "SELECT 1", &secret).unwrap();

        let result = f
            .gate
            .execute_query(&id, "SELECT 1; DROP TABLE x", &code, &UserId::new("bob"))
            .await;

        assert!(matches!(result, Err(GateError::SignatureMismatch(_))));
        assert_eq!(f.executor.execution_count(), 0);
        assert!(f.reviews.reviews_for(&id).await.unwrap().is_empty());
        assert_eq!(
            f.requests.get(&id).await.unwrap().status,
            ReviewStatus::Rejected
        );
    }

    #[tokio::test]
    async fn test_forged_signature_never_executes() {
        let f = Fixture::new();
        let (id, _secret) = f.request("alice").await;
        // Well-formed hex of the right length, but not the author's code.
        let forged = "ab".repeat(32);

        let result = f
            .gate
            .execute_query(&id, "SELECT 1", &forged, &UserId::new("bob"))
            .await;

        assert!(matches!(result, Err(GateError::SignatureMismatch(_))));
        assert_eq!(f.executor.execution_count(), 0);
        assert!(f.reviews.reviews_for(&id).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_self_approval_rejected_even_with_valid_signature() {
        let f = Fixture::new();
        let (id, secret) = f.request("alice").await;
        let code = f.signer.sign(&id, "SELECT 1", &secret).unwrap();

        let result = f
            .gate
            .execute_query(&id, "SELECT 1", &code, &UserId::new("alice"))
            .await;

        assert!(matches!(result, Err(GateError::SelfApprovalForbidden)));
        assert_eq!(f.executor.execution_count(), 0);
        assert!(f.reviews.reviews_for(&id).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_unknown_request_is_not_found() {
        let f = Fixture::new();
        let result = f
            .gate
            .execute_query(
                &ExecutionRequestId::new("ghost"),
                "SELECT 1",
                "00",
                &UserId::new("bob"),
            )
            .await;
        assert!(matches!(result, Err(GateError::NotFound(_))));
    }

    #[tokio::test]
    async fn test_empty_statement_is_invalid_input() {
        let f = Fixture::new();
        let (id, _) = f.request("alice").await;
        let result = f
            .gate
            .execute_query(&id, "   \n", "00", &UserId::new("bob"))
            .await;
        assert!(matches!(result, Err(GateError::InvalidInput(_))));
    }

    #[tokio::test]
    async fn test_second_execute_hits_already_executed() {
        let f = Fixture::new();
        let (id, secret) = f.request("alice").await;
        let code = f.signer.sign(&id, "SELECT 1", &secret).unwrap();

        f.gate
            .execute_query(&id, "SELECT 1", &code, &UserId::new("bob"))
            .await
            .unwrap();
        let result = f
            .gate
            .execute_query(&id, "SELECT 1", &code, &UserId::new("bob"))
            .await;

        assert!(matches!(result, Err(GateError::AlreadyExecuted(_))));
        assert_eq!(f.executor.execution_count(), 1);
    }

    #[tokio::test]
    async fn test_executor_failure_keeps_approval_and_allows_retry() {
        let f = Fixture::new();
        let (id, secret) = f.request("alice").await;
        let code = f.signer.sign(&id, "SELECT 1", &secret).unwrap();

        f.executor.fail_next();
        let result = f
            .gate
            .execute_query(&id, "SELECT 1", &code, &UserId::new("bob"))
            .await;
        assert!(matches!(result, Err(GateError::ExecutionFailed(_))));
        assert_eq!(
            f.requests.get(&id).await.unwrap().status,
            ReviewStatus::Approved
        );
        assert_eq!(f.reviews.reviews_for(&id).await.unwrap().len(), 1);

        // Retry with the same submission succeeds without a second approval.
        f.gate
            .execute_query(&id, "SELECT 1", &code, &UserId::new("bob"))
            .await
            .unwrap();
        assert_eq!(f.reviews.reviews_for(&id).await.unwrap().len(), 1);
        assert_eq!(f.executor.execution_count(), 1);
        assert_eq!(
            f.requests.get(&id).await.unwrap().status,
            ReviewStatus::Executed
        );
    }

    #[tokio::test]
    async fn test_rejected_session_accepts_corrected_resubmission() {
        let f = Fixture::new();
        let (id, secret) = f.request("alice").await;
        let code = f.signer.sign(&id, "SELECT 1", &secret).unwrap();

        // Stale submission gets rejected...
        let stale = f
            .gate
            .execute_query(&id, "SELECT 2", &code, &UserId::new("bob"))
            .await;
        assert!(matches!(stale, Err(GateError::SignatureMismatch(_))));

        // ...but re-fetching the live text and resubmitting works.
        f.gate
            .execute_query(&id, "SELECT 1", &code, &UserId::new("bob"))
            .await
            .unwrap();
        assert_eq!(f.executor.execution_count(), 1);
    }
}
