//! Collaborator contracts consumed by the protocol core.
//!
//! This core owns no persisted state. Execution requests, review records, and
//! the actual SQL engine live behind these traits; implementations are
//! injected explicitly (no process-wide singletons). In-memory versions for
//! tests are in [`crate::test_support`].

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlgate_commons::protocol::RowData;
use sqlgate_commons::{ConnectionId, ExecutionRequestId, Result, UserId};

use crate::secret::AuthorSecret;

/// Review lifecycle of an execution request.
///
/// `AwaitingApproval → Approved → Executed`, with `Rejected` recorded when a
/// submitted signature failed verification. `Rejected` is not terminal for
/// the session: a corrected resubmission (re-fetched live text with its real
/// code) may still pass the gate. Only `Approved`/`Executed` take a session
/// off the awaiting-review list.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReviewStatus {
    /// Created, four-eyes review still outstanding.
    AwaitingApproval,
    /// Approval recorded but execution has not (yet) succeeded. Retryable.
    Approved,
    /// A verification attempt failed; awaiting a corrected resubmission.
    Rejected,
    /// Executed exactly once. Terminal.
    Executed,
}

/// The datasource connection a request targets, as exposed by the
/// execution-request collaborator.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConnectionInfo {
    pub id: ConnectionId,
    pub name: String,
    /// External four-eyes policy input: whether this connection requires an
    /// independent second approval before execution.
    pub four_eyes_required: bool,
}

/// Caller-supplied request metadata at creation time.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RequestPayload {
    pub title: String,
    pub description: String,
}

/// One reviewable execution request, as held by the collaborator store.
///
/// `author_secret` is readable only by this core for signature verification;
/// it is destroyed with the request and never crosses the broadcast channel.
#[derive(Debug, Clone)]
pub struct RequestDetails {
    pub id: ExecutionRequestId,
    pub connection: ConnectionInfo,
    pub author: UserId,
    pub author_secret: AuthorSecret,
    pub payload: RequestPayload,
    pub status: ReviewStatus,
    pub created_at: DateTime<Utc>,
}

impl RequestDetails {
    /// Whether this request is currently awaiting four-eyes review: the
    /// owning connection requires it and nothing has been approved or
    /// executed yet.
    pub fn is_awaiting_review(&self) -> bool {
        self.connection.four_eyes_required
            && matches!(
                self.status,
                ReviewStatus::AwaitingApproval | ReviewStatus::Rejected
            )
    }
}

/// Review action recorded against a request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReviewAction {
    Approve,
    Reject,
}

/// A recorded review.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReviewRecord {
    pub request_id: ExecutionRequestId,
    pub approver: UserId,
    pub action: ReviewAction,
    pub comment: String,
    pub created_at: DateTime<Utc>,
}

/// Result of executing a statement through the collaborator engine.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ExecutionResult {
    /// Result rows for queries.
    pub rows: Vec<RowData>,
    /// Affected row count for DML.
    pub rows_affected: Option<u64>,
}

/// Durable store of execution requests.
///
/// `create` fails with `InvalidConnection` when the connection id does not
/// resolve. Creating twice with an identical payload yields two distinct,
/// independently reviewable requests — no deduplication.
#[async_trait]
pub trait ExecutionRequestStore: Send + Sync {
    /// Create a new request for `connection_id`, storing the minted secret
    /// alongside it.
    async fn create(
        &self,
        connection_id: &ConnectionId,
        payload: RequestPayload,
        author: &UserId,
        secret: AuthorSecret,
    ) -> Result<RequestDetails>;

    /// Fetch a request; `NotFound` if absent.
    async fn get(&self, id: &ExecutionRequestId) -> Result<RequestDetails>;

    /// All known requests.
    async fn list(&self) -> Result<Vec<RequestDetails>>;

    /// Record a status transition for a request.
    async fn set_status(&self, id: &ExecutionRequestId, status: ReviewStatus) -> Result<()>;
}

/// Store of review records.
#[async_trait]
pub trait ReviewStore: Send + Sync {
    /// Record an approval unless one already exists for this request.
    ///
    /// This is the exactly-once primitive the gate relies on: under
    /// concurrent calls for the same request, at most one returns
    /// `Some(record)`; the rest observe the existing approval and get `None`.
    async fn approve_if_unapproved(
        &self,
        request_id: &ExecutionRequestId,
        comment: &str,
        approver: &UserId,
    ) -> Result<Option<ReviewRecord>>;

    /// All reviews recorded for a request.
    async fn reviews_for(&self, request_id: &ExecutionRequestId) -> Result<Vec<ReviewRecord>>;
}

/// The SQL execution engine.
#[async_trait]
pub trait QueryExecutor: Send + Sync {
    /// Execute `sql` for the given request under `executor`'s identity.
    async fn execute(
        &self,
        request_id: &ExecutionRequestId,
        sql: &str,
        executor: &UserId,
    ) -> Result<ExecutionResult>;
}
