//! In-memory collaborator implementations for tests.
//!
//! These back the unit and integration tests of this workspace and are also
//! handy for embedding the protocol in example setups. They implement the
//! store contracts faithfully, including the atomicity the gate relies on:
//! `approve_if_unapproved` is exclusive per request via the DashMap entry
//! guard.

use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;
use dashmap::DashMap;
use sqlgate_commons::{ConnectionId, ExecutionRequestId, GateError, Result, UserId};
use std::sync::Mutex;

use crate::secret::AuthorSecret;
use crate::stores::{
    ConnectionInfo, ExecutionRequestStore, ExecutionResult, QueryExecutor, RequestDetails,
    RequestPayload, ReviewAction, ReviewRecord, ReviewStatus, ReviewStore,
};

/// In-memory execution request store with a configurable connection set.
#[derive(Default)]
pub struct InMemoryExecutionRequestStore {
    connections: DashMap<ConnectionId, ConnectionInfo>,
    requests: DashMap<ExecutionRequestId, RequestDetails>,
}

impl InMemoryExecutionRequestStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a known datasource connection.
    pub fn add_connection(&self, id: &str, name: &str, four_eyes_required: bool) {
        let id = ConnectionId::new(id);
        self.connections.insert(
            id.clone(),
            ConnectionInfo {
                id,
                name: name.to_string(),
                four_eyes_required,
            },
        );
    }

    pub fn request_count(&self) -> usize {
        self.requests.len()
    }
}

#[async_trait]
impl ExecutionRequestStore for InMemoryExecutionRequestStore {
    async fn create(
        &self,
        connection_id: &ConnectionId,
        payload: RequestPayload,
        author: &UserId,
        secret: AuthorSecret,
    ) -> Result<RequestDetails> {
        let connection = self
            .connections
            .get(connection_id)
            .map(|c| c.clone())
            .ok_or_else(|| GateError::InvalidConnection(connection_id.to_string()))?;

        let details = RequestDetails {
            id: ExecutionRequestId::new(uuid::Uuid::new_v4().to_string()),
            connection,
            author: author.clone(),
            author_secret: secret,
            payload,
            status: ReviewStatus::AwaitingApproval,
            created_at: Utc::now(),
        };
        self.requests.insert(details.id.clone(), details.clone());
        Ok(details)
    }

    async fn get(&self, id: &ExecutionRequestId) -> Result<RequestDetails> {
        self.requests
            .get(id)
            .map(|r| r.clone())
            .ok_or_else(|| GateError::request_not_found(id))
    }

    async fn list(&self) -> Result<Vec<RequestDetails>> {
        Ok(self.requests.iter().map(|e| e.value().clone()).collect())
    }

    async fn set_status(&self, id: &ExecutionRequestId, status: ReviewStatus) -> Result<()> {
        let mut entry = self
            .requests
            .get_mut(id)
            .ok_or_else(|| GateError::request_not_found(id))?;
        entry.status = status;
        Ok(())
    }
}

/// In-memory review store with an atomic approve-if-unapproved primitive.
#[derive(Default)]
pub struct InMemoryReviewStore {
    reviews: DashMap<ExecutionRequestId, Vec<ReviewRecord>>,
}

impl InMemoryReviewStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl ReviewStore for InMemoryReviewStore {
    async fn approve_if_unapproved(
        &self,
        request_id: &ExecutionRequestId,
        comment: &str,
        approver: &UserId,
    ) -> Result<Option<ReviewRecord>> {
        // The entry guard is exclusive, making check-then-insert atomic.
        let mut entry = self.reviews.entry(request_id.clone()).or_default();
        if entry.iter().any(|r| r.action == ReviewAction::Approve) {
            return Ok(None);
        }
        let record = ReviewRecord {
            request_id: request_id.clone(),
            approver: approver.clone(),
            action: ReviewAction::Approve,
            comment: comment.to_string(),
            created_at: Utc::now(),
        };
        entry.push(record.clone());
        Ok(Some(record))
    }

    async fn reviews_for(&self, request_id: &ExecutionRequestId) -> Result<Vec<ReviewRecord>> {
        Ok(self
            .reviews
            .get(request_id)
            .map(|r| r.clone())
            .unwrap_or_default())
    }
}

/// Executor that records calls instead of running SQL.
#[derive(Default)]
pub struct RecordingExecutor {
    attempts: AtomicU64,
    executions: AtomicU64,
    fail_next: AtomicBool,
    last_statement: Mutex<Option<String>>,
}

impl RecordingExecutor {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make the next execute call fail with `ExecutionFailed`.
    pub fn fail_next(&self) {
        self.fail_next.store(true, Ordering::SeqCst);
    }

    /// Number of successful executions (the at-most-once side effect).
    pub fn execution_count(&self) -> u64 {
        self.executions.load(Ordering::SeqCst)
    }

    /// Number of execute calls including failed ones.
    pub fn attempt_count(&self) -> u64 {
        self.attempts.load(Ordering::SeqCst)
    }

    /// The statement most recently executed successfully.
    pub fn last_statement(&self) -> Option<String> {
        self.last_statement.lock().map(|g| g.clone()).unwrap_or(None)
    }
}

#[async_trait]
impl QueryExecutor for RecordingExecutor {
    async fn execute(
        &self,
        _request_id: &ExecutionRequestId,
        sql: &str,
        _executor: &UserId,
    ) -> Result<ExecutionResult> {
        self.attempts.fetch_add(1, Ordering::SeqCst);
        if self.fail_next.swap(false, Ordering::SeqCst) {
            return Err(GateError::ExecutionFailed(
                "injected executor failure".to_string(),
            ));
        }
        self.executions.fetch_add(1, Ordering::SeqCst);
        if let Ok(mut guard) = self.last_statement.lock() {
            *guard = Some(sql.to_string());
        }
        Ok(ExecutionResult {
            rows: Vec::new(),
            rows_affected: Some(0),
        })
    }
}

/// Convenience bundle wiring the three in-memory collaborators.
pub struct InMemoryCollaborators {
    pub requests: Arc<InMemoryExecutionRequestStore>,
    pub reviews: Arc<InMemoryReviewStore>,
    pub executor: Arc<RecordingExecutor>,
}

impl InMemoryCollaborators {
    /// Stores with one four-eyes connection (`conn_1`) preconfigured.
    pub fn with_default_connection() -> Self {
        let requests = Arc::new(InMemoryExecutionRequestStore::new());
        requests.add_connection("conn_1", "prod", true);
        Self {
            requests,
            reviews: Arc::new(InMemoryReviewStore::new()),
            executor: Arc::new(RecordingExecutor::new()),
        }
    }
}
