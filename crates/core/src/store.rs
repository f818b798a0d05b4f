//! In-memory request store with lazy TTL expiry.
//!
//! The store is the canonical copy of every submitted-but-undecided request;
//! button values carry only the opaque id. No persistence: a restart drops
//! pending requests and later interactions resolve as expired, which the
//! form-resubmission cost makes acceptable.

use std::collections::HashMap;
use std::sync::Mutex;

use chrono::{DateTime, Duration, Utc};
use thiserror::Error;

use crate::domain::request::{
    CateringRequest, ConversationRef, DecisionRecord, RequestId, RequestStatus,
};

#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum ResolveError {
    #[error("request `{0}` was not found or has expired")]
    NotFound(RequestId),
    #[error("request `{id}` was already resolved as {status:?}")]
    AlreadyDecided { id: RequestId, status: RequestStatus },
}

#[derive(Debug)]
pub struct RequestStore {
    ttl: Duration,
    inner: Mutex<HashMap<String, CateringRequest>>,
}

impl RequestStore {
    pub fn new(ttl: Duration) -> Self {
        Self { ttl, inner: Mutex::new(HashMap::new()) }
    }

    pub fn insert(&self, request: CateringRequest) {
        self.lock().insert(request.id.0.clone(), request);
    }

    /// Fetches a snapshot. An entry past its TTL is removed and reported
    /// missing, even if no sweep ever ran.
    pub fn get(&self, id: &RequestId) -> Option<CateringRequest> {
        let now = Utc::now();
        let mut entries = self.lock();
        match entries.get(&id.0) {
            Some(request) if self.is_expired(request.created_at, now) => {
                entries.remove(&id.0);
                None
            }
            Some(request) => Some(request.clone()),
            None => None,
        }
    }

    pub fn set_conversation(&self, id: &RequestId, conversation: ConversationRef) {
        if let Some(request) = self.lock().get_mut(&id.0) {
            request.conversation = Some(conversation);
        }
    }

    /// Atomic check-and-transition: only a PENDING, unexpired entry accepts a
    /// decision, and it accepts exactly one. This is what makes the
    /// at-most-one-notification invariant hold under duplicate deliveries
    /// racing each other.
    pub fn resolve(
        &self,
        id: &RequestId,
        decision: DecisionRecord,
    ) -> Result<CateringRequest, ResolveError> {
        let now = Utc::now();
        let mut entries = self.lock();

        let Some(request) = entries.get_mut(&id.0) else {
            return Err(ResolveError::NotFound(id.clone()));
        };
        if self.is_expired(request.created_at, now) {
            entries.remove(&id.0);
            return Err(ResolveError::NotFound(id.clone()));
        }
        if request.status.is_terminal() {
            return Err(ResolveError::AlreadyDecided { id: id.clone(), status: request.status });
        }

        request.status = decision.kind.status();
        request.decision = Some(decision);
        Ok(request.clone())
    }

    pub fn remove(&self, id: &RequestId) {
        self.lock().remove(&id.0);
    }

    /// Drops every expired entry; returns how many were removed. Runs
    /// periodically from the server, racing `get`/`resolve` safely.
    pub fn purge_expired(&self) -> usize {
        let now = Utc::now();
        let mut entries = self.lock();
        let before = entries.len();
        entries.retain(|_, request| !self.is_expired(request.created_at, now));
        before - entries.len()
    }

    pub fn pending_count(&self) -> usize {
        self.lock().values().filter(|request| !request.status.is_terminal()).count()
    }

    fn is_expired(&self, created_at: DateTime<Utc>, now: DateTime<Utc>) -> bool {
        now - created_at > self.ttl
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, HashMap<String, CateringRequest>> {
        // A poisoned lock means a panic mid-update; the map only ever holds
        // fully-written clones, so continuing with the inner value is sound.
        self.inner.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}
