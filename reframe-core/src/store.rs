//! In-memory session store — single source of truth for conversations.
//!
//! One entry per respondent for the lifetime of the process; no eviction.
//! The outer map is behind an `RwLock`, each session behind its own `Mutex`
//! so the orchestrator can hold a per-respondent exclusive section across
//! the upstream call without serializing unrelated respondents.

use std::collections::HashMap;
use std::sync::Arc;

use tokio::sync::{Mutex, RwLock};

use crate::error::ReframeError;
use crate::models::{Session, Turn};

pub type SessionHandle = Arc<Mutex<Session>>;

#[derive(Clone, Default)]
pub struct SessionStore {
    inner: Arc<RwLock<HashMap<String, SessionHandle>>>,
}

impl SessionStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or replace the entry for the session's respondent id.
    /// Replacing is the documented restart behavior, not an error; the prior
    /// session (and its history) is dropped.
    pub async fn create(&self, session: Session) -> SessionHandle {
        let id = session.respondent_id.clone();
        let handle = Arc::new(Mutex::new(session));
        self.inner.write().await.insert(id, handle.clone());
        handle
    }

    /// Snapshot of a session's current state.
    pub async fn get(&self, respondent_id: &str) -> Option<Session> {
        let handle = self.entry(respondent_id).await?;
        let session = handle.lock().await;
        Some(session.clone())
    }

    /// Handle to the live session, for callers that need the per-respondent
    /// lock across a longer section.
    pub async fn entry(&self, respondent_id: &str) -> Option<SessionHandle> {
        self.inner.read().await.get(respondent_id).cloned()
    }

    /// Append one turn; returns the new history length.
    pub async fn append_turn(
        &self,
        respondent_id: &str,
        turn: Turn,
    ) -> Result<usize, ReframeError> {
        let handle = self
            .entry(respondent_id)
            .await
            .ok_or_else(|| ReframeError::SessionNotFound(respondent_id.to_string()))?;
        let mut session = handle.lock().await;
        session.history.push(turn);
        Ok(session.history.len())
    }

    pub async fn len(&self) -> usize {
        self.inner.read().await.len()
    }
}
