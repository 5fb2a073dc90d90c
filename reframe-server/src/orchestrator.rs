//! Conversation orchestrator — the turn-taking protocol.
//!
//! Owns the session store and the chat backend. All request-path logic
//! lives here so the HTTP handlers stay thin and the whole protocol can be
//! tested against a scripted backend.

use std::sync::Arc;

use reframe_core::assign::assign_group_with;
use reframe_core::chat::ChatBackend;
use reframe_core::config::ExperimentConfig;
use reframe_core::error::ReframeError;
use reframe_core::models::{Session, Turn};
use reframe_core::prompts::PromptSpec;
use reframe_core::store::SessionStore;

/// Result of one successful send-message call.
#[derive(Debug, Clone)]
pub struct SendOutcome {
    pub message: String,
    pub finished: bool,
}

pub struct Orchestrator {
    store: SessionStore,
    backend: Arc<dyn ChatBackend>,
    experiment: ExperimentConfig,
}

impl Orchestrator {
    pub fn new(
        store: SessionStore,
        backend: Arc<dyn ChatBackend>,
        experiment: ExperimentConfig,
    ) -> Self {
        Self {
            store,
            backend,
            experiment,
        }
    }

    pub fn store(&self) -> &SessionStore {
        &self.store
    }

    /// Create (or silently reset) a session for a respondent. The arm is
    /// drawn exactly once here and is fixed for the session's lifetime.
    ///
    /// `belief_level` arrives as survey-platform query text; a value that is
    /// not an integer in 0..=100 is rejected the same way as an absent one.
    pub async fn start(
        &self,
        respondent_id: &str,
        belief_level: &str,
        conspiracy_theory: &str,
    ) -> Result<Session, ReframeError> {
        if respondent_id.is_empty() {
            return Err(ReframeError::MissingParameter("respondent"));
        }
        if conspiracy_theory.is_empty() {
            return Err(ReframeError::MissingParameter("conspiracyTheory"));
        }
        let belief_level: u8 = belief_level
            .trim()
            .parse()
            .ok()
            .filter(|v| *v <= 100)
            .ok_or(ReframeError::MissingParameter("beliefLevel"))?;

        let group = assign_group_with(
            self.experiment.treatment_probability,
            &mut rand::thread_rng(),
        );

        let session = Session::new(respondent_id, group, belief_level, conspiracy_theory);
        let snapshot = session.clone();
        self.store.create(session).await;

        tracing::info!(respondent = respondent_id, group = ?group, "session started");

        Ok(snapshot)
    }

    /// One exchange: append the user turn, call the collaborator with the
    /// system prompt plus the full history, append the reply.
    ///
    /// Holds the per-respondent lock across the upstream call so at most one
    /// send is in flight per session. On upstream failure the user turn is
    /// left in place and the error is surfaced; no retry here.
    pub async fn send_message(
        &self,
        respondent_id: &str,
        message: &str,
    ) -> Result<SendOutcome, ReframeError> {
        if respondent_id.is_empty() {
            return Err(ReframeError::MissingParameter("respondent"));
        }
        if message.is_empty() {
            return Err(ReframeError::MissingParameter("message"));
        }

        let handle = self
            .store
            .entry(respondent_id)
            .await
            .ok_or_else(|| ReframeError::SessionNotFound(respondent_id.to_string()))?;

        let mut session = handle.lock().await;
        session.history.push(Turn::user(message));

        // Prompt uses the current message, not the full history; the history
        // itself is replayed as conversation context.
        let prompt = PromptSpec::for_session(&session).system_prompt(message);

        let reply = self.backend.complete(&prompt, &session.history).await?;

        session.history.push(Turn::assistant(reply.clone()));
        let finished = session.is_finished();

        tracing::debug!(
            respondent = respondent_id,
            turns = session.history.len(),
            finished,
            "exchange completed"
        );

        Ok(SendOutcome {
            message: reply,
            finished,
        })
    }

    /// Arm-specific opening question shown before the first message.
    pub async fn instructions(&self, respondent_id: &str) -> Result<String, ReframeError> {
        let session = self
            .store
            .get(respondent_id)
            .await
            .ok_or_else(|| ReframeError::SessionNotFound(respondent_id.to_string()))?;

        Ok(PromptSpec::for_session(&session).opening_question())
    }
}
