use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Hard turn budget per session: 3 user/assistant exchanges.
pub const MAX_TURNS: usize = 6;

/// Experiment arm a respondent is randomized into at session creation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Group {
    Treatment,
    Control,
}

/// Speaker of one conversation turn. Lowercase on the wire so a `Turn`
/// serializes directly into a chat-completions message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Assistant,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Turn {
    pub role: Role,
    pub content: String,
}

impl Turn {
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            content: content.into(),
        }
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: Role::Assistant,
            content: content.into(),
        }
    }
}

/// Where a session is in its lifecycle, computed from history length.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionPhase {
    Active,
    Finished,
}

/// Full state of one respondent's experiment participation.
///
/// `group`, `belief_level` and `conspiracy_theory` are fixed at creation;
/// `history` is append-only and replayed verbatim to the model as context.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Session {
    pub respondent_id: String,
    pub group: Group,
    /// Self-reported endorsement of the theory, 0 (definitely false) to
    /// 100 (definitely true). Only used for treatment prompts.
    pub belief_level: u8,
    pub conspiracy_theory: String,
    pub history: Vec<Turn>,
    pub created_at: DateTime<Utc>,
}

impl Session {
    pub fn new(
        respondent_id: impl Into<String>,
        group: Group,
        belief_level: u8,
        conspiracy_theory: impl Into<String>,
    ) -> Self {
        Self {
            respondent_id: respondent_id.into(),
            group,
            belief_level,
            conspiracy_theory: conspiracy_theory.into(),
            history: Vec::new(),
            created_at: Utc::now(),
        }
    }

    pub fn phase(&self) -> SessionPhase {
        if self.history.len() >= MAX_TURNS {
            SessionPhase::Finished
        } else {
            SessionPhase::Active
        }
    }

    pub fn is_finished(&self) -> bool {
        self.phase() == SessionPhase::Finished
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_session_is_active_with_empty_history() {
        let s = Session::new("r1", Group::Treatment, 80, "vaccines cause harm");
        assert!(s.history.is_empty());
        assert_eq!(s.phase(), SessionPhase::Active);
        assert!(!s.is_finished());
    }

    #[test]
    fn test_phase_flips_at_six_turns() {
        let mut s = Session::new("r1", Group::Control, 0, "x");
        for i in 0..3 {
            s.history.push(Turn::user(format!("u{i}")));
            s.history.push(Turn::assistant(format!("a{i}")));
        }
        assert_eq!(s.history.len(), MAX_TURNS);
        assert_eq!(s.phase(), SessionPhase::Finished);

        // Finished is sticky past the threshold
        s.history.push(Turn::user("extra"));
        assert!(s.is_finished());
    }

    #[test]
    fn test_five_turns_still_active() {
        let mut s = Session::new("r1", Group::Control, 0, "x");
        for _ in 0..5 {
            s.history.push(Turn::user("m"));
        }
        assert_eq!(s.phase(), SessionPhase::Active);
    }

    #[test]
    fn test_turn_serializes_with_lowercase_role() {
        let json = serde_json::to_value(Turn::user("hello")).unwrap();
        assert_eq!(json, serde_json::json!({"role": "user", "content": "hello"}));
        let json = serde_json::to_value(Turn::assistant("hi")).unwrap();
        assert_eq!(json["role"], "assistant");
    }
}
