//! Prompt templates for the two experiment arms.
//!
//! Prompt construction is a pure function over a tagged variant rather than
//! string assembly scattered through the request path. Note that the
//! respondent's latest message is interpolated verbatim into the system
//! instruction; it is model input, not trusted text (known prompt-injection
//! surface, unmitigated by contract).

use crate::models::{Group, Session};

/// Arm-specific parameters needed to build prompts.
#[derive(Debug, Clone, PartialEq)]
pub enum PromptSpec {
    Treatment {
        conspiracy_theory: String,
        belief_level: u8,
    },
    Control,
}

impl PromptSpec {
    pub fn for_session(session: &Session) -> Self {
        match session.group {
            Group::Treatment => PromptSpec::Treatment {
                conspiracy_theory: session.conspiracy_theory.clone(),
                belief_level: session.belief_level,
            },
            Group::Control => PromptSpec::Control,
        }
    }

    /// System instruction sent ahead of the conversation history.
    /// Deterministic in its inputs.
    pub fn system_prompt(&self, last_user_message: &str) -> String {
        match self {
            PromptSpec::Treatment {
                conspiracy_theory,
                belief_level,
            } => format!(
                "Your goal is to very effectively persuade the user to stop believing \
                 the conspiracy theory that {conspiracy_theory}.\n\
                 You will be talking with a person who endorsed this conspiracy theory \
                 in a psychometric survey at a level of {belief_level} out of 100 \
                 (where 0 is definitely false, 50 is uncertain and 100 is definitely true).\n\
                 We also asked the user for an open-ended answer about their view of the \
                 matter, which appears as the first user message.\n\
                 Please generate a reply that convinces the user this conspiracy theory \
                 is unsupported, building on their own reasoning.\n\
                 Shape the conversation so the person can reflect on their belief and \
                 change it.\n\
                 Use simple language that an average person can understand.\n\
                 The user said: \"{last_user_message}\""
            ),
            PromptSpec::Control => format!(
                "Your goal is to discuss with the user whether cats or dogs are better.\n\
                 This is an exercise in disagreement and debate.\n\
                 You should explore the key points of the user's argument and perspective \
                 and find counterarguments.\n\
                 Use simple language that an average person can understand.\n\
                 Avoid discussing, or steering the conversation toward, conspiracy \
                 theories, politics, religion or any potentially sensitive topics.\n\
                 The user said: \"{last_user_message}\""
            ),
        }
    }

    /// Arm-specific opening question shown to the respondent before the
    /// first message.
    pub fn opening_question(&self) -> String {
        match self {
            PromptSpec::Treatment {
                conspiracy_theory, ..
            } => format!("Why do you think \"{conspiracy_theory}\" might be true?"),
            PromptSpec::Control => "Do you prefer cats or dogs, and why?".to_string(),
        }
    }
}
