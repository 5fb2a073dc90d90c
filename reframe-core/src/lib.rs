pub mod assign;
pub mod chat;
pub mod config;
pub mod error;
pub mod models;
pub mod prompts;
pub mod store;

pub use assign::{assign_group, assign_group_with, DEFAULT_TREATMENT_PROBABILITY};
pub use chat::{ChatBackend, ChatConfig, ChatError, OpenAiChatClient};
pub use config::ReframeConfig;
pub use error::ReframeError;
pub use models::{Group, Role, Session, SessionPhase, Turn, MAX_TURNS};
pub use prompts::PromptSpec;
pub use store::{SessionHandle, SessionStore};
