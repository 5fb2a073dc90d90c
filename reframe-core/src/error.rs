use thiserror::Error;

use crate::chat::ChatError;

#[derive(Error, Debug)]
pub enum ReframeError {
    #[error("Missing parameter: {0}")]
    MissingParameter(&'static str),

    #[error("Conversation not found for respondent '{0}'")]
    SessionNotFound(String),

    #[error("Chat completion failed: {0}")]
    Upstream(#[from] ChatError),

    #[error("Config error: {0}")]
    Config(#[from] config::ConfigError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}
