use super::quest::QuestReplyError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum AgentError {
    #[error("Command error: {0}")]
    Command(String),

    #[error("Model error: {0}")]
    Model(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Quest error: {0}")]
    QuestReply(#[from] QuestReplyError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Request error: {0}")]
    Request(#[from] reqwest::Error),
}

pub type Result<T> = std::result::Result<T, AgentError>;
