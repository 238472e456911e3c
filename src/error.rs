//! Error types for the trade agent

use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("RPC error: {message}")]
    Rpc {
        message: String,
        stack_trace: Option<String>,
    },

    #[error("Trade submission failed: {0}")]
    Submission(String),

    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl Error {
    /// Build an RPC error from a message reported by the node
    pub fn rpc(message: impl Into<String>) -> Self {
        Error::Rpc {
            message: message.into(),
            stack_trace: None,
        }
    }
}

pub type Result<T> = std::result::Result<T, Error>;
