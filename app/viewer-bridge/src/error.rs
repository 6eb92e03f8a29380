//! FILENAME: app/viewer-bridge/src/error.rs

use style_engine::EngineError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum BridgeError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error(transparent)]
    Engine(#[from] EngineError),

    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    #[error("Session not found: {0}")]
    SessionNotFound(String),

    #[error("Session store is busy with another request")]
    SessionBusy,
}

pub type BridgeResult<T> = Result<T, BridgeError>;
