//! FILENAME: core/style-engine/src/error.rs

use thiserror::Error;

/// Error raised by a styling callable.
///
/// User callables report failures with `Failed`; the engine-provided wrappers
/// use the other variants when caller and callee disagree about subset bounds.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum StyleError {
    #[error("{0}")]
    Failed(String),

    #[error("chunk parent lookup failed: no {axis} with source position {position} in subset")]
    ChunkParentLookup { axis: &'static str, position: usize },

    #[error("invalid argument '{name}': {message}")]
    InvalidKwarg { name: String, message: String },
}

impl StyleError {
    pub fn failed(message: impl Into<String>) -> Self {
        StyleError::Failed(message.into())
    }
}

#[derive(Error, Debug, Clone, PartialEq)]
pub enum EngineError {
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    #[error("Style function '{name}' failed: {source}")]
    StyleFunction {
        name: String,
        #[source]
        source: StyleError,
    },

    #[error("Style function '{name}' returned {actual} styles, expected {expected}")]
    StyleOutputShape {
        name: String,
        expected: String,
        actual: String,
    },

    #[error("Style function '{0}' has an unsupported shape")]
    UnsupportedStyleFunction(String),

    #[error("Table view is unlinked from its source table")]
    Unlinked,
}

pub type EngineResult<T> = Result<T, EngineError>;
