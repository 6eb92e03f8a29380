//! FILENAME: core/style-engine/src/config.rs
//! PURPOSE: Engine limits and defaults.

use serde::{Deserialize, Serialize};

use crate::error::{EngineError, EngineResult};
use crate::validator::ValidationStrategyType;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct EngineConfig {
    /// Cell display strings longer than this are truncated.
    pub max_cell_value_len: usize,
    /// Describe statistics longer than this are truncated.
    pub max_describe_value_len: usize,
    /// Row labels and dtypes included in the fingerprint.
    pub fingerprint_sample_size: usize,
    /// Chunk size used when a full frame is assembled chunk by chunk.
    pub rows_per_chunk: usize,
    pub cols_per_chunk: usize,
    pub validation_strategy: ValidationStrategyType,
}

impl Default for EngineConfig {
    fn default() -> Self {
        EngineConfig {
            max_cell_value_len: 200,
            max_describe_value_len: 120,
            fingerprint_sample_size: 10,
            rows_per_chunk: 60,
            cols_per_chunk: 20,
            validation_strategy: ValidationStrategyType::Fast,
        }
    }
}

impl EngineConfig {
    pub fn validate(&self) -> EngineResult<()> {
        if self.rows_per_chunk == 0 || self.cols_per_chunk == 0 {
            return Err(EngineError::InvalidArgument(format!(
                "chunk size must be positive, got ({}, {})",
                self.rows_per_chunk, self.cols_per_chunk
            )));
        }
        if self.max_cell_value_len == 0 || self.max_describe_value_len == 0 {
            return Err(EngineError::InvalidArgument(
                "truncation lengths must be positive".to_string(),
            ));
        }
        Ok(())
    }
}

/// Caps `value` at `max_len` characters, marking truncation with '…'.
pub fn truncate(value: &str, max_len: usize) -> String {
    if value.chars().count() <= max_len {
        return value.to_string();
    }
    let mut truncated: String = value.chars().take(max_len.saturating_sub(1)).collect();
    truncated.push('…');
    truncated
}
