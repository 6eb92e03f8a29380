//! FILENAME: app/viewer-bridge/src/config.rs
//! PURPOSE: Loads the engine configuration supplied by the host.
//! CONTEXT: Keys are camelCase; missing keys keep their defaults.

use std::path::Path;

use style_engine::EngineConfig;

use crate::error::BridgeResult;

/// Parses and validates a JSON configuration document.
pub fn load_config_str(json: &str) -> BridgeResult<EngineConfig> {
    if json.trim().is_empty() {
        return Ok(EngineConfig::default());
    }
    let config: EngineConfig = serde_json::from_str(json)?;
    config.validate()?;
    Ok(config)
}

/// Reads the configuration from `path`. A missing file yields the defaults.
pub fn load_config_file(path: impl AsRef<Path>) -> BridgeResult<EngineConfig> {
    let path = path.as_ref();
    if !path.exists() {
        crate::log_debug!("CONFIG", "no config at {:?}, using defaults", path);
        return Ok(EngineConfig::default());
    }
    let json = std::fs::read_to_string(path)?;
    let config = load_config_str(&json)?;
    crate::log_info!("CONFIG", "loaded {:?}", path);
    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::BridgeError;
    use style_engine::ValidationStrategyType;

    #[test]
    fn test_empty_document_is_default() {
        assert_eq!(load_config_str("  ").unwrap(), EngineConfig::default());
        assert_eq!(load_config_str("{}").unwrap(), EngineConfig::default());
    }

    #[test]
    fn test_partial_document() {
        let config = load_config_str(r#"{"colsPerChunk": 4, "validationStrategy": "PRECISION"}"#).unwrap();
        assert_eq!(config.cols_per_chunk, 4);
        assert_eq!(config.rows_per_chunk, 60);
        assert_eq!(config.validation_strategy, ValidationStrategyType::Precision);
    }

    #[test]
    fn test_invalid_values_are_rejected() {
        assert!(matches!(load_config_str(r#"{"rowsPerChunk": 0}"#), Err(BridgeError::Engine(_))));
        assert!(matches!(load_config_str("{"), Err(BridgeError::Json(_))));
    }
}
