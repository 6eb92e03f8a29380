//! FILENAME: app/viewer-bridge/src/lib.rs
// PURPOSE: Bridge between a table viewer and the style engine.
// CONTEXT: Owns the open table sessions, computes fingerprints, turns
// session-creation problems into structured failures and serializes every
// response to JSON.

pub mod logging;

pub mod api_types;
pub mod commands;
pub mod config;
pub mod error;
pub mod fingerprint;
pub mod session;
pub mod source;

use std::path::Path;

pub use api_types::{
    CreateTableFailure, CreateTableFailureKind, CreateTableOptions, CreateTableResult, RegionRequest,
};
pub use commands::{
    close_session, compute_chunk, compute_table_frame, compute_table_structure,
    create_table_session, get_style_function_info, set_sort_criteria, validate_style_functions,
};
pub use error::{BridgeError, BridgeResult};
pub use fingerprint::compute_fingerprint;
pub use session::{BridgeState, TableSession};
pub use source::{filter_expression, DataSource, FilterExpression};

pub fn create_bridge_state(config: style_engine::EngineConfig) -> BridgeState {
    log_info!(
        "SYS",
        "Creating BridgeState (chunk {}x{}, strategy {:?})",
        config.rows_per_chunk,
        config.cols_per_chunk,
        config.validation_strategy
    );
    BridgeState::new(config)
}

/// Opens the log file and loads the configuration at `config_path`.
pub fn init(config_path: impl AsRef<Path>, log_path: impl AsRef<Path>) -> Result<BridgeState, String> {
    let log_path = logging::init_log_file(log_path)?;
    log_info!("SYS", "Logging to {:?}", log_path);
    let config = config::load_config_file(config_path).map_err(|e| {
        log_error!("SYS", "Failed to load config: {}", e);
        e.to_string()
    })?;
    Ok(create_bridge_state(config))
}
