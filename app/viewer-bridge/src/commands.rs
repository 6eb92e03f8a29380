//! FILENAME: app/viewer-bridge/src/commands.rs
// PURPOSE: Commands invoked by the table viewer.
// CONTEXT: Every command takes the bridge state and a session id. Responses
// are JSON strings; errors are flattened to strings at this edge. Session
// creation reports negotiation outcomes as a structured CreateTableResult.

use serde::Serialize;
use style_engine::ValidationStrategyType;

use crate::api_types::{non_negative, CreateTableFailureKind, CreateTableOptions, CreateTableResult, RegionRequest};
use crate::error::{BridgeError, BridgeResult};
use crate::fingerprint::compute_fingerprint;
use crate::session::BridgeState;
use crate::source::{filter_criteria_from_labels, DataSource};
use crate::{log_debug, log_enter, log_error, log_exit, log_info, log_warn};

fn to_json<T: Serialize>(value: &T) -> BridgeResult<String> {
    Ok(serde_json::to_string(value)?)
}

/// Logs a failed command and flattens its error.
fn finish<T>(command: &str, result: BridgeResult<T>) -> Result<T, String> {
    result.map_err(|e| {
        log_error!("CMD", "{} failed: {}", command, e);
        e.to_string()
    })
}

// ============================================================================
// SESSION LIFECYCLE
// ============================================================================

/// Opens a table view over `source`.
pub fn create_table_session(
    state: &BridgeState,
    source: DataSource,
    options: CreateTableOptions,
) -> Result<CreateTableResult, String> {
    log_enter!("CMD", "create_table_session", "type={}", source.type_name());

    let type_name = source.type_name().to_string();
    let Some((table, registry)) = source.into_parts() else {
        log_warn!("CMD", "unsupported data source type {}", type_name);
        return Ok(CreateTableResult::failure(
            CreateTableFailureKind::UnsupportedDataSourceType,
            type_name,
        ));
    };

    let fingerprint = compute_fingerprint(table.as_ref(), state.config.fingerprint_sample_size);
    if let Some(expected) = &options.fingerprint {
        if *expected != fingerprint {
            log_info!("CMD", "stale fingerprint {}", expected);
            return Ok(CreateTableResult::failure(
                CreateTableFailureKind::InvalidFingerprint,
                expected.clone(),
            ));
        }
    }

    let filter = match &options.filter {
        None => Default::default(),
        Some(expression) => match expression(&table) {
            Err(message) => {
                return Ok(CreateTableResult::failure(
                    CreateTableFailureKind::FilterFrameEvalFailed,
                    message,
                ));
            }
            Ok(filtered) => match filtered.table() {
                Some(filtered_table) => filter_criteria_from_labels(table.as_ref(), filtered_table.as_ref()),
                None => {
                    return Ok(CreateTableResult::failure(
                        CreateTableFailureKind::FilterFrameOfWrongType,
                        filtered.type_name().to_string(),
                    ));
                }
            },
        },
    };

    let result = style_engine::TableViewContext::new(table, registry, &filter, state.config.clone())
        .map_err(BridgeError::from)
        .and_then(|context| state.insert(fingerprint.clone(), context));
    let session_id = finish("create_table_session", result)?;

    log_exit!("CMD", "create_table_session", "session={}", session_id);
    Ok(CreateTableResult::ok(session_id, fingerprint))
}

/// Closes a session and unlinks its view from the source table.
pub fn close_session(state: &BridgeState, session_id: &str) -> Result<(), String> {
    log_enter!("CMD", "close_session", "session={}", session_id);
    finish("close_session", state.remove(session_id))?;
    log_exit!("CMD", "close_session");
    Ok(())
}

// ============================================================================
// DATA
// ============================================================================

/// Cells of one region as a JSON `ChunkData`.
pub fn compute_chunk(
    state: &BridgeState,
    session_id: &str,
    first_row: i64,
    first_col: i64,
    rows: i64,
    cols: i64,
    with_row_headers: bool,
) -> Result<String, String> {
    log_enter!(
        "CMD",
        "compute_chunk",
        "session={} region=({}, {}, {}, {})",
        session_id,
        first_row,
        first_col,
        rows,
        cols
    );
    let result = RegionRequest::new(first_row, first_col, rows, cols)
        .to_region()
        .and_then(|region| {
            state.with_session(session_id, |session| {
                to_json(&session.context.compute_chunk(&region, with_row_headers)?)
            })
        });
    let json = finish("compute_chunk", result)?;
    log_exit!("CMD", "compute_chunk", "{} bytes", json.len());
    Ok(json)
}

/// A region as a JSON `TableFrame`, assembled chunk by chunk.
pub fn compute_table_frame(state: &BridgeState, session_id: &str, region: RegionRequest) -> Result<String, String> {
    log_enter!("CMD", "compute_table_frame", "session={} region={:?}", session_id, region);
    let result = region.to_region().and_then(|region| {
        state.with_session(session_id, |session| {
            to_json(&session.context.compute_table_frame(&region)?)
        })
    });
    let json = finish("compute_table_frame", result)?;
    log_exit!("CMD", "compute_table_frame", "{} bytes", json.len());
    Ok(json)
}

/// Counts, column info and legend as a JSON `TableStructure`.
pub fn compute_table_structure(state: &BridgeState, session_id: &str) -> Result<String, String> {
    log_enter!("CMD", "compute_table_structure", "session={}", session_id);
    let result = state.with_session(session_id, |session| {
        to_json(&session.context.compute_table_structure(session.fingerprint.clone())?)
    });
    let json = finish("compute_table_structure", result)?;
    log_exit!("CMD", "compute_table_structure");
    Ok(json)
}

pub fn set_sort_criteria(
    state: &BridgeState,
    session_id: &str,
    column_indices: Vec<i64>,
    ascending: Vec<bool>,
) -> Result<(), String> {
    log_enter!(
        "CMD",
        "set_sort_criteria",
        "session={} columns={:?} ascending={:?}",
        session_id,
        column_indices,
        ascending
    );
    let result = column_indices
        .iter()
        .map(|&c| non_negative("columnIndex", c))
        .collect::<BridgeResult<Vec<usize>>>()
        .and_then(|columns| {
            state.with_session(session_id, |session| {
                Ok(session.context.set_sort_criteria(&columns, &ascending)?)
            })
        });
    finish("set_sort_criteria", result)?;
    log_exit!("CMD", "set_sort_criteria");
    Ok(())
}

// ============================================================================
// STYLING
// ============================================================================

/// Validation problems as a JSON list. Without an explicit strategy the
/// configured one is used.
pub fn validate_style_functions(
    state: &BridgeState,
    session_id: &str,
    region: RegionRequest,
    strategy: Option<ValidationStrategyType>,
) -> Result<String, String> {
    let strategy = strategy.unwrap_or(state.config.validation_strategy);
    log_enter!(
        "CMD",
        "validate_style_functions",
        "session={} region={:?} strategy={:?}",
        session_id,
        region,
        strategy
    );
    let result = region.to_region().and_then(|region| {
        state.with_session(session_id, |session| {
            let problems = session.context.validate_style_functions(&region, strategy)?;
            log_debug!("CMD", "{} validation problem(s)", problems.len());
            to_json(&problems)
        })
    });
    let json = finish("validate_style_functions", result)?;
    log_exit!("CMD", "validate_style_functions");
    Ok(json)
}

/// Per-directive info as a JSON list.
pub fn get_style_function_info(state: &BridgeState, session_id: &str) -> Result<String, String> {
    log_enter!("CMD", "get_style_function_info", "session={}", session_id);
    let result = state.with_session(session_id, |session| {
        to_json(&session.context.get_style_function_info()?)
    });
    let json = finish("get_style_function_info", result)?;
    log_exit!("CMD", "get_style_function_info");
    Ok(json)
}
