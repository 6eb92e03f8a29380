//! FILENAME: tests/test_commands.rs
//! Session lifecycle and command responses.

mod common;

use std::rc::Rc;

use common::{labelled_subset, TestHarness};
use serde_json::Value;
use style_engine::{SourceTable, ValidationStrategyType};
use viewer_bridge::{
    close_session, compute_chunk, compute_fingerprint, compute_table_frame,
    compute_table_structure, create_table_session, filter_expression, get_style_function_info,
    set_sort_criteria, validate_style_functions, CreateTableFailureKind, CreateTableOptions,
    DataSource, RegionRequest,
};

fn parse(json: &str) -> Value {
    serde_json::from_str(json).unwrap()
}

// ============================================================================
// SESSION CREATION
// ============================================================================

#[test]
fn test_create_returns_session_and_fingerprint() {
    let harness = TestHarness::new();
    let result = create_table_session(&harness.state, harness.plain_source(), CreateTableOptions::default()).unwrap();
    assert!(result.success);
    assert!(result.session_id.is_some());
    assert_eq!(
        result.fingerprint.unwrap(),
        compute_fingerprint(harness.table.as_ref(), harness.state.config.fingerprint_sample_size)
    );
    assert_eq!(harness.state.session_count(), 1);
}

#[test]
fn test_unsupported_source_is_a_structured_failure() {
    let harness = TestHarness::new();
    let source = DataSource::Unsupported {
        type_name: "ndarray".to_string(),
    };
    let result = create_table_session(&harness.state, source, CreateTableOptions::default()).unwrap();
    assert!(!result.success);
    let failure = result.failure.unwrap();
    assert_eq!(failure.kind, CreateTableFailureKind::UnsupportedDataSourceType);
    assert_eq!(failure.info, "ndarray");
    assert_eq!(harness.state.session_count(), 0);
}

#[test]
fn test_stale_fingerprint_is_rejected() {
    let harness = TestHarness::new();
    let options = CreateTableOptions {
        fingerprint: Some("0".repeat(64)),
        filter: None,
    };
    let result = create_table_session(&harness.state, harness.plain_source(), options).unwrap();
    assert_eq!(result.failure.unwrap().kind, CreateTableFailureKind::InvalidFingerprint);

    let current = compute_fingerprint(harness.table.as_ref(), harness.state.config.fingerprint_sample_size);
    let options = CreateTableOptions {
        fingerprint: Some(current),
        filter: None,
    };
    assert!(create_table_session(&harness.state, harness.plain_source(), options).unwrap().success);
}

#[test]
fn test_filter_failures() {
    let harness = TestHarness::new();

    let failing = CreateTableOptions {
        fingerprint: None,
        filter: Some(filter_expression(|_| Err("name 'x' is not defined".to_string()))),
    };
    let result = create_table_session(&harness.state, harness.plain_source(), failing).unwrap();
    let failure = result.failure.unwrap();
    assert_eq!(failure.kind, CreateTableFailureKind::FilterFrameEvalFailed);
    assert!(failure.info.contains("not defined"));

    let wrong_type = CreateTableOptions {
        fingerprint: None,
        filter: Some(filter_expression(|_| {
            Ok(DataSource::Unsupported {
                type_name: "int".to_string(),
            })
        })),
    };
    let result = create_table_session(&harness.state, harness.plain_source(), wrong_type).unwrap();
    let failure = result.failure.unwrap();
    assert_eq!(failure.kind, CreateTableFailureKind::FilterFrameOfWrongType);
    assert_eq!(failure.info, "int");
}

#[test]
fn test_filter_expression_restricts_the_view() {
    let harness = TestHarness::new();
    let options = CreateTableOptions {
        fingerprint: None,
        filter: Some(filter_expression(|_| {
            let subset: Rc<dyn SourceTable> = Rc::new(labelled_subset(&[0, 2, 4], &[1, 3]));
            Ok(DataSource::Table(subset))
        })),
    };
    let result = create_table_session(&harness.state, harness.styled_source(), options).unwrap();
    let id = result.session_id.unwrap();

    let structure = parse(&compute_table_structure(&harness.state, &id).unwrap());
    assert_eq!(structure["rowsCount"], 3);
    assert_eq!(structure["orgRowsCount"], 5);
    assert_eq!(structure["columnsCount"], 2);
    assert_eq!(structure["orgColumnsCount"], 5);

    let chunk = parse(&compute_chunk(&harness.state, &id, 0, 0, 3, 2, true).unwrap());
    assert_eq!(chunk["indexLabels"], serde_json::json!(["r0", "r2", "r4"]));
    assert_eq!(chunk["cells"][1][0]["value"], "11");
    assert_eq!(chunk["cells"][2][1]["value"], "23");
}

// ============================================================================
// COMMANDS
// ============================================================================

#[test]
fn test_negative_region_values_are_rejected() {
    let harness = TestHarness::new();
    let id = harness.open(harness.plain_source());
    let err = compute_chunk(&harness.state, &id, -1, 0, 2, 2, false).unwrap_err();
    assert!(err.contains("non-negative"));
    assert!(set_sort_criteria(&harness.state, &id, vec![-2], vec![true]).is_err());
}

#[test]
fn test_unknown_session() {
    let harness = TestHarness::new();
    let err = compute_table_structure(&harness.state, "missing").unwrap_err();
    assert!(err.contains("missing"));
}

#[test]
fn test_sort_changes_row_order() {
    let harness = TestHarness::new();
    let id = harness.open(harness.styled_source());
    set_sort_criteria(&harness.state, &id, vec![0], vec![false]).unwrap();
    let chunk = parse(&compute_chunk(&harness.state, &id, 0, 0, 5, 1, true).unwrap());
    assert_eq!(chunk["indexLabels"], serde_json::json!(["r4", "r3", "r2", "r1", "r0"]));
    // Styling follows the source row, so the maximum is still highlighted.
    assert_eq!(chunk["cells"][0][0]["css"]["background-color"], "yellow");
}

#[test]
fn test_frame_and_chunk_agree() {
    let harness = TestHarness::new();
    let id = harness.open(harness.styled_source());
    let frame = parse(&compute_table_frame(&harness.state, &id, RegionRequest::new(0, 0, 5, 5)).unwrap());
    let chunk = parse(&compute_chunk(&harness.state, &id, 0, 0, 5, 5, true).unwrap());
    assert_eq!(frame["cells"], chunk["cells"]);
    assert_eq!(frame["indexLabels"], chunk["indexLabels"]);
    assert_eq!(frame["columns"].as_array().unwrap().len(), 5);
}

#[test]
fn test_style_function_info_and_validation() {
    let harness = TestHarness::new();
    let id = harness.open(harness.styled_source());

    let info = parse(&get_style_function_info(&harness.state, &id).unwrap());
    let info = info.as_array().unwrap();
    assert_eq!(info.len(), 2);
    assert_eq!(info[0]["index"], 0);
    assert_eq!(info[0]["isBuiltin"], true);
    assert_eq!(info[0]["isSupported"], true);

    for strategy in [None, Some(ValidationStrategyType::Precision)] {
        let problems = parse(
            &validate_style_functions(&harness.state, &id, RegionRequest::new(0, 0, 5, 5), strategy).unwrap(),
        );
        assert_eq!(problems, serde_json::json!([]));
    }
}

#[test]
fn test_close_session_unlinks() {
    let harness = TestHarness::new();
    let id = harness.open(harness.plain_source());
    close_session(&harness.state, &id).unwrap();
    assert_eq!(harness.state.session_count(), 0);
    assert!(compute_chunk(&harness.state, &id, 0, 0, 1, 1, false).is_err());
    assert!(close_session(&harness.state, &id).is_err());
}
