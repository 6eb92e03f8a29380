//! FILENAME: app/viewer-bridge/src/api_types.rs
// PURPOSE: Request and response records exchanged with the viewer.
// CONTEXT: All structs use camelCase serialization; failure kinds serialize
// as SCREAMING_SNAKE_CASE names.

use serde::{Deserialize, Serialize};
use style_engine::Region;

use crate::error::{BridgeError, BridgeResult};
use crate::source::FilterExpression;

/// Why a session could not be created.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum CreateTableFailureKind {
    UnsupportedDataSourceType,
    InvalidFingerprint,
    FilterFrameEvalFailed,
    FilterFrameOfWrongType,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateTableFailure {
    pub kind: CreateTableFailureKind,
    pub info: String,
}

/// Outcome of `create_table_session`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateTableResult {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub session_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fingerprint: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub failure: Option<CreateTableFailure>,
}

impl CreateTableResult {
    pub fn ok(session_id: String, fingerprint: String) -> Self {
        Self {
            success: true,
            session_id: Some(session_id),
            fingerprint: Some(fingerprint),
            failure: None,
        }
    }

    pub fn failure(kind: CreateTableFailureKind, info: impl Into<String>) -> Self {
        Self {
            success: false,
            session_id: None,
            fingerprint: None,
            failure: Some(CreateTableFailure {
                kind,
                info: info.into(),
            }),
        }
    }
}

/// Options for `create_table_session`.
#[derive(Default)]
pub struct CreateTableOptions {
    /// Fingerprint of a previously opened view of the same table. Must match
    /// the current fingerprint when given.
    pub fingerprint: Option<String>,
    pub filter: Option<FilterExpression>,
}

/// A region as sent by the viewer. Coordinates arrive as signed integers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RegionRequest {
    pub first_row: i64,
    pub first_col: i64,
    pub rows: i64,
    pub cols: i64,
}

impl RegionRequest {
    pub fn new(first_row: i64, first_col: i64, rows: i64, cols: i64) -> Self {
        RegionRequest {
            first_row,
            first_col,
            rows,
            cols,
        }
    }

    /// Rejects negative values and regions whose end overflows.
    pub fn to_region(&self) -> BridgeResult<Region> {
        let region = Region::new(
            non_negative("firstRow", self.first_row)?,
            non_negative("firstCol", self.first_col)?,
            non_negative("rows", self.rows)?,
            non_negative("cols", self.cols)?,
        );
        if !region.is_valid() {
            return Err(BridgeError::InvalidArgument(format!("region out of range: {:?}", self)));
        }
        Ok(region)
    }
}

pub(crate) fn non_negative(name: &str, value: i64) -> BridgeResult<usize> {
    usize::try_from(value)
        .map_err(|_| BridgeError::InvalidArgument(format!("{} must be non-negative, got {}", name, value)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_failure_serializes_kind_name() {
        let result = CreateTableResult::failure(CreateTableFailureKind::InvalidFingerprint, "stale");
        let json = serde_json::to_value(&result).unwrap();
        assert_eq!(json["success"], false);
        assert_eq!(json["failure"]["kind"], "INVALID_FINGERPRINT");
        assert_eq!(json["failure"]["info"], "stale");
        assert!(json.get("sessionId").is_none());
    }

    #[test]
    fn test_region_request_rejects_negative_values() {
        assert_eq!(
            RegionRequest::new(1, 2, 3, 4).to_region().unwrap(),
            Region::new(1, 2, 3, 4)
        );
        assert!(RegionRequest::new(-1, 0, 3, 4).to_region().is_err());
        assert!(RegionRequest::new(0, 0, 3, -4).to_region().is_err());
    }
}
