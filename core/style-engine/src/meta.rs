//! FILENAME: core/style-engine/src/meta.rs
//! PURPOSE: Per-cell classification (min/max/NaN/colormap position) without
//! running any styling function.
//! CONTEXT: Metadata is best-effort. Any failure while computing a column's
//! bounds results in "no metadata" for that column, never in an error.

use std::cell::RefCell;
use std::collections::BTreeMap;
use std::rc::Rc;

use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};

use crate::table::SourceTable;
use crate::value::CellValue;

/// Upper end of the normalized colormap position.
pub const CMAP_RESOLUTION: f64 = 100_000.0;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CellMeta {
    pub is_min: bool,
    pub is_max: bool,
    pub is_nan: bool,
    /// Position in [0, 100000], or -1 if undefined.
    pub cmap_value: i64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub background_color: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub text_color: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub text_align: Option<String>,
}

impl Default for CellMeta {
    fn default() -> Self {
        CellMeta {
            is_min: false,
            is_max: false,
            is_nan: false,
            cmap_value: -1,
            background_color: None,
            text_color: None,
            text_align: None,
        }
    }
}

impl CellMeta {
    /// Copies the colors and alignment a styling function assigned.
    pub fn apply_css(&mut self, css: &BTreeMap<String, String>) {
        self.background_color = css.get("background-color").cloned();
        self.text_color = css.get("color").cloned();
        self.text_align = css.get("text-align").cloned();
    }
}

/// Computes `CellMeta` against lazily cached per-column bounds.
pub struct MetaComputer {
    table: Rc<dyn SourceTable>,
    bounds: RefCell<FxHashMap<usize, Option<(f64, f64)>>>,
}

impl MetaComputer {
    pub fn new(table: Rc<dyn SourceTable>) -> Self {
        MetaComputer {
            table,
            bounds: RefCell::new(FxHashMap::default()),
        }
    }

    /// Metadata of `raw_value` in source column `column_index`. Absent for
    /// non-numeric columns and columns whose bounds cannot be computed.
    pub fn compute_cell_meta(&self, column_index: usize, raw_value: &CellValue) -> Option<CellMeta> {
        let (min, max) = self.column_bounds(column_index)?;

        let is_nan = match self.table.is_nan(raw_value) {
            Ok(is_nan) => is_nan,
            Err(e) => {
                log::debug!("NaN check failed in column {}: {}", column_index, e);
                false
            }
        };
        if is_nan {
            return Some(CellMeta {
                is_nan: true,
                ..CellMeta::default()
            });
        }

        let value = raw_value.as_number()?;
        let cmap_value = if min == max || !min.is_finite() || !max.is_finite() {
            -1
        } else {
            (CMAP_RESOLUTION * (value - min) / (max - min)).round() as i64
        };
        Some(CellMeta {
            is_min: value == min,
            is_max: value == max,
            cmap_value,
            ..CellMeta::default()
        })
    }

    fn column_bounds(&self, column_index: usize) -> Option<(f64, f64)> {
        if let Some(bounds) = self.bounds.borrow().get(&column_index) {
            return *bounds;
        }
        let bounds = match self.table.column_bounds(column_index) {
            Ok(bounds) => bounds,
            Err(e) => {
                log::debug!("no metadata for column {}: {}", column_index, e);
                None
            }
        };
        self.bounds.borrow_mut().insert(column_index, bounds);
        bounds
    }

    /// Number of columns with cached bounds.
    pub fn cached_columns(&self) -> usize {
        self.bounds.borrow().len()
    }
}
