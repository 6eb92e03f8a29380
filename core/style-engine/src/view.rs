//! FILENAME: core/style-engine/src/view.rs
//! PURPOSE: Virtual, non-mutating view of a source table under sort, filter and hide.
//! CONTEXT: The view only derives index sequences. "Visible" coordinates are
//! translated to source coordinates through `row_index` / `col_index`; the
//! source table's bulk data is never copied or reordered.

use std::rc::Rc;

use serde::{Deserialize, Serialize};
use smallvec::SmallVec;

use crate::error::{EngineError, EngineResult};
use crate::region::Region;
use crate::table::SourceTable;
use crate::value::CellValue;

/// Row and column allow-lists in source positions. `None` allows everything.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FilterCriteria {
    pub rows: Option<Vec<usize>>,
    pub columns: Option<Vec<usize>>,
}

impl FilterCriteria {
    pub fn rows(rows: Vec<usize>) -> Self {
        FilterCriteria {
            rows: Some(rows),
            columns: None,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_none() && self.columns.is_none()
    }
}

/// Hidden rows/columns and header visibility as declared by the styler.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Visibility {
    pub hidden_rows: Vec<usize>,
    pub hidden_columns: Vec<usize>,
    pub index_hidden: bool,
    pub columns_hidden: bool,
}

/// One sort key: visible column and direction.
pub type SortKey = (usize, bool);

/// A stable visible coordinate space over a source table.
pub struct VirtualTableView {
    source: Option<Rc<dyn SourceTable>>,
    /// Visible source rows in source order, before sorting.
    filtered_rows: Vec<usize>,
    row_index: Vec<usize>,
    col_index: Vec<usize>,
    sort_keys: SmallVec<[SortKey; 4]>,
    region: Region,
    index_hidden: bool,
    columns_hidden: bool,
}

impl VirtualTableView {
    pub fn new(source: Rc<dyn SourceTable>, filter: &FilterCriteria, visibility: &Visibility) -> Self {
        let mut filtered_rows = visible_positions(
            source.row_count(),
            filter.rows.as_deref(),
            &visibility.hidden_rows,
        );
        let mut col_index = visible_positions(
            source.column_count(),
            filter.columns.as_deref(),
            &visibility.hidden_columns,
        );

        // A table with rows but no columns (or vice versa) has no renderable
        // cells and is reported as fully empty.
        if filtered_rows.is_empty() || col_index.is_empty() {
            filtered_rows.clear();
            col_index.clear();
        }

        let region = Region::with_shape(filtered_rows.len(), col_index.len());
        VirtualTableView {
            source: Some(source),
            row_index: filtered_rows.clone(),
            filtered_rows,
            col_index,
            sort_keys: SmallVec::new(),
            region,
            index_hidden: visibility.index_hidden,
            columns_hidden: visibility.columns_hidden,
        }
    }

    /// A view without filter and hidden rows/columns.
    pub fn unfiltered(source: Rc<dyn SourceTable>) -> Self {
        VirtualTableView::new(source, &FilterCriteria::default(), &Visibility::default())
    }

    /// (0, 0, visible rows, visible columns).
    pub fn region(&self) -> Region {
        self.region
    }

    pub fn row_count(&self) -> usize {
        self.region.rows
    }

    pub fn column_count(&self) -> usize {
        self.region.cols
    }

    pub fn is_index_hidden(&self) -> bool {
        self.index_hidden
    }

    pub fn is_columns_hidden(&self) -> bool {
        self.columns_hidden
    }

    pub fn source(&self) -> EngineResult<&Rc<dyn SourceTable>> {
        self.source.as_ref().ok_or(EngineError::Unlinked)
    }

    pub fn is_linked(&self) -> bool {
        self.source.is_some()
    }

    pub fn sort_keys(&self) -> &[SortKey] {
        &self.sort_keys
    }

    /// Recomputes the visible row order.
    ///
    /// `column_indices` are visible column indices in priority order. The
    /// sort always starts from the filtered row sequence, so applying the
    /// same criteria again reproduces the same order. Empty criteria restore
    /// the unsorted order.
    pub fn set_sort_criteria(&mut self, column_indices: &[usize], ascending: &[bool]) -> EngineResult<()> {
        if column_indices.len() != ascending.len() {
            return Err(EngineError::InvalidArgument(format!(
                "{} sort columns but {} sort directions",
                column_indices.len(),
                ascending.len()
            )));
        }
        if let Some(bad) = column_indices.iter().find(|&&c| c >= self.col_index.len()) {
            return Err(EngineError::InvalidArgument(format!(
                "sort column {} out of range (visible columns: {})",
                bad,
                self.col_index.len()
            )));
        }

        let keys: SmallVec<[SortKey; 4]> = column_indices
            .iter()
            .zip(ascending)
            .map(|(&col, &asc)| (col, asc))
            .collect();

        let mut rows = self.filtered_rows.clone();
        if !keys.is_empty() {
            let source = self.source()?;
            let source_cols: SmallVec<[(usize, bool); 4]> =
                keys.iter().map(|&(col, asc)| (self.col_index[col], asc)).collect();

            // Pre-fetch the key values so the comparator does not hit the
            // source table O(n log n) times.
            let key_values: Vec<SmallVec<[CellValue; 4]>> = self
                .filtered_rows
                .iter()
                .map(|&row| source_cols.iter().map(|&(col, _)| source.value_at(row, col)).collect())
                .collect();
            let mut order: Vec<usize> = (0..rows.len()).collect();
            order.sort_by(|&a, &b| {
                for (k, &(_, asc)) in source_cols.iter().enumerate() {
                    let ordering = key_values[a][k].sort_cmp(&key_values[b][k], asc);
                    if ordering.is_ne() {
                        return ordering;
                    }
                }
                std::cmp::Ordering::Equal
            });
            rows = order.into_iter().map(|i| self.filtered_rows[i]).collect();
        }

        log::debug!("sort criteria set to {:?}", keys);
        self.row_index = rows;
        self.sort_keys = keys;
        Ok(())
    }

    /// Returns a chunk bounded to `region ∩ self.region()`.
    pub fn get_chunk(&self, region: &Region) -> EngineResult<Chunk<'_>> {
        let table = self.source()?;
        Ok(Chunk {
            view: self,
            table: table.as_ref(),
            region: self.region.get_bounded_region(region),
        })
    }

    /// Translates a visible coordinate into a source coordinate.
    pub fn to_source_coordinates(&self, visible_row: usize, visible_col: usize) -> Option<(usize, usize)> {
        Some((*self.row_index.get(visible_row)?, *self.col_index.get(visible_col)?))
    }

    /// Source rows of a visible row range.
    pub fn source_rows(&self, first: usize, count: usize) -> &[usize] {
        let end = (first + count).min(self.row_index.len());
        &self.row_index[first.min(end)..end]
    }

    /// Source columns of a visible column range.
    pub fn source_columns(&self, first: usize, count: usize) -> &[usize] {
        let end = (first + count).min(self.col_index.len());
        &self.col_index[first.min(end)..end]
    }

    /// Drops the source reference. Subsequent chunk requests fail.
    pub fn unlink(&mut self) {
        self.source = None;
        self.filtered_rows.clear();
        self.row_index.clear();
        self.col_index.clear();
        self.region = Region::default();
    }
}

fn visible_positions(count: usize, allowed: Option<&[usize]>, hidden: &[usize]) -> Vec<usize> {
    let mut mask = vec![allowed.is_none(); count];
    if let Some(allowed) = allowed {
        for &pos in allowed.iter().filter(|&&p| p < count) {
            mask[pos] = true;
        }
    }
    for &pos in hidden.iter().filter(|&&p| p < count) {
        mask[pos] = false;
    }
    (0..count).filter(|&pos| mask[pos]).collect()
}

/// A read-only projection of a view onto one Region.
///
/// Cell and label lookups take chunk-local coordinates.
pub struct Chunk<'a> {
    view: &'a VirtualTableView,
    table: &'a dyn SourceTable,
    region: Region,
}

impl<'a> Chunk<'a> {
    pub fn region(&self) -> Region {
        self.region
    }

    pub fn rows(&self) -> usize {
        self.region.rows
    }

    pub fn cols(&self) -> usize {
        self.region.cols
    }

    pub fn table(&self) -> &'a dyn SourceTable {
        self.table
    }

    pub fn to_source_coordinates(&self, row: usize, col: usize) -> (usize, usize) {
        (
            self.view.row_index[self.region.first_row + row],
            self.view.col_index[self.region.first_col + col],
        )
    }

    pub fn cell_value(&self, row: usize, col: usize) -> CellValue {
        let (source_row, source_col) = self.to_source_coordinates(row, col);
        self.table.value_at(source_row, source_col)
    }

    pub fn row_label(&self, row: usize) -> String {
        self.table.row_label(self.view.row_index[self.region.first_row + row])
    }

    pub fn column_label(&self, col: usize) -> String {
        self.table.column_label(self.view.col_index[self.region.first_col + col])
    }

    /// Source rows covered by this chunk, in visible order.
    pub fn source_rows(&self) -> &'a [usize] {
        self.view.source_rows(self.region.first_row, self.region.rows)
    }

    /// Source columns covered by this chunk, in visible order.
    pub fn source_columns(&self) -> &'a [usize] {
        self.view.source_columns(self.region.first_col, self.region.cols)
    }
}
