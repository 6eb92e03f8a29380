//! FILENAME: core/style-engine/src/region.rs
//! PURPOSE: Rectangular (row, column) ranges and chunkwise enumeration.
//! CONTEXT: Every request from the viewer addresses a Region of the visible
//! table. Regions are plain values: created per request and never mutated.

use serde::{Deserialize, Serialize};

use crate::error::{EngineError, EngineResult};

/// A rectangular sub-range of (row, column) space with an offset and extent.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct Region {
    pub first_row: usize,
    pub first_col: usize,
    pub rows: usize,
    pub cols: usize,
}

impl Region {
    pub const fn new(first_row: usize, first_col: usize, rows: usize, cols: usize) -> Self {
        Region {
            first_row,
            first_col,
            rows,
            cols,
        }
    }

    /// Region starting at (0, 0).
    pub const fn with_shape(rows: usize, cols: usize) -> Self {
        Region::new(0, 0, rows, cols)
    }

    pub fn is_empty(&self) -> bool {
        self.rows == 0 || self.cols == 0
    }

    /// Non-negativity is carried by the field types; the remaining
    /// requirement is that the end coordinates are representable.
    pub fn is_valid(&self) -> bool {
        self.first_row.checked_add(self.rows).is_some()
            && self.first_col.checked_add(self.cols).is_some()
    }

    /// Exclusive end row.
    pub fn end_row(&self) -> usize {
        self.first_row + self.rows
    }

    /// Exclusive end column.
    pub fn end_col(&self) -> usize {
        self.first_col + self.cols
    }

    pub fn contains(&self, row: usize, col: usize) -> bool {
        row >= self.first_row && row < self.end_row() && col >= self.first_col && col < self.end_col()
    }

    /// Clamps `other` so that it lies within `self`.
    ///
    /// Used to make requests resilient to stale or over-large regions sent by
    /// the viewer. The result never extends past the bounds of `self`.
    pub fn get_bounded_region(&self, other: &Region) -> Region {
        let first_row = other.first_row.clamp(self.first_row, self.end_row());
        let end_row = other
            .first_row
            .saturating_add(other.rows)
            .clamp(first_row, self.end_row());

        let first_col = other.first_col.clamp(self.first_col, self.end_col());
        let end_col = other
            .first_col
            .saturating_add(other.cols)
            .clamp(first_col, self.end_col());

        Region::new(first_row, first_col, end_row - first_row, end_col - first_col)
    }

    /// Enumerates sub-regions covering `self` in row-major order.
    ///
    /// The returned iterator is lazy and can be cloned to restart the
    /// enumeration. Fails if a chunk dimension is zero.
    pub fn iterate_chunkwise(
        &self,
        rows_per_chunk: usize,
        cols_per_chunk: usize,
    ) -> EngineResult<ChunkwiseIter> {
        if rows_per_chunk == 0 || cols_per_chunk == 0 {
            return Err(EngineError::InvalidArgument(format!(
                "chunk size must be positive, got ({}, {})",
                rows_per_chunk, cols_per_chunk
            )));
        }

        Ok(ChunkwiseIter {
            region: *self,
            rows_per_chunk,
            cols_per_chunk,
            next_row: 0,
            next_col: 0,
        })
    }
}

/// Row-major iterator over the chunks of a Region.
#[derive(Debug, Clone)]
pub struct ChunkwiseIter {
    region: Region,
    rows_per_chunk: usize,
    cols_per_chunk: usize,
    /// Offsets relative to the region origin.
    next_row: usize,
    next_col: usize,
}

impl Iterator for ChunkwiseIter {
    type Item = Region;

    fn next(&mut self) -> Option<Region> {
        if self.region.is_empty() || self.next_row >= self.region.rows {
            return None;
        }

        let rows = self.rows_per_chunk.min(self.region.rows - self.next_row);
        let cols = self.cols_per_chunk.min(self.region.cols - self.next_col);
        let chunk = Region::new(
            self.region.first_row + self.next_row,
            self.region.first_col + self.next_col,
            rows,
            cols,
        );

        self.next_col += cols;
        if self.next_col >= self.region.cols {
            self.next_col = 0;
            self.next_row += rows;
        }

        Some(chunk)
    }
}
