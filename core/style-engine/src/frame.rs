//! FILENAME: core/style-engine/src/frame.rs
//! PURPOSE: Assembles the response records for one region of the visible table.
//! CONTEXT: Both generators can compute a region in one go (`generate`) or
//! stitch it from per-chunk computations (`generate_by_combining_chunks`).
//! For chunk-safe directives both paths yield identical records; the
//! validator relies on exactly that comparison.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::compute::compute_styles;
use crate::config::{truncate, EngineConfig};
use crate::describe::ColumnDescription;
use crate::error::EngineResult;
use crate::meta::{CellMeta, MetaComputer};
use crate::patcher::{AggregateCache, TodoPatcher};
use crate::region::Region;
use crate::todo::Todo;
use crate::value::{CellValue, DType};
use crate::view::VirtualTableView;

// ============================================================================
// FORMATTING
// ============================================================================

/// Turns raw cell values into display strings.
pub trait CellFormatter {
    fn format(&self, value: &CellValue, dtype: DType) -> String;
}

/// Formats values with `CellValue::display_value`.
#[derive(Debug, Clone, Copy, Default)]
pub struct DisplayFormatter;

impl CellFormatter for DisplayFormatter {
    fn format(&self, value: &CellValue, _dtype: DType) -> String {
        value.display_value()
    }
}

// ============================================================================
// RECORDS
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TableFrameCell {
    pub value: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub css: Option<BTreeMap<String, String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub meta: Option<CellMeta>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TableFrameColumn {
    pub dtype: DType,
    /// Empty when the columns header is hidden.
    pub labels: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub describe: Option<ColumnDescription>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TableFrameLegend {
    pub index: Option<String>,
    pub column: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TableFrame {
    /// `None` when the index is hidden.
    pub index_labels: Option<Vec<String>>,
    pub columns: Vec<TableFrameColumn>,
    pub legend: Option<TableFrameLegend>,
    pub cells: Vec<Vec<TableFrameCell>>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChunkData {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub index_labels: Option<Vec<String>>,
    pub cells: Vec<Vec<TableFrameCell>>,
}

// ============================================================================
// GENERATION
// ============================================================================

/// Everything a generator reads. All caches are borrowed from their owner.
#[derive(Clone, Copy)]
pub struct GeneratorContext<'a> {
    pub view: &'a VirtualTableView,
    pub patchers: &'a [TodoPatcher],
    pub aggregates: &'a AggregateCache,
    pub meta: &'a MetaComputer,
    pub formatter: &'a dyn CellFormatter,
    pub config: &'a EngineConfig,
}

/// Rows, labels and columns of one region, before they become a record.
struct Assembled {
    index_labels: Vec<String>,
    columns: Vec<TableFrameColumn>,
    cells: Vec<Vec<TableFrameCell>>,
}

impl<'a> GeneratorContext<'a> {
    /// `region ∩ view`, normalized to the zero region when empty.
    fn bound(&self, region: &Region) -> Region {
        let bounded = self.view.region().get_bounded_region(region);
        if bounded.is_empty() {
            Region::default()
        } else {
            bounded
        }
    }

    fn assemble(&self, region: &Region, with_columns: bool) -> EngineResult<Assembled> {
        let region = self.bound(region);
        Ok(Assembled {
            index_labels: self.index_labels(&region)?,
            columns: if with_columns { self.columns(&region)? } else { Vec::new() },
            cells: self.cells(&region)?,
        })
    }

    fn assemble_chunkwise(
        &self,
        rows_per_chunk: usize,
        cols_per_chunk: usize,
        region: &Region,
        with_columns: bool,
    ) -> EngineResult<Assembled> {
        let region = self.bound(region);
        let chunks = region.iterate_chunkwise(rows_per_chunk, cols_per_chunk)?;

        let mut assembled = Assembled {
            index_labels: Vec::new(),
            columns: Vec::new(),
            cells: vec![Vec::with_capacity(region.cols); region.rows],
        };
        for chunk in chunks {
            if chunk.first_col == region.first_col {
                assembled.index_labels.extend(self.index_labels(&chunk)?);
            }
            if with_columns && chunk.first_row == region.first_row {
                assembled.columns.extend(self.columns(&chunk)?);
            }
            let offset = chunk.first_row - region.first_row;
            for (i, row) in self.cells(&chunk)?.into_iter().enumerate() {
                assembled.cells[offset + i].extend(row);
            }
        }
        Ok(assembled)
    }

    fn index_labels(&self, region: &Region) -> EngineResult<Vec<String>> {
        if region.is_empty() {
            return Ok(Vec::new());
        }
        let chunk = self.view.get_chunk(region)?;
        Ok((0..chunk.rows())
            .map(|r| truncate(&chunk.row_label(r), self.config.max_cell_value_len))
            .collect())
    }

    pub(crate) fn columns(&self, region: &Region) -> EngineResult<Vec<TableFrameColumn>> {
        if region.is_empty() {
            return Ok(Vec::new());
        }
        let chunk = self.view.get_chunk(region)?;
        let table = chunk.table();
        let hidden = self.view.is_columns_hidden();
        Ok(chunk
            .source_columns()
            .iter()
            .map(|&col| {
                let describe = match table.describe(col) {
                    Ok(stats) => Some(
                        stats
                            .into_iter()
                            .map(|(name, value)| (name, truncate(&value, self.config.max_describe_value_len)))
                            .collect(),
                    ),
                    Err(e) => {
                        log::debug!("describe failed for column {}: {}", col, e);
                        None
                    }
                };
                TableFrameColumn {
                    dtype: table.dtype(col),
                    labels: if hidden {
                        Vec::new()
                    } else {
                        vec![truncate(&table.column_label(col), self.config.max_cell_value_len)]
                    },
                    describe,
                }
            })
            .collect())
    }

    pub(crate) fn legend(&self) -> EngineResult<Option<TableFrameLegend>> {
        if self.view.is_columns_hidden() {
            return Ok(None);
        }
        let table = self.view.source()?;
        let legend = TableFrameLegend {
            index: table.index_name(),
            column: table.columns_name(),
        };
        if legend.index.is_none() && legend.column.is_none() {
            return Ok(None);
        }
        Ok(Some(legend))
    }

    fn patched_todos(&self, region: &Region) -> EngineResult<Vec<Todo>> {
        let chunk = self.view.get_chunk(region)?;
        let mut todos = Vec::with_capacity(self.patchers.len());
        for patcher in self.patchers {
            if let Some(todo) = patcher.create_patched_todo(&chunk, self.aggregates)? {
                todos.push(todo);
            }
        }
        Ok(todos)
    }

    fn cells(&self, region: &Region) -> EngineResult<Vec<Vec<TableFrameCell>>> {
        if region.is_empty() {
            return Ok(Vec::new());
        }
        let chunk = self.view.get_chunk(region)?;
        let table = chunk.table();
        let styles = compute_styles(table, &self.patched_todos(region)?)?;

        let mut rows = Vec::with_capacity(chunk.rows());
        for r in 0..chunk.rows() {
            let mut row = Vec::with_capacity(chunk.cols());
            for c in 0..chunk.cols() {
                let (source_row, source_col) = chunk.to_source_coordinates(r, c);
                let value = table.value_at(source_row, source_col);
                let css = styles.css_map(source_row, source_col);
                let mut meta = self.meta.compute_cell_meta(source_col, &value);
                if let Some(css) = &css {
                    if ["background-color", "color", "text-align"]
                        .iter()
                        .any(|key| css.contains_key(*key))
                    {
                        meta.get_or_insert_with(CellMeta::default).apply_css(css);
                    }
                }
                row.push(TableFrameCell {
                    value: truncate(
                        &self.formatter.format(&value, table.dtype(source_col)),
                        self.config.max_cell_value_len,
                    ),
                    css,
                    meta,
                });
            }
            rows.push(row);
        }
        Ok(rows)
    }
}

/// Produces `TableFrame` records (cells plus column information).
pub struct TableFrameGenerator<'a> {
    ctx: GeneratorContext<'a>,
}

impl<'a> TableFrameGenerator<'a> {
    pub fn new(ctx: GeneratorContext<'a>) -> Self {
        TableFrameGenerator { ctx }
    }

    pub fn generate(&self, region: &Region) -> EngineResult<TableFrame> {
        let assembled = self.ctx.assemble(region, true)?;
        self.finish(assembled)
    }

    pub fn generate_by_combining_chunks(
        &self,
        rows_per_chunk: usize,
        cols_per_chunk: usize,
        region: &Region,
    ) -> EngineResult<TableFrame> {
        let assembled = self
            .ctx
            .assemble_chunkwise(rows_per_chunk, cols_per_chunk, region, true)?;
        self.finish(assembled)
    }

    fn finish(&self, assembled: Assembled) -> EngineResult<TableFrame> {
        Ok(TableFrame {
            index_labels: if self.ctx.view.is_index_hidden() {
                None
            } else {
                Some(assembled.index_labels)
            },
            columns: assembled.columns,
            legend: self.ctx.legend()?,
            cells: assembled.cells,
        })
    }
}

/// Produces `ChunkData` records (cells plus optional row headers).
pub struct ChunkDataGenerator<'a> {
    ctx: GeneratorContext<'a>,
}

impl<'a> ChunkDataGenerator<'a> {
    pub fn new(ctx: GeneratorContext<'a>) -> Self {
        ChunkDataGenerator { ctx }
    }

    pub fn generate(&self, region: &Region, with_row_headers: bool) -> EngineResult<ChunkData> {
        let assembled = self.ctx.assemble(region, false)?;
        Ok(self.finish(assembled, with_row_headers))
    }

    pub fn generate_by_combining_chunks(
        &self,
        rows_per_chunk: usize,
        cols_per_chunk: usize,
        region: &Region,
        with_row_headers: bool,
    ) -> EngineResult<ChunkData> {
        let assembled = self
            .ctx
            .assemble_chunkwise(rows_per_chunk, cols_per_chunk, region, false)?;
        Ok(self.finish(assembled, with_row_headers))
    }

    fn finish(&self, assembled: Assembled, with_row_headers: bool) -> ChunkData {
        ChunkData {
            index_labels: if with_row_headers && !self.ctx.view.is_index_hidden() {
                Some(assembled.index_labels)
            } else {
                None
            },
            cells: assembled.cells,
        }
    }
}
