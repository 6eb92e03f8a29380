//! FILENAME: core/style-engine/src/context.rs
//! PURPOSE: One table view and every cache derived from it.
//! CONTEXT: The context is the unit the bridge keeps per session. It owns the
//! virtual view, the directive patchers, the aggregate cache, the Meta
//! Computer, the known-bad directive set and the fast validation strategy.
//! A sort change rebuilds all of them; `unlink` drops them together with the
//! source table reference.

use std::rc::Rc;

use serde::{Deserialize, Serialize};

use crate::config::EngineConfig;
use crate::error::{EngineError, EngineResult};
use crate::frame::{
    CellFormatter, ChunkData, ChunkDataGenerator, DisplayFormatter, GeneratorContext, TableFrame,
    TableFrameColumn, TableFrameGenerator, TableFrameLegend,
};
use crate::info::StyleFunctionInfo;
use crate::meta::MetaComputer;
use crate::patcher::{AggregateCache, TodoPatcher};
use crate::region::Region;
use crate::table::SourceTable;
use crate::todo::StylingDirectiveRegistry;
use crate::validator::{
    FastValidationStrategy, KnownProblems, PrecisionValidationStrategy, StyleFunctionValidator,
    ValidationProblem, ValidationStrategyType,
};
use crate::view::{FilterCriteria, VirtualTableView};

/// Shape and header information of a table view.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TableStructure {
    pub org_rows_count: usize,
    pub org_columns_count: usize,
    pub rows_count: usize,
    pub columns_count: usize,
    pub fingerprint: String,
    pub hide_row_header: bool,
    pub hide_column_header: bool,
    pub columns: Vec<TableFrameColumn>,
    pub legend: Option<TableFrameLegend>,
}

/// Caches that are only valid while the view keeps its row order.
struct ViewCaches {
    patchers: Vec<TodoPatcher>,
    aggregates: AggregateCache,
    meta: MetaComputer,
}

impl ViewCaches {
    fn build(source: &Rc<dyn SourceTable>, registry: &dyn StylingDirectiveRegistry) -> Self {
        let patchers = registry
            .list_directives()
            .into_iter()
            .enumerate()
            .map(|(index, todo)| TodoPatcher::new(index, todo, source.as_ref()))
            .collect();
        ViewCaches {
            patchers,
            aggregates: AggregateCache::new(),
            meta: MetaComputer::new(Rc::clone(source)),
        }
    }
}

pub struct TableViewContext {
    source: Option<Rc<dyn SourceTable>>,
    registry: Box<dyn StylingDirectiveRegistry>,
    view: VirtualTableView,
    caches: Option<ViewCaches>,
    known_problems: KnownProblems,
    fast_strategy: FastValidationStrategy,
    formatter: Box<dyn CellFormatter>,
    config: EngineConfig,
}

impl TableViewContext {
    pub fn new(
        source: Rc<dyn SourceTable>,
        registry: Box<dyn StylingDirectiveRegistry>,
        filter: &FilterCriteria,
        config: EngineConfig,
    ) -> EngineResult<Self> {
        config.validate()?;
        let view = VirtualTableView::new(Rc::clone(&source), filter, &registry.visibility());
        let caches = ViewCaches::build(&source, registry.as_ref());
        log::debug!(
            "table view created: {}x{} visible of {}x{}",
            view.row_count(),
            view.column_count(),
            source.row_count(),
            source.column_count()
        );
        Ok(TableViewContext {
            source: Some(source),
            registry,
            view,
            caches: Some(caches),
            known_problems: KnownProblems::default(),
            fast_strategy: FastValidationStrategy::new(),
            formatter: Box::new(DisplayFormatter),
            config,
        })
    }

    /// Replaces the cell formatter.
    pub fn with_formatter(mut self, formatter: Box<dyn CellFormatter>) -> Self {
        self.formatter = formatter;
        self
    }

    pub fn view(&self) -> &VirtualTableView {
        &self.view
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn is_linked(&self) -> bool {
        self.source.is_some()
    }

    fn source(&self) -> EngineResult<&Rc<dyn SourceTable>> {
        self.source.as_ref().ok_or(EngineError::Unlinked)
    }

    fn generator_context(&self) -> EngineResult<GeneratorContext<'_>> {
        let caches = self.caches.as_ref().ok_or(EngineError::Unlinked)?;
        Ok(GeneratorContext {
            view: &self.view,
            patchers: &caches.patchers,
            aggregates: &caches.aggregates,
            meta: &caches.meta,
            formatter: self.formatter.as_ref(),
            config: &self.config,
        })
    }

    /// Cells and optional row headers of one region.
    pub fn compute_chunk(&self, region: &Region, with_row_headers: bool) -> EngineResult<ChunkData> {
        if !region.is_valid() {
            return Err(EngineError::InvalidArgument(format!("invalid region {:?}", region)));
        }
        ChunkDataGenerator::new(self.generator_context()?).generate(region, with_row_headers)
    }

    /// A full table frame, assembled with the configured chunk size.
    pub fn compute_table_frame(&self, region: &Region) -> EngineResult<TableFrame> {
        if !region.is_valid() {
            return Err(EngineError::InvalidArgument(format!("invalid region {:?}", region)));
        }
        TableFrameGenerator::new(self.generator_context()?).generate_by_combining_chunks(
            self.config.rows_per_chunk,
            self.config.cols_per_chunk,
            region,
        )
    }

    pub fn compute_table_structure(&self, fingerprint: impl Into<String>) -> EngineResult<TableStructure> {
        let source = self.source()?;
        let ctx = self.generator_context()?;
        Ok(TableStructure {
            org_rows_count: source.row_count(),
            org_columns_count: source.column_count(),
            rows_count: self.view.row_count(),
            columns_count: self.view.column_count(),
            fingerprint: fingerprint.into(),
            hide_row_header: self.view.is_index_hidden(),
            hide_column_header: self.view.is_columns_hidden(),
            columns: ctx.columns(&self.view.region())?,
            legend: ctx.legend()?,
        })
    }

    /// Sorts the view and rebuilds every cache derived from it.
    pub fn set_sort_criteria(&mut self, column_indices: &[usize], ascending: &[bool]) -> EngineResult<()> {
        let source = Rc::clone(self.source()?);
        self.view.set_sort_criteria(column_indices, ascending)?;
        self.caches = Some(ViewCaches::build(&source, self.registry.as_ref()));
        self.known_problems.clear();
        self.fast_strategy = FastValidationStrategy::new();
        Ok(())
    }

    pub fn validate_style_functions(
        &mut self,
        region: &Region,
        strategy: ValidationStrategyType,
    ) -> EngineResult<Vec<ValidationProblem>> {
        if !region.is_valid() {
            return Err(EngineError::InvalidArgument(format!("invalid region {:?}", region)));
        }
        let source = Rc::clone(self.source()?);
        let validator = StyleFunctionValidator::new(
            source,
            self.registry.as_ref(),
            &self.view,
            self.formatter.as_ref(),
            &self.config,
        );
        match strategy {
            ValidationStrategyType::Fast => {
                validator.validate(region, &mut self.fast_strategy, &mut self.known_problems)
            }
            ValidationStrategyType::Precision => validator.validate(
                region,
                &mut PrecisionValidationStrategy,
                &mut self.known_problems,
            ),
        }
    }

    pub fn get_style_function_info(&self) -> EngineResult<Vec<StyleFunctionInfo>> {
        let caches = self.caches.as_ref().ok_or(EngineError::Unlinked)?;
        Ok(caches.patchers.iter().map(StyleFunctionInfo::from_patcher).collect())
    }

    /// Drops the source table and every cache.
    pub fn unlink(&mut self) {
        self.view.unlink();
        self.caches = None;
        self.source = None;
        self.known_problems.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::builtins;
    use crate::style_func::Axis;
    use crate::table::DataTable;
    use crate::todo::{StyleRegistry, Todo};

    fn context(filter: &FilterCriteria) -> TableViewContext {
        let table = DataTable::from_numbers(&[vec![3.0, 1.0], vec![1.0, 2.0], vec![2.0, 3.0]]).unwrap();
        let registry = StyleRegistry::new().with(Todo::apply(builtins::highlight_max(), Some(Axis::Index)));
        TableViewContext::new(Rc::new(table), Box::new(registry), filter, EngineConfig::default()).unwrap()
    }

    #[test]
    fn test_structure_counts() {
        let ctx = context(&FilterCriteria::rows(vec![0, 2]));
        let structure = ctx.compute_table_structure("fp").unwrap();
        assert_eq!(structure.org_rows_count, 3);
        assert_eq!(structure.rows_count, 2);
        assert_eq!(structure.columns_count, 2);
        assert_eq!(structure.columns.len(), 2);
        assert_eq!(structure.fingerprint, "fp");
    }

    #[test]
    fn test_sort_changes_chunk_order() {
        let mut ctx = context(&FilterCriteria::default());
        ctx.set_sort_criteria(&[0], &[true]).unwrap();
        let chunk = ctx.compute_chunk(&Region::with_shape(3, 1), true).unwrap();
        assert_eq!(
            chunk.index_labels,
            Some(vec!["1".to_string(), "2".to_string(), "0".to_string()])
        );
        // Row "0" holds the column maximum and keeps its highlight after sorting.
        assert!(chunk.cells[2][0].css.is_some());
        assert!(chunk.cells[0][0].css.is_none());
    }

    #[test]
    fn test_table_frame_uses_configured_chunks() {
        let ctx = context(&FilterCriteria::default());
        let frame = ctx.compute_table_frame(&Region::with_shape(10, 10)).unwrap();
        assert_eq!(frame.cells.len(), 3);
        assert_eq!(frame.columns.len(), 2);
    }

    #[test]
    fn test_unlink() {
        let mut ctx = context(&FilterCriteria::default());
        ctx.unlink();
        assert!(!ctx.is_linked());
        assert!(matches!(
            ctx.compute_chunk(&Region::with_shape(1, 1), false),
            Err(EngineError::Unlinked)
        ));
        assert!(ctx.get_style_function_info().is_err());
        assert!(ctx.set_sort_criteria(&[], &[]).is_err());
    }
}
