//! FILENAME: core/style-engine/src/validator.rs
//! PURPOSE: Empirically checks whether styling directives are chunk-safe.
//! CONTEXT: A directive is chunk-safe if the region computed in one go equals
//! the region stitched from chunks. Every comparison runs on freshly built
//! patchers, aggregate cache and Meta Computer, so the rendering caches of
//! the table view are never touched. Directives found unsafe are remembered
//! by the caller (the known-bad set) and never re-run.

use std::rc::Rc;

use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};

use crate::config::EngineConfig;
use crate::error::{EngineError, EngineResult};
use crate::frame::{CellFormatter, GeneratorContext, TableFrameGenerator};
use crate::meta::MetaComputer;
use crate::patcher::{AggregateCache, TodoPatcher};
use crate::region::Region;
use crate::table::SourceTable;
use crate::todo::{StylingDirectiveRegistry, Todo};
use crate::view::VirtualTableView;

// ============================================================================
// STRATEGIES
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ValidationStrategyType {
    #[default]
    Fast,
    Precision,
}

/// Picks the chunk size a validation run stitches the region from.
pub trait ValidationStrategy {
    fn get_chunk_size(&mut self, rows: usize, cols: usize) -> (usize, usize);
}

fn half(n: usize) -> usize {
    n.div_ceil(2).max(1)
}

/// Halves the column count and the row count on alternating calls,
/// starting with the columns.
#[derive(Debug, Clone, Default)]
pub struct FastValidationStrategy {
    split_rows_next: bool,
}

impl FastValidationStrategy {
    pub fn new() -> Self {
        FastValidationStrategy::default()
    }
}

impl ValidationStrategy for FastValidationStrategy {
    fn get_chunk_size(&mut self, rows: usize, cols: usize) -> (usize, usize) {
        let size = if self.split_rows_next {
            (half(rows), cols.max(1))
        } else {
            (rows.max(1), half(cols))
        };
        self.split_rows_next = !self.split_rows_next;
        size
    }
}

/// Halves both dimensions on every call.
#[derive(Debug, Clone, Copy, Default)]
pub struct PrecisionValidationStrategy;

impl ValidationStrategy for PrecisionValidationStrategy {
    fn get_chunk_size(&mut self, rows: usize, cols: usize) -> (usize, usize) {
        (half(rows), half(cols))
    }
}

// ============================================================================
// PROBLEMS
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ProblemReason {
    NotEqual,
    Exception,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ValidationProblem {
    /// Registration index of the directive.
    pub index: usize,
    pub reason: ProblemReason,
    pub message: String,
}

/// Directives found unsafe so far, by registration index.
pub type KnownProblems = FxHashMap<usize, ValidationProblem>;

// ============================================================================
// VALIDATOR
// ============================================================================

pub struct StyleFunctionValidator<'a> {
    source: Rc<dyn SourceTable>,
    registry: &'a dyn StylingDirectiveRegistry,
    view: &'a VirtualTableView,
    formatter: &'a dyn CellFormatter,
    config: &'a EngineConfig,
}

impl<'a> StyleFunctionValidator<'a> {
    pub fn new(
        source: Rc<dyn SourceTable>,
        registry: &'a dyn StylingDirectiveRegistry,
        view: &'a VirtualTableView,
        formatter: &'a dyn CellFormatter,
        config: &'a EngineConfig,
    ) -> Self {
        StyleFunctionValidator {
            source,
            registry,
            view,
            formatter,
            config,
        }
    }

    /// Validates the registered directives over `region` and returns every
    /// known problem, ordered by directive index. New problems are added to
    /// `known`.
    pub fn validate(
        &self,
        region: &Region,
        strategy: &mut dyn ValidationStrategy,
        known: &mut KnownProblems,
    ) -> EngineResult<Vec<ValidationProblem>> {
        let todos = self.registry.list_directives();
        if !todos.iter().any(Todo::is_apply) {
            return Ok(Vec::new());
        }

        let region = self.view.region().get_bounded_region(region);
        let (rows_per_chunk, cols_per_chunk) = strategy.get_chunk_size(region.rows, region.cols);

        let pending: Vec<usize> = todos
            .iter()
            .enumerate()
            .filter(|(i, todo)| todo.is_apply() && !known.contains_key(i))
            .map(|(i, _)| i)
            .collect();
        log::debug!(
            "validating {} directives ({} pending) over {:?} with chunks {}x{}",
            todos.len(),
            pending.len(),
            region,
            rows_per_chunk,
            cols_per_chunk
        );

        let all_safe = pending.len() > 1 && {
            let candidates: Vec<(usize, Todo)> = todos
                .iter()
                .enumerate()
                .filter(|(i, _)| !known.contains_key(i))
                .map(|(i, todo)| (i, todo.clone()))
                .collect();
            match self.compare(candidates, &region, rows_per_chunk, cols_per_chunk) {
                Ok(equal) => equal,
                Err(e) => {
                    log::debug!("combined validation failed, checking directives one by one: {}", e);
                    false
                }
            }
        };

        if !all_safe {
            for index in pending {
                let todo = todos[index].clone();
                let outcome = self.compare(vec![(index, todo)], &region, rows_per_chunk, cols_per_chunk);
                let problem = match outcome {
                    Ok(true) => continue,
                    Ok(false) => ValidationProblem {
                        index,
                        reason: ProblemReason::NotEqual,
                        message: String::new(),
                    },
                    Err(e) => ValidationProblem {
                        index,
                        reason: ProblemReason::Exception,
                        message: exception_message(&e),
                    },
                };
                log::debug!("directive {} is not chunk-safe: {:?}", index, problem.reason);
                known.insert(index, problem);
            }
        }

        Ok((0..todos.len()).filter_map(|i| known.get(&i).cloned()).collect())
    }

    /// Whole-region output vs. chunk-combined output for `todos` alone.
    fn compare(
        &self,
        todos: Vec<(usize, Todo)>,
        region: &Region,
        rows_per_chunk: usize,
        cols_per_chunk: usize,
    ) -> EngineResult<bool> {
        let (indices, todos): (Vec<usize>, Vec<Todo>) = todos.into_iter().unzip();
        let isolated = self.registry.replace_directives_for_chunk(todos);
        let patchers: Vec<TodoPatcher> = indices
            .into_iter()
            .zip(isolated.list_directives())
            .map(|(index, todo)| TodoPatcher::new(index, todo, self.source.as_ref()))
            .collect();
        let aggregates = AggregateCache::new();
        let meta = MetaComputer::new(Rc::clone(&self.source));
        let generator = TableFrameGenerator::new(GeneratorContext {
            view: self.view,
            patchers: &patchers,
            aggregates: &aggregates,
            meta: &meta,
            formatter: self.formatter,
            config: self.config,
        });

        let whole = generator.generate(region)?;
        let chunked = generator.generate_by_combining_chunks(rows_per_chunk, cols_per_chunk, region)?;
        Ok(whole == chunked)
    }
}

/// What the directive itself raised, without the engine's wrapping.
fn exception_message(error: &EngineError) -> String {
    match error {
        EngineError::StyleFunction { source, .. } => source.to_string(),
        other => other.to_string(),
    }
}
