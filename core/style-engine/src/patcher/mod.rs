//! FILENAME: core/style-engine/src/patcher/mod.rs
//! PURPOSE: Rewrites a styling directive so that it runs on one chunk only.
//! CONTEXT: A patcher is created once per directive. It resolves the
//! directive's own subset against the source table and decides, from the
//! directive kind, the callable's declared parameters and its built-in tag,
//! how the directive is restricted to a chunk:
//!
//! - `Map` / `ApplyWithoutGlobal`: subset restriction only.
//! - `ApplyWithGlobal`: subset restriction plus a `ChunkParentProvider`.
//! - `HighlightExtrema` / `Gradient`: the aggregate is computed over the own
//!   subset (cached in the `AggregateCache`) and injected into the chunk call.
//! - `HighlightBetween`: sequence bounds are sliced to the chunk positions.
//! - `Unsupported`: never rendered in chunked mode.

pub mod chunk_parent;

use std::cell::{OnceCell, RefCell};
use std::rc::Rc;

use rustc_hash::{FxHashMap, FxHashSet};

use crate::builtins;
use crate::compute::build_frame;
use crate::error::{EngineResult, StyleError};
use crate::style_func::{
    ApplyFn, Axis, BuiltinStyle, KwValue, Kwargs, StyleCallable, StyleData, StyleFunc,
    StyleOutput, CHUNK_PARENT_PARAM,
};
use crate::table::SourceTable;
use crate::todo::{Subset, Todo, TodoKind};
use crate::view::Chunk;

pub use chunk_parent::{ChunkParentProvider, SubsetParent};

// ============================================================================
// AGGREGATE CACHE
// ============================================================================

/// The part of a directive's subset an aggregate is computed over.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SubsetKey {
    Whole,
    /// Column with the given source position.
    Column(usize),
    /// Row with the given source position.
    Row(usize),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct AggregateKey {
    pub todo_index: usize,
    pub scope: SubsetKey,
}

/// (min, max) over the numeric values of a scope; `None` without values.
pub type NumericBounds = Option<(f64, f64)>;

/// Aggregates computed by the patchers, shared across the chunks of one view.
#[derive(Debug, Default)]
pub struct AggregateCache {
    bounds: RefCell<FxHashMap<AggregateKey, NumericBounds>>,
}

impl AggregateCache {
    pub fn new() -> Self {
        AggregateCache::default()
    }

    pub fn get_or_compute<F>(&self, key: AggregateKey, compute: F) -> NumericBounds
    where
        F: FnOnce() -> NumericBounds,
    {
        if let Some(bounds) = self.bounds.borrow().get(&key) {
            return *bounds;
        }
        let bounds = compute();
        self.bounds.borrow_mut().insert(key, bounds);
        bounds
    }

    pub fn len(&self) -> usize {
        self.bounds.borrow().len()
    }

    pub fn is_empty(&self) -> bool {
        self.bounds.borrow().is_empty()
    }

    pub fn clear(&self) {
        self.bounds.borrow_mut().clear();
    }
}

// ============================================================================
// PATCHER KIND
// ============================================================================

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PatcherKind {
    Map,
    ApplyWithoutGlobal,
    ApplyWithGlobal,
    HighlightExtrema { max: bool },
    Gradient { text: bool },
    HighlightBetween,
    Unsupported { reason: String },
}

impl PatcherKind {
    pub fn resolve(todo: &Todo) -> PatcherKind {
        let func = todo.style_func();
        match (todo.kind(), func.is_map()) {
            (TodoKind::Map, true) => PatcherKind::Map,
            (TodoKind::Map, false) => PatcherKind::Unsupported {
                reason: "map directive with an apply function".to_string(),
            },
            (TodoKind::Apply { .. }, true) => PatcherKind::Unsupported {
                reason: "apply directive with a map function".to_string(),
            },
            (TodoKind::Apply { .. }, false) => match func.builtin() {
                Some(BuiltinStyle::HighlightMax) => PatcherKind::HighlightExtrema { max: true },
                Some(BuiltinStyle::HighlightMin) => PatcherKind::HighlightExtrema { max: false },
                Some(BuiltinStyle::BackgroundGradient) => PatcherKind::Gradient { text: false },
                Some(BuiltinStyle::TextGradient) => PatcherKind::Gradient { text: true },
                Some(BuiltinStyle::HighlightBetween) => PatcherKind::HighlightBetween,
                Some(BuiltinStyle::HighlightNull) => PatcherKind::ApplyWithoutGlobal,
                Some(other @ (BuiltinStyle::HighlightQuantile | BuiltinStyle::Bar)) => {
                    PatcherKind::Unsupported {
                        reason: format!("'{}' needs an aggregate that cannot be computed per chunk", other.name()),
                    }
                }
                None if func.accepts_param(CHUNK_PARENT_PARAM) => PatcherKind::ApplyWithGlobal,
                None => PatcherKind::ApplyWithoutGlobal,
            },
        }
    }

    pub fn is_supported(&self) -> bool {
        !matches!(self, PatcherKind::Unsupported { .. })
    }

    pub fn name(&self) -> &'static str {
        match self {
            PatcherKind::Map => "map",
            PatcherKind::ApplyWithoutGlobal => "apply",
            PatcherKind::ApplyWithGlobal => "apply_with_chunk_parent",
            PatcherKind::HighlightExtrema { max: true } => "highlight_max",
            PatcherKind::HighlightExtrema { max: false } => "highlight_min",
            PatcherKind::Gradient { text: false } => "background_gradient",
            PatcherKind::Gradient { text: true } => "text_gradient",
            PatcherKind::HighlightBetween => "highlight_between",
            PatcherKind::Unsupported { .. } => "unsupported",
        }
    }
}

// ============================================================================
// TODO PATCHER
// ============================================================================

/// Restricts one directive to chunks of the visible table.
pub struct TodoPatcher {
    index: usize,
    todo: Todo,
    kind: PatcherKind,
    own_rows: Vec<usize>,
    own_cols: Vec<usize>,
    row_mask: FxHashSet<usize>,
    col_mask: FxHashSet<usize>,
    chunk_parent: OnceCell<Rc<SubsetParent>>,
    bound_offsets: OnceCell<Rc<FxHashMap<usize, usize>>>,
}

impl TodoPatcher {
    /// `index` is the directive's registration index; it keys the aggregate
    /// cache.
    pub fn new(index: usize, todo: Todo, table: &dyn SourceTable) -> Self {
        let kind = PatcherKind::resolve(&todo);
        let (own_rows, own_cols) = Subset::resolve(todo.subset(), table);
        log::debug!(
            "directive {} ('{}') patched as {}",
            index,
            todo.style_func().name(),
            kind.name()
        );
        TodoPatcher {
            index,
            row_mask: own_rows.iter().copied().collect(),
            col_mask: own_cols.iter().copied().collect(),
            own_rows,
            own_cols,
            todo,
            kind,
            chunk_parent: OnceCell::new(),
            bound_offsets: OnceCell::new(),
        }
    }

    pub fn index(&self) -> usize {
        self.index
    }

    pub fn todo(&self) -> &Todo {
        &self.todo
    }

    pub fn kind(&self) -> &PatcherKind {
        &self.kind
    }

    /// Own subset rows in source order.
    pub fn own_rows(&self) -> &[usize] {
        &self.own_rows
    }

    /// Own subset columns in source order.
    pub fn own_columns(&self) -> &[usize] {
        &self.own_cols
    }

    /// A copy of the directive restricted to `chunk`, or `None` if the chunk
    /// does not intersect the own subset or the directive is unsupported.
    pub fn create_patched_todo(&self, chunk: &Chunk<'_>, aggregates: &AggregateCache) -> EngineResult<Option<Todo>> {
        if let PatcherKind::Unsupported { reason } = &self.kind {
            log::warn!(
                "skipping directive {} ('{}'): {}",
                self.index,
                self.todo.style_func().name(),
                reason
            );
            return Ok(None);
        }

        let rows: Vec<usize> = chunk
            .source_rows()
            .iter()
            .copied()
            .filter(|r| self.row_mask.contains(r))
            .collect();
        let cols: Vec<usize> = chunk
            .source_columns()
            .iter()
            .copied()
            .filter(|c| self.col_mask.contains(c))
            .collect();
        if rows.is_empty() || cols.is_empty() {
            return Ok(None);
        }

        let table = chunk.table();
        let builder = self.todo.builder();
        let patched = match &self.kind {
            PatcherKind::Map | PatcherKind::ApplyWithoutGlobal => builder,
            PatcherKind::ApplyWithGlobal => {
                let func = self.todo.style_func();
                match ChunkParentProvider::new(func, self.todo.axis(), self.chunk_parent(table)) {
                    Some(provider) => builder.with_style_func(provider.into_callable(func)),
                    None => builder,
                }
            }
            PatcherKind::HighlightExtrema { max } => {
                let bounds = self.bounds_for_chunk(table, &rows, &cols, aggregates);
                builder.with_style_func(self.extrema_callable(*max, bounds))
            }
            PatcherKind::Gradient { .. } => {
                let bounds = self.bounds_for_chunk(table, &rows, &cols, aggregates);
                builder.with_style_func(self.gradient_callable(bounds))
            }
            PatcherKind::HighlightBetween => builder.with_style_func(self.between_callable()),
            PatcherKind::Unsupported { .. } => return Ok(None),
        };

        Ok(Some(
            patched
                .with_subset(Subset::new(Some(rows), Some(cols)))
                .build(),
        ))
    }

    /// The own subset as chunk parent, built on first use.
    fn chunk_parent(&self, table: &dyn SourceTable) -> Rc<SubsetParent> {
        Rc::clone(self.chunk_parent.get_or_init(|| {
            Rc::new(SubsetParent::new(Rc::new(build_frame(table, &self.own_rows, &self.own_cols))))
        }))
    }

    /// Bounds of every scope the chunk's calls will ask for.
    fn bounds_for_chunk(
        &self,
        table: &dyn SourceTable,
        rows: &[usize],
        cols: &[usize],
        aggregates: &AggregateCache,
    ) -> Rc<FxHashMap<SubsetKey, NumericBounds>> {
        let scopes: Vec<SubsetKey> = match self.todo.axis() {
            None => vec![SubsetKey::Whole],
            Some(Axis::Index) => cols.iter().map(|&c| SubsetKey::Column(c)).collect(),
            Some(Axis::Columns) => rows.iter().map(|&r| SubsetKey::Row(r)).collect(),
        };
        let bounds = scopes
            .into_iter()
            .map(|scope| {
                let key = AggregateKey {
                    todo_index: self.index,
                    scope,
                };
                (scope, aggregates.get_or_compute(key, || self.compute_bounds(table, scope)))
            })
            .collect();
        Rc::new(bounds)
    }

    fn compute_bounds(&self, table: &dyn SourceTable, scope: SubsetKey) -> NumericBounds {
        let cells: Box<dyn Iterator<Item = (usize, usize)> + '_> = match scope {
            SubsetKey::Whole => Box::new(
                self.own_rows
                    .iter()
                    .flat_map(move |&r| self.own_cols.iter().map(move |&c| (r, c))),
            ),
            SubsetKey::Column(c) => Box::new(self.own_rows.iter().map(move |&r| (r, c))),
            SubsetKey::Row(r) => Box::new(self.own_cols.iter().map(move |&c| (r, c))),
        };
        cells
            .filter_map(|(r, c)| table.value_at(r, c).as_number())
            .fold(None, |acc, n| match acc {
                None => Some((n, n)),
                Some((lo, hi)) => Some((lo.min(n), hi.max(n))),
            })
    }

    fn extrema_callable(&self, max: bool, bounds: Rc<FxHashMap<SubsetKey, NumericBounds>>) -> StyleCallable {
        let probe = ScopeProbe { axis: self.todo.axis() };
        let body: ApplyFn = Rc::new(move |data: &StyleData, kwargs: &Kwargs| -> Result<StyleOutput, StyleError> {
            let scope = probe.scope_of(data);
            let target = bounds
                .get(&scope)
                .copied()
                .ok_or_else(|| probe.lookup_error(scope))?
                .map(|(lo, hi)| if max { hi } else { lo });
            let props = builtins::highlight_props(kwargs, builtins::DEFAULT_HIGHLIGHT_COLOR);
            Ok(builtins::mark_equal(data, target, &props))
        });
        self.todo.style_func().with_apply_body(body)
    }

    fn gradient_callable(&self, bounds: Rc<FxHashMap<SubsetKey, NumericBounds>>) -> StyleCallable {
        let func = self.todo.style_func();
        let Some(inner) = apply_fn(func) else {
            return func.clone();
        };
        let probe = ScopeProbe { axis: self.todo.axis() };
        let body: ApplyFn = Rc::new(move |data: &StyleData, kwargs: &Kwargs| -> Result<StyleOutput, StyleError> {
            let scope = probe.scope_of(data);
            let scoped = bounds
                .get(&scope)
                .copied()
                .ok_or_else(|| probe.lookup_error(scope))?;
            let mut kwargs = kwargs.clone();
            if let Some((lo, hi)) = scoped {
                if !matches!(kwargs.get("vmin"), Some(KwValue::Number(_))) {
                    kwargs.insert("vmin".to_string(), KwValue::Number(lo));
                }
                if !matches!(kwargs.get("vmax"), Some(KwValue::Number(_))) {
                    kwargs.insert("vmax".to_string(), KwValue::Number(hi));
                }
            }
            inner(data, &kwargs)
        });
        func.with_apply_body(body)
    }

    /// Offset of each own position along the directive's axis. Built once
    /// and shared by every chunk call.
    fn bound_offsets(&self) -> &Rc<FxHashMap<usize, usize>> {
        self.bound_offsets.get_or_init(|| {
            let along: &[usize] = match self.todo.axis() {
                Some(Axis::Index) => self.own_rows.as_slice(),
                Some(Axis::Columns) => self.own_cols.as_slice(),
                None => &[],
            };
            Rc::new(along.iter().enumerate().map(|(offset, &position)| (position, offset)).collect())
        })
    }

    /// Slices sequence bounds, which align with the own subset, to the
    /// positions of each chunk call.
    fn between_callable(&self) -> StyleCallable {
        let func = self.todo.style_func();
        let Some(inner) = apply_fn(func) else {
            return func.clone();
        };
        let offsets = Rc::clone(self.bound_offsets());
        let body: ApplyFn = Rc::new(move |data: &StyleData, kwargs: &Kwargs| -> Result<StyleOutput, StyleError> {
            let StyleData::Series(series) = data else {
                return inner(data, kwargs);
            };
            let mut kwargs = kwargs.clone();
            for name in ["left", "right"] {
                let Some(KwValue::List(values)) = kwargs.get(name) else {
                    continue;
                };
                if values.len() != offsets.len() {
                    continue;
                }
                let sliced = series
                    .positions
                    .iter()
                    .map(|position| {
                        offsets
                            .get(position)
                            .map(|&offset| values[offset])
                            .ok_or(StyleError::ChunkParentLookup {
                                axis: "position",
                                position: *position,
                            })
                    })
                    .collect::<Result<Vec<f64>, StyleError>>()?;
                kwargs.insert(name.to_string(), KwValue::List(sliced));
            }
            inner(data, &kwargs)
        });
        func.with_apply_body(body)
    }
}

fn apply_fn(func: &StyleCallable) -> Option<ApplyFn> {
    match func.func() {
        StyleFunc::Apply(f) => Some(Rc::clone(f)),
        StyleFunc::Map(_) => None,
    }
}

/// Maps the data of one call to the scope its aggregate was computed for.
#[derive(Debug, Clone, Copy)]
struct ScopeProbe {
    axis: Option<Axis>,
}

impl ScopeProbe {
    fn scope_of(&self, data: &StyleData) -> SubsetKey {
        match (self.axis, data) {
            (None, _) | (_, StyleData::Frame(_)) => SubsetKey::Whole,
            (Some(Axis::Index), StyleData::Series(series)) => SubsetKey::Column(series.position),
            (Some(Axis::Columns), StyleData::Series(series)) => SubsetKey::Row(series.position),
        }
    }

    fn lookup_error(&self, scope: SubsetKey) -> StyleError {
        match scope {
            SubsetKey::Row(position) => StyleError::ChunkParentLookup { axis: "row", position },
            SubsetKey::Column(position) => StyleError::ChunkParentLookup {
                axis: "column",
                position,
            },
            SubsetKey::Whole => StyleError::failed("no aggregate for the whole subset"),
        }
    }
}
