//! FILENAME: core/style-engine/src/todo.rs
//! PURPOSE: Styling directives ("todos") and the registry they are read from.
//! CONTEXT: A Todo is built once per registered styling function and never
//! mutated afterwards. Patchers and the validator derive modified copies via
//! `TodoBuilder`, so re-validation always starts from the pristine directive.
//! Host adapters expose their own style registration state through the
//! `StylingDirectiveRegistry` trait.

use crate::style_func::{Axis, KwValue, Kwargs, StyleCallable};
use crate::table::SourceTable;
use crate::view::Visibility;

// ============================================================================
// TODO
// ============================================================================

/// How a directive consumes the table.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TodoKind {
    /// Row, column or whole-frame slices. `axis: None` means the whole frame.
    Apply { axis: Option<Axis> },
    /// One value per cell.
    Map,
}

/// Declared scope of a directive in source positions. `None` on an axis
/// selects every row/column.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Subset {
    pub rows: Option<Vec<usize>>,
    pub columns: Option<Vec<usize>>,
}

impl Subset {
    pub fn new(rows: Option<Vec<usize>>, columns: Option<Vec<usize>>) -> Self {
        Subset { rows, columns }
    }

    pub fn columns(columns: Vec<usize>) -> Self {
        Subset::new(None, Some(columns))
    }

    pub fn rows(rows: Vec<usize>) -> Self {
        Subset::new(Some(rows), None)
    }

    /// Intersects the subset with the table: positions outside the table are
    /// dropped, duplicates removed, source order kept.
    pub fn resolve(subset: Option<&Subset>, table: &dyn SourceTable) -> (Vec<usize>, Vec<usize>) {
        let rows = resolve_axis(subset.and_then(|s| s.rows.as_deref()), table.row_count());
        let columns = resolve_axis(subset.and_then(|s| s.columns.as_deref()), table.column_count());
        (rows, columns)
    }
}

fn resolve_axis(declared: Option<&[usize]>, count: usize) -> Vec<usize> {
    match declared {
        None => (0..count).collect(),
        Some(positions) => {
            let mut mask = vec![false; count];
            for &pos in positions.iter().filter(|&&p| p < count) {
                mask[pos] = true;
            }
            (0..count).filter(|&pos| mask[pos]).collect()
        }
    }
}

/// One registered styling directive.
#[derive(Debug, Clone)]
pub struct Todo {
    kind: TodoKind,
    style_func: StyleCallable,
    subset: Option<Subset>,
    kwargs: Kwargs,
}

impl Todo {
    pub fn apply(style_func: StyleCallable, axis: Option<Axis>) -> Self {
        Todo {
            kind: TodoKind::Apply { axis },
            style_func,
            subset: None,
            kwargs: Kwargs::new(),
        }
    }

    pub fn map(style_func: StyleCallable) -> Self {
        Todo {
            kind: TodoKind::Map,
            style_func,
            subset: None,
            kwargs: Kwargs::new(),
        }
    }

    pub fn kind(&self) -> TodoKind {
        self.kind
    }

    pub fn is_apply(&self) -> bool {
        matches!(self.kind, TodoKind::Apply { .. })
    }

    /// The axis of an apply directive; `None` for map directives and
    /// whole-frame applies.
    pub fn axis(&self) -> Option<Axis> {
        match self.kind {
            TodoKind::Apply { axis } => axis,
            TodoKind::Map => None,
        }
    }

    pub fn style_func(&self) -> &StyleCallable {
        &self.style_func
    }

    pub fn subset(&self) -> Option<&Subset> {
        self.subset.as_ref()
    }

    pub fn kwargs(&self) -> &Kwargs {
        &self.kwargs
    }

    /// Starts a modified copy of this directive.
    pub fn builder(&self) -> TodoBuilder {
        TodoBuilder { todo: self.clone() }
    }
}

/// Copy-on-write builder for `Todo`.
#[derive(Debug, Clone)]
pub struct TodoBuilder {
    todo: Todo,
}

impl TodoBuilder {
    pub fn with_subset(mut self, subset: Subset) -> Self {
        self.todo.subset = Some(subset);
        self
    }

    pub fn with_style_func(mut self, style_func: StyleCallable) -> Self {
        self.todo.style_func = style_func;
        self
    }

    pub fn with_kwargs(mut self, kwargs: Kwargs) -> Self {
        self.todo.kwargs = kwargs;
        self
    }

    pub fn with_kwarg(mut self, name: impl Into<String>, value: KwValue) -> Self {
        self.todo.kwargs.insert(name.into(), value);
        self
    }

    pub fn build(self) -> Todo {
        self.todo
    }
}

// ============================================================================
// REGISTRY
// ============================================================================

/// The host's style registration state as seen by the engine.
pub trait StylingDirectiveRegistry {
    /// Registered directives in registration order.
    fn list_directives(&self) -> Vec<Todo>;

    /// A registry equal to this one but carrying `todos` instead of the
    /// registered directives. The receiver is left untouched.
    fn replace_directives_for_chunk(&self, todos: Vec<Todo>) -> Box<dyn StylingDirectiveRegistry>;

    /// Rows, columns and headers hidden by the styler.
    fn visibility(&self) -> Visibility {
        Visibility::default()
    }
}

/// In-memory registry of styling directives.
#[derive(Debug, Clone, Default)]
pub struct StyleRegistry {
    todos: Vec<Todo>,
    visibility: Visibility,
}

impl StyleRegistry {
    pub fn new() -> Self {
        StyleRegistry::default()
    }

    /// Registers a directive and returns its index.
    pub fn register(&mut self, todo: Todo) -> usize {
        self.todos.push(todo);
        self.todos.len() - 1
    }

    /// Builder form of `register`.
    pub fn with(mut self, todo: Todo) -> Self {
        self.register(todo);
        self
    }

    pub fn hide_rows(&mut self, rows: &[usize]) {
        self.visibility.hidden_rows.extend_from_slice(rows);
    }

    pub fn hide_columns(&mut self, columns: &[usize]) {
        self.visibility.hidden_columns.extend_from_slice(columns);
    }

    pub fn hide_index(&mut self) {
        self.visibility.index_hidden = true;
    }

    pub fn hide_columns_header(&mut self) {
        self.visibility.columns_hidden = true;
    }

    pub fn len(&self) -> usize {
        self.todos.len()
    }

    pub fn is_empty(&self) -> bool {
        self.todos.is_empty()
    }
}

impl StylingDirectiveRegistry for StyleRegistry {
    fn list_directives(&self) -> Vec<Todo> {
        self.todos.clone()
    }

    fn replace_directives_for_chunk(&self, todos: Vec<Todo>) -> Box<dyn StylingDirectiveRegistry> {
        Box::new(StyleRegistry {
            todos,
            visibility: self.visibility.clone(),
        })
    }

    fn visibility(&self) -> Visibility {
        self.visibility.clone()
    }
}
