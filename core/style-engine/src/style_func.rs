//! FILENAME: core/style-engine/src/style_func.rs
//! PURPOSE: Opaque styling callables and the data slices they are invoked with.
//! CONTEXT: A styling function is a user-supplied closure. The engine never
//! looks inside it; it only knows the parameter names the callable declares,
//! whether it accepts arbitrary keyword arguments, and (for built-ins) which
//! built-in it is. Map callables receive one value per cell, apply callables a
//! row, a column or a whole frame and return one CSS string per element.

use std::collections::BTreeMap;
use std::fmt;
use std::rc::Rc;

use serde::{Deserialize, Serialize};

use crate::error::{EngineError, StyleError};
use crate::value::CellValue;

/// Name of the keyword argument that carries the chunk parent.
pub const CHUNK_PARENT_PARAM: &str = "chunk_parent";

/// Direction in which an apply function consumes the table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Axis {
    /// One column per invocation; the series runs along the index.
    Index,
    /// One row per invocation; the series runs along the columns.
    Columns,
}

impl Axis {
    pub fn name(&self) -> &'static str {
        match self {
            Axis::Index => "index",
            Axis::Columns => "columns",
        }
    }
}

/// A single row or column slice.
#[derive(Debug, Clone, PartialEq)]
pub struct Series {
    /// Label of the row/column this series represents.
    pub name: String,
    /// Source position of that row/column.
    pub position: usize,
    /// Labels along the series.
    pub labels: Vec<String>,
    /// Source positions along the series.
    pub positions: Vec<usize>,
    pub values: Vec<CellValue>,
}

impl Series {
    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn numbers(&self) -> impl Iterator<Item = f64> + '_ {
        self.values.iter().filter_map(|v| v.as_number())
    }
}

/// A two-dimensional slice, row-major.
#[derive(Debug, Clone, PartialEq)]
pub struct Frame {
    pub row_labels: Vec<String>,
    pub row_positions: Vec<usize>,
    pub column_labels: Vec<String>,
    pub column_positions: Vec<usize>,
    pub values: Vec<Vec<CellValue>>,
}

impl Frame {
    pub fn shape(&self) -> (usize, usize) {
        (self.row_positions.len(), self.column_positions.len())
    }

    pub fn numbers(&self) -> impl Iterator<Item = f64> + '_ {
        self.values.iter().flatten().filter_map(|v| v.as_number())
    }

    /// The column with the given source position.
    pub fn column(&self, position: usize) -> Option<Series> {
        let idx = self.column_positions.iter().position(|&p| p == position)?;
        Some(Series {
            name: self.column_labels[idx].clone(),
            position,
            labels: self.row_labels.clone(),
            positions: self.row_positions.clone(),
            values: self.values.iter().map(|row| row[idx].clone()).collect(),
        })
    }

    /// The row with the given source position.
    pub fn row(&self, position: usize) -> Option<Series> {
        let idx = self.row_positions.iter().position(|&p| p == position)?;
        Some(Series {
            name: self.row_labels[idx].clone(),
            position,
            labels: self.column_labels.clone(),
            positions: self.column_positions.clone(),
            values: self.values[idx].clone(),
        })
    }
}

/// Input of an apply callable.
#[derive(Debug, Clone, PartialEq)]
pub enum StyleData {
    Series(Series),
    Frame(Frame),
}

/// Output of an apply callable: one CSS string per input element.
#[derive(Debug, Clone, PartialEq)]
pub enum StyleOutput {
    Series(Vec<String>),
    Frame(Vec<Vec<String>>),
}

/// Keyword argument values.
#[derive(Debug, Clone, PartialEq)]
pub enum KwValue {
    Null,
    Bool(bool),
    Number(f64),
    Text(String),
    List(Vec<f64>),
    Series(Rc<Series>),
    Frame(Rc<Frame>),
}

impl KwValue {
    pub fn as_number(&self) -> Option<f64> {
        match self {
            KwValue::Number(n) => Some(*n),
            _ => None,
        }
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            KwValue::Text(s) => Some(s),
            _ => None,
        }
    }
}

pub type Kwargs = BTreeMap<String, KwValue>;

pub type MapFn = Rc<dyn Fn(&CellValue, &Kwargs) -> Result<String, StyleError>>;
pub type ApplyFn = Rc<dyn Fn(&StyleData, &Kwargs) -> Result<StyleOutput, StyleError>>;

#[derive(Clone)]
pub enum StyleFunc {
    Map(MapFn),
    Apply(ApplyFn),
}

/// Built-in styling functions known to the engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BuiltinStyle {
    HighlightMax,
    HighlightMin,
    HighlightNull,
    HighlightBetween,
    HighlightQuantile,
    BackgroundGradient,
    TextGradient,
    Bar,
}

impl BuiltinStyle {
    pub fn name(&self) -> &'static str {
        match self {
            BuiltinStyle::HighlightMax => "highlight_max",
            BuiltinStyle::HighlightMin => "highlight_min",
            BuiltinStyle::HighlightNull => "highlight_null",
            BuiltinStyle::HighlightBetween => "highlight_between",
            BuiltinStyle::HighlightQuantile => "highlight_quantile",
            BuiltinStyle::BackgroundGradient => "background_gradient",
            BuiltinStyle::TextGradient => "text_gradient",
            BuiltinStyle::Bar => "bar",
        }
    }

    pub fn from_name(name: &str) -> Option<BuiltinStyle> {
        let builtin = match name {
            "highlight_max" => BuiltinStyle::HighlightMax,
            "highlight_min" => BuiltinStyle::HighlightMin,
            "highlight_null" => BuiltinStyle::HighlightNull,
            "highlight_between" => BuiltinStyle::HighlightBetween,
            "highlight_quantile" => BuiltinStyle::HighlightQuantile,
            "background_gradient" => BuiltinStyle::BackgroundGradient,
            "text_gradient" => BuiltinStyle::TextGradient,
            "bar" => BuiltinStyle::Bar,
            _ => return None,
        };
        Some(builtin)
    }
}

/// An opaque styling function plus the signature facts the engine may inspect.
#[derive(Clone)]
pub struct StyleCallable {
    name: String,
    params: Vec<String>,
    accepts_var_kwargs: bool,
    builtin: Option<BuiltinStyle>,
    func: StyleFunc,
}

impl StyleCallable {
    /// A callable receiving one value per cell.
    pub fn map<F>(name: impl Into<String>, f: F) -> Self
    where
        F: Fn(&CellValue, &Kwargs) -> Result<String, StyleError> + 'static,
    {
        StyleCallable {
            name: name.into(),
            params: Vec::new(),
            accepts_var_kwargs: false,
            builtin: None,
            func: StyleFunc::Map(Rc::new(f)),
        }
    }

    /// A callable receiving a row, a column or a frame.
    pub fn apply<F>(name: impl Into<String>, f: F) -> Self
    where
        F: Fn(&StyleData, &Kwargs) -> Result<StyleOutput, StyleError> + 'static,
    {
        StyleCallable {
            name: name.into(),
            params: Vec::new(),
            accepts_var_kwargs: false,
            builtin: None,
            func: StyleFunc::Apply(Rc::new(f)),
        }
    }

    /// Declares the keyword parameters of the callable.
    pub fn with_params(mut self, params: &[&str]) -> Self {
        self.params = params.iter().map(|p| p.to_string()).collect();
        self
    }

    /// Declares that the callable accepts arbitrary keyword arguments.
    pub fn with_var_kwargs(mut self) -> Self {
        self.accepts_var_kwargs = true;
        self
    }

    /// Tags the callable as a built-in (set by host adapters that resolved
    /// the registered name).
    pub fn with_builtin(mut self, builtin: BuiltinStyle) -> Self {
        self.builtin = Some(builtin);
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn params(&self) -> &[String] {
        &self.params
    }

    pub fn accepts_var_kwargs(&self) -> bool {
        self.accepts_var_kwargs
    }

    pub fn builtin(&self) -> Option<BuiltinStyle> {
        self.builtin
    }

    pub fn func(&self) -> &StyleFunc {
        &self.func
    }

    pub fn is_map(&self) -> bool {
        matches!(self.func, StyleFunc::Map(_))
    }

    /// Whether the callable can receive the given keyword argument.
    pub fn accepts_param(&self, name: &str) -> bool {
        self.accepts_var_kwargs || self.params.iter().any(|p| p == name)
    }

    /// Same signature, different body. Used by wrappers that must look like
    /// the callable they wrap.
    pub(crate) fn with_apply_body(&self, f: ApplyFn) -> StyleCallable {
        StyleCallable {
            name: self.name.clone(),
            params: self.params.clone(),
            accepts_var_kwargs: self.accepts_var_kwargs,
            builtin: self.builtin,
            func: StyleFunc::Apply(f),
        }
    }

    pub fn invoke_map(&self, value: &CellValue, kwargs: &Kwargs) -> Result<String, EngineError> {
        match &self.func {
            StyleFunc::Map(f) => f(value, kwargs).map_err(|source| self.error(source)),
            StyleFunc::Apply(_) => Err(EngineError::UnsupportedStyleFunction(self.name.clone())),
        }
    }

    pub fn invoke_apply(&self, data: &StyleData, kwargs: &Kwargs) -> Result<StyleOutput, EngineError> {
        match &self.func {
            StyleFunc::Apply(f) => f(data, kwargs).map_err(|source| self.error(source)),
            StyleFunc::Map(_) => Err(EngineError::UnsupportedStyleFunction(self.name.clone())),
        }
    }

    fn error(&self, source: StyleError) -> EngineError {
        EngineError::StyleFunction {
            name: self.name.clone(),
            source,
        }
    }
}

impl fmt::Debug for StyleCallable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StyleCallable")
            .field("name", &self.name)
            .field("params", &self.params)
            .field("accepts_var_kwargs", &self.accepts_var_kwargs)
            .field("builtin", &self.builtin)
            .field("kind", &if self.is_map() { "map" } else { "apply" })
            .finish()
    }
}
