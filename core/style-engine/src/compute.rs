//! FILENAME: core/style-engine/src/compute.rs
//! PURPOSE: Runs styling directives over a source table and collects the CSS.
//! CONTEXT: This is the un-chunked computation: each directive is executed
//! once over its (resolved) subset. Chunked rendering reuses it with patched
//! directives whose subsets are restricted to one chunk.

use crate::css::StyleContext;
use crate::error::{EngineError, EngineResult};
use crate::style_func::{Axis, Frame, Series, StyleData, StyleOutput};
use crate::table::SourceTable;
use crate::todo::{Subset, Todo, TodoKind};

/// Executes `todos` in order and returns the CSS declarations per source cell.
pub fn compute_styles(table: &dyn SourceTable, todos: &[Todo]) -> EngineResult<StyleContext> {
    let mut styles = StyleContext::new();
    for todo in todos {
        let (rows, cols) = Subset::resolve(todo.subset(), table);
        if rows.is_empty() || cols.is_empty() {
            continue;
        }
        match todo.kind() {
            TodoKind::Map => apply_map(table, todo, &rows, &cols, &mut styles)?,
            TodoKind::Apply { axis: None } => apply_frame(table, todo, &rows, &cols, &mut styles)?,
            TodoKind::Apply { axis: Some(axis) } => apply_series(table, todo, axis, &rows, &cols, &mut styles)?,
        }
    }
    Ok(styles)
}

fn apply_map(
    table: &dyn SourceTable,
    todo: &Todo,
    rows: &[usize],
    cols: &[usize],
    styles: &mut StyleContext,
) -> EngineResult<()> {
    let func = todo.style_func();
    for &row in rows {
        for &col in cols {
            let css = func.invoke_map(&table.value_at(row, col), todo.kwargs())?;
            styles.push_css(row, col, &css);
        }
    }
    Ok(())
}

fn apply_series(
    table: &dyn SourceTable,
    todo: &Todo,
    axis: Axis,
    rows: &[usize],
    cols: &[usize],
    styles: &mut StyleContext,
) -> EngineResult<()> {
    let func = todo.style_func();
    let (outer, inner) = match axis {
        Axis::Index => (cols, rows),
        Axis::Columns => (rows, cols),
    };
    for &position in outer {
        let series = build_series(table, axis, position, inner);
        let output = func.invoke_apply(&StyleData::Series(series), todo.kwargs())?;
        let css = match output {
            StyleOutput::Series(css) if css.len() == inner.len() => css,
            StyleOutput::Series(css) => {
                return Err(shape_error(todo, format!("{}", inner.len()), format!("{}", css.len())))
            }
            StyleOutput::Frame(css) => {
                return Err(shape_error(
                    todo,
                    format!("{}", inner.len()),
                    format!("a frame of {} rows", css.len()),
                ))
            }
        };
        for (&other, declarations) in inner.iter().zip(&css) {
            match axis {
                Axis::Index => styles.push_css(other, position, declarations),
                Axis::Columns => styles.push_css(position, other, declarations),
            }
        }
    }
    Ok(())
}

fn apply_frame(
    table: &dyn SourceTable,
    todo: &Todo,
    rows: &[usize],
    cols: &[usize],
    styles: &mut StyleContext,
) -> EngineResult<()> {
    let frame = build_frame(table, rows, cols);
    let output = todo
        .style_func()
        .invoke_apply(&StyleData::Frame(frame), todo.kwargs())?;
    let expected = format!("{}x{}", rows.len(), cols.len());
    let css = match output {
        StyleOutput::Frame(css) => css,
        StyleOutput::Series(css) => return Err(shape_error(todo, expected, format!("a series of {}", css.len()))),
    };
    if css.len() != rows.len() || css.iter().any(|r| r.len() != cols.len()) {
        let width = css.first().map(|r| r.len()).unwrap_or(0);
        return Err(shape_error(todo, expected, format!("{}x{}", css.len(), width)));
    }
    for (&row, row_css) in rows.iter().zip(&css) {
        for (&col, declarations) in cols.iter().zip(row_css) {
            styles.push_css(row, col, declarations);
        }
    }
    Ok(())
}

fn shape_error(todo: &Todo, expected: String, actual: String) -> EngineError {
    EngineError::StyleOutputShape {
        name: todo.style_func().name().to_string(),
        expected,
        actual,
    }
}

/// Row `position` (axis `Columns`) or column `position` (axis `Index`),
/// restricted to `along`.
pub(crate) fn build_series(table: &dyn SourceTable, axis: Axis, position: usize, along: &[usize]) -> Series {
    match axis {
        Axis::Index => Series {
            name: table.column_label(position),
            position,
            labels: along.iter().map(|&r| table.row_label(r)).collect(),
            positions: along.to_vec(),
            values: along.iter().map(|&r| table.value_at(r, position)).collect(),
        },
        Axis::Columns => Series {
            name: table.row_label(position),
            position,
            labels: along.iter().map(|&c| table.column_label(c)).collect(),
            positions: along.to_vec(),
            values: along.iter().map(|&c| table.value_at(position, c)).collect(),
        },
    }
}

pub(crate) fn build_frame(table: &dyn SourceTable, rows: &[usize], cols: &[usize]) -> Frame {
    Frame {
        row_labels: rows.iter().map(|&r| table.row_label(r)).collect(),
        row_positions: rows.to_vec(),
        column_labels: cols.iter().map(|&c| table.column_label(c)).collect(),
        column_positions: cols.to_vec(),
        values: rows
            .iter()
            .map(|&r| cols.iter().map(|&c| table.value_at(r, c)).collect())
            .collect(),
    }
}
