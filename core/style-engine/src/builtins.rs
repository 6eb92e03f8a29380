//! FILENAME: core/style-engine/src/builtins.rs
//! PURPOSE: Built-in styling functions.
//! CONTEXT: These behave like any other apply callable when invoked directly:
//! aggregates (extrema, gradient domain) are taken from the data they receive.
//! The patchers in `patcher/` feed them subset-wide aggregates instead, so a
//! chunk renders exactly like the whole table.

use crate::colormap::Colormap;
use crate::error::StyleError;
use crate::style_func::{BuiltinStyle, Kwargs, KwValue, StyleCallable, StyleData, StyleOutput};
use crate::value::CellValue;

pub const DEFAULT_HIGHLIGHT_COLOR: &str = "yellow";
pub const DEFAULT_NULL_COLOR: &str = "red";
pub const DEFAULT_CMAP: &str = "PuBu";
pub const DEFAULT_TEXT_COLOR_THRESHOLD: f64 = 0.408;

const LIGHT_TEXT: &str = "#f1f1f1";
const DARK_TEXT: &str = "#000000";

// ============================================================================
// CONSTRUCTORS
// ============================================================================

pub fn highlight_max() -> StyleCallable {
    StyleCallable::apply(BuiltinStyle::HighlightMax.name(), |data, kwargs| {
        let props = highlight_props(kwargs, DEFAULT_HIGHLIGHT_COLOR);
        Ok(mark_equal(data, extremum(data, true), &props))
    })
    .with_params(&["color", "props"])
    .with_builtin(BuiltinStyle::HighlightMax)
}

pub fn highlight_min() -> StyleCallable {
    StyleCallable::apply(BuiltinStyle::HighlightMin.name(), |data, kwargs| {
        let props = highlight_props(kwargs, DEFAULT_HIGHLIGHT_COLOR);
        Ok(mark_equal(data, extremum(data, false), &props))
    })
    .with_params(&["color", "props"])
    .with_builtin(BuiltinStyle::HighlightMin)
}

pub fn highlight_null() -> StyleCallable {
    StyleCallable::apply(BuiltinStyle::HighlightNull.name(), |data, kwargs| {
        let props = highlight_props(kwargs, DEFAULT_NULL_COLOR);
        Ok(style_each(data, |_, value| {
            if value.is_missing() {
                props.clone()
            } else {
                String::new()
            }
        }))
    })
    .with_params(&["color", "props"])
    .with_builtin(BuiltinStyle::HighlightNull)
}

pub fn highlight_between() -> StyleCallable {
    StyleCallable::apply(BuiltinStyle::HighlightBetween.name(), highlight_between_styles)
        .with_params(&["color", "props", "left", "right", "inclusive"])
        .with_builtin(BuiltinStyle::HighlightBetween)
}

pub fn background_gradient() -> StyleCallable {
    StyleCallable::apply(BuiltinStyle::BackgroundGradient.name(), |data, kwargs| {
        gradient_styles(data, kwargs, false)
    })
    .with_params(&["cmap", "low", "high", "vmin", "vmax", "text_color_threshold"])
    .with_builtin(BuiltinStyle::BackgroundGradient)
}

pub fn text_gradient() -> StyleCallable {
    StyleCallable::apply(BuiltinStyle::TextGradient.name(), |data, kwargs| {
        gradient_styles(data, kwargs, true)
    })
    .with_params(&["cmap", "low", "high", "vmin", "vmax"])
    .with_builtin(BuiltinStyle::TextGradient)
}

// ============================================================================
// SHARED HELPERS
// ============================================================================

/// CSS applied to highlighted cells: `props`, else `background-color: <color>`.
pub(crate) fn highlight_props(kwargs: &Kwargs, default_color: &str) -> String {
    if let Some(props) = kwargs.get("props").and_then(KwValue::as_text) {
        return props.to_string();
    }
    let color = kwargs
        .get("color")
        .and_then(KwValue::as_text)
        .unwrap_or(default_color);
    format!("background-color: {}", color)
}

/// Applies `f` to every element, keeping the input shape. `f` receives the
/// element's offset along a series (the column offset for frames).
pub(crate) fn style_each<F>(data: &StyleData, mut f: F) -> StyleOutput
where
    F: FnMut(usize, &CellValue) -> String,
{
    match data {
        StyleData::Series(series) => {
            StyleOutput::Series(series.values.iter().enumerate().map(|(i, v)| f(i, v)).collect())
        }
        StyleData::Frame(frame) => StyleOutput::Frame(
            frame
                .values
                .iter()
                .map(|row| row.iter().enumerate().map(|(i, v)| f(i, v)).collect())
                .collect(),
        ),
    }
}

pub(crate) fn numbers(data: &StyleData) -> Vec<f64> {
    match data {
        StyleData::Series(series) => series.numbers().collect(),
        StyleData::Frame(frame) => frame.numbers().collect(),
    }
}

pub(crate) fn extremum(data: &StyleData, max: bool) -> Option<f64> {
    let values = numbers(data);
    if max {
        values.into_iter().reduce(f64::max)
    } else {
        values.into_iter().reduce(f64::min)
    }
}

/// Marks every element equal to `target` with `props`.
pub(crate) fn mark_equal(data: &StyleData, target: Option<f64>, props: &str) -> StyleOutput {
    style_each(data, |_, value| match (value.as_number(), target) {
        (Some(n), Some(t)) if n == t => props.to_string(),
        _ => String::new(),
    })
}

// ============================================================================
// GRADIENT
// ============================================================================

fn kw_number(kwargs: &Kwargs, name: &str, default: f64) -> Result<f64, StyleError> {
    match kwargs.get(name) {
        None | Some(KwValue::Null) => Ok(default),
        Some(KwValue::Number(n)) => Ok(*n),
        Some(other) => Err(StyleError::InvalidKwarg {
            name: name.to_string(),
            message: format!("expected a number, got {:?}", other),
        }),
    }
}

fn kw_optional_number(kwargs: &Kwargs, name: &str) -> Result<Option<f64>, StyleError> {
    match kwargs.get(name) {
        None | Some(KwValue::Null) => Ok(None),
        Some(KwValue::Number(n)) => Ok(Some(*n)),
        Some(other) => Err(StyleError::InvalidKwarg {
            name: name.to_string(),
            message: format!("expected a number, got {:?}", other),
        }),
    }
}

fn gradient_styles(data: &StyleData, kwargs: &Kwargs, text_only: bool) -> Result<StyleOutput, StyleError> {
    let cmap_name = kwargs.get("cmap").and_then(KwValue::as_text).unwrap_or(DEFAULT_CMAP);
    let cmap = Colormap::named(cmap_name).ok_or_else(|| StyleError::InvalidKwarg {
        name: "cmap".to_string(),
        message: format!("unknown colormap '{}'", cmap_name),
    })?;
    let low = kw_number(kwargs, "low", 0.0)?;
    let high = kw_number(kwargs, "high", 0.0)?;
    let threshold = kw_number(kwargs, "text_color_threshold", DEFAULT_TEXT_COLOR_THRESHOLD)?;

    let values = numbers(data);
    let smin = match kw_optional_number(kwargs, "vmin")? {
        Some(v) => Some(v),
        None => values.iter().copied().reduce(f64::min),
    };
    let smax = match kw_optional_number(kwargs, "vmax")? {
        Some(v) => Some(v),
        None => values.iter().copied().reduce(f64::max),
    };

    let (smin, smax) = match (smin, smax) {
        (Some(lo), Some(hi)) => (lo, hi),
        _ => return Ok(style_each(data, |_, _| String::new())),
    };
    let rng = smax - smin;
    let lo = smin - rng * low;
    let hi = smax + rng * high;

    Ok(style_each(data, |_, value| {
        let Some(x) = value.as_number() else {
            return String::new();
        };
        let t = if hi > lo { (x - lo) / (hi - lo) } else { 0.0 };
        let color = cmap.color_at(t);
        if text_only {
            format!("color: {};", color.to_css())
        } else {
            let text = if color.relative_luminance() < threshold {
                LIGHT_TEXT
            } else {
                DARK_TEXT
            };
            format!("background-color: {};color: {};", color.to_css(), text)
        }
    }))
}

// ============================================================================
// HIGHLIGHT BETWEEN
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Inclusive {
    Both,
    Left,
    Right,
    Neither,
}

fn bound_at(kwargs: &Kwargs, name: &str, offset: usize, len: usize, default: f64) -> Result<f64, StyleError> {
    match kwargs.get(name) {
        None | Some(KwValue::Null) => Ok(default),
        Some(KwValue::Number(n)) => Ok(*n),
        Some(KwValue::List(values)) if values.len() == len => Ok(values[offset]),
        Some(KwValue::List(values)) => Err(StyleError::InvalidKwarg {
            name: name.to_string(),
            message: format!("sequence of length {} does not match data of length {}", values.len(), len),
        }),
        Some(other) => Err(StyleError::InvalidKwarg {
            name: name.to_string(),
            message: format!("expected a number or a sequence, got {:?}", other),
        }),
    }
}

fn highlight_between_styles(data: &StyleData, kwargs: &Kwargs) -> Result<StyleOutput, StyleError> {
    let inclusive = match kwargs.get("inclusive").and_then(KwValue::as_text).unwrap_or("both") {
        "both" => Inclusive::Both,
        "left" => Inclusive::Left,
        "right" => Inclusive::Right,
        "neither" => Inclusive::Neither,
        other => {
            return Err(StyleError::InvalidKwarg {
                name: "inclusive".to_string(),
                message: format!("unknown value '{}'", other),
            })
        }
    };
    let props = highlight_props(kwargs, DEFAULT_HIGHLIGHT_COLOR);

    let len = match data {
        StyleData::Series(series) => series.len(),
        StyleData::Frame(_) => {
            for name in ["left", "right"] {
                if let Some(KwValue::List(_)) = kwargs.get(name) {
                    return Err(StyleError::InvalidKwarg {
                        name: name.to_string(),
                        message: "sequence bounds require an axis".to_string(),
                    });
                }
            }
            0
        }
    };

    let mut bounds = Vec::with_capacity(len.max(1));
    for offset in 0..len.max(1) {
        let left = bound_at(kwargs, "left", offset, len, f64::NEG_INFINITY)?;
        let right = bound_at(kwargs, "right", offset, len, f64::INFINITY)?;
        bounds.push((left, right));
    }

    Ok(style_each(data, |offset, value| {
        let Some(x) = value.as_number() else {
            return String::new();
        };
        let (left, right) = match data {
            StyleData::Series(_) => bounds[offset],
            StyleData::Frame(_) => bounds[0],
        };
        let inside = match inclusive {
            Inclusive::Both => left <= x && x <= right,
            Inclusive::Left => left <= x && x < right,
            Inclusive::Right => left < x && x <= right,
            Inclusive::Neither => left < x && x < right,
        };
        if inside {
            props.clone()
        } else {
            String::new()
        }
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::style_func::{Frame, Series};

    fn series(values: &[f64]) -> StyleData {
        StyleData::Series(Series {
            name: "s".into(),
            position: 0,
            labels: (0..values.len()).map(|i| i.to_string()).collect(),
            positions: (0..values.len()).collect(),
            values: values.iter().map(|&v| CellValue::Number(v)).collect(),
        })
    }

    fn invoke(callable: &StyleCallable, data: &StyleData, kwargs: &Kwargs) -> Vec<String> {
        match callable.invoke_apply(data, kwargs).unwrap() {
            StyleOutput::Series(s) => s,
            StyleOutput::Frame(f) => f.into_iter().flatten().collect(),
        }
    }

    #[test]
    fn test_highlight_max_and_min() {
        let data = series(&[1.0, 3.0, f64::NAN, 3.0]);
        let out = invoke(&highlight_max(), &data, &Kwargs::new());
        assert_eq!(out, vec!["", "background-color: yellow", "", "background-color: yellow"]);

        let mut kwargs = Kwargs::new();
        kwargs.insert("color".into(), KwValue::Text("green".into()));
        let out = invoke(&highlight_min(), &data, &kwargs);
        assert_eq!(out[0], "background-color: green");
    }

    #[test]
    fn test_highlight_null_on_frame() {
        let data = StyleData::Frame(Frame {
            row_labels: vec!["0".into()],
            row_positions: vec![0],
            column_labels: vec!["a".into(), "b".into()],
            column_positions: vec![0, 1],
            values: vec![vec![CellValue::Empty, 2.0.into()]],
        });
        let out = invoke(&highlight_null(), &data, &Kwargs::new());
        assert_eq!(out, vec!["background-color: red", ""]);
    }

    #[test]
    fn test_gradient_uses_vmin_vmax() {
        let data = series(&[0.0, 5.0, 10.0]);
        let out = invoke(&text_gradient(), &data, &Kwargs::new());
        assert_eq!(out[0], "color: #fff7fb;");
        assert_eq!(out[2], "color: #023858;");

        let mut kwargs = Kwargs::new();
        kwargs.insert("vmin".into(), KwValue::Number(-10.0));
        kwargs.insert("vmax".into(), KwValue::Number(10.0));
        let out = invoke(&text_gradient(), &data, &kwargs);
        assert_eq!(out[0], "color: #74a9cf;");
    }

    #[test]
    fn test_background_gradient_text_contrast() {
        let data = series(&[0.0, 10.0]);
        let out = invoke(&background_gradient(), &data, &Kwargs::new());
        assert_eq!(out[0], "background-color: #fff7fb;color: #000000;");
        assert_eq!(out[1], "background-color: #023858;color: #f1f1f1;");
    }

    #[test]
    fn test_gradient_rejects_unknown_cmap() {
        let mut kwargs = Kwargs::new();
        kwargs.insert("cmap".into(), KwValue::Text("nope".into()));
        let result = background_gradient().invoke_apply(&series(&[1.0]), &kwargs);
        assert!(result.is_err());
    }

    #[test]
    fn test_highlight_between_with_sequence_bounds() {
        let data = series(&[1.0, 5.0, 9.0]);
        let mut kwargs = Kwargs::new();
        kwargs.insert("left".into(), KwValue::List(vec![0.0, 6.0, 8.0]));
        kwargs.insert("right".into(), KwValue::Number(9.0));
        kwargs.insert("inclusive".into(), KwValue::Text("left".into()));
        let out = invoke(&highlight_between(), &data, &kwargs);
        assert_eq!(out, vec!["background-color: yellow", "", ""]);

        kwargs.insert("left".into(), KwValue::List(vec![0.0]));
        assert!(highlight_between().invoke_apply(&data, &kwargs).is_err());
    }
}
