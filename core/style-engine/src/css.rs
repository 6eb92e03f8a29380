//! FILENAME: core/style-engine/src/css.rs
//! PURPOSE: CSS declarations produced by styling functions, accumulated per cell.
//! CONTEXT: Styling functions return strings like "background-color: red; color: white".
//! The declarations of all directives are collected per source cell in
//! directive order; when a property is declared twice the later one wins.

use std::collections::BTreeMap;

use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CssDeclaration {
    pub property: String,
    pub value: String,
}

/// Parses "prop: value; prop: value". Pieces without a ':' are ignored.
pub fn parse_css(css: &str) -> Vec<CssDeclaration> {
    css.split(';')
        .filter_map(|piece| {
            let (property, value) = piece.split_once(':')?;
            let property = property.trim();
            let value = value.trim();
            if property.is_empty() || value.is_empty() {
                return None;
            }
            Some(CssDeclaration {
                property: property.to_lowercase(),
                value: value.to_string(),
            })
        })
        .collect()
}

/// CSS declarations per source cell.
#[derive(Debug, Clone, Default)]
pub struct StyleContext {
    cells: FxHashMap<(usize, usize), Vec<CssDeclaration>>,
}

impl StyleContext {
    pub fn new() -> Self {
        StyleContext::default()
    }

    /// Parses `css` and appends its declarations to the cell.
    pub fn push_css(&mut self, source_row: usize, source_col: usize, css: &str) {
        let declarations = parse_css(css);
        if declarations.is_empty() {
            return;
        }
        self.cells
            .entry((source_row, source_col))
            .or_default()
            .extend(declarations);
    }

    pub fn get(&self, source_row: usize, source_col: usize) -> Option<&[CssDeclaration]> {
        self.cells.get(&(source_row, source_col)).map(|d| d.as_slice())
    }

    /// Merged property map of a cell; later declarations override earlier ones.
    pub fn css_map(&self, source_row: usize, source_col: usize) -> Option<BTreeMap<String, String>> {
        let declarations = self.get(source_row, source_col)?;
        Some(
            declarations
                .iter()
                .map(|d| (d.property.clone(), d.value.clone()))
                .collect(),
        )
    }

    pub fn len(&self) -> usize {
        self.cells.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_css() {
        let parsed = parse_css("background-color: red; Color:#fff;; junk ; width: ");
        assert_eq!(
            parsed,
            vec![
                CssDeclaration {
                    property: "background-color".into(),
                    value: "red".into()
                },
                CssDeclaration {
                    property: "color".into(),
                    value: "#fff".into()
                },
            ]
        );
        assert!(parse_css("").is_empty());
    }

    #[test]
    fn test_later_declarations_win() {
        let mut ctx = StyleContext::new();
        ctx.push_css(1, 2, "color: red; text-align: left");
        ctx.push_css(1, 2, "color: blue");
        ctx.push_css(1, 3, "");

        let css = ctx.css_map(1, 2).unwrap();
        assert_eq!(css.get("color").map(String::as_str), Some("blue"));
        assert_eq!(css.get("text-align").map(String::as_str), Some("left"));
        assert!(ctx.css_map(1, 3).is_none());
        assert_eq!(ctx.len(), 1);
    }
}
