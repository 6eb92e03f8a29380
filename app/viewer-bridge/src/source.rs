//! FILENAME: app/viewer-bridge/src/source.rs
//! PURPOSE: Data sources accepted at session creation and filter evaluation.
//! CONTEXT: The host hands over either a plain table, a table with styling
//! directives, or something the engine cannot display. A filter expression
//! is evaluated against the source; the labels of the table it returns
//! become the row and column allow-lists of the view.

use std::collections::HashMap;
use std::rc::Rc;

use style_engine::{FilterCriteria, SourceTable, StyleRegistry, StylingDirectiveRegistry};

/// Something the viewer asked to display.
pub enum DataSource {
    /// A table without styling directives.
    Table(Rc<dyn SourceTable>),
    /// A table together with its styling directives.
    Styled {
        table: Rc<dyn SourceTable>,
        registry: Box<dyn StylingDirectiveRegistry>,
    },
    /// Any other object; only its type name is known.
    Unsupported { type_name: String },
}

impl DataSource {
    pub fn type_name(&self) -> &str {
        match self {
            DataSource::Table(_) => "Table",
            DataSource::Styled { .. } => "Styler",
            DataSource::Unsupported { type_name } => type_name,
        }
    }

    pub fn table(&self) -> Option<&Rc<dyn SourceTable>> {
        match self {
            DataSource::Table(table) | DataSource::Styled { table, .. } => Some(table),
            DataSource::Unsupported { .. } => None,
        }
    }

    /// Splits a displayable source into table and registry. Plain tables get
    /// an empty registry.
    pub fn into_parts(self) -> Option<(Rc<dyn SourceTable>, Box<dyn StylingDirectiveRegistry>)> {
        match self {
            DataSource::Table(table) => {
                let registry: Box<dyn StylingDirectiveRegistry> = Box::new(StyleRegistry::new());
                Some((table, registry))
            }
            DataSource::Styled { table, registry } => Some((table, registry)),
            DataSource::Unsupported { .. } => None,
        }
    }
}

/// Evaluated once against the source table when a session is created.
pub type FilterExpression = Box<dyn Fn(&Rc<dyn SourceTable>) -> Result<DataSource, String>>;

pub fn filter_expression(
    f: impl Fn(&Rc<dyn SourceTable>) -> Result<DataSource, String> + 'static,
) -> FilterExpression {
    Box::new(f)
}

/// Maps the labels of `filtered` to positions in `source`.
///
/// Labels missing from `source` are ignored. Duplicate labels in `source`
/// all match.
pub fn filter_criteria_from_labels(source: &dyn SourceTable, filtered: &dyn SourceTable) -> FilterCriteria {
    let rows = matching_positions(
        (0..source.row_count()).map(|r| source.row_label(r)),
        (0..filtered.row_count()).map(|r| filtered.row_label(r)),
    );
    let columns = matching_positions(
        (0..source.column_count()).map(|c| source.column_label(c)),
        (0..filtered.column_count()).map(|c| filtered.column_label(c)),
    );
    FilterCriteria {
        rows: Some(rows),
        columns: Some(columns),
    }
}

fn matching_positions(
    source_labels: impl Iterator<Item = String>,
    wanted: impl Iterator<Item = String>,
) -> Vec<usize> {
    let mut positions: HashMap<String, Vec<usize>> = HashMap::new();
    for (pos, label) in source_labels.enumerate() {
        positions.entry(label).or_default().push(pos);
    }

    let mut result: Vec<usize> = wanted
        .filter_map(|label| positions.remove(&label))
        .flatten()
        .collect();
    result.sort_unstable();
    result
}

#[cfg(test)]
mod tests {
    use super::*;
    use style_engine::{CellValue, DType, DataTable};

    fn labelled(rows: &[&str], cols: &[&str]) -> DataTable {
        let mut table = DataTable::new(rows.iter().map(|r| r.to_string()).collect());
        for col in cols {
            table
                .add_column(*col, DType::Float64, vec![CellValue::Number(0.0); rows.len()])
                .unwrap();
        }
        table
    }

    #[test]
    fn test_labels_become_positions() {
        let source = labelled(&["a", "b", "c", "d"], &["x", "y", "z"]);
        let filtered = labelled(&["d", "b", "q"], &["z"]);
        let criteria = filter_criteria_from_labels(&source, &filtered);
        assert_eq!(criteria.rows, Some(vec![1, 3]));
        assert_eq!(criteria.columns, Some(vec![2]));
    }

    #[test]
    fn test_duplicate_source_labels_all_match() {
        let source = labelled(&["a", "b", "a"], &["x"]);
        let filtered = labelled(&["a", "a"], &["x"]);
        let criteria = filter_criteria_from_labels(&source, &filtered);
        assert_eq!(criteria.rows, Some(vec![0, 2]));
    }

    #[test]
    fn test_into_parts() {
        let table: Rc<dyn SourceTable> = Rc::new(labelled(&["a"], &["x"]));
        assert!(DataSource::Table(table).into_parts().is_some());
        let other = DataSource::Unsupported {
            type_name: "list".to_string(),
        };
        assert_eq!(other.type_name(), "list");
        assert!(other.into_parts().is_none());
    }
}
