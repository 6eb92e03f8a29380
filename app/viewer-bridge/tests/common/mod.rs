//! FILENAME: tests/common/mod.rs
//! Test harness and fixtures for bridge integration tests.

#![allow(dead_code)]

use std::rc::Rc;

use style_engine::{
    builtins, Axis, CellValue, DType, DataTable, EngineConfig, SourceTable, StyleRegistry, Todo,
};
use viewer_bridge::{
    create_bridge_state, create_table_session, BridgeState, CreateTableOptions, DataSource,
};

/// Test harness holding bridge state and one source table.
pub struct TestHarness {
    pub state: BridgeState,
    pub table: Rc<dyn SourceTable>,
}

impl TestHarness {
    /// A 5x5 grid where cell (r, c) holds r * 5 + c, rows labelled "r0".."r4"
    /// and columns "c0".."c4".
    pub fn new() -> Self {
        Self::with_config(EngineConfig::default())
    }

    pub fn with_config(config: EngineConfig) -> Self {
        TestHarness {
            state: create_bridge_state(config),
            table: Rc::new(grid_table(5, 5)),
        }
    }

    pub fn plain_source(&self) -> DataSource {
        DataSource::Table(Rc::clone(&self.table))
    }

    /// The table styled with a column-wise highlight_max and a text gradient.
    pub fn styled_source(&self) -> DataSource {
        let registry = StyleRegistry::new()
            .with(Todo::apply(builtins::highlight_max(), Some(Axis::Index)))
            .with(Todo::apply(builtins::text_gradient(), None));
        DataSource::Styled {
            table: Rc::clone(&self.table),
            registry: Box::new(registry),
        }
    }

    /// Opens a session and returns its id.
    pub fn open(&self, source: DataSource) -> String {
        let result = create_table_session(&self.state, source, CreateTableOptions::default()).unwrap();
        assert!(result.success, "{:?}", result.failure);
        result.session_id.unwrap()
    }
}

pub fn grid_table(rows: usize, cols: usize) -> DataTable {
    let mut table = DataTable::new((0..rows).map(|r| format!("r{}", r)).collect());
    for c in 0..cols {
        let values = (0..rows).map(|r| CellValue::Number((r * cols + c) as f64)).collect();
        table.add_column(format!("c{}", c), DType::Int64, values).unwrap();
    }
    table
}

/// A table containing only the given rows and columns of `grid_table`.
pub fn labelled_subset(rows: &[usize], cols: &[usize]) -> DataTable {
    let mut table = DataTable::new(rows.iter().map(|r| format!("r{}", r)).collect());
    for c in cols {
        let values = rows.iter().map(|_| CellValue::Empty).collect();
        table.add_column(format!("c{}", c), DType::Object, values).unwrap();
    }
    table
}
