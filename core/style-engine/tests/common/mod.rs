//! FILENAME: tests/common/mod.rs
//! Test harness and fixtures for style engine integration tests.

#![allow(dead_code)]

use std::cell::Cell;
use std::rc::Rc;

use style_engine::{
    CellValue, DType, DataTable, EngineConfig, FilterCriteria, SourceTable, StyleCallable,
    StyleData, StyleOutput, StyleRegistry, TableViewContext,
};

/// Test harness for creating table view contexts.
pub struct TestHarness {
    pub table: Rc<dyn SourceTable>,
    pub registry: StyleRegistry,
    pub filter: FilterCriteria,
    pub config: EngineConfig,
}

impl TestHarness {
    pub fn new(table: DataTable) -> Self {
        TestHarness {
            table: Rc::new(table),
            registry: StyleRegistry::new(),
            filter: FilterCriteria::default(),
            config: EngineConfig::default(),
        }
    }

    /// A rows x cols Float64 table where cell (r, c) holds r * cols + c.
    pub fn with_grid(rows: usize, cols: usize) -> Self {
        let data: Vec<Vec<f64>> = (0..rows)
            .map(|r| (0..cols).map(|c| (r * cols + c) as f64).collect())
            .collect();
        TestHarness::new(DataTable::from_numbers(&data).unwrap())
    }

    /// A mixed-type table with missing values.
    pub fn with_sample_data() -> Self {
        let table = DataTable::new(vec!["a".into(), "b".into(), "c".into(), "d".into(), "e".into(), "f".into()])
            .with_column(
                "price",
                DType::Float64,
                vec![12.5.into(), 3.0.into(), f64::NAN.into(), 40.0.into(), 7.25.into(), 3.0.into()],
            )
            .unwrap()
            .with_column(
                "qty",
                DType::Int64,
                vec![1.0.into(), 9.0.into(), 4.0.into(), 2.0.into(), 9.0.into(), 5.0.into()],
            )
            .unwrap()
            .with_column(
                "name",
                DType::Object,
                vec!["pear".into(), "fig".into(), "kiwi".into(), CellValue::Empty, "lime".into(), "date".into()],
            )
            .unwrap()
            .with_column(
                "ok",
                DType::Bool,
                vec![true.into(), false.into(), true.into(), true.into(), false.into(), true.into()],
            )
            .unwrap();
        TestHarness::new(table)
    }

    pub fn context(&self) -> TableViewContext {
        TableViewContext::new(
            Rc::clone(&self.table),
            Box::new(self.registry.clone()),
            &self.filter,
            self.config.clone(),
        )
        .unwrap()
    }
}

/// An apply function whose colors depend on how often it was called.
/// Returns the function and its invocation counter.
pub fn invocation_dependent_style() -> (StyleCallable, Rc<Cell<usize>>) {
    let calls = Rc::new(Cell::new(0usize));
    let counter = Rc::clone(&calls);
    let func = StyleCallable::apply("per_call_color", move |data, _| {
        counter.set(counter.get() + 1);
        let css = format!("background-color: #{:06x}", counter.get() * 4099);
        Ok(match data {
            StyleData::Series(series) => StyleOutput::Series(vec![css; series.len()]),
            StyleData::Frame(frame) => {
                let (rows, cols) = frame.shape();
                StyleOutput::Frame(vec![vec![css; cols]; rows])
            }
        })
    });
    (func, calls)
}

/// Per-cell style that only looks at the value itself.
pub fn negative_in_red() -> StyleCallable {
    StyleCallable::map("negative_in_red", |value, _| {
        Ok(match value.as_number() {
            Some(n) if n < 0.0 => "color: red".to_string(),
            _ => String::new(),
        })
    })
}
