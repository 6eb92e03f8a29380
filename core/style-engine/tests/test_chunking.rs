//! FILENAME: tests/test_chunking.rs
//! Chunked computation yields the same records as whole-region computation.

mod common;

use common::{negative_in_red, TestHarness};
use style_engine::{
    builtins, AggregateCache, Axis, ChunkDataGenerator, DisplayFormatter, EngineConfig,
    FilterCriteria, GeneratorContext, KwValue, MetaComputer, Region, StyleCallable, StyleData,
    StyleOutput, StylingDirectiveRegistry, Subset, TableFrameCell, TableFrameGenerator,
    TableViewContext, Todo, TodoPatcher, ValidationStrategyType, VirtualTableView,
    CHUNK_PARENT_PARAM,
};

fn chunk_safe_harness() -> TestHarness {
    let mut harness = TestHarness::with_sample_data();
    harness
        .registry
        .register(Todo::apply(builtins::highlight_max(), Some(Axis::Index)));
    harness.registry.register(
        Todo::apply(builtins::highlight_min(), None)
            .builder()
            .with_subset(Subset::columns(vec![0, 1]))
            .build(),
    );
    harness.registry.register(
        Todo::apply(builtins::background_gradient(), Some(Axis::Index))
            .builder()
            .with_subset(Subset::columns(vec![1]))
            .with_kwarg("cmap", KwValue::Text("viridis".into()))
            .build(),
    );
    harness
        .registry
        .register(Todo::apply(builtins::highlight_null(), None));
    harness.registry.register(Todo::map(negative_in_red()));
    harness
}

/// Frame of the whole view, generated both ways for many chunk sizes.
#[test]
fn test_combining_chunks_equals_generate() {
    let harness = chunk_safe_harness();
    let view = VirtualTableView::new(
        harness.table.clone(),
        &FilterCriteria::default(),
        &harness.registry.visibility(),
    );
    let patchers: Vec<TodoPatcher> = harness
        .registry
        .list_directives()
        .into_iter()
        .enumerate()
        .map(|(i, todo)| TodoPatcher::new(i, todo, harness.table.as_ref()))
        .collect();
    let aggregates = AggregateCache::new();
    let meta = MetaComputer::new(harness.table.clone());
    let config = EngineConfig::default();
    let ctx = GeneratorContext {
        view: &view,
        patchers: &patchers,
        aggregates: &aggregates,
        meta: &meta,
        formatter: &DisplayFormatter,
        config: &config,
    };
    let frames = TableFrameGenerator::new(ctx);
    let chunks = ChunkDataGenerator::new(ctx);

    let regions = [
        Region::with_shape(6, 4),
        Region::new(1, 1, 4, 2),
        Region::new(5, 3, 1, 1),
        Region::new(2, 0, 100, 100),
    ];
    for region in regions {
        let whole = frames.generate(&region).unwrap();
        let whole_chunk = chunks.generate(&region, true).unwrap();
        for (p, q) in [(1, 1), (1, 3), (2, 2), (4, 1), (6, 4), (7, 9)] {
            assert_eq!(
                frames.generate_by_combining_chunks(p, q, &region).unwrap(),
                whole,
                "region {:?} chunk {}x{}",
                region,
                p,
                q
            );
            assert_eq!(
                chunks.generate_by_combining_chunks(p, q, &region, true).unwrap(),
                whole_chunk
            );
        }
    }
}

#[test]
fn test_chunked_gradient_matches_full_column() {
    let harness = chunk_safe_harness();
    let ctx = harness.context();
    let full = ctx.compute_chunk(&Region::with_shape(6, 4), false).unwrap();
    for row in 0..6 {
        let single = ctx.compute_chunk(&Region::new(row, 1, 1, 1), false).unwrap();
        assert_eq!(single.cells[0][0], full.cells[row][1]);
    }
}

#[test]
fn test_sorted_view_keeps_source_aggregates() {
    let harness = chunk_safe_harness();
    let mut ctx = harness.context();
    let before = ctx.compute_chunk(&Region::with_shape(6, 4), true).unwrap();
    ctx.set_sort_criteria(&[1], &[false]).unwrap();
    let after = ctx.compute_chunk(&Region::with_shape(6, 4), true).unwrap();

    let labels_before = before.index_labels.unwrap();
    let labels_after = after.index_labels.unwrap();
    for (visible, label) in labels_after.iter().enumerate() {
        let original = labels_before.iter().position(|l| l == label).unwrap();
        assert_eq!(after.cells[visible], before.cells[original], "row {}", label);
    }
}

#[test]
fn test_chunk_parent_function_is_chunk_safe() {
    let mut harness = TestHarness::with_grid(8, 3);
    let share_of_column_total = StyleCallable::apply("share_of_total", |data, kwargs| {
        let (StyleData::Series(series), Some(KwValue::Series(parent))) = (data, kwargs.get(CHUNK_PARENT_PARAM)) else {
            return Ok(StyleOutput::Series(Vec::new()));
        };
        let total: f64 = parent.numbers().sum();
        Ok(StyleOutput::Series(
            series
                .numbers()
                .map(|n| {
                    if n / total > 0.2 {
                        "font-weight: bold".to_string()
                    } else {
                        String::new()
                    }
                })
                .collect(),
        ))
    })
    .with_params(&[CHUNK_PARENT_PARAM]);
    harness
        .registry
        .register(Todo::apply(share_of_column_total, Some(Axis::Index)));
    let ctx = harness.context();

    let info = ctx.get_style_function_info().unwrap();
    assert!(info[0].is_chunk_parent_requested);

    let whole = ctx.compute_chunk(&Region::with_shape(8, 3), false).unwrap();
    let chunked = stitch_chunks(&ctx, 3, 2);
    assert_eq!(chunked, whole.cells);
    assert!(whole.cells[7][0].css.is_some());
    assert!(whole.cells[0][0].css.is_none());

    let problems = harness
        .context()
        .validate_style_functions(&Region::with_shape(8, 3), ValidationStrategyType::Precision)
        .unwrap();
    assert!(problems.is_empty());
}

/// Stitches cells from individual `compute_chunk` calls, the way the viewer
/// fetches a large table.
fn stitch_chunks(ctx: &TableViewContext, rows_per_chunk: usize, cols_per_chunk: usize) -> Vec<Vec<TableFrameCell>> {
    let region = ctx.view().region();
    let mut cells = vec![Vec::new(); region.rows];
    for chunk in region.iterate_chunkwise(rows_per_chunk, cols_per_chunk).unwrap() {
        let data = ctx.compute_chunk(&chunk, false).unwrap();
        for (i, row) in data.cells.into_iter().enumerate() {
            cells[chunk.first_row + i].extend(row);
        }
    }
    cells
}
