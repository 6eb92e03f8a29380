//! FILENAME: core/style-engine/src/describe.rs
//! PURPOSE: Descriptive statistics for a single column.
//! CONTEXT: Shown by the viewer in column header tooltips. Numeric columns get
//! count/mean/std/min/quartiles/max, all other columns count/unique/top/freq.

use rustc_hash::FxHashMap;

use crate::value::{CellValue, DType};

/// Ordered (statistic, value) pairs.
pub type ColumnDescription = Vec<(String, String)>;

pub fn describe_column(dtype: DType, values: &[CellValue]) -> ColumnDescription {
    if dtype.is_numeric() {
        describe_numeric(values)
    } else {
        describe_categorical(values)
    }
}

fn describe_numeric(values: &[CellValue]) -> ColumnDescription {
    let mut numbers: Vec<f64> = values.iter().filter_map(|v| v.as_number()).collect();
    numbers.sort_by(|a, b| a.total_cmp(b));

    let count = numbers.len();
    let mut stats = vec![("count".to_string(), count.to_string())];
    if count == 0 {
        for key in ["mean", "std", "min", "25%", "50%", "75%", "max"] {
            stats.push((key.to_string(), "nan".to_string()));
        }
        return stats;
    }

    let mean = numbers.iter().sum::<f64>() / count as f64;
    let std = if count > 1 {
        let var = numbers.iter().map(|n| (n - mean).powi(2)).sum::<f64>() / (count - 1) as f64;
        var.sqrt()
    } else {
        f64::NAN
    };

    stats.push(("mean".to_string(), format_stat(mean)));
    stats.push(("std".to_string(), format_stat(std)));
    stats.push(("min".to_string(), format_stat(numbers[0])));
    stats.push(("25%".to_string(), format_stat(quantile(&numbers, 0.25))));
    stats.push(("50%".to_string(), format_stat(quantile(&numbers, 0.5))));
    stats.push(("75%".to_string(), format_stat(quantile(&numbers, 0.75))));
    stats.push(("max".to_string(), format_stat(numbers[count - 1])));
    stats
}

fn describe_categorical(values: &[CellValue]) -> ColumnDescription {
    let present: Vec<String> = values
        .iter()
        .filter(|v| !v.is_missing())
        .map(|v| v.display_value())
        .collect();

    let mut frequencies: FxHashMap<&str, usize> = FxHashMap::default();
    // (first index, value) so ties resolve to the earliest occurrence
    let mut top: Option<(&str, usize)> = None;
    for value in &present {
        let freq = frequencies.entry(value.as_str()).or_insert(0);
        *freq += 1;
        match top {
            Some((_, best)) if best >= *freq => {}
            _ => top = Some((value.as_str(), *freq)),
        }
    }

    let mut stats = vec![
        ("count".to_string(), present.len().to_string()),
        ("unique".to_string(), frequencies.len().to_string()),
    ];
    if let Some((value, freq)) = top {
        stats.push(("top".to_string(), value.to_string()));
        stats.push(("freq".to_string(), freq.to_string()));
    }
    stats
}

/// Linear interpolation between closest ranks. `sorted` must not be empty.
pub(crate) fn quantile(sorted: &[f64], q: f64) -> f64 {
    let pos = q * (sorted.len() - 1) as f64;
    let lower = pos.floor() as usize;
    let upper = pos.ceil() as usize;
    let weight = pos - lower as f64;
    sorted[lower] + (sorted[upper] - sorted[lower]) * weight
}

fn format_stat(value: f64) -> String {
    if value.is_nan() {
        return "nan".to_string();
    }
    let formatted = format!("{:.6}", value);
    let trimmed = formatted.trim_end_matches('0').trim_end_matches('.');
    trimmed.to_string()
}
