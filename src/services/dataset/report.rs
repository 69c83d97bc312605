use polars::prelude::*;
use std::collections::HashMap;

use super::cell_to_string;
use crate::error::AppError;
use crate::models::ColumnReport;

const TOP_VALUES: usize = 10;

/// Computes the data-quality report for one column.
///
/// A single pass in row order builds a frequency table keyed by the value's
/// rendered form, so `distinct_count` is the table size and every non-null
/// occurrence beyond the first of a value counts as a duplicate. The input
/// dataframe is never mutated.
pub fn generate_report(df: &DataFrame, column_name: &str) -> Result<ColumnReport, AppError> {
    let series = df.column(column_name).map_err(|_| {
        AppError::ColumnNotFound(format!("column '{}' not found in the dataset", column_name))
    })?;

    let total_rows = series.len();
    let null_count = series.null_count();
    let non_null_count = total_rows - null_count;

    // Frequency table in first-seen order. Ties in the ranking below keep
    // this order, which makes the top list deterministic for a given input.
    let mut frequencies: Vec<(String, usize)> = Vec::new();
    let mut slots: HashMap<String, usize> = HashMap::new();

    for idx in 0..total_rows {
        let value = series.get(idx)?;
        if matches!(value, AnyValue::Null) {
            continue;
        }
        let key = cell_to_string(&value);
        match slots.get(&key) {
            Some(&slot) => frequencies[slot].1 += 1,
            None => {
                slots.insert(key.clone(), frequencies.len());
                frequencies.push((key, 1));
            }
        }
    }

    let distinct_count = frequencies.len();
    let duplicate_count = non_null_count - distinct_count;

    let mut ranked = frequencies;
    ranked.sort_by(|a, b| b.1.cmp(&a.1));
    let top_values = ranked
        .into_iter()
        .take(TOP_VALUES)
        .map(|(value, _)| value)
        .collect();

    Ok(ColumnReport {
        column_name: column_name.to_string(),
        total_rows,
        null_count,
        null_percentage: percentage(null_count, total_rows),
        duplicate_count,
        duplicate_percentage: percentage(duplicate_count, non_null_count),
        distinct_count,
        data_type: series.dtype().to_string(),
        top_values,
        generated_at: ColumnReport::now_timestamp(),
    })
}

/// Percentage rounded to two decimals; defined as 0 when the base is empty.
fn percentage(part: usize, whole: usize) -> f64 {
    if whole == 0 {
        return 0.0;
    }
    let raw = part as f64 / whole as f64 * 100.0;
    (raw * 100.0).round() / 100.0
}
