use polars::prelude::*;
use smallvec::SmallVec;

use super::cell_to_string;
use crate::error::AppError;

pub const SAMPLE_SIZE: usize = 3;
const PREVIEW_ROWS: usize = 5;

#[derive(Debug)]
pub struct ColumnSummary {
    pub name: String,
    pub data_type: String,
    pub sample_values: SmallVec<[String; SAMPLE_SIZE]>,
}

#[derive(Debug)]
pub struct DatasetSummary {
    pub row_count: usize,
    pub column_count: usize,
    pub sample_rows: Vec<Vec<String>>,
    pub columns: Vec<ColumnSummary>,
}

/// Builds the upload preview: shape, the first few rows, and per-column
/// dtype labels with a handful of sample values.
pub fn summarize(df: &DataFrame) -> Result<DatasetSummary, AppError> {
    let row_count = df.height();
    let column_count = df.width();

    let mut columns = Vec::with_capacity(column_count);
    for series in df.get_columns() {
        let mut sample_values = SmallVec::new();
        for idx in 0..row_count.min(SAMPLE_SIZE) {
            sample_values.push(cell_to_string(&series.get(idx)?));
        }
        columns.push(ColumnSummary {
            name: series.name().to_string(),
            data_type: series.dtype().to_string(),
            sample_values,
        });
    }

    let mut sample_rows = Vec::with_capacity(row_count.min(PREVIEW_ROWS));
    for idx in 0..row_count.min(PREVIEW_ROWS) {
        let row = df
            .get_columns()
            .iter()
            .map(|series| series.get(idx).map(|value| cell_to_string(&value)))
            .collect::<Result<Vec<_>, _>>()?;
        sample_rows.push(row);
    }

    Ok(DatasetSummary {
        row_count,
        column_count,
        sample_rows,
        columns,
    })
}
