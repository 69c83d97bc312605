use chrono::Utc;
use polars::frame::DataFrame;
use serde::Serialize;
use std::str::FromStr;

use crate::error::AppError;

/// Declared format of an uploaded dataset file.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DatasetFormat {
    Csv,
    Json,
}

impl FromStr for DatasetFormat {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "csv" => Ok(DatasetFormat::Csv),
            "json" => Ok(DatasetFormat::Json),
            other => Err(AppError::InvalidInput(format!(
                "unsupported file type '{}'; only csv and json are accepted",
                other
            ))),
        }
    }
}

impl std::fmt::Display for DatasetFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            DatasetFormat::Csv => write!(f, "csv"),
            DatasetFormat::Json => write!(f, "json"),
        }
    }
}

/// Data-quality summary for one column of the current dataset.
///
/// Duplicate figures only consider non-null values; `top_values` is ranked
/// by frequency descending with ties kept in first-encountered row order.
#[derive(Debug, Clone, Serialize)]
pub struct ColumnReport {
    pub column_name: String,
    pub total_rows: usize,
    pub null_count: usize,
    pub null_percentage: f64,
    pub duplicate_count: usize,
    pub duplicate_percentage: f64,
    pub distinct_count: usize,
    pub data_type: String,
    pub top_values: Vec<String>,
    pub generated_at: String,
}

impl ColumnReport {
    pub fn now_timestamp() -> String {
        Utc::now().format("%Y-%m-%d %H:%M:%S UTC").to_string()
    }

    /// Renders the report in the fixed layout used for downloads.
    pub fn to_markdown(&self) -> String {
        let top_values = serde_json::to_string_pretty(&self.top_values)
            .unwrap_or_else(|_| "[]".to_string());

        format!(
            "# Data Quality Report for Column: {}\n\
             \n\
             - Total Rows: {}\n\
             - Null Values: {} ({:.2}%)\n\
             - Unique Values: {}\n\
             - Duplicate Values: {} ({:.2}%)\n\
             - Data Type: {}\n\
             \n\
             ## Top 10 Unique Values:\n\
             {}\n",
            self.column_name,
            self.total_rows,
            self.null_count,
            self.null_percentage,
            self.distinct_count,
            self.duplicate_count,
            self.duplicate_percentage,
            self.data_type,
            top_values,
        )
    }

    pub fn export_file_name(&self) -> String {
        format!("{}_data_quality_report.md", self.column_name)
    }
}

/// One mocked metadata match returned by the search endpoint.
#[derive(Debug, Clone, Serialize)]
pub struct SearchResult {
    pub table: String,
    pub columns: Vec<String>,
    pub description: String,
}

/// The dataset currently loaded for analysis. Replaced wholesale on upload.
pub struct LoadedDataset {
    pub format: DatasetFormat,
    pub frame: DataFrame,
}

/// Per-process interaction state, owned by the hosting layer and passed
/// into the core functions as plain arguments.
#[derive(Default)]
pub struct Session {
    pub dataset: Option<LoadedDataset>,
    pub last_report: Option<ColumnReport>,
    pub last_results: Vec<SearchResult>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn dataset_format_parses_known_extensions() {
        assert_eq!("csv".parse::<DatasetFormat>().unwrap(), DatasetFormat::Csv);
        assert_eq!("JSON".parse::<DatasetFormat>().unwrap(), DatasetFormat::Json);
        assert!(matches!(
            "xlsx".parse::<DatasetFormat>(),
            Err(AppError::InvalidInput(_))
        ));
    }

    #[test]
    fn markdown_report_uses_fixed_layout() {
        let report = ColumnReport {
            column_name: "email".to_string(),
            total_rows: 4,
            null_count: 1,
            null_percentage: 25.0,
            duplicate_count: 1,
            duplicate_percentage: 33.33,
            distinct_count: 2,
            data_type: "str".to_string(),
            top_values: vec!["a@x.io".to_string(), "b@x.io".to_string()],
            generated_at: ColumnReport::now_timestamp(),
        };

        let markdown = report.to_markdown();
        assert!(markdown.starts_with("# Data Quality Report for Column: email\n"));
        assert!(markdown.contains("- Total Rows: 4\n"));
        assert!(markdown.contains("- Null Values: 1 (25.00%)\n"));
        assert!(markdown.contains("- Duplicate Values: 1 (33.33%)\n"));
        assert!(markdown.contains("- Unique Values: 2\n"));
        assert!(markdown.contains("- Data Type: str\n"));
        assert!(markdown.contains("## Top 10 Unique Values:\n"));
        assert!(markdown.contains("\"a@x.io\""));

        assert_eq!(report.export_file_name(), "email_data_quality_report.md");
    }
}
