use bytes::Bytes;
use polars::prelude::*;
use std::io::Cursor;

use crate::error::AppError;
use crate::models::DatasetFormat;

/// Parses an uploaded file into a dataframe.
///
/// The size guard runs before any parsing. CSV input must be UTF-8 and
/// carries its column names in the header row. JSON input must be a
/// top-level array of flat row objects; the column-map orientation is
/// rejected rather than auto-detected.
pub fn load(bytes: &Bytes, format: DatasetFormat, max_bytes: usize) -> Result<DataFrame, AppError> {
    if bytes.len() > max_bytes {
        return Err(AppError::SizeLimitExceeded(format!(
            "file size {} bytes exceeds the {} MiB upload limit",
            bytes.len(),
            max_bytes / (1024 * 1024)
        )));
    }

    if bytes.is_empty() {
        return Err(AppError::EmptyInput("the uploaded file is empty".to_string()));
    }

    let df = match format {
        DatasetFormat::Csv => read_csv(bytes)?,
        DatasetFormat::Json => read_json(bytes)?,
    };

    if df.height() == 0 || df.width() == 0 {
        return Err(AppError::EmptyInput(
            "the uploaded file contains no data rows".to_string(),
        ));
    }

    Ok(df)
}

fn read_csv(bytes: &[u8]) -> Result<DataFrame, AppError> {
    // Reject binary payloads up front so the user gets an encoding message
    // instead of a parser one.
    std::str::from_utf8(bytes).map_err(|_| {
        AppError::Decode("could not decode the file; CSV uploads must be UTF-8 encoded".to_string())
    })?;

    CsvReader::new(Cursor::new(bytes))
        .has_header(true)
        .finish()
        .map_err(|e| AppError::MalformedCsv(format!("could not parse the CSV file: {}", e)))
}

fn read_json(bytes: &[u8]) -> Result<DataFrame, AppError> {
    let value: serde_json::Value = serde_json::from_slice(bytes)
        .map_err(|e| AppError::MalformedJson(format!("invalid JSON: {}", e)))?;

    let rows = value.as_array().ok_or_else(|| {
        AppError::MalformedJson(
            "expected a top-level JSON array of row objects, one object per row".to_string(),
        )
    })?;

    if rows.is_empty() {
        return Err(AppError::EmptyInput(
            "the uploaded JSON array contains no rows".to_string(),
        ));
    }

    if !rows.iter().all(|row| row.is_object()) {
        return Err(AppError::MalformedJson(
            "every element of the JSON array must be an object mapping column names to values"
                .to_string(),
        ));
    }

    JsonReader::new(Cursor::new(bytes))
        .finish()
        .map_err(|e| AppError::MalformedJson(format!("could not build a table from the JSON: {}", e)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::MAX_UPLOAD_BYTES;

    fn load_csv(bytes: &'static [u8]) -> Result<DataFrame, AppError> {
        load(&Bytes::from_static(bytes), DatasetFormat::Csv, MAX_UPLOAD_BYTES)
    }

    fn load_json(bytes: &'static [u8]) -> Result<DataFrame, AppError> {
        load(&Bytes::from_static(bytes), DatasetFormat::Json, MAX_UPLOAD_BYTES)
    }

    #[test]
    fn loads_csv_with_header_row() {
        let df = load_csv(b"name,age\nalice,30\nbob,41\n").unwrap();
        assert_eq!(df.shape(), (2, 2));
        assert_eq!(df.get_column_names(), vec!["name", "age"]);
    }

    #[test]
    fn loads_json_array_of_objects() {
        let df = load_json(br#"[{"a":1,"b":"x"},{"a":2,"b":"y"}]"#).unwrap();
        assert_eq!(df.shape(), (2, 2));
    }

    #[test]
    fn oversize_payload_is_rejected_before_parsing() {
        // A limit smaller than the payload stands in for the 200 MiB cap.
        let result = load(&Bytes::from_static(b"a,b\n1,2\n"), DatasetFormat::Csv, 4);
        assert!(matches!(result, Err(AppError::SizeLimitExceeded(_))));
    }

    #[test]
    fn empty_payload_is_empty_input() {
        assert!(matches!(load_csv(b""), Err(AppError::EmptyInput(_))));
        assert!(matches!(load_json(b""), Err(AppError::EmptyInput(_))));
    }

    #[test]
    fn header_only_csv_is_empty_input() {
        assert!(matches!(load_csv(b"a,b\n"), Err(AppError::EmptyInput(_))));
    }

    #[test]
    fn non_utf8_csv_is_a_decode_error() {
        let result = load(
            &Bytes::from_static(&[0xff, 0xfe, 0x00, 0x41]),
            DatasetFormat::Csv,
            MAX_UPLOAD_BYTES,
        );
        assert!(matches!(result, Err(AppError::Decode(_))));
    }

    #[test]
    fn ragged_csv_is_malformed() {
        let result = load_csv(b"a,b\n1,2,3\n");
        assert!(matches!(result, Err(AppError::MalformedCsv(_))));
    }

    #[test]
    fn invalid_json_syntax_is_malformed() {
        assert!(matches!(
            load_json(br#"[{"a":1"#),
            Err(AppError::MalformedJson(_))
        ));
    }

    #[test]
    fn column_map_json_is_rejected() {
        assert!(matches!(
            load_json(br#"{"a":[1,2],"b":["x","y"]}"#),
            Err(AppError::MalformedJson(_))
        ));
    }

    #[test]
    fn json_array_of_scalars_is_rejected() {
        assert!(matches!(
            load_json(br#"[1,2,3]"#),
            Err(AppError::MalformedJson(_))
        ));
    }

    #[test]
    fn empty_json_array_is_empty_input() {
        assert!(matches!(load_json(b"[]"), Err(AppError::EmptyInput(_))));
    }
}
