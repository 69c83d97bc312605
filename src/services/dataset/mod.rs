pub mod loader;
pub mod preview;
pub mod report;

use polars::prelude::AnyValue;

/// Renders a cell the way it is shown to users: nulls become the empty
/// string, strings are unquoted, everything else uses its display form.
pub(crate) fn cell_to_string(value: &AnyValue) -> String {
    match value {
        AnyValue::Null => String::new(),
        AnyValue::String(s) => (*s).to_string(),
        AnyValue::StringOwned(s) => s.to_string(),
        other => other.to_string(),
    }
}
