//! Operation label derivation.

pub const UNKNOWN_OPERATION: &str = "UNKNOWN";

/// First whitespace-delimited token of a statement, upper-cased.
///
/// Missing or blank statements yield `UNKNOWN`.
pub fn operation_label(statement: Option<&str>) -> String {
    statement
        .and_then(|s| s.split_whitespace().next())
        .map(str::to_uppercase)
        .unwrap_or_else(|| UNKNOWN_OPERATION.to_string())
}
