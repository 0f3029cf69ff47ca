use serde_json::{Map, Value};

use crate::errors::ToolError;

/// String form of a scalar argument. Numbers and booleans are accepted for
/// callers that send ids unquoted.
pub fn scalar_as_string(value: &Value) -> Option<String> {
    match value {
        Value::String(text) => Some(text.clone()),
        Value::Number(number) => Some(number.to_string()),
        Value::Bool(flag) => Some(flag.to_string()),
        _ => None,
    }
}

pub fn optional_string(args: &Map<String, Value>, key: &str) -> Result<Option<String>, ToolError> {
    match args.get(key) {
        None | Some(Value::Null) => Ok(None),
        Some(value) => scalar_as_string(value)
            .map(|text| Some(text.trim().to_string()).filter(|t| !t.is_empty()))
            .ok_or_else(|| ToolError::invalid_params(format!("{} must be a string", key))),
    }
}

pub fn required_string(args: &Map<String, Value>, key: &str) -> Result<String, ToolError> {
    optional_string(args, key)?
        .ok_or_else(|| ToolError::invalid_params(format!("{} is required", key)))
}

/// `.` and `..`, also when spelled with `%2e`. URL resolution collapses them
/// into the parent path.
fn is_dot_segment(value: &str) -> bool {
    let decoded = value.to_ascii_lowercase().replace("%2e", ".");
    decoded == "." || decoded == ".."
}

/// A value safe to substitute into a single URL path segment.
pub fn path_segment(key: &str, value: &str) -> Result<String, ToolError> {
    if value.is_empty() || value.contains(['/', '?', '#']) || is_dot_segment(value) {
        return Err(ToolError::invalid_params(format!(
            "{} must be a single path segment, got '{}'",
            key, value
        )));
    }
    Ok(value.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn map(value: Value) -> Map<String, Value> {
        value.as_object().cloned().unwrap()
    }

    #[test]
    fn required_string_rejects_missing_and_blank() {
        let args = map(json!({"profile_id": "  ", "n": 5}));
        assert!(required_string(&args, "profile_id").is_err());
        assert!(required_string(&args, "other").is_err());
        assert_eq!(required_string(&args, "n").unwrap(), "5");
    }

    #[test]
    fn optional_string_rejects_structures() {
        let args = map(json!({"record_type": ["A"]}));
        assert!(optional_string(&args, "record_type").is_err());
        assert_eq!(optional_string(&map(json!({})), "record_type").unwrap(), None);
    }

    #[test]
    fn path_segment_rejects_separators() {
        assert!(path_segment("profile_id", "abc/../x").is_err());
        assert!(path_segment("profile_id", "abc?x").is_err());
        assert_eq!(path_segment("profile_id", "abc123").unwrap(), "abc123");
    }

    #[test]
    fn path_segment_rejects_dot_segments_in_any_spelling() {
        for raw in [".", "..", "%2e", "%2e%2e", "%2E%2e", ".%2e", "%2E."] {
            assert!(path_segment("entry_id", raw).is_err(), "{raw}");
        }
        for raw in ["...", "a.com", "%2e%2ex", "*.example.com"] {
            assert!(path_segment("entry_id", raw).is_ok(), "{raw}");
        }
    }
}
