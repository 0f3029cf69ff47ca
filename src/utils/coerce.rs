use serde_json::{Map, Number, Value};

/// Recursively converts stringified scalars into native JSON types.
///
/// `"true"`/`"false"` (any case) become booleans, `-?\d+` becomes an integer
/// and a plain decimal (`-1.5`, `.5`) becomes a float. Everything else,
/// including values that are already typed, is returned as-is.
pub fn coerce_json_types(value: Value) -> Value {
    match value {
        Value::String(text) => coerce_scalar(text),
        Value::Array(items) => Value::Array(items.into_iter().map(coerce_json_types).collect()),
        Value::Object(map) => Value::Object(coerce_map(map)),
        other => other,
    }
}

pub fn coerce_map(map: Map<String, Value>) -> Map<String, Value> {
    map.into_iter()
        .map(|(key, value)| (key, coerce_json_types(value)))
        .collect()
}

fn coerce_scalar(text: String) -> Value {
    if text.eq_ignore_ascii_case("true") {
        return Value::Bool(true);
    }
    if text.eq_ignore_ascii_case("false") {
        return Value::Bool(false);
    }
    if is_integer(&text) {
        if let Ok(parsed) = text.parse::<i64>() {
            return Value::Number(Number::from(parsed));
        }
        if let Ok(parsed) = text.parse::<u64>() {
            return Value::Number(Number::from(parsed));
        }
        return float_or_string(text);
    }
    if is_decimal(&text) {
        return float_or_string(text);
    }
    Value::String(text)
}

fn float_or_string(text: String) -> Value {
    match text.parse::<f64>().ok().and_then(Number::from_f64) {
        Some(number) => Value::Number(number),
        None => Value::String(text),
    }
}

fn is_integer(text: &str) -> bool {
    let digits = text.strip_prefix('-').unwrap_or(text);
    !digits.is_empty() && digits.bytes().all(|b| b.is_ascii_digit())
}

fn is_decimal(text: &str) -> bool {
    let body = text.strip_prefix('-').unwrap_or(text);
    let mut dots = 0;
    let mut digits = 0;
    for b in body.bytes() {
        match b {
            b'.' => dots += 1,
            b'0'..=b'9' => digits += 1,
            _ => return false,
        }
    }
    digits > 0 && dots <= 1
}
