pub fn is_truthy(value: impl AsRef<str>) -> bool {
    matches!(
        value.as_ref().trim().to_lowercase().as_str(),
        "1" | "true" | "yes" | "on"
    )
}

/// Reads a flag through `lookup`; absent means off.
pub fn is_flag_enabled(lookup: impl Fn(&str) -> Option<String>, key: &str) -> bool {
    lookup(key).map(is_truthy).unwrap_or(false)
}
