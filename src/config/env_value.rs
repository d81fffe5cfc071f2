// ABOUTME: Environment variable lookup for health check settings.
// ABOUTME: Treats empty values as unset and parses permissive booleans.

/// Read an environment variable, returning `None` when it is unset,
/// empty or not valid unicode.
pub fn env_string(var: &str) -> Option<String> {
    std::env::var(var).ok().filter(|v| !v.is_empty())
}

/// Read a boolean environment variable. `None` when unset or empty.
pub fn env_bool(var: &str) -> Option<bool> {
    env_string(var).map(|v| parse_bool(&v))
}

/// `"true"` and `"1"` (case-insensitive, surrounding whitespace ignored)
/// are true; everything else is false.
pub fn parse_bool(value: &str) -> bool {
    let value = value.trim();
    value.eq_ignore_ascii_case("true") || value == "1"
}
