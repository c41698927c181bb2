/// Get environment variable with FAILSOFT_ prefix, falling back to unprefixed version
///
/// This helper function checks for `FAILSOFT_{key}` first, then falls back to `{key}`
/// so the conventional names (`REDIS_URL`, `SENTRY_DSN`, ...) keep working.
///
/// # Examples
///
/// ```rust
/// use failsoft::utils::get_env_with_prefix;
///
/// // Checks FAILSOFT_REDIS_URL first, then REDIS_URL
/// let url = get_env_with_prefix("REDIS_URL");
/// ```
pub fn get_env_with_prefix(key: &str) -> Option<String> {
    std::env::var(format!("FAILSOFT_{}", key))
        .or_else(|_| std::env::var(key))
        .ok()
}

/// Interpret an enable flag. Only `true` (any case) switches a backend on.
pub fn parse_flag(value: &str) -> bool {
    value.trim().eq_ignore_ascii_case("true")
}

/// Treat empty values as unset.
pub(crate) fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}
