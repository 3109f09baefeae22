//! Environment variable parsing helpers shared by service configuration.

use std::str::FromStr;

/// Parse `key`, falling back to `default` when missing or unparsable.
pub fn parse_env_with_default<T: FromStr>(key: &str, default: T) -> T {
    std::env::var(key)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}

/// Parse `key`. A missing variable falls back to `default`, but a present
/// value that does not parse is an error.
pub fn parse_env_strict<T: FromStr>(key: &str, default: T) -> Result<T, String>
where
    T::Err: std::fmt::Display,
{
    match std::env::var(key) {
        Ok(val) => val
            .trim()
            .parse()
            .map_err(|e| format!("Failed to parse {}='{}': {}", key, val, e)),
        Err(_) => Ok(default),
    }
}

/// Read `key` as a string, treating blank values as missing.
pub fn env_string_or(key: &str, default: &str) -> String {
    std::env::var(key)
        .ok()
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
        .unwrap_or_else(|| default.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    #[serial_test::serial]
    fn test_parse_env_with_default() {
        let result: u32 = parse_env_with_default("YATUBE_TEST_MISSING_VAR", 42);
        assert_eq!(result, 42);

        std::env::set_var("YATUBE_TEST_PORT", "8080");
        let result: u16 = parse_env_with_default("YATUBE_TEST_PORT", 3000);
        assert_eq!(result, 8080);
        std::env::remove_var("YATUBE_TEST_PORT");
    }

    #[test]
    #[serial_test::serial]
    fn test_parse_env_strict_rejects_garbage() {
        std::env::set_var("YATUBE_TEST_STRICT", "ten");
        assert!(parse_env_strict::<u64>("YATUBE_TEST_STRICT", 10).is_err());
        std::env::remove_var("YATUBE_TEST_STRICT");

        assert_eq!(parse_env_strict::<u64>("YATUBE_TEST_STRICT", 10), Ok(10));
    }

    #[test]
    #[serial_test::serial]
    fn test_env_string_or_blank() {
        std::env::set_var("YATUBE_TEST_BLANK", "   ");
        assert_eq!(env_string_or("YATUBE_TEST_BLANK", "fallback"), "fallback");
        std::env::remove_var("YATUBE_TEST_BLANK");
    }
}
