//! Environment variable utilities
//!
//! Provides helpers for reading configuration overrides from the environment.

/// Get environment variable as Option
///
/// Returns `Some(value)` if set to a non-blank value, `None` otherwise.
pub fn env_opt(key: &str) -> Option<String> {
    std::env::var(key).ok().filter(|v| !v.trim().is_empty())
}

/// Get environment variable as integer
///
/// Returns `Some(value)` if set and parseable, `None` otherwise.
pub fn env_int<T>(key: &str) -> Option<T>
where
    T: std::str::FromStr,
{
    env_opt(key)?.trim().parse().ok()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;

    #[test]
    #[serial]
    fn test_env_opt_blank_is_none() {
        std::env::set_var("CONSUMER_SUPERVISOR_TEST_BLANK", "  ");
        assert_eq!(env_opt("CONSUMER_SUPERVISOR_TEST_BLANK"), None);
        std::env::remove_var("CONSUMER_SUPERVISOR_TEST_BLANK");
        assert_eq!(env_opt("CONSUMER_SUPERVISOR_TEST_BLANK"), None);
    }

    #[test]
    #[serial]
    fn test_env_int() {
        std::env::set_var("CONSUMER_SUPERVISOR_TEST_INT", " 42 ");
        assert_eq!(env_int::<u64>("CONSUMER_SUPERVISOR_TEST_INT"), Some(42));
        std::env::set_var("CONSUMER_SUPERVISOR_TEST_INT", "x");
        assert_eq!(env_int::<u64>("CONSUMER_SUPERVISOR_TEST_INT"), None);
        std::env::remove_var("CONSUMER_SUPERVISOR_TEST_INT");
    }
}
