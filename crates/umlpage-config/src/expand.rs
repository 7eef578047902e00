//! Environment variable expansion for configuration strings.

use crate::ConfigError;

/// Expand environment variable references in a string.
///
/// Supports:
/// - `${VAR}` - expands to the value of VAR, errors if unset
/// - `${VAR:-default}` - expands to VAR if set, otherwise uses default
///
/// Bare `$VAR` is left as-is.
pub(crate) fn expand_env(value: &str, field: &str) -> Result<String, ConfigError> {
    if !value.contains("${") {
        return Ok(value.to_owned());
    }

    shellexpand::env_with_context(value, |var| -> Result<Option<String>, LookupError> {
        std::env::var(var).map(Some).map_err(|_| LookupError {
            var_name: var.to_owned(),
        })
    })
    .map(std::borrow::Cow::into_owned)
    .map_err(|e| ConfigError::EnvVar {
        field: field.to_owned(),
        message: format!("${{{0}}} not set", e.cause.var_name),
    })
}

/// Error returned when environment variable lookup fails.
struct LookupError {
    var_name: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_expand_embedded_var() {
        // SAFETY: test runs single-threaded per test function
        unsafe {
            std::env::set_var("UMLPAGE_TEST_HOST", "kroki.internal");
        }
        let result = expand_env("https://${UMLPAGE_TEST_HOST}:8000", "kroki.url").unwrap();
        assert_eq!(result, "https://kroki.internal:8000");
        unsafe {
            std::env::remove_var("UMLPAGE_TEST_HOST");
        }
    }

    #[test]
    fn test_expand_with_default_uses_default() {
        // SAFETY: test runs single-threaded per test function
        unsafe {
            std::env::remove_var("UMLPAGE_UNSET_URL");
        }
        let result = expand_env("${UMLPAGE_UNSET_URL:-https://kroki.io}", "kroki.url").unwrap();
        assert_eq!(result, "https://kroki.io");
    }

    #[test]
    fn test_expand_missing_var_error() {
        // SAFETY: test runs single-threaded per test function
        unsafe {
            std::env::remove_var("UMLPAGE_MISSING_VAR");
        }
        let err = expand_env("${UMLPAGE_MISSING_VAR}", "kroki.url").unwrap_err();
        assert!(matches!(err, ConfigError::EnvVar { .. }));
        assert!(err.to_string().contains("UMLPAGE_MISSING_VAR"));
        assert!(err.to_string().contains("kroki.url"));
    }

    #[test]
    fn test_bare_dollar_not_expanded() {
        assert_eq!(
            expand_env("https://example.com/$path", "kroki.url").unwrap(),
            "https://example.com/$path"
        );
    }
}
