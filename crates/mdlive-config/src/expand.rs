//! `${VAR}` and `${VAR:-default}` expansion for configuration strings.

use crate::ConfigError;

/// Expand environment variable references in `value`.
///
/// Strings without a `${` reference are returned unchanged.
pub(crate) fn expand_env(value: &str, field: &str) -> Result<String, ConfigError> {
    if !value.contains("${") {
        return Ok(value.to_owned());
    }

    shellexpand::env_with_context(value, |var| std::env::var(var).map(Some))
        .map(std::borrow::Cow::into_owned)
        .map_err(|e| ConfigError::EnvVar {
            field: field.to_owned(),
            message: format!("${{{}}} not set", e.var_name),
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_no_reference_unchanged() {
        assert_eq!(
            expand_env("https://kroki.io/$path", "f").unwrap(),
            "https://kroki.io/$path"
        );
    }

    #[test]
    fn test_expand_set_var() {
        // SAFETY: the variable name is unique to this test
        unsafe {
            std::env::set_var("MDLIVE_TEST_EXPAND_SET", "kroki.internal");
        }
        let result = expand_env("https://${MDLIVE_TEST_EXPAND_SET}:8000", "f").unwrap();
        assert_eq!(result, "https://kroki.internal:8000");
        unsafe {
            std::env::remove_var("MDLIVE_TEST_EXPAND_SET");
        }
    }

    #[test]
    fn test_default_used_when_unset() {
        let result = expand_env("${MDLIVE_TEST_EXPAND_UNSET:-http://localhost}", "f").unwrap();
        assert_eq!(result, "http://localhost");
    }

    #[test]
    fn test_unset_without_default_fails() {
        let err = expand_env("${MDLIVE_TEST_EXPAND_MISSING}", "diagrams.kroki_url").unwrap_err();
        assert_eq!(
            err.to_string(),
            "Environment variable error in diagrams.kroki_url: ${MDLIVE_TEST_EXPAND_MISSING} not set"
        );
    }
}
