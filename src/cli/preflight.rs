//! Pre-flight checks before calling hosted APIs.
//!
//! Validates that credentials are available before starting a pipeline
//! that would otherwise fail on its first request.

use crate::config::ModelSettings;
use crate::error::{QuillError, Result};

/// Check that the provider API key is configured.
pub fn check(model: &ModelSettings) -> Result<()> {
    check_api_key(model.provider.api_key_env())
}

fn check_api_key(var: &str) -> Result<()> {
    match std::env::var(var) {
        Ok(key) if !key.trim().is_empty() => Ok(()),
        Ok(_) => Err(QuillError::Config(format!(
            "{} is empty. Set it in your environment or a .env file.",
            var
        ))),
        Err(_) => Err(QuillError::Config(format!(
            "{} not set. Set it in your environment or a .env file.",
            var
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_key() {
        let err = check_api_key("QUILL_TEST_KEY_THAT_IS_NEVER_SET").unwrap_err();
        assert!(err.to_string().contains("QUILL_TEST_KEY_THAT_IS_NEVER_SET not set"));
    }
}
