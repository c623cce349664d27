// Environment variable overrides

use crate::{ConfigError, Result};
use std::env;

/// Default prefix for rolewatch environment variables
pub const ENV_PREFIX: &str = "ROLEWATCH";

/// Reads prefixed environment variables, e.g. `ROLEWATCH_HOME` for key `home`.
pub struct EnvLoader {
    prefix: Option<String>,
}

impl EnvLoader {
    /// Create a new environment loader
    pub fn new(prefix: Option<String>) -> Self {
        Self { prefix }
    }

    /// Full variable name for `key`
    pub fn var_name(&self, key: &str) -> String {
        match self.prefix {
            Some(ref prefix) => format!("{}_{}", prefix, key.to_uppercase()),
            None => key.to_uppercase(),
        }
    }

    /// Read a variable, treating unset and blank values alike
    pub fn var(&self, key: &str) -> Option<String> {
        env::var(self.var_name(key))
            .ok()
            .map(|v| v.trim().to_string())
            .filter(|v| !v.is_empty())
    }

    /// Read a variable with a default value
    pub fn var_or(&self, key: &str, default: &str) -> String {
        self.var(key).unwrap_or_else(|| default.to_string())
    }

    /// Read a boolean variable (`true/false`, `1/0`, `yes/no`, `on/off`)
    pub fn bool_var(&self, key: &str) -> Result<Option<bool>> {
        let Some(value) = self.var(key) else {
            return Ok(None);
        };

        parse_bool(&value)
            .map(Some)
            .ok_or_else(|| ConfigError::InvalidEnvValue {
                key: self.var_name(key),
                value,
            })
    }
}

impl Default for EnvLoader {
    fn default() -> Self {
        Self::new(Some(ENV_PREFIX.to_string()))
    }
}

fn parse_bool(value: &str) -> Option<bool> {
    match value.to_lowercase().as_str() {
        "true" | "1" | "yes" | "on" => Some(true),
        "false" | "0" | "no" | "off" => Some(false),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // std::env::set_var is unsafe in edition 2024; these tests stay on
    // variables that are never set.

    #[test]
    fn test_var_name() {
        let loader = EnvLoader::default();
        assert_eq!(loader.var_name("role_log_file"), "ROLEWATCH_ROLE_LOG_FILE");

        let bare = EnvLoader::new(None);
        assert_eq!(bare.var_name("home"), "HOME");
    }

    #[test]
    fn test_missing_var_uses_default() {
        let loader = EnvLoader::new(Some("ROLEWATCH_UNIT_TEST".to_string()));
        assert!(loader.var("MISSING_VAR_67890").is_none());
        assert_eq!(loader.var_or("MISSING_VAR_67890", "default"), "default");
        assert_eq!(loader.bool_var("MISSING_VAR_67890").unwrap(), None);
    }

    #[test]
    fn test_parse_bool() {
        assert_eq!(parse_bool("TRUE"), Some(true));
        assert_eq!(parse_bool("on"), Some(true));
        assert_eq!(parse_bool("0"), Some(false));
        assert_eq!(parse_bool("maybe"), None);
    }
}
