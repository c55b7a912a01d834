//! Required-parameter resolution.
//!
//! Credentials and endpoint identifiers come from the environment, but they
//! are read exactly once at suite start through an injected
//! [`ParameterSource`] and carried as a value type from then on. A missing or
//! empty value for any required name is fatal for the whole suite, and the
//! error names every gap at once so a single failed run surfaces them all.

use std::collections::BTreeMap;
use std::env;
use thiserror::Error;

/// Errors from parameter resolution.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ParamError {
    /// One or more required parameters are absent or empty.
    #[error("missing required configuration: {}", keys.join(", "))]
    MissingConfiguration {
        /// All missing names, sorted.
        keys: Vec<String>,
    },
}

/// A read-only source of named string values.
pub trait ParameterSource: Send + Sync {
    /// Returns the value for `name`, if present.
    fn get(&self, name: &str) -> Option<String>;
}

/// Reads parameters from process environment variables.
#[derive(Debug, Clone, Copy, Default)]
pub struct EnvSource;

impl ParameterSource for EnvSource {
    fn get(&self, name: &str) -> Option<String> {
        env::var(name).ok()
    }
}

/// An in-memory source, for tests and fixed configuration.
#[derive(Debug, Clone, Default)]
pub struct MapSource {
    values: BTreeMap<String, String>,
}

impl MapSource {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.values.insert(name.into(), value.into());
        self
    }
}

impl ParameterSource for MapSource {
    fn get(&self, name: &str) -> Option<String> {
        self.values.get(name).cloned()
    }
}

/// A required parameter: the source name to read and the manifest placeholder
/// token the value binds to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RequiredParam {
    /// Name in the parameter source (an environment variable).
    pub name: &'static str,
    /// Placeholder token the resolved value is bound to.
    pub token: &'static str,
}

impl RequiredParam {
    pub const fn new(name: &'static str, token: &'static str) -> Self {
        Self { name, token }
    }
}

/// Resolved placeholder values, keyed by token.
///
/// Iteration order is deterministic (sorted by token).
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ParamSet {
    values: BTreeMap<String, String>,
}

impl ParamSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Reads every required parameter from `source`.
    ///
    /// Absent and empty values both count as missing. Fails with a
    /// [`ParamError::MissingConfiguration`] naming every missing source name,
    /// never just the first.
    pub fn resolve(
        source: &dyn ParameterSource,
        required: &[RequiredParam],
    ) -> Result<Self, ParamError> {
        let mut values = BTreeMap::new();
        let mut missing = Vec::new();

        for param in required {
            match source.get(param.name) {
                Some(value) if !value.is_empty() => {
                    values.insert(param.token.to_string(), value);
                }
                _ => missing.push(param.name.to_string()),
            }
        }

        if missing.is_empty() {
            Ok(Self { values })
        } else {
            missing.sort_unstable();
            Err(ParamError::MissingConfiguration { keys: missing })
        }
    }

    /// Binds an additional token, replacing any previous value.
    pub fn insert(&mut self, token: impl Into<String>, value: impl Into<String>) {
        self.values.insert(token.into(), value.into());
    }

    pub fn get(&self, token: &str) -> Option<&str> {
        self.values.get(token).map(String::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.values.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const REQUIRED: &[RequiredParam] = &[
        RequiredParam::new("OS_AUTH_URL", "IDENTITY_ENDPOINT"),
        RequiredParam::new("OS_USERNAME", "USERNAME"),
        RequiredParam::new("OS_PASSWORD", "PASSWORD"),
    ];

    #[test]
    fn test_resolve_maps_names_to_tokens() {
        let source = MapSource::new()
            .with("OS_AUTH_URL", "https://identity.example.com")
            .with("OS_USERNAME", "e2e")
            .with("OS_PASSWORD", "hunter2");

        let params = ParamSet::resolve(&source, REQUIRED).unwrap();

        assert_eq!(params.get("IDENTITY_ENDPOINT"), Some("https://identity.example.com"));
        assert_eq!(params.get("USERNAME"), Some("e2e"));
        assert_eq!(params.get("PASSWORD"), Some("hunter2"));
        assert_eq!(params.len(), 3);
    }

    #[test]
    fn test_resolve_reports_every_missing_name() {
        let source = MapSource::new().with("OS_USERNAME", "e2e");

        let err = ParamSet::resolve(&source, REQUIRED).unwrap_err();

        assert_eq!(
            err,
            ParamError::MissingConfiguration {
                keys: vec!["OS_AUTH_URL".to_string(), "OS_PASSWORD".to_string()],
            }
        );
    }

    #[test]
    fn test_resolve_treats_empty_values_as_missing() {
        let source = MapSource::new()
            .with("OS_AUTH_URL", "https://identity.example.com")
            .with("OS_USERNAME", "")
            .with("OS_PASSWORD", "hunter2");

        let err = ParamSet::resolve(&source, REQUIRED).unwrap_err();

        assert_eq!(
            err,
            ParamError::MissingConfiguration {
                keys: vec!["OS_USERNAME".to_string()],
            }
        );
    }

    #[test]
    fn test_error_message_lists_all_keys() {
        let source = MapSource::new();
        let err = ParamSet::resolve(&source, REQUIRED).unwrap_err();
        let message = err.to_string();

        assert!(message.contains("OS_AUTH_URL"));
        assert!(message.contains("OS_USERNAME"));
        assert!(message.contains("OS_PASSWORD"));
    }

    #[test]
    fn test_insert_overrides_resolved_value() {
        let source = MapSource::new()
            .with("OS_AUTH_URL", "a")
            .with("OS_USERNAME", "b")
            .with("OS_PASSWORD", "c");

        let mut params = ParamSet::resolve(&source, REQUIRED).unwrap();
        params.insert("USERNAME", "override");

        assert_eq!(params.get("USERNAME"), Some("override"));
    }

    #[test]
    fn test_iter_order_is_deterministic() {
        let mut params = ParamSet::new();
        params.insert("ZETA", "1");
        params.insert("ALPHA", "2");

        let tokens: Vec<_> = params.iter().map(|(k, _)| k.to_string()).collect();
        assert_eq!(tokens, vec!["ALPHA", "ZETA"]);
    }

    #[test]
    fn test_env_source_reads_process_environment() {
        let source = EnvSource;
        // PATH is present in any test environment; an invented name is not.
        assert!(source.get("PATH").is_some());
        assert_eq!(source.get("MACHINA_PARAMS_TEST_UNSET"), None);
    }
}
