//! Run-tag and address-octet derivation.
//!
//! Every harness invocation carries a base identifier (CI job id, developer
//! initials, the default `"local"`). Provider suites prefix it to namespace
//! the resources they create; scenarios suffix their slug so no two
//! concurrently executing scenarios share a tag.
//!
//! Scenarios that claim a slot in a fixed-size address space additionally
//! derive a numeric suffix from the CI build counter. The derivation is pure,
//! so re-runs of the same build are reproducible, while distinct build
//! counters pick distinct slots.

use std::fmt;
use thiserror::Error;

/// Errors from identifier derivation.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum RunIdError {
    /// The build counter is not a non-negative integer.
    #[error("invalid build counter {value:?}: {reason}")]
    InvalidBuildCounter { value: String, reason: String },
}

/// A label uniquely naming one provisioning run.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct RunTag(String);

impl RunTag {
    /// Derives a suite-level tag: `"{prefix}-{base}"`.
    pub fn derive(prefix: &str, base: &str) -> Self {
        Self(format!("{prefix}-{base}"))
    }

    /// Derives a scenario-local tag by appending a scenario slug.
    pub fn scoped(&self, slug: &str) -> Self {
        Self(format!("{}-{slug}", self.0))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for RunTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Maps a build counter onto a 256-slot address space.
///
/// Returns `counter mod 256`. Deterministic: the same counter always yields
/// the same octet. Callers that need strict exclusivity must additionally
/// serialize scenarios sharing the address space; the octet only keeps
/// *different* builds apart.
pub fn address_octet(counter: &str) -> Result<u8, RunIdError> {
    let trimmed = counter.trim();
    let parsed: u64 = trimmed
        .parse()
        .map_err(|_| RunIdError::InvalidBuildCounter {
            value: counter.to_string(),
            reason: "expected a non-negative integer".to_string(),
        })?;
    Ok((parsed % 256) as u8)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_derive_concatenates_prefix_and_base() {
        let tag = RunTag::derive("vs", "local");
        assert_eq!(tag.as_str(), "vs-local");
    }

    #[test]
    fn test_scoped_appends_slug() {
        let tag = RunTag::derive("hz", "ci-1234").scoped("ubuntu-docker-1-10-5");
        assert_eq!(tag.as_str(), "hz-ci-1234-ubuntu-docker-1-10-5");
    }

    #[test]
    fn test_address_octet_wraps_at_256() {
        assert_eq!(address_octet("513").unwrap(), 1);
        assert_eq!(address_octet("0").unwrap(), 0);
        assert_eq!(address_octet("255").unwrap(), 255);
        assert_eq!(address_octet("256").unwrap(), 0);
    }

    #[test]
    fn test_address_octet_modulo_law() {
        for n in [0u64, 1, 17, 255, 1000, 65535] {
            let low = address_octet(&n.to_string()).unwrap();
            let high = address_octet(&(n + 256).to_string()).unwrap();
            assert_eq!(low, high, "octet must be periodic in 256 (n={n})");
        }
    }

    #[test]
    fn test_address_octet_tolerates_surrounding_whitespace() {
        assert_eq!(address_octet(" 42\n").unwrap(), 42);
    }

    #[test]
    fn test_address_octet_rejects_garbage() {
        assert!(address_octet("").is_err());
        assert!(address_octet("-1").is_err());
        assert!(address_octet("12a").is_err());
        assert!(address_octet("1.5").is_err());
    }

    #[test]
    fn test_address_octet_error_names_the_value() {
        let err = address_octet("not-a-number").unwrap_err();
        assert!(err.to_string().contains("not-a-number"));
    }
}
