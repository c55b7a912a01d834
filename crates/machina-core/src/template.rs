//! Manifest template binding.
//!
//! Manifest templates are opaque text blobs containing placeholder tokens of
//! the form `<< NAME >>`. Binding substitutes every occurrence of every
//! supplied token and then scans for leftovers: a half-substituted manifest
//! applied to a cluster would create real infrastructure with leaked
//! placeholder text, so unresolved tokens must be caught before dispatch.

use crate::params::ParamSet;
use regex::Regex;
use std::collections::BTreeSet;
use std::sync::LazyLock;
use thiserror::Error;

static PLACEHOLDER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"<<\s*([A-Z0-9_]+)\s*>>").unwrap());

/// Errors from template binding.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum TemplateError {
    /// The template references tokens the mapping does not supply.
    #[error("unresolved placeholder(s): {}", tokens.join(", "))]
    UnresolvedPlaceholder {
        /// All unresolved token names, sorted.
        tokens: Vec<String>,
    },
}

/// Substitutes every supplied token into `template`.
///
/// Tokens present in `params` but absent from the template are ignored, so
/// templates stay forward compatible with broader parameter sets. Fails if
/// any placeholder remains after substitution, naming every leftover token.
/// Binding is pure: the same inputs always yield byte-identical output.
pub fn bind(template: &str, params: &ParamSet) -> Result<String, TemplateError> {
    let mut manifest = template.to_string();
    for (token, value) in params.iter() {
        manifest = manifest.replace(&format!("<< {token} >>"), value);
    }

    let leftover: BTreeSet<String> = PLACEHOLDER
        .captures_iter(&manifest)
        .map(|c| c[1].to_string())
        .collect();

    if leftover.is_empty() {
        Ok(manifest)
    } else {
        Err(TemplateError::UnresolvedPlaceholder {
            tokens: leftover.into_iter().collect(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn params(pairs: &[(&str, &str)]) -> ParamSet {
        let mut set = ParamSet::new();
        for (token, value) in pairs {
            set.insert(*token, *value);
        }
        set
    }

    #[test]
    fn test_bind_replaces_every_occurrence() {
        let template = "name: << NAME >>\nlabel: << NAME >>\nregion: << REGION >>";
        let bound = bind(template, &params(&[("NAME", "node-a"), ("REGION", "fra1")])).unwrap();
        assert_eq!(bound, "name: node-a\nlabel: node-a\nregion: fra1");
    }

    #[test]
    fn test_bind_is_idempotent() {
        let template = "user=<< USERNAME >>;pass=<< PASSWORD >>";
        let mapping = params(&[("USERNAME", "a"), ("PASSWORD", "b")]);

        let once = bind(template, &mapping).unwrap();
        let twice = bind(template, &mapping).unwrap();
        assert_eq!(once, twice);
    }

    #[test]
    fn test_bind_fails_on_missing_token() {
        let template = "user=<< USERNAME >>;pass=<< PASSWORD >>";
        let err = bind(template, &params(&[("USERNAME", "a")])).unwrap_err();

        assert_eq!(
            err,
            TemplateError::UnresolvedPlaceholder {
                tokens: vec!["PASSWORD".to_string()],
            }
        );
    }

    #[test]
    fn test_bind_reports_all_unresolved_tokens_sorted() {
        let template = "<< ZETA >> << ALPHA >> << ZETA >>";
        let err = bind(template, &ParamSet::new()).unwrap_err();

        assert_eq!(
            err,
            TemplateError::UnresolvedPlaceholder {
                tokens: vec!["ALPHA".to_string(), "ZETA".to_string()],
            }
        );
    }

    #[test]
    fn test_bind_ignores_unused_mapping_entries() {
        let template = "token: << TOKEN >>";
        let mapping = params(&[("TOKEN", "abc"), ("UNUSED", "zzz")]);
        assert_eq!(bind(template, &mapping).unwrap(), "token: abc");
    }

    #[test]
    fn test_bind_without_placeholders_is_identity() {
        let template = "apiVersion: v1\nkind: ConfigMap";
        assert_eq!(bind(template, &ParamSet::new()).unwrap(), template);
    }
}
