//! Driver-opaque provider configuration.
//!
//! A baremetal-style provider does not interpret its own machine
//! configuration; it names a driver and forwards a driver-specific blob to
//! it verbatim. Decoding is strict: a typo'd or unknown field is rejected
//! outright rather than silently dropped, and the blob itself is never
//! inspected here.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors from decoding driver configuration.
#[derive(Debug, Error)]
pub enum DriverConfigError {
    /// The document does not match the expected shape (unknown or missing
    /// fields, malformed syntax).
    #[error("strict decode failed: {0}")]
    StrictDecodeFailure(String),
}

/// A named driver plus its uninterpreted configuration blob.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(deny_unknown_fields, rename_all = "camelCase")]
pub struct DriverConfig {
    /// Identifier of the driver implementation to forward the spec to.
    pub driver: String,
    /// Driver-specific configuration, preserved verbatim.
    #[serde(default)]
    pub driver_spec: serde_json::Value,
}

impl DriverConfig {
    /// Decodes a JSON document, rejecting unknown fields.
    pub fn from_json(raw: &str) -> Result<Self, DriverConfigError> {
        let config: Self = serde_json::from_str(raw)
            .map_err(|e| DriverConfigError::StrictDecodeFailure(e.to_string()))?;
        config.validated()
    }

    /// Decodes a YAML document, rejecting unknown fields.
    pub fn from_yaml(raw: &str) -> Result<Self, DriverConfigError> {
        let config: Self = serde_yaml::from_str(raw)
            .map_err(|e| DriverConfigError::StrictDecodeFailure(e.to_string()))?;
        config.validated()
    }

    fn validated(self) -> Result<Self, DriverConfigError> {
        if self.driver.is_empty() {
            return Err(DriverConfigError::StrictDecodeFailure(
                "driver name is empty".to_string(),
            ));
        }
        Ok(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_decodes_driver_and_spec() {
        let config = DriverConfig::from_json(
            r#"{"driver": "ipmi", "driverSpec": {"address": "10.0.0.1", "port": 623}}"#,
        )
        .unwrap();

        assert_eq!(config.driver, "ipmi");
        assert_eq!(
            config.driver_spec,
            json!({"address": "10.0.0.1", "port": 623})
        );
    }

    #[test]
    fn test_spec_blob_is_preserved_verbatim() {
        let config = DriverConfig::from_json(
            r#"{"driver": "redfish", "driverSpec": {"nested": {"deep": [1, 2, 3]}, "flag": true}}"#,
        )
        .unwrap();

        assert_eq!(config.driver_spec["nested"]["deep"], json!([1, 2, 3]));
        assert_eq!(config.driver_spec["flag"], json!(true));
    }

    #[test]
    fn test_unknown_field_is_rejected() {
        let err =
            DriverConfig::from_json(r#"{"driver": "ipmi", "driverSpeck": {}}"#).unwrap_err();
        let DriverConfigError::StrictDecodeFailure(message) = err;
        assert!(message.contains("driverSpeck"));
    }

    #[test]
    fn test_missing_driver_is_rejected() {
        assert!(DriverConfig::from_json(r#"{"driverSpec": {}}"#).is_err());
        assert!(DriverConfig::from_json(r#"{"driver": "", "driverSpec": {}}"#).is_err());
    }

    #[test]
    fn test_missing_spec_defaults_to_null() {
        let config = DriverConfig::from_json(r#"{"driver": "ipmi"}"#).unwrap();
        assert!(config.driver_spec.is_null());
    }

    #[test]
    fn test_decodes_yaml_documents() {
        let config = DriverConfig::from_yaml("driver: ipmi\ndriverSpec:\n  address: 10.0.0.1\n")
            .unwrap();
        assert_eq!(config.driver, "ipmi");
        assert_eq!(config.driver_spec["address"], json!("10.0.0.1"));
    }

    #[test]
    fn test_yaml_unknown_field_is_rejected() {
        assert!(DriverConfig::from_yaml("driver: ipmi\nextra: nope\n").is_err());
    }
}
