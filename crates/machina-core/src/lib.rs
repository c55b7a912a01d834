//! # machina-core
//!
//! Building blocks for the Machina provisioning E2E orchestrator.
//!
//! This crate provides:
//! - The provider-independent scenario matrix (OS flavor × container runtime
//!   × Kubernetes version)
//! - Per-provider scenario exclusion rules
//! - Required-parameter resolution from an injected key-value source
//! - Manifest template binding with unresolved-placeholder detection
//! - Run-tag and address-octet derivation for collision avoidance
//! - Strict decoding of driver-opaque provider configuration

mod catalog;
mod driver;
mod params;
mod run_id;
mod selector;
mod template;

pub use catalog::{ContainerRuntime, OsFlavor, Scenario, catalog};
pub use driver::{DriverConfig, DriverConfigError};
pub use params::{EnvSource, MapSource, ParamError, ParamSet, ParameterSource, RequiredParam};
pub use run_id::{RunIdError, RunTag, address_octet};
pub use selector::{ScenarioSelector, filter};
pub use template::{TemplateError, bind};

/// Library version, matching the crate version.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
