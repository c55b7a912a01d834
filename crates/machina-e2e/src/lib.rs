//! # machina-e2e
//!
//! End-to-end provisioning test orchestrator.
//!
//! For every supported infrastructure provider, this crate builds the
//! scenario matrix, drops combinations the provider cannot run, binds
//! credentials and per-run identifiers into the provider's manifest
//! template, and executes each admitted scenario as an isolated
//! provisioning run against a real cluster.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────┐     ┌─────────────┐     ┌─────────────┐
//! │ SuiteRunner │────▶│ machina-core│     │ Provisioner │
//! │  (per suite)│     │ catalog /   │     │ (external   │
//! │             │────▶│ selector /  │  ┌─▶│  verifier)  │
//! │             │     │ template    │  │  └─────────────┘
//! │             │─────────────────────┘
//! └─────────────┘
//! ```
//!
//! The runner is the sole caller of the core building blocks; the
//! provisioning collaborator is an opaque, blocking call per scenario.

pub use crate::provider::{
    BuildCounter, ExclusivityClass, Provider, ScenarioPlan, SuiteSpec, all_suites,
    ubuntu_upgrade_suite, vsphere_static_ip_suite,
};
pub use crate::provisioner::{
    CommandProvisioner, ProvisionError, ProvisionRequest, Provisioner,
};
pub use crate::reporter::{TerminalReporter, Verbosity, write_json_report};
pub use crate::suite::{
    RunOptions, ScenarioResult, SuiteError, SuiteOutcome, SuitePhase, SuiteRunner,
};

mod provider;
mod provisioner;
mod reporter;
mod suite;

/// Library version, matching the crate version.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
