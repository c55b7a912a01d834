//! The provider-independent scenario matrix.
//!
//! A [`Scenario`] is one (OS flavor, container runtime, Kubernetes version)
//! combination to be provisioned and validated. [`catalog`] enumerates the
//! full cross-product in a stable order so that test output stays diffable
//! across runs.

use std::fmt;

/// Operating-system flavors the matrix covers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum OsFlavor {
    Ubuntu,
    CoreOs,
    CentOs,
}

impl OsFlavor {
    /// Returns all flavors in catalog order.
    pub fn all() -> &'static [OsFlavor] {
        &[OsFlavor::Ubuntu, OsFlavor::CoreOs, OsFlavor::CentOs]
    }

    /// Returns the flavor name in lowercase (for manifests and selectors).
    pub fn as_str(&self) -> &'static str {
        match self {
            OsFlavor::Ubuntu => "ubuntu",
            OsFlavor::CoreOs => "coreos",
            OsFlavor::CentOs => "centos",
        }
    }
}

impl fmt::Display for OsFlavor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OsFlavor::Ubuntu => write!(f, "Ubuntu"),
            OsFlavor::CoreOs => write!(f, "CoreOS"),
            OsFlavor::CentOs => write!(f, "CentOS"),
        }
    }
}

/// Container runtimes the matrix covers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ContainerRuntime {
    Docker,
    Crio,
}

impl ContainerRuntime {
    /// Returns all runtimes in catalog order.
    pub fn all() -> &'static [ContainerRuntime] {
        &[ContainerRuntime::Docker, ContainerRuntime::Crio]
    }

    /// Returns the runtime name in lowercase (for manifests and selectors).
    pub fn as_str(&self) -> &'static str {
        match self {
            ContainerRuntime::Docker => "docker",
            ContainerRuntime::Crio => "crio",
        }
    }
}

impl fmt::Display for ContainerRuntime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ContainerRuntime::Docker => write!(f, "Docker"),
            ContainerRuntime::Crio => write!(f, "CRI-O"),
        }
    }
}

/// Kubernetes versions the matrix covers, oldest first.
const KUBERNETES_VERSIONS: &[&str] = &["1.9.10", "1.10.5", "1.11.0"];

/// One provisioning test combination.
///
/// Identity is the tuple itself; scenarios are created by [`catalog`] (or
/// pinned explicitly for resource-exclusive runs) and never mutated.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Scenario {
    name: String,
    os: OsFlavor,
    container_runtime: ContainerRuntime,
    kubernetes_version: String,
}

impl Scenario {
    /// Creates a scenario for the given combination.
    pub fn new(
        os: OsFlavor,
        container_runtime: ContainerRuntime,
        kubernetes_version: impl Into<String>,
    ) -> Self {
        let kubernetes_version = kubernetes_version.into();
        Self {
            name: format!("{os} {container_runtime} Kubernetes v{kubernetes_version}"),
            os,
            container_runtime,
            kubernetes_version,
        }
    }

    /// Human-readable name, e.g. `"Ubuntu Docker Kubernetes v1.10.5"`.
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn os(&self) -> OsFlavor {
        self.os
    }

    pub fn container_runtime(&self) -> ContainerRuntime {
        self.container_runtime
    }

    pub fn kubernetes_version(&self) -> &str {
        &self.kubernetes_version
    }

    /// A label-safe slug of the combination, e.g. `"ubuntu-docker-1-10-5"`.
    ///
    /// Used to namespace externally created resources per scenario, so
    /// concurrently executing scenarios never share a name.
    pub fn slug(&self) -> String {
        format!(
            "{}-{}-{}",
            self.os.as_str(),
            self.container_runtime.as_str(),
            self.kubernetes_version.replace('.', "-")
        )
    }
}

impl fmt::Display for Scenario {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name)
    }
}

/// Returns the full scenario matrix in deterministic order.
///
/// Versions vary slowest, then OS flavors, then container runtimes. Pure
/// function of static catalog data.
pub fn catalog() -> Vec<Scenario> {
    let mut scenarios = Vec::new();
    for version in KUBERNETES_VERSIONS {
        for os in OsFlavor::all() {
            for runtime in ContainerRuntime::all() {
                scenarios.push(Scenario::new(*os, *runtime, *version));
            }
        }
    }
    scenarios
}
