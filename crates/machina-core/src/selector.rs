//! Per-provider scenario exclusion rules.
//!
//! Providers have disjoint, independently discovered incompatibilities (one
//! lacks an OS image, another lacks a runtime build). Encoding those as data
//! keeps the quirks declarative and testable in isolation.

use crate::catalog::{ContainerRuntime, OsFlavor, Scenario};

/// A set of exclusion rules over scenario dimensions.
///
/// A scenario is admitted iff it matches none of the configured exclusions.
/// The default selector admits everything.
#[derive(Debug, Clone, Default)]
pub struct ScenarioSelector {
    os_flavors: Vec<OsFlavor>,
    container_runtimes: Vec<ContainerRuntime>,
    kubernetes_versions: Vec<String>,
}

impl ScenarioSelector {
    /// Creates a selector with no exclusions.
    pub fn new() -> Self {
        Self::default()
    }

    /// Excludes scenarios with the given OS flavor.
    pub fn exclude_os(mut self, os: OsFlavor) -> Self {
        self.os_flavors.push(os);
        self
    }

    /// Excludes scenarios with the given container runtime.
    pub fn exclude_runtime(mut self, runtime: ContainerRuntime) -> Self {
        self.container_runtimes.push(runtime);
        self
    }

    /// Excludes scenarios with the given Kubernetes version.
    pub fn exclude_version(mut self, version: impl Into<String>) -> Self {
        self.kubernetes_versions.push(version.into());
        self
    }

    /// Returns true if the scenario matches no exclusion rule.
    pub fn admits(&self, scenario: &Scenario) -> bool {
        if self.os_flavors.contains(&scenario.os()) {
            return false;
        }
        if self
            .container_runtimes
            .contains(&scenario.container_runtime())
        {
            return false;
        }
        if self
            .kubernetes_versions
            .iter()
            .any(|v| v == scenario.kubernetes_version())
        {
            return false;
        }
        true
    }
}

/// Filters a catalog through a selector, preserving order.
pub fn filter(scenarios: Vec<Scenario>, selector: &ScenarioSelector) -> Vec<Scenario> {
    scenarios
        .into_iter()
        .filter(|s| selector.admits(s))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::catalog;

    #[test]
    fn test_default_selector_admits_everything() {
        let selector = ScenarioSelector::new();
        for scenario in catalog() {
            assert!(selector.admits(&scenario), "rejected {scenario}");
        }
    }

    #[test]
    fn test_os_exclusion_rejects_matching_scenarios() {
        let selector = ScenarioSelector::new().exclude_os(OsFlavor::CoreOs);
        for scenario in catalog() {
            assert_eq!(selector.admits(&scenario), scenario.os() != OsFlavor::CoreOs);
        }
    }

    #[test]
    fn test_exclusions_compose_by_or() {
        let selector = ScenarioSelector::new()
            .exclude_os(OsFlavor::CentOs)
            .exclude_runtime(ContainerRuntime::Crio)
            .exclude_version("1.9.10");

        for scenario in catalog() {
            let matches_any = scenario.os() == OsFlavor::CentOs
                || scenario.container_runtime() == ContainerRuntime::Crio
                || scenario.kubernetes_version() == "1.9.10";
            assert_eq!(selector.admits(&scenario), !matches_any);
        }
    }

    #[test]
    fn test_filter_preserves_order() {
        let selector = ScenarioSelector::new().exclude_os(OsFlavor::Ubuntu);
        let admitted = filter(catalog(), &selector);
        let expected: Vec<_> = catalog()
            .into_iter()
            .filter(|s| s.os() != OsFlavor::Ubuntu)
            .collect();
        assert_eq!(admitted, expected);
    }

    #[test]
    fn test_two_scenario_example() {
        let ubuntu = Scenario::new(OsFlavor::Ubuntu, ContainerRuntime::Docker, "1.10.5");
        let coreos = Scenario::new(OsFlavor::CoreOs, ContainerRuntime::Docker, "1.11.0");

        let selector = ScenarioSelector::new().exclude_os(OsFlavor::CoreOs);
        let admitted = filter(vec![ubuntu.clone(), coreos], &selector);

        assert_eq!(admitted, vec![ubuntu]);
    }
}
