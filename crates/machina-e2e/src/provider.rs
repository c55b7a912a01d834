//! The provider table.
//!
//! Each infrastructure provider contributes a suite: the parameters it needs
//! from the environment, the manifest template it binds, the tag prefix that
//! namespaces its resources, and the scenario exclusions its capabilities
//! force. Two additional suites pin a single scenario because they claim
//! exclusive external resources (a fixed IP, a shared upgrade network).

use machina_core::{
    ContainerRuntime, OsFlavor, RequiredParam, Scenario, ScenarioSelector,
};
use std::fmt;

/// Infrastructure providers exercised by the matrix suites.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Provider {
    Openstack,
    DigitalOcean,
    Aws,
    Azure,
    Hetzner,
    Vsphere,
}

const OPENSTACK_PARAMS: &[RequiredParam] = &[
    RequiredParam::new("OS_AUTH_URL", "IDENTITY_ENDPOINT"),
    RequiredParam::new("OS_USERNAME", "USERNAME"),
    RequiredParam::new("OS_PASSWORD", "PASSWORD"),
    RequiredParam::new("OS_DOMAIN", "DOMAIN_NAME"),
    RequiredParam::new("OS_REGION", "REGION"),
    RequiredParam::new("OS_TENANT_NAME", "TENANT_NAME"),
    RequiredParam::new("OS_NETWORK_NAME", "NETWORK_NAME"),
];

const DIGITALOCEAN_PARAMS: &[RequiredParam] =
    &[RequiredParam::new("DO_E2E_TESTS_TOKEN", "DIGITALOCEAN_TOKEN")];

const AWS_PARAMS: &[RequiredParam] = &[
    RequiredParam::new("AWS_E2E_TESTS_KEY_ID", "AWS_ACCESS_KEY_ID"),
    RequiredParam::new("AWS_E2E_TESTS_SECRET", "AWS_SECRET_ACCESS_KEY"),
];

const AZURE_PARAMS: &[RequiredParam] = &[
    RequiredParam::new("AZURE_E2E_TESTS_TENANT_ID", "AZURE_TENANT_ID"),
    RequiredParam::new("AZURE_E2E_TESTS_SUBSCRIPTION_ID", "AZURE_SUBSCRIPTION_ID"),
    RequiredParam::new("AZURE_E2E_TESTS_CLIENT_ID", "AZURE_CLIENT_ID"),
    RequiredParam::new("AZURE_E2E_TESTS_CLIENT_SECRET", "AZURE_CLIENT_SECRET"),
];

const HETZNER_PARAMS: &[RequiredParam] =
    &[RequiredParam::new("HZ_E2E_TOKEN", "HETZNER_TOKEN")];

const VSPHERE_PARAMS: &[RequiredParam] = &[
    RequiredParam::new("VSPHERE_E2E_USERNAME", "VSPHERE_USERNAME"),
    RequiredParam::new("VSPHERE_E2E_PASSWORD", "VSPHERE_PASSWORD"),
    RequiredParam::new("VSPHERE_E2E_ADDRESS", "VSPHERE_ADDRESS"),
    RequiredParam::new("VSPHERE_E2E_CLUSTER", "VSPHERE_CLUSTER"),
];

impl Provider {
    /// Returns all providers in suite order.
    pub fn all() -> &'static [Provider] {
        &[
            Provider::Openstack,
            Provider::DigitalOcean,
            Provider::Aws,
            Provider::Azure,
            Provider::Hetzner,
            Provider::Vsphere,
        ]
    }

    /// Returns the provider name in lowercase (for CLI and file names).
    pub fn as_str(&self) -> &'static str {
        match self {
            Provider::Openstack => "openstack",
            Provider::DigitalOcean => "digitalocean",
            Provider::Aws => "aws",
            Provider::Azure => "azure",
            Provider::Hetzner => "hetzner",
            Provider::Vsphere => "vsphere",
        }
    }

    /// Short prefix for run tags, e.g. `"do"` for DigitalOcean.
    pub fn tag_prefix(&self) -> &'static str {
        match self {
            Provider::Openstack => "os",
            Provider::DigitalOcean => "do",
            Provider::Aws => "aws",
            Provider::Azure => "azure",
            Provider::Hetzner => "hz",
            Provider::Vsphere => "vs",
        }
    }

    /// Parameters the provider requires from the environment.
    pub fn required_params(&self) -> &'static [RequiredParam] {
        match self {
            Provider::Openstack => OPENSTACK_PARAMS,
            Provider::DigitalOcean => DIGITALOCEAN_PARAMS,
            Provider::Aws => AWS_PARAMS,
            Provider::Azure => AZURE_PARAMS,
            Provider::Hetzner => HETZNER_PARAMS,
            Provider::Vsphere => VSPHERE_PARAMS,
        }
    }

    /// Scenario exclusions forced by the provider's capabilities.
    pub fn selector(&self) -> ScenarioSelector {
        match self {
            // Hetzner has no CoreOS image.
            Provider::Hetzner => ScenarioSelector::new().exclude_os(OsFlavor::CoreOs),
            // vSphere templates exist for Ubuntu and CoreOS only.
            Provider::Vsphere => ScenarioSelector::new().exclude_os(OsFlavor::CentOs),
            _ => ScenarioSelector::new(),
        }
    }

    /// Manifest template file name for this provider.
    pub fn manifest_file(&self) -> &'static str {
        match self {
            Provider::Openstack => "machineset-openstack.yaml",
            Provider::DigitalOcean => "machineset-digitalocean.yaml",
            Provider::Aws => "machineset-aws.yaml",
            Provider::Azure => "machineset-azure.yaml",
            Provider::Hetzner => "machineset-hetzner.yaml",
            Provider::Vsphere => "machineset-vsphere.yaml",
        }
    }

    /// The full-matrix suite for this provider.
    pub fn suite(&self) -> SuiteSpec {
        SuiteSpec {
            name: self.as_str().to_string(),
            tag_prefix: self.tag_prefix(),
            manifest_file: self.manifest_file(),
            required: self.required_params(),
            selector: self.selector(),
            plan: ScenarioPlan::FullMatrix,
            exclusivity: ExclusivityClass::Shared,
            build_counter: None,
        }
    }
}

impl fmt::Display for Provider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Provider::Openstack => write!(f, "OpenStack"),
            Provider::DigitalOcean => write!(f, "DigitalOcean"),
            Provider::Aws => write!(f, "AWS"),
            Provider::Azure => write!(f, "Azure"),
            Provider::Hetzner => write!(f, "Hetzner"),
            Provider::Vsphere => write!(f, "vSphere"),
        }
    }
}

/// Which scenarios a suite runs.
#[derive(Debug, Clone)]
pub enum ScenarioPlan {
    /// The filtered catalog matrix.
    FullMatrix,
    /// A single, explicitly chosen scenario (for resource-exclusive runs).
    Pinned(Scenario),
}

/// Whether a suite's scenarios contend for a shared external resource.
///
/// Scenarios in the same named class are serialized against each other,
/// process-wide; `Shared` scenarios run concurrently.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExclusivityClass {
    Shared,
    Exclusive(&'static str),
}

/// A build counter the suite turns into an address-space slot.
#[derive(Debug, Clone, Copy)]
pub struct BuildCounter {
    /// Environment name the counter is read from.
    pub name: &'static str,
    /// Placeholder token the derived octet is bound to.
    pub token: &'static str,
}

/// Everything the orchestrator needs to run one provider suite.
#[derive(Debug, Clone)]
pub struct SuiteSpec {
    pub name: String,
    pub tag_prefix: &'static str,
    pub manifest_file: &'static str,
    pub required: &'static [RequiredParam],
    pub selector: ScenarioSelector,
    pub plan: ScenarioPlan,
    pub exclusivity: ExclusivityClass,
    pub build_counter: Option<BuildCounter>,
}

/// The vSphere static-IP suite.
///
/// Provisions a node whose address is statically assigned from a /24, so
/// only one pinned scenario runs and it is serialized against everything
/// else in the same address class. The slot is derived from the CI build
/// counter.
pub fn vsphere_static_ip_suite() -> SuiteSpec {
    SuiteSpec {
        name: "vsphere-static-ip".to_string(),
        tag_prefix: "vs-staticip",
        manifest_file: "machineset-vsphere-static-ip.yaml",
        required: VSPHERE_PARAMS,
        selector: ScenarioSelector::new(),
        plan: ScenarioPlan::Pinned(Scenario::new(
            OsFlavor::CoreOs,
            ContainerRuntime::Docker,
            "1.11.0",
        )),
        exclusivity: ExclusivityClass::Exclusive("static-ip"),
        build_counter: Some(BuildCounter {
            name: "CIRCLE_BUILD_NUM",
            token: "IP_OCTET",
        }),
    }
}

/// The Ubuntu upgrade suite.
///
/// Boots an old Ubuntu 16.04 image on OpenStack and upgrades it before it
/// joins the cluster. The run shares a fixed network, so the pinned scenario
/// is serialized against its class.
pub fn ubuntu_upgrade_suite() -> SuiteSpec {
    SuiteSpec {
        name: "ubuntu-upgrade".to_string(),
        tag_prefix: "ubuntu-upgrade",
        manifest_file: "machineset-openstack-upgrade.yaml",
        required: OPENSTACK_PARAMS,
        selector: ScenarioSelector::new(),
        plan: ScenarioPlan::Pinned(Scenario::new(
            OsFlavor::Ubuntu,
            ContainerRuntime::Docker,
            "1.10.5",
        )),
        exclusivity: ExclusivityClass::Exclusive("upgrade-net"),
        build_counter: None,
    }
}

/// All suites the harness knows, provider matrices first.
pub fn all_suites() -> Vec<SuiteSpec> {
    let mut suites: Vec<SuiteSpec> = Provider::all().iter().map(Provider::suite).collect();
    suites.push(vsphere_static_ip_suite());
    suites.push(ubuntu_upgrade_suite());
    suites
}

#[cfg(test)]
mod tests {
    use super::*;
    use machina_core::{Scenario, catalog, filter};

    #[test]
    fn test_all_suites_covers_every_provider_plus_special_runs() {
        let suites = all_suites();
        assert_eq!(suites.len(), Provider::all().len() + 2);
    }

    #[test]
    fn test_tag_prefixes_are_unique() {
        let mut prefixes: Vec<_> = all_suites().iter().map(|s| s.tag_prefix).collect();
        prefixes.sort_unstable();
        prefixes.dedup();
        assert_eq!(prefixes.len(), all_suites().len());
    }

    #[test]
    fn test_hetzner_excludes_coreos() {
        let admitted = filter(catalog(), &Provider::Hetzner.selector());
        assert!(admitted.iter().all(|s| s.os() != OsFlavor::CoreOs));
        assert!(admitted.iter().any(|s| s.os() == OsFlavor::Ubuntu));
        assert!(admitted.iter().any(|s| s.os() == OsFlavor::CentOs));
    }

    #[test]
    fn test_vsphere_excludes_centos() {
        let admitted = filter(catalog(), &Provider::Vsphere.selector());
        assert!(admitted.iter().all(|s| s.os() != OsFlavor::CentOs));
    }

    #[test]
    fn test_matrix_providers_admit_everything_unless_constrained() {
        for provider in [Provider::Openstack, Provider::DigitalOcean, Provider::Aws, Provider::Azure] {
            let admitted = filter(catalog(), &provider.selector());
            assert_eq!(admitted.len(), catalog().len(), "{provider} should admit the full matrix");
        }
    }

    #[test]
    fn test_openstack_requires_all_identity_parameters() {
        let names: Vec<_> = Provider::Openstack
            .required_params()
            .iter()
            .map(|p| p.name)
            .collect();
        for name in [
            "OS_AUTH_URL",
            "OS_USERNAME",
            "OS_PASSWORD",
            "OS_DOMAIN",
            "OS_REGION",
            "OS_TENANT_NAME",
            "OS_NETWORK_NAME",
        ] {
            assert!(names.contains(&name), "missing {name}");
        }
    }

    #[test]
    fn test_static_ip_suite_pins_a_single_exclusive_scenario() {
        let suite = vsphere_static_ip_suite();
        let ScenarioPlan::Pinned(scenario) = &suite.plan else {
            panic!("static IP suite must pin a scenario");
        };
        assert_eq!(
            *scenario,
            Scenario::new(OsFlavor::CoreOs, ContainerRuntime::Docker, "1.11.0")
        );
        assert_eq!(suite.exclusivity, ExclusivityClass::Exclusive("static-ip"));
        assert_eq!(suite.build_counter.unwrap().token, "IP_OCTET");
    }

    #[test]
    fn test_upgrade_suite_pins_old_ubuntu() {
        let suite = ubuntu_upgrade_suite();
        let ScenarioPlan::Pinned(scenario) = &suite.plan else {
            panic!("upgrade suite must pin a scenario");
        };
        assert_eq!(
            *scenario,
            Scenario::new(OsFlavor::Ubuntu, ContainerRuntime::Docker, "1.10.5")
        );
        assert_eq!(suite.exclusivity, ExclusivityClass::Exclusive("upgrade-net"));
    }

    #[test]
    fn test_manifest_files_follow_provider_naming() {
        for provider in Provider::all() {
            assert_eq!(
                provider.manifest_file(),
                format!("machineset-{}.yaml", provider.as_str())
            );
        }
    }
}
