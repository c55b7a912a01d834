//! Suite orchestration.
//!
//! A [`SuiteRunner`] drives one provider suite through its lifecycle:
//!
//! ```text
//! Init → ValidatedParams → ScenariosSelected → Executing → Done
//!   └─────────────┴──────────────┴──▶ Aborted (precondition failure)
//! ```
//!
//! Preconditions (parameters, build counter, template binding) are checked
//! before anything is dispatched: an aborted suite has executed zero
//! scenarios. Execution failures are isolated per scenario and aggregated
//! into the suite verdict.
//!
//! Scenarios whose suite carries a named [`ExclusivityClass`] are serialized
//! against that class process-wide; everything else runs concurrently.

use crate::provider::{ExclusivityClass, ScenarioPlan, SuiteSpec};
use crate::provisioner::{ProvisionRequest, Provisioner};
use machina_core::{
    ParamError, ParamSet, ParameterSource, RunIdError, RunTag, Scenario, TemplateError,
    address_octet, bind, catalog, filter,
};
use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::{Arc, LazyLock, Mutex};
use std::time::{Duration, Instant};
use thiserror::Error;
use tokio::task::JoinSet;
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};

/// Placeholder tokens the orchestrator binds per scenario, on top of the
/// suite's resolved parameters.
const OS_NAME_TOKEN: &str = "OS_NAME";
const CONTAINER_RUNTIME_TOKEN: &str = "CONTAINER_RUNTIME";
const KUBERNETES_VERSION_TOKEN: &str = "KUBERNETES_VERSION";
const MACHINE_NAME_TOKEN: &str = "MACHINE_NAME";

/// Lifecycle state of a suite run. `Done` and `Aborted` are final.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SuitePhase {
    Init,
    ValidatedParams,
    ScenariosSelected,
    Executing,
    Done,
    Aborted,
}

impl SuitePhase {
    /// Returns the phase name in lowercase (for reports).
    pub fn as_str(&self) -> &'static str {
        match self {
            SuitePhase::Init => "init",
            SuitePhase::ValidatedParams => "validated-params",
            SuitePhase::ScenariosSelected => "scenarios-selected",
            SuitePhase::Executing => "executing",
            SuitePhase::Done => "done",
            SuitePhase::Aborted => "aborted",
        }
    }
}

/// Precondition failures that abort a suite before any dispatch.
#[derive(Debug, Error)]
pub enum SuiteError {
    #[error(transparent)]
    MissingConfiguration(#[from] ParamError),

    #[error(transparent)]
    UnresolvedPlaceholder(#[from] TemplateError),

    #[error(transparent)]
    InvalidBuildCounter(#[from] RunIdError),

    #[error("failed to read manifest template {path}: {source}")]
    ManifestRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Options shared by every suite in one harness invocation.
#[derive(Debug, Clone)]
pub struct RunOptions {
    /// Base identifier namespacing this invocation's resources.
    pub identifier: String,
    /// Directory containing the manifest template files.
    pub manifest_dir: PathBuf,
    /// Only run scenarios whose name contains this substring.
    pub filter: Option<String>,
}

impl Default for RunOptions {
    fn default() -> Self {
        Self {
            identifier: "local".to_string(),
            manifest_dir: PathBuf::from("testdata"),
            filter: None,
        }
    }
}

impl RunOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_identifier(mut self, identifier: impl Into<String>) -> Self {
        self.identifier = identifier.into();
        self
    }

    pub fn with_manifest_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.manifest_dir = dir.into();
        self
    }

    pub fn with_filter(mut self, filter: impl Into<String>) -> Self {
        self.filter = Some(filter.into());
        self
    }
}

/// Terminal result of one scenario.
#[derive(Debug, Clone)]
pub struct ScenarioResult {
    pub scenario: Scenario,
    pub tag: RunTag,
    pub passed: bool,
    pub error: Option<String>,
    pub duration: Duration,
}

/// Terminal result of one suite.
#[derive(Debug)]
pub struct SuiteOutcome {
    pub suite: String,
    pub phase: SuitePhase,
    /// The precondition failure, when `phase` is `Aborted`.
    pub abort: Option<SuiteError>,
    /// Per-scenario results, sorted by scenario name.
    pub results: Vec<ScenarioResult>,
    pub duration: Duration,
}

impl SuiteOutcome {
    pub fn passed_count(&self) -> usize {
        self.results.iter().filter(|r| r.passed).count()
    }

    pub fn failed_count(&self) -> usize {
        self.results.iter().filter(|r| !r.passed).count()
    }

    pub fn total_count(&self) -> usize {
        self.results.len()
    }

    /// The suite verdict: every scenario passed and nothing aborted.
    pub fn passed(&self) -> bool {
        self.phase == SuitePhase::Done && self.results.iter().all(|r| r.passed)
    }

    pub fn failures(&self) -> Vec<&ScenarioResult> {
        self.results.iter().filter(|r| !r.passed).collect()
    }
}

/// Process-wide locks serializing scenarios that share an exclusivity class.
static CLASS_LOCKS: LazyLock<Mutex<HashMap<&'static str, Arc<tokio::sync::Mutex<()>>>>> =
    LazyLock::new(|| Mutex::new(HashMap::new()));

fn class_lock(class: &'static str) -> Arc<tokio::sync::Mutex<()>> {
    let mut locks = CLASS_LOCKS.lock().unwrap_or_else(|e| e.into_inner());
    locks.entry(class).or_default().clone()
}

/// A scenario with its bound manifest and tag, ready to dispatch.
struct PlannedRun {
    scenario: Scenario,
    tag: RunTag,
    manifest: String,
}

/// Drives one provider suite from `Init` to a terminal phase.
pub struct SuiteRunner {
    spec: SuiteSpec,
    options: RunOptions,
    phase: SuitePhase,
}

impl SuiteRunner {
    pub fn new(spec: SuiteSpec, options: RunOptions) -> Self {
        Self {
            spec,
            options,
            phase: SuitePhase::Init,
        }
    }

    pub fn phase(&self) -> SuitePhase {
        self.phase
    }

    /// The scenarios this suite would execute, after selection and filtering.
    pub fn selected_scenarios(&self) -> Vec<Scenario> {
        let scenarios = match &self.spec.plan {
            ScenarioPlan::FullMatrix => filter(catalog(), &self.spec.selector),
            ScenarioPlan::Pinned(scenario) => vec![scenario.clone()],
        };

        match &self.options.filter {
            Some(pattern) => {
                let pattern = pattern.to_lowercase();
                scenarios
                    .into_iter()
                    .filter(|s| s.name().to_lowercase().contains(&pattern))
                    .collect()
            }
            None => scenarios,
        }
    }

    /// Runs the suite to a terminal phase.
    pub async fn run(
        &mut self,
        source: &dyn ParameterSource,
        provisioner: Arc<dyn Provisioner>,
    ) -> SuiteOutcome {
        self.run_with_cancel(source, provisioner, CancellationToken::new())
            .await
    }

    /// Runs the suite, aborting in-flight scenarios when `cancel` fires.
    ///
    /// Cancellation is best effort: dispatched provisioning calls are dropped
    /// (killing any external process), exclusivity locks are released, and
    /// interrupted scenarios are reported as failed.
    pub async fn run_with_cancel(
        &mut self,
        source: &dyn ParameterSource,
        provisioner: Arc<dyn Provisioner>,
        cancel: CancellationToken,
    ) -> SuiteOutcome {
        let started = Instant::now();
        info!(suite = %self.spec.name, "starting suite");

        let planned = match self.plan_runs(source) {
            Ok(planned) => planned,
            Err(err) => return self.abort(err, started),
        };

        self.phase = SuitePhase::Executing;
        let mut results = self.execute(planned, provisioner, cancel).await;
        results.sort_by(|a, b| a.scenario.name().cmp(b.scenario.name()));

        self.phase = SuitePhase::Done;
        let outcome = SuiteOutcome {
            suite: self.spec.name.clone(),
            phase: self.phase,
            abort: None,
            results,
            duration: started.elapsed(),
        };
        info!(
            suite = %outcome.suite,
            passed = outcome.passed_count(),
            failed = outcome.failed_count(),
            "suite finished"
        );
        outcome
    }

    /// Checks every precondition and binds every manifest, without
    /// dispatching anything.
    fn plan_runs(&mut self, source: &dyn ParameterSource) -> Result<Vec<PlannedRun>, SuiteError> {
        let mut params = ParamSet::resolve(source, self.spec.required)?;

        if let Some(counter) = self.spec.build_counter {
            let raw = source
                .get(counter.name)
                .filter(|v| !v.is_empty())
                .ok_or_else(|| ParamError::MissingConfiguration {
                    keys: vec![counter.name.to_string()],
                })?;
            let octet = address_octet(&raw)?;
            params.insert(counter.token, octet.to_string());
        }
        self.phase = SuitePhase::ValidatedParams;

        let scenarios = self.selected_scenarios();
        self.phase = SuitePhase::ScenariosSelected;
        info!(
            suite = %self.spec.name,
            scenarios = scenarios.len(),
            "selected scenarios"
        );

        let manifest_path = self.options.manifest_dir.join(self.spec.manifest_file);
        let template =
            std::fs::read_to_string(&manifest_path).map_err(|source| SuiteError::ManifestRead {
                path: manifest_path,
                source,
            })?;

        let suite_tag = RunTag::derive(self.spec.tag_prefix, &self.options.identifier);

        let mut planned = Vec::with_capacity(scenarios.len());
        for scenario in scenarios {
            let tag = suite_tag.scoped(&scenario.slug());

            let mut scenario_params = params.clone();
            scenario_params.insert(OS_NAME_TOKEN, scenario.os().as_str());
            scenario_params.insert(
                CONTAINER_RUNTIME_TOKEN,
                scenario.container_runtime().as_str(),
            );
            scenario_params.insert(KUBERNETES_VERSION_TOKEN, scenario.kubernetes_version());
            scenario_params.insert(MACHINE_NAME_TOKEN, tag.as_str());

            let manifest = bind(&template, &scenario_params)?;
            planned.push(PlannedRun {
                scenario,
                tag,
                manifest,
            });
        }

        Ok(planned)
    }

    async fn execute(
        &self,
        planned: Vec<PlannedRun>,
        provisioner: Arc<dyn Provisioner>,
        cancel: CancellationToken,
    ) -> Vec<ScenarioResult> {
        let mut tasks = JoinSet::new();

        for run in planned {
            let provisioner = provisioner.clone();
            let cancel = cancel.clone();
            let lock = match self.spec.exclusivity {
                ExclusivityClass::Exclusive(class) => Some(class_lock(class)),
                ExclusivityClass::Shared => None,
            };
            let suite = self.spec.name.clone();

            tasks.spawn(async move {
                let scenario = run.scenario.clone();
                let tag = run.tag.clone();

                let work = async move {
                    // Serialize against the class before touching the shared
                    // resource; the guard drops on completion or cancellation.
                    let _guard = match lock {
                        Some(lock) => Some(lock.lock_owned().await),
                        None => None,
                    };

                    let started = Instant::now();
                    info!(suite = %suite, scenario = %run.scenario, tag = %run.tag, "provisioning");
                    let request = ProvisionRequest {
                        manifest: run.manifest,
                        scenario: run.scenario,
                        tag: run.tag,
                    };
                    let outcome = provisioner.provision(&request).await;
                    let duration = started.elapsed();

                    match outcome {
                        Ok(()) => ScenarioResult {
                            scenario: request.scenario,
                            tag: request.tag,
                            passed: true,
                            error: None,
                            duration,
                        },
                        Err(e) => {
                            warn!(suite = %suite, scenario = %request.scenario, error = %e, "scenario failed");
                            ScenarioResult {
                                scenario: request.scenario,
                                tag: request.tag,
                                passed: false,
                                error: Some(e.to_string()),
                                duration,
                            }
                        }
                    }
                };

                tokio::select! {
                    result = work => result,
                    () = cancel.cancelled() => ScenarioResult {
                        scenario,
                        tag,
                        passed: false,
                        error: Some("cancelled before completion".to_string()),
                        duration: Duration::ZERO,
                    },
                }
            });
        }

        let mut results = Vec::new();
        while let Some(joined) = tasks.join_next().await {
            match joined {
                Ok(result) => results.push(result),
                Err(e) => error!(suite = %self.spec.name, error = %e, "scenario task failed"),
            }
        }
        results
    }

    fn abort(&mut self, err: SuiteError, started: Instant) -> SuiteOutcome {
        self.phase = SuitePhase::Aborted;
        error!(suite = %self.spec.name, error = %err, "suite aborted");
        SuiteOutcome {
            suite: self.spec.name.clone(),
            phase: self.phase,
            abort: Some(err),
            results: Vec::new(),
            duration: started.elapsed(),
        }
    }
}
