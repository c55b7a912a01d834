//! The external provisioning collaborator.
//!
//! The orchestrator does not talk to any cloud API itself. It hands a
//! materialized manifest, the scenario descriptor, and the run tag to a
//! [`Provisioner`] and blocks on the outcome: the collaborator applies the
//! manifest, waits for the resulting node to join the target cluster, and
//! reports success or failure.

use async_trait::async_trait;
use machina_core::{RunTag, Scenario};
use std::path::PathBuf;
use std::process::Stdio;
use std::time::Duration;
use thiserror::Error;
use tokio::io::AsyncWriteExt;
use tokio::process::Command;
use tracing::debug;

/// One provisioning request: everything the collaborator needs.
#[derive(Debug, Clone)]
pub struct ProvisionRequest {
    /// Fully materialized manifest, no placeholders left.
    pub manifest: String,
    /// The combination being provisioned.
    pub scenario: Scenario,
    /// Scenario-local tag namespacing the created resources.
    pub tag: RunTag,
}

/// Errors reported by the collaborator.
#[derive(Debug, Error)]
pub enum ProvisionError {
    /// The collaborator reported failure.
    #[error("provisioning failed: {0}")]
    Failed(String),
    /// The collaborator did not finish in time.
    #[error("provisioning timed out after {0:?}")]
    TimedOut(Duration),
}

/// An opaque, blocking provisioning call per scenario.
#[async_trait]
pub trait Provisioner: Send + Sync {
    async fn provision(&self, request: &ProvisionRequest) -> Result<(), ProvisionError>;
}

/// Default provisioning timeout. Node boot plus cluster join is slow on
/// every provider; 40 minutes matches the slowest observed (vSphere).
const DEFAULT_TIMEOUT: Duration = Duration::from_secs(40 * 60);

/// Runs an external verifier command per scenario.
///
/// The manifest is written to the command's stdin; the scenario name and run
/// tag are passed as arguments. A non-zero exit is a provisioning failure.
pub struct CommandProvisioner {
    command: PathBuf,
    timeout: Duration,
}

impl CommandProvisioner {
    pub fn new(command: impl Into<PathBuf>) -> Self {
        Self {
            command: command.into(),
            timeout: DEFAULT_TIMEOUT,
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }
}

#[async_trait]
impl Provisioner for CommandProvisioner {
    async fn provision(&self, request: &ProvisionRequest) -> Result<(), ProvisionError> {
        debug!(
            scenario = %request.scenario,
            tag = %request.tag,
            command = %self.command.display(),
            "dispatching provisioning run"
        );

        let mut child = Command::new(&self.command)
            .arg("--scenario")
            .arg(request.scenario.name())
            .arg("--tag")
            .arg(request.tag.as_str())
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .map_err(|e| {
                ProvisionError::Failed(format!(
                    "failed to spawn {}: {e}",
                    self.command.display()
                ))
            })?;

        if let Some(mut stdin) = child.stdin.take() {
            // Best effort: a verifier that exits before reading the manifest
            // closes the pipe, and its exit status is the verdict we report.
            if let Err(e) = stdin.write_all(request.manifest.as_bytes()).await {
                debug!(error = %e, "verifier closed stdin before reading the manifest");
            }
            // Close stdin so the verifier sees EOF.
            drop(stdin);
        }

        let output = tokio::time::timeout(self.timeout, child.wait_with_output())
            .await
            .map_err(|_| ProvisionError::TimedOut(self.timeout))?
            .map_err(|e| ProvisionError::Failed(format!("failed to collect output: {e}")))?;

        if output.status.success() {
            Ok(())
        } else {
            let stderr = String::from_utf8_lossy(&output.stderr);
            Err(ProvisionError::Failed(format!(
                "verifier exited with {}: {}",
                output.status,
                stderr.trim()
            )))
        }
    }
}
