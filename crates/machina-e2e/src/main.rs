//! # machina-e2e
//!
//! End-to-end provisioning test orchestrator.
//!
//! This binary runs the provisioning scenario matrix against real
//! infrastructure providers. Credentials come from the environment; one
//! manifest template per provider is bound with the resolved parameters and
//! handed to the external verifier per scenario.
//!
//! ## Usage
//!
//! ```bash
//! # Run every provider suite
//! machina-e2e all
//!
//! # Run one provider suite
//! machina-e2e digitalocean
//!
//! # List scenarios without running anything
//! machina-e2e --list
//! ```

use clap::{Parser, ValueEnum};
use colored::Colorize;
use machina_core::EnvSource;
use machina_e2e::{
    CommandProvisioner, Provider, RunOptions, SuiteOutcome, SuiteRunner, SuiteSpec,
    TerminalReporter, Verbosity, all_suites, ubuntu_upgrade_suite, vsphere_static_ip_suite,
    write_json_report,
};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinSet;
use tokio_util::sync::CancellationToken;
use tracing::warn;
use tracing_subscriber::EnvFilter;

/// Suite selection for the harness.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum Target {
    /// Run every suite
    #[default]
    All,
    /// OpenStack matrix suite
    Openstack,
    /// DigitalOcean matrix suite
    Digitalocean,
    /// AWS matrix suite
    Aws,
    /// Azure matrix suite
    Azure,
    /// Hetzner matrix suite
    Hetzner,
    /// vSphere matrix suite
    Vsphere,
    /// vSphere static-IP suite (single scenario, address exclusive)
    VsphereStaticIp,
    /// Ubuntu 16.04 upgrade suite (single scenario, shared network)
    UbuntuUpgrade,
}

impl Target {
    fn suites(self) -> Vec<SuiteSpec> {
        match self {
            Target::All => all_suites(),
            Target::Openstack => vec![Provider::Openstack.suite()],
            Target::Digitalocean => vec![Provider::DigitalOcean.suite()],
            Target::Aws => vec![Provider::Aws.suite()],
            Target::Azure => vec![Provider::Azure.suite()],
            Target::Hetzner => vec![Provider::Hetzner.suite()],
            Target::Vsphere => vec![Provider::Vsphere.suite()],
            Target::VsphereStaticIp => vec![vsphere_static_ip_suite()],
            Target::UbuntuUpgrade => vec![ubuntu_upgrade_suite()],
        }
    }
}

/// E2E provisioning test orchestrator.
///
/// Builds the scenario matrix per provider, binds credentials into the
/// provider's manifest template, and hands each admitted scenario to the
/// external verifier.
#[derive(Parser, Debug)]
#[command(name = "machina-e2e")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Suite to run
    #[arg(value_enum, default_value_t = Target::All)]
    pub suite: Target,

    /// Unique identifier for this test run, used to namespace created resources
    #[arg(long, env = "MACHINA_E2E_IDENTIFIER", default_value = "local")]
    pub identifier: String,

    /// Directory containing the manifest template files
    #[arg(long, default_value = "testdata")]
    pub manifest_dir: PathBuf,

    /// Only run scenarios whose name contains this pattern
    #[arg(long)]
    pub filter: Option<String>,

    /// List selected scenarios without running them
    #[arg(long)]
    pub list: bool,

    /// External verifier command dispatched once per scenario
    #[arg(long, default_value = "machina-verify")]
    pub verifier: PathBuf,

    /// Write a machine-readable JSON report to this path
    #[arg(long)]
    pub report: Option<PathBuf>,

    /// Per-scenario provisioning timeout, in minutes
    #[arg(long, default_value_t = 40)]
    pub timeout_minutes: u64,

    /// Show per-scenario detail in the summary
    #[arg(short, long)]
    pub verbose: bool,

    /// Only show the pass/fail summary
    #[arg(short, long)]
    pub quiet: bool,
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    println!(
        "\n{} {}",
        "Provisioning E2E".bold(),
        format!("v{}", env!("CARGO_PKG_VERSION")).dimmed()
    );
    println!("{}", "━".repeat(40).dimmed());

    let verbosity = if cli.quiet {
        Verbosity::Quiet
    } else if cli.verbose {
        Verbosity::Verbose
    } else {
        Verbosity::Normal
    };

    let rt = tokio::runtime::Runtime::new().expect("Failed to create Tokio runtime");

    if cli.list {
        list_scenarios(&cli);
        return;
    }

    rt.block_on(run_suites(&cli, verbosity));
}

fn options(cli: &Cli) -> RunOptions {
    let mut options = RunOptions::new()
        .with_identifier(&cli.identifier)
        .with_manifest_dir(&cli.manifest_dir);
    if let Some(filter) = &cli.filter {
        options = options.with_filter(filter);
    }
    options
}

fn list_scenarios(cli: &Cli) {
    let options = options(cli);
    println!("{}\n", "Selected scenarios:".bold());

    for spec in cli.suite.suites() {
        let name = spec.name.clone();
        let runner = SuiteRunner::new(spec, options.clone());
        let scenarios = runner.selected_scenarios();

        println!("  {}", name.bold().underline());
        for scenario in &scenarios {
            println!("    {}", scenario.name().cyan());
        }
        println!(
            "    {}",
            format!(
                "{} scenario{}",
                scenarios.len(),
                if scenarios.len() == 1 { "" } else { "s" }
            )
            .dimmed()
        );
    }
}

async fn run_suites(cli: &Cli, verbosity: Verbosity) {
    let options = options(cli);
    let provisioner = Arc::new(
        CommandProvisioner::new(&cli.verifier)
            .with_timeout(Duration::from_secs(cli.timeout_minutes * 60)),
    );

    // Best-effort cancellation: Ctrl-C stops dispatching and kills in-flight
    // verifier processes; exclusivity locks release with their tasks.
    let cancel = CancellationToken::new();
    {
        let cancel = cancel.clone();
        tokio::spawn(async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                warn!("interrupt received, cancelling in-flight scenarios");
                cancel.cancel();
            }
        });
    }

    let mut tasks = JoinSet::new();
    for spec in cli.suite.suites() {
        let options = options.clone();
        let provisioner = provisioner.clone();
        let cancel = cancel.clone();
        tasks.spawn(async move {
            let mut runner = SuiteRunner::new(spec, options);
            runner
                .run_with_cancel(&EnvSource, provisioner, cancel)
                .await
        });
    }

    let mut outcomes: Vec<SuiteOutcome> = Vec::new();
    while let Some(joined) = tasks.join_next().await {
        match joined {
            Ok(outcome) => outcomes.push(outcome),
            Err(e) => eprintln!("{} suite task failed: {e}", "Error:".red().bold()),
        }
    }
    outcomes.sort_by(|a, b| a.suite.cmp(&b.suite));

    if let Some(path) = &cli.report {
        match write_json_report(path, &outcomes) {
            Ok(()) => {
                if verbosity != Verbosity::Quiet {
                    println!("{}", format!("Report written: {}", path.display()).dimmed());
                }
            }
            Err(e) => {
                eprintln!("{} Failed to write report: {e}", "Warning:".yellow());
            }
        }
    }

    let reporter = TerminalReporter::with_verbosity(verbosity);
    if verbosity != Verbosity::Quiet {
        reporter.print_failures(&outcomes);
    }
    reporter.print_summary(&outcomes);

    if !outcomes.iter().all(SuiteOutcome::passed) {
        std::process::exit(1);
    }
}
