//! Terminal and file reporting for suite outcomes.

use crate::suite::{SuiteOutcome, SuitePhase};
use colored::Colorize;
use serde::Serialize;
use std::path::Path;

/// How much detail to print during and after a run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Verbosity {
    Quiet,
    #[default]
    Normal,
    Verbose,
}

/// Prints per-scenario outcomes and the overall verdict.
#[derive(Debug, Default)]
pub struct TerminalReporter {
    verbosity: Verbosity,
}

impl TerminalReporter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_verbosity(verbosity: Verbosity) -> Self {
        Self { verbosity }
    }

    /// Prints the details of every failed or aborted suite.
    pub fn print_failures(&self, outcomes: &[SuiteOutcome]) {
        for outcome in outcomes.iter().filter(|o| !o.passed()) {
            println!("\n{}", format!("Suite: {}", outcome.suite).bold());

            if let Some(abort) = &outcome.abort {
                println!("  {} {}", "aborted:".red().bold(), abort);
                continue;
            }

            for failure in outcome.failures() {
                println!(
                    "  {} {} ({})",
                    "✗".red(),
                    failure.scenario.name(),
                    failure.tag
                );
                if let Some(error) = &failure.error {
                    println!("    {}", error.dimmed());
                }
            }
        }
    }

    /// Prints one line per suite plus the overall verdict.
    pub fn print_summary(&self, outcomes: &[SuiteOutcome]) {
        println!();
        for outcome in outcomes {
            println!("{}", summary_line(outcome));
            if self.verbosity == Verbosity::Verbose {
                for result in &outcome.results {
                    let mark = if result.passed {
                        "✓".green()
                    } else {
                        "✗".red()
                    };
                    println!(
                        "    {} {} [{:.0?}]",
                        mark,
                        result.scenario.name(),
                        result.duration
                    );
                }
            }
        }

        let all_passed = outcomes.iter().all(SuiteOutcome::passed);
        let verdict = if all_passed {
            "PASS".green().bold()
        } else {
            "FAIL".red().bold()
        };
        println!("\n{} {}", "Overall:".bold(), verdict);
    }
}

#[derive(Serialize)]
struct ScenarioReport<'a> {
    scenario: &'a str,
    tag: &'a str,
    passed: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<&'a str>,
    duration_secs: f64,
}

#[derive(Serialize)]
struct SuiteReport<'a> {
    suite: &'a str,
    phase: &'a str,
    passed: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    abort: Option<String>,
    scenarios: Vec<ScenarioReport<'a>>,
}

#[derive(Serialize)]
struct RunReport<'a> {
    passed: bool,
    suites: Vec<SuiteReport<'a>>,
}

/// Writes a machine-readable run report as JSON.
pub fn write_json_report(path: &Path, outcomes: &[SuiteOutcome]) -> std::io::Result<()> {
    let report = RunReport {
        passed: outcomes.iter().all(SuiteOutcome::passed),
        suites: outcomes
            .iter()
            .map(|outcome| SuiteReport {
                suite: &outcome.suite,
                phase: outcome.phase.as_str(),
                passed: outcome.passed(),
                abort: outcome.abort.as_ref().map(|e| e.to_string()),
                scenarios: outcome
                    .results
                    .iter()
                    .map(|result| ScenarioReport {
                        scenario: result.scenario.name(),
                        tag: result.tag.as_str(),
                        passed: result.passed,
                        error: result.error.as_deref(),
                        duration_secs: result.duration.as_secs_f64(),
                    })
                    .collect(),
            })
            .collect(),
    };

    let json = serde_json::to_string_pretty(&report)?;
    std::fs::write(path, json)
}

/// One-line suite summary, e.g. `"openstack: 17/18 passed, 1 failed in 1920s"`.
fn summary_line(outcome: &SuiteOutcome) -> String {
    match outcome.phase {
        SuitePhase::Aborted => format!(
            "  {} {}: {}",
            "⊘".red(),
            outcome.suite,
            "aborted, no scenarios executed".red()
        ),
        _ if outcome.passed() => format!(
            "  {} {}: {}/{} passed in {:.0?}",
            "✓".green(),
            outcome.suite,
            outcome.passed_count(),
            outcome.total_count(),
            outcome.duration
        ),
        _ => format!(
            "  {} {}: {}/{} passed, {} failed in {:.0?}",
            "✗".red(),
            outcome.suite,
            outcome.passed_count(),
            outcome.total_count(),
            outcome.failed_count(),
            outcome.duration
        ),
    }
}
