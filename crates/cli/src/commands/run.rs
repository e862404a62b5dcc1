//! Run every fixture and write the reports

use anyhow::Result;
use clap::Args;
use serde::Serialize;
use std::path::PathBuf;
use tracing::{info, warn};

use pagetest_common::Outcome;
use pagetest_report::write_reports;
use pagetest_runner::{discover_sorted, flatten, Harness, HeadlessRunner, SuiteCollector};

use crate::config::PagetestConfig;
use crate::output::{print_item, print_success, print_warning, OutputFormat, TableDisplay};

#[derive(Args)]
pub struct RunArgs {
    /// Fixture root (overrides fixtures.root)
    #[arg(long)]
    pub root: Option<PathBuf>,

    /// Report directory (overrides report.output_dir)
    #[arg(short, long)]
    pub output: Option<PathBuf>,

    /// Fixtures to run concurrently (overrides runtime.jobs)
    #[arg(short, long)]
    pub jobs: Option<usize>,

    /// Per-fixture deadline in seconds (overrides runtime.timeout_secs)
    #[arg(long)]
    pub timeout: Option<u64>,
}

impl RunArgs {
    fn apply(self, mut config: PagetestConfig) -> PagetestConfig {
        if let Some(root) = self.root {
            config.fixtures.root = root;
        }
        if let Some(output) = self.output {
            config.report.output_dir = output;
        }
        if let Some(jobs) = self.jobs {
            config.runtime.jobs = jobs.max(1);
        }
        if let Some(timeout) = self.timeout {
            config.runtime.timeout_secs = Some(timeout);
        }
        config
    }
}

/// Outcome of one `run`
#[derive(Serialize)]
pub struct RunSummary {
    pub suite: String,
    pub fixtures: usize,
    pub tests: usize,
    pub passed: usize,
    pub failed: usize,
    pub skipped: usize,
    pub duration_ms: i64,
    pub reports: Vec<PathBuf>,
}

impl TableDisplay for RunSummary {
    fn headers() -> Vec<&'static str> {
        vec!["Suite", "Fixtures", "Tests", "Passed", "Failed", "Skipped", "Time (ms)"]
    }

    fn row(&self) -> Vec<String> {
        vec![
            self.suite.clone(),
            self.fixtures.to_string(),
            self.tests.to_string(),
            self.passed.to_string(),
            self.failed.to_string(),
            self.skipped.to_string(),
            self.duration_ms.to_string(),
        ]
    }
}

/// Returns whether every test passed
pub async fn execute(args: RunArgs, config: PagetestConfig, format: OutputFormat) -> Result<bool> {
    let config = args.apply(config);
    config.validate()?;

    let fixtures = discover_sorted(&config.fixtures.root, &config.fixtures.suffix)?;
    let suites = if fixtures.is_empty() {
        warn!(
            "No fixtures matching *{} under {}",
            config.fixtures.suffix,
            config.fixtures.root.display()
        );
        Vec::new()
    } else {
        let runner = HeadlessRunner::new(config.headless())?;
        let mut collector = SuiteCollector::new(runner).with_jobs(config.runtime.jobs);
        collector.collect_all(&fixtures).await?;
        collector.into_results()
    };

    let entities = flatten(&suites);
    info!("Executing {} browser test(s)", entities.len());
    let run = Harness::new(config.report.suite_name.clone()).execute(entities);

    let reports = write_reports(&config.report.output_dir, std::slice::from_ref(&run), config.report_options())?;

    let summary = RunSummary {
        suite: run.display_name().to_string(),
        fixtures: fixtures.len(),
        tests: run.records.len(),
        passed: run.count(Outcome::Passed),
        failed: run.count(Outcome::Failed),
        skipped: run.count(Outcome::Skipped),
        duration_ms: run.duration_millis(),
        reports,
    };
    print_item(&summary, format)?;

    if let OutputFormat::Table | OutputFormat::Plain = format {
        for report in &summary.reports {
            println!("  {}", report.display());
        }
        if summary.failed == 0 {
            print_success(&format!("{} test(s) passed", summary.passed));
        } else {
            print_warning(&format!("{} of {} test(s) failed", summary.failed, summary.tests));
        }
    }

    Ok(summary.failed == 0)
}
