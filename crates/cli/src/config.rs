//! `pagetest.toml` configuration

use anyhow::Context;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

use pagetest_report::ReportOptions;
use pagetest_runner::{HeadlessConfig, DEFAULT_FIXTURE_SUFFIX};

pub const DEFAULT_CONFIG_FILE: &str = "pagetest.toml";

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PagetestConfig {
    pub fixtures: FixturesConfig,
    pub runtime: RuntimeConfig,
    pub report: ReportConfig,
}

/// Where fixture pages are found
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FixturesConfig {
    pub root: PathBuf,

    /// File name suffix marking a fixture page
    pub suffix: String,
}

impl Default for FixturesConfig {
    fn default() -> Self {
        Self {
            root: PathBuf::from("."),
            suffix: DEFAULT_FIXTURE_SUFFIX.to_string(),
        }
    }
}

/// Headless executable and how it is driven
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RuntimeConfig {
    /// Root of the `{os}/{arch}/{executable}` bundle tree
    pub bundle_dir: PathBuf,

    pub executable: String,

    pub driver_script: PathBuf,

    /// Forwarded to the driver script as its timeout argument
    #[serde(skip_serializing_if = "Option::is_none")]
    pub driver_timeout_secs: Option<u32>,

    /// Per-fixture deadline enforced on the subprocess
    #[serde(skip_serializing_if = "Option::is_none")]
    pub timeout_secs: Option<u64>,

    /// Fixtures run concurrently
    pub jobs: usize,
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        Self {
            bundle_dir: PathBuf::from("headless"),
            executable: "phantomjs".to_string(),
            driver_script: PathBuf::from("driver/test-driver.js"),
            driver_timeout_secs: None,
            timeout_secs: None,
            jobs: 1,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ReportConfig {
    pub output_dir: PathBuf,

    /// Qualified suite name used for the JUnit file name
    pub suite_name: String,

    pub html: bool,
    pub junit: bool,
}

impl Default for ReportConfig {
    fn default() -> Self {
        Self {
            output_dir: PathBuf::from("test-output"),
            suite_name: pagetest_runner::harness::DEFAULT_SUITE_NAME.to_string(),
            html: true,
            junit: true,
        }
    }
}

impl PagetestConfig {
    /// Load configuration from file, falling back to defaults when it is absent
    pub fn load(path: &Path) -> anyhow::Result<Self> {
        if path.exists() {
            let content = std::fs::read_to_string(path)
                .with_context(|| format!("reading {}", path.display()))?;
            let config: Self = toml::from_str(&content)
                .with_context(|| format!("parsing {}", path.display()))?;
            config.validate()?;
            Ok(config)
        } else {
            Ok(Self::default())
        }
    }

    /// Save configuration to file
    pub fn save(&self, path: &Path) -> anyhow::Result<()> {
        let content = toml::to_string_pretty(self)?;
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(path, content)?;
        Ok(())
    }

    pub fn validate(&self) -> anyhow::Result<()> {
        if self.fixtures.suffix.is_empty() {
            anyhow::bail!(pagetest_common::Error::Config(
                "fixtures.suffix must not be empty".to_string()
            ));
        }
        if self.runtime.jobs == 0 {
            anyhow::bail!(pagetest_common::Error::Config(
                "runtime.jobs must be at least 1".to_string()
            ));
        }
        Ok(())
    }

    pub fn headless(&self) -> HeadlessConfig {
        HeadlessConfig {
            bundle_dir: self.runtime.bundle_dir.clone(),
            executable: self.runtime.executable.clone(),
            executable_path: None,
            driver_script: self.runtime.driver_script.clone(),
            driver_timeout_secs: self.runtime.driver_timeout_secs,
            timeout: self.runtime.timeout_secs.map(Duration::from_secs),
            platform: None,
        }
    }

    pub fn report_options(&self) -> ReportOptions {
        ReportOptions {
            html: self.report.html,
            junit: self.report.junit,
        }
    }
}
