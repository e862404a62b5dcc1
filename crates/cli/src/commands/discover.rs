//! List the fixture pages a run would execute

use anyhow::Result;
use clap::Args;
use serde::Serialize;
use std::path::PathBuf;

use pagetest_runner::discover_sorted;

use crate::config::PagetestConfig;
use crate::output::{print_list, OutputFormat, TableDisplay};

#[derive(Args)]
pub struct DiscoverArgs {
    /// Fixture root (overrides fixtures.root)
    #[arg(long)]
    pub root: Option<PathBuf>,

    /// Fixture file name suffix (overrides fixtures.suffix)
    #[arg(long)]
    pub suffix: Option<String>,
}

#[derive(Serialize)]
pub struct FixtureInfo {
    pub path: PathBuf,
}

impl TableDisplay for FixtureInfo {
    fn headers() -> Vec<&'static str> {
        vec!["Fixture"]
    }

    fn row(&self) -> Vec<String> {
        vec![self.path.display().to_string()]
    }
}

pub fn execute(args: DiscoverArgs, config: &PagetestConfig, format: OutputFormat) -> Result<()> {
    let root = args.root.unwrap_or_else(|| config.fixtures.root.clone());
    let suffix = args.suffix.unwrap_or_else(|| config.fixtures.suffix.clone());

    let fixtures: Vec<FixtureInfo> = discover_sorted(&root, &suffix)?
        .into_iter()
        .map(|path| FixtureInfo { path })
        .collect();

    print_list(&fixtures, format)
}
