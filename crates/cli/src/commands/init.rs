//! Write a default configuration file

use anyhow::{bail, Result};
use clap::Args;
use std::path::Path;

use crate::config::PagetestConfig;
use crate::output::print_success;

#[derive(Args)]
pub struct InitArgs {
    /// Overwrite an existing file
    #[arg(long)]
    pub force: bool,
}

pub fn execute(args: InitArgs, path: &Path) -> Result<()> {
    if path.exists() && !args.force {
        bail!("{} already exists (use --force to overwrite)", path.display());
    }

    PagetestConfig::default().save(path)?;
    print_success(&format!("Wrote {}", path.display()));
    Ok(())
}
