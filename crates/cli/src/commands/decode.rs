//! Decode a captured runner payload and show the entities it yields

use anyhow::{Context, Result};
use clap::Args;
use serde::Serialize;
use std::io::Read;
use std::path::PathBuf;

use pagetest_common::{display_value, TestEntity};
use pagetest_runner::{decode, flatten};

use crate::output::{print_list, OutputFormat, TableDisplay};

#[derive(Args)]
pub struct DecodeArgs {
    /// Payload file, or `-` for stdin
    pub input: PathBuf,
}

#[derive(Serialize)]
pub struct EntityInfo {
    pub number: u32,
    pub module: String,
    pub test_case: String,
    pub passed: bool,
    pub message: String,
    pub expected: Option<String>,
    pub actual: Option<String>,
}

impl From<TestEntity> for EntityInfo {
    fn from(entity: TestEntity) -> Self {
        let message = match entity.assert() {
            Ok(()) => entity.record.message.clone(),
            Err(failure) => failure,
        };
        Self {
            number: entity.record.sequence_number,
            passed: !entity.record.is_failure,
            message,
            module: entity.module_name,
            test_case: entity.test_case_name,
            expected: entity.record.expected,
            actual: entity.record.actual,
        }
    }
}

impl TableDisplay for EntityInfo {
    fn headers() -> Vec<&'static str> {
        vec!["#", "Module", "Test", "Result", "Expected", "Actual", "Message"]
    }

    fn row(&self) -> Vec<String> {
        vec![
            self.number.to_string(),
            self.module.clone(),
            self.test_case.clone(),
            if self.passed { "pass" } else { "FAIL" }.to_string(),
            display_value(self.expected.as_deref()),
            display_value(self.actual.as_deref()),
            self.message.clone(),
        ]
    }
}

pub fn execute(args: DecodeArgs, format: OutputFormat) -> Result<()> {
    let raw = if args.input.as_os_str() == "-" {
        let mut raw = String::new();
        std::io::stdin()
            .read_to_string(&mut raw)
            .context("reading payload from stdin")?;
        raw
    } else {
        std::fs::read_to_string(&args.input)
            .with_context(|| format!("reading {}", args.input.display()))?
    };

    let suite = decode(&raw)?;
    let entities: Vec<EntityInfo> = flatten(&[suite]).into_iter().map(EntityInfo::from).collect();

    print_list(&entities, format)
}
