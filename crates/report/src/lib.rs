//! Pagetest reports
//!
//! Renders executed suites as an emailable HTML page and as one JUnit-style
//! XML file per suite. Both emitters group records through [`aggregate`].

pub mod aggregate;
pub mod format;
pub mod html;
pub mod junit;

use std::path::{Path, PathBuf};
use tracing::error;

use pagetest_common::{Result, SuiteRun};

pub use aggregate::{
    aggregate, partition, traversal_order, Bucket, GroupKey, GroupedReportNode, ReportRow,
};
pub use html::{write_html, HTML_REPORT_FILE};
pub use junit::{write_junit, JunitWriter};

/// Which reports to write
#[derive(Debug, Clone, Copy)]
pub struct ReportOptions {
    pub html: bool,
    pub junit: bool,
}

impl Default for ReportOptions {
    fn default() -> Self {
        Self {
            html: true,
            junit: true,
        }
    }
}

/// Write the selected reports into `output_dir`, returning the files written.
///
/// The first failure stops report writing.
pub fn write_reports(output_dir: &Path, runs: &[SuiteRun], options: ReportOptions) -> Result<Vec<PathBuf>> {
    let mut written = Vec::new();

    if options.html {
        match write_html(output_dir, runs) {
            Ok(path) => written.push(path),
            Err(e) => {
                error!("Failed to write HTML report: {}", e);
                return Err(e);
            }
        }
    }

    if options.junit {
        match write_junit(output_dir, runs) {
            Ok(paths) => written.extend(paths),
            Err(e) => {
                error!("Failed to write JUnit report: {}", e);
                return Err(e);
            }
        }
    }

    Ok(written)
}
