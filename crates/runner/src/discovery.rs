//! Fixture discovery - finding browser test pages under a root directory

use std::path::{Path, PathBuf};
use tracing::debug;

use pagetest_common::{Error, Result};

/// File name suffix that marks a browser test page
pub const DEFAULT_FIXTURE_SUFFIX: &str = "Test.html";

/// Find every file below `root` whose name ends with `suffix`.
///
/// The walk order is whatever the filesystem yields; use [`discover_sorted`]
/// when reports need to be reproducible.
pub fn discover(root: &Path, suffix: &str) -> Result<Vec<PathBuf>> {
    let metadata = std::fs::metadata(root).map_err(|e| Error::filesystem(root, e))?;
    if !metadata.is_dir() {
        return Err(Error::filesystem(
            root,
            std::io::Error::new(std::io::ErrorKind::InvalidInput, "not a directory"),
        ));
    }

    let mut fixtures = Vec::new();
    for entry in walkdir::WalkDir::new(root).follow_links(true) {
        let entry = entry.map_err(|e| {
            let path = e.path().unwrap_or(root).to_path_buf();
            let source = e
                .into_io_error()
                .unwrap_or_else(|| std::io::Error::new(std::io::ErrorKind::Other, "filesystem loop"));
            Error::filesystem(path, source)
        })?;

        if !entry.file_type().is_file() {
            continue;
        }

        let matches = entry
            .file_name()
            .to_str()
            .map(|name| name.ends_with(suffix))
            .unwrap_or(false);

        if matches {
            debug!("Found fixture: {}", entry.path().display());
            fixtures.push(entry.into_path());
        }
    }

    Ok(fixtures)
}

/// Like [`discover`], sorted by path
pub fn discover_sorted(root: &Path, suffix: &str) -> Result<Vec<PathBuf>> {
    let mut fixtures = discover(root, suffix)?;
    fixtures.sort();
    Ok(fixtures)
}
