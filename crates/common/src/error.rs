//! Error types for pagetest

use std::path::PathBuf;
use thiserror::Error;

/// Result type alias using the pagetest Error
pub type Result<T> = std::result::Result<T, Error>;

/// Pagetest error types
#[derive(Error, Debug)]
pub enum Error {
    #[error("Filesystem error at {}: {source}", path.display())]
    Filesystem {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Unsupported platform: {os}/{arch}")]
    UnsupportedPlatform { os: String, arch: String },

    #[error("Runner error: {0}")]
    Runner(#[from] RunnerError),

    #[error("Decode error: {0}")]
    Decode(#[from] DecodeError),

    #[error("Failed to write report {}: {message}", path.display())]
    ReportWrite { path: PathBuf, message: String },

    #[error("Invalid configuration: {0}")]
    Config(String),

    #[error("Fixture {}: {source}", path.display())]
    Fixture {
        path: PathBuf,
        #[source]
        source: Box<Error>,
    },
}

/// Failures while driving the headless executable
#[derive(Error, Debug)]
pub enum RunnerError {
    #[error("failed to spawn {}: {source}", executable.display())]
    Spawn {
        executable: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to read runner output: {0}")]
    Read(#[source] std::io::Error),

    #[error("wait for runner process was interrupted: {0}")]
    Wait(#[source] std::io::Error),

    #[error("resource not found: {}", .0.display())]
    ResourceNotFound(PathBuf),

    #[error("runner did not finish within {seconds}s")]
    Timeout { seconds: u64 },
}

/// Failures while decoding a runner payload
#[derive(Error, Debug)]
pub enum DecodeError {
    #[error("runner produced no output")]
    Empty,

    #[error("malformed payload: {0}")]
    Malformed(#[from] serde_json::Error),
}

impl Error {
    /// Build a filesystem error for `path`
    pub fn filesystem(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Error::Filesystem {
            path: path.into(),
            source,
        }
    }

    /// Attach the fixture that was being processed when this error occurred
    pub fn for_fixture(self, path: impl Into<PathBuf>) -> Self {
        match self {
            // Never nest fixture context twice
            Error::Fixture { .. } => self,
            other => Error::Fixture {
                path: path.into(),
                source: Box::new(other),
            },
        }
    }

    /// The innermost error, skipping fixture context
    pub fn root(&self) -> &Error {
        match self {
            Error::Fixture { source, .. } => source.root(),
            other => other,
        }
    }

    /// Whether this error came from decoding a payload
    pub fn is_decode(&self) -> bool {
        matches!(self.root(), Error::Decode(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fixture_context_is_not_nested() {
        let err = Error::Decode(DecodeError::Empty)
            .for_fixture("a/FooTest.html")
            .for_fixture("b/BarTest.html");

        match &err {
            Error::Fixture { path, .. } => assert_eq!(path, &PathBuf::from("a/FooTest.html")),
            other => panic!("unexpected error: {other:?}"),
        }
        assert!(err.is_decode());
    }

    #[test]
    fn test_display_includes_fixture_and_cause() {
        let err = Error::Runner(RunnerError::Timeout { seconds: 15 }).for_fixture("FooTest.html");
        let msg = err.to_string();
        assert!(msg.contains("FooTest.html"));
        assert!(msg.contains("15s"));
    }
}
