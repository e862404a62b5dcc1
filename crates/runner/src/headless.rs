//! Headless runner - drives the bundled browser executable against one fixture

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::time::Duration;
use tokio::io::{AsyncBufReadExt, AsyncReadExt, BufReader};
use tokio::process::{Child, ChildStderr, ChildStdout, Command};
use tracing::{debug, info, warn};

use pagetest_common::{Result, RunnerError};

use crate::platform::{self, Platform};

/// How long a timed-out runner gets to exit after SIGTERM
const TERMINATE_GRACE: Duration = Duration::from_millis(500);

/// Captured output of one runner invocation
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RawOutput {
    /// All stdout lines concatenated without separators
    pub stdout: String,
    pub stderr: String,
    /// Exit code, `None` if the process was killed by a signal
    pub exit_code: Option<i32>,
}

impl RawOutput {
    pub fn success(&self) -> bool {
        self.exit_code == Some(0)
    }
}

/// Something that can execute a fixture and hand back its raw output
#[async_trait]
pub trait FixtureExecutor: Send + Sync {
    async fn execute(&self, fixture: &Path) -> Result<RawOutput>;
}

/// Configuration for the headless runner
#[derive(Debug, Clone)]
pub struct HeadlessConfig {
    /// Root of the bundled executable tree
    pub bundle_dir: PathBuf,

    /// Executable base name inside the bundle
    pub executable: String,

    /// Explicit executable, bypassing the bundle layout
    pub executable_path: Option<PathBuf>,

    /// Driver script passed as the first argument
    pub driver_script: PathBuf,

    /// Inactivity timeout forwarded to the driver script
    pub driver_timeout_secs: Option<u32>,

    /// Hard deadline for one fixture (None = wait forever)
    pub timeout: Option<Duration>,

    /// Platform override (None = detect)
    pub platform: Option<Platform>,
}

impl Default for HeadlessConfig {
    fn default() -> Self {
        Self {
            bundle_dir: PathBuf::from("headless"),
            executable: "phantomjs".to_string(),
            executable_path: None,
            driver_script: PathBuf::from("driver/test-driver.js"),
            driver_timeout_secs: None,
            timeout: None,
            platform: None,
        }
    }
}

/// Handle to a resolved, runnable headless executable
#[derive(Debug, Clone)]
pub struct HeadlessRunner {
    executable: PathBuf,
    driver_script: PathBuf,
    driver_timeout_secs: Option<u32>,
    timeout: Option<Duration>,
}

impl HeadlessRunner {
    /// Resolve the executable and driver and make sure the executable can run
    pub fn new(config: HeadlessConfig) -> Result<Self> {
        let executable = match &config.executable_path {
            Some(path) => {
                if !path.is_file() {
                    return Err(RunnerError::ResourceNotFound(path.clone()).into());
                }
                path.clone()
            }
            None => {
                let platform = match config.platform {
                    Some(platform) => platform,
                    None => Platform::detect()?,
                };
                platform::resolve_executable(&config.bundle_dir, &config.executable, platform)?
            }
        };

        if !config.driver_script.is_file() {
            return Err(RunnerError::ResourceNotFound(config.driver_script.clone()).into());
        }

        platform::ensure_executable(&executable)?;

        info!("Using headless executable {}", executable.display());

        Ok(Self {
            executable,
            driver_script: config.driver_script,
            driver_timeout_secs: config.driver_timeout_secs,
            timeout: config.timeout,
        })
    }

    pub fn executable(&self) -> &Path {
        &self.executable
    }

    /// Arguments for one invocation
    pub fn args(&self, fixture: &Path) -> Vec<String> {
        let mut args = vec![
            self.driver_script.to_string_lossy().into_owned(),
            fixture.to_string_lossy().into_owned(),
        ];
        if let Some(secs) = self.driver_timeout_secs {
            args.push(secs.to_string());
        }
        args
    }

    /// Run the executable against one fixture and capture its output.
    ///
    /// A nonzero exit code is not an error; only the payload decides.
    pub async fn run(&self, fixture: &Path) -> Result<RawOutput> {
        self.run_inner(fixture)
            .await
            .map_err(|e| e.for_fixture(fixture))
    }

    async fn run_inner(&self, fixture: &Path) -> Result<RawOutput> {
        debug!("Spawning {} {:?}", self.executable.display(), self.args(fixture));

        let mut child = Command::new(&self.executable)
            .args(self.args(fixture))
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .map_err(|source| RunnerError::Spawn {
                executable: self.executable.clone(),
                source,
            })?;

        let stdout = child.stdout.take().ok_or_else(|| {
            RunnerError::Read(std::io::Error::new(
                std::io::ErrorKind::BrokenPipe,
                "stdout was not captured",
            ))
        })?;
        let stderr = child.stderr.take();

        let output = match self.timeout {
            Some(limit) => {
                let result = tokio::time::timeout(limit, capture(&mut child, stdout, stderr)).await;
                match result {
                    Ok(output) => output,
                    Err(_) => {
                        warn!("{} exceeded {:?}, terminating", fixture.display(), limit);
                        terminate(&mut child).await;
                        return Err(RunnerError::Timeout {
                            seconds: limit.as_secs(),
                        }
                        .into());
                    }
                }
            }
            None => capture(&mut child, stdout, stderr).await,
        }?;

        match output.exit_code {
            Some(0) => {}
            Some(code) => warn!("{} exited with status {}", fixture.display(), code),
            None => warn!("{} was terminated by a signal", fixture.display()),
        }
        if !output.stderr.trim().is_empty() {
            debug!("stderr from {}: {}", fixture.display(), output.stderr.trim());
        }
        debug!("Captured {} bytes from {}", output.stdout.len(), fixture.display());

        Ok(output)
    }
}

#[async_trait]
impl FixtureExecutor for HeadlessRunner {
    async fn execute(&self, fixture: &Path) -> Result<RawOutput> {
        self.run(fixture).await
    }
}

/// Drain stdout and stderr, then wait for the process to exit
async fn capture(
    child: &mut Child,
    stdout: ChildStdout,
    stderr: Option<ChildStderr>,
) -> Result<RawOutput> {
    let read_stdout = async {
        let mut lines = BufReader::new(stdout).lines();
        let mut text = String::new();
        while let Some(line) = lines.next_line().await? {
            text.push_str(&line);
        }
        Ok::<_, std::io::Error>(text)
    };

    let read_stderr = async {
        let mut text = String::new();
        if let Some(mut stderr) = stderr {
            stderr.read_to_string(&mut text).await?;
        }
        Ok::<_, std::io::Error>(text)
    };

    let (stdout, stderr) = tokio::join!(read_stdout, read_stderr);
    let stdout = stdout.map_err(RunnerError::Read)?;
    let stderr = stderr.unwrap_or_else(|e| {
        warn!("Could not read runner stderr: {}", e);
        String::new()
    });

    let status = child.wait().await.map_err(RunnerError::Wait)?;

    Ok(RawOutput {
        stdout,
        stderr,
        exit_code: status.code(),
    })
}

/// Ask the process to stop, then force it
async fn terminate(child: &mut Child) {
    #[cfg(unix)]
    {
        use nix::sys::signal::{kill, Signal};
        use nix::unistd::Pid;

        if let Some(pid) = child.id() {
            if kill(Pid::from_raw(pid as i32), Signal::SIGTERM).is_ok()
                && tokio::time::timeout(TERMINATE_GRACE, child.wait()).await.is_ok()
            {
                return;
            }
        }
    }

    if let Err(e) = child.kill().await {
        warn!("Could not kill runner process: {}", e);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pagetest_common::Error;

    #[test]
    fn test_args_include_optional_driver_timeout() {
        let runner = HeadlessRunner {
            executable: PathBuf::from("phantomjs"),
            driver_script: PathBuf::from("driver.js"),
            driver_timeout_secs: Some(30),
            timeout: None,
        };
        assert_eq!(
            runner.args(Path::new("/fixtures/LoginTest.html")),
            vec!["driver.js", "/fixtures/LoginTest.html", "30"]
        );
    }

    #[test]
    fn test_missing_driver_is_reported() {
        let tmp = tempfile::tempdir().unwrap();
        let exe = tmp.path().join("runtime");
        std::fs::write(&exe, "").unwrap();

        let config = HeadlessConfig {
            executable_path: Some(exe),
            driver_script: tmp.path().join("missing.js"),
            ..Default::default()
        };
        match HeadlessRunner::new(config) {
            Err(Error::Runner(RunnerError::ResourceNotFound(path))) => {
                assert!(path.ends_with("missing.js"));
            }
            other => panic!("unexpected result: {other:?}"),
        }
    }
}
