//! Suite collection - run fixtures, decode their payloads, keep the results
//!
//! A fixture's result is only kept once its payload decoded in full. The
//! first failing fixture stops collection; whatever was collected before it
//! stays available.

use futures::stream::{self, StreamExt};
use std::path::{Path, PathBuf};
use std::time::Instant;
use tracing::{error, info};

use pagetest_common::{Result, SuiteResult};

use crate::decode;
use crate::headless::FixtureExecutor;

pub struct SuiteCollector<E: FixtureExecutor> {
    executor: E,
    jobs: usize,
    results: Vec<SuiteResult>,
}

impl<E: FixtureExecutor> SuiteCollector<E> {
    pub fn new(executor: E) -> Self {
        Self {
            executor,
            jobs: 1,
            results: Vec::new(),
        }
    }

    /// Run up to `jobs` fixtures at once (0 is treated as 1)
    pub fn with_jobs(mut self, jobs: usize) -> Self {
        self.jobs = jobs.max(1);
        self
    }

    pub fn executor(&self) -> &E {
        &self.executor
    }

    /// Run and decode one fixture, adding its result on success
    pub async fn collect_fixture(&mut self, fixture: &Path) -> Result<&SuiteResult> {
        let suite = run_and_decode(&self.executor, fixture).await?;
        self.results.push(suite);
        Ok(&self.results[self.results.len() - 1])
    }

    /// Run and decode all fixtures.
    ///
    /// Results keep the fixture order even when fixtures run concurrently.
    pub async fn collect_all(&mut self, fixtures: &[PathBuf]) -> Result<usize> {
        let start = Instant::now();
        info!("Running {} fixture(s) with {} job(s)", fixtures.len(), self.jobs);

        let executor = &self.executor;
        let mut outcomes = stream::iter(fixtures.iter())
            .map(|fixture| run_and_decode(executor, fixture))
            .buffered(self.jobs);

        let mut collected = 0;
        while let Some(outcome) = outcomes.next().await {
            match outcome {
                Ok(suite) => {
                    self.results.push(suite);
                    collected += 1;
                }
                Err(e) => {
                    error!("{}", e);
                    return Err(e);
                }
            }
        }

        info!(
            "Collected {} suite(s) in {} ms",
            collected,
            start.elapsed().as_millis()
        );
        Ok(collected)
    }

    pub fn results(&self) -> &[SuiteResult] {
        &self.results
    }

    pub fn into_results(self) -> Vec<SuiteResult> {
        self.results
    }
}

async fn run_and_decode<E: FixtureExecutor>(executor: &E, fixture: &Path) -> Result<SuiteResult> {
    info!("Running fixture {}", fixture.display());
    let raw = executor.execute(fixture).await?;
    let suite = decode::decode(&raw.stdout).map_err(|e| e.for_fixture(fixture))?;
    info!(
        "{}: {} assertion(s), {} failed",
        fixture.display(),
        suite.record_count(),
        suite.failure_count()
    );
    Ok(suite.with_fixture(fixture))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::headless::RawOutput;
    use async_trait::async_trait;
    use pagetest_common::Error;
    use std::collections::HashMap;

    struct CannedExecutor {
        outputs: HashMap<PathBuf, String>,
    }

    #[async_trait]
    impl FixtureExecutor for CannedExecutor {
        async fn execute(&self, fixture: &Path) -> Result<RawOutput> {
            Ok(RawOutput {
                stdout: self.outputs.get(fixture).cloned().unwrap_or_default(),
                stderr: String::new(),
                exit_code: Some(0),
            })
        }
    }

    fn payload(module: &str) -> String {
        format!(r#"{{"results":{{"{module}":{{"t":[{{"testNumber":1,"message":"ok","failure":false}}]}}}}}}"#)
    }

    #[tokio::test]
    async fn test_collect_all_stops_at_first_bad_fixture() {
        let mut outputs = HashMap::new();
        outputs.insert(PathBuf::from("OneTest.html"), payload("One"));
        outputs.insert(PathBuf::from("BadTest.html"), "not json".to_string());
        outputs.insert(PathBuf::from("ThreeTest.html"), payload("Three"));

        let mut collector = SuiteCollector::new(CannedExecutor { outputs });
        let fixtures = vec![
            PathBuf::from("OneTest.html"),
            PathBuf::from("BadTest.html"),
            PathBuf::from("ThreeTest.html"),
        ];

        let err = collector.collect_all(&fixtures).await.unwrap_err();
        match &err {
            Error::Fixture { path, .. } => assert_eq!(path, &PathBuf::from("BadTest.html")),
            other => panic!("unexpected error: {other:?}"),
        }
        assert!(err.is_decode());
        assert_eq!(collector.results().len(), 1);
        assert_eq!(collector.results()[0].module_names(), vec!["One"]);
    }

    #[tokio::test]
    async fn test_collect_fixture_tags_result() {
        let mut outputs = HashMap::new();
        outputs.insert(PathBuf::from("OneTest.html"), payload("One"));

        let mut collector = SuiteCollector::new(CannedExecutor { outputs }).with_jobs(0);
        let suite = collector.collect_fixture(Path::new("OneTest.html")).await.unwrap();
        assert_eq!(suite.fixture.as_deref(), Some(Path::new("OneTest.html")));
    }
}
