//! Built-in host harness
//!
//! Invokes each browser assertion as a test, in order, and records the
//! outcome the way a host test framework would.

use chrono::Utc;
use tracing::{debug, info};

use pagetest_common::{
    ExecutionRecord, FailureDetail, Origin, Outcome, Phase, Subject, SuiteRun, TestEntity,
};

/// Default qualified suite name for browser fixtures
pub const DEFAULT_SUITE_NAME: &str = "BrowserTestSuite";

#[derive(Debug, Clone)]
pub struct Harness {
    suite_name: String,
    included_groups: Vec<String>,
    excluded_groups: Vec<String>,
}

impl Default for Harness {
    fn default() -> Self {
        Self::new(DEFAULT_SUITE_NAME)
    }
}

impl Harness {
    pub fn new(suite_name: impl Into<String>) -> Self {
        Self {
            suite_name: suite_name.into(),
            included_groups: Vec::new(),
            excluded_groups: Vec::new(),
        }
    }

    pub fn with_groups(mut self, included: Vec<String>, excluded: Vec<String>) -> Self {
        self.included_groups = included;
        self.excluded_groups = excluded;
        self
    }

    pub fn suite_name(&self) -> &str {
        &self.suite_name
    }

    /// Run every entity and collect one browser-suite run
    pub fn execute(&self, entities: Vec<TestEntity>) -> SuiteRun {
        let started_at = Utc::now().timestamp_millis();
        let mut records = Vec::with_capacity(entities.len());

        for entity in entities {
            records.push(invoke(entity));
        }

        let run = SuiteRun {
            name: self.suite_name.clone(),
            origin: Origin::BrowserSuite,
            started_at,
            finished_at: Utc::now().timestamp_millis(),
            included_groups: self.included_groups.clone(),
            excluded_groups: self.excluded_groups.clone(),
            records,
        };

        info!(
            "{}: {} passed, {} failed ({} ms)",
            run.name,
            run.count(Outcome::Passed),
            run.count(Outcome::Failed),
            run.duration_millis()
        );
        run
    }
}

/// Run entities under the default suite name
pub fn execute(entities: Vec<TestEntity>) -> SuiteRun {
    Harness::default().execute(entities)
}

fn invoke(entity: TestEntity) -> ExecutionRecord {
    let start = Utc::now().timestamp_millis();
    let verdict = entity.assert();
    let end = Utc::now().timestamp_millis();

    let (outcome, failure) = match verdict {
        Ok(()) => (Outcome::Passed, None),
        Err(message) => {
            debug!("{} / {} failed: {}", entity.module_name, entity.test_case_name, message);
            (Outcome::Failed, Some(FailureDetail::new(message)))
        }
    };

    ExecutionRecord {
        subject: Subject::Fixture(entity),
        outcome,
        phase: Phase::Test,
        start_millis: start,
        end_millis: end,
        invoked_at: Some(start),
        failure,
        output: Vec::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pagetest_common::ResultRecord;

    fn entity(n: u32, failure: bool) -> TestEntity {
        TestEntity::new(
            "Module One",
            "Test case two",
            ResultRecord {
                sequence_number: n,
                message: "Value must be true.".to_string(),
                expected: None,
                actual: None,
                source_snippet: Some("at line 12".to_string()),
                is_failure: failure,
            },
        )
    }

    #[test]
    fn test_execute_records_outcomes_in_order() {
        let run = Harness::new("com.example.BrowserTestSuite")
            .execute(vec![entity(1, false), entity(2, true), entity(3, false)]);

        assert_eq!(run.origin, Origin::BrowserSuite);
        assert_eq!(run.records.len(), 3);
        assert_eq!(run.count(Outcome::Passed), 2);
        assert_eq!(run.count(Outcome::Failed), 1);

        let failed = &run.records[1];
        assert_eq!(failed.outcome, Outcome::Failed);
        assert_eq!(
            failed.failure.as_ref().unwrap().message,
            "Value must be true. (From browser: [Expected: null, Actual: null])"
        );
        assert!(failed.invoked_at.is_some());
        assert!(failed.end_millis >= failed.start_millis);

        let invoked: Vec<i64> = run.records.iter().filter_map(|r| r.invoked_at).collect();
        assert!(invoked.windows(2).all(|w| w[0] <= w[1]));
    }

    #[test]
    fn test_execute_nothing() {
        let run = execute(Vec::new());
        assert!(run.records.is_empty());
        assert_eq!(run.name, DEFAULT_SUITE_NAME);
    }
}
