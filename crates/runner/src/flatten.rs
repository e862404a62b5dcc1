//! Entity flattening - one test entity per decoded assertion

use pagetest_common::{SuiteResult, TestEntity};

/// Flatten suites into entities: suite order, then module, test case and
/// record order. Never drops a record.
pub fn flatten(suites: &[SuiteResult]) -> Vec<TestEntity> {
    suites
        .iter()
        .enumerate()
        .flat_map(|(index, suite)| flatten_suite(index, suite))
        .collect()
}

/// Entities of one suite, tagged with its position among all suites
pub fn flatten_suite(suite_index: usize, suite: &SuiteResult) -> Vec<TestEntity> {
    suite
        .records()
        .map(|(module, case, record)| {
            TestEntity::new(module, case, record.clone()).with_suite_index(suite_index)
        })
        .collect()
}
