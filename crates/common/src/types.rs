//! Core data model: decoded browser results, test entities and execution records

use indexmap::IndexMap;
use serde::{Deserialize, Deserializer, Serialize};
use std::path::PathBuf;

// ============================================================================
// Decoded results
// ============================================================================

/// One assertion outcome reported by the browser-side framework
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResultRecord {
    /// Global sequence number within the suite, starting at 1
    #[serde(rename = "testNumber")]
    pub sequence_number: u32,

    #[serde(default, deserialize_with = "null_as_empty")]
    pub message: String,

    /// Expected value; `None` when the framework did not set one
    #[serde(default)]
    pub expected: Option<String>,

    /// Actual value; `None` when the framework did not set one
    #[serde(default)]
    pub actual: Option<String>,

    /// Source location snippet for the assertion
    #[serde(rename = "source", default)]
    pub source_snippet: Option<String>,

    #[serde(rename = "failure")]
    pub is_failure: bool,
}

fn null_as_empty<'de, D>(deserializer: D) -> std::result::Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<String>::deserialize(deserializer)?.unwrap_or_default())
}

/// Test case name -> records, in declaration order
pub type TestCases = IndexMap<String, Vec<ResultRecord>>;

/// Module name -> test cases, in declaration order
pub type Modules = IndexMap<String, TestCases>;

/// All results produced by one fixture
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SuiteResult {
    /// Fixture the results were collected from, if known
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fixture: Option<PathBuf>,

    pub modules: Modules,
}

impl SuiteResult {
    pub fn new(modules: Modules) -> Self {
        Self {
            fixture: None,
            modules,
        }
    }

    pub fn with_fixture(mut self, fixture: impl Into<PathBuf>) -> Self {
        self.fixture = Some(fixture.into());
        self
    }

    pub fn module_names(&self) -> Vec<&str> {
        self.modules.keys().map(String::as_str).collect()
    }

    pub fn module(&self, name: &str) -> Option<&TestCases> {
        self.modules.get(name)
    }

    pub fn is_empty(&self) -> bool {
        self.record_count() == 0
    }

    pub fn record_count(&self) -> usize {
        self.modules
            .values()
            .flat_map(|cases| cases.values())
            .map(Vec::len)
            .sum()
    }

    pub fn failure_count(&self) -> usize {
        self.records().filter(|(_, _, r)| r.is_failure).count()
    }

    /// Iterate `(module, test case, record)` in declaration order
    pub fn records(&self) -> impl Iterator<Item = (&str, &str, &ResultRecord)> {
        self.modules.iter().flat_map(|(module, cases)| {
            cases.iter().flat_map(move |(case, records)| {
                records
                    .iter()
                    .map(move |record| (module.as_str(), case.as_str(), record))
            })
        })
    }

    /// First place where numbering is not `1, 2, 3, ...` in document order.
    ///
    /// Returns `(expected, found)`.
    pub fn numbering_gap(&self) -> Option<(u32, u32)> {
        self.records()
            .zip(1u32..)
            .find(|((_, _, record), expected)| record.sequence_number != *expected)
            .map(|((_, _, record), expected)| (expected, record.sequence_number))
    }
}

// ============================================================================
// Test entities
// ============================================================================

/// A single browser assertion handed to the host framework
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TestEntity {
    /// Position of the originating SuiteResult; numbering restarts per fixture
    #[serde(default)]
    pub suite_index: usize,
    pub module_name: String,
    pub test_case_name: String,
    pub record: ResultRecord,
}

impl TestEntity {
    pub fn new(
        module_name: impl Into<String>,
        test_case_name: impl Into<String>,
        record: ResultRecord,
    ) -> Self {
        Self {
            suite_index: 0,
            module_name: module_name.into(),
            test_case_name: test_case_name.into(),
            record,
        }
    }

    pub fn with_suite_index(mut self, suite_index: usize) -> Self {
        self.suite_index = suite_index;
        self
    }

    pub fn id(&self) -> SubjectId {
        SubjectId::Fixture {
            suite: self.suite_index,
            module: self.module_name.clone(),
            test_case: self.test_case_name.clone(),
            sequence: self.record.sequence_number,
        }
    }

    pub fn display_name(&self) -> &str {
        &self.test_case_name
    }

    pub fn source(&self) -> Option<&str> {
        self.record.source_snippet.as_deref()
    }

    /// Evaluate the assertion carried by this entity.
    ///
    /// On failure the message names both values; absent values render as
    /// `null`, present ones are quoted so an empty string stays visible.
    pub fn assert(&self) -> std::result::Result<(), String> {
        if !self.record.is_failure {
            return Ok(());
        }
        Err(format!(
            "{} (From browser: [Expected: {}, Actual: {}])",
            self.record.message,
            display_value(self.record.expected.as_deref()),
            display_value(self.record.actual.as_deref()),
        ))
    }
}

/// Render an optional assertion value without conflating absence and ""
pub fn display_value(value: Option<&str>) -> String {
    match value {
        Some(v) => format!("\"{}\"", v),
        None => "null".to_string(),
    }
}

/// A test that did not come from a browser fixture
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NativeTest {
    pub class_name: String,
    pub method_name: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub groups: Vec<String>,
}

/// Identity used to deduplicate subjects during aggregation
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum SubjectId {
    Fixture {
        suite: usize,
        module: String,
        test_case: String,
        sequence: u32,
    },
    Native {
        class: String,
        method: String,
    },
}

/// What an execution record describes
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Subject {
    Fixture(TestEntity),
    Native(NativeTest),
}

impl Subject {
    pub fn id(&self) -> SubjectId {
        match self {
            Subject::Fixture(entity) => entity.id(),
            Subject::Native(test) => SubjectId::Native {
                class: test.class_name.clone(),
                method: test.method_name.clone(),
            },
        }
    }

    pub fn display_name(&self) -> &str {
        match self {
            Subject::Fixture(entity) => entity.display_name(),
            Subject::Native(test) => &test.method_name,
        }
    }

    pub fn module_name(&self) -> Option<&str> {
        match self {
            Subject::Fixture(entity) => Some(&entity.module_name),
            Subject::Native(_) => None,
        }
    }

    pub fn class_name(&self) -> Option<&str> {
        match self {
            Subject::Fixture(_) => None,
            Subject::Native(test) => Some(&test.class_name),
        }
    }

    pub fn description(&self) -> Option<&str> {
        match self {
            Subject::Fixture(_) => None,
            Subject::Native(test) => test.description.as_deref().filter(|d| !d.is_empty()),
        }
    }

    pub fn source(&self) -> Option<&str> {
        match self {
            Subject::Fixture(entity) => entity.source(),
            Subject::Native(_) => None,
        }
    }
}

// ============================================================================
// Execution records
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Outcome {
    Passed,
    Failed,
    Skipped,
}

impl Outcome {
    pub fn as_str(&self) -> &'static str {
        match self {
            Outcome::Passed => "passed",
            Outcome::Failed => "failed",
            Outcome::Skipped => "skipped",
        }
    }
}

/// Whether a record came from a configuration method or a test method
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Phase {
    Configuration,
    #[default]
    Test,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FailureDetail {
    pub message: String,
    #[serde(default)]
    pub trace: Vec<String>,
}

impl FailureDetail {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            trace: Vec::new(),
        }
    }
}

/// Host-framework view of one execution
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExecutionRecord {
    pub subject: Subject,
    pub outcome: Outcome,
    #[serde(default)]
    pub phase: Phase,
    pub start_millis: i64,
    pub end_millis: i64,
    /// When the host invoked the subject; `None` if it was never scheduled
    #[serde(default)]
    pub invoked_at: Option<i64>,
    #[serde(default)]
    pub failure: Option<FailureDetail>,
    /// Diagnostic lines captured while the subject ran
    #[serde(default)]
    pub output: Vec<String>,
}

impl ExecutionRecord {
    pub fn elapsed_millis(&self) -> i64 {
        self.end_millis - self.start_millis
    }
}

/// Where the entities of a suite came from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Origin {
    BrowserSuite,
    NativeSuite,
}

/// Label used for browser suites wherever the suite name is displayed
pub const BROWSER_SUITE_LABEL: &str = "Browser Test Suite";

/// One host-framework suite after execution
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SuiteRun {
    /// Qualified suite name, e.g. `com.example.BrowserTestSuite`
    pub name: String,
    pub origin: Origin,
    pub started_at: i64,
    pub finished_at: i64,
    #[serde(default)]
    pub included_groups: Vec<String>,
    #[serde(default)]
    pub excluded_groups: Vec<String>,
    /// Records in declaration order
    pub records: Vec<ExecutionRecord>,
}

impl SuiteRun {
    /// Name shown in reports
    pub fn display_name(&self) -> &str {
        match self.origin {
            Origin::BrowserSuite => BROWSER_SUITE_LABEL,
            Origin::NativeSuite => &self.name,
        }
    }

    /// Last segment of the qualified name
    pub fn simple_name(&self) -> &str {
        self.name
            .rsplit(|c: char| c == '.' || c == ':')
            .next()
            .unwrap_or(&self.name)
    }

    pub fn duration_millis(&self) -> i64 {
        self.finished_at - self.started_at
    }

    pub fn count(&self, outcome: Outcome) -> usize {
        self.records
            .iter()
            .filter(|r| r.outcome == outcome && r.phase == Phase::Test)
            .count()
    }
}
