//! Grouping of execution records for the report emitters
//!
//! Records are walked in invocation order (never-invoked ones last, in
//! declaration order), collapsed into one row per subject and bucketed by a
//! group key: the module name for browser suites, the class name for native
//! ones. Adjacent buckets whose keys differ only by case are merged.

use std::collections::HashMap;

use pagetest_common::{ExecutionRecord, Origin, Outcome, Phase, Subject, SubjectId};

/// Which attribute of a record decides its group
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GroupKey {
    Module,
    Class,
}

impl GroupKey {
    pub fn for_origin(origin: Origin) -> Self {
        match origin {
            Origin::BrowserSuite => GroupKey::Module,
            Origin::NativeSuite => GroupKey::Class,
        }
    }

    pub fn key<'a>(&self, record: &'a ExecutionRecord) -> &'a str {
        let key = match self {
            GroupKey::Module => record.subject.module_name(),
            GroupKey::Class => record.subject.class_name(),
        };
        // Fall back to whatever grouping the subject carries
        key.or_else(|| record.subject.module_name())
            .or_else(|| record.subject.class_name())
            .unwrap_or_default()
    }
}

/// All executions of one subject
#[derive(Debug, Clone)]
pub struct ReportRow<'a> {
    pub id: SubjectId,
    pub executions: Vec<&'a ExecutionRecord>,
}

impl<'a> ReportRow<'a> {
    /// Subject of the first execution
    pub fn subject(&self) -> &'a Subject {
        &self.executions[0].subject
    }

    pub fn count(&self) -> usize {
        self.executions.len()
    }

    pub fn start_millis(&self) -> i64 {
        self.executions
            .iter()
            .map(|r| r.start_millis)
            .min()
            .unwrap_or_default()
    }

    pub fn end_millis(&self) -> i64 {
        self.executions
            .iter()
            .map(|r| r.end_millis)
            .max()
            .unwrap_or_default()
    }

    pub fn elapsed_millis(&self) -> i64 {
        self.end_millis() - self.start_millis()
    }

    pub fn failures(&self) -> impl Iterator<Item = &'a ExecutionRecord> + '_ {
        self.executions.iter().copied().filter(|r| r.failure.is_some())
    }
}

/// One group of rows, rendered as a single `rowspan` block
#[derive(Debug, Clone)]
pub struct GroupedReportNode<'a> {
    /// First-seen spelling of the group key
    pub key: String,
    pub rows: Vec<ReportRow<'a>>,
}

impl<'a> GroupedReportNode<'a> {
    pub fn count(&self) -> usize {
        self.rows.len()
    }

    pub fn start_millis(&self) -> i64 {
        self.rows
            .iter()
            .map(ReportRow::start_millis)
            .min()
            .unwrap_or_default()
    }

    pub fn end_millis(&self) -> i64 {
        self.rows
            .iter()
            .map(ReportRow::end_millis)
            .max()
            .unwrap_or_default()
    }

    /// Executions of every row, in row order
    pub fn records(&self) -> impl Iterator<Item = &'a ExecutionRecord> + '_ {
        self.rows.iter().flat_map(|row| row.executions.iter().copied())
    }
}

/// Invoked records by invocation time, then never-invoked ones in
/// declaration order. The sort is stable.
pub fn traversal_order<'a, I>(records: I) -> Vec<&'a ExecutionRecord>
where
    I: IntoIterator<Item = &'a ExecutionRecord>,
{
    let mut invoked = Vec::new();
    let mut pending = Vec::new();
    for record in records {
        match record.invoked_at {
            Some(_) => invoked.push(record),
            None => pending.push(record),
        }
    }
    invoked.sort_by_key(|r| r.invoked_at);
    invoked.extend(pending);
    invoked
}

/// Group `records` for display
pub fn aggregate<'a, I>(records: I, key: GroupKey) -> Vec<GroupedReportNode<'a>>
where
    I: IntoIterator<Item = &'a ExecutionRecord>,
{
    // One row per subject, first position wins
    let mut rows: Vec<ReportRow<'a>> = Vec::new();
    let mut row_of: HashMap<SubjectId, usize> = HashMap::new();
    for record in traversal_order(records) {
        let id = record.subject.id();
        match row_of.get(&id) {
            Some(&index) => rows[index].executions.push(record),
            None => {
                row_of.insert(id.clone(), rows.len());
                rows.push(ReportRow {
                    id,
                    executions: vec![record],
                });
            }
        }
    }

    // Exact-key buckets in first-seen order
    let mut buckets: Vec<GroupedReportNode<'a>> = Vec::new();
    let mut bucket_of: HashMap<&'a str, usize> = HashMap::new();
    for row in rows {
        let name = key.key(row.executions[0]);
        match bucket_of.get(name) {
            Some(&index) => buckets[index].rows.push(row),
            None => {
                bucket_of.insert(name, buckets.len());
                buckets.push(GroupedReportNode {
                    key: name.to_string(),
                    rows: vec![row],
                });
            }
        }
    }

    // Adjacent buckets equal ignoring case become one node
    let mut nodes: Vec<GroupedReportNode<'a>> = Vec::new();
    for bucket in buckets {
        match nodes.last_mut() {
            Some(last) if last.key.to_lowercase() == bucket.key.to_lowercase() => {
                last.rows.extend(bucket.rows);
            }
            _ => nodes.push(bucket),
        }
    }

    nodes
}

/// Report sections, in the order they are rendered
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Bucket {
    FailedConfiguration,
    Failed,
    SkippedConfiguration,
    Skipped,
    Passed,
}

impl Bucket {
    pub const ALL: [Bucket; 5] = [
        Bucket::FailedConfiguration,
        Bucket::Failed,
        Bucket::SkippedConfiguration,
        Bucket::Skipped,
        Bucket::Passed,
    ];

    pub fn outcome(&self) -> Outcome {
        match self {
            Bucket::FailedConfiguration | Bucket::Failed => Outcome::Failed,
            Bucket::SkippedConfiguration | Bucket::Skipped => Outcome::Skipped,
            Bucket::Passed => Outcome::Passed,
        }
    }

    pub fn phase(&self) -> Phase {
        match self {
            Bucket::FailedConfiguration | Bucket::SkippedConfiguration => Phase::Configuration,
            _ => Phase::Test,
        }
    }

    /// CSS class prefix
    pub fn style(&self) -> &'static str {
        self.outcome().as_str()
    }

    pub fn details(&self) -> &'static str {
        match self.phase() {
            Phase::Configuration => " (configuration methods)",
            Phase::Test => "",
        }
    }

    fn contains(&self, record: &ExecutionRecord) -> bool {
        record.outcome == self.outcome() && record.phase == self.phase()
    }
}

/// Split records into the five report sections. Passed configuration
/// records are not reported.
pub fn partition(records: &[ExecutionRecord]) -> Vec<(Bucket, Vec<&ExecutionRecord>)> {
    Bucket::ALL
        .iter()
        .map(|bucket| {
            let members = records.iter().filter(|r| bucket.contains(r)).collect();
            (*bucket, members)
        })
        .collect()
}
