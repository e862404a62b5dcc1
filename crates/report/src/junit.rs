//! JUnit-style XML report, one `TEST-{suite}.xml` per suite

use chrono::{DateTime, Utc};
use quick_xml::{
    events::{BytesDecl, BytesEnd, BytesStart, BytesText, Event},
    Writer,
};
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

use pagetest_common::{Error, ExecutionRecord, Origin, Outcome, Result, SuiteRun};

use crate::aggregate::{partition, traversal_order, Bucket, GroupKey};
use crate::format::{format_time, split_camel_case};

/// Failure `type` attribute for browser assertions
pub const BROWSER_FAILURE_TYPE: &str = "BrowserAssertion";

/// Failure `type` attribute for native tests
pub const NATIVE_FAILURE_TYPE: &str = "Failure";

/// Order of testcases inside a suite
const CASE_ORDER: [Bucket; 3] = [Bucket::Failed, Bucket::Passed, Bucket::Skipped];

/// Report file name for a suite
pub fn report_file_name(run: &SuiteRun) -> String {
    format!("TEST-{}.xml", run.name)
}

/// `dd MMM yyyy HH:mm:ss GMT`
pub fn gmt_timestamp(at: DateTime<Utc>) -> String {
    at.format("%d %b %Y %H:%M:%S GMT").to_string()
}

pub struct JunitWriter {
    hostname: String,
    timestamp: DateTime<Utc>,
}

impl Default for JunitWriter {
    fn default() -> Self {
        Self::new()
    }
}

impl JunitWriter {
    /// Writer stamped with this host and the current time
    pub fn new() -> Self {
        let hostname = match hostname::get() {
            Ok(name) => name.to_string_lossy().into_owned(),
            Err(e) => {
                warn!("Could not determine hostname: {}", e);
                "localhost".to_string()
            }
        };
        Self {
            hostname,
            timestamp: Utc::now(),
        }
    }

    pub fn with_hostname(mut self, hostname: impl Into<String>) -> Self {
        self.hostname = hostname.into();
        self
    }

    pub fn with_timestamp(mut self, timestamp: DateTime<Utc>) -> Self {
        self.timestamp = timestamp;
        self
    }

    /// Serialize one suite
    pub fn render(&self, run: &SuiteRun) -> Result<String> {
        let mut buffer = Vec::new();
        self.serialize(run, &mut buffer)
            .map_err(|e| Error::ReportWrite {
                path: PathBuf::from(report_file_name(run)),
                message: e.to_string(),
            })?;

        String::from_utf8(buffer).map_err(|e| Error::ReportWrite {
            path: PathBuf::from(report_file_name(run)),
            message: e.to_string(),
        })
    }

    /// Write one suite into `output_dir`
    pub fn write(&self, output_dir: &Path, run: &SuiteRun) -> Result<PathBuf> {
        std::fs::create_dir_all(output_dir).map_err(|e| Error::filesystem(output_dir, e))?;

        let path = output_dir.join(report_file_name(run));
        let xml = self.render(run)?;
        std::fs::write(&path, xml).map_err(|e| Error::ReportWrite {
            path: path.clone(),
            message: e.to_string(),
        })?;

        info!("Wrote JUnit report {}", path.display());
        Ok(path)
    }

    fn serialize(&self, run: &SuiteRun, inner: &mut Vec<u8>) -> std::result::Result<(), quick_xml::Error> {
        let mut writer = Writer::new_with_indent(inner, b' ', 4);
        writer.write_event(Event::Decl(BytesDecl::new("1.0", Some("UTF-8"), None)))?;

        let failed = run.count(Outcome::Failed);
        let passed = run.count(Outcome::Passed);
        let skipped = run.count(Outcome::Skipped);

        let mut suite = BytesStart::new("testsuite");
        suite.extend_attributes([
            ("hostname", self.hostname.as_str()),
            ("name", split_camel_case(run.simple_name()).as_str()),
            ("tests", (passed + failed + skipped).to_string().as_str()),
            ("failures", failed.to_string().as_str()),
            ("skipped", skipped.to_string().as_str()),
            ("errors", "0"),
            ("timestamp", gmt_timestamp(self.timestamp).as_str()),
            ("time", format_time(run.duration_millis()).as_str()),
        ]);
        writer.write_event(Event::Start(suite))?;

        let key = GroupKey::for_origin(run.origin);
        let buckets = partition(&run.records);
        for wanted in CASE_ORDER {
            let Some((_, records)) = buckets.iter().find(|(bucket, _)| *bucket == wanted) else {
                continue;
            };

            // One testcase per execution, in invocation order
            for record in traversal_order(records.iter().copied()) {
                let mut case = BytesStart::new("testcase");
                case.extend_attributes([
                    ("name", record.subject.display_name()),
                    ("classname", key.key(record)),
                    ("time", format_time(record.elapsed_millis()).as_str()),
                ]);

                if record.failure.is_none() {
                    writer.write_event(Event::Empty(case))?;
                    continue;
                }

                writer.write_event(Event::Start(case))?;
                write_failure(&mut writer, run.origin, record)?;
                writer.write_event(Event::End(BytesEnd::new("testcase")))?;
            }
        }

        writer.write_event(Event::End(BytesEnd::new("testsuite")))?;
        writer.write_indent()?;
        Ok(())
    }
}

fn write_failure(
    writer: &mut Writer<&mut Vec<u8>>,
    origin: Origin,
    record: &ExecutionRecord,
) -> std::result::Result<(), quick_xml::Error> {
    let Some(detail) = &record.failure else {
        return Ok(());
    };

    let failure_type = match origin {
        Origin::BrowserSuite => BROWSER_FAILURE_TYPE,
        Origin::NativeSuite => NATIVE_FAILURE_TYPE,
    };
    let mut tag = BytesStart::new("failure");
    tag.extend_attributes([("message", detail.message.as_str()), ("type", failure_type)]);

    let text = match record.subject.source() {
        Some(source) => Some(source.to_string()),
        None if !detail.trace.is_empty() => Some(detail.trace.join("\n")),
        None => None,
    };

    match text {
        Some(text) => {
            writer.write_event(Event::Start(tag))?;
            writer.write_event(Event::Text(BytesText::new(&text)))?;
            writer.write_event(Event::End(BytesEnd::new("failure")))?;
        }
        None => writer.write_event(Event::Empty(tag))?,
    }
    Ok(())
}

/// Write one report per suite
pub fn write_junit(output_dir: &Path, runs: &[SuiteRun]) -> Result<Vec<PathBuf>> {
    let writer = JunitWriter::new();
    debug!("Writing {} JUnit report(s) as {}", runs.len(), writer.hostname);
    runs.iter().map(|run| writer.write(output_dir, run)).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use pagetest_common::{FailureDetail, Phase, ResultRecord, Subject, TestEntity};

    fn record(case: &str, n: u32, expected: Option<&str>, failed: bool) -> ExecutionRecord {
        let entity = TestEntity::new(
            "Module Three",
            case,
            ResultRecord {
                sequence_number: n,
                message: "Value must be true.".to_string(),
                expected: expected.map(str::to_string),
                actual: None,
                source_snippet: failed.then(|| "at tests.js:133".to_string()),
                is_failure: failed,
            },
        );
        let failure = entity.assert().err().map(FailureDetail::new);
        ExecutionRecord {
            subject: Subject::Fixture(entity),
            outcome: if failed { Outcome::Failed } else { Outcome::Passed },
            phase: Phase::Test,
            start_millis: 1_000,
            end_millis: 1_250,
            invoked_at: Some(n as i64),
            failure,
            output: vec![],
        }
    }

    fn run(records: Vec<ExecutionRecord>) -> SuiteRun {
        SuiteRun {
            name: "com.example.BrowserTestSuite".to_string(),
            origin: Origin::BrowserSuite,
            started_at: 0,
            finished_at: 1_500,
            included_groups: vec![],
            excluded_groups: vec![],
            records,
        }
    }

    fn writer() -> JunitWriter {
        JunitWriter::new()
            .with_hostname("ci-01")
            .with_timestamp(Utc.with_ymd_and_hms(2024, 3, 5, 14, 7, 9).unwrap())
    }

    #[test]
    fn test_suite_attributes() {
        let xml = writer()
            .render(&run(vec![record("ok", 1, Some("1"), false), record("bad", 2, None, true)]))
            .unwrap();

        assert!(xml.starts_with("<?xml version=\"1.0\" encoding=\"UTF-8\"?>"));
        assert!(xml.contains(
            "<testsuite hostname=\"ci-01\" name=\"Browser Test Suite\" tests=\"2\" failures=\"1\" skipped=\"0\" errors=\"0\" timestamp=\"05 Mar 2024 14:07:09 GMT\" time=\"1.500\">"
        ));
    }

    #[test]
    fn test_failed_cases_come_first() {
        let xml = writer()
            .render(&run(vec![record("ok", 1, Some("1"), false), record("bad", 2, None, true)]))
            .unwrap();

        let bad = xml.find("name=\"bad\"").unwrap();
        let ok = xml.find("name=\"ok\"").unwrap();
        assert!(bad < ok);
        assert!(xml.contains("<testcase name=\"ok\" classname=\"Module Three\" time=\"0.250\"/>"));
    }

    #[test]
    fn test_cases_keep_invocation_order_across_modules() {
        let mut records = Vec::new();
        for (n, (suite, module)) in [(0, "Module One"), (0, "Module Two"), (1, "Module One")]
            .into_iter()
            .enumerate()
        {
            let mut rec = record(&format!("case{n}"), 1, Some("1"), false);
            rec.invoked_at = Some(n as i64);
            if let Subject::Fixture(entity) = &mut rec.subject {
                entity.module_name = module.to_string();
                entity.suite_index = suite;
            }
            records.push(rec);
        }
        let xml = writer().render(&run(records)).unwrap();

        let positions: Vec<usize> = ["case0", "case1", "case2"]
            .iter()
            .map(|name| xml.find(&format!("name=\"{name}\"")).unwrap())
            .collect();
        assert!(positions[0] < positions[1] && positions[1] < positions[2]);
        assert_eq!(xml.matches("<testcase ").count(), 3);
    }

    #[test]
    fn test_null_values_are_kept_in_failure() {
        let xml = writer().render(&run(vec![record("bad", 1, None, true)])).unwrap();

        assert!(xml.contains(
            "<failure message=\"Value must be true. (From browser: [Expected: null, Actual: null])\" type=\"BrowserAssertion\">at tests.js:133</failure>"
        ));
    }

    #[test]
    fn test_special_characters_are_escaped() {
        let mut bad = record("a < b & \"c\"", 1, Some("<x>"), true);
        bad.failure = Some(FailureDetail::new("expected <x>"));
        let xml = writer().render(&run(vec![bad])).unwrap();

        assert!(xml.contains("name=\"a &lt; b &amp; &quot;c&quot;\""));
        assert!(xml.contains("message=\"expected &lt;x&gt;\""));
    }

    #[test]
    fn test_write_names_file_after_suite() {
        let tmp = tempfile::tempdir().unwrap();
        let path = writer().write(tmp.path(), &run(vec![])).unwrap();
        assert_eq!(path, tmp.path().join("TEST-com.example.BrowserTestSuite.xml"));
        let xml = std::fs::read_to_string(path).unwrap();
        assert!(xml.contains("tests=\"0\""));
    }
}
