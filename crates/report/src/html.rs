//! Emailable HTML report
//!
//! One self-contained page with three parts: a per-suite summary table, a
//! method summary table grouped by module (browser suites) or class (native
//! suites), and a detail section per row. Summary rows link to their detail
//! section through `#m{n}` anchors; both parts walk the same aggregated rows
//! so the numbering always lines up.

use std::fmt::Write as _;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

use pagetest_common::{Error, ExecutionRecord, Origin, Outcome, Result, Subject, SuiteRun};

use crate::aggregate::{aggregate, partition, Bucket, GroupKey, GroupedReportNode, ReportRow};
use crate::format::{escape_html, format_seconds};

pub const HTML_REPORT_FILE: &str = "emailable-report.html";

const STYLE: &str = r#"table caption,table.info_table,table.param,table.passed,table.failed {margin-bottom:10px;border:1px solid #000099;border-collapse:collapse;empty-cells:show;}
table.info_table td,table.info_table th,table.param td,table.param th,table.passed td,table.passed th,table.failed td,table.failed th {
border:1px solid #000099;padding:.25em .5em .25em .5em
}
table.param th {vertical-align:bottom}
td.numi,th.numi,td.numi_attn {
text-align:right
}
tr.total td {font-weight:bold}
table caption {
text-align:center;font-weight:bold;
}
table.passed tr.stripe td,table tr.passedodd td {background-color: #00AA00;}
table.passed td,table tr.passedeven td {background-color: #33FF33;}
table.passed tr.stripe td,table tr.skippedodd td {background-color: #cccccc;}
table.passed td,table tr.skippedeven td {background-color: #dddddd;}
table.failed tr.stripe td,table tr.failedodd td,table.param td.numi_attn {background-color: #FF3333;}
table.failed td,table tr.failedeven td,table.param tr.stripe td.numi_attn {background-color: #DD0000;}
tr.stripe td,tr.stripe th {background-color: #E6EBF9;}
p.totop {font-size:85%;text-align:center;border-bottom:2px black solid}
"#;

/// Accumulates the page for one rendering call
#[derive(Default)]
struct RenderState {
    out: String,
    /// Stripe counter for summary rows
    row: usize,
    /// Anchor counter shared by summary links and detail sections
    method_index: usize,
}

impl RenderState {
    fn line(&mut self, text: &str) {
        self.out.push_str(text);
        self.out.push('\n');
    }

    fn table_start(&mut self, class: &str) {
        self.line(&format!("<table cellspacing=\"0\" cellpadding=\"0\" class=\"{class}\">"));
        self.row = 0;
    }

    fn title_row(&mut self, label: &str, columns: usize) {
        self.line(&format!("<tr><th colspan=\"{columns}\">{label}</th></tr>"));
        self.row = 0;
    }

    fn count_cell(&mut self, value: usize, max_expected: usize) {
        self.cell(&value.to_string(), value <= max_expected);
    }

    fn cell(&mut self, value: &str, good: bool) {
        let class = if good { "numi" } else { "numi_attn" };
        let _ = write!(self.out, "<td class=\"{class}\">{value}</td>");
    }
}

/// Per-suite counts shown in the summary table
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct SuiteTotals {
    /// Distinct passed subjects
    pub methods_passed: usize,
    /// Passed executions
    pub scenarios_passed: usize,
    pub skipped: usize,
    pub failed: usize,
}

impl SuiteTotals {
    pub fn of(run: &SuiteRun) -> Self {
        let key = GroupKey::for_origin(run.origin);
        let mut totals = SuiteTotals::default();
        for (bucket, records) in partition(&run.records) {
            match bucket {
                Bucket::Passed => {
                    totals.scenarios_passed = records.len();
                    totals.methods_passed = distinct(records, key);
                }
                Bucket::Skipped => totals.skipped = distinct(records, key),
                Bucket::Failed => totals.failed = distinct(records, key),
                _ => {}
            }
        }
        totals
    }
}

fn distinct(records: Vec<&ExecutionRecord>, key: GroupKey) -> usize {
    aggregate(records, key)
        .iter()
        .map(GroupedReportNode::count)
        .sum()
}

/// Render the whole page
pub fn render(runs: &[SuiteRun]) -> String {
    let mut state = RenderState::default();

    start_html(&mut state);
    suite_summary(&mut state, runs);
    method_summary(&mut state, runs);
    method_details(&mut state, runs);
    state.line("</body></html>");

    state.out
}

/// Write `emailable-report.html` into `output_dir`, creating it if needed
pub fn write_html(output_dir: &Path, runs: &[SuiteRun]) -> Result<PathBuf> {
    std::fs::create_dir_all(output_dir).map_err(|e| Error::filesystem(output_dir, e))?;

    let path = output_dir.join(HTML_REPORT_FILE);
    let page = render(runs);
    std::fs::write(&path, &page).map_err(|e| Error::ReportWrite {
        path: path.clone(),
        message: e.to_string(),
    })?;

    info!("Wrote HTML report {}", path.display());
    debug!("HTML report is {} bytes", page.len());
    Ok(path)
}

fn start_html(state: &mut RenderState) {
    state.line("<!DOCTYPE html PUBLIC \"-//W3C//DTD XHTML 1.1//EN\" \"http://www.w3.org/TR/xhtml11/DTD/xhtml11.dtd\">");
    state.line("<html xmlns=\"http://www.w3.org/1999/xhtml\">");
    state.line("<head>");
    state.line("<title>Pagetest: Unit Test</title>");
    state.line("<style type=\"text/css\">");
    state.out.push_str(STYLE);
    state.line("</style>");
    state.line("</head>");
    state.line("<body>");
}

fn suite_summary(state: &mut RenderState, runs: &[SuiteRun]) {
    state.table_start("param");
    state.out.push_str("<tr><th>Test</th>");
    for label in [
        "Methods<br/>Passed",
        "Scenarios<br/>Passed",
        "# skipped",
        "# failed",
        "Total<br/>Time",
        "Included<br/>Groups",
        "Excluded<br/>Groups",
    ] {
        let _ = write!(state.out, "<th class=\"numi\">{label}</th>");
    }
    state.line("</tr>");

    let mut total = SuiteTotals::default();
    let mut first_start = i64::MAX;
    let mut last_end = i64::MIN;

    for run in runs {
        if runs.len() > 1 {
            state.title_row(&escape_html(&run.name), 7);
        }

        state.row += 1;
        let stripe = if state.row % 2 == 0 { " class=\"stripe\"" } else { "" };
        let _ = write!(
            state.out,
            "<tr{stripe}><td style=\"text-align:left;padding-right:2em\">{}</td>",
            escape_html(run.display_name())
        );

        let totals = SuiteTotals::of(run);
        state.count_cell(totals.methods_passed, usize::MAX);
        state.count_cell(totals.scenarios_passed, usize::MAX);
        state.count_cell(totals.skipped, 0);
        state.count_cell(totals.failed, 0);
        state.cell(&format_seconds(run.duration_millis()), true);
        state.cell(&escape_html(&run.included_groups.join(" ")), true);
        state.cell(&escape_html(&run.excluded_groups.join(" ")), true);
        state.line("</tr>");

        total.methods_passed += totals.methods_passed;
        total.scenarios_passed += totals.scenarios_passed;
        total.skipped += totals.skipped;
        total.failed += totals.failed;
        first_start = first_start.min(run.started_at);
        last_end = last_end.max(run.finished_at);
    }

    if runs.len() > 1 {
        state.out.push_str("<tr class=\"total\"><td>Total</td>");
        state.count_cell(total.methods_passed, usize::MAX);
        state.count_cell(total.scenarios_passed, usize::MAX);
        state.count_cell(total.skipped, 0);
        state.count_cell(total.failed, 0);
        state.cell(&format_seconds(last_end - first_start), true);
        state.line("<td colspan=\"2\">&nbsp;</td></tr>");
    }
    state.line("</table>");
}

fn method_summary(state: &mut RenderState, runs: &[SuiteRun]) {
    state.method_index = 0;
    state.line("<a id=\"summary\"></a>");
    state.table_start("passed");
    state.line("<tr><th>Class</th><th>Method</th><th># of<br/>Scenarios</th><th>Start</th><th>Time<br/>(ms)</th></tr>");

    for run in runs {
        if runs.len() > 1 {
            state.title_row(&escape_html(&run.name), 4);
        }

        let key = GroupKey::for_origin(run.origin);
        for (bucket, records) in partition(&run.records) {
            if records.is_empty() {
                continue;
            }
            let title = format!(
                "{} &#8212; {}{}",
                escape_html(run.display_name()),
                bucket.style(),
                bucket.details()
            );
            state.title_row(&title, 4);

            for (group, node) in aggregate(records, key).iter().enumerate() {
                summary_node(state, bucket, group + 1, node);
            }
        }
    }

    state.line("</table>");
}

fn summary_node(state: &mut RenderState, bucket: Bucket, group: usize, node: &GroupedReportNode<'_>) {
    let style = bucket.style();
    let parity = if group % 2 == 0 { "even" } else { "odd" };

    for (i, row) in node.rows.iter().enumerate() {
        state.row += 1;
        state.method_index += 1;

        if i == 0 {
            let _ = write!(
                state.out,
                "<tr class=\"{style}{parity}\"><td rowspan=\"{}\">{}</td>",
                node.count(),
                escape_html(&node.key)
            );
        } else {
            let _ = write!(state.out, "<tr class=\"{style}{parity}\">");
        }

        let _ = writeln!(
            state.out,
            "<td><a href=\"#m{}\">{}</a></td><td class=\"numi\">{}</td><td>{}</td><td class=\"numi\">{}</td></tr>",
            state.method_index,
            summary_label(row),
            row.count(),
            row.start_millis(),
            row.elapsed_millis()
        );
    }
}

fn summary_label(row: &ReportRow<'_>) -> String {
    let subject = row.subject();
    let mut label = match subject {
        Subject::Fixture(entity) => escape_html(entity.display_name()).into_owned(),
        Subject::Native(test) => qualified_name(&test.method_name, &test.groups),
    };
    if let Some(description) = subject.description() {
        let _ = write!(label, " (\"{}\")", escape_html(description));
    }
    label
}

/// `<b>method</b> (g1, g2)`; groups are left out when the first one is `basic`
fn qualified_name(method: &str, groups: &[String]) -> String {
    let mut name = format!("<b>{}</b>", escape_html(method));
    let show_groups = groups
        .first()
        .map(|first| !first.eq_ignore_ascii_case("basic"))
        .unwrap_or(false);
    if show_groups {
        let _ = write!(name, " ({})", escape_html(&groups.join(", ")));
    }
    name
}

fn method_details(state: &mut RenderState, runs: &[SuiteRun]) {
    state.method_index = 0;

    for run in runs {
        state.line(&format!("<h1>{}</h1>", escape_html(run.display_name())));

        let key = GroupKey::for_origin(run.origin);
        for (_, records) in partition(&run.records) {
            for node in aggregate(records, key) {
                for row in &node.rows {
                    state.method_index += 1;
                    detail_row(state, run.origin, &node.key, row);
                }
            }
        }
    }
}

fn detail_row(state: &mut RenderState, origin: Origin, group: &str, row: &ReportRow<'_>) {
    let heading = format!("{}:{}", group, row.subject().display_name());
    state.line(&format!(
        "<a id=\"m{}\"></a><h2>{}</h2>",
        state.method_index,
        escape_html(&heading)
    ));

    match origin {
        Origin::BrowserSuite => browser_detail(state, row),
        Origin::NativeSuite => native_detail(state, row),
    }

    state.line("<p class=\"totop\"><a href=\"#summary\">back to summary</a></p>");
}

fn browser_detail(state: &mut RenderState, row: &ReportRow<'_>) {
    for record in row.failures() {
        let Some(failure) = &record.failure else { continue };

        state.line("<div style=\"padding-left:3em\">");
        state.line(&format!("<p>{}</p><br />", escape_html(&failure.message)));
        if let Some(source) = record.subject.source() {
            state.line(&format!(
                " {}<br />",
                escape_html(source).replace('\n', "<br />")
            ));
        }
        state.line("</div>");
    }
}

fn native_detail(state: &mut RenderState, row: &ReportRow<'_>) {
    for record in &row.executions {
        let has_output = !record.output.is_empty();
        let failure = record.failure.as_ref();
        if !has_output && failure.is_none() {
            continue;
        }

        state.line("<div style=\"padding-left:3em\">");
        if has_output {
            if failure.is_some() {
                state.line("<h3>Test Messages</h3>");
            }
            for line in &record.output {
                state.line(&format!("{}<br/>", escape_html(line)));
            }
        }
        if let Some(failure) = failure {
            if has_output {
                let title = if record.outcome == Outcome::Passed {
                    "Expected Exception"
                } else {
                    "Failure"
                };
                state.line(&format!("<h3>{title}</h3>"));
            }
            state.line(&format!("<p>{}</p>", escape_html(&failure.message)));
            for (i, frame) in failure.trace.iter().enumerate() {
                let prefix = if i > 0 { "<br/>at " } else { "" };
                state.line(&format!("{prefix}{}", escape_html(frame)));
            }
        }
        state.line("</div>");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pagetest_common::{FailureDetail, NativeTest, Phase, ResultRecord, TestEntity};

    fn browser_record(module: &str, case: &str, n: u32, failure: Option<&str>) -> ExecutionRecord {
        let at = n as i64 * 10;
        ExecutionRecord {
            subject: Subject::Fixture(TestEntity::new(
                module,
                case,
                ResultRecord {
                    sequence_number: n,
                    message: "msg".to_string(),
                    expected: None,
                    actual: None,
                    source_snippet: failure.map(|_| "at line 1\nat <anonymous>".to_string()),
                    is_failure: failure.is_some(),
                },
            )),
            outcome: if failure.is_some() { Outcome::Failed } else { Outcome::Passed },
            phase: Phase::Test,
            start_millis: at,
            end_millis: at + 3,
            invoked_at: Some(at),
            failure: failure.map(FailureDetail::new),
            output: vec![],
        }
    }

    fn browser_run(records: Vec<ExecutionRecord>) -> SuiteRun {
        SuiteRun {
            name: "com.example.BrowserTestSuite".to_string(),
            origin: Origin::BrowserSuite,
            started_at: 0,
            finished_at: 2_500,
            included_groups: vec![],
            excluded_groups: vec![],
            records,
        }
    }

    #[test]
    fn test_anchors_line_up() {
        let run = browser_run(vec![
            browser_record("One", "a", 1, None),
            browser_record("One", "b", 2, Some("broken")),
            browser_record("Two", "c", 3, None),
        ]);
        let page = render(&[run]);

        for n in 1..=3 {
            assert!(page.contains(&format!("href=\"#m{n}\"")));
            assert!(page.contains(&format!("<a id=\"m{n}\"></a>")));
        }
        assert!(!page.contains("#m4"));
        // Failed bucket comes first, so its only row gets m1
        assert!(page.contains("<a id=\"m1\"></a><h2>One:b</h2>"));
    }

    #[test]
    fn test_repeated_subject_lists_every_failure() {
        let first = browser_record("One", "flaky", 1, Some("first attempt"));
        let mut second = browser_record("One", "flaky", 1, Some("second attempt"));
        second.invoked_at = Some(50);
        let page = render(&[browser_run(vec![first, second])]);

        assert!(page.contains("<a id=\"m1\"></a>"));
        assert!(!page.contains("<a id=\"m2\"></a>"));
        assert!(page.contains("<p>first attempt</p>"));
        assert!(page.contains("<p>second attempt</p>"));
    }

    #[test]
    fn test_same_names_from_two_fixtures_get_own_anchors() {
        let first = browser_record("global", "global failure", 1, Some("page one died"));
        let mut second = browser_record("global", "global failure", 1, Some("page two died"));
        second.invoked_at = Some(50);
        if let Subject::Fixture(entity) = &mut second.subject {
            entity.suite_index = 1;
        }
        let page = render(&[browser_run(vec![first, second])]);

        assert!(page.contains("<a id=\"m2\"></a>"));
        assert!(page.contains("<td rowspan=\"2\">global</td>"));
    }

    #[test]
    fn test_rowspan_per_group() {
        let run = browser_run(vec![
            browser_record("One", "a", 1, None),
            browser_record("One", "b", 2, None),
            browser_record("Two", "c", 3, None),
        ]);
        let page = render(&[run]);

        assert!(page.contains("<tr class=\"passedodd\"><td rowspan=\"2\">One</td>"));
        assert!(page.contains("<tr class=\"passedeven\"><td rowspan=\"1\">Two</td>"));
        assert!(page.contains("Browser Test Suite &#8212; passed</th>"));
    }

    #[test]
    fn test_source_and_message_are_escaped() {
        let run = browser_run(vec![browser_record("M<1>", "x & y", 1, Some("expected <b>"))]);
        let page = render(&[run]);

        assert!(page.contains("<h2>M&lt;1&gt;:x &amp; y</h2>"));
        assert!(page.contains("<p>expected &lt;b&gt;</p><br />"));
        assert!(page.contains(" at line 1<br />at &lt;anonymous&gt;<br />"));
    }

    #[test]
    fn test_suite_summary_totals() {
        let first = browser_run(vec![
            browser_record("One", "a", 1, None),
            browser_record("One", "b", 2, Some("broken")),
        ]);
        let mut second = browser_run(vec![browser_record("Two", "c", 3, None)]);
        second.name = "com.example.OtherSuite".to_string();
        second.started_at = 1_000;
        second.finished_at = 4_000;

        assert_eq!(
            SuiteTotals::of(&first),
            SuiteTotals {
                methods_passed: 1,
                scenarios_passed: 1,
                skipped: 0,
                failed: 1
            }
        );

        let page = render(&[first, second]);
        assert!(page.contains("<tr class=\"total\"><td>Total</td>"));
        assert!(page.contains("<td class=\"numi\">4.0 seconds</td>"));
        assert!(page.contains("<td class=\"numi_attn\">1</td>"));
    }

    #[test]
    fn test_native_rows_show_groups_and_trace() {
        let record = ExecutionRecord {
            subject: Subject::Native(NativeTest {
                class_name: "com.example.CartTest".to_string(),
                method_name: "addsItem".to_string(),
                description: Some("adds one item".to_string()),
                groups: vec!["smoke".to_string(), "cart".to_string()],
            }),
            outcome: Outcome::Failed,
            phase: Phase::Test,
            start_millis: 5,
            end_millis: 9,
            invoked_at: Some(5),
            failure: Some(FailureDetail {
                message: "expected 1 item".to_string(),
                trace: vec!["CartTest.addsItem(CartTest.java:10)".to_string()],
            }),
            output: vec!["cart created".to_string()],
        };
        let run = SuiteRun {
            name: "com.example.CartSuite".to_string(),
            origin: Origin::NativeSuite,
            started_at: 0,
            finished_at: 10,
            included_groups: vec!["smoke".to_string()],
            excluded_groups: vec![],
            records: vec![record],
        };
        let page = render(&[run]);

        assert!(page.contains("<b>addsItem</b> (smoke, cart) (\"adds one item\")"));
        assert!(page.contains("<td rowspan=\"1\">com.example.CartTest</td>"));
        assert!(page.contains("<h3>Test Messages</h3>"));
        assert!(page.contains("<h3>Failure</h3>"));
        assert!(page.contains("CartTest.addsItem(CartTest.java:10)"));
    }

    #[test]
    fn test_basic_group_is_hidden() {
        assert_eq!(qualified_name("run", &["basic".to_string(), "x".to_string()]), "<b>run</b>");
        assert_eq!(qualified_name("run", &[]), "<b>run</b>");
    }

    #[test]
    fn test_write_html_creates_output_dir() {
        let tmp = tempfile::tempdir().unwrap();
        let out = tmp.path().join("nested/test-output");
        let path = write_html(&out, &[]).unwrap();
        assert_eq!(path, out.join(HTML_REPORT_FILE));
        let page = std::fs::read_to_string(path).unwrap();
        assert!(page.contains("<a id=\"summary\"></a>"));
        assert!(!page.contains("<h1>"));
    }
}
