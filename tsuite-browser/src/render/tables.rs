//! Table views: change table, client blob, client breakdown and sidebar

use tsuite_common::{RunRecord, TestGroup, TestSet, TestSetId};

use super::{containers, PageContext};
use crate::aggregate::{average_elapsed, group_by_client, pass_fail_counts};
use crate::archive::TestSetListing;
use crate::history::DisplaySet;
use crate::utils::{escape_html, format_percent, format_seconds};

/// Per-test summary of a set with change against earlier runs
pub fn change_table(ctx: &PageContext<'_>, display: &DisplaySet) -> String {
    let threshold = ctx.display.change_threshold;
    let mut html = String::from(
        r#"<table class="table table-sm table-hover">
    <thead>
        <tr><th>Test</th><th>Avg Elapsed</th><th>Passed</th><th>Change</th><th>Compared To</th></tr>
    </thead>
    <tbody>
"#,
    );

    for test in &display.tests {
        let summary = &test.summary;
        let row_class = if summary.all_passed() { "" } else { "test-fail" };
        let change = match (test.change_percent, test.class(threshold)) {
            (Some(percent), Some(class)) => format!(
                r#"<span class="change-delta change-{}">{}</span>"#,
                class.as_str(),
                format_percent(percent)
            ),
            _ => r#"<span class="text-muted">n/a</span>"#.to_string(),
        };
        let compared = test
            .change_tsid
            .map(|tsid| format!(r#"<a href="{}">#{}</a>"#, escape_html(&ctx.set_url(tsid)), tsid))
            .unwrap_or_default();

        html.push_str(&format!(
            r#"        <tr class="{}">
            <td><a class="test-name" href="{}">{}</a></td>
            <td>{}</td>
            <td>{} / {}</td>
            <td>{}</td>
            <td>{}</td>
        </tr>
"#,
            row_class,
            escape_html(&ctx.test_url(display.tsid, &summary.test)),
            escape_html(&summary.test),
            format_seconds(summary.average_elapsed),
            summary.passed,
            summary.total,
            change,
            compared
        ));
    }

    html.push_str("    </tbody>\n</table>");
    format!(r#"<div id="{}">{}</div>"#, containers::CHANGE_TABLE, html)
}

/// Every client of a set with the results it produced
pub fn client_blob(set: &TestSet) -> String {
    let clients = group_by_client(set);
    let mut html = String::new();

    if clients.is_empty() {
        html.push_str(r#"<p class="text-muted">No client results in this test set.</p>"#);
    }

    for (client, records) in &clients {
        let (passed, total) = pass_fail_counts(records);
        html.push_str(&format!(
            r#"
    <div class="card mb-3 client-card">
        <div class="card-header"><i class="fas fa-desktop me-2"></i>{} <span class="badge bg-{} ms-2">{} / {} passed</span></div>
        <div class="card-body">{}</div>
    </div>"#,
            escape_html(client),
            if passed == total { "success" } else { "danger" },
            passed,
            total,
            record_table(records, RecordColumn::Test)
        ));
    }

    format!(r#"<div id="{}">{}</div>"#, containers::CLIENT_BLOB, html)
}

/// Client-level breakdown of a single test group (drill-down view)
pub fn client_breakdown(group: &TestGroup) -> String {
    let (passed, total) = pass_fail_counts(&group.records);
    format!(
        r#"<div id="{}">
    <p><strong>{}</strong>: average {} over {} clients, {} / {} passed</p>
    {}
</div>"#,
        containers::CLIENT_BREAKDOWN,
        escape_html(&group.name),
        format_seconds(average_elapsed(&group.records)),
        group.records.len(),
        passed,
        total,
        record_table(&group.records, RecordColumn::Client)
    )
}

/// Test set list, newest first, with the active set highlighted
pub fn sidebar(ctx: &PageContext<'_>, listings: &[TestSetListing], active: Option<TestSetId>) -> String {
    let mut html = String::from(r#"<ul class="list-group">"#);

    for listing in listings {
        let active_class = if Some(listing.tsid) == active { " active" } else { "" };
        html.push_str(&format!(
            r#"
    <li class="list-group-item{}" data-tsid="{}">
        <a href="{}">{}</a>
        <span class="badge bg-{} float-end">{} / {}</span>
    </li>"#,
            active_class,
            listing.tsid,
            escape_html(&ctx.set_url(listing.tsid)),
            escape_html(&listing.tset_name),
            if listing.totals.failed_tests == 0 { "success" } else { "danger" },
            listing.totals.passed_tests,
            listing.totals.total_tests
        ));
    }

    html.push_str("\n</ul>");
    format!(r#"<div id="{}">{}</div>"#, containers::SIDEBAR, html)
}

#[derive(Clone, Copy)]
enum RecordColumn {
    Test,
    Client,
}

fn record_table(records: &[RunRecord], first: RecordColumn) -> String {
    let heading = match first {
        RecordColumn::Test => "Test",
        RecordColumn::Client => "Client",
    };
    let mut html = format!(
        r#"<table class="table table-sm mb-0">
        <thead><tr><th>{}</th><th>Elapsed</th><th>Result</th><th>Error</th></tr></thead>
        <tbody>"#,
        heading
    );

    for record in records {
        let label = match first {
            RecordColumn::Test => &record.test,
            RecordColumn::Client => &record.client,
        };
        html.push_str(&format!(
            r#"
            <tr class="{}"><td>{}</td><td>{}</td><td>{}</td><td>{}</td></tr>"#,
            if record.pass { "" } else { "test-fail" },
            escape_html(label),
            format_seconds(record.elapsed),
            if record.pass { "pass" } else { "fail" },
            escape_html(record.error.as_deref().unwrap_or(""))
        ));
    }

    html.push_str("\n        </tbody>\n    </table>");
    html
}
