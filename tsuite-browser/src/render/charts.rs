//! Chart containers backed by Google Charts data tables
//!
//! Rows are built here from aggregated values; the charting library does
//! all layout. Each chart registers its draw routine with the loader, so any
//! number of charts can share one page.

use serde_json::{json, Map, Value};
use std::collections::HashSet;
use tsuite_common::{TestSet, TestSetId};

use super::{containers, PageContext};
use crate::aggregate::total_elapsed;
use crate::history::DisplaySet;
use crate::utils::{escape_html, escape_json_for_script, file_slug};

/// Root node of the treemap
pub const TREEMAP_ROOT: &str = "Tests";

/// Treemap data table: tests under the root, clients under their test.
/// Size and color are both elapsed time.
pub fn treemap_rows(set: &TestSet) -> Vec<Value> {
    treemap_table(set).0
}

/// Rows plus the node id given to each test. Node ids must be unique, so a
/// repeated id gets a ` (n)` suffix.
fn treemap_table(set: &TestSet) -> (Vec<Value>, Vec<(String, &str)>) {
    let mut used = HashSet::from([TREEMAP_ROOT.to_string()]);
    let mut test_nodes = Vec::with_capacity(set.groups.len());
    let mut rows = vec![
        json!(["Test", "Parent", "Time (size)", "Time (color)"]),
        json!([TREEMAP_ROOT, null, 0, 0]),
    ];

    for group in &set.groups {
        let total = total_elapsed(&group.records);
        let test_id = unique_node_id(&mut used, group.name.clone());
        rows.push(json!([test_id, TREEMAP_ROOT, total, total]));
        for record in &group.records {
            let client_id = unique_node_id(&mut used, format!("{}@{}", group.name, record.client));
            rows.push(json!([client_id, test_id, record.elapsed, record.elapsed]));
        }
        test_nodes.push((test_id, group.name.as_str()));
    }

    (rows, test_nodes)
}

fn unique_node_id(used: &mut HashSet<String>, base: String) -> String {
    if used.insert(base.clone()) {
        return base;
    }
    let mut n = 2;
    loop {
        let id = format!("{} ({})", base, n);
        if used.insert(id.clone()) {
            return id;
        }
        n += 1;
    }
}

/// Treemap of a test set. Selecting a test node opens its client breakdown.
pub fn treemap(ctx: &PageContext<'_>, set: &TestSet) -> String {
    let (rows, test_nodes) = treemap_table(set);
    let links: Map<String, Value> = test_nodes
        .into_iter()
        .map(|(id, name)| (id, Value::String(ctx.test_url(set.tsid, name))))
        .collect();

    let options = json!({
        "minColor": ctx.display.treemap_min_color,
        "midColor": ctx.display.treemap_mid_color,
        "maxColor": ctx.display.treemap_max_color,
        "headerHeight": 15,
        "fontColor": "black",
        "title": "Test Results",
        "showScale": false,
        "useWeightedAverageForAggregation": true
    });

    format!(
        r#"<div id="{id}"></div>
<script>
    google.charts.setOnLoadCallback(function() {{
        var rows = {rows};
        var links = {links};
        var data = google.visualization.arrayToDataTable(rows);
        var tree = new google.visualization.TreeMap(document.getElementById('{id}'));
        google.visualization.events.addListener(tree, 'select', function() {{
            var selection = tree.getSelection();
            if (selection.length === 0) {{
                return;
            }}
            var label = data.getValue(selection[0].row, 0);
            if (Object.prototype.hasOwnProperty.call(links, label)) {{
                window.location.href = links[label];
            }}
        }});
        tree.draw(data, {options});
    }});
</script>"#,
        id = containers::CLIENT_TREEMAP,
        rows = embed(&Value::Array(rows)),
        links = embed(&Value::Object(links)),
        options = embed(&options),
    )
}

/// Column chart rows: one bar per test with a known change
pub fn change_chart_rows(display: &DisplaySet, threshold: f64) -> Vec<Value> {
    let mut rows = vec![json!(["Test", "Change", {"role": "style"}, {"role": "annotation"}])];

    for test in &display.tests {
        if let (Some(percent), Some(class)) = (test.change_percent, test.class(threshold)) {
            rows.push(json!([
                test.summary.test,
                percent,
                class.color(),
                format!("{}%", percent)
            ]));
        }
    }

    rows
}

/// Recent performance column chart
pub fn change_chart(ctx: &PageContext<'_>, display: &DisplaySet) -> String {
    let rows = change_chart_rows(display, ctx.display.change_threshold);
    if rows.len() == 1 {
        return format!(
            r#"<div id="{}"><p class="text-muted">No earlier passing runs to compare against.</p></div>"#,
            containers::CHANGE_CHART
        );
    }

    let options = json!({
        "title": "Recent Test Performance",
        "height": 350,
        "legend": {"position": "none"},
        "vAxis": {"minValue": -10, "maxValue": 10}
    });

    draw_chart(containers::CHANGE_CHART, "", "ColumnChart", &Value::Array(rows), &options)
}

/// Container id of a test's history chart
pub fn history_container_id(test_name: &str) -> String {
    format!("{}-{}", containers::HISTORY, file_slug(test_name))
}

/// Line chart of average elapsed per test set
pub fn history_chart(test_name: &str, series: &[(TestSetId, f64)]) -> String {
    let id = history_container_id(test_name);
    if series.is_empty() {
        return format!(
            r#"<div id="{}" class="history-chart"><p class="text-muted">No runs of {} recorded.</p></div>"#,
            id,
            escape_html(test_name)
        );
    }

    let mut rows = vec![json!(["tsid", "time"])];
    rows.extend(series.iter().map(|(tsid, avg)| json!([tsid.to_string(), avg])));

    let options = json!({
        "title": null,
        "legend": {"position": "none"}
    });

    draw_chart(&id, "history-chart", "LineChart", &Value::Array(rows), &options)
}

fn draw_chart(id: &str, class: &str, kind: &str, rows: &Value, options: &Value) -> String {
    format!(
        r#"<div id="{id}" class="{class}"></div>
<script>
    google.charts.setOnLoadCallback(function() {{
        var data = google.visualization.arrayToDataTable({rows});
        var chart = new google.visualization.{kind}(document.getElementById('{id}'));
        chart.draw(data, {options});
    }});
</script>"#,
        id = id,
        class = class,
        kind = kind,
        rows = embed(rows),
        options = embed(options),
    )
}

fn embed(value: &Value) -> String {
    escape_json_for_script(&value.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::archive::TestArchive;
    use crate::history::display_set;
    use crate::render::LinkStyle;
    use tsuite_common::{DisplayConfig, RunRecord, TestGroup};

    fn set(tsid: TestSetId, read: f64, write: f64) -> TestSet {
        TestSet::new(
            tsid,
            format!("#{}", tsid),
            vec![
                TestGroup::new(
                    "read",
                    vec![
                        RunRecord::new("read", "localhost", read, true),
                        RunRecord::new("read", "127.0.0.1", read, true),
                    ],
                ),
                TestGroup::new("write", vec![RunRecord::new("write", "localhost", write, true)]),
            ],
        )
    }

    #[test]
    fn test_treemap_rows() {
        let rows = treemap_rows(&set(1, 2.0, 1.2));
        assert_eq!(rows.len(), 2 + 2 + 3);
        assert_eq!(rows[1], json!(["Tests", null, 0, 0]));
        assert_eq!(rows[2], json!(["read", "Tests", 4.0, 4.0]));
        assert_eq!(rows[3], json!(["read@127.0.0.1", "read", 2.0, 2.0]));
        assert_eq!(rows[5][1], "Tests");
    }

    #[test]
    fn test_treemap_node_ids_are_unique() {
        let set = TestSet::new(
            1,
            "#1",
            vec![
                TestGroup::new(
                    "read",
                    vec![
                        RunRecord::new("read", "localhost", 1.0, true),
                        RunRecord::new("read", "localhost", 2.0, true),
                    ],
                ),
                TestGroup::new("Tests", vec![RunRecord::new("Tests", "localhost", 3.0, true)]),
            ],
        );

        let rows = treemap_rows(&set);
        let ids: Vec<&str> = rows[1..].iter().filter_map(|row| row[0].as_str()).collect();
        let unique: HashSet<&str> = ids.iter().copied().collect();
        assert_eq!(ids.len(), rows.len() - 1);
        assert_eq!(unique.len(), ids.len());
        assert_eq!(rows[2], json!(["Tests (2)", "Tests", 3.0, 3.0]));
        assert_eq!(rows[3], json!(["Tests@localhost", "Tests (2)", 3.0, 3.0]));
        assert_eq!(rows[6], json!(["read@localhost (2)", "read", 2.0, 2.0]));

        let display = DisplayConfig::default();
        let ctx = PageContext::new(&display, LinkStyle::Server);
        let html = treemap(&ctx, &set);
        assert!(html.contains(r#""Tests (2)":"/tsets/1/tests/Tests""#));
    }

    #[test]
    fn test_treemap_links_drill_down() {
        let display = DisplayConfig::default();
        let ctx = PageContext::new(&display, LinkStyle::Server);
        let html = treemap(&ctx, &set(3, 2.0, 1.2));
        assert!(html.contains(r#"<div id="client_treemap"></div>"#));
        assert!(html.contains(r#""read":"/tsets/3/tests/read""#));
        assert!(html.contains(r##""minColor":"#f00""##));
    }

    #[test]
    fn test_change_chart_rows_colored_by_class() {
        let archive = TestArchive::from_sets([set(1, 2.0, 1.0), set(2, 3.0, 1.05)]).unwrap();
        let display = display_set(&archive, 2).unwrap();

        let rows = change_chart_rows(&display, 10.0);
        assert_eq!(rows.len(), 3);
        assert_eq!(rows[1], json!(["read", 50.0, "#A45A52", "50%"]));
        assert_eq!(rows[2][2], "#0F4D92");
    }

    #[test]
    fn test_change_chart_without_history() {
        let archive = TestArchive::from_sets([set(1, 2.0, 1.0)]).unwrap();
        let display = display_set(&archive, 1).unwrap();
        let config = DisplayConfig::default();
        let ctx = PageContext::new(&config, LinkStyle::Server);

        let html = change_chart(&ctx, &display);
        assert!(html.contains("No earlier passing runs"));
        assert!(!html.contains("ColumnChart"));
    }

    #[test]
    fn test_history_chart() {
        let html = history_chart("read", &[(1, 2.0), (2, 2.5)]);
        assert!(html.contains(r#"id="test_history-read""#));
        assert!(html.contains(r#"[["tsid","time"],["1",2.0],["2",2.5]]"#));

        let empty = history_chart("</script>", &[]);
        assert!(empty.contains("&lt;/script&gt;"));
    }
}
