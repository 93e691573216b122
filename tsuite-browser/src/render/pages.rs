//! Full pages assembled from the individual views

use tsuite_common::{SensorReadings, TestSet, TestSetId, TsuiteError};

use super::charts::{change_chart, history_chart, history_container_id, treemap};
use super::heatgrid::heat_grid;
use super::layout::{card, page};
use super::tables::{change_table, client_blob, client_breakdown, sidebar};
use super::{containers, placeholder, Failure, PageContext};
use crate::archive::TestArchive;
use crate::history::{display_set, test_history};
use crate::utils::escape_html;

/// A rendered document plus the first failure it had to show, if any
#[derive(Debug, Clone)]
pub struct RenderedPage {
    pub title: String,
    pub html: String,
    pub failure: Option<Failure>,
}

impl RenderedPage {
    pub fn is_complete(&self) -> bool {
        self.failure.is_none()
    }
}

fn select_set(archive: &TestArchive, tsid: Option<TestSetId>) -> Result<&TestSet, Failure> {
    match tsid {
        Some(tsid) => archive.require(tsid).map_err(Failure::from),
        None => archive
            .latest()
            .ok_or_else(|| Failure::from(TsuiteError::NotFound("no test sets in archive".to_string()))),
    }
}

fn two_columns(side: &str, main: &str) -> String {
    format!(
        r#"            <div class="col-md-3">{}
            </div>
            <div class="col-md-9">{}
            </div>"#,
        card("fa-list", "Test Sets", side),
        main
    )
}

/// Summary of one test set (latest when `tsid` is `None`)
pub fn summary_page(
    ctx: &PageContext<'_>,
    archive: Result<&TestArchive, &Failure>,
    tsid: Option<TestSetId>,
) -> RenderedPage {
    let archive = match archive {
        Ok(archive) => archive,
        Err(failure) => {
            let main = [
                containers::CHANGE_CHART,
                containers::CHANGE_TABLE,
                containers::CLIENT_TREEMAP,
                containers::CLIENT_BLOB,
            ]
            .iter()
            .map(|id| placeholder(id, failure))
            .collect::<Vec<_>>()
            .join("\n");
            let body = two_columns(&placeholder(containers::SIDEBAR, failure), &main);
            return RenderedPage {
                title: "Test Results".to_string(),
                html: page(ctx, "Test Results", &body),
                failure: Some(failure.clone()),
            };
        }
    };

    let active = tsid.or_else(|| archive.latest().map(|s| s.tsid));
    let side = sidebar(ctx, &archive.list(ctx.display.sidebar_limit), active);

    let selected = select_set(archive, tsid)
        .and_then(|set| display_set(archive, set.tsid).map(|d| (set, d)).map_err(Failure::from));

    match selected {
        Ok((set, display)) => {
            let title = format!("Test Set {}", set.tset_name);
            let main = [
                card("fa-chart-bar", "Recent Performance", &change_chart(ctx, &display)),
                card("fa-table", "Summary", &change_table(ctx, &display)),
                card("fa-th-large", "Test Results", &treemap(ctx, set)),
                card("fa-desktop", "Clients", &client_blob(set)),
            ]
            .concat();
            RenderedPage {
                html: page(ctx, &title, &two_columns(&side, &main)),
                title,
                failure: None,
            }
        }
        Err(failure) => {
            let main = card(
                "fa-table",
                "Summary",
                &placeholder(containers::CHANGE_TABLE, &failure),
            );
            RenderedPage {
                title: "Test Results".to_string(),
                html: page(ctx, "Test Results", &two_columns(&side, &main)),
                failure: Some(failure),
            }
        }
    }
}

/// Client-level drill-down of one test plus its history across sets
pub fn test_page(
    ctx: &PageContext<'_>,
    archive: Result<&TestArchive, &Failure>,
    tsid: TestSetId,
    test_name: &str,
) -> RenderedPage {
    let title = format!("{} in test set {}", test_name, tsid);

    let group = archive.map_err(Failure::clone).and_then(|archive| {
        let set = archive.require(tsid).map_err(Failure::from)?;
        let group = set.group(test_name).ok_or_else(|| {
            Failure::from(TsuiteError::NotFound(format!("test {} in test set {}", test_name, tsid)))
        })?;
        Ok((archive, group))
    });

    let (body, failure) = match group {
        Ok((archive, group)) => {
            let series = test_history(archive.iter(), test_name);
            let body = [
                card("fa-desktop", "Clients", &client_breakdown(group)),
                card("fa-chart-line", "History", &history_chart(test_name, &series)),
            ]
            .concat();
            (body, None)
        }
        Err(failure) => {
            let body = [
                card("fa-desktop", "Clients", &placeholder(containers::CLIENT_BREAKDOWN, &failure)),
                card(
                    "fa-chart-line",
                    "History",
                    &placeholder(&history_container_id(test_name), &failure),
                ),
            ]
            .concat();
            (body, Some(failure))
        }
    };

    let back = format!(
        r#"
                <p><a href="{}"><i class="fas fa-arrow-left me-2"></i>Back to test set</a></p>"#,
        escape_html(&ctx.set_url(tsid))
    );
    let body = format!(
        r#"            <div class="col-12">{}{}
            </div>"#,
        back, body
    );

    RenderedPage {
        html: page(ctx, &title, &body),
        title,
        failure,
    }
}

/// Heat grid of every disk sensor
pub fn sense_page(ctx: &PageContext<'_>, readings: Result<&SensorReadings, &Failure>) -> RenderedPage {
    let grid = readings
        .map_err(Failure::clone)
        .and_then(|r| heat_grid(r, &ctx.display.heat_base_color).map_err(Failure::from));

    let (inner, failure) = match grid {
        Ok(svg) => (svg, None),
        Err(failure) => (placeholder(containers::HEAT_GRID, &failure), Some(failure)),
    };

    let title = "Disk Sensors".to_string();
    let body = format!(
        r#"            <div class="col-12">{}
            </div>"#,
        card("fa-hdd", &title, &inner)
    );

    RenderedPage {
        html: page(ctx, &title, &body),
        title,
        failure,
    }
}
