//! Change tracking across test sets
//!
//! A test's change is measured against the most recent earlier test set in
//! which the same test passed. History series feed the per-test line charts.

use serde::{Deserialize, Serialize};
use tsuite_common::{Result, TestSetId};

use crate::aggregate::{average_elapsed, group_passed, summarize_set, Summary};
use crate::archive::TestArchive;
use crate::color::{IMPROVED_COLOR, NEUTRAL_COLOR, REGRESSED_COLOR};

/// How a test moved relative to its previous passing run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChangeClass {
    Regressed,
    Improved,
    Neutral,
}

impl ChangeClass {
    pub fn color(self) -> &'static str {
        match self {
            ChangeClass::Regressed => REGRESSED_COLOR,
            ChangeClass::Improved => IMPROVED_COLOR,
            ChangeClass::Neutral => NEUTRAL_COLOR,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            ChangeClass::Regressed => "regressed",
            ChangeClass::Improved => "improved",
            ChangeClass::Neutral => "neutral",
        }
    }
}

/// Percent changes at or past `threshold` in either direction leave Neutral
pub fn classify_change(percent: f64, threshold: f64) -> ChangeClass {
    if percent >= threshold {
        ChangeClass::Regressed
    } else if percent <= -threshold {
        ChangeClass::Improved
    } else {
        ChangeClass::Neutral
    }
}

/// Summary of one test plus its change against the previous passing run
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TestChange {
    #[serde(flatten)]
    pub summary: Summary,
    pub change_delta: Option<f64>,
    pub change_percent: Option<f64>,
    pub change_tsid: Option<TestSetId>,
}

impl TestChange {
    pub fn class(&self, threshold: f64) -> Option<ChangeClass> {
        self.change_percent.map(|p| classify_change(p, threshold))
    }
}

/// A test set ready for display
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DisplaySet {
    pub tsid: TestSetId,
    pub tset_name: String,
    pub tests: Vec<TestChange>,
}

/// Attach change data to every test of set `tsid`.
pub fn display_set(archive: &TestArchive, tsid: TestSetId) -> Result<DisplaySet> {
    let set = archive.require(tsid)?;

    let tests = summarize_set(set)
        .into_iter()
        .map(|summary| {
            let previous = archive.before(tsid).find_map(|older| {
                older
                    .group(&summary.test)
                    .filter(|g| group_passed(&g.records))
                    .map(|g| (older.tsid, average_elapsed(&g.records)))
            });

            match previous {
                Some((change_tsid, previous_avg)) if previous_avg > 0.0 => {
                    let delta = summary.average_elapsed - previous_avg;
                    let percent = (delta / previous_avg * 1000.0).round() / 10.0;
                    TestChange {
                        summary,
                        change_delta: Some(delta),
                        change_percent: Some(percent),
                        change_tsid: Some(change_tsid),
                    }
                }
                _ => TestChange {
                    summary,
                    change_delta: None,
                    change_percent: None,
                    change_tsid: None,
                },
            }
        })
        .collect();

    Ok(DisplaySet {
        tsid,
        tset_name: set.tset_name.clone(),
        tests,
    })
}

/// Average elapsed of `test_name` in every set that ran it, ascending tsid
pub fn test_history<'a, I>(sets: I, test_name: &str) -> Vec<(TestSetId, f64)>
where
    I: IntoIterator<Item = &'a tsuite_common::TestSet>,
{
    sets.into_iter()
        .filter_map(|set| {
            set.group(test_name)
                .map(|g| (set.tsid, average_elapsed(&g.records)))
        })
        .collect()
}
