//! Result aggregation for test-suite views
//!
//! Every view of the browser is built from the reductions in this module:
//! per-test averages and totals, pass/fail tallies and max-normalized color
//! intensities. All functions are pure and accept empty input.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use tsuite_common::{RunRecord, TestGroup, TestSet};

/// Derived aggregate over a test group, recomputed on every render
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Summary {
    pub test: String,
    pub total_elapsed: f64,
    pub average_elapsed: f64,
    pub passed: usize,
    pub total: usize,
    /// Total elapsed normalized against the slowest test of the set, in [0,1]
    pub intensity: f64,
}

impl Summary {
    pub fn all_passed(&self) -> bool {
        self.total > 0 && self.passed == self.total
    }
}

/// Pass/fail totals over a whole test set
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SetTotals {
    pub passed_tests: usize,
    pub failed_tests: usize,
    pub total_tests: usize,
    /// Sum of per-test average elapsed seconds
    pub total_time: f64,
}

/// Arithmetic mean of `elapsed`. An empty collection averages to 0.0.
pub fn average_elapsed(records: &[RunRecord]) -> f64 {
    if records.is_empty() {
        return 0.0;
    }
    total_elapsed(records) / records.len() as f64
}

/// Sum of `elapsed` across records
pub fn total_elapsed(records: &[RunRecord]) -> f64 {
    records.iter().map(|r| r.elapsed).sum()
}

/// Number of passing records paired with the total record count
pub fn pass_fail_counts(records: &[RunRecord]) -> (usize, usize) {
    let passed = records.iter().filter(|r| r.pass).count();
    (passed, records.len())
}

/// A group passes when it has records and every one of them passed
pub fn group_passed(records: &[RunRecord]) -> bool {
    !records.is_empty() && records.iter().all(|r| r.pass)
}

/// Normalize readings by the largest one so every value lands in [0,1].
///
/// The largest reading maps to 1.0 and zero maps to 0.0. When no reading is
/// positive the divisor stays 1. Negative readings clamp to 0.
pub fn color_intensity<'a, I>(readings: I) -> BTreeMap<String, f64>
where
    I: IntoIterator<Item = (&'a String, &'a f64)>,
{
    let readings: Vec<(&String, f64)> = readings.into_iter().map(|(k, v)| (k, *v)).collect();
    let max = readings
        .iter()
        .map(|(_, v)| *v)
        .filter(|v| *v > 0.0)
        .fold(None, |acc: Option<f64>, v| Some(acc.map_or(v, |m| m.max(v))))
        .unwrap_or(1.0);

    readings
        .into_iter()
        .map(|(label, value)| (label.clone(), (value / max).clamp(0.0, 1.0)))
        .collect()
}

/// Summary of a single test group; `max_total` is the set-wide normalizer.
pub fn summarize(group: &TestGroup, max_total: f64) -> Summary {
    let total = total_elapsed(&group.records);
    let (passed, count) = pass_fail_counts(&group.records);
    let intensity = if max_total > 0.0 {
        (total / max_total).clamp(0.0, 1.0)
    } else {
        0.0
    };

    Summary {
        test: group.name.clone(),
        total_elapsed: total,
        average_elapsed: average_elapsed(&group.records),
        passed,
        total: count,
        intensity,
    }
}

/// Summaries of every group of a set, in test-name order
pub fn summarize_set(set: &TestSet) -> Vec<Summary> {
    let totals: BTreeMap<String, f64> = set
        .groups
        .iter()
        .map(|g| (g.name.clone(), total_elapsed(&g.records)))
        .collect();
    let normalized = color_intensity(totals.iter());

    set.groups
        .iter()
        .map(|group| {
            let mut summary = summarize(group, 0.0);
            summary.intensity = normalized.get(&group.name).copied().unwrap_or(0.0);
            summary
        })
        .collect()
}

/// Regroup a set's records by client, ordered by client then test name
pub fn group_by_client(set: &TestSet) -> BTreeMap<String, Vec<RunRecord>> {
    let mut clients: BTreeMap<String, Vec<RunRecord>> = BTreeMap::new();
    for record in set.records() {
        clients
            .entry(record.client.clone())
            .or_default()
            .push(record.clone());
    }
    for records in clients.values_mut() {
        records.sort_by(|a, b| a.test.cmp(&b.test));
    }
    clients
}

/// Pass/fail and time totals across a set
pub fn set_totals(set: &TestSet) -> SetTotals {
    let passed_tests = set
        .groups
        .iter()
        .filter(|g| group_passed(&g.records))
        .count();
    let total_time = set
        .groups
        .iter()
        .map(|g| average_elapsed(&g.records))
        .sum();

    SetTotals {
        passed_tests,
        failed_tests: set.groups.len() - passed_tests,
        total_tests: set.groups.len(),
        total_time,
    }
}
