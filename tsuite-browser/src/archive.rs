//! Read-only archive of test sets
//!
//! Holds every test set the browser knows about, keyed by tsid, and answers
//! the lookups the dashboard needs: a single set, the latest one, a newest
//! first listing, and the neighborhood of a set for history views.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::{BTreeMap, BTreeSet};
use tracing::{debug, info};
use tsuite_common::{Result, TestSet, TestSetId, TsuiteError};

use crate::aggregate::{pass_fail_counts, set_totals, SetTotals};

/// Test sets ordered by tsid
#[derive(Debug, Clone, Default)]
pub struct TestArchive {
    sets: BTreeMap<TestSetId, TestSet>,
}

/// Entry of the test set listing (sidebar, `/api/tsets`)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TestSetListing {
    pub tsid: TestSetId,
    pub tset_name: String,
    #[serde(flatten)]
    pub totals: SetTotals,
}

/// Archive-wide statistics
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ArchiveStatistics {
    pub total_sets: usize,
    pub total_records: usize,
    pub test_names: Vec<String>,
    pub latest_tsid: Option<TestSetId>,
    /// Passing records over all records, 0.0 for an empty archive
    pub pass_rate: f64,
}

impl TestArchive {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build an archive, rejecting duplicate tsids
    pub fn from_sets(sets: impl IntoIterator<Item = TestSet>) -> Result<Self> {
        let mut archive = Self::new();
        for set in sets {
            archive.insert(set)?;
        }
        Ok(archive)
    }

    /// Parse an archive document: an array of test sets, a single test set,
    /// or a bare results mapping.
    pub fn from_json_value(value: Value) -> Result<Self> {
        match value {
            Value::Array(items) => {
                let sets = items
                    .into_iter()
                    .map(TestSet::from_json_value)
                    .collect::<Result<Vec<_>>>()?;
                let archive = Self::from_sets(sets)?;
                info!("Loaded archive with {} test sets", archive.len());
                Ok(archive)
            }
            other @ Value::Object(_) => {
                debug!("Archive document is a single test set");
                Self::from_sets([TestSet::from_json_value(other)?])
            }
            _ => Err(TsuiteError::MalformedData(
                "archive must be an array of test sets or a test set object".to_string(),
            )),
        }
    }

    pub fn insert(&mut self, set: TestSet) -> Result<()> {
        if self.sets.contains_key(&set.tsid) {
            return Err(TsuiteError::MalformedData(format!(
                "duplicate tsid {} in archive",
                set.tsid
            )));
        }
        self.sets.insert(set.tsid, set);
        Ok(())
    }

    pub fn len(&self) -> usize {
        self.sets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sets.is_empty()
    }

    pub fn get(&self, tsid: TestSetId) -> Option<&TestSet> {
        self.sets.get(&tsid)
    }

    /// Lookup that reports a missing set as `NotFound`
    pub fn require(&self, tsid: TestSetId) -> Result<&TestSet> {
        self.get(tsid)
            .ok_or_else(|| TsuiteError::NotFound(format!("test set {}", tsid)))
    }

    /// The set with the highest tsid
    pub fn latest(&self) -> Option<&TestSet> {
        self.sets.values().next_back()
    }

    /// Sets in ascending tsid order
    pub fn iter(&self) -> impl DoubleEndedIterator<Item = &TestSet> {
        self.sets.values()
    }

    /// Sets strictly older than `tsid`, newest first
    pub fn before(&self, tsid: TestSetId) -> impl Iterator<Item = &TestSet> {
        self.sets.range(..tsid).rev().map(|(_, set)| set)
    }

    /// Newest first listing limited to `limit` entries
    pub fn list(&self, limit: usize) -> Vec<TestSetListing> {
        self.sets
            .values()
            .rev()
            .take(limit)
            .map(|set| TestSetListing {
                tsid: set.tsid,
                tset_name: set.tset_name.clone(),
                totals: set_totals(set),
            })
            .collect()
    }

    /// Up to `n` sets on each side of `tsid`, plus the set itself, ascending.
    pub fn neighbors(&self, tsid: TestSetId, n: usize) -> Result<Vec<&TestSet>> {
        let center = self.require(tsid)?;
        let mut older: Vec<&TestSet> = self.before(tsid).take(n).collect();
        older.reverse();

        let newer = self
            .sets
            .range(tsid.saturating_add(1)..)
            .take(n)
            .map(|(_, set)| set);

        Ok(older
            .into_iter()
            .chain(std::iter::once(center))
            .chain(newer)
            .collect())
    }

    pub fn statistics(&self) -> ArchiveStatistics {
        let mut test_names = BTreeSet::new();
        let mut passed = 0;
        let mut total = 0;

        for set in self.sets.values() {
            for group in &set.groups {
                test_names.insert(group.name.clone());
                let (p, t) = pass_fail_counts(&group.records);
                passed += p;
                total += t;
            }
        }

        ArchiveStatistics {
            total_sets: self.sets.len(),
            total_records: total,
            test_names: test_names.into_iter().collect(),
            latest_tsid: self.latest().map(|s| s.tsid),
            pass_rate: if total > 0 { passed as f64 / total as f64 } else { 0.0 },
        }
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use tsuite_common::{RunRecord, TestGroup};

    /// Sets 1..=count with a single `read` test on two clients.
    pub(crate) fn sample_archive(count: u64) -> TestArchive {
        TestArchive::from_sets((1..=count).map(|tsid| {
            let elapsed = tsid as f64;
            TestSet::new(
                tsid,
                format!("#{}", tsid),
                vec![TestGroup::new(
                    "read",
                    vec![
                        RunRecord::new("read", "localhost", elapsed, true),
                        RunRecord::new("read", "127.0.0.1", elapsed, tsid % 2 == 1),
                    ],
                )],
            )
        }))
        .unwrap()
    }

    #[test]
    fn test_latest_and_listing() {
        let archive = sample_archive(5);
        assert_eq!(archive.latest().unwrap().tsid, 5);

        let listing = archive.list(3);
        let ids: Vec<_> = listing.iter().map(|l| l.tsid).collect();
        assert_eq!(ids, vec![5, 4, 3]);
        assert_eq!(listing[0].totals.passed_tests, 1);
        assert_eq!(listing[1].totals.failed_tests, 1);
    }

    #[test]
    fn test_neighbors_window() {
        let archive = sample_archive(10);
        let ids: Vec<_> = archive.neighbors(5, 2).unwrap().iter().map(|s| s.tsid).collect();
        assert_eq!(ids, vec![3, 4, 5, 6, 7]);

        let edge: Vec<_> = archive.neighbors(1, 3).unwrap().iter().map(|s| s.tsid).collect();
        assert_eq!(edge, vec![1, 2, 3, 4]);

        assert!(matches!(archive.neighbors(42, 1), Err(TsuiteError::NotFound(_))));
    }

    #[test]
    fn test_duplicate_tsid_rejected() {
        let set = TestSet::new(1, "#1", vec![]);
        let result = TestArchive::from_sets([set.clone(), set]);
        assert!(matches!(result, Err(TsuiteError::MalformedData(_))));
    }

    #[test]
    fn test_statistics() {
        let stats = sample_archive(4).statistics();
        assert_eq!(stats.total_sets, 4);
        assert_eq!(stats.total_records, 8);
        assert_eq!(stats.test_names, vec!["read".to_string()]);
        assert_eq!(stats.latest_tsid, Some(4));
        assert_eq!(stats.pass_rate, 0.75);

        let empty = TestArchive::new().statistics();
        assert_eq!(empty.pass_rate, 0.0);
        assert!(empty.latest_tsid.is_none());
    }

    #[test]
    fn test_from_json_array() {
        let value = serde_json::json!([
            { "tsid": 2, "tset_name": "#2", "tests": {} },
            { "tsid": 1, "tests": {} }
        ]);
        let archive = TestArchive::from_json_value(value).unwrap();
        assert_eq!(archive.len(), 2);
        assert_eq!(archive.get(1).unwrap().tset_name, "#1");
        assert!(TestArchive::from_json_value(serde_json::json!(3)).is_err());
    }
}
