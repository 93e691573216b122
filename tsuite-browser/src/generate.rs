//! Synthetic test archives for demos and load testing

use rand::Rng;
use std::collections::BTreeMap;
use tracing::debug;
use tsuite_common::{RunRecord, TestGroup, TestSet, TestSetId};

/// Failure message of generated failing runs
pub const FAILURE_MESSAGE: &str = "problem!";

const FAILURE_CHANCE: f64 = 0.1;
const WIDE_DRIFT_CHANCE: f64 = 0.2;

/// What to generate
#[derive(Debug, Clone)]
pub struct GenerateOptions {
    pub sets: usize,
    /// Test names with their base elapsed seconds
    pub tests: Vec<(String, f64)>,
    pub clients: Vec<String>,
}

impl Default for GenerateOptions {
    fn default() -> Self {
        let tests = [
            ("basic_read", 10.0),
            ("basic_write", 10.0),
            ("complex_read", 20.0),
            ("multi_write", 20.0),
            ("huge_seek", 15.0),
            ("dev_zero", 5.0),
            ("scatter", 20.0),
            ("huge_file", 30.0),
            ("batch_insert", 40.0),
            ("test_test", 20.0),
        ];
        Self {
            sets: 100,
            tests: tests.iter().map(|(name, secs)| (name.to_string(), *secs)).collect(),
            clients: vec!["localhost".to_string(), "127.0.0.1".to_string()],
        }
    }
}

/// Generate `options.sets` test sets with tsids starting at 1.
///
/// Tests are sorted by name. Each set fails its first `k` tests with a 10%
/// chance; elapsed times drift from the previous set.
pub fn generate_archive<R: Rng>(options: &GenerateOptions, rng: &mut R) -> Vec<TestSet> {
    let mut tests = options.tests.clone();
    tests.sort_by(|a, b| a.0.cmp(&b.0));

    let mut previous: BTreeMap<(String, String), f64> = BTreeMap::new();
    let mut sets = Vec::with_capacity(options.sets);

    for index in 0..options.sets {
        let tsid = index as TestSetId + 1;
        let failed = if !tests.is_empty() && rng.gen::<f64>() < FAILURE_CHANCE {
            rng.gen_range(0..tests.len())
        } else {
            0
        };
        if failed > 0 {
            debug!("Generated set {} fails {} tests", tsid, failed);
        }

        let groups = tests
            .iter()
            .enumerate()
            .map(|(position, (name, base))| {
                let pass = position >= failed;
                let records = options
                    .clients
                    .iter()
                    .map(|client| {
                        let key = (name.clone(), client.clone());
                        let elapsed = match previous.get(&key) {
                            Some(last) => last * drift(&mut *rng),
                            None => *base,
                        };
                        previous.insert(key, elapsed);

                        let record = RunRecord::new(name.as_str(), client.as_str(), elapsed, pass);
                        if pass {
                            record
                        } else {
                            record.with_error(FAILURE_MESSAGE)
                        }
                    })
                    .collect();
                TestGroup::new(name.as_str(), records)
            })
            .collect();

        sets.push(TestSet::new(tsid, format!("#{}", tsid), groups));
    }

    sets
}

fn drift<R: Rng>(rng: &mut R) -> f64 {
    if rng.gen::<f64>() < WIDE_DRIFT_CHANCE {
        rng.gen_range(0.8..1.2)
    } else {
        rng.gen_range(0.95..1.05)
    }
}
