use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::BTreeMap;

use crate::error::{Result, TsuiteError};

/// Name used for a results mapping that arrives without test-set metadata
pub const ADHOC_TSET_NAME: &str = "adhoc";

/// Identifier of a test set (one full run of the suite)
pub type TestSetId = u64;

/// Sensor name -> disk label -> reading
pub type SensorReadings = BTreeMap<String, BTreeMap<String, f64>>;

/// One test execution's outcome for one client
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunRecord {
    pub test: String,
    pub client: String,
    /// Seconds
    pub elapsed: f64,
    pub pass: bool,
    pub error: Option<String>,
}

impl RunRecord {
    pub fn new(test: impl Into<String>, client: impl Into<String>, elapsed: f64, pass: bool) -> Self {
        Self {
            test: test.into(),
            client: client.into(),
            elapsed,
            pass,
            error: None,
        }
    }

    pub fn with_error(mut self, error: impl Into<String>) -> Self {
        self.error = Some(error.into());
        self
    }
}

/// All run records sharing a test name, ordered by client
#[derive(Debug, Clone, PartialEq)]
pub struct TestGroup {
    pub name: String,
    pub records: Vec<RunRecord>,
}

impl TestGroup {
    pub fn new(name: impl Into<String>, mut records: Vec<RunRecord>) -> Self {
        records.sort_by(|a, b| a.client.cmp(&b.client));
        Self {
            name: name.into(),
            records,
        }
    }
}

/// A full run of the suite across all clients
#[derive(Debug, Clone, PartialEq)]
pub struct TestSet {
    pub tsid: TestSetId,
    pub tset_name: String,
    /// Ordered by test name
    pub groups: Vec<TestGroup>,
}

impl TestSet {
    pub fn new(tsid: TestSetId, tset_name: impl Into<String>, mut groups: Vec<TestGroup>) -> Self {
        groups.sort_by(|a, b| a.name.cmp(&b.name));
        Self {
            tsid,
            tset_name: tset_name.into(),
            groups,
        }
    }

    pub fn group(&self, test_name: &str) -> Option<&TestGroup> {
        self.groups.iter().find(|g| g.name == test_name)
    }

    pub fn records(&self) -> impl Iterator<Item = &RunRecord> {
        self.groups.iter().flat_map(|g| g.records.iter())
    }

    /// Parse a test-set document.
    ///
    /// Accepts either `{tsid, tset_name, tests: {...}}` or a bare results
    /// mapping, which becomes an anonymous set with tsid 0. Results of a test
    /// are always an array, so an object under `tests` marks a full document.
    pub fn from_json_value(value: Value) -> Result<Self> {
        let Value::Object(mut obj) = value else {
            return Err(TsuiteError::MalformedData(
                "test set document must be a JSON object".to_string(),
            ));
        };

        if !matches!(obj.get("tests"), Some(Value::Object(_))) {
            let groups = parse_test_groups(&obj)?;
            return Ok(Self::new(0, ADHOC_TSET_NAME, groups));
        }

        let tsid = obj
            .get("tsid")
            .and_then(Value::as_u64)
            .ok_or_else(|| TsuiteError::MalformedData("test set is missing a numeric tsid".to_string()))?;
        let tset_name = match obj.get("tset_name") {
            Some(Value::String(name)) => name.clone(),
            None | Some(Value::Null) => format!("#{}", tsid),
            Some(other) => {
                return Err(TsuiteError::MalformedData(format!(
                    "test set {} has a non-string tset_name: {}",
                    tsid, other
                )))
            }
        };
        let Some(Value::Object(tests)) = obj.remove("tests") else {
            return Err(TsuiteError::MalformedData(format!(
                "test set {} must carry `tests` as an object of test name to client results",
                tsid
            )));
        };

        Ok(Self::new(tsid, tset_name, parse_test_groups(&tests)?))
    }

    /// Wire representation, the inverse of [`TestSet::from_json_value`].
    pub fn to_document(&self) -> TestSetDocument {
        let tests = self
            .groups
            .iter()
            .map(|group| {
                let clients = group
                    .records
                    .iter()
                    .map(|record| ClientResult {
                        client: record.client.clone(),
                        result: TestOutcome {
                            name: Some(record.test.clone()),
                            resource_usage: Value::Object(Map::new()),
                            operate: Operate {
                                elapsed: record.elapsed,
                                error: record.error.clone(),
                                pass: record.pass,
                            },
                        },
                    })
                    .collect();
                (group.name.clone(), clients)
            })
            .collect();

        TestSetDocument {
            tsid: self.tsid,
            tset_name: self.tset_name.clone(),
            tests,
        }
    }
}

impl Serialize for TestSet {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        self.to_document().serialize(serializer)
    }
}

/// Serialized form of a test set
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TestSetDocument {
    pub tsid: TestSetId,
    pub tset_name: String,
    pub tests: BTreeMap<String, Vec<ClientResult>>,
}

/// One client's entry under a test name
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClientResult {
    pub client: String,
    pub result: TestOutcome,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TestOutcome {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub resource_usage: Value,
    pub operate: Operate,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Operate {
    pub elapsed: f64,
    #[serde(default)]
    pub error: Option<String>,
    pub pass: bool,
}

/// Convert a `test name -> [client result]` mapping into test groups.
pub fn parse_test_groups(tests: &Map<String, Value>) -> Result<Vec<TestGroup>> {
    let mut groups = Vec::with_capacity(tests.len());

    for (test_name, entries) in tests {
        let Value::Array(entries) = entries else {
            return Err(TsuiteError::MalformedData(format!(
                "results for test `{}` must be an array",
                test_name
            )));
        };

        let mut records = Vec::with_capacity(entries.len());
        for (index, entry) in entries.iter().enumerate() {
            let client_name = entry
                .get("client")
                .and_then(Value::as_str)
                .map(str::to_string)
                .unwrap_or_else(|| format!("#{}", index));

            let parsed: ClientResult = serde_json::from_value(entry.clone()).map_err(|e| {
                TsuiteError::MalformedData(format!(
                    "test `{}`, client `{}`: {}",
                    test_name, client_name, e
                ))
            })?;

            if parsed.result.operate.elapsed < 0.0 {
                return Err(TsuiteError::MalformedData(format!(
                    "test `{}`, client `{}`: negative elapsed {}",
                    test_name, parsed.client, parsed.result.operate.elapsed
                )));
            }

            records.push(RunRecord {
                test: test_name.clone(),
                client: parsed.client,
                elapsed: parsed.result.operate.elapsed,
                pass: parsed.result.operate.pass,
                error: parsed.result.operate.error,
            });
        }

        groups.push(TestGroup::new(test_name.clone(), records));
    }

    Ok(groups)
}
