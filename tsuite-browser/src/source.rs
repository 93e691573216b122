//! Data source adapter
//!
//! Loads JSON documents from a file or over HTTP and turns them into the
//! in-memory model. Documents are only ever parsed as JSON.

use serde::de::DeserializeOwned;
use serde_json::Value;
use std::fmt;
use std::path::PathBuf;
use std::time::Duration;
use tracing::{debug, info};
use tsuite_common::{Result, SensorReadings, TestSet, TsuiteError};

use crate::archive::TestArchive;

/// Where a document lives
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DataSource {
    File(PathBuf),
    Url(String),
}

impl DataSource {
    /// `http://` and `https://` become URLs, anything else a file path
    pub fn parse(location: &str) -> Self {
        if location.starts_with("http://") || location.starts_with("https://") {
            DataSource::Url(location.to_string())
        } else {
            DataSource::File(PathBuf::from(location))
        }
    }

    /// Raw document text
    pub async fn fetch_text(&self, timeout: Duration) -> Result<String> {
        match self {
            DataSource::File(path) => {
                debug!("Reading {}", path.display());
                Ok(tokio::fs::read_to_string(path).await?)
            }
            DataSource::Url(url) => {
                debug!("Fetching {}", url);
                let client = reqwest::Client::builder()
                    .timeout(timeout)
                    .build()
                    .map_err(|e| TsuiteError::fetch(url.as_str(), e))?;
                let response = client
                    .get(url.as_str())
                    .send()
                    .await
                    .map_err(|e| TsuiteError::fetch(url.as_str(), e))?;

                let status = response.status();
                if !status.is_success() {
                    return Err(TsuiteError::fetch(url.as_str(), format!("HTTP status {}", status)));
                }

                response
                    .text()
                    .await
                    .map_err(|e| TsuiteError::fetch(url.as_str(), e))
            }
        }
    }

    /// Fetch and parse into any deserializable type
    pub async fn fetch_json<T: DeserializeOwned>(&self, timeout: Duration) -> Result<T> {
        let text = self.fetch_text(timeout).await?;
        serde_json::from_str(&text).map_err(|e| {
            TsuiteError::MalformedData(format!("{}: {}", self, e))
        })
    }

    pub async fn load_archive(&self, timeout: Duration) -> Result<TestArchive> {
        let value: Value = self.fetch_json(timeout).await?;
        let archive = TestArchive::from_json_value(value)?;
        info!("Loaded {} test sets from {}", archive.len(), self);
        Ok(archive)
    }

    pub async fn load_test_set(&self, timeout: Duration) -> Result<TestSet> {
        let value: Value = self.fetch_json(timeout).await?;
        TestSet::from_json_value(value)
    }

    pub async fn load_sensors(&self, timeout: Duration) -> Result<SensorReadings> {
        let readings: SensorReadings = self.fetch_json(timeout).await?;
        info!("Loaded readings for {} sensors from {}", readings.len(), self);
        Ok(readings)
    }
}

impl fmt::Display for DataSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DataSource::File(path) => write!(f, "{}", path.display()),
            DataSource::Url(url) => write!(f, "{}", url),
        }
    }
}
