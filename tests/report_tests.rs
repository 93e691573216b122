//! Static report generation from documents on disk

use anyhow::Result;
use std::time::Duration;
use tempfile::tempdir;

use tsuite::prelude::*;
use tsuite::write_report;

const TIMEOUT: Duration = Duration::from_secs(5);

const RESULTS: &str = r#"{
    "read": [
        {"client": "localhost", "result": {"name": "read", "resource_usage": {}, "operate": {"elapsed": 1.0, "error": null, "pass": true}}},
        {"client": "127.0.0.1", "result": {"name": "read", "resource_usage": {}, "operate": {"elapsed": 3.0, "error": "EIO", "pass": false}}}
    ],
    "huge seek": [
        {"client": "localhost", "result": {"name": "huge seek", "resource_usage": {}, "operate": {"elapsed": 0.5, "error": null, "pass": true}}}
    ]
}"#;

#[tokio::test]
async fn test_bare_results_mapping_report() -> Result<()> {
    let input = tempdir()?;
    let results = input.path().join("results.json");
    std::fs::write(&results, RESULTS)?;

    let output = tempdir()?;
    let generator = ReportGenerator::new(ReportConfigBuilder::new().output_dir(output.path()).build());
    let manifest = write_report(&DataSource::File(results), None, None, &generator, TIMEOUT).await?;

    assert!(manifest.is_complete());
    assert_eq!(manifest.tsid, Some(0));

    let index = std::fs::read_to_string(output.path().join("index.html"))?;
    assert!(index.contains("Test Set adhoc"));
    assert!(index.contains("1 / 2"));
    assert!(index.contains("EIO"));

    let drill = std::fs::read_to_string(output.path().join("tests/huge.20seek.html"))?;
    assert!(drill.contains(r#"id="client_breakdown""#));
    assert!(output.path().join("tests/read.html").exists());

    Ok(())
}

#[tokio::test]
async fn test_unreachable_source_writes_placeholder_report() -> Result<()> {
    let output = tempdir()?;
    let generator = ReportGenerator::new(ReportConfigBuilder::new().output_dir(output.path()).build());
    let source = DataSource::parse("http://127.0.0.1:1/tsets.json");

    let manifest = write_report(&source, None, None, &generator, TIMEOUT).await?;

    assert!(!manifest.is_complete());
    assert_eq!(manifest.failures[0].code, "fetch");
    let index = std::fs::read_to_string(output.path().join("index.html"))?;
    assert!(index.contains(r#"data-error="fetch""#));

    Ok(())
}

#[tokio::test]
async fn test_malformed_sensors_get_placeholder_page() -> Result<()> {
    let input = tempdir()?;
    let results = input.path().join("results.json");
    let sensors = input.path().join("sense.json");
    std::fs::write(&results, RESULTS)?;
    std::fs::write(&sensors, "[1, 2, 3]")?;

    let output = tempdir()?;
    let generator = ReportGenerator::new(ReportConfigBuilder::new().output_dir(output.path()).build());
    let manifest = write_report(
        &DataSource::File(results),
        Some(&DataSource::File(sensors)),
        None,
        &generator,
        TIMEOUT,
    )
    .await?;

    assert_eq!(manifest.failures.len(), 1);
    assert_eq!(manifest.failures[0].code, "malformed_data");
    let sense = std::fs::read_to_string(output.path().join("sense.html"))?;
    assert!(sense.contains("Data is malformed"));

    Ok(())
}
