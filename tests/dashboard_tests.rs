//! End-to-end tests of the dashboard
//!
//! Archives are generated, written to disk, loaded back through the data
//! source adapter and served by the router.

use anyhow::Result;
use axum::body::{to_bytes, Body};
use axum::http::{Request, StatusCode};
use axum::Router;
use rand::rngs::StdRng;
use rand::SeedableRng;
use std::time::Duration;
use tempfile::tempdir;
use tower::ServiceExt;

use tsuite::browser::generate::{generate_archive, GenerateOptions};
use tsuite::browser::server::{router, AppState};
use tsuite::prelude::*;

const TIMEOUT: Duration = Duration::from_secs(5);

async fn get(app: Router, uri: &str) -> Result<(StatusCode, String)> {
    let response = app.oneshot(Request::builder().uri(uri).body(Body::empty())?).await?;
    let status = response.status();
    let bytes = to_bytes(response.into_body(), usize::MAX).await?;
    Ok((status, String::from_utf8(bytes.to_vec())?))
}

async fn generated_state(sets: usize) -> Result<AppState> {
    let dir = tempdir()?;
    let path = dir.path().join("tsets.json");
    let options = GenerateOptions {
        sets,
        ..Default::default()
    };
    let archive = generate_archive(&options, &mut StdRng::seed_from_u64(42));
    std::fs::write(&path, serde_json::to_string(&archive)?)?;

    let mut config = DashboardConfig::default();
    config.data.archive = Some(path.display().to_string());
    Ok(AppState::load(&config).await)
}

#[tokio::test]
async fn test_generated_archive_round_trips_through_api() -> Result<()> {
    let app = router(generated_state(12).await?);

    let (status, body) = get(app.clone(), "/api/stats").await?;
    assert_eq!(status, StatusCode::OK);
    let stats: serde_json::Value = serde_json::from_str(&body)?;
    assert_eq!(stats["total_sets"], 12);
    assert_eq!(stats["latest_tsid"], 12);
    assert_eq!(stats["test_names"].as_array().map(|a| a.len()), Some(10));

    let (status, body) = get(app.clone(), "/api/tsets/7").await?;
    assert_eq!(status, StatusCode::OK);
    let set = TestSet::from_json_value(serde_json::from_str(&body)?)?;
    assert_eq!(set.tsid, 7);
    assert_eq!(set.groups.len(), 10);

    let (status, body) = get(app, "/api/tsets/display/12").await?;
    assert_eq!(status, StatusCode::OK);
    let display: serde_json::Value = serde_json::from_str(&body)?;
    assert_eq!(display["tests"].as_array().map(|a| a.len()), Some(10));

    Ok(())
}

#[tokio::test]
async fn test_pages_link_to_drill_down() -> Result<()> {
    let app = router(generated_state(3).await?);

    let (status, body) = get(app.clone(), "/").await?;
    assert_eq!(status, StatusCode::OK);
    assert!(body.contains(r#"href="/tsets/3/tests/basic_read""#));

    let (status, body) = get(app, "/tsets/3/tests/basic_read").await?;
    assert_eq!(status, StatusCode::OK);
    assert!(body.contains(r#"id="test_history-basic_read""#));
    assert!(body.contains(r#"["1",10.0]"#));

    Ok(())
}

#[tokio::test]
async fn test_missing_documents_render_placeholders() -> Result<()> {
    let dir = tempdir()?;
    let mut config = DashboardConfig::default();
    config.data.archive = Some(dir.path().join("absent.json").display().to_string());
    config.data.sensors = Some(dir.path().join("absent-sense.json").display().to_string());
    let app = router(AppState::load(&config).await);

    let (status, body) = get(app.clone(), "/").await?;
    assert_eq!(status, StatusCode::OK);
    assert!(body.contains(r#"data-error="io""#));

    let (status, body) = get(app.clone(), "/sense").await?;
    assert_eq!(status, StatusCode::OK);
    assert!(body.contains(r#"id="main""#));
    assert!(body.contains("Data could not be fetched"));

    let (status, body) = get(app, "/api/tsets/1").await?;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert!(body.contains(r#""err":"io""#));

    Ok(())
}

#[tokio::test]
async fn test_sensor_readings_served_as_loaded() -> Result<()> {
    let dir = tempdir()?;
    let path = dir.path().join("sense.json");
    std::fs::write(&path, r#"{"sense0": {"sdiska0-front": 5, "sdiska1-front": 0}}"#)?;

    let readings = DataSource::File(path).load_sensors(TIMEOUT).await?;
    let app = router(AppState::new(Ok(TestArchive::new()), Ok(readings), DisplayConfig::default()));

    let (status, body) = get(app.clone(), "/data").await?;
    assert_eq!(status, StatusCode::OK);
    let data: serde_json::Value = serde_json::from_str(&body)?;
    assert_eq!(data["sense0"]["sdiska0-front"], 5.0);

    let (_, body) = get(app, "/sense").await?;
    assert!(body.contains(r##"fill="#ff0000""##));
    assert!(body.contains(r##"fill="#ffffff""##));

    Ok(())
}
