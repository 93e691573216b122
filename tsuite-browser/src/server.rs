//! Dashboard HTTP server
//!
//! JSON endpoints expose the archive, display sets and sensor readings; HTML
//! endpoints render the browser pages. Data is loaded once at startup and
//! shared read-only by every handler. A document that failed to load keeps
//! the server up and shows as placeholders on the pages that need it.

use anyhow::Context;
use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::{Html, IntoResponse, Json, Response},
    routing::get,
    Router,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;
use tokio::net::TcpListener;
use tower::ServiceBuilder;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::{info, warn};
use tsuite_common::{DashboardConfig, DisplayConfig, SensorReadings, TestSet, TestSetId, TsuiteError};

use crate::archive::{ArchiveStatistics, TestArchive, TestSetListing};
use crate::history::{display_set, DisplaySet};
use crate::render::{sense_page, summary_page, test_page, Failure, LinkStyle, PageContext, RenderedPage};
use crate::source::DataSource;

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    archive: Result<Arc<TestArchive>, Failure>,
    sensors: Result<Arc<SensorReadings>, Failure>,
    display: Arc<DisplayConfig>,
}

impl AppState {
    pub fn new(
        archive: Result<TestArchive, Failure>,
        sensors: Result<SensorReadings, Failure>,
        display: DisplayConfig,
    ) -> Self {
        Self {
            archive: archive.map(Arc::new),
            sensors: sensors.map(Arc::new),
            display: Arc::new(display),
        }
    }

    /// Load the configured documents. Load failures are kept, not returned.
    pub async fn load(config: &DashboardConfig) -> Self {
        let timeout = Duration::from_secs(config.server.request_timeout_secs);

        let archive = match &config.data.archive {
            Some(location) => DataSource::parse(location)
                .load_archive(timeout)
                .await
                .map_err(|e| {
                    warn!("Failed to load archive from {}: {}", location, e);
                    Failure::from(e)
                }),
            None => {
                warn!("No archive configured, serving an empty one");
                Ok(TestArchive::new())
            }
        };

        let sensors = match &config.data.sensors {
            Some(location) => DataSource::parse(location)
                .load_sensors(timeout)
                .await
                .map_err(|e| {
                    warn!("Failed to load sensor readings from {}: {}", location, e);
                    Failure::from(e)
                }),
            None => Err(Failure::from(TsuiteError::NotFound(
                "no sensor readings configured".to_string(),
            ))),
        };

        Self::new(archive, sensors, config.display.clone())
    }

    fn archive(&self) -> Result<&TestArchive, ApiError> {
        self.archive
            .as_deref()
            .map_err(|failure| ApiError::from(failure.clone()))
    }

    fn page_context(&self) -> PageContext<'_> {
        PageContext::new(&self.display, LinkStyle::Server)
    }
}

/// Error body of the JSON API
#[derive(Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct ErrorBody {
    pub err: String,
    pub err_msg: String,
}

/// Failure of an API request, rendered as `{err, err_msg}`
#[derive(Debug)]
pub struct ApiError(Failure);

/// HTTP status of a failure code
pub fn status_for(code: &str) -> StatusCode {
    match code {
        "not_found" => StatusCode::NOT_FOUND,
        "malformed_data" => StatusCode::UNPROCESSABLE_ENTITY,
        _ => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

impl From<Failure> for ApiError {
    fn from(failure: Failure) -> Self {
        ApiError(failure)
    }
}

impl From<TsuiteError> for ApiError {
    fn from(error: TsuiteError) -> Self {
        ApiError(Failure::from(error))
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let body = ErrorBody {
            err: self.0.code.to_string(),
            err_msg: self.0.message,
        };
        (status_for(self.0.code), Json(body)).into_response()
    }
}

type ApiResult<T> = Result<Json<T>, ApiError>;

#[derive(Debug, Deserialize)]
struct ListQuery {
    limit: Option<usize>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct HealthStatus {
    pub status: String,
    pub service: String,
    pub version: String,
    pub test_sets: Option<usize>,
    pub sensors_loaded: bool,
}

/// Routes of the dashboard
pub fn router(state: AppState) -> Router {
    Router::new()
        // API routes
        .route("/api/health", get(health_check))
        .route("/api/tsets", get(list_tsets))
        .route("/api/tsets/latest", get(latest_tset))
        .route("/api/tsets/:tsid", get(get_tset))
        .route("/api/tsets/display/:tsid", get(get_display_set))
        .route("/api/tsets/adj/:tsid/:n", get(get_neighbors))
        .route("/api/stats", get(get_statistics))
        .route("/data", get(sensor_data))
        // Pages
        .route("/", get(index_page))
        .route("/tsets/:tsid", get(tset_page))
        .route("/tsets/:tsid/tests/:test_name", get(drill_down_page))
        .route("/sense", get(heat_grid_page))
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(CorsLayer::permissive()),
        )
        .with_state(state)
}

/// Load the configured data and serve until the process stops
pub async fn serve(config: &DashboardConfig) -> anyhow::Result<()> {
    let state = AppState::load(config).await;
    let app = router(state);

    info!("Starting dashboard server on {}", config.server.bind_address);
    let listener = TcpListener::bind(&config.server.bind_address)
        .await
        .context("Failed to bind server")?;

    axum::serve(listener, app).await.context("Server error")?;

    Ok(())
}

// API handlers

async fn health_check(State(state): State<AppState>) -> Json<HealthStatus> {
    Json(HealthStatus {
        status: if state.archive.is_ok() { "healthy" } else { "degraded" }.to_string(),
        service: "tsuite-dashboard".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        test_sets: state.archive.as_ref().ok().map(|a| a.len()),
        sensors_loaded: state.sensors.is_ok(),
    })
}

async fn list_tsets(
    State(state): State<AppState>,
    Query(params): Query<ListQuery>,
) -> ApiResult<Vec<TestSetListing>> {
    let limit = params.limit.unwrap_or(state.display.sidebar_limit);
    Ok(Json(state.archive()?.list(limit)))
}

async fn latest_tset(State(state): State<AppState>) -> ApiResult<TestSet> {
    let set = state
        .archive()?
        .latest()
        .ok_or_else(|| TsuiteError::NotFound("no test sets in archive".to_string()))?;
    Ok(Json(set.clone()))
}

async fn get_tset(State(state): State<AppState>, Path(tsid): Path<TestSetId>) -> ApiResult<TestSet> {
    Ok(Json(state.archive()?.require(tsid)?.clone()))
}

async fn get_display_set(
    State(state): State<AppState>,
    Path(tsid): Path<TestSetId>,
) -> ApiResult<DisplaySet> {
    Ok(Json(display_set(state.archive()?, tsid)?))
}

async fn get_neighbors(
    State(state): State<AppState>,
    Path((tsid, n)): Path<(TestSetId, usize)>,
) -> ApiResult<Vec<TestSet>> {
    let sets = state.archive()?.neighbors(tsid, n)?;
    Ok(Json(sets.into_iter().cloned().collect()))
}

async fn get_statistics(State(state): State<AppState>) -> ApiResult<ArchiveStatistics> {
    Ok(Json(state.archive()?.statistics()))
}

async fn sensor_data(State(state): State<AppState>) -> ApiResult<SensorReadings> {
    let readings = state.sensors.as_deref().map_err(|f| ApiError::from(f.clone()))?;
    Ok(Json(readings.clone()))
}

// Page handlers

fn page_response(page: RenderedPage) -> Response {
    let status = match &page.failure {
        Some(failure) if failure.code == "not_found" => StatusCode::NOT_FOUND,
        _ => StatusCode::OK,
    };
    (status, Html(page.html)).into_response()
}

async fn index_page(State(state): State<AppState>) -> Response {
    let page = summary_page(&state.page_context(), state.archive.as_deref(), None);
    page_response(page)
}

async fn tset_page(State(state): State<AppState>, Path(tsid): Path<TestSetId>) -> Response {
    let page = summary_page(&state.page_context(), state.archive.as_deref(), Some(tsid));
    page_response(page)
}

async fn drill_down_page(
    State(state): State<AppState>,
    Path((tsid, test_name)): Path<(TestSetId, String)>,
) -> Response {
    let page = test_page(&state.page_context(), state.archive.as_deref(), tsid, &test_name);
    page_response(page)
}

async fn heat_grid_page(State(state): State<AppState>) -> Response {
    let page = sense_page(&state.page_context(), state.sensors.as_deref());
    page_response(page)
}
