//! HTTP surface for the pavdash dashboard.
//!
//! Serves the HTML dashboard and a small read-only JSON API over one
//! [`DataContext`] loaded at startup. Every request carries the whole
//! selection in its query string and is answered from scratch.
//!
//! # Endpoints
//!
//! - `GET /` - HTML dashboard for the query selection
//! - `GET /health` - Health check
//! - `GET /api/projects` - Loaded projects with row counts and date ranges
//! - `GET /api/options` - Selector options for the query selection
//! - `GET /api/charts/daily` - Daily production table
//! - `GET /api/charts/summary` - Actual vs planned table for the month
//! - `GET /charts/daily.svg` - Daily production chart
//! - `GET /charts/summary.svg` - Actual vs planned chart
//!
//! Query parameters for the selection endpoints: `activity`, `project`,
//! `month` (`YYYY-MM`) and `week` (`YYYY-MM-DD/YYYY-MM-DD`). Missing values
//! mean "all"; a missing month falls back to the latest month in scope.

use std::net::SocketAddr;
use std::sync::Arc;

use axum::{
    extract::{Query, State},
    http::{header, StatusCode},
    response::{Html, IntoResponse, Response},
    routing::get,
    Json, Router,
};
use chrono::NaiveDate;
use pavdash_core::options::{latest_month, options, SelectorOptions};
use pavdash_core::reshape::{daily_series, period_summary, DailySeriesTable, PeriodSummaryTable};
use pavdash_core::{DataContext, Month, ProjectId, RenderError, Renderer, Selection};
use pavdash_render::{DashboardPage, DashboardView};
use serde::{Deserialize, Serialize};
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::{debug, info};

// ============================================================================
// Application State
// ============================================================================

/// Shared application state for the web server.
#[derive(Clone)]
pub struct AppState {
    /// Loaded production data (immutable after startup)
    ctx: Arc<DataContext>,
    /// Page and chart renderers
    page: Arc<DashboardPage>,
}

impl AppState {
    /// Creates a new application state with the default page layout.
    pub fn new(ctx: DataContext) -> Self {
        Self {
            ctx: Arc::new(ctx),
            page: Arc::new(DashboardPage::default()),
        }
    }

    /// Replaces the page renderer (theme, title, chart sizes).
    #[must_use]
    pub fn with_page(mut self, page: DashboardPage) -> Self {
        self.page = Arc::new(page);
        self
    }

    /// Returns the loaded data.
    pub fn context(&self) -> &DataContext {
        &self.ctx
    }

    /// Turn raw query values into a selection, preselecting the latest month.
    fn selection(&self, query: &SelectionQuery) -> Result<Selection, ApiFailure> {
        let mut selection = Selection::from_raw(
            query.activity.as_deref(),
            query.project.as_deref(),
            query.month.as_deref(),
            query.week.as_deref(),
        )
        .map_err(|e| {
            (
                StatusCode::BAD_REQUEST,
                Json(ApiError::with_details("Invalid selection", e.to_string())),
            )
        })?;

        if selection.month.is_none() {
            selection.month = latest_month(&self.ctx, &selection.project);
            debug!(month = ?selection.month, "Preselected latest month");
        }
        Ok(selection)
    }
}

// ============================================================================
// Request/Response Types
// ============================================================================

/// Selector values as they arrive in the query string.
#[derive(Debug, Default, Deserialize)]
pub struct SelectionQuery {
    pub activity: Option<String>,
    pub project: Option<String>,
    pub month: Option<String>,
    pub week: Option<String>,
}

/// Health check response.
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    /// Service status.
    pub status: String,
    /// Crate version.
    pub version: String,
}

/// API error response.
#[derive(Debug, Serialize)]
pub struct ApiError {
    /// Error message.
    pub error: String,
    /// Optional additional details.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
}

impl ApiError {
    fn with_details(error: impl Into<String>, details: impl Into<String>) -> Self {
        Self {
            error: error.into(),
            details: Some(details.into()),
        }
    }
}

type ApiFailure = (StatusCode, Json<ApiError>);

fn render_failure(err: &RenderError) -> ApiFailure {
    (
        StatusCode::INTERNAL_SERVER_ERROR,
        Json(ApiError::with_details("Failed to render chart", err.to_string())),
    )
}

/// One loaded project.
#[derive(Debug, Serialize)]
pub struct ProjectInfo {
    pub id: ProjectId,
    pub label: String,
    pub rows: usize,
    pub first_date: Option<NaiveDate>,
    pub last_date: Option<NaiveDate>,
    pub months: Vec<Month>,
}

/// Project list response.
#[derive(Debug, Serialize)]
pub struct ProjectListResponse {
    pub projects: Vec<ProjectInfo>,
    pub total: usize,
}

/// Options response, echoing the selection they were derived from.
#[derive(Debug, Serialize)]
pub struct OptionsResponse {
    pub selection: Selection,
    pub options: SelectorOptions,
}

/// Chart table response, echoing the selection it was derived from.
#[derive(Debug, Serialize)]
pub struct ChartResponse<T> {
    pub selection: Selection,
    pub table: T,
}

// ============================================================================
// Route Handlers
// ============================================================================

/// GET / - HTML dashboard.
async fn dashboard(
    State(state): State<AppState>,
    Query(query): Query<SelectionQuery>,
) -> Result<Html<String>, ApiFailure> {
    let selection = state.selection(&query)?;
    let opts = options(&state.ctx, &selection);
    let daily = daily_series(&state.ctx, &selection);
    let summary = period_summary(&state.ctx, &selection);

    let view = DashboardView {
        options: &opts,
        selection: &selection,
        daily: &daily,
        summary: &summary,
    };
    state
        .page
        .render(&view)
        .map(Html)
        .map_err(|e| render_failure(&e))
}

/// GET /health - Health check endpoint.
async fn health_check() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
    })
}

/// GET /api/projects - List loaded projects.
async fn list_projects(State(state): State<AppState>) -> Json<ProjectListResponse> {
    let projects: Vec<ProjectInfo> = state
        .ctx
        .projects()
        .map(|dataset| {
            let range = dataset.date_range();
            ProjectInfo {
                id: dataset.id().clone(),
                label: dataset.label(),
                rows: dataset.len(),
                first_date: range.map(|(first, _)| first),
                last_date: range.map(|(_, last)| last),
                months: dataset.months().into_iter().collect(),
            }
        })
        .collect();

    let total = projects.len();
    Json(ProjectListResponse { projects, total })
}

/// GET /api/options - Cascading selector options.
async fn get_options(
    State(state): State<AppState>,
    Query(query): Query<SelectionQuery>,
) -> Result<Json<OptionsResponse>, ApiFailure> {
    let selection = state.selection(&query)?;
    let options = options(&state.ctx, &selection);
    Ok(Json(OptionsResponse { selection, options }))
}

/// GET /api/charts/daily - Daily production table.
async fn daily_table(
    State(state): State<AppState>,
    Query(query): Query<SelectionQuery>,
) -> Result<Json<ChartResponse<DailySeriesTable>>, ApiFailure> {
    let selection = state.selection(&query)?;
    let table = daily_series(&state.ctx, &selection);
    Ok(Json(ChartResponse { selection, table }))
}

/// GET /api/charts/summary - Actual vs planned table.
async fn summary_table(
    State(state): State<AppState>,
    Query(query): Query<SelectionQuery>,
) -> Result<Json<ChartResponse<PeriodSummaryTable>>, ApiFailure> {
    let selection = state.selection(&query)?;
    let table = period_summary(&state.ctx, &selection);
    Ok(Json(ChartResponse { selection, table }))
}

fn svg_response(body: String) -> Response {
    ([(header::CONTENT_TYPE, "image/svg+xml")], body).into_response()
}

/// GET /charts/daily.svg - Daily production chart.
async fn daily_svg(
    State(state): State<AppState>,
    Query(query): Query<SelectionQuery>,
) -> Result<Response, ApiFailure> {
    let selection = state.selection(&query)?;
    let table = daily_series(&state.ctx, &selection);
    state
        .page
        .line
        .render(&table)
        .map(svg_response)
        .map_err(|e| render_failure(&e))
}

/// GET /charts/summary.svg - Actual vs planned chart.
async fn summary_svg(
    State(state): State<AppState>,
    Query(query): Query<SelectionQuery>,
) -> Result<Response, ApiFailure> {
    let selection = state.selection(&query)?;
    let table = period_summary(&state.ctx, &selection);
    state
        .page
        .bar
        .render(&table)
        .map(svg_response)
        .map_err(|e| render_failure(&e))
}

// ============================================================================
// Router Setup
// ============================================================================

/// Creates the router with all endpoints.
pub fn create_router(state: AppState) -> Router {
    // Read-only API; any origin may embed the charts
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/", get(dashboard))
        .route("/health", get(health_check))
        .route("/api/projects", get(list_projects))
        .route("/api/options", get(get_options))
        .route("/api/charts/daily", get(daily_table))
        .route("/api/charts/summary", get(summary_table))
        .route("/charts/daily.svg", get(daily_svg))
        .route("/charts/summary.svg", get(summary_svg))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Runs the web server until the process is stopped.
///
/// # Errors
///
/// Returns an error if the address cannot be bound or the server fails.
pub async fn run_server(state: AppState, addr: SocketAddr) -> anyhow::Result<()> {
    let projects = state.context().len();
    let app = create_router(state);

    info!(%addr, projects, "Starting pavdash web server");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
