// Gapminder Dashboard - Web Server
// JSON API with Axum serving the filtered bubble-chart data

use anyhow::{Context, Result};
use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Json, Response},
    routing::get,
    Router,
};
use clap::Parser;
use gapminder::{
    available_defaults, filter_bubbles, layout, Bubble, ChartLayout, Config, DataStore,
    MergedRecord, MergedTable, Selection,
};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::sync::{Arc, Mutex};
use tower_http::cors::CorsLayer;
use tracing::{error, info};

/// Shared application state
#[derive(Clone)]
struct AppState {
    store: Arc<Mutex<DataStore>>,
    config: Arc<Config>,
}

impl AppState {
    fn new(config: Config) -> Self {
        Self {
            store: Arc::new(Mutex::new(DataStore::from_config(&config))),
            config: Arc::new(config),
        }
    }

    /// Memoized merged table; errors are rendered into the response
    fn table(&self) -> std::result::Result<Arc<MergedTable>, String> {
        let mut store = self
            .store
            .lock()
            .map_err(|_| "data store lock poisoned".to_string())?;
        store.merged().map_err(|e| e.to_string())
    }
}

/// API Response wrapper
#[derive(Serialize)]
struct ApiResponse<T> {
    success: bool,
    data: Option<T>,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<String>,
}

impl<T: Serialize> ApiResponse<T> {
    fn ok(data: T) -> Response {
        let body = Self {
            success: true,
            data: Some(data),
            error: None,
        };
        (StatusCode::OK, Json(body)).into_response()
    }

    fn fail(message: String) -> Response {
        error!("Request failed: {}", message);
        let body = Self {
            success: false,
            data: None,
            error: Some(message),
        };
        (StatusCode::INTERNAL_SERVER_ERROR, Json(body)).into_response()
    }
}

#[derive(Serialize, Deserialize)]
struct YearRange {
    min: i32,
    max: i32,
}

#[derive(Deserialize)]
struct BubbleQuery {
    year: i32,
    /// Comma separated country names
    countries: Option<String>,
}

#[derive(Serialize, Deserialize)]
struct BubblesResponse {
    year: i32,
    countries: Vec<String>,
    bubbles: Vec<Bubble>,
}

// ============================================================================
// API Handlers
// ============================================================================

/// GET /api/health - Health check
async fn health_check() -> Response {
    ApiResponse::ok("OK")
}

/// GET /api/years - Slider bounds
async fn get_years(State(state): State<AppState>) -> Response {
    match state.table() {
        Ok(table) => match table.year_range() {
            Some((min, max)) => ApiResponse::ok(YearRange { min, max }),
            None => ApiResponse::<YearRange>::fail("no data loaded".to_string()),
        },
        Err(e) => ApiResponse::<YearRange>::fail(e),
    }
}

/// GET /api/countries - Multiselect options
async fn get_countries(State(state): State<AppState>) -> Response {
    match state.table() {
        Ok(table) => ApiResponse::ok(table.countries()),
        Err(e) => ApiResponse::<Vec<String>>::fail(e),
    }
}

/// GET /api/countries/:name - One country's merged time series
async fn get_country_series(
    State(state): State<AppState>,
    Path(name): Path<String>,
) -> Response {
    match state.table() {
        Ok(table) => {
            let series: Vec<MergedRecord> = table.series(&name).into_iter().cloned().collect();
            ApiResponse::ok(series)
        }
        Err(e) => ApiResponse::<Vec<MergedRecord>>::fail(e),
    }
}

/// GET /api/bubbles?year=Y&countries=A,B - Filtered, coerced chart rows
async fn get_bubbles(State(state): State<AppState>, Query(query): Query<BubbleQuery>) -> Response {
    match state.table() {
        Ok(table) => {
            let selection = selection_for(&table, &state.config, &query);
            ApiResponse::ok(BubblesResponse {
                year: selection.year,
                countries: selection.countries.iter().cloned().collect(),
                bubbles: filter_bubbles(&table, &selection),
            })
        }
        Err(e) => ApiResponse::<BubblesResponse>::fail(e),
    }
}

/// GET /api/chart?year=Y&countries=A,B - Bubbles laid out for drawing
async fn get_chart(State(state): State<AppState>, Query(query): Query<BubbleQuery>) -> Response {
    match state.table() {
        Ok(table) => {
            let order = requested_countries(&table, &state.config, &query);
            let selection = Selection::new(query.year, order.iter().cloned());
            let bubbles = filter_bubbles(&table, &selection);
            ApiResponse::ok(layout(&bubbles, query.year, &order, state.config.size_max))
        }
        Err(e) => ApiResponse::<ChartLayout>::fail(e),
    }
}

/// Countries from the query string in request order, else the defaults
fn requested_countries(table: &MergedTable, config: &Config, query: &BubbleQuery) -> Vec<String> {
    match query.countries.as_deref() {
        Some(list) => list
            .split(',')
            .map(str::trim)
            .filter(|c| !c.is_empty())
            .map(str::to_string)
            .collect(),
        None => available_defaults(table, &config.default_countries),
    }
}

fn selection_for(table: &MergedTable, config: &Config, query: &BubbleQuery) -> Selection {
    Selection::new(query.year, requested_countries(table, config, query))
}

fn router(state: AppState) -> Router {
    let api_routes = Router::new()
        .route("/health", get(health_check))
        .route("/years", get(get_years))
        .route("/countries", get(get_countries))
        .route("/countries/:name", get(get_country_series))
        .route("/bubbles", get(get_bubbles))
        .route("/chart", get(get_chart))
        .with_state(state);

    Router::new()
        .nest("/api", api_routes)
        .layer(CorsLayer::permissive())
}

// ============================================================================
// Main Server
// ============================================================================

#[derive(Parser, Debug)]
#[command(name = "gapminder-server", version, about = "JSON API for the Gapminder dashboard")]
struct Args {
    /// Path to the TOML config file
    #[arg(long, default_value = gapminder::config::DEFAULT_CONFIG_FILE)]
    config: PathBuf,

    /// Listen address (overrides config)
    #[arg(long)]
    addr: Option<String>,
}

#[tokio::main]
async fn main() -> Result<()> {
    gapminder::logging::init_logging();

    let args = Args::parse();
    let mut config = Config::load(&args.config)
        .with_context(|| format!("Failed to load config from {}", args.config.display()))?;
    if let Some(addr) = args.addr {
        config.server.addr = addr;
    }

    let state = AppState::new(config.clone());

    // Fail fast on bad input files instead of on the first request
    let table = state.table().map_err(anyhow::Error::msg)?;
    info!(rows = table.len(), "Data loaded");

    let app = router(state);

    let listener = tokio::net::TcpListener::bind(&config.server.addr)
        .await
        .with_context(|| format!("Failed to bind to {}", config.server.addr))?;

    info!(addr = %config.server.addr, "🚀 Server running");
    axum::serve(listener, app)
        .await
        .context("Server terminated")?;

    Ok(())
}
