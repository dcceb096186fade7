use crate::config::AppConfig;
use axum::extract::FromRef;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tickerdash::models::ReturnSummary;
use tickerdash::prelude::{DateRange, PipelineError, SeriesFrame, SeriesPipeline};
use tickerdash::services::{CandlestickChart, LineChart};

// --- Shared State ---

pub type SharedConfig = Arc<AppConfig>;

#[derive(Clone)]
pub struct AppState {
    pub pipeline: SeriesPipeline,
    pub config: SharedConfig,
}

impl AppState {
    pub fn new(pipeline: SeriesPipeline, config: AppConfig) -> Self {
        Self {
            pipeline,
            config: Arc::new(config),
        }
    }
}

impl FromRef<AppState> for SeriesPipeline {
    fn from_ref(app_state: &AppState) -> SeriesPipeline {
        app_state.pipeline.clone()
    }
}

impl FromRef<AppState> for SharedConfig {
    fn from_ref(app_state: &AppState) -> SharedConfig {
        app_state.config.clone()
    }
}

// --- Query Parameters ---

#[derive(Debug, Deserialize)]
pub struct SeriesQuery {
    pub symbol: String,
    pub start: Option<String>,
    pub end: Option<String>,
    pub short: Option<usize>,
    pub long: Option<usize>,
    #[serde(default = "default_true")]
    pub volume: bool,
}

/// `tickers` may repeat (`?tickers=AAPL&tickers=MSFT`) or hold a comma list.
#[derive(Debug, Deserialize)]
pub struct CompareQuery {
    #[serde(default)]
    pub tickers: Vec<String>,
    pub start: Option<String>,
    pub end: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct ExportQuery {
    #[serde(default)]
    pub tickers: Vec<String>,
    pub start: Option<String>,
    pub end: Option<String>,
    pub short: Option<usize>,
    pub long: Option<usize>,
}

fn default_true() -> bool {
    true
}

// --- Responses ---

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub node: String,
    pub environment: String,
    pub source: String,
}

#[derive(Debug, Serialize)]
pub struct SeriesResponse {
    pub range: DateRange,
    pub frame: SeriesFrame,
    pub candlestick: CandlestickChart,
    pub line: LineChart,
}

#[derive(Debug, Serialize)]
pub struct MissingTicker {
    pub symbol: String,
    pub error: &'static str,
    pub message: String,
}

impl From<&(String, PipelineError)> for MissingTicker {
    fn from((symbol, error): &(String, PipelineError)) -> Self {
        Self {
            symbol: symbol.clone(),
            error: error.kind(),
            message: error.to_string(),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct CompareResponse {
    pub range: DateRange,
    pub symbols: Vec<String>,
    pub missing: Vec<MissingTicker>,
    pub chart: LineChart,
    pub returns: Vec<ReturnSummary>,
}

#[derive(Debug, Serialize)]
pub struct ErrorBody {
    pub error: &'static str,
    pub message: String,
}
