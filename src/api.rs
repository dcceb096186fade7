use crate::data_structures::{
    AppState, CompareQuery, CompareResponse, ErrorBody, ExportQuery, HealthResponse,
    MissingTicker, SeriesQuery, SeriesResponse, SharedConfig,
};
use axum::{
    extract::State,
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    routing::get,
    Json, Router,
};
use axum_extra::extract::Query;
use tickerdash::analysis::comparison::{normalize, returns};
use tickerdash::prelude::*;
use tickerdash::services::{candlestick_chart, comparison_chart, export_filename, price_line_chart};
use tickerdash::utils::{parse_tickers, resolve_range, today};
use tower_http::cors::CorsLayer;
use tracing::{debug, error, info, instrument, warn};

/// Failure of a request, rendered as `{error, message}` JSON.
#[derive(Debug)]
pub enum ApiError {
    Pipeline(PipelineError),
    Export(csv::Error),
}

impl From<PipelineError> for ApiError {
    fn from(e: PipelineError) -> Self {
        ApiError::Pipeline(e)
    }
}

impl From<csv::Error> for ApiError {
    fn from(e: csv::Error) -> Self {
        ApiError::Export(e)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, body) = match self {
            ApiError::Pipeline(e) => {
                let status = match e {
                    PipelineError::InvalidInput(_) => StatusCode::BAD_REQUEST,
                    PipelineError::NoDataFound { .. } => StatusCode::NOT_FOUND,
                    PipelineError::SourceUnavailable(_) => StatusCode::BAD_GATEWAY,
                };
                (status, ErrorBody { error: e.kind(), message: e.to_string() })
            }
            ApiError::Export(e) => {
                error!(error = %e, "CSV export failed");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    ErrorBody { error: "export_failed", message: e.to_string() },
                )
            }
        };
        (status, Json(body)).into_response()
    }
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health_handler))
        .route("/api/series", get(series_handler))
        .route("/api/compare", get(compare_handler))
        .route("/api/export", get(export_handler))
        .layer(CorsLayer::permissive())
        .with_state(state)
}

fn request_range(
    config: &SharedConfig,
    start: Option<&str>,
    end: Option<&str>,
) -> Result<DateRange, PipelineError> {
    resolve_range(start, end, None, config.default_lookback_days, today())
}

fn request_windows(
    config: &SharedConfig,
    short: Option<usize>,
    long: Option<usize>,
) -> Result<MaWindows, PipelineError> {
    MaWindows::new(
        short.unwrap_or(config.windows.short()),
        long.unwrap_or(config.windows.long()),
    )
}

// Repeated and comma-separated forms are merged; extras beyond the cap are dropped
fn request_tickers(config: &SharedConfig, raw: &[String]) -> Vec<String> {
    let tickers = parse_tickers(&raw.join(","), config.max_tickers);
    debug!(?tickers, max = config.max_tickers, "Parsed ticker list");
    tickers
}

#[instrument(skip(config))]
pub async fn health_handler(State(config): State<SharedConfig>) -> impl IntoResponse {
    Json(HealthResponse {
        status: "ok",
        node: config.node_name.clone(),
        environment: config.environment.clone(),
        source: format!("{:?}", config.source).to_lowercase(),
    })
}

#[instrument(skip(pipeline, config), fields(symbol = %query.symbol))]
pub async fn series_handler(
    State(pipeline): State<SeriesPipeline>,
    State(config): State<SharedConfig>,
    Query(query): Query<SeriesQuery>,
) -> Result<Json<SeriesResponse>, ApiError> {
    let range = request_range(&config, query.start.as_deref(), query.end.as_deref())?;
    let windows = request_windows(&config, query.short, query.long)?;

    let frame = pipeline.build_frame(&query.symbol, range, windows).await?;
    info!(rows = frame.series.len(), %range, "Serving series");

    Ok(Json(SeriesResponse {
        range,
        candlestick: candlestick_chart(&frame, query.volume),
        line: price_line_chart(&frame),
        frame,
    }))
}

#[instrument(skip(pipeline, config))]
pub async fn compare_handler(
    State(pipeline): State<SeriesPipeline>,
    State(config): State<SharedConfig>,
    Query(query): Query<CompareQuery>,
) -> Result<Json<CompareResponse>, ApiError> {
    let range = request_range(&config, query.start.as_deref(), query.end.as_deref())?;
    let tickers = request_tickers(&config, &query.tickers);

    let report = pipeline.fetch_many(&tickers, range).await?;
    if !report.missing.is_empty() {
        warn!(missing = ?report.missing_symbols(), "Some tickers returned no data");
    }

    let set = SeriesPipeline::align_for_comparison(&report.series, range);
    let chart = comparison_chart(&normalize(&set));

    Ok(Json(CompareResponse {
        range,
        symbols: set.symbols().map(str::to_string).collect(),
        missing: report.missing.iter().map(MissingTicker::from).collect(),
        chart,
        returns: returns(&report.series),
    }))
}

#[instrument(skip(pipeline, config))]
pub async fn export_handler(
    State(pipeline): State<SeriesPipeline>,
    State(config): State<SharedConfig>,
    Query(query): Query<ExportQuery>,
) -> Result<Response, ApiError> {
    let range = request_range(&config, query.start.as_deref(), query.end.as_deref())?;
    let windows = request_windows(&config, query.short, query.long)?;
    let tickers = request_tickers(&config, &query.tickers);

    // One requested ticker exports its frame; several always export a comparison
    let bytes = if let [symbol] = tickers.as_slice() {
        let frame = pipeline.build_frame(symbol, range, windows).await?;
        info!(rows = frame.series.len(), "Serving single-ticker CSV export");
        SeriesPipeline::export(&frame)?
    } else {
        let report = pipeline.fetch_many(&tickers, range).await?;
        if !report.missing.is_empty() {
            warn!(missing = ?report.missing_symbols(), "Exporting comparison without some tickers");
        }
        let frames = report
            .series
            .into_iter()
            .map(|series| SeriesPipeline::frame(series, windows))
            .collect::<Result<Vec<_>, _>>()?;
        info!(tickers = frames.len(), "Serving comparison CSV export");
        SeriesPipeline::export(&SeriesPipeline::align_frames_for_comparison(&frames, range))?
    };

    let disposition = format!("attachment; filename=\"{}\"", export_filename(&range));
    Ok((
        StatusCode::OK,
        [
            (header::CONTENT_TYPE, "text/csv; charset=utf-8".to_string()),
            (header::CONTENT_DISPOSITION, disposition),
        ],
        bytes,
    )
        .into_response())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::AppConfig;
    use axum::body::{to_bytes, Body};
    use axum::http::Request;
    use chrono::NaiveDate;
    use serde_json::Value;
    use std::sync::Arc;
    use tower::ServiceExt;

    fn row(day: u32, close: f64) -> OhlcvRow {
        let date = NaiveDate::from_ymd_opt(2024, 3, day).unwrap();
        OhlcvRow::new(date, close - 1.0, close + 1.0, close - 2.0, close, 1_000)
    }

    fn app(provider: InMemoryProvider) -> Router {
        let config = AppConfig::from_vars(|key| match key {
            "DEFAULT_SHORT_WINDOW" => Some("2".to_string()),
            "DEFAULT_LONG_WINDOW" => Some("3".to_string()),
            _ => None,
        })
        .unwrap();
        router(AppState::new(SeriesPipeline::new(Arc::new(provider)), config))
    }

    fn provider() -> InMemoryProvider {
        InMemoryProvider::new()
            .with_series("AAPL", vec![row(4, 170.0), row(5, 171.5), row(6, 169.0), row(7, 172.25)])
            .with_series("MSFT", vec![row(4, 400.0), row(6, 404.0), row(7, 410.0)])
    }

    async fn get(app: Router, uri: &str) -> (StatusCode, Vec<u8>, Option<String>) {
        let response = app
            .oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
            .await
            .unwrap();
        let status = response.status();
        let disposition = response
            .headers()
            .get(header::CONTENT_DISPOSITION)
            .map(|v| v.to_str().unwrap().to_string());
        let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        (status, body.to_vec(), disposition)
    }

    async fn get_json(app: Router, uri: &str) -> (StatusCode, Value) {
        let (status, body, _) = get(app, uri).await;
        (status, serde_json::from_slice(&body).unwrap())
    }

    #[tokio::test]
    async fn test_health() {
        let (status, body) = get_json(app(provider()), "/health").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["status"], "ok");
        assert_eq!(body["source"], "yahoo");
    }

    #[tokio::test]
    async fn test_series_returns_frame_and_charts() {
        let (status, body) =
            get_json(app(provider()), "/api/series?symbol=aapl&start=2024-03-01&end=2024-03-31").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["frame"]["series"]["symbol"], "AAPL");
        assert_eq!(body["frame"]["series"]["rows"].as_array().unwrap().len(), 4);
        assert_eq!(body["frame"]["averages"][0]["points"].as_array().unwrap().len(), 3);
        assert_eq!(body["frame"]["averages"][1]["points"].as_array().unwrap().len(), 2);
        assert_eq!(body["candlestick"]["title"], "AAPL Candlestick + SMAs");
        assert_eq!(body["line"]["title"], "AAPL Close & Moving Averages");
    }

    #[tokio::test]
    async fn test_series_error_statuses() {
        let (status, body) = get_json(
            app(provider()),
            "/api/series?symbol=AAPL&start=2024-03-01&end=2024-03-31&short=50&long=20",
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"], "invalid_input");

        let (status, body) = get_json(
            app(provider()),
            "/api/series?symbol=AAPL&start=2024-03-31&end=2024-03-01",
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"], "invalid_input");

        let (status, body) =
            get_json(app(provider()), "/api/series?symbol=ZZZZINVALID&start=2024-03-01&end=2024-03-31").await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body["error"], "no_data_found");

        let (status, body) = get_json(
            app(InMemoryProvider::new().offline()),
            "/api/series?symbol=AAPL&start=2024-03-01&end=2024-03-31",
        )
        .await;
        assert_eq!(status, StatusCode::BAD_GATEWAY);
        assert_eq!(body["error"], "source_unavailable");
    }

    #[tokio::test]
    async fn test_compare_reports_missing() {
        let (status, body) = get_json(
            app(provider()),
            "/api/compare?tickers=AAPL&tickers=NOPE,MSFT&start=2024-03-01&end=2024-03-31",
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["symbols"], serde_json::json!(["AAPL", "MSFT"]));
        assert_eq!(body["missing"][0]["symbol"], "NOPE");
        assert_eq!(body["missing"][0]["error"], "no_data_found");
        assert_eq!(body["chart"]["traces"].as_array().unwrap().len(), 2);
        assert_eq!(body["returns"].as_array().unwrap().len(), 2);
    }

    #[tokio::test]
    async fn test_compare_requires_tickers() {
        let (status, body) = get_json(app(provider()), "/api/compare?start=2024-03-01&end=2024-03-31").await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"], "invalid_input");
    }

    #[tokio::test]
    async fn test_export_single_ticker_csv() {
        let (status, body, disposition) =
            get(app(provider()), "/api/export?tickers=AAPL&start=2024-03-01&end=2024-03-31").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(
            disposition.as_deref(),
            Some("attachment; filename=\"stocks_2024-03-01_2024-03-31.csv\"")
        );

        let csv = String::from_utf8(body).unwrap();
        let mut lines = csv.lines();
        assert_eq!(lines.next(), Some("date,open,high,low,close,volume,ma_2,ma_3"));
        assert_eq!(lines.next(), Some("2024-03-04,169,171,168,170,1000,,"));
        assert_eq!(lines.count(), 3);
    }

    #[tokio::test]
    async fn test_export_keeps_comparison_layout_when_a_ticker_is_missing() {
        let (status, body, _) = get(
            app(provider()),
            "/api/export?tickers=AAPL,NOPE&start=2024-03-01&end=2024-03-31",
        )
        .await;
        assert_eq!(status, StatusCode::OK);

        let csv = String::from_utf8(body).unwrap();
        assert_eq!(
            csv.lines().next(),
            Some("date,AAPL_open,AAPL_high,AAPL_low,AAPL_close,AAPL_volume,AAPL_ma_2,AAPL_ma_3")
        );
        assert_eq!(csv.lines().count(), 5);
    }

    #[tokio::test]
    async fn test_out_of_calendar_dates_are_rejected() {
        let (status, body) =
            get_json(app(provider()), "/api/series?symbol=AAPL&end=-262143-01-05").await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"], "invalid_input");
    }

    #[tokio::test]
    async fn test_export_comparison_leaves_gaps_blank() {
        let (status, body, _) = get(
            app(provider()),
            "/api/export?tickers=AAPL,MSFT&start=2024-03-01&end=2024-03-31",
        )
        .await;
        assert_eq!(status, StatusCode::OK);

        let csv = String::from_utf8(body).unwrap();
        let header = csv.lines().next().unwrap();
        assert!(header.starts_with("date,AAPL_open,AAPL_high,AAPL_low,AAPL_close,AAPL_volume"));
        let march_5 = csv.lines().find(|l| l.starts_with("2024-03-05")).unwrap();
        assert!(march_5.contains(",,,,,"));
    }
}
