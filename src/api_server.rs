// Axum API Server Module
//
// Purpose: REST surface over the soil quality evaluator
// Blocking SSURGO and catalogue work runs on the blocking pool under a deadline;
// the scorers run after both returned.

#[cfg(feature = "api")]
use axum::{
    extract::{rejection::JsonRejection, rejection::QueryRejection, Query, State},
    http::StatusCode,
    response::{IntoResponse, Json},
    routing::{get, post},
    Router,
};

#[cfg(feature = "api")]
use tower_http::{
    compression::CompressionLayer,
    cors::CorsLayer,
    trace::TraceLayer,
};

#[cfg(feature = "api")]
use moka::future::Cache;

#[cfg(feature = "api")]
use serde::Deserialize;

#[cfg(feature = "api")]
use std::sync::Arc;

#[cfg(feature = "api")]
use std::time::{Duration, Instant};

#[cfg(feature = "api")]
use crate::error::{SqiError, SqiResult, SERVICE_ERROR};

#[cfg(feature = "api")]
use crate::horizon::SsurgoHorizon;

#[cfg(feature = "api")]
use crate::request::EvaluationRequest;

#[cfg(feature = "api")]
use crate::scorer::{EvaluationResponse, SoilQualityEvaluator};

#[cfg(feature = "api")]
use crate::soil_source::{GeoPoint, SoilDataSource};

/// Default deadline for SSURGO and catalogue calls
pub const DEFAULT_EXTERNAL_TIMEOUT: std::time::Duration = std::time::Duration::from_secs(30);

// ============================================================================
// App State
// ============================================================================

#[cfg(feature = "api")]
#[derive(Clone)]
pub struct AppState {
    pub evaluator: Arc<SoilQualityEvaluator>,
    pub source: Arc<dyn SoilDataSource>,
    /// SSURGO horizons per rounded point; computed scores are never cached
    pub horizon_cache: Cache<(i64, i64), Arc<Vec<SsurgoHorizon>>>,
    pub timeout: Duration,
}

#[cfg(feature = "api")]
impl AppState {
    pub fn new(evaluator: SoilQualityEvaluator, source: Arc<dyn SoilDataSource>, timeout: Duration) -> Self {
        tracing::info!("Initializing Moka horizon cache...");
        let horizon_cache = Cache::builder()
            .max_capacity(10_000) // 10K points
            .time_to_live(Duration::from_secs(300)) // 5 min TTL
            .build();

        Self {
            evaluator: Arc::new(evaluator),
            source,
            horizon_cache,
            timeout,
        }
    }

    /// Horizons at a point, from the cache or the SSURGO source
    async fn horizons_at(&self, point: GeoPoint) -> Result<Arc<Vec<SsurgoHorizon>>, AppError> {
        let key = point.cache_key();
        if let Some(rows) = self.horizon_cache.get(&key).await {
            tracing::debug!(lat = point.lat, lon = point.lon, "SSURGO cache hit");
            return Ok(rows);
        }

        let source = Arc::clone(&self.source);
        let rows = run_blocking("ssurgo", self.timeout, move || source.horizons_at(point)).await?;
        let rows = Arc::new(rows);
        self.horizon_cache.insert(key, Arc::clone(&rows)).await;
        Ok(rows)
    }
}

/// Run a blocking call on the blocking pool; exceeding `deadline` is a timeout
#[cfg(feature = "api")]
async fn run_blocking<T, F>(operation: &'static str, deadline: Duration, f: F) -> Result<T, AppError>
where
    T: Send + 'static,
    F: FnOnce() -> SqiResult<T> + Send + 'static,
{
    match tokio::time::timeout(deadline, tokio::task::spawn_blocking(f)).await {
        Err(_) => Err(AppError::Sqi(SqiError::Timeout {
            operation,
            seconds: deadline.as_secs_f64(),
        })),
        Ok(Err(e)) => Err(AppError::Internal(format!("Task join error: {}", e))),
        Ok(Ok(result)) => result.map_err(AppError::Sqi),
    }
}

// ============================================================================
// Router
// ============================================================================

#[cfg(feature = "api")]
pub fn create_router(state: AppState) -> Router {
    Router::new()
        // Health check
        .route("/health", get(health_check))

        // Evaluation endpoints
        .route("/api/sqi/evaluate", post(evaluate_point))
        .route("/api/sqi", get(evaluate_query))

        // Catalogue maintenance
        .route("/api/catalogue/reload", post(reload_catalogue))

        // Middleware (applied in reverse order)
        .layer(CompressionLayer::new()) // gzip + brotli compression
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http()) // Request logging
        .with_state(state)
}

// ============================================================================
// Endpoint Handlers
// ============================================================================

#[cfg(feature = "api")]
async fn health_check(State(state): State<AppState>) -> impl IntoResponse {
    Json(serde_json::json!({
        "status": "healthy",
        "timestamp": chrono::Utc::now().to_rfc3339(),
        "version": env!("CARGO_PKG_VERSION"),
        "catalogue_rows": state.evaluator.catalogue().snapshot().row_count(),
    }))
}

#[cfg(feature = "api")]
#[derive(Debug, Deserialize)]
pub struct SqiQuery {
    pub lat: f64,
    pub lon: f64,
    pub crop_id: String,
    pub input_level: String,
    pub depth_weight_type: Option<u8>,
}

#[cfg(feature = "api")]
impl From<SqiQuery> for EvaluationRequest {
    fn from(q: SqiQuery) -> Self {
        let mut request = EvaluationRequest::new(q.lat, q.lon, &q.crop_id, &q.input_level);
        request.depth_weight_type = q.depth_weight_type;
        request
    }
}

#[cfg(feature = "api")]
async fn evaluate_point(
    State(state): State<AppState>,
    payload: Result<Json<EvaluationRequest>, JsonRejection>,
) -> Result<Json<EvaluationResponse>, AppError> {
    let Json(request) = payload.map_err(|e| AppError::Sqi(SqiError::Validation(e.body_text())))?;
    evaluate(&state, request).await.map(Json)
}

#[cfg(feature = "api")]
async fn evaluate_query(
    State(state): State<AppState>,
    query: Result<Query<SqiQuery>, QueryRejection>,
) -> Result<Json<EvaluationResponse>, AppError> {
    let Query(query) = query.map_err(|e| AppError::Sqi(SqiError::Validation(e.body_text())))?;
    evaluate(&state, query.into()).await.map(Json)
}

#[cfg(feature = "api")]
async fn evaluate(state: &AppState, request: EvaluationRequest) -> Result<EvaluationResponse, AppError> {
    let started = Instant::now();
    let request = request.validate()?;

    tracing::info!(
        lat = request.point.lat,
        lon = request.point.lon,
        crop_id = %request.crop_id,
        input_level = %request.input_level,
        "Evaluating point"
    );

    let rows = state.horizons_at(request.point).await?;

    // CPU-bound work: run in blocking thread pool
    let evaluator = Arc::clone(&state.evaluator);
    tokio::task::spawn_blocking(move || evaluator.evaluate_rows(&request, &rows, started))
        .await
        .map_err(|e| AppError::Internal(format!("Task join error: {}", e)))?
        .map_err(AppError::Sqi)
}

#[cfg(feature = "api")]
async fn reload_catalogue(State(state): State<AppState>) -> Result<Json<serde_json::Value>, AppError> {
    let evaluator = Arc::clone(&state.evaluator);
    let rows = run_blocking("catalogue", state.timeout, move || evaluator.catalogue().reload()).await?;

    Ok(Json(serde_json::json!({
        "status": "success",
        "catalogue_rows": rows,
        "timestamp": chrono::Utc::now().to_rfc3339(),
    })))
}

// ============================================================================
// Error Handling
// ============================================================================

#[cfg(feature = "api")]
#[derive(Debug)]
pub enum AppError {
    Sqi(SqiError),
    Internal(String),
}

#[cfg(feature = "api")]
impl From<SqiError> for AppError {
    fn from(e: SqiError) -> Self {
        AppError::Sqi(e)
    }
}

#[cfg(feature = "api")]
impl IntoResponse for AppError {
    fn into_response(self) -> axum::response::Response {
        let (status, error_code, message, details) = match self {
            AppError::Sqi(err) => {
                let status = StatusCode::from_u16(err.http_status()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
                let details = match &err {
                    SqiError::NoSoilData { lat, lon } => Some(serde_json::json!({ "lat": lat, "lon": lon })),
                    SqiError::Timeout { operation, seconds } => {
                        Some(serde_json::json!({ "operation": operation, "timeout_seconds": seconds }))
                    }
                    _ => None,
                };
                (status, err.error_code(), err.to_string(), details)
            }
            AppError::Internal(msg) => (StatusCode::INTERNAL_SERVER_ERROR, SERVICE_ERROR, msg, None),
        };

        if status.is_server_error() {
            tracing::error!(error_code, %message, "Request failed");
        }

        let mut body = serde_json::json!({
            "status": "error",
            "error_code": error_code,
            "message": message,
        });
        if let Some(details) = details {
            body["details"] = details;
        }

        (status, Json(body)).into_response()
    }
}
