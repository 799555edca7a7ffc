use crate::metrics::{Metrics, MetricsSnapshot, TimedOperation};
use crate::store::{ExtractionStore, ExtractionSummary};
use axum::{
    Json, Router,
    extract::{Path, Request, State},
    http::{HeaderValue, StatusCode, header},
    middleware::{self, Next},
    response::{IntoResponse, Response},
    routing::get,
};
use export::{ExportFormat, ExportPayload, Exporter};
use extract::{Extraction, ExtractionClient, ExtractionEnvelope};
use serde::Serialize;
use sha2::{Digest, Sha256};
use std::sync::Arc;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing::{error, warn};

pub struct AppState {
    pub store: ExtractionStore,
    pub exporter: Exporter,
    /// Consulted for ids the store does not hold.
    pub backend: Option<ExtractionClient>,
    pub metrics: Arc<Metrics>,
}

#[derive(Serialize)]
struct HealthResponse {
    status: &'static str,
    extractions: usize,
}

#[derive(Serialize)]
struct ListResponse {
    extractions: Vec<ExtractionSummary>,
}

pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/health", get(health_check))
        .route("/stats", get(get_stats))
        .route("/api/extractions", get(list_extractions))
        .route("/api/extractions/:id", get(get_extraction))
        .route("/api/extractions/:id/export/:format", get(export_extraction))
        .layer(middleware::from_fn_with_state(state.clone(), track_requests))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}

async fn track_requests(State(state): State<Arc<AppState>>, req: Request, next: Next) -> Response {
    let response = next.run(req).await;
    state.metrics.record_request(response.status().is_success());
    response
}

async fn health_check(State(state): State<Arc<AppState>>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok",
        extractions: state.store.len(),
    })
}

async fn get_stats(State(state): State<Arc<AppState>>) -> Json<MetricsSnapshot> {
    Json(state.metrics.snapshot())
}

async fn list_extractions(State(state): State<Arc<AppState>>) -> Json<ListResponse> {
    Json(ListResponse {
        extractions: state.store.list(),
    })
}

async fn get_extraction(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<Json<ExtractionEnvelope>, StatusCode> {
    let extraction = resolve(&state, &id).await?;
    Ok(Json(ExtractionEnvelope { extraction }))
}

async fn export_extraction(
    State(state): State<Arc<AppState>>,
    Path((id, format)): Path<(String, String)>,
) -> Result<Response, StatusCode> {
    let timer = TimedOperation::start();

    let format: ExportFormat = format.parse().map_err(|e| {
        warn!(error = %e, "Rejected export request");
        StatusCode::BAD_REQUEST
    })?;
    let extraction = resolve(&state, &id).await?;

    let payload = state.exporter.encode(&extraction, format).await.map_err(|e| {
        error!(id = %id, format = %format, error = %e, "Export failed");
        StatusCode::INTERNAL_SERVER_ERROR
    })?;

    state
        .metrics
        .record_export(format, timer.elapsed(), payload.bytes.len());
    download_response(format, payload)
}

/// Local store first, then the backend; backend hits are kept.
async fn resolve(state: &AppState, id: &str) -> Result<Extraction, StatusCode> {
    if let Some(extraction) = state.store.get(id) {
        return Ok(extraction);
    }

    let Some(backend) = &state.backend else {
        return Err(StatusCode::NOT_FOUND);
    };

    state.metrics.record_backend_fetch();
    match backend.fetch(id).await {
        Ok(Some(mut extraction)) => {
            if extraction.id.is_empty() {
                extraction.id = id.to_string();
            }
            state.store.insert(extraction.clone());
            Ok(extraction)
        }
        Ok(None) => Err(StatusCode::NOT_FOUND),
        Err(e) => {
            error!(id = %id, error = %e, "Backend fetch failed");
            Err(StatusCode::BAD_GATEWAY)
        }
    }
}

/// Server-side download: the payload with attachment headers.
fn download_response(format: ExportFormat, payload: ExportPayload) -> Result<Response, StatusCode> {
    let content_type = match format {
        ExportFormat::Xlsx => payload.mime_type.to_string(),
        _ => format!("{}; charset=utf-8", payload.mime_type),
    };
    let disposition = content_disposition(&payload.file_name);
    let etag = format!("\"{}\"", content_etag(&payload.bytes));

    let headers = [
        (header::CONTENT_TYPE, header_value(&content_type)?),
        (header::CONTENT_DISPOSITION, header_value(&disposition)?),
        (header::ETAG, header_value(&etag)?),
    ];
    Ok((headers, payload.bytes).into_response())
}

fn header_value(value: &str) -> Result<HeaderValue, StatusCode> {
    HeaderValue::from_str(value).map_err(|_| StatusCode::INTERNAL_SERVER_ERROR)
}

/// `attachment` with an ASCII `filename` for old clients, plus an RFC 6266
/// `filename*` whenever the real name did not survive that fallback.
fn content_disposition(file_name: &str) -> String {
    let fallback = header_safe_file_name(file_name);
    if fallback == file_name {
        format!("attachment; filename=\"{fallback}\"")
    } else {
        format!(
            "attachment; filename=\"{fallback}\"; filename*=UTF-8''{}",
            urlencoding::encode(file_name)
        )
    }
}

/// Quoted-string safe, printable ASCII only.
fn header_safe_file_name(name: &str) -> String {
    name.chars()
        .map(|c| match c {
            '"' | '\\' => '_',
            c if c.is_ascii_graphic() || c == ' ' => c,
            _ => '_',
        })
        .collect()
}

fn content_etag(bytes: &[u8]) -> String {
    let digest = Sha256::digest(bytes);
    hex::encode(&digest[..16])
}
