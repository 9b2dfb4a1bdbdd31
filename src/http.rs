// 🌐 HTTP API - OCR entry point plus calculate/export endpoints
// Handlers convert TipError into { error, details? } bodies

use crate::allocation::Cents;
use crate::denomination::CashInventory;
use crate::error::TipError;
use crate::export::{export_file_name, payouts_to_string};
use crate::extraction::{PartnerCandidate, RecordExtractor};
use crate::ocr::DocumentAnalyzer;
use crate::session::{CalculationReport, PartnerRecord, Session};
use axum::{
    body::Bytes,
    extract::{rejection::BytesRejection, DefaultBodyLimit, State},
    http::{header, StatusCode},
    response::{IntoResponse, Json, Response},
    routing::{get, post},
    Router,
};
use base64::engine::general_purpose::STANDARD as B64;
use base64::Engine;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tower_http::cors::CorsLayer;
use tracing::{error, info};

pub const OCR_SOURCE: &str = "azure-document-intelligence";

/// Request body cap; a base64 phone photo runs to several MB.
pub const MAX_BODY_BYTES: usize = 6 * 1024 * 1024;

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    /// `None` when credentials are missing; OCR requests then fail with 500
    pub analyzer: Option<Arc<dyn DocumentAnalyzer>>,
}

// ============================================================================
// REQUEST / RESPONSE TYPES
// ============================================================================

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OcrRequest {
    #[serde(default)]
    pub image_base64: Option<String>,
    #[serde(default)]
    pub mime_type: Option<String>,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OcrMeta {
    pub source: String,
    pub model: String,
    pub page_count: usize,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct OcrResponse {
    pub partners: Vec<PartnerRecord>,
    pub meta: OcrMeta,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CalculateRequest {
    pub total_tips: f64,
    #[serde(default)]
    pub inventory: CashInventory,
    pub partners: Vec<PartnerCandidate>,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CalculateResponse {
    #[serde(flatten)]
    pub report: CalculationReport,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub warning: Option<String>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorBody {
    pub error: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
}

/// API Response wrapper
#[derive(Serialize)]
struct ApiResponse<T> {
    success: bool,
    data: T,
}

// ============================================================================
// ERRORS
// ============================================================================

fn error_response(status: StatusCode, error: &str, details: Option<String>) -> Response {
    (
        status,
        Json(ErrorBody {
            error: error.to_string(),
            details,
        }),
    )
        .into_response()
}

impl IntoResponse for TipError {
    fn into_response(self) -> Response {
        match self {
            TipError::InvalidInput(message) => error_response(StatusCode::BAD_REQUEST, &message, None),
            TipError::Configuration(details) => error_response(
                StatusCode::INTERNAL_SERVER_ERROR,
                "Server configuration error",
                Some(details),
            ),
            TipError::UpstreamRequestFailed { body, .. } => error_response(
                StatusCode::INTERNAL_SERVER_ERROR,
                "Azure Document Intelligence request failed",
                Some(body),
            ),
            other => error_response(
                StatusCode::INTERNAL_SERVER_ERROR,
                "OCR processing failed",
                Some(other.to_string()),
            ),
        }
    }
}

// ============================================================================
// API HANDLERS
// ============================================================================

/// GET /api/health - Health check
async fn health_check() -> impl IntoResponse {
    Json(ApiResponse {
        success: true,
        data: "OK",
    })
}

/// Any non-POST method on a POST-only route
async fn method_not_allowed() -> Response {
    error_response(StatusCode::METHOD_NOT_ALLOWED, "Method not allowed", None)
}

fn parse_json<T: serde::de::DeserializeOwned>(body: Result<Bytes, BytesRejection>) -> Result<T, TipError> {
    let body = body.map_err(|rejection| {
        TipError::InvalidInput(format!("Request body rejected: {}", rejection.body_text()))
    })?;
    serde_json::from_slice(&body).map_err(|_| TipError::invalid_input("Invalid JSON in request body"))
}

/// POST /api/ocr - photo of a tip sheet in, partner list out
async fn ocr_handler(
    State(state): State<AppState>,
    body: Result<Bytes, BytesRejection>,
) -> Result<Json<OcrResponse>, TipError> {
    // Configuration is checked before the body is looked at
    let analyzer = state.analyzer.as_ref().ok_or_else(|| {
        TipError::Configuration("Azure Document Intelligence credentials not configured".to_string())
    })?;

    let request: OcrRequest = parse_json(body)?;

    let (image_base64, mime_type) = match (request.image_base64, request.mime_type) {
        (Some(image), Some(mime)) if !image.is_empty() && !mime.is_empty() => (image, mime),
        _ => {
            return Err(TipError::invalid_input(
                "Missing imageBase64 or mimeType in request",
            ))
        }
    };

    let image = B64
        .decode(image_base64.trim())
        .map_err(|_| TipError::invalid_input("imageBase64 is not valid base64"))?;

    let result = analyzer.analyze(image, &mime_type).await.inspect_err(|e| {
        error!(error = %e, "OCR processing error");
    })?;

    let candidates = RecordExtractor::new().extract(&result.tables);
    let mut session = Session::new();
    let partners = session.load_extracted(candidates).to_vec();

    info!(partners = partners.len(), pages = result.page_count(), "OCR request complete");

    Ok(Json(OcrResponse {
        partners,
        meta: OcrMeta {
            source: OCR_SOURCE.to_string(),
            model: analyzer.model().to_string(),
            page_count: result.page_count(),
        },
    }))
}

fn session_for(request: CalculateRequest) -> Result<(Session, Cents), TipError> {
    if !request.total_tips.is_finite() || request.total_tips < 0.0 {
        return Err(TipError::invalid_input("totalTips must be a non-negative amount"));
    }
    let mut session = Session::new();
    session.load_extracted(request.partners);
    session.set_inventory(request.inventory);
    Ok((session, Cents::from_dollars(request.total_tips)))
}

/// POST /api/calculate - allocation and bill breakdown
async fn calculate_handler(body: Result<Bytes, BytesRejection>) -> Result<Json<CalculateResponse>, TipError> {
    let (session, total_tips) = session_for(parse_json(body)?)?;
    let report = session.calculate(total_tips)?;

    Ok(Json(CalculateResponse {
        warning: report.warning().map(String::from),
        report,
    }))
}

/// POST /api/export - same input as calculate, CSV out
async fn export_handler(body: Result<Bytes, BytesRejection>) -> Result<Response, TipError> {
    let (session, total_tips) = session_for(parse_json(body)?)?;
    let report = session.calculate(total_tips)?;
    let csv = payouts_to_string(&report.payouts)?;

    let filename = export_file_name(chrono::Local::now().date_naive());
    Ok((
        StatusCode::OK,
        [
            (header::CONTENT_TYPE, "text/csv;charset=utf-8".to_string()),
            (
                header::CONTENT_DISPOSITION,
                format!("attachment; filename=\"{filename}\""),
            ),
        ],
        csv,
    )
        .into_response())
}

// ============================================================================
// ROUTER
// ============================================================================

pub fn router(state: AppState) -> Router {
    let api_routes = Router::new()
        .route("/health", get(health_check))
        .route("/ocr", post(ocr_handler).fallback(method_not_allowed))
        .route("/calculate", post(calculate_handler).fallback(method_not_allowed))
        .route("/export", post(export_handler).fallback(method_not_allowed))
        .layer(DefaultBodyLimit::max(MAX_BODY_BYTES))
        .with_state(state);

    Router::new()
        .nest("/api", api_routes)
        .layer(CorsLayer::permissive())
}

// ============================================================================
// TESTS
// ============================================================================
