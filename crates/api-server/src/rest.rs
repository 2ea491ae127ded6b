//! REST API handlers for campaign CRUD, execution, segmentation, and
//! ad-hoc generation.

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::Json;
use outreach_campaigns::{
    AdhocGenerationRequest, CampaignService, CreateCampaignRequest, ExecutionReport,
    GeneratedContent,
};
use outreach_core::config::RfmConfig;
use outreach_core::error::OutreachError;
use outreach_core::types::{Campaign, CampaignResult, CampaignStatus, ScoredCustomer};
use outreach_reporting::CampaignMetrics;
use outreach_segmentation::{parse_records, score_rfm};
use serde::{Deserialize, Serialize};
use std::str::FromStr;
use std::sync::Arc;
use std::time::Instant;
use tracing::warn;
use uuid::Uuid;

/// Maximum number of customer records accepted in one request body.
const MAX_CUSTOMERS: usize = 10_000;

/// Shared application state for REST handlers.
#[derive(Clone)]
pub struct AppState {
    pub service: Arc<CampaignService>,
    pub start_time: Instant,
}

#[derive(Serialize)]
pub struct ErrorResponse {
    pub error: String,
    pub message: String,
}

type ApiError = (StatusCode, Json<ErrorResponse>);

fn api_error(err: OutreachError) -> ApiError {
    let (status, code) = match &err {
        OutreachError::Validation(_) | OutreachError::MissingVariable(_) => {
            (StatusCode::BAD_REQUEST, "invalid_request")
        }
        OutreachError::NotFound(_) => (StatusCode::NOT_FOUND, "not_found"),
        OutreachError::InvalidState { .. } => (StatusCode::CONFLICT, "invalid_state"),
        _ => (StatusCode::INTERNAL_SERVER_ERROR, "internal_error"),
    };
    if status == StatusCode::INTERNAL_SERVER_ERROR {
        warn!(error = %err, "Request failed");
        metrics::counter!("api.errors").increment(1);
    }
    (
        status,
        Json(ErrorResponse {
            error: code.to_string(),
            message: err.to_string(),
        }),
    )
}

fn check_customer_count(count: usize) -> Result<(), ApiError> {
    if count > MAX_CUSTOMERS {
        metrics::counter!("api.validation_errors").increment(1);
        return Err(api_error(OutreachError::Validation(format!(
            "request exceeds maximum of {MAX_CUSTOMERS} customer records"
        ))));
    }
    Ok(())
}

// ─── Health ────────────────────────────────────────────────────────────────

#[derive(Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
    pub uptime_secs: u64,
}

/// GET /healthz — health check endpoint.
pub async fn healthz(State(state): State<AppState>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        uptime_secs: state.start_time.elapsed().as_secs(),
    })
}

// ─── Campaign CRUD ─────────────────────────────────────────────────────────

/// POST /campaigns — create a campaign in draft state.
pub async fn create_campaign(
    State(state): State<AppState>,
    Json(req): Json<CreateCampaignRequest>,
) -> Result<Json<Campaign>, ApiError> {
    state.service.create_campaign(req).map(Json).map_err(api_error)
}

#[derive(Deserialize)]
pub struct ListQuery {
    pub status: Option<String>,
}

/// GET /campaigns — list campaigns, filterable by status.
pub async fn list_campaigns(
    State(state): State<AppState>,
    Query(query): Query<ListQuery>,
) -> Result<Json<Vec<Campaign>>, ApiError> {
    let status = match query.status.as_deref() {
        Some(raw) => Some(CampaignStatus::from_str(raw).map_err(api_error)?),
        None => None,
    };
    state.service.list_campaigns(status).map(Json).map_err(api_error)
}

/// GET /campaigns/{id} — fetch one campaign.
pub async fn get_campaign(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<Campaign>, ApiError> {
    state.service.get_campaign(id).map(Json).map_err(api_error)
}

// ─── Lifecycle ─────────────────────────────────────────────────────────────

/// POST /campaigns/{id}/launch
pub async fn launch_campaign(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<Campaign>, ApiError> {
    state.service.launch(id).map(Json).map_err(api_error)
}

/// POST /campaigns/{id}/pause
pub async fn pause_campaign(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<Campaign>, ApiError> {
    state.service.pause(id).map(Json).map_err(api_error)
}

/// POST /campaigns/{id}/resume
pub async fn resume_campaign(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<Campaign>, ApiError> {
    state.service.resume(id).map(Json).map_err(api_error)
}

/// POST /campaigns/{id}/complete
pub async fn complete_campaign(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<Campaign>, ApiError> {
    state.service.complete(id).map(Json).map_err(api_error)
}

// ─── Execution ─────────────────────────────────────────────────────────────

#[derive(Deserialize)]
pub struct ExecuteRequest {
    /// Explicit customer snapshot. When omitted, the stored members of the
    /// campaign's target segment are used.
    #[serde(default)]
    pub customers: Option<Vec<serde_json::Value>>,
}

#[derive(Serialize)]
pub struct ExecuteResponse {
    pub message: String,
    pub report: ExecutionReport,
}

/// POST /campaigns/{id}/execute — run the campaign over a segment snapshot.
pub async fn execute_campaign(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(req): Json<ExecuteRequest>,
) -> Result<Json<ExecuteResponse>, ApiError> {
    let report = match req.customers {
        Some(raw) => {
            check_customer_count(raw.len())?;
            let customers = parse_records(&raw).map_err(api_error)?;
            state
                .service
                .execute_campaign(id, customers)
                .await
                .map_err(api_error)?
        }
        None => state.service.execute_by_segment(id).await.map_err(api_error)?,
    };

    Ok(Json(ExecuteResponse {
        message: format!(
            "Campaign executed for {} customers ({} sent, {} failed)",
            report.snapshot_size, report.sent, report.failed
        ),
        report,
    }))
}

/// GET /campaigns/{id}/results — stored execution results.
pub async fn campaign_results(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<Vec<CampaignResult>>, ApiError> {
    state.service.campaign_results(id).map(Json).map_err(api_error)
}

/// GET /campaigns/{id}/metrics — aggregated execution metrics.
pub async fn campaign_metrics(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<CampaignMetrics>, ApiError> {
    state.service.campaign_metrics(id).map(Json).map_err(api_error)
}

// ─── Segmentation & generation ─────────────────────────────────────────────

#[derive(Deserialize)]
pub struct SegmentRequest {
    pub customers: Vec<serde_json::Value>,
    /// Override the bucket count for all three metrics.
    #[serde(default)]
    pub bins: Option<usize>,
}

/// POST /segment — score a customer set without touching any campaign.
pub async fn segment(
    Json(req): Json<SegmentRequest>,
) -> Result<Json<Vec<ScoredCustomer>>, ApiError> {
    check_customer_count(req.customers.len())?;
    let customers = parse_records(&req.customers).map_err(api_error)?;
    let rfm = match req.bins {
        Some(bins) => RfmConfig {
            recency_bins: bins,
            frequency_bins: bins,
            monetary_bins: bins,
        },
        None => RfmConfig::default(),
    };
    score_rfm(&customers, &rfm).map(Json).map_err(api_error)
}

/// POST /generate — ad-hoc content generation.
pub async fn generate(
    State(state): State<AppState>,
    Json(req): Json<AdhocGenerationRequest>,
) -> Result<Json<GeneratedContent>, ApiError> {
    state.service.generate_content(&req).await.map(Json).map_err(api_error)
}
