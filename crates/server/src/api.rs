//! JSON API routes.
//!
//! Endpoints:
//! - `POST   /api/leads`                                — capture a lead
//! - `GET    /api/leads/{id}`                           — fetch one lead
//! - `PATCH  /api/leads/{id}/status`                    — move a lead through the pipeline
//! - `DELETE /api/leads/{id}`                           — drop a lead (and its quotes)
//! - `GET    /api/leads/{id}/quotes`                    — quote history, newest first
//! - `POST   /api/quotes`                               — measure, price, and persist a quote
//! - `POST   /api/quotes/calculate`                     — price all three tiers, nothing persisted
//! - `GET    /api/quotes/{id}`                          — fetch one quote
//! - `POST   /api/quotes/{id}/proposal`                 — render the proposal document
//! - `POST   /api/events`                               — append a widget engagement event
//! - `GET    /api/tenants/{id}/leads`                   — leads for a contractor
//! - `GET    /api/tenants/{id}/analytics/dashboard`     — windowed totals and breakdowns
//! - `GET    /api/tenants/{id}/analytics/conversion`    — widget funnel with stage rates
//! - `GET    /api/tenants/{id}/analytics/quotes/summary` — daily/tier/size quote activity
//! - `GET    /api/tenants/{id}/analytics/leads/sources` — per-channel lead performance

use std::str::FromStr;
use std::sync::Arc;

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, patch, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use tracing::{error, info};

use roofline_core::analytics::{
    ConversionFunnel, DashboardSummary, LeadSourceMetrics, QuoteSummary, Window,
    DEFAULT_WINDOW_DAYS,
};
use roofline_core::domain::event::{AnalyticsEvent, EventType};
use roofline_core::domain::lead::{Lead, LeadId, LeadSource, LeadStatus};
use roofline_core::domain::measurement::Measurement;
use roofline_core::domain::quote::{Quote, QuoteId};
use roofline_core::domain::tenant::{TenantId, TierKey};
use roofline_core::errors::EngineError;
use roofline_core::measure::MeasurementProvider;
use roofline_core::pricing::{compare_all_tiers, compute_quote, TierComparison};
use roofline_core::proposal::ProposalView;
use roofline_db::repositories::lead::NewLead;
use roofline_db::repositories::{
    AnalyticsRepository, LeadRepository, QuoteRepository, SqlAnalyticsRepository,
    SqlLeadRepository, SqlQuoteRepository, SqlTenantConfigRepository, TenantConfigRepository,
};
use roofline_db::DbPool;

use crate::pdf::ProposalRenderer;

#[derive(Clone)]
pub struct AppState {
    pool: DbPool,
    measurer: Arc<dyn MeasurementProvider>,
    renderer: Arc<ProposalRenderer>,
    /// URL prefix proposal documents are served under.
    public_path: String,
}

impl AppState {
    pub fn new(
        pool: DbPool,
        measurer: Arc<dyn MeasurementProvider>,
        renderer: Arc<ProposalRenderer>,
        public_path: String,
    ) -> Self {
        Self { pool, measurer, renderer, public_path }
    }

    fn tenants(&self) -> SqlTenantConfigRepository {
        SqlTenantConfigRepository::new(self.pool.clone())
    }

    fn leads(&self) -> SqlLeadRepository {
        SqlLeadRepository::new(self.pool.clone())
    }

    fn quotes(&self) -> SqlQuoteRepository {
        SqlQuoteRepository::new(self.pool.clone())
    }

    fn analytics(&self) -> SqlAnalyticsRepository {
        SqlAnalyticsRepository::new(self.pool.clone())
    }
}

// ---------------------------------------------------------------------------
// Error mapping
// ---------------------------------------------------------------------------

/// Boundary wrapper translating the engine's error taxonomy into HTTP:
/// validation faults 400, not-found 404, collaborator failures 503.
#[derive(Debug)]
pub struct ApiError(EngineError);

impl From<EngineError> for ApiError {
    fn from(value: EngineError) -> Self {
        Self(value)
    }
}

impl From<roofline_db::repositories::RepositoryError> for ApiError {
    fn from(value: roofline_db::repositories::RepositoryError) -> Self {
        Self(EngineError::from(value))
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = if self.0.is_client_fault() {
            StatusCode::BAD_REQUEST
        } else if self.0.is_not_found() {
            StatusCode::NOT_FOUND
        } else {
            error!(error = %self.0, "collaborator failure");
            StatusCode::SERVICE_UNAVAILABLE
        };
        (status, Json(ErrorBody { error: self.0.to_string() })).into_response()
    }
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorBody {
    pub error: String,
}

// ---------------------------------------------------------------------------
// Request / Response types
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize)]
pub struct CreateLeadRequest {
    pub tenant_id: i64,
    pub name: String,
    pub email: String,
    pub phone: Option<String>,
    pub address: String,
    pub source: Option<String>,
    pub notes: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct UpdateLeadStatusRequest {
    pub status: String,
}

fn default_true() -> bool {
    true
}

#[derive(Debug, Deserialize)]
pub struct CreateQuoteRequest {
    pub lead_id: i64,
    /// Overrides the lead's address when the roof is elsewhere.
    pub address: Option<String>,
    pub tier: String,
    #[serde(default = "default_true")]
    pub include_removal: bool,
    #[serde(default = "default_true")]
    pub include_permit: bool,
}

#[derive(Debug, Deserialize)]
pub struct CalculateRequest {
    pub tenant_id: i64,
    pub address: String,
    #[serde(default = "default_true")]
    pub include_removal: bool,
    #[serde(default = "default_true")]
    pub include_permit: bool,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct CalculateResponse {
    pub measurement: Measurement,
    pub tiers: TierComparison,
}

#[derive(Debug, Deserialize)]
pub struct RecordEventRequest {
    pub tenant_id: i64,
    pub event_type: String,
    #[serde(default)]
    pub payload: serde_json::Value,
    pub session_id: Option<String>,
}

#[derive(Debug, Deserialize, Default)]
pub struct WindowQuery {
    pub days: Option<i64>,
}

impl WindowQuery {
    fn window(&self) -> Result<Window, EngineError> {
        Window::new(self.days.unwrap_or(DEFAULT_WINDOW_DAYS))
    }
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ProposalResponse {
    pub quote_id: i64,
    pub document_url: String,
}

// ---------------------------------------------------------------------------
// Router
// ---------------------------------------------------------------------------

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/api/leads", post(create_lead))
        .route("/api/leads/{id}", get(get_lead).delete(delete_lead))
        .route("/api/leads/{id}/status", patch(update_lead_status))
        .route("/api/leads/{id}/quotes", get(list_lead_quotes))
        .route("/api/quotes", post(create_quote))
        .route("/api/quotes/calculate", post(calculate_quote))
        .route("/api/quotes/{id}", get(get_quote))
        .route("/api/quotes/{id}/proposal", post(create_proposal))
        .route("/api/events", post(record_event))
        .route("/api/tenants/{id}/leads", get(list_tenant_leads))
        .route("/api/tenants/{id}/analytics/dashboard", get(analytics_dashboard))
        .route("/api/tenants/{id}/analytics/conversion", get(analytics_conversion))
        .route("/api/tenants/{id}/analytics/quotes/summary", get(analytics_quote_summary))
        .route("/api/tenants/{id}/analytics/leads/sources", get(analytics_lead_sources))
        .with_state(state)
}

// ---------------------------------------------------------------------------
// Lead handlers
// ---------------------------------------------------------------------------

async fn create_lead(
    State(state): State<AppState>,
    Json(body): Json<CreateLeadRequest>,
) -> Result<(StatusCode, Json<Lead>), ApiError> {
    let tenant_id = TenantId(body.tenant_id);
    if !state.tenants().exists(tenant_id).await? {
        return Err(EngineError::TenantNotFound(tenant_id.0).into());
    }

    let lead = state
        .leads()
        .create(NewLead {
            tenant_id,
            name: body.name,
            email: body.email,
            phone: body.phone,
            address: body.address,
            status: LeadStatus::default(),
            source: body.source.as_deref().map(LeadSource::from).unwrap_or_default(),
            notes: body.notes,
        })
        .await?;

    info!(lead_id = lead.id.0, tenant_id = tenant_id.0, "lead captured");
    Ok((StatusCode::CREATED, Json(lead)))
}

async fn get_lead(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<Json<Lead>, ApiError> {
    let lead = state.leads().find_by_id(LeadId(id)).await?.ok_or(EngineError::LeadNotFound(id))?;
    Ok(Json(lead))
}

async fn list_tenant_leads(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<Json<Vec<Lead>>, ApiError> {
    let tenant_id = TenantId(id);
    if !state.tenants().exists(tenant_id).await? {
        return Err(EngineError::TenantNotFound(id).into());
    }
    Ok(Json(state.leads().list_for_tenant(tenant_id).await?))
}

async fn update_lead_status(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    Json(body): Json<UpdateLeadStatusRequest>,
) -> Result<Json<Lead>, ApiError> {
    let leads = state.leads();
    if !leads.update_status(LeadId(id), &LeadStatus(body.status)).await? {
        return Err(EngineError::LeadNotFound(id).into());
    }
    let lead = leads.find_by_id(LeadId(id)).await?.ok_or(EngineError::LeadNotFound(id))?;
    Ok(Json(lead))
}

async fn delete_lead(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<StatusCode, ApiError> {
    if !state.leads().delete(LeadId(id)).await? {
        return Err(EngineError::LeadNotFound(id).into());
    }
    info!(lead_id = id, "lead deleted");
    Ok(StatusCode::NO_CONTENT)
}

// ---------------------------------------------------------------------------
// Quote handlers
// ---------------------------------------------------------------------------

async fn create_quote(
    State(state): State<AppState>,
    Json(body): Json<CreateQuoteRequest>,
) -> Result<(StatusCode, Json<Quote>), ApiError> {
    let lead = state
        .leads()
        .find_by_id(LeadId(body.lead_id))
        .await?
        .ok_or(EngineError::LeadNotFound(body.lead_id))?;

    let config = state
        .tenants()
        .snapshot(lead.tenant_id)
        .await?
        .ok_or(EngineError::TenantNotFound(lead.tenant_id.0))?;

    let tier = TierKey::from_str(&body.tier)?;
    let address = body.address.unwrap_or_else(|| lead.address.clone());
    let measurement = state.measurer.measure(&address)?;
    let itemized = compute_quote(
        &config.pricing,
        &measurement,
        tier,
        body.include_removal,
        body.include_permit,
    )?;

    let quote = state.quotes().create(lead.id, &address, &measurement, &itemized).await?;

    info!(
        quote_id = quote.id.0,
        lead_id = lead.id.0,
        tier = tier.as_str(),
        total = %quote.total_price,
        "quote created"
    );
    Ok((StatusCode::CREATED, Json(quote)))
}

async fn calculate_quote(
    State(state): State<AppState>,
    Json(body): Json<CalculateRequest>,
) -> Result<Json<CalculateResponse>, ApiError> {
    let tenant_id = TenantId(body.tenant_id);
    let config = state
        .tenants()
        .snapshot(tenant_id)
        .await?
        .ok_or(EngineError::TenantNotFound(tenant_id.0))?;

    let measurement = state.measurer.measure(&body.address)?;
    let tiers = compare_all_tiers(
        &config.pricing,
        &measurement,
        body.include_removal,
        body.include_permit,
    )?;

    Ok(Json(CalculateResponse { measurement, tiers }))
}

async fn get_quote(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<Json<Quote>, ApiError> {
    let quote =
        state.quotes().find_by_id(QuoteId(id)).await?.ok_or(EngineError::QuoteNotFound(id))?;
    Ok(Json(quote))
}

async fn list_lead_quotes(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<Json<Vec<Quote>>, ApiError> {
    if state.leads().find_by_id(LeadId(id)).await?.is_none() {
        return Err(EngineError::LeadNotFound(id).into());
    }
    Ok(Json(state.quotes().list_for_lead(LeadId(id)).await?))
}

async fn create_proposal(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<(StatusCode, Json<ProposalResponse>), ApiError> {
    let quotes = state.quotes();
    let quote = quotes.find_by_id(QuoteId(id)).await?.ok_or(EngineError::QuoteNotFound(id))?;
    let lead = state
        .leads()
        .find_by_id(quote.lead_id)
        .await?
        .ok_or(EngineError::LeadNotFound(quote.lead_id.0))?;
    let config = state
        .tenants()
        .snapshot(lead.tenant_id)
        .await?
        .ok_or(EngineError::TenantNotFound(lead.tenant_id.0))?;

    let view = ProposalView::build(&quote, &lead, &config);
    let rendered = state
        .renderer
        .render(quote.id, &view)
        .await
        .map_err(|e| EngineError::Render(e.to_string()))?;

    let document_url = format!("{}/{}", state.public_path, rendered.file_name);
    quotes.set_document_url(quote.id, &document_url).await?;

    info!(quote_id = quote.id.0, document_url = %document_url, format = rendered.extension, "proposal rendered");
    Ok((StatusCode::CREATED, Json(ProposalResponse { quote_id: quote.id.0, document_url })))
}

// ---------------------------------------------------------------------------
// Event + analytics handlers
// ---------------------------------------------------------------------------

async fn record_event(
    State(state): State<AppState>,
    Json(body): Json<RecordEventRequest>,
) -> Result<(StatusCode, Json<AnalyticsEvent>), ApiError> {
    let tenant_id = TenantId(body.tenant_id);
    if !state.tenants().exists(tenant_id).await? {
        return Err(EngineError::TenantNotFound(tenant_id.0).into());
    }

    let event = state
        .analytics()
        .record_event(
            tenant_id,
            &EventType(body.event_type),
            body.payload,
            body.session_id.as_deref(),
        )
        .await?;
    Ok((StatusCode::CREATED, Json(event)))
}

async fn analytics_dashboard(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    Query(query): Query<WindowQuery>,
) -> Result<Json<DashboardSummary>, ApiError> {
    let window = query.window()?;
    let tenant_id = TenantId(id);
    if !state.tenants().exists(tenant_id).await? {
        return Err(EngineError::TenantNotFound(id).into());
    }
    Ok(Json(state.analytics().dashboard_summary(tenant_id, window).await?))
}

async fn analytics_conversion(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    Query(query): Query<WindowQuery>,
) -> Result<Json<ConversionFunnel>, ApiError> {
    let window = query.window()?;
    let tenant_id = TenantId(id);
    if !state.tenants().exists(tenant_id).await? {
        return Err(EngineError::TenantNotFound(id).into());
    }
    Ok(Json(state.analytics().conversion_funnel(tenant_id, window).await?))
}

async fn analytics_quote_summary(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    Query(query): Query<WindowQuery>,
) -> Result<Json<QuoteSummary>, ApiError> {
    let window = query.window()?;
    let tenant_id = TenantId(id);
    if !state.tenants().exists(tenant_id).await? {
        return Err(EngineError::TenantNotFound(id).into());
    }
    Ok(Json(state.analytics().quote_summary(tenant_id, window).await?))
}

async fn analytics_lead_sources(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    Query(query): Query<WindowQuery>,
) -> Result<Json<LeadSourceMetrics>, ApiError> {
    let window = query.window()?;
    let tenant_id = TenantId(id);
    if !state.tenants().exists(tenant_id).await? {
        return Err(EngineError::TenantNotFound(id).into());
    }
    Ok(Json(state.analytics().lead_source_metrics(tenant_id, window).await?))
}
