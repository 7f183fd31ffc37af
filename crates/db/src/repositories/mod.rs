use async_trait::async_trait;
use thiserror::Error;

use roofline_core::analytics::{
    ConversionFunnel, DashboardSummary, LeadSourceMetrics, QuoteSummary, Window,
};
use roofline_core::domain::event::{AnalyticsEvent, EventType};
use roofline_core::domain::lead::{Lead, LeadId, LeadStatus};
use roofline_core::domain::measurement::Measurement;
use roofline_core::domain::quote::{Quote, QuoteId};
use roofline_core::domain::tenant::{TenantConfigSnapshot, TenantId};
use roofline_core::errors::EngineError;
use roofline_core::pricing::ItemizedQuote;

pub mod analytics;
pub mod lead;
pub mod quote;
pub mod tenant;

pub use analytics::SqlAnalyticsRepository;
pub use lead::{NewLead, SqlLeadRepository};
pub use quote::SqlQuoteRepository;
pub use tenant::SqlTenantConfigRepository;

#[derive(Debug, Error)]
pub enum RepositoryError {
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
    #[error("decode error: {0}")]
    Decode(String),
    #[error("lead {0} not found")]
    LeadNotFound(i64),
}

impl From<RepositoryError> for EngineError {
    fn from(value: RepositoryError) -> Self {
        match value {
            RepositoryError::LeadNotFound(id) => EngineError::LeadNotFound(id),
            RepositoryError::Database(error) => EngineError::Storage(error.to_string()),
            RepositoryError::Decode(message) => EngineError::Storage(message),
        }
    }
}

/// Read-only view of the tenant registry: one round trip assembles the
/// full config snapshot, with defaults standing in for any section the
/// contractor has not customized.
#[async_trait]
pub trait TenantConfigRepository: Send + Sync {
    async fn snapshot(
        &self,
        tenant_id: TenantId,
    ) -> Result<Option<TenantConfigSnapshot>, RepositoryError>;

    async fn exists(&self, tenant_id: TenantId) -> Result<bool, RepositoryError>;
}

#[async_trait]
pub trait LeadRepository: Send + Sync {
    async fn create(&self, new_lead: NewLead) -> Result<Lead, RepositoryError>;
    async fn find_by_id(&self, id: LeadId) -> Result<Option<Lead>, RepositoryError>;
    async fn list_for_tenant(&self, tenant_id: TenantId) -> Result<Vec<Lead>, RepositoryError>;
    async fn update_status(&self, id: LeadId, status: &LeadStatus)
        -> Result<bool, RepositoryError>;
    /// Deleting a lead cascades to its quotes.
    async fn delete(&self, id: LeadId) -> Result<bool, RepositoryError>;
}

/// The quote ledger. Quotes are written once; no update of priced fields
/// exists anywhere in this interface. Re-quoting a lead means `create`
/// again.
#[async_trait]
pub trait QuoteRepository: Send + Sync {
    async fn create(
        &self,
        lead_id: LeadId,
        address: &str,
        measurement: &Measurement,
        itemized: &ItemizedQuote,
    ) -> Result<Quote, RepositoryError>;

    async fn find_by_id(&self, id: QuoteId) -> Result<Option<Quote>, RepositoryError>;

    /// Newest first.
    async fn list_for_lead(&self, lead_id: LeadId) -> Result<Vec<Quote>, RepositoryError>;

    /// Records the rendered proposal's location. The document pointer is
    /// the single post-creation write a quote permits.
    async fn set_document_url(&self, id: QuoteId, url: &str) -> Result<bool, RepositoryError>;
}

#[async_trait]
pub trait AnalyticsRepository: Send + Sync {
    async fn record_event(
        &self,
        tenant_id: TenantId,
        event_type: &EventType,
        payload: serde_json::Value,
        session_id: Option<&str>,
    ) -> Result<AnalyticsEvent, RepositoryError>;

    async fn dashboard_summary(
        &self,
        tenant_id: TenantId,
        window: Window,
    ) -> Result<DashboardSummary, RepositoryError>;

    async fn conversion_funnel(
        &self,
        tenant_id: TenantId,
        window: Window,
    ) -> Result<ConversionFunnel, RepositoryError>;

    async fn quote_summary(
        &self,
        tenant_id: TenantId,
        window: Window,
    ) -> Result<QuoteSummary, RepositoryError>;

    async fn lead_source_metrics(
        &self,
        tenant_id: TenantId,
        window: Window,
    ) -> Result<LeadSourceMetrics, RepositoryError>;
}
