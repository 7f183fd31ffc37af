pub mod analytics;
pub mod config;
pub mod domain;
pub mod errors;
pub mod measure;
pub mod pricing;
pub mod proposal;

pub use analytics::{
    ConversionFunnel, ConversionRates, DashboardSummary, DashboardTotals, DailyActivity,
    FunnelStages, LeadSourceMetrics, QuoteSummary, SizeBand, SizeBucket, SourcePerformance,
    TierPerformance, Window, DEFAULT_WINDOW_DAYS,
};
pub use config::{AppConfig, ConfigError, LogFormat};
pub use domain::event::{AnalyticsEvent, EventType};
pub use domain::lead::{Lead, LeadId, LeadSource, LeadStatus};
pub use domain::measurement::{Measurement, RoofComplexity};
pub use domain::quote::{Quote, QuoteId};
pub use domain::tenant::{
    Branding, ContractorProfile, PricingConfig, ProposalTemplate, TenantConfigSnapshot, TenantId,
    TierKey, TierPricing,
};
pub use errors::EngineError;
pub use measure::{EstimatedMeasurementProvider, FixedMeasurementProvider, MeasurementProvider};
pub use pricing::{compare_all_tiers, compute_quote, ItemizedQuote, TierComparison};
pub use proposal::{proposal_file_name, ProposalView};
