//! Analytics result shapes and the aggregation math that does not belong
//! in SQL: conversion rates, size banding, window validation, and output
//! rounding. The row-level grouping itself happens in the store queries.

use std::collections::BTreeMap;

use chrono::{DateTime, Duration, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::errors::EngineError;

pub const DEFAULT_WINDOW_DAYS: i64 = 30;

/// A rolling `[now - days, now]` reporting window.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Window {
    days: i64,
}

impl Window {
    pub fn new(days: i64) -> Result<Self, EngineError> {
        if days <= 0 {
            return Err(EngineError::InvalidWindow { days });
        }
        Ok(Self { days })
    }

    pub fn days(&self) -> i64 {
        self.days
    }

    pub fn cutoff(&self, now: DateTime<Utc>) -> DateTime<Utc> {
        now - Duration::days(self.days)
    }

    pub fn label(&self) -> String {
        format!("Last {} days", self.days)
    }
}

impl Default for Window {
    fn default() -> Self {
        Self { days: DEFAULT_WINDOW_DAYS }
    }
}

/// Round a monetary aggregate to two decimals at output time.
pub fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

/// Stage-to-stage conversion percentage; 0 when the denominator is 0.
pub fn conversion_rate(numerator: i64, denominator: i64) -> f64 {
    if denominator > 0 {
        round2(numerator as f64 / denominator as f64 * 100.0)
    } else {
        0.0
    }
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct DashboardTotals {
    pub total_leads: i64,
    pub new_leads: i64,
    pub total_quotes: i64,
    pub total_value: f64,
    pub average_quote_value: f64,
}

/// In-window counts plus breakdowns keyed by the observed category
/// values. Categories that never occurred simply do not appear.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct DashboardSummary {
    pub period: String,
    pub summary: DashboardTotals,
    pub lead_status: BTreeMap<String, i64>,
    pub quote_tiers: BTreeMap<String, i64>,
    pub widget_events: BTreeMap<String, i64>,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FunnelStages {
    pub widget_views: i64,
    pub widget_opens: i64,
    pub quote_requests: i64,
    pub leads_created: i64,
    pub quotes_generated: i64,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct ConversionRates {
    pub view_to_open: f64,
    pub open_to_quote: f64,
    pub quote_to_lead: f64,
}

impl ConversionRates {
    pub fn from_stages(stages: &FunnelStages) -> Self {
        Self {
            view_to_open: conversion_rate(stages.widget_opens, stages.widget_views),
            open_to_quote: conversion_rate(stages.quote_requests, stages.widget_opens),
            quote_to_lead: conversion_rate(stages.leads_created, stages.quote_requests),
        }
    }
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct ConversionFunnel {
    pub period: String,
    pub funnel: FunnelStages,
    pub conversion_rates: ConversionRates,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct DailyActivity {
    pub date: String,
    pub quotes: i64,
    pub total_value: f64,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct TierPerformance {
    pub tier: String,
    pub count: i64,
    pub average_price: f64,
    pub total_value: f64,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SizeBucket {
    pub range: String,
    pub count: i64,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct QuoteSummary {
    pub period: String,
    pub daily_activity: Vec<DailyActivity>,
    pub tier_performance: Vec<TierPerformance>,
    pub size_distribution: Vec<SizeBucket>,
}

/// Fixed-boundary roof size bands. Lower bound inclusive, upper bound
/// exclusive, so every non-negative area lands in exactly one band.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SizeBand {
    Small,
    Medium,
    Large,
    ExtraLarge,
}

impl SizeBand {
    pub const ALL: [SizeBand; 4] =
        [SizeBand::Small, SizeBand::Medium, SizeBand::Large, SizeBand::ExtraLarge];

    pub fn label(&self) -> &'static str {
        match self {
            Self::Small => "Small (< 1500 sqft)",
            Self::Medium => "Medium (1500-2500 sqft)",
            Self::Large => "Large (2500-3500 sqft)",
            Self::ExtraLarge => "Extra Large (> 3500 sqft)",
        }
    }

    /// Band bounds in sqft: `[lower, upper)`, upper `None` means unbounded.
    pub fn bounds(&self) -> (i64, Option<i64>) {
        match self {
            Self::Small => (0, Some(1_500)),
            Self::Medium => (1_500, Some(2_500)),
            Self::Large => (2_500, Some(3_500)),
            Self::ExtraLarge => (3_500, None),
        }
    }

    pub fn for_area(area_sqft: Decimal) -> Self {
        if area_sqft < Decimal::new(1_500, 0) {
            Self::Small
        } else if area_sqft < Decimal::new(2_500, 0) {
            Self::Medium
        } else if area_sqft < Decimal::new(3_500, 0) {
            Self::Large
        } else {
            Self::ExtraLarge
        }
    }
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct SourcePerformance {
    pub lead_count: i64,
    pub active_days: i64,
    pub avg_leads_per_day: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub total_value: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub avg_quote_value: Option<f64>,
}

impl SourcePerformance {
    pub fn new(lead_count: i64, active_days: i64) -> Self {
        let avg_leads_per_day = if active_days > 0 {
            round2(lead_count as f64 / active_days as f64)
        } else {
            0.0
        };
        Self { lead_count, active_days, avg_leads_per_day, total_value: None, avg_quote_value: None }
    }
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct LeadSourceMetrics {
    pub period: String,
    pub sources: BTreeMap<String, SourcePerformance>,
}
