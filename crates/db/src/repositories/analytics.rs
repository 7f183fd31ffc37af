use std::collections::BTreeMap;

use async_trait::async_trait;
use chrono::Utc;
use sqlx::Row;

use roofline_core::analytics::{
    round2, ConversionFunnel, ConversionRates, DailyActivity, DashboardSummary, DashboardTotals,
    FunnelStages, LeadSourceMetrics, QuoteSummary, SizeBand, SizeBucket, SourcePerformance,
    TierPerformance, Window,
};
use roofline_core::domain::event::{AnalyticsEvent, EventType};
use roofline_core::domain::lead::LeadSource;
use roofline_core::domain::tenant::TenantId;

use super::{AnalyticsRepository, RepositoryError};
use crate::DbPool;

/// Read side of the engagement log plus the windowed aggregations over
/// leads and quotes. Every query takes the same `(tenant, cutoff)` pair;
/// quotes are scoped to the tenant through their lead.
pub struct SqlAnalyticsRepository {
    pool: DbPool,
}

impl SqlAnalyticsRepository {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }

    async fn count_events(
        &self,
        tenant_id: TenantId,
        cutoff: &str,
        event_type: &str,
    ) -> Result<i64, RepositoryError> {
        let count = sqlx::query_scalar(
            "SELECT COUNT(*) FROM widget_event
             WHERE contractor_id = ? AND event_type = ? AND created_at >= ?",
        )
        .bind(tenant_id.0)
        .bind(event_type)
        .bind(cutoff)
        .fetch_one(&self.pool)
        .await?;
        Ok(count)
    }
}

fn breakdown_from_rows(rows: Vec<(String, i64)>) -> BTreeMap<String, i64> {
    rows.into_iter().collect()
}

#[async_trait]
impl AnalyticsRepository for SqlAnalyticsRepository {
    async fn record_event(
        &self,
        tenant_id: TenantId,
        event_type: &EventType,
        payload: serde_json::Value,
        session_id: Option<&str>,
    ) -> Result<AnalyticsEvent, RepositoryError> {
        let created_at = Utc::now();
        let payload_text = payload.to_string();
        let result = sqlx::query(
            "INSERT INTO widget_event (contractor_id, event_type, payload, session_id, created_at)
             VALUES (?, ?, ?, ?, ?)",
        )
        .bind(tenant_id.0)
        .bind(event_type.as_str())
        .bind(&payload_text)
        .bind(session_id)
        .bind(created_at.to_rfc3339())
        .execute(&self.pool)
        .await?;

        Ok(AnalyticsEvent {
            id: result.last_insert_rowid(),
            tenant_id,
            event_type: event_type.clone(),
            payload,
            session_id: session_id.map(str::to_string),
            created_at,
        })
    }

    async fn dashboard_summary(
        &self,
        tenant_id: TenantId,
        window: Window,
    ) -> Result<DashboardSummary, RepositoryError> {
        let cutoff = window.cutoff(Utc::now()).to_rfc3339();

        let total_leads: i64 = sqlx::query_scalar(
            "SELECT COUNT(*) FROM lead WHERE contractor_id = ? AND created_at >= ?",
        )
        .bind(tenant_id.0)
        .bind(&cutoff)
        .fetch_one(&self.pool)
        .await?;

        let new_leads: i64 = sqlx::query_scalar(
            "SELECT COUNT(*) FROM lead
             WHERE contractor_id = ? AND created_at >= ? AND status = 'new'",
        )
        .bind(tenant_id.0)
        .bind(&cutoff)
        .fetch_one(&self.pool)
        .await?;

        let quote_row = sqlx::query(
            "SELECT COUNT(*) AS total, COALESCE(SUM(CAST(q.total_price AS REAL)), 0.0) AS value
             FROM quote q JOIN lead l ON l.id = q.lead_id
             WHERE l.contractor_id = ? AND q.created_at >= ?",
        )
        .bind(tenant_id.0)
        .bind(&cutoff)
        .fetch_one(&self.pool)
        .await?;
        let total_quotes: i64 = quote_row.try_get("total")?;
        let total_value: f64 = quote_row.try_get("value")?;
        let average_quote_value =
            if total_quotes > 0 { total_value / total_quotes as f64 } else { 0.0 };

        let lead_status: Vec<(String, i64)> = sqlx::query_as(
            "SELECT status, COUNT(*) FROM lead
             WHERE contractor_id = ? AND created_at >= ? GROUP BY status",
        )
        .bind(tenant_id.0)
        .bind(&cutoff)
        .fetch_all(&self.pool)
        .await?;

        let quote_tiers: Vec<(String, i64)> = sqlx::query_as(
            "SELECT q.selected_tier, COUNT(*)
             FROM quote q JOIN lead l ON l.id = q.lead_id
             WHERE l.contractor_id = ? AND q.created_at >= ? GROUP BY q.selected_tier",
        )
        .bind(tenant_id.0)
        .bind(&cutoff)
        .fetch_all(&self.pool)
        .await?;

        let widget_events: Vec<(String, i64)> = sqlx::query_as(
            "SELECT event_type, COUNT(*) FROM widget_event
             WHERE contractor_id = ? AND created_at >= ? GROUP BY event_type",
        )
        .bind(tenant_id.0)
        .bind(&cutoff)
        .fetch_all(&self.pool)
        .await?;

        Ok(DashboardSummary {
            period: window.label(),
            summary: DashboardTotals {
                total_leads,
                new_leads,
                total_quotes,
                total_value: round2(total_value),
                average_quote_value: round2(average_quote_value),
            },
            lead_status: breakdown_from_rows(lead_status),
            quote_tiers: breakdown_from_rows(quote_tiers),
            widget_events: breakdown_from_rows(widget_events),
        })
    }

    async fn conversion_funnel(
        &self,
        tenant_id: TenantId,
        window: Window,
    ) -> Result<ConversionFunnel, RepositoryError> {
        let cutoff = window.cutoff(Utc::now()).to_rfc3339();

        let widget_views = self.count_events(tenant_id, &cutoff, EventType::WIDGET_VIEW).await?;
        let widget_opens = self.count_events(tenant_id, &cutoff, EventType::WIDGET_OPEN).await?;
        let quote_requests =
            self.count_events(tenant_id, &cutoff, EventType::QUOTE_REQUEST).await?;

        // Funnel tail only counts what the widget itself produced.
        let leads_created: i64 = sqlx::query_scalar(
            "SELECT COUNT(*) FROM lead
             WHERE contractor_id = ? AND created_at >= ? AND source = ?",
        )
        .bind(tenant_id.0)
        .bind(&cutoff)
        .bind(LeadSource::WIDGET)
        .fetch_one(&self.pool)
        .await?;

        let quotes_generated: i64 = sqlx::query_scalar(
            "SELECT COUNT(*) FROM quote q JOIN lead l ON l.id = q.lead_id
             WHERE l.contractor_id = ? AND q.created_at >= ? AND l.source = ?",
        )
        .bind(tenant_id.0)
        .bind(&cutoff)
        .bind(LeadSource::WIDGET)
        .fetch_one(&self.pool)
        .await?;

        let funnel = FunnelStages {
            widget_views,
            widget_opens,
            quote_requests,
            leads_created,
            quotes_generated,
        };
        let conversion_rates = ConversionRates::from_stages(&funnel);

        Ok(ConversionFunnel { period: window.label(), funnel, conversion_rates })
    }

    async fn quote_summary(
        &self,
        tenant_id: TenantId,
        window: Window,
    ) -> Result<QuoteSummary, RepositoryError> {
        let cutoff = window.cutoff(Utc::now()).to_rfc3339();

        let daily_rows = sqlx::query(
            "SELECT date(q.created_at) AS day, COUNT(*) AS quotes,
                    COALESCE(SUM(CAST(q.total_price AS REAL)), 0) AS value
             FROM quote q JOIN lead l ON l.id = q.lead_id
             WHERE l.contractor_id = ? AND q.created_at >= ?
             GROUP BY date(q.created_at) ORDER BY day ASC",
        )
        .bind(tenant_id.0)
        .bind(&cutoff)
        .fetch_all(&self.pool)
        .await?;

        let mut daily_activity = Vec::with_capacity(daily_rows.len());
        for row in &daily_rows {
            daily_activity.push(DailyActivity {
                date: row.try_get("day")?,
                quotes: row.try_get("quotes")?,
                total_value: round2(row.try_get("value")?),
            });
        }

        let tier_rows = sqlx::query(
            "SELECT q.selected_tier AS tier, COUNT(*) AS count,
                    COALESCE(AVG(CAST(q.total_price AS REAL)), 0) AS average,
                    COALESCE(SUM(CAST(q.total_price AS REAL)), 0) AS value
             FROM quote q JOIN lead l ON l.id = q.lead_id
             WHERE l.contractor_id = ? AND q.created_at >= ?
             GROUP BY q.selected_tier",
        )
        .bind(tenant_id.0)
        .bind(&cutoff)
        .fetch_all(&self.pool)
        .await?;

        let mut tier_performance = Vec::with_capacity(tier_rows.len());
        for row in &tier_rows {
            tier_performance.push(TierPerformance {
                tier: row.try_get("tier")?,
                count: row.try_get("count")?,
                average_price: round2(row.try_get("average")?),
                total_value: round2(row.try_get("value")?),
            });
        }

        let mut size_distribution = Vec::with_capacity(SizeBand::ALL.len());
        for band in SizeBand::ALL {
            let (lower, upper) = band.bounds();
            let count: i64 = match upper {
                Some(upper) => sqlx::query_scalar(
                    "SELECT COUNT(*) FROM quote q JOIN lead l ON l.id = q.lead_id
                     WHERE l.contractor_id = ? AND q.created_at >= ?
                       AND CAST(q.roof_area_sqft AS REAL) >= ?
                       AND CAST(q.roof_area_sqft AS REAL) < ?",
                )
                .bind(tenant_id.0)
                .bind(&cutoff)
                .bind(lower as f64)
                .bind(upper as f64)
                .fetch_one(&self.pool)
                .await?,
                None => sqlx::query_scalar(
                    "SELECT COUNT(*) FROM quote q JOIN lead l ON l.id = q.lead_id
                     WHERE l.contractor_id = ? AND q.created_at >= ?
                       AND CAST(q.roof_area_sqft AS REAL) >= ?",
                )
                .bind(tenant_id.0)
                .bind(&cutoff)
                .bind(lower as f64)
                .fetch_one(&self.pool)
                .await?,
            };
            size_distribution.push(SizeBucket { range: band.label().to_string(), count });
        }

        Ok(QuoteSummary { period: window.label(), daily_activity, tier_performance, size_distribution })
    }

    async fn lead_source_metrics(
        &self,
        tenant_id: TenantId,
        window: Window,
    ) -> Result<LeadSourceMetrics, RepositoryError> {
        let cutoff = window.cutoff(Utc::now()).to_rfc3339();

        let source_rows = sqlx::query(
            "SELECT source, COUNT(*) AS leads, COUNT(DISTINCT date(created_at)) AS active_days
             FROM lead WHERE contractor_id = ? AND created_at >= ?
             GROUP BY source",
        )
        .bind(tenant_id.0)
        .bind(&cutoff)
        .fetch_all(&self.pool)
        .await?;

        let mut sources = BTreeMap::new();
        for row in &source_rows {
            let source: String = row.try_get("source")?;
            let mut performance = SourcePerformance::new(
                row.try_get("leads")?,
                row.try_get("active_days")?,
            );

            let value_row = sqlx::query(
                "SELECT COUNT(*) AS quotes,
                        COALESCE(SUM(CAST(q.total_price AS REAL)), 0) AS value,
                        COALESCE(AVG(CAST(q.total_price AS REAL)), 0) AS average
                 FROM quote q JOIN lead l ON l.id = q.lead_id
                 WHERE l.contractor_id = ? AND l.source = ? AND q.created_at >= ?",
            )
            .bind(tenant_id.0)
            .bind(&source)
            .bind(&cutoff)
            .fetch_one(&self.pool)
            .await?;

            let quote_count: i64 = value_row.try_get("quotes")?;
            if quote_count > 0 {
                performance.total_value = Some(round2(value_row.try_get("value")?));
                performance.avg_quote_value = Some(round2(value_row.try_get("average")?));
            }

            sources.insert(source, performance);
        }

        Ok(LeadSourceMetrics { period: window.label(), sources })
    }
}
