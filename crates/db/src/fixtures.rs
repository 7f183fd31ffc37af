//! Seed helpers shared by tests and the demo bootstrap. Everything here
//! writes through plain SQL or the repositories; nothing is reachable from
//! request handling.

use chrono::Utc;
use rust_decimal::Decimal;
use serde_json::json;

use roofline_core::domain::event::EventType;
use roofline_core::domain::lead::{LeadSource, LeadStatus};
use roofline_core::domain::measurement::{Measurement, RoofComplexity};
use roofline_core::domain::quote::Quote;
use roofline_core::domain::tenant::{PricingConfig, TenantId, TierKey};
use roofline_core::pricing::compute_quote;

use crate::repositories::lead::NewLead;
use crate::repositories::{
    AnalyticsRepository, LeadRepository, QuoteRepository, RepositoryError, SqlAnalyticsRepository,
    SqlLeadRepository, SqlQuoteRepository,
};
use crate::DbPool;

fn slug(name: &str) -> String {
    name.to_ascii_lowercase().replace(' ', "-")
}

/// Inserts a bare contractor row. Email and widget id are derived from the
/// company name so two seeded contractors never collide on the unique
/// columns.
pub async fn seed_contractor(pool: &DbPool, name: &str) -> Result<TenantId, RepositoryError> {
    let slug = slug(name);
    let result = sqlx::query(
        "INSERT INTO contractor (company_name, email, widget_id, created_at)
         VALUES (?, ?, ?, ?)",
    )
    .bind(name)
    .bind(format!("office@{slug}.example"))
    .bind(format!("wgt-{slug}"))
    .bind(Utc::now().to_rfc3339())
    .execute(pool)
    .await?;
    Ok(TenantId(result.last_insert_rowid()))
}

/// What `seed_demo_dataset` produced, so callers can log or link to it.
#[derive(Debug)]
pub struct DemoDataset {
    pub tenant_id: TenantId,
    pub lead_count: usize,
    pub quotes: Vec<Quote>,
}

struct DemoLead {
    name: &'static str,
    email: &'static str,
    address: &'static str,
    status: &'static str,
    source: &'static str,
    roof_sqft: i64,
    complexity: RoofComplexity,
    pitch: &'static str,
    tier: TierKey,
}

const DEMO_LEADS: &[DemoLead] = &[
    DemoLead {
        name: "Jordan Alvarez",
        email: "jordan.alvarez@example.com",
        address: "123 Oak St, Dallas TX",
        status: "new",
        source: "widget",
        roof_sqft: 1_850,
        complexity: RoofComplexity::Simple,
        pitch: "4/12",
        tier: TierKey::Good,
    },
    DemoLead {
        name: "Priya Natarajan",
        email: "priya.n@example.com",
        address: "48 Maple Ave, Plano TX",
        status: "contacted",
        source: "widget",
        roof_sqft: 2_600,
        complexity: RoofComplexity::Moderate,
        pitch: "6/12",
        tier: TierKey::Better,
    },
    DemoLead {
        name: "Marcus Webb",
        email: "marcus.webb@example.com",
        address: "902 Cedar Ct, Frisco TX",
        status: "quoted",
        source: "referral",
        roof_sqft: 3_900,
        complexity: RoofComplexity::Complex,
        pitch: "8/12",
        tier: TierKey::Best,
    },
];

/// Seeds one contractor on default pricing with a handful of leads, one
/// quote each, and enough widget events to light up the funnel.
pub async fn seed_demo_dataset(pool: &DbPool) -> Result<DemoDataset, RepositoryError> {
    let tenant_id = seed_contractor(pool, "Summit Roofing Demo").await?;

    let leads = SqlLeadRepository::new(pool.clone());
    let quotes = SqlQuoteRepository::new(pool.clone());
    let events = SqlAnalyticsRepository::new(pool.clone());
    let pricing = PricingConfig::default();

    let mut created_quotes = Vec::with_capacity(DEMO_LEADS.len());
    for demo in DEMO_LEADS {
        let lead = leads
            .create(NewLead {
                tenant_id,
                name: demo.name.to_string(),
                email: demo.email.to_string(),
                phone: None,
                address: demo.address.to_string(),
                status: LeadStatus::from(demo.status),
                source: LeadSource::from(demo.source),
                notes: None,
            })
            .await?;

        let measurement =
            Measurement::new(Decimal::new(demo.roof_sqft, 0), demo.complexity, demo.pitch);
        let itemized = compute_quote(&pricing, &measurement, demo.tier, true, true)
            .map_err(|e| RepositoryError::Decode(e.to_string()))?;
        created_quotes.push(quotes.create(lead.id, demo.address, &measurement, &itemized).await?);
    }

    for _ in 0..12 {
        events
            .record_event(tenant_id, &EventType::from(EventType::WIDGET_VIEW), json!({}), None)
            .await?;
    }
    for session in ["s-demo-1", "s-demo-2", "s-demo-3", "s-demo-4"] {
        events
            .record_event(
                tenant_id,
                &EventType::from(EventType::WIDGET_OPEN),
                json!({}),
                Some(session),
            )
            .await?;
    }
    for session in ["s-demo-1", "s-demo-2"] {
        events
            .record_event(
                tenant_id,
                &EventType::from(EventType::QUOTE_REQUEST),
                json!({ "address": "123 Oak St, Dallas TX" }),
                Some(session),
            )
            .await?;
    }

    Ok(DemoDataset { tenant_id, lead_count: DEMO_LEADS.len(), quotes: created_quotes })
}
