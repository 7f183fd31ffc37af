use std::str::FromStr;

use async_trait::async_trait;
use chrono::Utc;
use rust_decimal::Decimal;
use sqlx::{sqlite::SqliteRow, Row};

use roofline_core::domain::lead::LeadId;
use roofline_core::domain::measurement::{Measurement, RoofComplexity};
use roofline_core::domain::quote::{Quote, QuoteId};
use roofline_core::domain::tenant::TierKey;
use roofline_core::pricing::ItemizedQuote;

use super::lead::parse_timestamp;
use super::{QuoteRepository, RepositoryError};
use crate::DbPool;

pub struct SqlQuoteRepository {
    pool: DbPool,
}

impl SqlQuoteRepository {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

fn decode_decimal(row: &SqliteRow, column: &str) -> Result<Decimal, RepositoryError> {
    let text: String = row.try_get(column).map_err(|e| RepositoryError::Decode(e.to_string()))?;
    Decimal::from_str(&text).map_err(|e| {
        RepositoryError::Decode(format!("column `{column}` is not a decimal (`{text}`): {e}"))
    })
}

fn decode_complexity(text: &str) -> Result<RoofComplexity, RepositoryError> {
    match text {
        "simple" => Ok(RoofComplexity::Simple),
        "moderate" => Ok(RoofComplexity::Moderate),
        "complex" => Ok(RoofComplexity::Complex),
        other => Err(RepositoryError::Decode(format!("unknown roof complexity `{other}`"))),
    }
}

fn row_to_quote(row: &SqliteRow) -> Result<Quote, RepositoryError> {
    let complexity_text: String =
        row.try_get("complexity").map_err(|e| RepositoryError::Decode(e.to_string()))?;
    let tier_text: String =
        row.try_get("selected_tier").map_err(|e| RepositoryError::Decode(e.to_string()))?;
    let created_at_text: String =
        row.try_get("created_at").map_err(|e| RepositoryError::Decode(e.to_string()))?;

    Ok(Quote {
        id: QuoteId(row.try_get("id").map_err(|e| RepositoryError::Decode(e.to_string()))?),
        lead_id: LeadId(
            row.try_get("lead_id").map_err(|e| RepositoryError::Decode(e.to_string()))?,
        ),
        address: row.try_get("address").map_err(|e| RepositoryError::Decode(e.to_string()))?,
        measurement: Measurement {
            area_sqft: decode_decimal(row, "roof_area_sqft")?,
            squares: decode_decimal(row, "squares")?,
            complexity: decode_complexity(&complexity_text)?,
            pitch: row.try_get("pitch").map_err(|e| RepositoryError::Decode(e.to_string()))?,
        },
        selected_tier: TierKey::from_str(&tier_text)
            .map_err(|_| RepositoryError::Decode(format!("unknown tier `{tier_text}`")))?,
        base_price: decode_decimal(row, "base_price")?,
        removal_cost: decode_decimal(row, "removal_cost")?,
        permit_cost: decode_decimal(row, "permit_cost")?,
        total_price: decode_decimal(row, "total_price")?,
        document_url: row
            .try_get("document_url")
            .map_err(|e| RepositoryError::Decode(e.to_string()))?,
        created_at: parse_timestamp(&created_at_text)?,
    })
}

const QUOTE_COLUMNS: &str = "id, lead_id, address, roof_area_sqft, squares, complexity, pitch,
    selected_tier, base_price, removal_cost, permit_cost, total_price, document_url, created_at";

#[async_trait]
impl QuoteRepository for SqlQuoteRepository {
    async fn create(
        &self,
        lead_id: LeadId,
        address: &str,
        measurement: &Measurement,
        itemized: &ItemizedQuote,
    ) -> Result<Quote, RepositoryError> {
        // Lead check and insert share one transaction; the single INSERT
        // keeps the four monetary fields atomic.
        let mut tx = self.pool.begin().await?;

        let lead_exists: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM lead WHERE id = ?")
            .bind(lead_id.0)
            .fetch_one(&mut *tx)
            .await?;
        if lead_exists == 0 {
            return Err(RepositoryError::LeadNotFound(lead_id.0));
        }

        let created_at = Utc::now();
        let result = sqlx::query(
            "INSERT INTO quote (lead_id, address, roof_area_sqft, squares, complexity, pitch,
                selected_tier, base_price, removal_cost, permit_cost, total_price, created_at)
             VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)",
        )
        .bind(lead_id.0)
        .bind(address)
        .bind(measurement.area_sqft.to_string())
        .bind(measurement.squares.to_string())
        .bind(measurement.complexity.as_str())
        .bind(&measurement.pitch)
        .bind(itemized.tier.as_str())
        .bind(itemized.base_price.to_string())
        .bind(itemized.removal_cost.to_string())
        .bind(itemized.permit_cost.to_string())
        .bind(itemized.total_price.to_string())
        .bind(created_at.to_rfc3339())
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;

        Ok(Quote {
            id: QuoteId(result.last_insert_rowid()),
            lead_id,
            address: address.to_string(),
            measurement: measurement.clone(),
            selected_tier: itemized.tier,
            base_price: itemized.base_price,
            removal_cost: itemized.removal_cost,
            permit_cost: itemized.permit_cost,
            total_price: itemized.total_price,
            document_url: None,
            created_at,
        })
    }

    async fn find_by_id(&self, id: QuoteId) -> Result<Option<Quote>, RepositoryError> {
        sqlx::query(&format!("SELECT {QUOTE_COLUMNS} FROM quote WHERE id = ?"))
            .bind(id.0)
            .fetch_optional(&self.pool)
            .await?
            .map(|row| row_to_quote(&row))
            .transpose()
    }

    async fn list_for_lead(&self, lead_id: LeadId) -> Result<Vec<Quote>, RepositoryError> {
        let rows = sqlx::query(&format!(
            "SELECT {QUOTE_COLUMNS} FROM quote WHERE lead_id = ? ORDER BY created_at DESC, id DESC"
        ))
        .bind(lead_id.0)
        .fetch_all(&self.pool)
        .await?;

        rows.iter().map(row_to_quote).collect()
    }

    async fn set_document_url(&self, id: QuoteId, url: &str) -> Result<bool, RepositoryError> {
        let result = sqlx::query("UPDATE quote SET document_url = ? WHERE id = ?")
            .bind(url)
            .bind(id.0)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }
}

#[cfg(test)]
mod tests {
    use rust_decimal::Decimal;

    use roofline_core::domain::lead::{LeadId, LeadSource, LeadStatus};
    use roofline_core::domain::measurement::{Measurement, RoofComplexity};
    use roofline_core::domain::quote::QuoteId;
    use roofline_core::domain::tenant::{PricingConfig, TenantId, TierKey};
    use roofline_core::pricing::compute_quote;

    use super::SqlQuoteRepository;
    use crate::repositories::lead::NewLead;
    use crate::repositories::{LeadRepository, QuoteRepository, RepositoryError, SqlLeadRepository};
    use crate::{connect_with_settings, migrations, seed_contractor};

    async fn setup() -> (crate::DbPool, LeadId) {
        let pool = connect_with_settings("sqlite::memory:", 1, 30).await.expect("connect");
        migrations::run_pending(&pool).await.expect("migrations");
        let tenant_id = seed_contractor(&pool, "Summit Roofing").await.expect("seed");
        let lead_id = seed_lead(&pool, tenant_id).await;
        (pool, lead_id)
    }

    async fn seed_lead(pool: &crate::DbPool, tenant_id: TenantId) -> LeadId {
        SqlLeadRepository::new(pool.clone())
            .create(NewLead {
                tenant_id,
                name: "Jordan Alvarez".to_string(),
                email: "jordan@example.com".to_string(),
                phone: None,
                address: "123 Oak St, Dallas TX".to_string(),
                status: LeadStatus::default(),
                source: LeadSource::default(),
                notes: None,
            })
            .await
            .expect("seed lead")
            .id
    }

    fn measurement() -> Measurement {
        Measurement::new(Decimal::new(2_500, 0), RoofComplexity::Moderate, "6/12")
    }

    #[tokio::test]
    async fn created_quote_reads_back_with_identical_monetary_fields() {
        let (pool, lead_id) = setup().await;
        let repo = SqlQuoteRepository::new(pool);

        let measurement = measurement();
        let itemized =
            compute_quote(&PricingConfig::default(), &measurement, TierKey::Better, true, true)
                .expect("price");

        let created = repo
            .create(lead_id, "123 Oak St, Dallas TX", &measurement, &itemized)
            .await
            .expect("create");
        let read = repo.find_by_id(created.id).await.expect("find").expect("some");

        assert_eq!(read, created);
        assert_eq!(read.base_price, itemized.base_price);
        assert_eq!(read.removal_cost, itemized.removal_cost);
        assert_eq!(read.permit_cost, itemized.permit_cost);
        assert_eq!(read.total_price, itemized.total_price);
        assert!(read.totals_consistent());
    }

    #[tokio::test]
    async fn dangling_lead_reference_fails_with_lead_not_found() {
        let (pool, _) = setup().await;
        let repo = SqlQuoteRepository::new(pool);

        let measurement = measurement();
        let itemized =
            compute_quote(&PricingConfig::default(), &measurement, TierKey::Good, true, true)
                .expect("price");

        let error = repo
            .create(LeadId(404), "nowhere", &measurement, &itemized)
            .await
            .expect_err("should fail");
        assert!(matches!(error, RepositoryError::LeadNotFound(404)));
    }

    #[tokio::test]
    async fn requoting_appends_and_lists_newest_first() {
        let (pool, lead_id) = setup().await;
        let repo = SqlQuoteRepository::new(pool);

        let measurement = measurement();
        let pricing = PricingConfig::default();
        let first = compute_quote(&pricing, &measurement, TierKey::Good, true, true).expect("price");
        let second =
            compute_quote(&pricing, &measurement, TierKey::Best, false, false).expect("price");

        let quote_1 = repo.create(lead_id, "123 Oak St", &measurement, &first).await.expect("q1");
        let quote_2 = repo.create(lead_id, "123 Oak St", &measurement, &second).await.expect("q2");

        let quotes = repo.list_for_lead(lead_id).await.expect("list");
        assert_eq!(quotes.len(), 2);
        assert_eq!(quotes[0].id, quote_2.id);
        assert_eq!(quotes[1].id, quote_1.id);
        // The earlier quote is untouched by the re-quote.
        assert_eq!(quotes[1].selected_tier, TierKey::Good);
        assert_eq!(quotes[1].total_price, first.total_price);
    }

    #[tokio::test]
    async fn document_url_is_recorded_without_touching_prices() {
        let (pool, lead_id) = setup().await;
        let repo = SqlQuoteRepository::new(pool);

        let measurement = measurement();
        let itemized =
            compute_quote(&PricingConfig::default(), &measurement, TierKey::Better, true, false)
                .expect("price");
        let created = repo.create(lead_id, "123 Oak St", &measurement, &itemized).await.expect("create");

        let updated = repo
            .set_document_url(created.id, "/documents/proposal_1_9f3ab1c0.pdf")
            .await
            .expect("set url");
        assert!(updated);
        assert!(!repo.set_document_url(QuoteId(404), "/nope").await.expect("set url"));

        let read = repo.find_by_id(created.id).await.expect("find").expect("some");
        assert_eq!(read.document_url.as_deref(), Some("/documents/proposal_1_9f3ab1c0.pdf"));
        assert_eq!(read.total_price, created.total_price);
    }

    #[tokio::test]
    async fn deleting_a_lead_cascades_to_its_quotes() {
        let (pool, lead_id) = setup().await;
        let leads = SqlLeadRepository::new(pool.clone());
        let quotes = SqlQuoteRepository::new(pool);

        let measurement = measurement();
        let itemized =
            compute_quote(&PricingConfig::default(), &measurement, TierKey::Good, true, true)
                .expect("price");
        let created = quotes.create(lead_id, "123 Oak St", &measurement, &itemized).await.expect("create");

        assert!(leads.delete(lead_id).await.expect("delete"));
        assert!(quotes.find_by_id(created.id).await.expect("find").is_none());
    }
}
