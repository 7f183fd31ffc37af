use std::str::FromStr;

use async_trait::async_trait;
use rust_decimal::Decimal;
use sqlx::{sqlite::SqliteRow, Row};

use roofline_core::domain::tenant::{
    Branding, ContractorProfile, PricingConfig, ProposalTemplate, TenantConfigSnapshot, TenantId,
    TierPricing,
};

use super::{RepositoryError, TenantConfigRepository};
use crate::DbPool;

/// SQLite-backed tenant registry reader. Pricing, branding, and template
/// rows are each optional; a missing row resolves to the documented
/// defaults so a tenant who never customized anything still quotes and
/// renders. Only a missing contractor row yields `None`.
pub struct SqlTenantConfigRepository {
    pool: DbPool,
}

impl SqlTenantConfigRepository {
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

fn decode_features(row: &SqliteRow, column: &str) -> Result<Vec<String>, RepositoryError> {
    let text: String = row.try_get(column).map_err(|e| RepositoryError::Decode(e.to_string()))?;
    serde_json::from_str(&text).map_err(|e| {
        RepositoryError::Decode(format!("column `{column}` is not a JSON string array: {e}"))
    })
}

fn row_to_profile(row: &SqliteRow) -> Result<ContractorProfile, RepositoryError> {
    Ok(ContractorProfile {
        id: TenantId(row.try_get("id").map_err(|e| RepositoryError::Decode(e.to_string()))?),
        company_name: row
            .try_get("company_name")
            .map_err(|e| RepositoryError::Decode(e.to_string()))?,
        email: row.try_get("email").map_err(|e| RepositoryError::Decode(e.to_string()))?,
        phone: row.try_get("phone").map_err(|e| RepositoryError::Decode(e.to_string()))?,
        address: row.try_get("address").map_err(|e| RepositoryError::Decode(e.to_string()))?,
        website: row.try_get("website").map_err(|e| RepositoryError::Decode(e.to_string()))?,
        widget_id: row.try_get("widget_id").map_err(|e| RepositoryError::Decode(e.to_string()))?,
    })
}

fn row_to_pricing(row: &SqliteRow) -> Result<PricingConfig, RepositoryError> {
    Ok(PricingConfig {
        good: TierPricing {
            name: row.try_get("good_name").map_err(|e| RepositoryError::Decode(e.to_string()))?,
            price_per_sqft: decode_decimal(row, "good_price")?,
            warranty: row
                .try_get("good_warranty")
                .map_err(|e| RepositoryError::Decode(e.to_string()))?,
            features: decode_features(row, "good_features")?,
        },
        better: TierPricing {
            name: row.try_get("better_name").map_err(|e| RepositoryError::Decode(e.to_string()))?,
            price_per_sqft: decode_decimal(row, "better_price")?,
            warranty: row
                .try_get("better_warranty")
                .map_err(|e| RepositoryError::Decode(e.to_string()))?,
            features: decode_features(row, "better_features")?,
        },
        best: TierPricing {
            name: row.try_get("best_name").map_err(|e| RepositoryError::Decode(e.to_string()))?,
            price_per_sqft: decode_decimal(row, "best_price")?,
            warranty: row
                .try_get("best_warranty")
                .map_err(|e| RepositoryError::Decode(e.to_string()))?,
            features: decode_features(row, "best_features")?,
        },
        removal_price_per_sqft: decode_decimal(row, "removal_price")?,
        permit_price: decode_decimal(row, "permit_price")?,
    })
}

fn row_to_branding(row: &SqliteRow) -> Result<Branding, RepositoryError> {
    Ok(Branding {
        logo_url: row.try_get("logo_url").map_err(|e| RepositoryError::Decode(e.to_string()))?,
        primary_color: row
            .try_get("primary_color")
            .map_err(|e| RepositoryError::Decode(e.to_string()))?,
        secondary_color: row
            .try_get("secondary_color")
            .map_err(|e| RepositoryError::Decode(e.to_string()))?,
        accent_color: row
            .try_get("accent_color")
            .map_err(|e| RepositoryError::Decode(e.to_string()))?,
        font_family: row
            .try_get("font_family")
            .map_err(|e| RepositoryError::Decode(e.to_string()))?,
    })
}

fn row_to_template(row: &SqliteRow) -> Result<ProposalTemplate, RepositoryError> {
    Ok(ProposalTemplate {
        header_text: row
            .try_get("header_text")
            .map_err(|e| RepositoryError::Decode(e.to_string()))?,
        footer_text: row
            .try_get("footer_text")
            .map_err(|e| RepositoryError::Decode(e.to_string()))?,
        show_warranty: row
            .try_get("show_warranty")
            .map_err(|e| RepositoryError::Decode(e.to_string()))?,
        show_financing: row
            .try_get("show_financing")
            .map_err(|e| RepositoryError::Decode(e.to_string()))?,
        custom_message: row
            .try_get("custom_message")
            .map_err(|e| RepositoryError::Decode(e.to_string()))?,
        terms_conditions: row
            .try_get("terms_conditions")
            .map_err(|e| RepositoryError::Decode(e.to_string()))?,
    })
}

#[async_trait]
impl TenantConfigRepository for SqlTenantConfigRepository {
    async fn snapshot(
        &self,
        tenant_id: TenantId,
    ) -> Result<Option<TenantConfigSnapshot>, RepositoryError> {
        let contractor = sqlx::query(
            "SELECT id, company_name, email, phone, address, website, widget_id
             FROM contractor WHERE id = ?",
        )
        .bind(tenant_id.0)
        .fetch_optional(&self.pool)
        .await?;

        let Some(contractor) = contractor else {
            return Ok(None);
        };
        let profile = row_to_profile(&contractor)?;

        let pricing = sqlx::query(
            "SELECT good_name, good_price, good_warranty, good_features,
                    better_name, better_price, better_warranty, better_features,
                    best_name, best_price, best_warranty, best_features,
                    removal_price, permit_price
             FROM pricing WHERE contractor_id = ?",
        )
        .bind(tenant_id.0)
        .fetch_optional(&self.pool)
        .await?
        .map(|row| row_to_pricing(&row))
        .transpose()?
        .unwrap_or_default();

        let branding = sqlx::query(
            "SELECT logo_url, primary_color, secondary_color, accent_color, font_family
             FROM branding WHERE contractor_id = ?",
        )
        .bind(tenant_id.0)
        .fetch_optional(&self.pool)
        .await?
        .map(|row| row_to_branding(&row))
        .transpose()?
        .unwrap_or_default();

        let template = sqlx::query(
            "SELECT header_text, footer_text, show_warranty, show_financing,
                    custom_message, terms_conditions
             FROM proposal_template WHERE contractor_id = ?",
        )
        .bind(tenant_id.0)
        .fetch_optional(&self.pool)
        .await?
        .map(|row| row_to_template(&row))
        .transpose()?
        .unwrap_or_default();

        Ok(Some(TenantConfigSnapshot { profile, pricing, branding, template }))
    }

    async fn exists(&self, tenant_id: TenantId) -> Result<bool, RepositoryError> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM contractor WHERE id = ?")
            .bind(tenant_id.0)
            .fetch_one(&self.pool)
            .await?;
        Ok(count > 0)
    }
}
