use std::str::FromStr;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::errors::EngineError;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TenantId(pub i64);

/// The three fixed product tiers every contractor configures.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TierKey {
    Good,
    Better,
    Best,
}

impl TierKey {
    pub const ALL: [TierKey; 3] = [TierKey::Good, TierKey::Better, TierKey::Best];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Good => "good",
            Self::Better => "better",
            Self::Best => "best",
        }
    }
}

impl std::fmt::Display for TierKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TierKey {
    type Err = EngineError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "good" => Ok(Self::Good),
            "better" => Ok(Self::Better),
            "best" => Ok(Self::Best),
            other => Err(EngineError::InvalidTier { tier: other.to_string() }),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ContractorProfile {
    pub id: TenantId,
    pub company_name: String,
    pub email: String,
    pub phone: Option<String>,
    pub address: Option<String>,
    pub website: Option<String>,
    pub widget_id: String,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct TierPricing {
    pub name: String,
    pub price_per_sqft: Decimal,
    pub warranty: String,
    pub features: Vec<String>,
}

/// Per-tenant pricing sheet: three tiers plus removal and permit pricing.
/// All prices are non-negative; the engine reads this, never writes it.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct PricingConfig {
    pub good: TierPricing,
    pub better: TierPricing,
    pub best: TierPricing,
    pub removal_price_per_sqft: Decimal,
    pub permit_price: Decimal,
}

impl PricingConfig {
    pub fn tier(&self, key: TierKey) -> &TierPricing {
        match key {
            TierKey::Good => &self.good,
            TierKey::Better => &self.better,
            TierKey::Best => &self.best,
        }
    }
}

impl Default for PricingConfig {
    fn default() -> Self {
        Self {
            good: TierPricing {
                name: "3-Tab Shingles".to_string(),
                price_per_sqft: Decimal::new(650, 2),
                warranty: "25-year".to_string(),
                features: vec![
                    "Traditional 3-tab design".to_string(),
                    "Basic wind resistance".to_string(),
                    "Standard algae protection".to_string(),
                    "25-year manufacturer warranty".to_string(),
                ],
            },
            better: TierPricing {
                name: "Architectural Shingles".to_string(),
                price_per_sqft: Decimal::new(875, 2),
                warranty: "30-year".to_string(),
                features: vec![
                    "Dimensional appearance".to_string(),
                    "Enhanced wind resistance (110 mph)".to_string(),
                    "Advanced algae protection".to_string(),
                    "30-year manufacturer warranty".to_string(),
                    "Better curb appeal".to_string(),
                ],
            },
            best: TierPricing {
                name: "Designer Shingles".to_string(),
                price_per_sqft: Decimal::new(1200, 2),
                warranty: "Lifetime".to_string(),
                features: vec![
                    "Premium designer appearance".to_string(),
                    "Maximum wind resistance (130+ mph)".to_string(),
                    "Superior algae protection".to_string(),
                    "Lifetime manufacturer warranty".to_string(),
                    "Best curb appeal".to_string(),
                    "Enhanced energy efficiency".to_string(),
                ],
            },
            removal_price_per_sqft: Decimal::new(150, 2),
            permit_price: Decimal::new(35_000, 2),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Branding {
    pub logo_url: Option<String>,
    pub primary_color: String,
    pub secondary_color: String,
    pub accent_color: String,
    pub font_family: String,
}

impl Default for Branding {
    fn default() -> Self {
        Self {
            logo_url: None,
            primary_color: "#22c55e".to_string(),
            secondary_color: "#16a34a".to_string(),
            accent_color: "#15803d".to_string(),
            font_family: "Inter".to_string(),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProposalTemplate {
    pub header_text: String,
    pub footer_text: String,
    pub show_warranty: bool,
    pub show_financing: bool,
    pub custom_message: Option<String>,
    pub terms_conditions: Option<String>,
}

impl Default for ProposalTemplate {
    fn default() -> Self {
        Self {
            header_text: "Professional Roof Quote".to_string(),
            footer_text: "Thank you for choosing us!".to_string(),
            show_warranty: true,
            show_financing: true,
            custom_message: None,
            terms_conditions: None,
        }
    }
}

/// Everything the engine needs to know about one tenant, assembled once
/// per request by the tenant registry. Optional sections a contractor has
/// not customized come back as the documented defaults, so downstream
/// pricing and rendering never deal with missing config.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct TenantConfigSnapshot {
    pub profile: ContractorProfile,
    pub pricing: PricingConfig,
    pub branding: Branding,
    pub template: ProposalTemplate,
}

#[cfg(test)]
mod tests {
    use std::str::FromStr;

    use rust_decimal::Decimal;

    use super::{PricingConfig, TierKey};
    use crate::errors::EngineError;

    #[test]
    fn tier_key_round_trips_through_strings() {
        for key in TierKey::ALL {
            assert_eq!(TierKey::from_str(key.as_str()).expect("parse"), key);
        }
    }

    #[test]
    fn unknown_tier_key_is_a_validation_error() {
        let error = TierKey::from_str("platinum").expect_err("should reject");
        assert!(matches!(error, EngineError::InvalidTier { ref tier } if tier == "platinum"));
    }

    #[test]
    fn default_pricing_matches_standard_sheet() {
        let pricing = PricingConfig::default();
        assert_eq!(pricing.tier(TierKey::Good).price_per_sqft, Decimal::new(650, 2));
        assert_eq!(pricing.tier(TierKey::Better).price_per_sqft, Decimal::new(875, 2));
        assert_eq!(pricing.tier(TierKey::Best).price_per_sqft, Decimal::new(1200, 2));
        assert_eq!(pricing.removal_price_per_sqft, Decimal::new(150, 2));
        assert_eq!(pricing.permit_price, Decimal::new(35_000, 2));
    }
}
