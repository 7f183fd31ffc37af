//! Deterministic quote pricing.
//!
//! One algorithm for both single-tier quoting and the what-if comparison
//! across all tiers: base = area x tier rate, removal = area x removal
//! rate when selected, permit = flat fee when selected. Every component
//! is rounded to two decimals at the point of computation so the stored
//! total is the exact sum of the stored components.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::domain::measurement::Measurement;
use crate::domain::tenant::{PricingConfig, TierKey};
use crate::errors::EngineError;

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ItemizedQuote {
    pub tier: TierKey,
    pub tier_name: String,
    pub warranty: String,
    pub base_price: Decimal,
    pub removal_cost: Decimal,
    pub permit_cost: Decimal,
    pub total_price: Decimal,
}

/// One itemized quote per configured tier, for comparison before a lead
/// commits. Nothing here is persisted.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct TierComparison {
    pub good: ItemizedQuote,
    pub better: ItemizedQuote,
    pub best: ItemizedQuote,
}

impl TierComparison {
    pub fn get(&self, key: TierKey) -> &ItemizedQuote {
        match key {
            TierKey::Good => &self.good,
            TierKey::Better => &self.better,
            TierKey::Best => &self.best,
        }
    }
}

/// Price one tier for one measurement. Pure: no side effects, failure
/// never touches the ledger.
pub fn compute_quote(
    pricing: &PricingConfig,
    measurement: &Measurement,
    tier: TierKey,
    include_removal: bool,
    include_permit: bool,
) -> Result<ItemizedQuote, EngineError> {
    if measurement.area_sqft <= Decimal::ZERO {
        return Err(EngineError::InvalidMeasurement { area: measurement.area_sqft.to_string() });
    }

    let rate = pricing.tier(tier);
    let base_price = (measurement.area_sqft * rate.price_per_sqft).round_dp(2);
    let removal_cost = if include_removal {
        (measurement.area_sqft * pricing.removal_price_per_sqft).round_dp(2)
    } else {
        Decimal::ZERO
    };
    let permit_cost = if include_permit { pricing.permit_price.round_dp(2) } else { Decimal::ZERO };

    Ok(ItemizedQuote {
        tier,
        tier_name: rate.name.clone(),
        warranty: rate.warranty.clone(),
        base_price,
        removal_cost,
        permit_cost,
        total_price: base_price + removal_cost + permit_cost,
    })
}

/// Run the pricing computation once per tier key.
pub fn compare_all_tiers(
    pricing: &PricingConfig,
    measurement: &Measurement,
    include_removal: bool,
    include_permit: bool,
) -> Result<TierComparison, EngineError> {
    Ok(TierComparison {
        good: compute_quote(pricing, measurement, TierKey::Good, include_removal, include_permit)?,
        better: compute_quote(
            pricing,
            measurement,
            TierKey::Better,
            include_removal,
            include_permit,
        )?,
        best: compute_quote(pricing, measurement, TierKey::Best, include_removal, include_permit)?,
    })
}
