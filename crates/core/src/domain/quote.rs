use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::domain::lead::LeadId;
use crate::domain::measurement::Measurement;
use crate::domain::tenant::TierKey;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct QuoteId(pub i64);

/// An immutable priced snapshot for one lead, one measurement, one tier.
///
/// The measurement and the four monetary fields are fixed at creation and
/// never re-derived; re-quoting means creating a new quote for the same
/// lead. The only field written after creation is `document_url`, the
/// pointer to the most recently rendered proposal.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Quote {
    pub id: QuoteId,
    pub lead_id: LeadId,
    pub address: String,
    pub measurement: Measurement,
    pub selected_tier: TierKey,
    pub base_price: Decimal,
    pub removal_cost: Decimal,
    pub permit_cost: Decimal,
    pub total_price: Decimal,
    pub document_url: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl Quote {
    /// Invariant: the stored total is exactly the sum of the stored
    /// components. A mismatch is a defect, not tolerated drift.
    pub fn totals_consistent(&self) -> bool {
        self.total_price == self.base_price + self.removal_cost + self.permit_cost
    }
}

#[cfg(test)]
mod tests {
    use chrono::Utc;
    use rust_decimal::Decimal;

    use super::{Quote, QuoteId};
    use crate::domain::lead::LeadId;
    use crate::domain::measurement::{Measurement, RoofComplexity};
    use crate::domain::tenant::TierKey;

    fn quote(total_price: Decimal) -> Quote {
        Quote {
            id: QuoteId(1),
            lead_id: LeadId(1),
            address: "123 Oak St, Dallas TX".to_string(),
            measurement: Measurement::new(Decimal::new(2_000, 0), RoofComplexity::Simple, "6/12"),
            selected_tier: TierKey::Good,
            base_price: Decimal::new(1_300_000, 2),
            removal_cost: Decimal::new(300_000, 2),
            permit_cost: Decimal::new(35_000, 2),
            total_price,
            document_url: None,
            created_at: Utc::now(),
        }
    }

    #[test]
    fn totals_consistent_accepts_exact_sum() {
        assert!(quote(Decimal::new(1_635_000, 2)).totals_consistent());
    }

    #[test]
    fn totals_consistent_rejects_drift() {
        assert!(!quote(Decimal::new(1_635_001, 2)).totals_consistent());
    }
}
