//! Proposal document assembly.
//!
//! [`ProposalView`] is the fully resolved, render-ready content of one
//! proposal: every section in display order, every amount formatted from
//! the quote's stored values. Building it never re-runs pricing, so
//! re-rendering the same quote always yields the same priced content.
//! The server-side renderer only pours this view into a template.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::domain::lead::Lead;
use crate::domain::quote::{Quote, QuoteId};
use crate::domain::tenant::TenantConfigSnapshot;

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SpecRow {
    pub label: String,
    pub value: String,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PriceLine {
    pub label: String,
    pub amount: String,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContractorBlock {
    pub company_name: String,
    pub address: Option<String>,
    pub phone: Option<String>,
    pub email: String,
    pub website: Option<String>,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecipientBlock {
    pub name: String,
    pub address: String,
    pub email: String,
    pub phone: Option<String>,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProposalView {
    pub header_text: String,
    pub primary_color: String,
    pub secondary_color: String,
    pub font_family: String,
    pub contractor: ContractorBlock,
    pub recipient: RecipientBlock,
    /// Zero-padded quote number, e.g. "00042".
    pub quote_number: String,
    pub quote_date: String,
    pub specs: Vec<SpecRow>,
    pub tier_name: String,
    pub warranty: String,
    /// Base line always present; removal and permit lines only when the
    /// stored cost is positive.
    pub price_lines: Vec<PriceLine>,
    pub total: PriceLine,
    pub show_warranty: bool,
    pub show_financing: bool,
    pub custom_message: Option<String>,
    pub terms_conditions: Option<String>,
    pub footer_text: String,
}

impl ProposalView {
    pub fn build(quote: &Quote, lead: &Lead, config: &TenantConfigSnapshot) -> Self {
        let tier = config.pricing.tier(quote.selected_tier);

        let mut price_lines = vec![PriceLine {
            label: "Roofing Materials & Labor".to_string(),
            amount: format_money(quote.base_price),
        }];
        if quote.removal_cost > Decimal::ZERO {
            price_lines.push(PriceLine {
                label: "Old Roof Removal".to_string(),
                amount: format_money(quote.removal_cost),
            });
        }
        if quote.permit_cost > Decimal::ZERO {
            price_lines.push(PriceLine {
                label: "Permits".to_string(),
                amount: format_money(quote.permit_cost),
            });
        }

        Self {
            header_text: config.template.header_text.clone(),
            primary_color: config.branding.primary_color.clone(),
            secondary_color: config.branding.secondary_color.clone(),
            font_family: config.branding.font_family.clone(),
            contractor: ContractorBlock {
                company_name: config.profile.company_name.clone(),
                address: config.profile.address.clone(),
                phone: config.profile.phone.clone(),
                email: config.profile.email.clone(),
                website: config.profile.website.clone(),
            },
            recipient: RecipientBlock {
                name: lead.name.clone(),
                address: lead.address.clone(),
                email: lead.email.clone(),
                phone: lead.phone.clone(),
            },
            quote_number: format!("{:05}", quote.id.0),
            quote_date: quote.created_at.format("%B %d, %Y").to_string(),
            specs: vec![
                SpecRow {
                    label: "Roof Size".to_string(),
                    value: format!(
                        "{} sq ft ({} squares)",
                        group_thousands(&quote.measurement.area_sqft.round_dp(0).to_string()),
                        quote.measurement.squares.round_dp(1)
                    ),
                },
                SpecRow { label: "Roof Pitch".to_string(), value: quote.measurement.pitch.clone() },
                SpecRow {
                    label: "Complexity".to_string(),
                    value: capitalize(quote.measurement.complexity.as_str()),
                },
                SpecRow {
                    label: "Selected Product".to_string(),
                    value: capitalize(quote.selected_tier.as_str()),
                },
            ],
            tier_name: tier.name.clone(),
            warranty: tier.warranty.clone(),
            price_lines,
            total: PriceLine { label: "TOTAL".to_string(), amount: format_money(quote.total_price) },
            show_warranty: config.template.show_warranty,
            show_financing: config.template.show_financing,
            custom_message: config.template.custom_message.clone(),
            terms_conditions: config.template.terms_conditions.clone(),
            footer_text: config.template.footer_text.clone(),
        }
    }
}

/// Filename convention for rendered proposals: encodes the quote id plus
/// a uniqueness token so repeated renders never collide.
pub fn proposal_file_name(quote_id: QuoteId, token: &str, extension: &str) -> String {
    format!("proposal_{}_{}.{}", quote_id.0, token, extension)
}

/// Format a monetary amount as `$1,234.56`.
pub fn format_money(amount: Decimal) -> String {
    let rounded = amount.round_dp(2);
    let text = format!("{rounded:.2}");
    match text.split_once('.') {
        Some((int_part, frac_part)) => format!("${}.{}", group_thousands(int_part), frac_part),
        None => format!("${}", group_thousands(&text)),
    }
}

fn group_thousands(digits: &str) -> String {
    let (sign, digits) = match digits.strip_prefix('-') {
        Some(rest) => ("-", rest),
        None => ("", digits),
    };
    let mut grouped = String::with_capacity(digits.len() + digits.len() / 3);
    for (index, ch) in digits.chars().enumerate() {
        if index > 0 && (digits.len() - index) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(ch);
    }
    format!("{sign}{grouped}")
}

fn capitalize(value: &str) -> String {
    let mut chars = value.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().collect::<String>() + chars.as_str(),
        None => String::new(),
    }
}

#[cfg(test)]
mod tests {
    use chrono::{TimeZone, Utc};
    use rust_decimal::Decimal;

    use super::{format_money, proposal_file_name, ProposalView};
    use crate::domain::lead::{Lead, LeadId, LeadSource, LeadStatus};
    use crate::domain::measurement::{Measurement, RoofComplexity};
    use crate::domain::quote::{Quote, QuoteId};
    use crate::domain::tenant::{
        Branding, ContractorProfile, PricingConfig, ProposalTemplate, TenantConfigSnapshot,
        TenantId, TierKey,
    };

    fn snapshot() -> TenantConfigSnapshot {
        TenantConfigSnapshot {
            profile: ContractorProfile {
                id: TenantId(1),
                company_name: "Summit Roofing".to_string(),
                email: "office@summitroofing.example".to_string(),
                phone: Some("555-0100".to_string()),
                address: Some("800 Main St, Dallas TX".to_string()),
                website: None,
                widget_id: "wgt-summit".to_string(),
            },
            pricing: PricingConfig::default(),
            branding: Branding::default(),
            template: ProposalTemplate::default(),
        }
    }

    fn lead() -> Lead {
        Lead {
            id: LeadId(7),
            tenant_id: TenantId(1),
            name: "Jordan Alvarez".to_string(),
            email: "jordan@example.com".to_string(),
            phone: None,
            address: "123 Oak St, Dallas TX".to_string(),
            status: LeadStatus::default(),
            source: LeadSource::default(),
            notes: None,
            created_at: Utc::now(),
        }
    }

    fn quote(removal: i64, permit: i64) -> Quote {
        let base = Decimal::new(2_187_500, 2);
        let removal = Decimal::new(removal, 2);
        let permit = Decimal::new(permit, 2);
        Quote {
            id: QuoteId(42),
            lead_id: LeadId(7),
            address: "123 Oak St, Dallas TX".to_string(),
            measurement: Measurement::new(Decimal::new(2_500, 0), RoofComplexity::Moderate, "6/12"),
            selected_tier: TierKey::Better,
            base_price: base,
            removal_cost: removal,
            permit_cost: permit,
            total_price: base + removal + permit,
            document_url: None,
            created_at: Utc.with_ymd_and_hms(2026, 3, 14, 9, 30, 0).single().expect("timestamp"),
        }
    }

    #[test]
    fn renders_all_price_lines_when_options_are_included() {
        let view = ProposalView::build(&quote(375_000, 35_000), &lead(), &snapshot());

        let labels: Vec<&str> = view.price_lines.iter().map(|l| l.label.as_str()).collect();
        assert_eq!(labels, ["Roofing Materials & Labor", "Old Roof Removal", "Permits"]);
        assert_eq!(view.total.amount, "$25,975.00");
    }

    #[test]
    fn zero_cost_lines_are_omitted() {
        let view = ProposalView::build(&quote(0, 0), &lead(), &snapshot());

        assert_eq!(view.price_lines.len(), 1);
        assert_eq!(view.total.amount, "$21,875.00");
    }

    #[test]
    fn quote_number_is_zero_padded_and_date_formatted() {
        let view = ProposalView::build(&quote(0, 35_000), &lead(), &snapshot());

        assert_eq!(view.quote_number, "00042");
        assert_eq!(view.quote_date, "March 14, 2026");
        assert_eq!(view.specs[0].value, "2,500 sq ft (25.0 squares)");
        assert_eq!(view.specs[3].value, "Better");
    }

    #[test]
    fn rebuilding_the_same_quote_is_idempotent() {
        let quote = quote(375_000, 35_000);
        let lead = lead();
        let config = snapshot();

        assert_eq!(
            ProposalView::build(&quote, &lead, &config),
            ProposalView::build(&quote, &lead, &config)
        );
    }

    #[test]
    fn money_formatting_groups_thousands() {
        assert_eq!(format_money(Decimal::new(2_597_500, 2)), "$25,975.00");
        assert_eq!(format_money(Decimal::new(35_000, 2)), "$350.00");
        assert_eq!(format_money(Decimal::new(123_456_789, 2)), "$1,234,567.89");
        assert_eq!(format_money(Decimal::ZERO), "$0.00");
    }

    #[test]
    fn file_names_encode_quote_id_and_token() {
        assert_eq!(proposal_file_name(QuoteId(42), "9f3ab1c0", "pdf"), "proposal_42_9f3ab1c0.pdf");
    }
}
