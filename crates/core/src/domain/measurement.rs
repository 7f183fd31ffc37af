use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RoofComplexity {
    Simple,
    Moderate,
    Complex,
}

impl RoofComplexity {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Simple => "simple",
            Self::Moderate => "moderate",
            Self::Complex => "complex",
        }
    }

    /// Area multiplier applied to the building footprint by the
    /// estimation provider: more complex roofs have more surface per
    /// square foot of footprint.
    pub fn area_factor(&self) -> Decimal {
        match self {
            Self::Simple => Decimal::new(100, 2),
            Self::Moderate => Decimal::new(115, 2),
            Self::Complex => Decimal::new(125, 2),
        }
    }
}

impl std::fmt::Display for RoofComplexity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Estimated roof geometry for one address. Ephemeral: never persisted on
/// its own, only as the snapshot copied onto a quote at creation time.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Measurement {
    pub area_sqft: Decimal,
    /// Roofing squares, one square = 100 sqft.
    pub squares: Decimal,
    pub complexity: RoofComplexity,
    /// Pitch as a ratio string, e.g. "6/12".
    pub pitch: String,
}

impl Measurement {
    pub fn new(area_sqft: Decimal, complexity: RoofComplexity, pitch: impl Into<String>) -> Self {
        let area_sqft = area_sqft.round_dp(2);
        Self {
            area_sqft,
            squares: (area_sqft / Decimal::ONE_HUNDRED).round_dp(2),
            complexity,
            pitch: pitch.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use rust_decimal::Decimal;

    use super::{Measurement, RoofComplexity};

    #[test]
    fn squares_are_derived_from_area() {
        let measurement = Measurement::new(Decimal::new(2_425, 0), RoofComplexity::Simple, "6/12");
        assert_eq!(measurement.squares, Decimal::new(2_425, 2));
    }

    #[test]
    fn area_is_rounded_to_cents_of_a_square_foot() {
        let measurement =
            Measurement::new(Decimal::new(1_725_125, 3), RoofComplexity::Moderate, "8/12");
        assert_eq!(measurement.area_sqft, Decimal::new(172_512, 2));
    }
}
