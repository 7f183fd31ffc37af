//! Roof measurement acquisition.
//!
//! The calculator only sees the [`Measurement`] value, so the estimation
//! backend can be swapped for a real geocoding/aerial-imagery provider
//! without touching pricing.

use rand::seq::SliceRandom;
use rand::Rng;
use rust_decimal::Decimal;

use crate::domain::measurement::{Measurement, RoofComplexity};
use crate::errors::EngineError;

pub trait MeasurementProvider: Send + Sync {
    fn measure(&self, address: &str) -> Result<Measurement, EngineError>;
}

const PITCHES: [&str; 4] = ["4/12", "6/12", "8/12", "10/12"];

/// Stand-in provider producing plausible estimates: a random building
/// footprint between 1500 and 3500 sqft scaled by a complexity factor.
#[derive(Clone, Copy, Debug, Default)]
pub struct EstimatedMeasurementProvider;

impl MeasurementProvider for EstimatedMeasurementProvider {
    fn measure(&self, address: &str) -> Result<Measurement, EngineError> {
        if address.trim().is_empty() {
            return Err(EngineError::Measurement("address must not be empty".to_string()));
        }

        let mut rng = rand::thread_rng();
        let footprint_sqft: i64 = rng.gen_range(1_500..=3_500);
        let complexity = *[RoofComplexity::Simple, RoofComplexity::Moderate, RoofComplexity::Complex]
            .choose(&mut rng)
            .unwrap_or(&RoofComplexity::Simple);
        let pitch = *PITCHES.choose(&mut rng).unwrap_or(&"6/12");

        let area = Decimal::from(footprint_sqft) * complexity.area_factor();
        Ok(Measurement::new(area, complexity, pitch))
    }
}

/// Returns the same measurement for every address. Used in tests and
/// local demos where determinism matters more than realism.
#[derive(Clone, Debug)]
pub struct FixedMeasurementProvider {
    measurement: Measurement,
}

impl FixedMeasurementProvider {
    pub fn new(measurement: Measurement) -> Self {
        Self { measurement }
    }
}

impl MeasurementProvider for FixedMeasurementProvider {
    fn measure(&self, address: &str) -> Result<Measurement, EngineError> {
        if address.trim().is_empty() {
            return Err(EngineError::Measurement("address must not be empty".to_string()));
        }
        Ok(self.measurement.clone())
    }
}
