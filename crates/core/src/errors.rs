use thiserror::Error;

/// Engine-level error taxonomy.
///
/// Three groups, kept distinct so callers can map them to different
/// responses: validation failures (client fault, never retried),
/// not-found lookups, and collaborator failures which are propagated
/// unchanged rather than masked as empty results.
#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum EngineError {
    #[error("invalid tier `{tier}` (expected good|better|best)")]
    InvalidTier { tier: String },
    #[error("invalid measurement: roof area must be positive, got {area}")]
    InvalidMeasurement { area: String },
    #[error("invalid analytics window: days must be greater than zero, got {days}")]
    InvalidWindow { days: i64 },
    #[error("lead {0} not found")]
    LeadNotFound(i64),
    #[error("quote {0} not found")]
    QuoteNotFound(i64),
    #[error("contractor {0} not found")]
    TenantNotFound(i64),
    #[error("storage failure: {0}")]
    Storage(String),
    #[error("measurement provider failure: {0}")]
    Measurement(String),
    #[error("proposal rendering failure: {0}")]
    Render(String),
}

impl EngineError {
    /// True for errors caused by the caller's input rather than the system.
    pub fn is_client_fault(&self) -> bool {
        matches!(
            self,
            Self::InvalidTier { .. } | Self::InvalidMeasurement { .. } | Self::InvalidWindow { .. }
        )
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::LeadNotFound(_) | Self::QuoteNotFound(_) | Self::TenantNotFound(_))
    }
}

#[cfg(test)]
mod tests {
    use super::EngineError;

    #[test]
    fn validation_errors_are_client_faults() {
        assert!(EngineError::InvalidTier { tier: "platinum".to_string() }.is_client_fault());
        assert!(EngineError::InvalidWindow { days: 0 }.is_client_fault());
        assert!(!EngineError::InvalidTier { tier: "platinum".to_string() }.is_not_found());
    }

    #[test]
    fn not_found_is_distinct_from_validation() {
        let error = EngineError::QuoteNotFound(42);
        assert!(error.is_not_found());
        assert!(!error.is_client_fault());
    }

    #[test]
    fn collaborator_failures_are_neither() {
        let error = EngineError::Storage("database unreachable".to_string());
        assert!(!error.is_client_fault());
        assert!(!error.is_not_found());
    }
}
