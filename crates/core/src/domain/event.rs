use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::domain::tenant::TenantId;

/// Open string label for widget engagement events. The funnel cares about
/// widget_view/widget_open/quote_request; anything else is stored and
/// counted as-is.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EventType(pub String);

impl EventType {
    pub const WIDGET_VIEW: &'static str = "widget_view";
    pub const WIDGET_OPEN: &'static str = "widget_open";
    pub const QUOTE_REQUEST: &'static str = "quote_request";

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for EventType {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

/// One row in the append-only engagement log. Never mutated or deleted by
/// the engine; the analytics aggregator only reads it.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct AnalyticsEvent {
    pub id: i64,
    pub tenant_id: TenantId,
    pub event_type: EventType,
    pub payload: serde_json::Value,
    pub session_id: Option<String>,
    pub created_at: DateTime<Utc>,
}
