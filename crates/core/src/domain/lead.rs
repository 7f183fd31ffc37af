use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct LeadId(pub i64);

/// Open string label for lead lifecycle state. The well-known values are
/// new/contacted/quoted/converted/lost, but contractors add their own, so
/// this is deliberately not a closed enum.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct LeadStatus(pub String);

impl LeadStatus {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Default for LeadStatus {
    fn default() -> Self {
        Self("new".to_string())
    }
}

impl From<&str> for LeadStatus {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

/// Open string label for the channel a lead came through.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct LeadSource(pub String);

impl LeadSource {
    pub const WIDGET: &'static str = "widget";

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Default for LeadSource {
    fn default() -> Self {
        Self(Self::WIDGET.to_string())
    }
}

impl From<&str> for LeadSource {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Lead {
    pub id: LeadId,
    pub tenant_id: crate::domain::tenant::TenantId,
    pub name: String,
    pub email: String,
    pub phone: Option<String>,
    pub address: String,
    pub status: LeadStatus,
    pub source: LeadSource,
    pub notes: Option<String>,
    pub created_at: DateTime<Utc>,
}
