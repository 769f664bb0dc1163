//! Row shapes exchanged with the hosted `specials` table.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};

/// One record as read from the row store. Every field may be absent or null;
/// validation happens in the classifier, not here.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RawRow {
    /// Store identifier. Numeric ids are kept as their decimal string.
    #[serde(default, deserialize_with = "deserialize_id")]
    pub id: Option<String>,
    pub created_at: Option<String>,
    /// Free-text kind discriminator (`"flash"`, `"weekly"`, ...).
    #[serde(rename = "type")]
    pub kind: Option<String>,
    pub business_name: Option<String>,
    pub deal: Option<String>,
    pub address: Option<String>,
    pub expires_at: Option<String>,
    pub status: Option<String>,
    /// Recurrence metadata: an object or a JSON-encoded string.
    pub extra: Option<serde_json::Value>,
    pub lat: Option<f64>,
    pub lng: Option<f64>,
}

fn deserialize_id<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<serde_json::Value>::deserialize(deserializer)?;
    Ok(match value {
        Some(serde_json::Value::String(s)) => Some(s),
        Some(serde_json::Value::Number(n)) => Some(n.to_string()),
        _ => None,
    })
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SpecialKind {
    Flash,
    Weekly,
}

impl SpecialKind {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            SpecialKind::Flash => "flash",
            SpecialKind::Weekly => "weekly",
        }
    }
}

impl fmt::Display for SpecialKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ModerationStatus {
    Approved,
    Pending,
}

impl ModerationStatus {
    /// Flash specials go live immediately; weekly ones wait for moderation.
    #[must_use]
    pub fn for_new(kind: SpecialKind) -> Self {
        match kind {
            SpecialKind::Flash => ModerationStatus::Approved,
            SpecialKind::Weekly => ModerationStatus::Pending,
        }
    }

    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            ModerationStatus::Approved => "approved",
            ModerationStatus::Pending => "pending",
        }
    }
}

/// Recurrence metadata stored in the `extra` column of weekly rows.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WeeklyMeta {
    pub day: String,
    pub start: String,
    pub end: String,
}

/// Insert payload for a newly submitted special.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NewSpecialRow {
    #[serde(rename = "type")]
    pub kind: SpecialKind,
    pub business_name: String,
    pub deal: String,
    pub address: String,
    pub expires_at: Option<DateTime<Utc>>,
    pub status: ModerationStatus,
    pub extra: Option<WeeklyMeta>,
    pub lat: f64,
    pub lng: f64,
}
