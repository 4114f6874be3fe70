use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

use super::trigger::{parse_triggers, Trigger};

/// Raw row from the `episodes` table.
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct EpisodeRow {
    pub id: Uuid,
    pub user_id: Uuid,
    pub date: DateTime<Utc>,
    pub severity: i32,
    pub body_areas: Option<Vec<String>>,
    pub triggers: Option<serde_json::Value>,
    pub notes: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// Ordinal episode intensity. Nominally 1..=5; other values are kept as stored.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SeverityLevel(pub i32);

impl SeverityLevel {
    pub const MIN: i32 = 1;
    pub const MAX: i32 = 5;

    pub fn is_in_range(&self) -> bool {
        (Self::MIN..=Self::MAX).contains(&self.0)
    }

    /// `"N/5"`
    pub fn fraction(&self) -> String {
        format!("{}/{}", self.0, Self::MAX)
    }
}

impl fmt::Display for SeverityLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Body location tag.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum BodyArea {
    Palms,
    Soles,
    Face,
    Scalp,
    Underarms,
    Back,
    Chest,
    Groin,
    EntireBody,
    Other(String),
}

impl BodyArea {
    pub fn as_str(&self) -> &str {
        match self {
            Self::Palms => "palms",
            Self::Soles => "soles",
            Self::Face => "face",
            Self::Scalp => "scalp",
            Self::Underarms => "underarms",
            Self::Back => "back",
            Self::Chest => "chest",
            Self::Groin => "groin",
            Self::EntireBody => "entire_body",
            Self::Other(tag) => tag,
        }
    }
}

impl From<String> for BodyArea {
    fn from(tag: String) -> Self {
        match tag.as_str() {
            "palms" => Self::Palms,
            "soles" => Self::Soles,
            "face" => Self::Face,
            "scalp" => Self::Scalp,
            "underarms" => Self::Underarms,
            "back" => Self::Back,
            "chest" => Self::Chest,
            "groin" => Self::Groin,
            "entire_body" => Self::EntireBody,
            _ => Self::Other(tag),
        }
    }
}

impl From<&str> for BodyArea {
    fn from(tag: &str) -> Self {
        Self::from(tag.to_string())
    }
}

impl From<BodyArea> for String {
    fn from(area: BodyArea) -> Self {
        area.as_str().to_string()
    }
}

impl fmt::Display for BodyArea {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A logged sweating episode, normalized from an [`EpisodeRow`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Episode {
    pub id: Uuid,
    pub user_id: Uuid,
    pub datetime: DateTime<Utc>,
    pub severity_level: SeverityLevel,
    pub body_areas: Vec<BodyArea>,
    pub triggers: Vec<Trigger>,
    /// `None` when nothing was written; never `Some("")`.
    pub notes: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl From<EpisodeRow> for Episode {
    /// Never fails. A trigger column that cannot be decoded leaves this
    /// episode with no triggers; every other field is still taken from the row.
    fn from(row: EpisodeRow) -> Self {
        let triggers = match parse_triggers(row.triggers.as_ref()) {
            Ok(triggers) => triggers,
            Err(e) => {
                tracing::warn!(
                    episode_id = %row.id,
                    error = %e,
                    "Malformed triggers column, using empty trigger list"
                );
                Vec::new()
            }
        };

        let severity_level = SeverityLevel(row.severity);
        if !severity_level.is_in_range() {
            tracing::warn!(
                episode_id = %row.id,
                severity = row.severity,
                "Severity outside 1..=5, keeping stored value"
            );
        }

        Self {
            id: row.id,
            user_id: row.user_id,
            datetime: row.date,
            severity_level,
            body_areas: row
                .body_areas
                .unwrap_or_default()
                .into_iter()
                .map(BodyArea::from)
                .collect(),
            triggers,
            notes: row.notes.filter(|n| !n.is_empty()),
            created_at: row.created_at,
        }
    }
}
