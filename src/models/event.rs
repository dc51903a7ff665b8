use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EventStatus {
    Upcoming,
    Ongoing,
    Completed,
}

impl EventStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            EventStatus::Upcoming => "upcoming",
            EventStatus::Ongoing => "ongoing",
            EventStatus::Completed => "completed",
        }
    }
}

impl fmt::Display for EventStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown event status {0:?}")]
pub struct UnknownStatus(pub String);

impl FromStr for EventStatus {
    type Err = UnknownStatus;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "upcoming" => Ok(EventStatus::Upcoming),
            "ongoing" => Ok(EventStatus::Ongoing),
            "completed" => Ok(EventStatus::Completed),
            other => Err(UnknownStatus(other.to_string())),
        }
    }
}

/// Per-event registration outcome counts.
///
/// `total == registered + cancelled + attended` is expected from the data
/// source but not enforced here.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParticipantStats {
    pub total: u32,
    pub registered: u32,
    pub cancelled: u32,
    pub attended: u32,
}

impl ParticipantStats {
    pub fn is_consistent(&self) -> bool {
        u64::from(self.total)
            == u64::from(self.registered) + u64::from(self.cancelled) + u64::from(self.attended)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EventRecord {
    pub id: String,
    pub title: String,
    pub description: Option<String>,
    pub location: Option<String>,
    pub start_date: DateTime<Utc>,
    pub club_id: String,
    pub status: EventStatus,
    pub participant_stats: ParticipantStats,
}

impl EventRecord {
    pub const LOCATION_FALLBACK: &'static str = "Location TBD";

    pub fn location_label(&self) -> &str {
        self.location
            .as_deref()
            .filter(|l| !l.trim().is_empty())
            .unwrap_or(Self::LOCATION_FALLBACK)
    }
}
