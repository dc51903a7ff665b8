use serde::Serialize;

use crate::models::EventRecord;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct AggregateCounters {
    pub total_events: u64,
    pub total_participants: u64,
    pub total_registered: u64,
    pub total_attended: u64,
}

/// Which slice of the organizer's events the counters describe.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum CounterScope {
    AllClubs,
    SelectedClub,
}

impl CounterScope {
    pub fn label(&self) -> &'static str {
        match self {
            CounterScope::AllClubs => "All your clubs",
            CounterScope::SelectedClub => "For selected club",
        }
    }
}

impl AggregateCounters {
    pub fn from_events<'a, I>(events: I) -> Self
    where
        I: IntoIterator<Item = &'a EventRecord>,
    {
        events.into_iter().fold(Self::default(), |mut acc, event| {
            let stats = &event.participant_stats;
            acc.total_events += 1;
            acc.total_participants += u64::from(stats.total);
            acc.total_registered += u64::from(stats.registered);
            acc.total_attended += u64::from(stats.attended);
            acc
        })
    }
}
