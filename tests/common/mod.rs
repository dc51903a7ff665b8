//! Shared fixtures for the integration tests.
#![allow(dead_code)]

use async_trait::async_trait;
use chrono::{TimeZone, Utc};
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;

use club_dashboard::config::Config;
use club_dashboard::error::FeedError;
use club_dashboard::feed::{EventFeedProvider, FeedSnapshot};
use club_dashboard::identity::Identity;
use club_dashboard::models::{ClubMembership, EventRecord, EventStatus, ParticipantStats, UserProfile};
use club_dashboard::profile::UserProfileLookup;
use club_dashboard::AppState;

pub fn event(id: &str, title: &str, club_id: &str, stats: [u32; 4]) -> EventRecord {
    let [total, registered, cancelled, attended] = stats;
    EventRecord {
        id: id.to_string(),
        title: title.to_string(),
        description: None,
        location: None,
        start_date: Utc.with_ymd_and_hms(2024, 12, 20, 18, 0, 0).unwrap(),
        club_id: club_id.to_string(),
        status: EventStatus::Upcoming,
        participant_stats: ParticipantStats { total, registered, cancelled, attended },
    }
}

pub fn club(id: &str, name: &str) -> ClubMembership {
    ClubMembership { id: id.to_string(), name: name.to_string() }
}

/// In-memory feed keyed by user id, with a switch to simulate backend outages.
#[derive(Default)]
pub struct MemoryFeed {
    pub snapshots: HashMap<String, FeedSnapshot>,
    pub failing: AtomicBool,
    pub calls: AtomicUsize,
    pub fresh_calls: AtomicUsize,
}

impl MemoryFeed {
    pub fn with(user_id: &str, snapshot: FeedSnapshot) -> Self {
        let mut feed = Self::default();
        feed.snapshots.insert(user_id.to_string(), snapshot);
        feed
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn set_failing(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }
}

#[async_trait]
impl EventFeedProvider for MemoryFeed {
    async fn fetch(&self, identity: &Identity) -> Result<FeedSnapshot, FeedError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if self.failing.load(Ordering::SeqCst) {
            return Err(FeedError::Decode("backend unavailable".to_string()));
        }
        Ok(self.snapshots.get(&identity.user_id).cloned().unwrap_or_default())
    }

    async fn fetch_fresh(&self, identity: &Identity) -> Result<FeedSnapshot, FeedError> {
        self.fresh_calls.fetch_add(1, Ordering::SeqCst);
        self.fetch(identity).await
    }
}

#[derive(Default)]
pub struct MemoryProfiles {
    pub profiles: HashMap<String, UserProfile>,
}

#[async_trait]
impl UserProfileLookup for MemoryProfiles {
    async fn lookup(&self, user_id: &str) -> Result<Option<UserProfile>, FeedError> {
        Ok(self.profiles.get(user_id).cloned())
    }
}

pub fn test_config() -> Config {
    Config::from_lookup(|name| match name {
        "DATABASE_URL" => Some("postgres://localhost/club_dashboard_test".to_string()),
        "ENABLE_FEED_CACHE" => Some("false".to_string()),
        "DASHBOARD_MAX_SEARCH_LEN" => Some("50".to_string()),
        "DASHBOARD_MAX_SESSIONS" => Some("8".to_string()),
        _ => None,
    })
    .unwrap()
}

pub fn test_state(feed: Arc<MemoryFeed>, profiles: MemoryProfiles) -> Arc<AppState> {
    AppState::with_services(test_config(), feed, Arc::new(profiles))
}
