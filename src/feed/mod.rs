//! Event feed: where organizer events come from and how fetches are sequenced.

pub mod controller;
pub mod postgres;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::FeedError;
use crate::identity::Identity;
use crate::models::{ClubMembership, EventRecord};

pub use controller::{FeedController, FeedView, FetchTicket};
pub use postgres::PgEventFeed;

/// Result of one successful feed fetch.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FeedSnapshot {
    pub events: Vec<EventRecord>,
    pub user_clubs: Vec<ClubMembership>,
}

#[async_trait]
pub trait EventFeedProvider: Send + Sync {
    /// Events the identity administers, directly or through club membership.
    async fn fetch(&self, identity: &Identity) -> Result<FeedSnapshot, FeedError>;

    /// Like [`fetch`](Self::fetch) but never served from memoized data. Used for
    /// user-triggered retries; a layer that memoizes replaces its entry with the result.
    async fn fetch_fresh(&self, identity: &Identity) -> Result<FeedSnapshot, FeedError> {
        self.fetch(identity).await
    }
}
