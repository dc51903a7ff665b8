use std::collections::HashMap;
use std::fmt;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;
use tokio::time::Instant;
use tracing::{debug, info};

use crate::config::DashboardConfig;
use crate::feed::{EventFeedProvider, FeedController};
use crate::identity::Identity;

/// One dashboard session, always owned by the authenticated caller.
///
/// The client-chosen session name only separates sessions of the same user;
/// it can never address a session of somebody else.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct SessionKey {
    pub owner: Identity,
    pub session: Option<String>,
}

impl SessionKey {
    pub fn new(owner: Identity, session: Option<String>) -> Self {
        Self { owner, session }
    }
}

impl fmt::Display for SessionKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.session {
            Some(session) => write!(f, "{}/{}", self.owner, session),
            None => write!(f, "{}", self.owner),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SessionLimits {
    pub max_sessions: usize,
    pub idle_timeout: Duration,
}

impl SessionLimits {
    pub fn from_config(config: &DashboardConfig) -> Self {
        Self {
            max_sessions: config.max_sessions.max(1),
            idle_timeout: Duration::from_secs(config.session_idle_seconds),
        }
    }
}

impl Default for SessionLimits {
    fn default() -> Self {
        Self {
            max_sessions: 10_000,
            idle_timeout: Duration::from_secs(30 * 60),
        }
    }
}

struct Entry {
    controller: Arc<FeedController>,
    last_seen: Instant,
}

/// Feed controllers keyed by dashboard session.
///
/// Bounded: sessions idle for longer than the timeout are dropped, and at
/// capacity the least recently used one makes room for a new session.
pub struct DashboardSessions {
    provider: Arc<dyn EventFeedProvider>,
    limits: SessionLimits,
    entries: Mutex<HashMap<SessionKey, Entry>>,
}

impl DashboardSessions {
    pub fn new(provider: Arc<dyn EventFeedProvider>, limits: SessionLimits) -> Self {
        Self {
            provider,
            limits,
            entries: Mutex::new(HashMap::new()),
        }
    }

    fn entries(&self) -> MutexGuard<'_, HashMap<SessionKey, Entry>> {
        self.entries.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn controller(&self, key: &SessionKey) -> Arc<FeedController> {
        let now = Instant::now();
        let mut entries = self.entries();
        if let Some(entry) = entries.get_mut(key) {
            entry.last_seen = now;
            return entry.controller.clone();
        }

        self.make_room(&mut entries, now);
        let controller = Arc::new(FeedController::new(self.provider.clone()));
        entries.insert(
            key.clone(),
            Entry {
                controller: controller.clone(),
                last_seen: now,
            },
        );
        controller
    }

    // Evicted controllers are only forgotten: a request still holding one finishes normally.
    fn make_room(&self, entries: &mut HashMap<SessionKey, Entry>, now: Instant) {
        let idle_timeout = self.limits.idle_timeout;
        let before = entries.len();
        entries.retain(|_, entry| now.duration_since(entry.last_seen) < idle_timeout);
        if entries.len() < before {
            debug!("dropped {} idle dashboard sessions", before - entries.len());
        }

        while entries.len() >= self.limits.max_sessions {
            let oldest = entries
                .iter()
                .min_by_key(|(_, entry)| entry.last_seen)
                .map(|(key, _)| key.clone());
            let Some(oldest) = oldest else { break };
            entries.remove(&oldest);
            info!("dashboard session {} evicted, registry at capacity", oldest);
        }
    }

    /// Tears the session down. Returns `false` if it did not exist.
    pub fn end(&self, key: &SessionKey) -> bool {
        let removed = self.entries().remove(key);
        match removed {
            Some(entry) => {
                entry.controller.reset();
                info!("dashboard session {} ended", key);
                true
            }
            None => false,
        }
    }

    pub fn len(&self) -> usize {
        self.entries().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
