use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use tracing::{debug, info, warn};

use super::{EventFeedProvider, FeedSnapshot};
use crate::dashboard::LoadState;
use crate::error::FeedError;
use crate::identity::Identity;

/// Owns the load state of one dashboard session and sequences its fetches.
///
/// Every fetch is stamped with a generation number. A completion whose
/// generation is no longer current is dropped, so a slow response can never
/// overwrite the result of a newer fetch or resurrect a torn-down session.
pub struct FeedController {
    provider: Arc<dyn EventFeedProvider>,
    inner: Mutex<Inner>,
}

struct Inner {
    generation: u64,
    identity: Option<Identity>,
    load: LoadState,
    snapshot: Option<Arc<FeedSnapshot>>,
}

/// Handle for one issued fetch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchTicket {
    generation: u64,
    identity: Identity,
}

impl FetchTicket {
    pub fn identity(&self) -> &Identity {
        &self.identity
    }
}

/// Point-in-time copy of the controller state used for rendering.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FeedView {
    pub identity: Option<Identity>,
    pub load: LoadState,
    /// Last successful snapshot for `identity`; kept while a refresh is loading or failed.
    pub snapshot: Option<Arc<FeedSnapshot>>,
}

/// Marks its generation abandoned unless the fetch finished.
///
/// A request future dropped mid-fetch (client gone, timeout) would otherwise
/// leave the session in `Loading` with nothing left to complete it.
struct InFlight<'a> {
    controller: &'a FeedController,
    generation: Option<u64>,
}

impl InFlight<'_> {
    fn finish(mut self) {
        self.generation = None;
    }
}

impl Drop for InFlight<'_> {
    fn drop(&mut self) {
        if let Some(generation) = self.generation.take() {
            self.controller.abandon(generation);
        }
    }
}

impl FeedController {
    pub fn new(provider: Arc<dyn EventFeedProvider>) -> Self {
        Self {
            provider,
            inner: Mutex::new(Inner {
                generation: 0,
                identity: None,
                load: LoadState::Idle,
                snapshot: None,
            }),
        }
    }

    // Never held across an await. Writers replace whole fields, so a poisoned lock is still consistent.
    fn state(&self) -> MutexGuard<'_, Inner> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn begin(&self, identity: Identity) -> FetchTicket {
        let mut inner = self.state();
        inner.generation += 1;
        if inner.identity.as_ref() != Some(&identity) {
            // never show another user's snapshot
            inner.snapshot = None;
            inner.identity = Some(identity.clone());
        }
        inner.load = LoadState::Loading;
        debug!("feed fetch #{} issued for {}", inner.generation, identity);
        FetchTicket {
            generation: inner.generation,
            identity,
        }
    }

    /// Applies a fetch result. Returns `false` when the ticket is stale and the result was discarded.
    pub fn complete(&self, ticket: FetchTicket, result: Result<FeedSnapshot, FeedError>) -> bool {
        let mut inner = self.state();
        if ticket.generation != inner.generation {
            debug!(
                "discarding stale feed result #{} for {} (current #{})",
                ticket.generation, ticket.identity, inner.generation
            );
            return false;
        }

        match result {
            Ok(snapshot) => {
                info!(
                    "feed ready for {}: {} events, {} clubs",
                    ticket.identity,
                    snapshot.events.len(),
                    snapshot.user_clubs.len()
                );
                inner.snapshot = Some(Arc::new(snapshot));
                inner.load = LoadState::Ready;
            }
            Err(e) => {
                warn!("feed fetch for {} failed: {}", ticket.identity, e);
                inner.load = LoadState::Failed {
                    message: e.user_message(),
                };
            }
        }
        true
    }

    // The fetch for `generation` will never complete. If it is still the
    // current one, fall back to Idle so the next ensure_loaded fetches again.
    fn abandon(&self, generation: u64) {
        let mut inner = self.state();
        if inner.generation != generation || !inner.load.is_loading() {
            return;
        }
        inner.generation += 1;
        inner.load = LoadState::Idle;
        debug!("feed fetch #{} abandoned before completion", generation);
    }

    pub async fn load(&self, identity: Identity) -> FeedView {
        self.run(identity, false).await
    }

    async fn run(&self, identity: Identity, fresh: bool) -> FeedView {
        let ticket = self.begin(identity);
        let in_flight = InFlight {
            controller: self,
            generation: Some(ticket.generation),
        };
        let result = if fresh {
            self.provider.fetch_fresh(ticket.identity()).await
        } else {
            self.provider.fetch(ticket.identity()).await
        };
        in_flight.finish();
        self.complete(ticket, result);
        self.current()
    }

    /// Loads only when nothing was requested yet for `identity`.
    ///
    /// A `Failed` state is returned as is; leaving it requires [`retry`](Self::retry).
    pub async fn ensure_loaded(&self, identity: Identity) -> FeedView {
        {
            let inner = self.state();
            if inner.identity.as_ref() == Some(&identity) && inner.load != LoadState::Idle {
                return inner.view();
            }
        }
        self.load(identity).await
    }

    /// User-triggered re-fetch that bypasses anything the provider memoized.
    pub async fn refresh(&self, identity: Identity) -> FeedView {
        info!("refreshing feed for {}", identity);
        self.run(identity, true).await
    }

    /// [`refresh`](Self::refresh) for the current identity. `None` when there is no identity.
    pub async fn retry(&self) -> Option<FeedView> {
        let identity = self.state().identity.clone()?;
        Some(self.refresh(identity).await)
    }

    /// Teardown: in-flight fetches become stale and the state returns to `Idle`.
    pub fn reset(&self) {
        let mut inner = self.state();
        inner.generation += 1;
        inner.identity = None;
        inner.snapshot = None;
        inner.load = LoadState::Idle;
    }

    pub fn current(&self) -> FeedView {
        self.state().view()
    }
}

impl Inner {
    fn view(&self) -> FeedView {
        FeedView {
            identity: self.identity.clone(),
            load: self.load.clone(),
            snapshot: self.snapshot.clone(),
        }
    }
}
