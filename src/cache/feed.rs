use async_trait::async_trait;
use redis::{AsyncCommands, RedisResult};
use std::sync::Arc;
use tracing::{debug, warn};

use crate::cache::CacheService;
use crate::error::FeedError;
use crate::feed::{EventFeedProvider, FeedSnapshot};
use crate::identity::Identity;

fn version_key(identity: &Identity) -> String {
    format!("dashboard:feed:{}:version", identity.user_id)
}

fn feed_key(identity: &Identity, version: u64) -> String {
    format!("dashboard:feed:{}:v{}", identity.user_id, version)
}

/// Хранилище снимков ленты с версией на пользователя.
///
/// Версия растет при каждом явном обновлении. Запись под старой версией
/// больше никто не читает, поэтому запоздавший fetch не может вернуть в кеш
/// данные до обновления.
#[async_trait]
pub trait FeedStore: Send + Sync {
    async fn feed_version(&self, identity: &Identity) -> RedisResult<u64>;
    async fn bump_feed_version(&self, identity: &Identity) -> RedisResult<u64>;
    async fn cached_feed(&self, identity: &Identity, version: u64) -> RedisResult<Option<FeedSnapshot>>;
    async fn store_feed(&self, identity: &Identity, version: u64, snapshot: &FeedSnapshot) -> RedisResult<()>;
}

#[async_trait]
impl FeedStore for CacheService {
    // Ключа версии нет - значит обновлений еще не было
    async fn feed_version(&self, identity: &Identity) -> RedisResult<u64> {
        let mut conn = self.redis.conn.clone();
        let version: Option<u64> = conn.get(version_key(identity)).await?;
        Ok(version.unwrap_or(0))
    }

    async fn bump_feed_version(&self, identity: &Identity) -> RedisResult<u64> {
        let mut conn = self.redis.conn.clone();
        conn.incr(version_key(identity), 1u64).await
    }

    // Получить ленту из кеша
    async fn cached_feed(&self, identity: &Identity, version: u64) -> RedisResult<Option<FeedSnapshot>> {
        let mut conn = self.redis.conn.clone();
        let data: Option<String> = conn.get(feed_key(identity, version)).await?;
        match data {
            Some(data) => serde_json::from_str(&data).map(Some).map_err(|_| {
                redis::RedisError::from((redis::ErrorKind::TypeError, "Parse error"))
            }),
            None => Ok(None),
        }
    }

    async fn store_feed(&self, identity: &Identity, version: u64, snapshot: &FeedSnapshot) -> RedisResult<()> {
        let data = serde_json::to_string(snapshot).map_err(|_| {
            redis::RedisError::from((redis::ErrorKind::TypeError, "Serialize error"))
        })?;
        let mut conn = self.redis.conn.clone();
        conn.set_ex(feed_key(identity, version), data, self.feed_ttl_seconds).await
    }
}

/// Кеширующий провайдер поверх другого источника ленты.
///
/// Ошибки Redis только логируются: fetch из-за них не падает.
pub struct CachedEventFeed {
    store: Arc<dyn FeedStore>,
    inner: Arc<dyn EventFeedProvider>,
}

impl CachedEventFeed {
    pub fn new(store: Arc<dyn FeedStore>, inner: Arc<dyn EventFeedProvider>) -> Self {
        Self { store, inner }
    }
}

#[async_trait]
impl EventFeedProvider for CachedEventFeed {
    async fn fetch(&self, identity: &Identity) -> Result<FeedSnapshot, FeedError> {
        // Без версии кешу не доверяем - идем сразу во внутренний источник
        let version = match self.store.feed_version(identity).await {
            Ok(version) => version,
            Err(e) => {
                warn!("feed cache version read failed for {}: {:?}", identity, e);
                return self.inner.fetch(identity).await;
            }
        };

        // Сначала пробуем кеш
        match self.store.cached_feed(identity, version).await {
            Ok(Some(snapshot)) => {
                debug!("feed cache hit for {} (v{})", identity, version);
                return Ok(snapshot);
            }
            Ok(None) => debug!("feed cache miss for {} (v{})", identity, version),
            Err(e) => warn!("feed cache read failed for {}: {:?}", identity, e),
        }

        // Если в кеше нет - идем во внутренний источник
        let snapshot = self.inner.fetch(identity).await?;
        if let Err(e) = self.store.store_feed(identity, version, &snapshot).await {
            warn!("failed to cache feed for {}: {:?}", identity, e);
        }
        Ok(snapshot)
    }

    async fn fetch_fresh(&self, identity: &Identity) -> Result<FeedSnapshot, FeedError> {
        let snapshot = self.inner.fetch_fresh(identity).await?;

        // Новая версия и сразу запись свежего снимка под ней
        match self.store.bump_feed_version(identity).await {
            Ok(version) => {
                if let Err(e) = self.store.store_feed(identity, version, &snapshot).await {
                    warn!("failed to cache refreshed feed for {}: {:?}", identity, e);
                }
            }
            Err(e) => warn!("failed to bump feed cache version for {}: {:?}", identity, e),
        }
        Ok(snapshot)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dashboard::test_support::event;
    use std::collections::HashMap;
    use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
    use std::sync::Mutex;
    use tokio::sync::{oneshot, Notify};

    #[derive(Default)]
    struct MemoryStore {
        versions: Mutex<HashMap<String, u64>>,
        feeds: Mutex<HashMap<(String, u64), FeedSnapshot>>,
        down: AtomicBool,
    }

    impl MemoryStore {
        fn check(&self) -> RedisResult<()> {
            if self.down.load(Ordering::SeqCst) {
                return Err(redis::RedisError::from((redis::ErrorKind::IoError, "store down")));
            }
            Ok(())
        }
    }

    #[async_trait]
    impl FeedStore for MemoryStore {
        async fn feed_version(&self, identity: &Identity) -> RedisResult<u64> {
            self.check()?;
            Ok(self.versions.lock().unwrap().get(&identity.user_id).copied().unwrap_or(0))
        }

        async fn bump_feed_version(&self, identity: &Identity) -> RedisResult<u64> {
            self.check()?;
            let mut versions = self.versions.lock().unwrap();
            let version = versions.entry(identity.user_id.clone()).or_insert(0);
            *version += 1;
            Ok(*version)
        }

        async fn cached_feed(&self, identity: &Identity, version: u64) -> RedisResult<Option<FeedSnapshot>> {
            self.check()?;
            let key = (identity.user_id.clone(), version);
            Ok(self.feeds.lock().unwrap().get(&key).cloned())
        }

        async fn store_feed(&self, identity: &Identity, version: u64, snapshot: &FeedSnapshot) -> RedisResult<()> {
            self.check()?;
            let key = (identity.user_id.clone(), version);
            self.feeds.lock().unwrap().insert(key, snapshot.clone());
            Ok(())
        }
    }

    // Источник, который читает данные в начале fetch и может ждать сигнала
    struct SourceFeed {
        snapshot: Mutex<FeedSnapshot>,
        gate: Mutex<Option<oneshot::Receiver<()>>>,
        started: Notify,
        calls: AtomicUsize,
    }

    impl SourceFeed {
        fn new(tag: &str) -> Self {
            Self {
                snapshot: Mutex::new(snapshot(tag)),
                gate: Mutex::new(None),
                started: Notify::new(),
                calls: AtomicUsize::new(0),
            }
        }

        fn set(&self, tag: &str) {
            *self.snapshot.lock().unwrap() = snapshot(tag);
        }

        fn calls(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl EventFeedProvider for SourceFeed {
        async fn fetch(&self, _identity: &Identity) -> Result<FeedSnapshot, FeedError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            let snapshot = self.snapshot.lock().unwrap().clone();
            let gate = self.gate.lock().unwrap().take();
            self.started.notify_one();
            if let Some(gate) = gate {
                let _ = gate.await;
            }
            Ok(snapshot)
        }
    }

    fn snapshot(tag: &str) -> FeedSnapshot {
        FeedSnapshot {
            events: vec![event(tag, tag, "c1")],
            user_clubs: Vec::new(),
        }
    }

    fn ids(snapshot: &FeedSnapshot) -> Vec<String> {
        snapshot.events.iter().map(|e| e.id.clone()).collect()
    }

    #[test]
    fn keys_are_scoped_per_user_and_version() {
        assert_eq!(feed_key(&Identity::new("u1"), 3), "dashboard:feed:u1:v3");
        assert_eq!(version_key(&Identity::new("u1")), "dashboard:feed:u1:version");
        assert_ne!(feed_key(&Identity::new("u1"), 0), feed_key(&Identity::new("u2"), 0));
    }

    #[tokio::test]
    async fn second_fetch_is_served_from_cache() {
        let source = Arc::new(SourceFeed::new("old"));
        let feed = CachedEventFeed::new(Arc::new(MemoryStore::default()), source.clone());
        let user = Identity::new("u1");

        feed.fetch(&user).await.unwrap();
        source.set("new");
        let cached = feed.fetch(&user).await.unwrap();

        assert_eq!(ids(&cached), ["old"]);
        assert_eq!(source.calls(), 1);
    }

    #[tokio::test]
    async fn fresh_fetch_replaces_cached_snapshot() {
        let source = Arc::new(SourceFeed::new("old"));
        let feed = CachedEventFeed::new(Arc::new(MemoryStore::default()), source.clone());
        let user = Identity::new("u1");

        feed.fetch(&user).await.unwrap();
        source.set("new");

        assert_eq!(ids(&feed.fetch_fresh(&user).await.unwrap()), ["new"]);
        assert_eq!(ids(&feed.fetch(&user).await.unwrap()), ["new"]);
        assert_eq!(source.calls(), 2);
    }

    #[tokio::test]
    async fn late_write_from_older_fetch_is_not_served_after_refresh() {
        let (release, gate) = oneshot::channel();
        let source = Arc::new(SourceFeed::new("old"));
        *source.gate.lock().unwrap() = Some(gate);
        let feed = Arc::new(CachedEventFeed::new(Arc::new(MemoryStore::default()), source.clone()));
        let user = Identity::new("u1");

        let slow = tokio::spawn({
            let feed = feed.clone();
            let user = user.clone();
            async move { feed.fetch(&user).await }
        });
        source.started.notified().await;

        source.set("new");
        assert_eq!(ids(&feed.fetch_fresh(&user).await.unwrap()), ["new"]);

        release.send(()).unwrap();
        assert_eq!(ids(&slow.await.unwrap().unwrap()), ["old"]);

        assert_eq!(ids(&feed.fetch(&user).await.unwrap()), ["new"]);
        assert_eq!(source.calls(), 2);
    }

    #[tokio::test]
    async fn store_faults_fall_through_to_source() {
        let store = Arc::new(MemoryStore::default());
        store.down.store(true, Ordering::SeqCst);
        let source = Arc::new(SourceFeed::new("old"));
        let feed = CachedEventFeed::new(store, source.clone());
        let user = Identity::new("u1");

        assert_eq!(ids(&feed.fetch(&user).await.unwrap()), ["old"]);
        assert_eq!(ids(&feed.fetch_fresh(&user).await.unwrap()), ["old"]);
        assert_eq!(ids(&feed.fetch(&user).await.unwrap()), ["old"]);
        assert_eq!(source.calls(), 3);
    }
}
