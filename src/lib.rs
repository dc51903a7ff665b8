pub mod cache;
pub mod config;
pub mod controllers;
pub mod dashboard;
pub mod database;
pub mod error;
pub mod feed;
pub mod identity;
pub mod middleware;
pub mod models;
pub mod profile;
pub mod redis_client;
pub mod session;

use axum::{routing::get, Router};
use std::sync::Arc;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::info;

use feed::{EventFeedProvider, PgEventFeed};
use profile::{PgProfileLookup, UserProfileLookup};
use session::{DashboardSessions, SessionLimits};

// Shared by every handler
pub struct AppState {
    pub config: config::Config,
    pub sessions: DashboardSessions,
    pub profiles: Arc<dyn UserProfileLookup>,
}

impl AppState {
    /// Connects to Postgres (and Redis when the feed cache is enabled).
    pub async fn new(config: config::Config) -> anyhow::Result<Arc<Self>> {
        let db = database::Database::new(&config.database).await?;
        info!("Database connected");

        db.run_migrations().await?;

        let pg_feed: Arc<dyn EventFeedProvider> = Arc::new(PgEventFeed::new(db.pool.clone()));
        let feed: Arc<dyn EventFeedProvider> = match (&config.redis.url, config.cache.enabled) {
            (Some(url), true) => {
                let redis = redis_client::RedisClient::new(url).await?;
                info!("Redis connected, feed cache ttl {}s", config.cache.feed_ttl_seconds);
                let cache = cache::CacheService::new(redis, config.cache.feed_ttl_seconds);
                Arc::new(cache::CachedEventFeed::new(Arc::new(cache), pg_feed))
            }
            _ => {
                info!("Feed cache disabled");
                pg_feed
            }
        };

        let profiles = Arc::new(PgProfileLookup::new(db.pool.clone()));
        Ok(Self::with_services(config, feed, profiles))
    }

    pub fn with_services(
        config: config::Config,
        feed: Arc<dyn EventFeedProvider>,
        profiles: Arc<dyn UserProfileLookup>,
    ) -> Arc<Self> {
        let limits = SessionLimits::from_config(&config.dashboard);
        Arc::new(Self {
            config,
            sessions: DashboardSessions::new(feed, limits),
            profiles,
        })
    }
}

pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/", get(|| async { "Club Dashboard API v1.0" }))
        .route("/health", get(|| async { "OK" }))
        .nest("/api", controllers::routes())
        .with_state(state)
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
}
