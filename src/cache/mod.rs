use crate::redis_client::RedisClient;

pub mod feed;

pub use feed::{CachedEventFeed, FeedStore};

#[derive(Clone)]
pub struct CacheService {
    redis: RedisClient,
    feed_ttl_seconds: u64,
}

impl CacheService {
    pub fn new(redis: RedisClient, feed_ttl_seconds: u64) -> Self {
        Self { redis, feed_ttl_seconds }
    }
}
