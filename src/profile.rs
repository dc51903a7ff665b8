use async_trait::async_trait;
use sqlx::PgPool;
use tracing::warn;

use crate::error::FeedError;
use crate::models::UserProfile;

#[async_trait]
pub trait UserProfileLookup: Send + Sync {
    async fn lookup(&self, user_id: &str) -> Result<Option<UserProfile>, FeedError>;
}

#[derive(Clone)]
pub struct PgProfileLookup {
    pool: PgPool,
}

impl PgProfileLookup {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl UserProfileLookup for PgProfileLookup {
    async fn lookup(&self, user_id: &str) -> Result<Option<UserProfile>, FeedError> {
        let profile = sqlx::query_as::<_, UserProfile>(
            "SELECT full_name, college FROM users WHERE id = $1",
        )
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(profile)
    }
}

/// Profile lookup that never fails: errors and unknown users yield the default profile.
pub async fn load_profile_or_default(lookup: &dyn UserProfileLookup, user_id: &str) -> UserProfile {
    match lookup.lookup(user_id).await {
        Ok(Some(profile)) => profile,
        Ok(None) => {
            warn!("no profile row for user {}", user_id);
            UserProfile::default()
        }
        Err(e) => {
            warn!("profile lookup for user {} failed: {}", user_id, e);
            UserProfile::default()
        }
    }
}
