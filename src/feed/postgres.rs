use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{FromRow, PgPool};
use tracing::debug;

use super::{EventFeedProvider, FeedSnapshot};
use crate::error::FeedError;
use crate::identity::Identity;
use crate::models::{ClubMembership, EventRecord, EventStatus, ParticipantStats};

/// Лента событий из таблиц `events` / `event_registrations`.
#[derive(Clone)]
pub struct PgEventFeed {
    pool: PgPool,
}

// Строка из БД до разбора статуса и счетчиков
#[derive(Debug, FromRow)]
struct EventRow {
    id: String,
    title: String,
    description: Option<String>,
    location: Option<String>,
    start_date: DateTime<Utc>,
    club_id: String,
    status: String,
    total: i64,
    registered: i64,
    cancelled: i64,
    attended: i64,
}

impl TryFrom<EventRow> for EventRecord {
    type Error = FeedError;

    fn try_from(row: EventRow) -> Result<Self, Self::Error> {
        let status = row
            .status
            .parse::<EventStatus>()
            .map_err(|e| FeedError::Decode(format!("event {}: {}", row.id, e)))?;
        let count = |value: i64, field: &str| {
            u32::try_from(value)
                .map_err(|_| FeedError::Decode(format!("event {}: {} out of range", row.id, field)))
        };
        let participant_stats = ParticipantStats {
            total: count(row.total, "total")?,
            registered: count(row.registered, "registered")?,
            cancelled: count(row.cancelled, "cancelled")?,
            attended: count(row.attended, "attended")?,
        };

        Ok(EventRecord {
            id: row.id,
            title: row.title,
            description: row.description,
            location: row.location,
            start_date: row.start_date,
            club_id: row.club_id,
            status,
            participant_stats,
        })
    }
}

impl PgEventFeed {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    async fn load_clubs(&self, user_id: &str) -> Result<Vec<ClubMembership>, sqlx::Error> {
        sqlx::query_as::<_, ClubMembership>(
            "SELECT c.id, c.name
             FROM clubs c
             JOIN club_admins a ON a.club_id = c.id
             WHERE a.user_id = $1
             ORDER BY c.name, c.id",
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await
    }

    async fn load_events(&self, user_id: &str) -> Result<Vec<EventRow>, sqlx::Error> {
        // Статистика участников считается одним проходом по регистрациям
        sqlx::query_as::<_, EventRow>(
            r#"
            SELECT
                e.id,
                e.title,
                e.description,
                e.location,
                e.start_date,
                e.club_id,
                e.status,
                COUNT(r.id) AS total,
                COUNT(r.id) FILTER (WHERE r.status = 'registered') AS registered,
                COUNT(r.id) FILTER (WHERE r.status = 'cancelled') AS cancelled,
                COUNT(r.id) FILTER (WHERE r.status = 'attended') AS attended
            FROM events e
            LEFT JOIN event_registrations r ON r.event_id = e.id
            WHERE e.created_by = $1
               OR e.club_id IN (SELECT club_id FROM club_admins WHERE user_id = $1)
            GROUP BY e.id
            ORDER BY e.start_date, e.id
            "#,
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await
    }
}

#[async_trait]
impl EventFeedProvider for PgEventFeed {
    async fn fetch(&self, identity: &Identity) -> Result<FeedSnapshot, FeedError> {
        let (user_clubs, rows) = futures::try_join!(
            self.load_clubs(&identity.user_id),
            self.load_events(&identity.user_id)
        )?;

        let events = rows
            .into_iter()
            .map(EventRecord::try_from)
            .collect::<Result<Vec<_>, _>>()?;

        debug!(
            "loaded {} events and {} clubs for {} from database",
            events.len(),
            user_clubs.len(),
            identity
        );
        Ok(FeedSnapshot { events, user_clubs })
    }
}
