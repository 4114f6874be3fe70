//! Episode storage backend.

use async_trait::async_trait;
use sqlx::PgPool;
use uuid::Uuid;

use crate::error::SweatError;
use crate::models::EpisodeRow;

/// Read access to stored episode rows.
#[async_trait]
pub trait EpisodeStore: Send + Sync {
    /// All rows owned by `user_id`, most recently created first.
    async fn fetch_rows(&self, user_id: Uuid) -> Result<Vec<EpisodeRow>, SweatError>;
}

/// [`EpisodeStore`] over the Postgres `episodes` table.
#[derive(Clone)]
pub struct PgEpisodeStore {
    pool: PgPool,
}

impl PgEpisodeStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl EpisodeStore for PgEpisodeStore {
    async fn fetch_rows(&self, user_id: Uuid) -> Result<Vec<EpisodeRow>, SweatError> {
        let rows = sqlx::query_as::<_, EpisodeRow>(
            r#"
            SELECT id, user_id, date, severity, body_areas, triggers, notes, created_at
            FROM episodes
            WHERE user_id = $1
            ORDER BY created_at DESC
            "#,
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows)
    }
}
