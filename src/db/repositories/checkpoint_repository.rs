use sqlx::PgPool;

use crate::error::ArchiveResult;
use crate::models::IngestCheckpoint;

/// CRUD for per-channel sync progress. Every mutating operation is a
/// single round trip that also refreshes `last_synced_at`; the guarded
/// assignments (`update_oldest`/`update_newest`) enforce invariants I2/I3
/// in the `WHERE` clause rather than by reading-then-comparing in Rust,
/// so concurrent callers for different channels never race on the same
/// invariant check.
pub struct CheckpointRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> CheckpointRepository<'a> {
    pub fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    pub async fn get(&self, channel_id: i64) -> ArchiveResult<Option<IngestCheckpoint>> {
        let row = sqlx::query_as::<_, IngestCheckpoint>(
            "SELECT channel_id, guild_id, oldest_message_id, backfill_complete,
                    newest_message_id, last_synced_at, created_at
             FROM ingest_checkpoints WHERE channel_id = $1",
        )
        .bind(channel_id)
        .fetch_optional(self.pool)
        .await?;
        Ok(row)
    }

    pub async fn create_or_get(&self, channel_id: i64, guild_id: i64) -> ArchiveResult<IngestCheckpoint> {
        let row = sqlx::query_as::<_, IngestCheckpoint>(
            "INSERT INTO ingest_checkpoints (channel_id, guild_id, backfill_complete)
             VALUES ($1, $2, FALSE)
             ON CONFLICT (channel_id) DO UPDATE SET channel_id = ingest_checkpoints.channel_id
             RETURNING channel_id, guild_id, oldest_message_id, backfill_complete,
                       newest_message_id, last_synced_at, created_at",
        )
        .bind(channel_id)
        .bind(guild_id)
        .fetch_one(self.pool)
        .await?;
        Ok(row)
    }

    /// Decreases `oldest_message_id` (assigns iff currently null or `id`
    /// is smaller). On the very first batch for a channel (both
    /// frontiers still null), also seeds `newest_message_id` to `id`.
    pub async fn update_oldest(&self, channel_id: i64, guild_id: i64, id: i64) -> ArchiveResult<()> {
        self.create_or_get(channel_id, guild_id).await?;
        sqlx::query(
            "UPDATE ingest_checkpoints SET
                oldest_message_id = LEAST(COALESCE(oldest_message_id, $2), $2),
                newest_message_id = CASE
                    WHEN oldest_message_id IS NULL AND newest_message_id IS NULL THEN $2
                    ELSE newest_message_id
                END,
                last_synced_at = now()
             WHERE channel_id = $1",
        )
        .bind(channel_id)
        .bind(id)
        .execute(self.pool)
        .await?;
        Ok(())
    }

    /// Increases `newest_message_id` (assigns iff currently null or `id`
    /// is larger).
    pub async fn update_newest(&self, channel_id: i64, guild_id: i64, id: i64) -> ArchiveResult<()> {
        self.create_or_get(channel_id, guild_id).await?;
        sqlx::query(
            "UPDATE ingest_checkpoints SET
                newest_message_id = GREATEST(COALESCE(newest_message_id, $2), $2),
                last_synced_at = now()
             WHERE channel_id = $1",
        )
        .bind(channel_id)
        .bind(id)
        .execute(self.pool)
        .await?;
        Ok(())
    }

    /// Combines both guarded assignments in one call; either frontier
    /// may be omitted (a no-op for that side).
    pub async fn update_bounds(
        &self,
        channel_id: i64,
        guild_id: i64,
        oldest: Option<i64>,
        newest: Option<i64>,
    ) -> ArchiveResult<()> {
        if let Some(id) = oldest {
            self.update_oldest(channel_id, guild_id, id).await?;
        }
        if let Some(id) = newest {
            self.update_newest(channel_id, guild_id, id).await?;
        }
        Ok(())
    }

    pub async fn mark_backfill_complete(&self, channel_id: i64) -> ArchiveResult<()> {
        sqlx::query(
            "UPDATE ingest_checkpoints SET backfill_complete = TRUE, last_synced_at = now()
             WHERE channel_id = $1",
        )
        .bind(channel_id)
        .execute(self.pool)
        .await?;
        Ok(())
    }

    pub async fn is_backfill_complete(&self, channel_id: i64) -> ArchiveResult<bool> {
        let complete: Option<bool> =
            sqlx::query_scalar("SELECT backfill_complete FROM ingest_checkpoints WHERE channel_id = $1")
                .bind(channel_id)
                .fetch_optional(self.pool)
                .await?;
        Ok(complete.unwrap_or(false))
    }

    pub async fn get_incomplete_backfills(&self, guild_id: i64) -> ArchiveResult<Vec<i64>> {
        let ids: Vec<i64> = sqlx::query_scalar(
            "SELECT channel_id FROM ingest_checkpoints
             WHERE guild_id = $1 AND backfill_complete = FALSE",
        )
        .bind(guild_id)
        .fetch_all(self.pool)
        .await?;
        Ok(ids)
    }
}
