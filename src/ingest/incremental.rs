use serde_json::Value;
use sqlx::PgPool;
use tracing::info;

use crate::db::repositories::{persist_message_batch, CheckpointRepository};
use crate::error::{ArchiveError, ArchiveResult};
use crate::http::DiscordClient;

const MAX_BATCH_SIZE: u32 = 100;

/// Walks a channel forward from its checkpoint's `newest_message_id`
/// until caught up. Requires a checkpoint with a non-null newest
/// frontier - callers should run a backfill first on a fresh channel.
/// Returns the number of messages persisted.
pub async fn run_incremental(
    client: &DiscordClient,
    pool: &PgPool,
    channel_id: i64,
    guild_id: i64,
    batch_size: u32,
) -> ArchiveResult<usize> {
    let batch_size = batch_size.min(MAX_BATCH_SIZE);
    let checkpoints = CheckpointRepository::new(pool);

    let Some(checkpoint) = checkpoints.get(channel_id).await? else {
        info!(channel_id, "incremental skipped: backfill needed");
        return Ok(0);
    };
    let Some(mut cursor) = checkpoint.newest_message_id else {
        info!(channel_id, "incremental skipped: backfill needed");
        return Ok(0);
    };

    let mut total = 0usize;

    loop {
        let page: Vec<Value> = client
            .get_messages(channel_id, batch_size, None, Some(cursor))
            .await?;

        if page.is_empty() {
            info!(channel_id, "incremental caught up");
            break;
        }

        let persisted = persist_message_batch(pool, &page, Some(guild_id)).await?;
        total += persisted;

        let max_id = batch_max(&page)?;
        checkpoints.update_newest(channel_id, guild_id, max_id).await?;

        info!(channel_id, newest = max_id, persisted, "incremental batch committed");

        cursor = max_id;

        if page.len() < batch_size as usize {
            info!(channel_id, "incremental caught up");
            break;
        }
    }

    Ok(total)
}

fn batch_max(page: &[Value]) -> ArchiveResult<i64> {
    let mut max = i64::MIN;
    for message in page {
        let id = message
            .get("id")
            .and_then(Value::as_str)
            .and_then(|s| s.parse::<i64>().ok())
            .ok_or_else(|| ArchiveError::DataShape("message missing id".into()))?;
        max = max.max(id);
    }
    Ok(max)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn batch_max_is_computed_explicitly() {
        let page = vec![json!({"id": "1001"}), json!({"id": "1007"}), json!({"id": "1003"})];
        assert_eq!(batch_max(&page).unwrap(), 1007);
    }
}
