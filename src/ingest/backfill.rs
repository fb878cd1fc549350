use serde_json::Value;
use sqlx::PgPool;
use tracing::info;

use crate::db::repositories::{persist_message_batch, CheckpointRepository};
use crate::error::ArchiveResult;
use crate::http::DiscordClient;

const MAX_BATCH_SIZE: u32 = 100;

/// Walks a channel backward from its checkpoint's `oldest_message_id`
/// (or the tail of history on a fresh channel) until the server returns
/// an empty or short page. Returns the number of messages persisted.
///
/// A `403`/`401` from the message endpoint is the caller's job to catch
/// and soft-skip - this function propagates every error it sees.
pub async fn run_backfill(
    client: &DiscordClient,
    pool: &PgPool,
    channel_id: i64,
    guild_id: i64,
    batch_size: u32,
) -> ArchiveResult<usize> {
    let batch_size = batch_size.min(MAX_BATCH_SIZE);
    let checkpoints = CheckpointRepository::new(pool);

    let existing = checkpoints.get(channel_id).await?;
    let mut cursor = existing.and_then(|c| c.oldest_message_id);
    let mut total = 0usize;

    loop {
        let page: Vec<Value> = client.get_messages(channel_id, batch_size, cursor, None).await?;

        if page.is_empty() {
            checkpoints.mark_backfill_complete(channel_id).await?;
            info!(channel_id, "backfill complete: empty page");
            break;
        }

        let persisted = persist_message_batch(pool, &page, Some(guild_id)).await?;
        total += persisted;

        let ids = batch_ids(&page)?;

        // `update_oldest` itself seeds `newest_message_id` to the same
        // value when both frontiers are still null, i.e. on the very
        // first batch this channel has ever seen.
        checkpoints.update_oldest(channel_id, guild_id, ids.min).await?;

        info!(
            channel_id,
            oldest = ids.min,
            persisted,
            "backfill batch committed"
        );

        cursor = Some(ids.min);

        if page.len() < batch_size as usize {
            checkpoints.mark_backfill_complete(channel_id).await?;
            info!(channel_id, "backfill complete: short page");
            break;
        }
    }

    Ok(total)
}

#[allow(dead_code)]
struct BatchIds {
    min: i64,
    max: i64,
}

/// Computes min/max explicitly rather than trusting server ordering -
/// the server returns newest-first, but that is not load-bearing here.
fn batch_ids(page: &[Value]) -> ArchiveResult<BatchIds> {
    use crate::error::ArchiveError;

    let mut min = i64::MAX;
    let mut max = i64::MIN;
    for message in page {
        let id = message
            .get("id")
            .and_then(Value::as_str)
            .and_then(|s| s.parse::<i64>().ok())
            .ok_or_else(|| ArchiveError::DataShape("message missing id".into()))?;
        min = min.min(id);
        max = max.max(id);
    }
    Ok(BatchIds { min, max })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn batch_ids_are_computed_explicitly_not_positionally() {
        let page = vec![json!({"id": "900"}), json!({"id": "1000"}), json!({"id": "950"})];
        let ids = batch_ids(&page).unwrap();
        assert_eq!(ids.min, 900);
        assert_eq!(ids.max, 1000);
    }

    #[test]
    fn batch_ids_rejects_missing_id() {
        let page = vec![json!({"content": "no id here"})];
        assert!(batch_ids(&page).is_err());
    }
}
