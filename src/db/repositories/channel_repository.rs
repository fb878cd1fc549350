use std::collections::HashSet;

use sqlx::{PgConnection, PgPool};

use crate::error::ArchiveResult;
use crate::models::Channel;

/// Upserts one channel, overwriting a narrow "currently visible" column
/// set on conflict (name, topic, position, last_message_id,
/// thread_metadata, message_count, raw) - not a full-column overwrite.
/// Most columns are insert-only until a later conflict happens to touch
/// them via one of these fields.
async fn upsert_channel(conn: &mut PgConnection, channel: &Channel) -> ArchiveResult<()> {
    sqlx::query(
        "INSERT INTO channels (
            channel_id, guild_id, type, name, topic, position, permission_overwrites,
            parent_id, nsfw, last_message_id, bitrate, user_limit, rtc_region,
            video_quality_mode, rate_limit_per_user, owner_id, thread_metadata,
            message_count, member_count, total_message_sent,
            default_auto_archive_duration, default_thread_rate_limit_per_user,
            available_tags, applied_tags, default_reaction_emoji, default_sort_order,
            default_forum_layout, flags, recipients, icon, application_id, managed,
            last_pin_timestamp, raw
         ) VALUES (
            $1,$2,$3,$4,$5,$6,$7,$8,$9,$10,$11,$12,$13,$14,$15,$16,$17,$18,$19,$20,
            $21,$22,$23,$24,$25,$26,$27,$28,$29,$30,$31,$32,$33,$34
         )
         ON CONFLICT (channel_id) DO UPDATE SET
            name = EXCLUDED.name,
            topic = EXCLUDED.topic,
            position = EXCLUDED.position,
            last_message_id = EXCLUDED.last_message_id,
            thread_metadata = EXCLUDED.thread_metadata,
            message_count = EXCLUDED.message_count,
            raw = EXCLUDED.raw,
            updated_at = now()",
    )
    .bind(channel.channel_id)
    .bind(channel.guild_id)
    .bind(channel.channel_type)
    .bind(&channel.name)
    .bind(&channel.topic)
    .bind(channel.position)
    .bind(&channel.permission_overwrites)
    .bind(None::<i64>) // parent_id cleared on pass 1, see upsert_channels
    .bind(channel.nsfw)
    .bind(channel.last_message_id)
    .bind(channel.bitrate)
    .bind(channel.user_limit)
    .bind(&channel.rtc_region)
    .bind(channel.video_quality_mode)
    .bind(channel.rate_limit_per_user)
    .bind(channel.owner_id)
    .bind(&channel.thread_metadata)
    .bind(channel.message_count)
    .bind(channel.member_count)
    .bind(channel.total_message_sent)
    .bind(channel.default_auto_archive_duration)
    .bind(channel.default_thread_rate_limit_per_user)
    .bind(&channel.available_tags)
    .bind(&channel.applied_tags)
    .bind(&channel.default_reaction_emoji)
    .bind(channel.default_sort_order)
    .bind(channel.default_forum_layout)
    .bind(channel.flags)
    .bind(&channel.recipients)
    .bind(&channel.icon)
    .bind(channel.application_id)
    .bind(channel.managed)
    .bind(channel.last_pin_timestamp)
    .bind(&channel.raw)
    .execute(&mut *conn)
    .await?;

    Ok(())
}

async fn update_channel_parent(conn: &mut PgConnection, channel_id: i64, parent_id: i64) -> ArchiveResult<()> {
    sqlx::query("UPDATE channels SET parent_id = $2 WHERE channel_id = $1")
        .bind(channel_id)
        .bind(parent_id)
        .execute(&mut *conn)
        .await?;
    Ok(())
}

/// Two-pass bulk upsert. Pass 1 inserts every channel with `parent_id`
/// forced to NULL, so a channel never references a parent row that
/// hasn't landed yet within the same batch. Pass 2 fills in `parent_id`
/// for any channel whose parent is in `known_parent_ids` (typically every
/// channel_id already present across the whole batch plus the database).
pub async fn upsert_channels(pool: &PgPool, channels: &[Channel], known_parent_ids: &HashSet<i64>) -> ArchiveResult<()> {
    if channels.is_empty() {
        return Ok(());
    }

    let mut tx = pool.begin().await?;
    for channel in channels {
        upsert_channel(&mut tx, channel).await?;
    }
    tx.commit().await?;

    let mut tx = pool.begin().await?;
    for channel in channels {
        if let Some(parent_id) = channel.parent_id {
            if known_parent_ids.contains(&parent_id) {
                update_channel_parent(&mut tx, channel.channel_id, parent_id).await?;
            }
        }
    }
    tx.commit().await?;

    Ok(())
}
