use std::collections::HashSet;

use serde_json::Value;
use sqlx::{PgConnection, PgPool};

use crate::error::ArchiveResult;
use crate::mappers::{extract_users_from_message, map_messages};
use crate::models::{Attachment, Message, Reaction, User};
use crate::sanitize::sanitize_value;

pub async fn get_channel_message_count(pool: &PgPool, channel_id: i64) -> ArchiveResult<i64> {
    let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM messages WHERE channel_id = $1")
        .bind(channel_id)
        .fetch_one(pool)
        .await?;
    Ok(count)
}

/// Deduplicates by `user_id` and upserts, overwriting every display
/// column on conflict. Users are the one entity upserted in full - there
/// is no narrow-column rule here because every field is "latest state".
pub async fn upsert_users(conn: &mut PgConnection, users: &[User]) -> ArchiveResult<()> {
    if users.is_empty() {
        return Ok(());
    }

    let mut seen = HashSet::new();
    let unique: Vec<&User> = users
        .iter()
        .filter(|u| seen.insert(u.user_id))
        .collect();

    for user in unique {
        sqlx::query(
            "INSERT INTO users (
                user_id, username, discriminator, global_name, avatar,
                avatar_decoration_data, banner, accent_color, bot, system,
                public_flags, premium_type, raw
             ) VALUES ($1,$2,$3,$4,$5,$6,$7,$8,$9,$10,$11,$12,$13)
             ON CONFLICT (user_id) DO UPDATE SET
                username = EXCLUDED.username,
                discriminator = EXCLUDED.discriminator,
                global_name = EXCLUDED.global_name,
                avatar = EXCLUDED.avatar,
                avatar_decoration_data = EXCLUDED.avatar_decoration_data,
                banner = EXCLUDED.banner,
                accent_color = EXCLUDED.accent_color,
                bot = EXCLUDED.bot,
                system = EXCLUDED.system,
                public_flags = EXCLUDED.public_flags,
                premium_type = EXCLUDED.premium_type,
                raw = EXCLUDED.raw,
                updated_at = now()",
        )
        .bind(user.user_id)
        .bind(&user.username)
        .bind(&user.discriminator)
        .bind(&user.global_name)
        .bind(&user.avatar)
        .bind(&user.avatar_decoration_data)
        .bind(&user.banner)
        .bind(user.accent_color)
        .bind(user.bot)
        .bind(user.system)
        .bind(user.public_flags)
        .bind(user.premium_type)
        .bind(&user.raw)
        .execute(&mut *conn)
        .await?;
    }

    Ok(())
}

/// Append-only: inserts are skipped on conflict rather than overwritten,
/// since a message's content at archival time is what the archive keeps.
pub async fn insert_messages(conn: &mut PgConnection, messages: &[Message]) -> ArchiveResult<()> {
    if messages.is_empty() {
        return Ok(());
    }

    for m in messages {
        sqlx::query(
            "INSERT INTO messages (
                message_id, channel_id, author_id, guild_id, content, created_at,
                edited_timestamp, type, tts, flags, pinned, mention_everyone,
                mentions, mention_roles, mention_channels, webhook_id, application,
                application_id, message_reference, referenced_message_id,
                message_snapshots, interaction_metadata, thread, embeds, components,
                sticker_items, poll, activity, call, role_subscription_data, raw
             ) VALUES (
                $1,$2,$3,$4,$5,$6,$7,$8,$9,$10,$11,$12,$13,$14,$15,$16,$17,$18,$19,
                $20,$21,$22,$23,$24,$25,$26,$27,$28,$29,$30,$31
             )
             ON CONFLICT (message_id) DO NOTHING",
        )
        .bind(m.message_id)
        .bind(m.channel_id)
        .bind(m.author_id)
        .bind(m.guild_id)
        .bind(&m.content)
        .bind(m.created_at)
        .bind(m.edited_timestamp)
        .bind(m.message_type)
        .bind(m.tts)
        .bind(m.flags)
        .bind(m.pinned)
        .bind(m.mention_everyone)
        .bind(&m.mentions)
        .bind(&m.mention_roles)
        .bind(&m.mention_channels)
        .bind(m.webhook_id)
        .bind(&m.application)
        .bind(m.application_id)
        .bind(&m.message_reference)
        .bind(m.referenced_message_id)
        .bind(&m.message_snapshots)
        .bind(&m.interaction_metadata)
        .bind(&m.thread)
        .bind(&m.embeds)
        .bind(&m.components)
        .bind(&m.sticker_items)
        .bind(&m.poll)
        .bind(&m.activity)
        .bind(&m.call)
        .bind(&m.role_subscription_data)
        .bind(&m.raw)
        .execute(&mut *conn)
        .await?;
    }

    Ok(())
}

pub async fn insert_attachments(conn: &mut PgConnection, attachments: &[Attachment]) -> ArchiveResult<()> {
    if attachments.is_empty() {
        return Ok(());
    }

    for a in attachments {
        sqlx::query(
            "INSERT INTO attachments (
                attachment_id, message_id, filename, description, content_type,
                size, url, proxy_url, height, width, duration_secs, waveform,
                ephemeral, flags, title, raw
             ) VALUES ($1,$2,$3,$4,$5,$6,$7,$8,$9,$10,$11,$12,$13,$14,$15,$16)
             ON CONFLICT (attachment_id) DO NOTHING",
        )
        .bind(a.attachment_id)
        .bind(a.message_id)
        .bind(&a.filename)
        .bind(&a.description)
        .bind(&a.content_type)
        .bind(a.size)
        .bind(&a.url)
        .bind(&a.proxy_url)
        .bind(a.height)
        .bind(a.width)
        .bind(a.duration_secs)
        .bind(&a.waveform)
        .bind(a.ephemeral)
        .bind(a.flags)
        .bind(&a.title)
        .bind(&a.raw)
        .execute(&mut *conn)
        .await?;
    }

    Ok(())
}

/// Reactions are re-aggregated counts, not append-only history - each
/// re-sync overwrites count/count_details/burst_colors/raw for the same
/// (message_id, emoji_key) pair.
pub async fn upsert_reactions(conn: &mut PgConnection, reactions: &[Reaction]) -> ArchiveResult<()> {
    if reactions.is_empty() {
        return Ok(());
    }

    for r in reactions {
        sqlx::query(
            "INSERT INTO reactions (
                message_id, emoji_key, emoji_id, emoji_name, emoji_animated,
                count, count_details, burst_colors, raw
             ) VALUES ($1,$2,$3,$4,$5,$6,$7,$8,$9)
             ON CONFLICT (message_id, emoji_key) DO UPDATE SET
                count = EXCLUDED.count,
                count_details = EXCLUDED.count_details,
                burst_colors = EXCLUDED.burst_colors,
                raw = EXCLUDED.raw",
        )
        .bind(r.message_id)
        .bind(&r.emoji_key)
        .bind(r.emoji_id)
        .bind(&r.emoji_name)
        .bind(r.emoji_animated)
        .bind(r.count)
        .bind(&r.count_details)
        .bind(&r.burst_colors)
        .bind(&r.raw)
        .execute(&mut *conn)
        .await?;
    }

    Ok(())
}

/// Maps and persists a full page of message payloads in one transaction:
/// users, then messages, then attachments, then reactions, in that order
/// so FK references are always satisfied.
///
/// Each DTO is NUL-sanitized once, up front, before anything is derived
/// from it - users, messages, attachments, and reactions all read from
/// the same sanitized copies so no zero byte can reach any of them.
pub async fn persist_message_batch(
    pool: &PgPool,
    messages_data: &[Value],
    guild_id: Option<i64>,
) -> ArchiveResult<usize> {
    if messages_data.is_empty() {
        return Ok(0);
    }

    let sanitized: Vec<Value> = messages_data.iter().map(sanitize_value).collect();

    let (messages, attachments, reactions) = map_messages(&sanitized, guild_id)?;

    let mut users = Vec::new();
    for data in &sanitized {
        users.extend(extract_users_from_message(data)?);
    }

    let mut tx = pool.begin().await?;
    upsert_users(&mut tx, &users).await?;
    insert_messages(&mut tx, &messages).await?;
    insert_attachments(&mut tx, &attachments).await?;
    upsert_reactions(&mut tx, &reactions).await?;
    tx.commit().await?;

    Ok(messages.len())
}
