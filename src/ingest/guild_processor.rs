use std::collections::HashSet;

use serde_json::Value;
use sqlx::PgPool;
use tracing::{info, warn};

use crate::db::repositories::{
    get_channel_message_count, upsert_channels, upsert_emojis, upsert_guild, upsert_roles,
    upsert_scheduled_events, upsert_stickers, CheckpointRepository,
};
use crate::error::{ArchiveError, ArchiveResult};
use crate::http::DiscordClient;
use crate::ingest::{fetch_accessible_channels, run_backfill, run_incremental};
use crate::mappers::{
    is_text_based, map_channel, map_emoji, map_guild, map_role, map_scheduled_event, map_sticker,
};
use crate::models::CHANNEL_TYPE_CATEGORY;
use crate::permissions::{self, PermissionContext};

const DEFAULT_BATCH_SIZE: u32 = 100;

/// Sets `guild_id` on a DTO that may arrive without it (stickers,
/// scheduled events) so their mappers have something to read.
fn with_guild_id(mut data: Value, guild_id: i64) -> Value {
    if let Value::Object(ref mut map) = data {
        map.entry("guild_id").or_insert_with(|| Value::String(guild_id.to_string()));
    }
    data
}

/// Resolves the permission context for the account currently
/// authenticated against `client`, within `guild_id`.
async fn build_permission_context(
    client: &DiscordClient,
    guild_id: i64,
    guild_roles: &Value,
) -> ArchiveResult<PermissionContext> {
    let current_user = client.get_current_user().await?;
    let user_id = current_user
        .get("id")
        .and_then(Value::as_str)
        .and_then(|s| s.parse::<i64>().ok())
        .ok_or_else(|| ArchiveError::DataShape("current user missing id".into()))?;

    let member = client.get_current_user_guild_member(guild_id).await?;
    let role_ids: Vec<i64> = member
        .get("roles")
        .and_then(Value::as_array)
        .map(|arr| {
            arr.iter()
                .filter_map(|r| r.as_str().and_then(|s| s.parse::<i64>().ok()))
                .collect()
        })
        .unwrap_or_default();

    let role_pairs: Vec<(i64, u64)> = guild_roles
        .as_array()
        .map(|arr| {
            arr.iter()
                .filter_map(|role| {
                    let id = role.get("id")?.as_str()?.parse::<i64>().ok()?;
                    let perms = role
                        .get("permissions")
                        .and_then(Value::as_str)
                        .and_then(|s| s.parse::<u64>().ok())
                        .unwrap_or(0);
                    Some((id, perms))
                })
                .collect()
        })
        .unwrap_or_default();
    let role_permissions = permissions::build_role_permissions_map(&role_pairs);
    let base_permissions = permissions::compute_base_permissions(guild_id, &role_ids, &role_permissions);

    Ok(PermissionContext {
        user_id,
        role_ids,
        base_permissions,
    })
}

/// Counts accumulated while syncing one guild's channels.
#[derive(Debug, Default)]
pub struct GuildSyncCounts {
    pub channels: usize,
    pub messages: usize,
}

/// Ingests a guild's metadata (roles, emojis, stickers, events,
/// channels) then syncs every accessible channel's messages.
///
/// A `403` on emojis/stickers/events is soft-skipped with a log note;
/// any other error here propagates and aborts this guild.
pub async fn process_guild(client: &DiscordClient, pool: &PgPool, guild_id: i64) -> ArchiveResult<GuildSyncCounts> {
    info!(guild_id, "processing guild");

    let guild_data = client.get_guild(guild_id).await?;
    let guild = map_guild(&guild_data)?;
    upsert_guild(pool, &guild).await?;

    let ctx = build_permission_context(client, guild_id, guild_data.get("roles").unwrap_or(&Value::Null)).await?;

    if let Some(roles) = guild_data.get("roles").and_then(Value::as_array) {
        let mapped: Vec<_> = roles
            .iter()
            .map(|r| map_role(r, guild_id))
            .collect::<ArchiveResult<_>>()?;
        upsert_roles(pool, &mapped).await?;
    }

    match client.get_guild_emojis(guild_id).await {
        Ok(emojis) => {
            let mapped: Vec<_> = emojis
                .iter()
                .map(|e| map_emoji(e, guild_id))
                .collect::<ArchiveResult<_>>()?;
            upsert_emojis(pool, &mapped).await?;
        }
        Err(e) if e.is_forbidden() => warn!(guild_id, "emoji listing forbidden, skipping"),
        Err(e) => return Err(e),
    }

    match client.get_guild_stickers(guild_id).await {
        Ok(stickers) => {
            let mapped: Vec<_> = stickers
                .into_iter()
                .map(|s| with_guild_id(s, guild_id))
                .map(|s| map_sticker(&s))
                .collect::<ArchiveResult<_>>()?;
            upsert_stickers(pool, &mapped).await?;
        }
        Err(e) if e.is_forbidden() => warn!(guild_id, "sticker listing forbidden, skipping"),
        Err(e) => return Err(e),
    }

    match client.get_guild_scheduled_events(guild_id).await {
        Ok(events) => {
            let mapped: Vec<_> = events
                .into_iter()
                .map(|ev| with_guild_id(ev, guild_id))
                .map(|ev| map_scheduled_event(&ev))
                .collect::<ArchiveResult<_>>()?;
            upsert_scheduled_events(pool, &mapped).await?;
        }
        Err(e) if e.is_forbidden() => warn!(guild_id, "scheduled event listing forbidden, skipping"),
        Err(e) => return Err(e),
    }

    let raw_channels = fetch_accessible_channels(client, guild_id, &ctx).await?;

    let known_parent_ids: HashSet<i64> = raw_channels
        .iter()
        .filter_map(|c| c.get("id")?.as_str()?.parse::<i64>().ok())
        .collect();

    let mapped_channels: Vec<_> = raw_channels
        .iter()
        .map(|c| map_channel(c, Some(&known_parent_ids)))
        .collect::<ArchiveResult<_>>()?;
    upsert_channels(pool, &mapped_channels, &known_parent_ids).await?;

    let mut skipped = 0usize;
    let mut syncable = Vec::new();
    for channel in &mapped_channels {
        if channel.channel_type == CHANNEL_TYPE_CATEGORY || !is_text_based(channel.channel_type) {
            continue;
        }
        let overwrites = raw_channels
            .iter()
            .find(|c| c.get("id").and_then(Value::as_str).and_then(|s| s.parse::<i64>().ok()) == Some(channel.channel_id))
            .and_then(|c| c.get("permission_overwrites"))
            .cloned()
            .unwrap_or(Value::Null);
        let (everyone, role_overwrites, member) =
            permissions::parse_overwrites(&overwrites, guild_id, ctx.user_id, &ctx.role_ids);
        let perms = permissions::compute_channel_permissions(
            ctx.base_permissions,
            guild_id,
            ctx.user_id,
            &ctx.role_ids,
            everyone,
            &role_overwrites,
            member,
        );
        if permissions::can_access_channel(perms, channel.channel_type) {
            syncable.push(channel.channel_id);
        } else {
            skipped += 1;
        }
    }
    info!(guild_id, skipped, syncable = syncable.len(), "channel access filtered");

    let mut counts = GuildSyncCounts::default();
    for channel_id in syncable {
        match process_channel(client, pool, channel_id, guild_id).await {
            Ok(count) => {
                counts.channels += 1;
                counts.messages += count;
            }
            Err(e) => return Err(e),
        }
    }

    Ok(counts)
}

/// Runs backfill (if not yet complete) then incremental sync for one
/// channel. A `403` from the message endpoint soft-skips the channel.
pub async fn process_channel(
    client: &DiscordClient,
    pool: &PgPool,
    channel_id: i64,
    guild_id: i64,
) -> ArchiveResult<usize> {
    let checkpoints = CheckpointRepository::new(pool);
    let checkpoint = checkpoints.get(channel_id).await?;
    let backfill_complete = checkpoint.map(|c| c.backfill_complete).unwrap_or(false);

    let mut total = 0usize;

    if !backfill_complete {
        match run_backfill(client, pool, channel_id, guild_id, DEFAULT_BATCH_SIZE).await {
            Ok(count) => {
                total += count;
                if count == 0 && checkpoints.is_backfill_complete(channel_id).await? {
                    return Ok(total);
                }
            }
            Err(e) if e.is_forbidden() => {
                warn!(channel_id, "message endpoint forbidden, skipping channel");
                return Ok(0);
            }
            Err(e) => return Err(e),
        }
    }

    if let Ok(count) = get_channel_message_count(pool, channel_id).await {
        info!(channel_id, archived_so_far = count, "entering incremental sync");
    }

    match run_incremental(client, pool, channel_id, guild_id, DEFAULT_BATCH_SIZE).await {
        Ok(count) => total += count,
        Err(e) if e.is_forbidden() => warn!(channel_id, "message endpoint forbidden during incremental sync"),
        Err(e) => return Err(e),
    }

    Ok(total)
}
