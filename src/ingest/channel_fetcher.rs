use serde_json::Value;

use crate::error::ArchiveResult;
use crate::http::DiscordClient;
use crate::models::{
    CHANNEL_TYPE_ANNOUNCEMENT, CHANNEL_TYPE_FORUM, CHANNEL_TYPE_MEDIA, CHANNEL_TYPE_TEXT,
};
use crate::permissions::{self, PermissionContext};
use std::collections::HashMap;

const MESSAGE_CHANNEL_TYPES: [i32; 4] = [
    CHANNEL_TYPE_TEXT,
    CHANNEL_TYPE_ANNOUNCEMENT,
    CHANNEL_TYPE_FORUM,
    CHANNEL_TYPE_MEDIA,
];
const THREADABLE_TEXT_TYPES: [i32; 2] = [CHANNEL_TYPE_TEXT, CHANNEL_TYPE_ANNOUNCEMENT];

fn channel_permissions(channel: &Value, guild_id: i64, ctx: &PermissionContext) -> u64 {
    let (everyone, role_overwrites, member) = match channel.get("permission_overwrites") {
        Some(overwrites) => permissions::parse_overwrites(overwrites, guild_id, ctx.user_id, &ctx.role_ids),
        None => (None, HashMap::new(), None),
    };
    permissions::compute_channel_permissions(
        ctx.base_permissions,
        guild_id,
        ctx.user_id,
        &ctx.role_ids,
        everyone,
        &role_overwrites,
        member,
    )
}

/// Paginates one archived-thread listing endpoint to exhaustion. Cursor
/// is the `archive_timestamp` of the last thread returned; pagination
/// continues while the server reports `has_more` and the page is
/// non-empty. Any failure here is swallowed and the threads gathered so
/// far are returned - thread listing is explicitly best-effort.
async fn paginate_archived_threads(
    fetch_page: impl Fn(Option<String>) -> std::pin::Pin<Box<dyn std::future::Future<Output = ArchiveResult<Value>> + Send>>,
) -> Vec<Value> {
    let mut threads = Vec::new();
    let mut cursor: Option<String> = None;

    loop {
        let page = match fetch_page(cursor.clone()).await {
            Ok(page) => page,
            Err(e) => {
                tracing::warn!(error = %e, "archived thread pagination failed, stopping early");
                break;
            }
        };

        let page_threads = page.get("threads").and_then(Value::as_array).cloned().unwrap_or_default();
        if page_threads.is_empty() {
            break;
        }

        let has_more = page.get("has_more").and_then(Value::as_bool).unwrap_or(false);
        let next_cursor = page_threads
            .last()
            .and_then(|t| t.get("thread_metadata"))
            .and_then(|m| m.get("archive_timestamp"))
            .and_then(Value::as_str)
            .map(String::from);

        threads.extend(page_threads);

        if !has_more || next_cursor.is_none() {
            break;
        }
        cursor = next_cursor;
    }

    threads
}

/// Enumerates every channel and every currently-archived thread this
/// account can view across a guild. Channel enumeration failures
/// propagate; thread-pagination failures are absorbed per channel.
pub async fn fetch_accessible_channels(
    client: &DiscordClient,
    guild_id: i64,
    ctx: &PermissionContext,
) -> ArchiveResult<Vec<Value>> {
    let channels = client.get_guild_channels(guild_id).await?;

    let mut accessible = Vec::new();
    let mut threads = Vec::new();

    for channel in &channels {
        let channel_type = channel.get("type").and_then(Value::as_i64).unwrap_or(-1) as i32;
        if !MESSAGE_CHANNEL_TYPES.contains(&channel_type) {
            continue;
        }

        let perms = channel_permissions(channel, guild_id, ctx);
        if !permissions::can_view(perms) {
            continue;
        }

        let channel_id = channel
            .get("id")
            .and_then(Value::as_str)
            .and_then(|s| s.parse::<i64>().ok());
        let Some(channel_id) = channel_id else {
            accessible.push(channel.clone());
            continue;
        };

        if THREADABLE_TEXT_TYPES.contains(&channel_type) {
            let public = paginate_archived_threads(move |cursor| {
                let client = client.clone();
                Box::pin(async move { client.get_public_archived_threads(channel_id, cursor.as_deref()).await })
            })
            .await;
            threads.extend(public);

            if permissions::can_manage_threads(perms) && permissions::can_read_history(perms) {
                let private = paginate_archived_threads(move |cursor| {
                    let client = client.clone();
                    Box::pin(async move { client.get_private_archived_threads(channel_id, cursor.as_deref()).await })
                })
                .await;
                threads.extend(private);
            }
        } else if channel_type == CHANNEL_TYPE_FORUM || channel_type == CHANNEL_TYPE_MEDIA {
            let public = paginate_archived_threads(move |cursor| {
                let client = client.clone();
                Box::pin(async move { client.get_public_archived_threads(channel_id, cursor.as_deref()).await })
            })
            .await;
            threads.extend(public);
        }

        accessible.push(channel.clone());
    }

    accessible.extend(threads);
    Ok(accessible)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn ctx(base: u64) -> PermissionContext {
        PermissionContext {
            user_id: 99,
            role_ids: vec![],
            base_permissions: base,
        }
    }

    #[test]
    fn channel_permissions_denies_view_without_bit() {
        let channel = json!({"id": "1", "type": 0});
        let perms = channel_permissions(&channel, 1, &ctx(0));
        assert!(!permissions::can_view(perms));
    }

    #[test]
    fn channel_permissions_allows_view_with_bit() {
        let channel = json!({"id": "1", "type": 0});
        let perms = channel_permissions(&channel, 1, &ctx(permissions::VIEW_CHANNEL));
        assert!(permissions::can_view(perms));
    }
}
