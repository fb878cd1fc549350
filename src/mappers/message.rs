use serde_json::Value;

use crate::dto::{bool_or, i32_or, optional_f64, optional_i32, optional_id, optional_iso8601, optional_str, parse_iso8601, required_id, required_str};
use crate::error::ArchiveResult;
use crate::models::{Attachment, Message, Reaction};
use crate::sanitize::sanitize_value;

pub fn map_message(data: &Value, guild_id: Option<i64>) -> ArchiveResult<Message> {
    let data = sanitize_value(data);

    let msg_guild_id = optional_id(&data, "guild_id")?.or(guild_id);

    let mentions = data
        .get("mentions")
        .and_then(Value::as_array)
        .map(|arr| arr.iter().filter_map(|u| optional_id(u, "id").ok().flatten()).collect())
        .unwrap_or_default();

    let mention_roles = data
        .get("mention_roles")
        .and_then(Value::as_array)
        .map(|arr| {
            arr.iter()
                .filter_map(|v| v.as_str().and_then(|s| s.parse::<i64>().ok()))
                .collect()
        })
        .unwrap_or_default();

    let referenced_message_id = data
        .get("message_reference")
        .and_then(|r| optional_id(r, "message_id").ok().flatten());

    let timestamp = required_str(&data, "timestamp")?;

    Ok(Message {
        message_id: required_id(&data, "id")?,
        channel_id: required_id(&data, "channel_id")?,
        author_id: required_id(
            data.get("author")
                .ok_or_else(|| crate::error::ArchiveError::DataShape("message missing `author`".into()))?,
            "id",
        )?,
        guild_id: msg_guild_id,
        content: optional_str(&data, "content").unwrap_or_default(),
        created_at: parse_iso8601(timestamp)?,
        edited_timestamp: optional_iso8601(&data, "edited_timestamp")?,
        message_type: i32_or(&data, "type", 0),
        tts: bool_or(&data, "tts", false),
        flags: i32_or(&data, "flags", 0),
        pinned: bool_or(&data, "pinned", false),
        mention_everyone: bool_or(&data, "mention_everyone", false),
        mentions,
        mention_roles,
        mention_channels: data.get("mention_channels").cloned(),
        webhook_id: optional_id(&data, "webhook_id")?,
        application: data.get("application").cloned(),
        application_id: optional_id(&data, "application_id")?,
        message_reference: data.get("message_reference").cloned(),
        referenced_message_id,
        message_snapshots: data.get("message_snapshots").cloned(),
        interaction_metadata: data
            .get("interaction_metadata")
            .or_else(|| data.get("interaction"))
            .cloned(),
        thread: data.get("thread").cloned(),
        embeds: data.get("embeds").cloned().unwrap_or_else(|| Value::Array(vec![])),
        components: data.get("components").cloned(),
        sticker_items: data.get("sticker_items").cloned(),
        poll: data.get("poll").cloned(),
        activity: data.get("activity").cloned(),
        call: data.get("call").cloned(),
        role_subscription_data: data.get("role_subscription_data").cloned(),
        raw: data.clone(),
    })
}

pub fn map_attachment(data: &Value, message_id: i64) -> ArchiveResult<Attachment> {
    Ok(Attachment {
        attachment_id: required_id(data, "id")?,
        message_id,
        filename: required_str(data, "filename")?.to_string(),
        description: optional_str(data, "description"),
        content_type: optional_str(data, "content_type"),
        size: data
            .get("size")
            .and_then(Value::as_i64)
            .ok_or_else(|| crate::error::ArchiveError::DataShape("attachment missing `size`".into()))?,
        url: required_str(data, "url")?.to_string(),
        proxy_url: optional_str(data, "proxy_url"),
        height: optional_i32(data, "height"),
        width: optional_i32(data, "width"),
        duration_secs: optional_f64(data, "duration_secs"),
        waveform: optional_str(data, "waveform"),
        ephemeral: data.get("ephemeral").and_then(Value::as_bool),
        flags: optional_i32(data, "flags"),
        title: optional_str(data, "title"),
        raw: data.clone(),
    })
}

/// Builds the canonical composite emoji key: `custom:<id>` for custom
/// guild emoji, `unicode:<name>` for standard/textual emoji. This is the
/// one string that must never be derived a second, different way.
pub fn emoji_key(emoji_id: Option<i64>, emoji_name: Option<&str>) -> String {
    match emoji_id {
        Some(id) => format!("custom:{id}"),
        None => format!("unicode:{}", emoji_name.unwrap_or_default()),
    }
}

pub fn map_reaction(data: &Value, message_id: i64) -> ArchiveResult<Reaction> {
    let emoji = data
        .get("emoji")
        .ok_or_else(|| crate::error::ArchiveError::DataShape("reaction missing `emoji`".into()))?;
    let emoji_id = optional_id(emoji, "id")?;
    let emoji_name = optional_str(emoji, "name");
    let emoji_animated = emoji.get("animated").and_then(Value::as_bool);
    let key = emoji_key(emoji_id, emoji_name.as_deref());

    Ok(Reaction {
        message_id,
        emoji_key: key,
        emoji_id,
        emoji_name,
        emoji_animated,
        count: i32_or(data, "count", 1),
        count_details: data.get("count_details").cloned(),
        burst_colors: data.get("burst_colors").cloned(),
        raw: data.clone(),
    })
}

/// Maps a whole page of message DTOs into the three entity lists
/// persisted together in one batch. Order within each list follows the
/// page's own order; the caller computes min/max ids explicitly rather
/// than relying on position.
///
/// Each DTO is NUL-sanitized once up front; messages, attachments, and
/// reactions are all derived from that one sanitized copy so none of
/// them can carry a zero byte into storage.
pub fn map_messages(
    data_list: &[Value],
    guild_id: Option<i64>,
) -> ArchiveResult<(Vec<Message>, Vec<Attachment>, Vec<Reaction>)> {
    let mut messages = Vec::with_capacity(data_list.len());
    let mut attachments = Vec::new();
    let mut reactions = Vec::new();

    for data in data_list {
        let data = sanitize_value(data);
        let message_id = required_id(&data, "id")?;

        if let Some(atts) = data.get("attachments").and_then(Value::as_array) {
            for att in atts {
                attachments.push(map_attachment(att, message_id)?);
            }
        }
        if let Some(reacts) = data.get("reactions").and_then(Value::as_array) {
            for react in reacts {
                reactions.push(map_reaction(react, message_id)?);
            }
        }

        messages.push(map_message(&data, guild_id)?);
    }

    Ok((messages, attachments, reactions))
}
