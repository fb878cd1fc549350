use std::collections::HashSet;

use serde_json::Value;

use crate::dto::{i32_or, optional_i32, optional_id, optional_iso8601, optional_str, required_id};
use crate::error::ArchiveResult;
use crate::models::{
    Channel, CHANNEL_TYPE_ANNOUNCEMENT, CHANNEL_TYPE_ANNOUNCEMENT_THREAD, CHANNEL_TYPE_DM,
    CHANNEL_TYPE_GROUP_DM, CHANNEL_TYPE_PRIVATE_THREAD, CHANNEL_TYPE_PUBLIC_THREAD,
    CHANNEL_TYPE_STAGE, CHANNEL_TYPE_TEXT, CHANNEL_TYPE_VOICE,
};

/// Channel types that carry readable message history. Voice and stage
/// channels are included - both support text chat alongside their
/// primary medium.
pub fn is_text_based(channel_type: i32) -> bool {
    matches!(
        channel_type,
        CHANNEL_TYPE_TEXT
            | CHANNEL_TYPE_DM
            | CHANNEL_TYPE_GROUP_DM
            | CHANNEL_TYPE_ANNOUNCEMENT
            | CHANNEL_TYPE_ANNOUNCEMENT_THREAD
            | CHANNEL_TYPE_PUBLIC_THREAD
            | CHANNEL_TYPE_PRIVATE_THREAD
            | CHANNEL_TYPE_VOICE
            | CHANNEL_TYPE_STAGE
    )
}

pub fn channel_type_name(channel_type: i32) -> String {
    use crate::models::*;
    match channel_type {
        CHANNEL_TYPE_TEXT => "text",
        CHANNEL_TYPE_DM => "dm",
        CHANNEL_TYPE_VOICE => "voice",
        CHANNEL_TYPE_GROUP_DM => "group_dm",
        CHANNEL_TYPE_CATEGORY => "category",
        CHANNEL_TYPE_ANNOUNCEMENT => "announcement",
        CHANNEL_TYPE_ANNOUNCEMENT_THREAD => "announcement_thread",
        CHANNEL_TYPE_PUBLIC_THREAD => "public_thread",
        CHANNEL_TYPE_PRIVATE_THREAD => "private_thread",
        CHANNEL_TYPE_STAGE => "stage",
        CHANNEL_TYPE_DIRECTORY => "directory",
        CHANNEL_TYPE_FORUM => "forum",
        CHANNEL_TYPE_MEDIA => "media",
        other => return format!("unknown({other})"),
    }
    .to_string()
}

/// Converts a channel DTO into a persistence entity. When
/// `valid_parent_ids` is given, `parent_id` is nulled out unless the
/// parent is known within the same batch - this keeps the two-pass
/// channel insert from ever pointing at a row that hasn't landed yet.
pub fn map_channel(data: &Value, valid_parent_ids: Option<&HashSet<i64>>) -> ArchiveResult<Channel> {
    let parent_id = match optional_id(data, "parent_id")? {
        Some(pid) => match valid_parent_ids {
            None => Some(pid),
            Some(known) if known.contains(&pid) => Some(pid),
            Some(_) => None,
        },
        None => None,
    };

    let applied_tags = data
        .get("applied_tags")
        .and_then(Value::as_array)
        .map(|tags| {
            tags.iter()
                .filter_map(|t| t.as_str().and_then(|s| s.parse::<i64>().ok()))
                .collect()
        });

    Ok(Channel {
        channel_id: required_id(data, "id")?,
        guild_id: optional_id(data, "guild_id")?,
        channel_type: required_int(data, "type")?,
        name: optional_str(data, "name"),
        topic: optional_str(data, "topic"),
        position: optional_i32(data, "position"),
        permission_overwrites: data.get("permission_overwrites").cloned(),
        parent_id,
        nsfw: data.get("nsfw").and_then(Value::as_bool),
        last_message_id: optional_id(data, "last_message_id")?,
        bitrate: optional_i32(data, "bitrate"),
        user_limit: optional_i32(data, "user_limit"),
        rtc_region: optional_str(data, "rtc_region"),
        video_quality_mode: optional_i32(data, "video_quality_mode"),
        rate_limit_per_user: optional_i32(data, "rate_limit_per_user"),
        owner_id: optional_id(data, "owner_id")?,
        thread_metadata: data.get("thread_metadata").cloned(),
        message_count: optional_i32(data, "message_count"),
        member_count: optional_i32(data, "member_count"),
        total_message_sent: optional_i32(data, "total_message_sent"),
        default_auto_archive_duration: optional_i32(data, "default_auto_archive_duration"),
        default_thread_rate_limit_per_user: optional_i32(data, "default_thread_rate_limit_per_user"),
        available_tags: data.get("available_tags").cloned(),
        applied_tags,
        default_reaction_emoji: data.get("default_reaction_emoji").cloned(),
        default_sort_order: optional_i32(data, "default_sort_order"),
        default_forum_layout: optional_i32(data, "default_forum_layout"),
        flags: i32_or(data, "flags", 0),
        recipients: data.get("recipients").cloned(),
        icon: optional_str(data, "icon"),
        application_id: optional_id(data, "application_id")?,
        managed: data.get("managed").and_then(Value::as_bool),
        last_pin_timestamp: optional_iso8601(data, "last_pin_timestamp")?,
        raw: data.clone(),
    })
}

fn required_int(data: &Value, field: &str) -> ArchiveResult<i32> {
    data.get(field)
        .and_then(Value::as_i64)
        .map(|n| n as i32)
        .ok_or_else(|| crate::error::ArchiveError::DataShape(format!("missing required field `{field}`")))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn maps_text_channel() {
        let data = json!({
            "id": "55",
            "guild_id": "1",
            "type": 0,
            "name": "general",
            "position": 0,
        });
        let channel = map_channel(&data, None).unwrap();
        assert_eq!(channel.channel_id, 55);
        assert_eq!(channel.channel_type, 0);
        assert_eq!(channel.name.as_deref(), Some("general"));
    }

    #[test]
    fn nulls_parent_id_not_in_known_set() {
        let data = json!({"id": "55", "type": 0, "parent_id": "999"});
        let known: HashSet<i64> = [1, 2, 3].into_iter().collect();
        let channel = map_channel(&data, Some(&known)).unwrap();
        assert_eq!(channel.parent_id, None);
    }

    #[test]
    fn keeps_parent_id_in_known_set() {
        let data = json!({"id": "55", "type": 0, "parent_id": "2"});
        let known: HashSet<i64> = [1, 2, 3].into_iter().collect();
        let channel = map_channel(&data, Some(&known)).unwrap();
        assert_eq!(channel.parent_id, Some(2));
    }

    #[test]
    fn keeps_parent_id_when_set_unbounded() {
        let data = json!({"id": "55", "type": 0, "parent_id": "999"});
        let channel = map_channel(&data, None).unwrap();
        assert_eq!(channel.parent_id, Some(999));
    }

    #[test]
    fn is_text_based_covers_voice_and_stage() {
        assert!(is_text_based(CHANNEL_TYPE_VOICE));
        assert!(is_text_based(CHANNEL_TYPE_STAGE));
        assert!(!is_text_based(4));
    }

    #[test]
    fn channel_type_name_falls_back_for_unknown() {
        assert_eq!(channel_type_name(999), "unknown(999)");
        assert_eq!(channel_type_name(0), "text");
    }
}
