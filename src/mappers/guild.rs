use serde_json::Value;

use crate::dto::{bool_or, i32_or, optional_i32, optional_id, optional_str, required_id, required_str};
use crate::error::ArchiveResult;
use crate::models::Guild;

pub fn map_guild(data: &Value) -> ArchiveResult<Guild> {
    let features = data
        .get("features")
        .and_then(Value::as_array)
        .map(|arr| arr.iter().filter_map(|v| v.as_str().map(String::from)).collect())
        .unwrap_or_default();

    Ok(Guild {
        guild_id: required_id(data, "id")?,
        name: required_str(data, "name")?.to_string(),
        icon: optional_str(data, "icon"),
        icon_hash: optional_str(data, "icon_hash"),
        splash: optional_str(data, "splash"),
        discovery_splash: optional_str(data, "discovery_splash"),
        banner: optional_str(data, "banner"),
        description: optional_str(data, "description"),
        owner_id: required_id(data, "owner_id")?,
        afk_channel_id: optional_id(data, "afk_channel_id")?,
        afk_timeout: i32_or(data, "afk_timeout", 300),
        widget_enabled: data.get("widget_enabled").and_then(Value::as_bool),
        widget_channel_id: optional_id(data, "widget_channel_id")?,
        system_channel_id: optional_id(data, "system_channel_id")?,
        rules_channel_id: optional_id(data, "rules_channel_id")?,
        public_updates_channel_id: optional_id(data, "public_updates_channel_id")?,
        safety_alerts_channel_id: optional_id(data, "safety_alerts_channel_id")?,
        verification_level: i32_or(data, "verification_level", 0),
        default_message_notifications: i32_or(data, "default_message_notifications", 0),
        explicit_content_filter: i32_or(data, "explicit_content_filter", 0),
        mfa_level: i32_or(data, "mfa_level", 0),
        nsfw_level: i32_or(data, "nsfw_level", 0),
        system_channel_flags: i32_or(data, "system_channel_flags", 0),
        features,
        premium_tier: i32_or(data, "premium_tier", 0),
        premium_subscription_count: optional_i32(data, "premium_subscription_count"),
        premium_progress_bar_enabled: bool_or(data, "premium_progress_bar_enabled", false),
        vanity_url_code: optional_str(data, "vanity_url_code"),
        preferred_locale: optional_str(data, "preferred_locale").unwrap_or_else(|| "en-US".to_string()),
        application_id: optional_id(data, "application_id")?,
        max_presences: optional_i32(data, "max_presences"),
        max_members: optional_i32(data, "max_members"),
        max_video_channel_users: optional_i32(data, "max_video_channel_users"),
        max_stage_video_channel_users: optional_i32(data, "max_stage_video_channel_users"),
        approximate_member_count: optional_i32(data, "approximate_member_count"),
        approximate_presence_count: optional_i32(data, "approximate_presence_count"),
        welcome_screen: data.get("welcome_screen").cloned(),
        incidents_data: data.get("incidents_data").cloned(),
        raw: data.clone(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn maps_minimal_guild_with_defaults() {
        let data = json!({"id": "1", "name": "Test Guild", "owner_id": "2"});
        let guild = map_guild(&data).unwrap();
        assert_eq!(guild.guild_id, 1);
        assert_eq!(guild.afk_timeout, 300);
        assert_eq!(guild.preferred_locale, "en-US");
        assert!(guild.features.is_empty());
    }

    #[test]
    fn maps_features_list() {
        let data = json!({
            "id": "1", "name": "g", "owner_id": "2",
            "features": ["COMMUNITY", "NEWS"],
        });
        let guild = map_guild(&data).unwrap();
        assert_eq!(guild.features, vec!["COMMUNITY", "NEWS"]);
    }
}
