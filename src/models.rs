//! Persistence entity shapes. Column lists mirror the relational schema
//! in `migrations/0001_init.sql`; most of the non-`raw` columns exist so
//! common queries don't need to reach into the JSON blob.

use chrono::{DateTime, Utc};
use serde_json::Value;

#[derive(Debug, Clone)]
pub struct Guild {
    pub guild_id: i64,
    pub name: String,
    pub icon: Option<String>,
    pub icon_hash: Option<String>,
    pub splash: Option<String>,
    pub discovery_splash: Option<String>,
    pub banner: Option<String>,
    pub description: Option<String>,
    pub owner_id: i64,
    pub afk_channel_id: Option<i64>,
    pub afk_timeout: i32,
    pub widget_enabled: Option<bool>,
    pub widget_channel_id: Option<i64>,
    pub system_channel_id: Option<i64>,
    pub rules_channel_id: Option<i64>,
    pub public_updates_channel_id: Option<i64>,
    pub safety_alerts_channel_id: Option<i64>,
    pub verification_level: i32,
    pub default_message_notifications: i32,
    pub explicit_content_filter: i32,
    pub mfa_level: i32,
    pub nsfw_level: i32,
    pub system_channel_flags: i32,
    pub features: Vec<String>,
    pub premium_tier: i32,
    pub premium_subscription_count: Option<i32>,
    pub premium_progress_bar_enabled: bool,
    pub vanity_url_code: Option<String>,
    pub preferred_locale: String,
    pub application_id: Option<i64>,
    pub max_presences: Option<i32>,
    pub max_members: Option<i32>,
    pub max_video_channel_users: Option<i32>,
    pub max_stage_video_channel_users: Option<i32>,
    pub approximate_member_count: Option<i32>,
    pub approximate_presence_count: Option<i32>,
    pub welcome_screen: Option<Value>,
    pub incidents_data: Option<Value>,
    pub raw: Value,
}

#[derive(Debug, Clone)]
pub struct Channel {
    pub channel_id: i64,
    pub guild_id: Option<i64>,
    pub channel_type: i32,
    pub name: Option<String>,
    pub topic: Option<String>,
    pub position: Option<i32>,
    pub permission_overwrites: Option<Value>,
    pub parent_id: Option<i64>,
    pub nsfw: Option<bool>,
    pub last_message_id: Option<i64>,
    pub bitrate: Option<i32>,
    pub user_limit: Option<i32>,
    pub rtc_region: Option<String>,
    pub video_quality_mode: Option<i32>,
    pub rate_limit_per_user: Option<i32>,
    pub owner_id: Option<i64>,
    pub thread_metadata: Option<Value>,
    pub message_count: Option<i32>,
    pub member_count: Option<i32>,
    pub total_message_sent: Option<i32>,
    pub default_auto_archive_duration: Option<i32>,
    pub default_thread_rate_limit_per_user: Option<i32>,
    pub available_tags: Option<Value>,
    pub applied_tags: Option<Vec<i64>>,
    pub default_reaction_emoji: Option<Value>,
    pub default_sort_order: Option<i32>,
    pub default_forum_layout: Option<i32>,
    pub flags: i32,
    pub recipients: Option<Value>,
    pub icon: Option<String>,
    pub application_id: Option<i64>,
    pub managed: Option<bool>,
    pub last_pin_timestamp: Option<DateTime<Utc>>,
    pub raw: Value,
}

/// Channel types that carry a message history, per the channel fetcher's
/// enumeration rule (text, announcement, forum, media) plus threads and
/// DMs, which are text-based but not enumerated via guild channel listing.
pub const CHANNEL_TYPE_TEXT: i32 = 0;
pub const CHANNEL_TYPE_DM: i32 = 1;
pub const CHANNEL_TYPE_VOICE: i32 = 2;
pub const CHANNEL_TYPE_GROUP_DM: i32 = 3;
pub const CHANNEL_TYPE_CATEGORY: i32 = 4;
pub const CHANNEL_TYPE_ANNOUNCEMENT: i32 = 5;
pub const CHANNEL_TYPE_ANNOUNCEMENT_THREAD: i32 = 10;
pub const CHANNEL_TYPE_PUBLIC_THREAD: i32 = 11;
pub const CHANNEL_TYPE_PRIVATE_THREAD: i32 = 12;
pub const CHANNEL_TYPE_STAGE: i32 = 13;
pub const CHANNEL_TYPE_DIRECTORY: i32 = 14;
pub const CHANNEL_TYPE_FORUM: i32 = 15;
pub const CHANNEL_TYPE_MEDIA: i32 = 16;

pub fn is_thread(channel_type: i32) -> bool {
    matches!(
        channel_type,
        CHANNEL_TYPE_ANNOUNCEMENT_THREAD | CHANNEL_TYPE_PUBLIC_THREAD | CHANNEL_TYPE_PRIVATE_THREAD
    )
}

#[derive(Debug, Clone)]
pub struct Role {
    pub role_id: i64,
    pub guild_id: i64,
    pub name: String,
    pub color: i32,
    pub colors: Option<Value>,
    pub hoist: bool,
    pub position: i32,
    pub mentionable: bool,
    pub icon: Option<String>,
    pub unicode_emoji: Option<String>,
    /// Discord permission bitfields are 64-bit; stored as NUMERIC(20,0)
    /// upstream because some platforms' bitfields may exceed i64 - kept
    /// as a decimal string here and parsed to u64 only where arithmetic
    /// is needed (the permission calculator).
    pub permissions: String,
    pub managed: bool,
    pub tags: Option<Value>,
    pub flags: i32,
    pub raw: Value,
}

#[derive(Debug, Clone)]
pub struct Emoji {
    pub emoji_id: i64,
    pub guild_id: i64,
    pub name: Option<String>,
    pub animated: bool,
    pub available: bool,
    pub managed: bool,
    pub require_colons: bool,
    pub roles: Option<Vec<i64>>,
    pub user_id: Option<i64>,
    pub raw: Value,
}

#[derive(Debug, Clone)]
pub struct Sticker {
    pub sticker_id: i64,
    pub guild_id: Option<i64>,
    pub pack_id: Option<i64>,
    pub name: String,
    pub description: Option<String>,
    pub tags: Option<String>,
    pub sticker_type: i32,
    pub format_type: i32,
    pub available: Option<bool>,
    pub user_id: Option<i64>,
    pub sort_value: Option<i32>,
    pub raw: Value,
}

#[derive(Debug, Clone)]
pub struct GuildScheduledEvent {
    pub event_id: i64,
    pub guild_id: i64,
    pub channel_id: Option<i64>,
    pub creator_id: Option<i64>,
    pub name: String,
    pub description: Option<String>,
    pub image: Option<String>,
    pub scheduled_start_time: DateTime<Utc>,
    pub scheduled_end_time: Option<DateTime<Utc>>,
    pub privacy_level: i32,
    pub status: i32,
    pub entity_type: i32,
    pub entity_id: Option<i64>,
    pub entity_metadata: Option<Value>,
    pub user_count: Option<i32>,
    pub recurrence_rule: Option<Value>,
    pub raw: Value,
}

#[derive(Debug, Clone)]
pub struct User {
    pub user_id: i64,
    pub username: Option<String>,
    pub discriminator: Option<String>,
    pub global_name: Option<String>,
    pub avatar: Option<String>,
    pub avatar_decoration_data: Option<Value>,
    pub banner: Option<String>,
    pub accent_color: Option<i32>,
    pub bot: bool,
    pub system: bool,
    pub public_flags: i64,
    pub premium_type: Option<i32>,
    pub raw: Value,
}

#[derive(Debug, Clone)]
pub struct Message {
    pub message_id: i64,
    pub channel_id: i64,
    pub author_id: i64,
    pub guild_id: Option<i64>,
    pub content: String,
    pub created_at: DateTime<Utc>,
    pub edited_timestamp: Option<DateTime<Utc>>,
    pub message_type: i32,
    pub tts: bool,
    pub flags: i32,
    pub pinned: bool,
    pub mention_everyone: bool,
    pub mentions: Vec<i64>,
    pub mention_roles: Vec<i64>,
    pub mention_channels: Option<Value>,
    pub webhook_id: Option<i64>,
    pub application: Option<Value>,
    pub application_id: Option<i64>,
    pub message_reference: Option<Value>,
    pub referenced_message_id: Option<i64>,
    pub message_snapshots: Option<Value>,
    pub interaction_metadata: Option<Value>,
    pub thread: Option<Value>,
    pub embeds: Value,
    pub components: Option<Value>,
    pub sticker_items: Option<Value>,
    pub poll: Option<Value>,
    pub activity: Option<Value>,
    pub call: Option<Value>,
    pub role_subscription_data: Option<Value>,
    pub raw: Value,
}

#[derive(Debug, Clone)]
pub struct Attachment {
    pub attachment_id: i64,
    pub message_id: i64,
    pub filename: String,
    pub description: Option<String>,
    pub content_type: Option<String>,
    pub size: i64,
    pub url: String,
    pub proxy_url: Option<String>,
    pub height: Option<i32>,
    pub width: Option<i32>,
    pub duration_secs: Option<f64>,
    pub waveform: Option<String>,
    pub ephemeral: Option<bool>,
    pub flags: Option<i32>,
    pub title: Option<String>,
    pub raw: Value,
}

#[derive(Debug, Clone)]
pub struct Reaction {
    pub message_id: i64,
    pub emoji_key: String,
    pub emoji_id: Option<i64>,
    pub emoji_name: Option<String>,
    pub emoji_animated: Option<bool>,
    pub count: i32,
    pub count_details: Option<Value>,
    pub burst_colors: Option<Value>,
    pub raw: Value,
}

#[derive(Debug, Clone, sqlx::FromRow)]
pub struct IngestCheckpoint {
    pub channel_id: i64,
    pub guild_id: i64,
    pub oldest_message_id: Option<i64>,
    pub backfill_complete: bool,
    pub newest_message_id: Option<i64>,
    pub last_synced_at: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
}
