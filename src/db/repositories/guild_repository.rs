use sqlx::PgPool;

use crate::error::ArchiveResult;
use crate::models::Guild;

/// Upserts a guild, overwriting only name/icon/raw on conflict - every
/// other column is insert-only, consistent with the other latest-state
/// snapshot entities.
pub async fn upsert_guild(pool: &PgPool, guild: &Guild) -> ArchiveResult<()> {
    sqlx::query(
        "INSERT INTO guilds (
            guild_id, name, icon, icon_hash, splash, discovery_splash, banner,
            description, owner_id, afk_channel_id, afk_timeout, widget_enabled,
            widget_channel_id, system_channel_id, rules_channel_id,
            public_updates_channel_id, safety_alerts_channel_id, verification_level,
            default_message_notifications, explicit_content_filter, mfa_level,
            nsfw_level, system_channel_flags, features, premium_tier,
            premium_subscription_count, premium_progress_bar_enabled,
            vanity_url_code, preferred_locale, application_id, max_presences,
            max_members, max_video_channel_users, max_stage_video_channel_users,
            approximate_member_count, approximate_presence_count, welcome_screen,
            incidents_data, raw
         ) VALUES (
            $1,$2,$3,$4,$5,$6,$7,$8,$9,$10,$11,$12,$13,$14,$15,$16,$17,$18,$19,$20,
            $21,$22,$23,$24,$25,$26,$27,$28,$29,$30,$31,$32,$33,$34,$35,$36,$37,$38
         )
         ON CONFLICT (guild_id) DO UPDATE SET
            name = EXCLUDED.name,
            icon = EXCLUDED.icon,
            raw = EXCLUDED.raw,
            updated_at = now()",
    )
    .bind(guild.guild_id)
    .bind(&guild.name)
    .bind(&guild.icon)
    .bind(&guild.icon_hash)
    .bind(&guild.splash)
    .bind(&guild.discovery_splash)
    .bind(&guild.banner)
    .bind(&guild.description)
    .bind(guild.owner_id)
    .bind(guild.afk_channel_id)
    .bind(guild.afk_timeout)
    .bind(guild.widget_enabled)
    .bind(guild.widget_channel_id)
    .bind(guild.system_channel_id)
    .bind(guild.rules_channel_id)
    .bind(guild.public_updates_channel_id)
    .bind(guild.safety_alerts_channel_id)
    .bind(guild.verification_level)
    .bind(guild.default_message_notifications)
    .bind(guild.explicit_content_filter)
    .bind(guild.mfa_level)
    .bind(guild.nsfw_level)
    .bind(guild.system_channel_flags)
    .bind(&guild.features)
    .bind(guild.premium_tier)
    .bind(guild.premium_subscription_count)
    .bind(guild.premium_progress_bar_enabled)
    .bind(&guild.vanity_url_code)
    .bind(&guild.preferred_locale)
    .bind(guild.application_id)
    .bind(guild.max_presences)
    .bind(guild.max_members)
    .bind(guild.max_video_channel_users)
    .bind(guild.max_stage_video_channel_users)
    .bind(guild.approximate_member_count)
    .bind(guild.approximate_presence_count)
    .bind(&guild.welcome_screen)
    .bind(&guild.incidents_data)
    .bind(&guild.raw)
    .execute(pool)
    .await?;

    Ok(())
}
