use sqlx::PgPool;

use crate::error::ArchiveResult;
use crate::models::{Emoji, GuildScheduledEvent, Role, Sticker};

pub async fn upsert_roles(pool: &PgPool, roles: &[Role]) -> ArchiveResult<()> {
    for role in roles {
        sqlx::query(
            "INSERT INTO roles (
                role_id, guild_id, name, color, colors, hoist, position,
                mentionable, icon, unicode_emoji, permissions, managed, tags,
                flags, raw
             ) VALUES ($1,$2,$3,$4,$5,$6,$7,$8,$9,$10,$11,$12,$13,$14,$15)
             ON CONFLICT (role_id) DO UPDATE SET
                name = EXCLUDED.name,
                color = EXCLUDED.color,
                position = EXCLUDED.position,
                permissions = EXCLUDED.permissions,
                raw = EXCLUDED.raw,
                updated_at = now()",
        )
        .bind(role.role_id)
        .bind(role.guild_id)
        .bind(&role.name)
        .bind(role.color)
        .bind(&role.colors)
        .bind(role.hoist)
        .bind(role.position)
        .bind(role.mentionable)
        .bind(&role.icon)
        .bind(&role.unicode_emoji)
        .bind(&role.permissions)
        .bind(role.managed)
        .bind(&role.tags)
        .bind(role.flags)
        .bind(&role.raw)
        .execute(pool)
        .await?;
    }
    Ok(())
}

pub async fn upsert_emojis(pool: &PgPool, emojis: &[Emoji]) -> ArchiveResult<()> {
    for emoji in emojis {
        sqlx::query(
            "INSERT INTO emojis (
                emoji_id, guild_id, name, animated, available, managed,
                require_colons, roles, user_id, raw
             ) VALUES ($1,$2,$3,$4,$5,$6,$7,$8,$9,$10)
             ON CONFLICT (emoji_id) DO UPDATE SET
                name = EXCLUDED.name,
                animated = EXCLUDED.animated,
                available = EXCLUDED.available,
                raw = EXCLUDED.raw,
                updated_at = now()",
        )
        .bind(emoji.emoji_id)
        .bind(emoji.guild_id)
        .bind(&emoji.name)
        .bind(emoji.animated)
        .bind(emoji.available)
        .bind(emoji.managed)
        .bind(emoji.require_colons)
        .bind(&emoji.roles)
        .bind(emoji.user_id)
        .bind(&emoji.raw)
        .execute(pool)
        .await?;
    }
    Ok(())
}

pub async fn upsert_stickers(pool: &PgPool, stickers: &[Sticker]) -> ArchiveResult<()> {
    for sticker in stickers {
        sqlx::query(
            "INSERT INTO stickers (
                sticker_id, guild_id, pack_id, name, description, tags, type,
                format_type, available, user_id, sort_value, raw
             ) VALUES ($1,$2,$3,$4,$5,$6,$7,$8,$9,$10,$11,$12)
             ON CONFLICT (sticker_id) DO UPDATE SET
                name = EXCLUDED.name,
                description = EXCLUDED.description,
                available = EXCLUDED.available,
                raw = EXCLUDED.raw,
                updated_at = now()",
        )
        .bind(sticker.sticker_id)
        .bind(sticker.guild_id)
        .bind(sticker.pack_id)
        .bind(&sticker.name)
        .bind(&sticker.description)
        .bind(&sticker.tags)
        .bind(sticker.sticker_type)
        .bind(sticker.format_type)
        .bind(sticker.available)
        .bind(sticker.user_id)
        .bind(sticker.sort_value)
        .bind(&sticker.raw)
        .execute(pool)
        .await?;
    }
    Ok(())
}

pub async fn upsert_scheduled_events(pool: &PgPool, events: &[GuildScheduledEvent]) -> ArchiveResult<()> {
    for event in events {
        sqlx::query(
            "INSERT INTO guild_scheduled_events (
                event_id, guild_id, channel_id, creator_id, name, description,
                image, scheduled_start_time, scheduled_end_time, privacy_level,
                status, entity_type, entity_id, entity_metadata, user_count,
                recurrence_rule, raw
             ) VALUES ($1,$2,$3,$4,$5,$6,$7,$8,$9,$10,$11,$12,$13,$14,$15,$16,$17)
             ON CONFLICT (event_id) DO UPDATE SET
                name = EXCLUDED.name,
                description = EXCLUDED.description,
                status = EXCLUDED.status,
                user_count = EXCLUDED.user_count,
                raw = EXCLUDED.raw,
                updated_at = now()",
        )
        .bind(event.event_id)
        .bind(event.guild_id)
        .bind(event.channel_id)
        .bind(event.creator_id)
        .bind(&event.name)
        .bind(&event.description)
        .bind(&event.image)
        .bind(event.scheduled_start_time)
        .bind(event.scheduled_end_time)
        .bind(event.privacy_level)
        .bind(event.status)
        .bind(event.entity_type)
        .bind(event.entity_id)
        .bind(&event.entity_metadata)
        .bind(event.user_count)
        .bind(&event.recurrence_rule)
        .bind(&event.raw)
        .execute(pool)
        .await?;
    }
    Ok(())
}
