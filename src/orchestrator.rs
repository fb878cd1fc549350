//! Composition layer: iterates accounts / guilds / channels and calls
//! into the guild processor. Re-expressed as free functions over a
//! slice of accounts rather than the inheritance-based orchestrator
//! hierarchy of the system this was learned from - there is only one
//! concrete flow here, so a base class bought nothing.

use std::time::{Duration, Instant};

use serde_json::Value;
use sqlx::PgPool;
use tracing::{info, warn};

use crate::config::{AccountConfig, Config};
use crate::error::ArchiveResult;
use crate::http::DiscordClient;
use crate::ingest::guild_processor::process_channel;
use crate::ingest::process_guild;

/// Summed counts for a finished run, logged once at the end.
#[derive(Debug, Default)]
pub struct RunSummary {
    pub guilds: usize,
    pub channels: usize,
    pub messages: usize,
    pub elapsed: Duration,
}

fn build_client(account: &AccountConfig) -> ArchiveResult<DiscordClient> {
    DiscordClient::new(account.token.clone(), account.user_agent.clone())
}

/// Iterates every configured account and every guild it is scoped to.
/// Per-guild errors abort that guild and move on to the next; the
/// account itself is not aborted.
pub async fn run_full(config: &Config, pool: &PgPool) -> ArchiveResult<RunSummary> {
    run_filtered(config, pool, None).await
}

/// Same as `run_full` but skips any account/guild pair whose guild ID
/// does not match `guild_id`.
pub async fn run_guild_scoped(config: &Config, pool: &PgPool, guild_id: i64) -> ArchiveResult<RunSummary> {
    run_filtered(config, pool, Some(guild_id)).await
}

async fn run_filtered(config: &Config, pool: &PgPool, guild_filter: Option<i64>) -> ArchiveResult<RunSummary> {
    let started = Instant::now();
    let mut summary = RunSummary::default();

    for account in &config.accounts {
        let client = build_client(account)?;
        let guild_ids = Config::guild_ids_for_account(account);

        for guild_id in guild_ids {
            if let Some(filter) = guild_filter {
                if filter != guild_id {
                    continue;
                }
            }

            info!(account = account.name, guild_id, "starting guild");
            match process_guild(&client, pool, guild_id).await {
                Ok(counts) => {
                    summary.guilds += 1;
                    summary.channels += counts.channels;
                    summary.messages += counts.messages;
                    info!(
                        account = account.name,
                        guild_id,
                        channels = counts.channels,
                        messages = counts.messages,
                        "guild complete"
                    );
                }
                Err(e) => {
                    warn!(account = account.name, guild_id, error = %e, "guild aborted, continuing to next");
                }
            }
        }
    }

    summary.elapsed = started.elapsed();
    Ok(summary)
}

/// Tries each configured account in turn until one can resolve the
/// channel; runs a single-channel sync on that account. A channel
/// without a resolvable guild (DM / group DM) is skipped silently. If
/// no account can resolve the channel, logs a warning and returns an
/// empty summary rather than failing.
pub async fn run_channel_scoped(config: &Config, pool: &PgPool, channel_id: i64) -> ArchiveResult<RunSummary> {
    let started = Instant::now();

    for account in &config.accounts {
        let client = build_client(account)?;

        let channel = match client.get_channel(channel_id).await {
            Ok(channel) => channel,
            Err(e) if e.is_not_found() || e.is_forbidden() => continue,
            Err(e) => return Err(e),
        };

        let guild_id = channel
            .get("guild_id")
            .and_then(Value::as_str)
            .and_then(|s| s.parse::<i64>().ok());

        let Some(guild_id) = guild_id else {
            info!(channel_id, "channel has no guild, skipping (dm or group dm)");
            return Ok(RunSummary {
                elapsed: started.elapsed(),
                ..RunSummary::default()
            });
        };

        info!(account = account.name, channel_id, guild_id, "starting single-channel sync");
        let messages = process_channel(&client, pool, channel_id, guild_id).await?;

        return Ok(RunSummary {
            guilds: 0,
            channels: 1,
            messages,
            elapsed: started.elapsed(),
        });
    }

    warn!(channel_id, "no configured account could resolve this channel");
    Ok(RunSummary {
        elapsed: started.elapsed(),
        ..RunSummary::default()
    })
}

