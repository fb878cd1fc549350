use clap::Parser;
use tracing::{error, info};
use tracing_subscriber::prelude::*;
use tracing_subscriber::{fmt, EnvFilter};

use discord_archivist::config::Config;
use discord_archivist::db;
use discord_archivist::orchestrator;

#[derive(Parser, Debug)]
#[command(name = "discord-archivist", about = "Resumable Discord message/metadata archival ingest")]
struct Args {
    #[arg(long, default_value = "config.json")]
    config: String,

    #[arg(long)]
    guild_id: Option<i64>,

    #[arg(long)]
    channel_id: Option<i64>,

    #[arg(short, long)]
    verbose: bool,

    #[arg(long)]
    debug: bool,

    #[arg(long)]
    log_file: Option<String>,
}

/// Human-readable formatter to stdout; `--log-file` additionally tees
/// plain text (no ANSI) to disk alongside whatever goes to stdout.
fn init_tracing(args: &Args) {
    let default_filter = if args.debug {
        "discord_archivist=debug,sqlx=debug,reqwest=debug"
    } else if args.verbose {
        "discord_archivist=debug,sqlx=warn"
    } else {
        "discord_archivist=info,sqlx=warn"
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| default_filter.parse().unwrap());

    let registry = tracing_subscriber::registry().with(filter);

    match &args.log_file {
        Some(path) => {
            let file = std::fs::OpenOptions::new()
                .create(true)
                .append(true)
                .open(path)
                .expect("failed to open --log-file");
            registry
                .with(fmt::layer())
                .with(fmt::layer().with_writer(file).with_ansi(false))
                .init();
        }
        None => {
            registry.with(fmt::layer()).init();
        }
    }
}

#[tokio::main]
async fn main() -> std::process::ExitCode {
    let args = Args::parse();
    init_tracing(&args);

    info!("discord-archivist starting");

    let config = match Config::from_json(&args.config) {
        Ok(config) => config,
        Err(e) => {
            error!(error = %e, "failed to load configuration");
            return std::process::ExitCode::from(1);
        }
    };

    if config.accounts.is_empty() {
        info!("no accounts configured, nothing to do");
        return std::process::ExitCode::SUCCESS;
    }

    let pool = match db::create_pool(&config.database_url).await {
        Ok(pool) => pool,
        Err(e) => {
            error!(error = %e, "failed to create database pool");
            return std::process::ExitCode::from(2);
        }
    };

    if let Err(e) = db::run_migrations(&pool).await {
        error!(error = %e, "failed to run migrations");
        return std::process::ExitCode::from(2);
    }

    let result = match (args.channel_id, args.guild_id) {
        (Some(channel_id), _) => orchestrator::run_channel_scoped(&config, &pool, channel_id).await,
        (None, Some(guild_id)) => orchestrator::run_guild_scoped(&config, &pool, guild_id).await,
        (None, None) => orchestrator::run_full(&config, &pool).await,
    };

    match result {
        Ok(summary) => {
            info!(
                guilds = summary.guilds,
                channels = summary.channels,
                messages = summary.messages,
                elapsed_secs = summary.elapsed.as_secs_f64(),
                "run complete"
            );
            std::process::ExitCode::SUCCESS
        }
        Err(e) => {
            error!(error = %e, "run failed");
            std::process::ExitCode::from(3)
        }
    }
}
