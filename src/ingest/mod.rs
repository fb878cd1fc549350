pub mod backfill;
pub mod channel_fetcher;
pub mod guild_processor;
pub mod incremental;

pub use backfill::run_backfill;
pub use channel_fetcher::fetch_accessible_channels;
pub use guild_processor::process_guild;
pub use incremental::run_incremental;
