pub mod channel_repository;
pub mod checkpoint_repository;
pub mod entity_repository;
pub mod guild_repository;
pub mod message_repository;

pub use channel_repository::upsert_channels;
pub use checkpoint_repository::CheckpointRepository;
pub use entity_repository::{upsert_emojis, upsert_roles, upsert_scheduled_events, upsert_stickers};
pub use guild_repository::upsert_guild;
pub use message_repository::{get_channel_message_count, persist_message_batch, upsert_users};
