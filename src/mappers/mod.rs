pub mod channel;
pub mod emoji;
pub mod guild;
pub mod message;
pub mod role;
pub mod scheduled_event;
pub mod sticker;
pub mod user;

pub use channel::{channel_type_name, is_text_based, map_channel};
pub use emoji::map_emoji;
pub use guild::map_guild;
pub use message::{emoji_key, map_attachment, map_message, map_messages, map_reaction};
pub use role::map_role;
pub use scheduled_event::map_scheduled_event;
pub use sticker::map_sticker;
pub use user::{extract_users_from_message, map_user};
