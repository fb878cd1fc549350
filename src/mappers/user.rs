use serde_json::Value;

use crate::dto::{bool_or, i64_or, optional_i32, optional_str, required_id};
use crate::error::ArchiveResult;
use crate::models::User;

pub fn map_user(data: &Value) -> ArchiveResult<User> {
    Ok(User {
        user_id: required_id(data, "id")?,
        username: optional_str(data, "username"),
        discriminator: optional_str(data, "discriminator"),
        global_name: optional_str(data, "global_name"),
        avatar: optional_str(data, "avatar"),
        avatar_decoration_data: data.get("avatar_decoration_data").cloned(),
        banner: optional_str(data, "banner"),
        accent_color: optional_i32(data, "accent_color"),
        bot: bool_or(data, "bot", false),
        system: bool_or(data, "system", false),
        public_flags: i64_or(data, "public_flags", 0),
        premium_type: optional_i32(data, "premium_type"),
        raw: data.clone(),
    })
}

/// Extracts every user object embedded in a message payload: the author,
/// plus anyone in the `mentions` array. May contain duplicate `user_id`s;
/// the repository layer dedupes within a batch.
pub fn extract_users_from_message(data: &Value) -> ArchiveResult<Vec<User>> {
    let mut users = Vec::new();
    if let Some(author) = data.get("author") {
        users.push(map_user(author)?);
    }
    if let Some(mentions) = data.get("mentions").and_then(Value::as_array) {
        for mention in mentions {
            users.push(map_user(mention)?);
        }
    }
    Ok(users)
}
