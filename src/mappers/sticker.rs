use serde_json::Value;

use crate::dto::{i32_or, optional_i32, optional_id, optional_str, required_id, required_str};
use crate::error::ArchiveResult;
use crate::models::Sticker;

pub fn map_sticker(data: &Value) -> ArchiveResult<Sticker> {
    let user_id = match data.get("user") {
        Some(user) => optional_id(user, "id")?,
        None => None,
    };

    Ok(Sticker {
        sticker_id: required_id(data, "id")?,
        guild_id: optional_id(data, "guild_id")?,
        pack_id: optional_id(data, "pack_id")?,
        name: required_str(data, "name")?.to_string(),
        description: optional_str(data, "description"),
        tags: optional_str(data, "tags"),
        sticker_type: i32_or(data, "type", 0),
        format_type: i32_or(data, "format_type", 0),
        available: data.get("available").and_then(Value::as_bool),
        user_id,
        sort_value: optional_i32(data, "sort_value"),
        raw: data.clone(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn maps_guild_sticker() {
        let data = json!({
            "id": "1", "guild_id": "2", "name": "wave", "type": 2, "format_type": 1,
            "user": {"id": "3"},
        });
        let sticker = map_sticker(&data).unwrap();
        assert_eq!(sticker.sticker_id, 1);
        assert_eq!(sticker.guild_id, Some(2));
        assert_eq!(sticker.user_id, Some(3));
    }

    #[test]
    fn maps_standard_sticker_without_guild() {
        let data = json!({"id": "1", "name": "wave", "type": 1, "format_type": 1});
        let sticker = map_sticker(&data).unwrap();
        assert_eq!(sticker.guild_id, None);
        assert_eq!(sticker.user_id, None);
    }
}
