use serde_json::Value;

use crate::dto::{bool_or, optional_id, optional_str, required_id};
use crate::error::ArchiveResult;
use crate::models::Emoji;

pub fn map_emoji(data: &Value, guild_id: i64) -> ArchiveResult<Emoji> {
    let roles = data.get("roles").and_then(Value::as_array).map(|arr| {
        arr.iter()
            .filter_map(|r| r.as_str().and_then(|s| s.parse::<i64>().ok()))
            .collect()
    });

    let user_id = match data.get("user") {
        Some(user) => optional_id(user, "id")?,
        None => None,
    };

    Ok(Emoji {
        emoji_id: required_id(data, "id")?,
        guild_id,
        name: optional_str(data, "name"),
        animated: bool_or(data, "animated", false),
        available: bool_or(data, "available", true),
        managed: bool_or(data, "managed", false),
        require_colons: bool_or(data, "require_colons", true),
        roles,
        user_id,
        raw: data.clone(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn maps_emoji_with_creator() {
        let data = json!({
            "id": "41771983429993937", "name": "LUL", "roles": ["1", "2"],
            "user": {"id": "41771983429993000"}, "animated": false,
        });
        let emoji = map_emoji(&data, 5).unwrap();
        assert_eq!(emoji.emoji_id, 41771983429993937);
        assert_eq!(emoji.guild_id, 5);
        assert_eq!(emoji.roles, Some(vec![1, 2]));
        assert_eq!(emoji.user_id, Some(41771983429993000));
    }

    #[test]
    fn defaults_available_and_require_colons_true() {
        let data = json!({"id": "1", "name": "x"});
        let emoji = map_emoji(&data, 5).unwrap();
        assert!(emoji.available);
        assert!(emoji.require_colons);
        assert!(emoji.roles.is_none());
    }
}
