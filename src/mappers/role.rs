use serde_json::Value;

use crate::dto::{bool_or, i32_or, optional_str, required_id, required_str};
use crate::error::ArchiveResult;
use crate::models::Role;

/// Converts a role DTO into a persistence entity. Permissions are kept
/// as a decimal string end to end - Discord's 64-bit bitfields are
/// parsed to `u64` only where arithmetic happens, in the permission
/// calculator.
pub fn map_role(data: &Value, guild_id: i64) -> ArchiveResult<Role> {
    let permissions = optional_str(data, "permissions").unwrap_or_else(|| "0".to_string());

    Ok(Role {
        role_id: required_id(data, "id")?,
        guild_id,
        name: required_str(data, "name")?.to_string(),
        color: i32_or(data, "color", 0),
        colors: data.get("colors").cloned(),
        hoist: bool_or(data, "hoist", false),
        position: i32_or(data, "position", 0),
        mentionable: bool_or(data, "mentionable", false),
        icon: optional_str(data, "icon"),
        unicode_emoji: optional_str(data, "unicode_emoji"),
        permissions,
        managed: bool_or(data, "managed", false),
        tags: data.get("tags").cloned(),
        flags: i32_or(data, "flags", 0),
        raw: data.clone(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn maps_role_with_permissions_string() {
        let data = json!({
            "id": "9", "name": "Admin", "permissions": "8", "position": 1, "hoist": true,
        });
        let role = map_role(&data, 1).unwrap();
        assert_eq!(role.role_id, 9);
        assert_eq!(role.permissions, "8");
        assert!(role.hoist);
    }

    #[test]
    fn defaults_missing_permissions_to_zero() {
        let data = json!({"id": "9", "name": "Empty"});
        let role = map_role(&data, 1).unwrap();
        assert_eq!(role.permissions, "0");
    }
}
