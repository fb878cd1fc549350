//! Pure permission-bit arithmetic. No I/O.
//!
//! Mirrors the platform's own resolution order: base (role) permissions,
//! then channel overwrites applied `@everyone` -> combined roles -> member.

use std::collections::HashMap;

use serde_json::Value;

pub const ADMINISTRATOR: u64 = 1 << 3;
pub const VIEW_CHANNEL: u64 = 1 << 10;
pub const CONNECT: u64 = 1 << 20;
pub const READ_MESSAGE_HISTORY: u64 = 1 << 16;
pub const MANAGE_THREADS: u64 = 1 << 34;

const ALL_PERMISSIONS: u64 = u64::MAX;

/// Voice-family channel types that additionally require CONNECT to count
/// as accessible (2 = guild voice, 13 = stage).
const VOICE_CHANNEL_TYPES: [i32; 2] = [2, 13];

/// A single permission overwrite: allow bits OR'd in, deny bits cleared.
#[derive(Debug, Clone, Copy)]
pub struct Overwrite {
    pub allow: u64,
    pub deny: u64,
}

/// Resolved permission context for one user in one guild, built once per
/// guild and reused across every channel in that guild.
#[derive(Debug, Clone)]
pub struct PermissionContext {
    pub user_id: i64,
    pub role_ids: Vec<i64>,
    pub base_permissions: u64,
}

/// Builds the role_id -> permissions map from a guild's role list.
pub fn build_role_permissions_map(roles: &[(i64, u64)]) -> HashMap<i64, u64> {
    roles.iter().copied().collect()
}

/// Base guild-level permissions: OR of `@everyone` (role id == guild id)
/// and every role the user holds. ADMINISTRATOR short-circuits to all-ones.
pub fn compute_base_permissions(
    guild_id: i64,
    user_role_ids: &[i64],
    role_permissions: &HashMap<i64, u64>,
) -> u64 {
    let mut base = role_permissions.get(&guild_id).copied().unwrap_or(0);
    for role_id in user_role_ids {
        base |= role_permissions.get(role_id).copied().unwrap_or(0);
    }
    if base & ADMINISTRATOR != 0 {
        return ALL_PERMISSIONS;
    }
    base
}

/// Applies channel overwrites on top of base permissions, in the mandated
/// order: `@everyone` overwrite, then combined role overwrites, then the
/// member-specific overwrite.
pub fn compute_channel_permissions(
    base_permissions: u64,
    guild_id: i64,
    user_id: i64,
    user_role_ids: &[i64],
    everyone_overwrite: Option<Overwrite>,
    role_overwrites: &HashMap<i64, Overwrite>,
    member_overwrite: Option<Overwrite>,
) -> u64 {
    if base_permissions == ALL_PERMISSIONS {
        return ALL_PERMISSIONS;
    }

    let mut permissions = base_permissions;
    let _ = guild_id; // @everyone overwrite is keyed by role id == guild id upstream

    if let Some(ow) = everyone_overwrite {
        permissions &= !ow.deny;
        permissions |= ow.allow;
    }

    let mut combined_allow = 0u64;
    let mut combined_deny = 0u64;
    for role_id in user_role_ids {
        if let Some(ow) = role_overwrites.get(role_id) {
            combined_allow |= ow.allow;
            combined_deny |= ow.deny;
        }
    }
    permissions &= !combined_deny;
    permissions |= combined_allow;

    if let Some(ow) = member_overwrite {
        permissions &= !ow.deny;
        permissions |= ow.allow;
    }

    let _ = user_id; // kept for call-site clarity / symmetry with the allow/deny lookup keys
    permissions
}

/// Splits a channel's raw `permission_overwrites` array (type 0 = role,
/// type 1 = member) into the three shapes `compute_channel_permissions`
/// wants: the `@everyone` overwrite, a role_id -> overwrite map limited
/// to roles this user holds, and this user's member-specific overwrite.
pub fn parse_overwrites(
    overwrites: &Value,
    guild_id: i64,
    user_id: i64,
    user_role_ids: &[i64],
) -> (Option<Overwrite>, HashMap<i64, Overwrite>, Option<Overwrite>) {
    let mut everyone = None;
    let mut roles = HashMap::new();
    let mut member = None;

    let Some(items) = overwrites.as_array() else {
        return (everyone, roles, member);
    };

    for item in items {
        let Some(id) = item.get("id").and_then(Value::as_str).and_then(|s| s.parse::<i64>().ok()) else {
            continue;
        };
        let ow = Overwrite {
            allow: item
                .get("allow")
                .and_then(Value::as_str)
                .and_then(|s| s.parse::<u64>().ok())
                .unwrap_or(0),
            deny: item
                .get("deny")
                .and_then(Value::as_str)
                .and_then(|s| s.parse::<u64>().ok())
                .unwrap_or(0),
        };
        let overwrite_type = item.get("type").and_then(Value::as_i64).unwrap_or(0);

        if overwrite_type == 0 {
            if id == guild_id {
                everyone = Some(ow);
            } else if user_role_ids.contains(&id) {
                roles.insert(id, ow);
            }
        } else if overwrite_type == 1 && id == user_id {
            member = Some(ow);
        }
    }

    (everyone, roles, member)
}

pub fn can_view(permissions: u64) -> bool {
    permissions & VIEW_CHANNEL != 0
}

pub fn can_read_history(permissions: u64) -> bool {
    permissions & READ_MESSAGE_HISTORY != 0
}

pub fn can_manage_threads(permissions: u64) -> bool {
    permissions & MANAGE_THREADS != 0
}

pub fn can_connect(permissions: u64) -> bool {
    permissions & CONNECT != 0
}

/// A channel is message-accessible iff it can be viewed, and, for
/// voice-family channel types, CONNECT also holds.
pub fn can_access_channel(permissions: u64, channel_type: i32) -> bool {
    if !can_view(permissions) {
        return false;
    }
    if VOICE_CHANNEL_TYPES.contains(&channel_type) {
        return can_connect(permissions);
    }
    true
}

#[cfg(test)]
mod tests {
    use super::*;

    fn roles(pairs: &[(i64, u64)]) -> HashMap<i64, u64> {
        build_role_permissions_map(pairs)
    }

    #[test]
    fn base_permissions_are_everyone_or_roles() {
        let guild_id = 1;
        let role_perms = roles(&[(1, VIEW_CHANNEL), (2, READ_MESSAGE_HISTORY)]);
        let base = compute_base_permissions(guild_id, &[2], &role_perms);
        assert_eq!(base, VIEW_CHANNEL | READ_MESSAGE_HISTORY);
    }

    #[test]
    fn administrator_short_circuits_to_all_ones() {
        let guild_id = 1;
        let role_perms = roles(&[(1, 0), (2, ADMINISTRATOR)]);
        let base = compute_base_permissions(guild_id, &[2], &role_perms);
        assert_eq!(base, ALL_PERMISSIONS);

        // An all-ones base short-circuits channel overwrites too.
        let channel_perms = compute_channel_permissions(
            base,
            guild_id,
            42,
            &[2],
            Some(Overwrite {
                allow: 0,
                deny: VIEW_CHANNEL,
            }),
            &HashMap::new(),
            None,
        );
        assert_eq!(channel_perms, ALL_PERMISSIONS);
    }

    #[test]
    fn overwrites_apply_in_everyone_role_member_order() {
        let base = VIEW_CHANNEL | READ_MESSAGE_HISTORY;
        let everyone = Overwrite {
            allow: 0,
            deny: READ_MESSAGE_HISTORY,
        };
        let mut role_overwrites = HashMap::new();
        role_overwrites.insert(
            7,
            Overwrite {
                allow: READ_MESSAGE_HISTORY,
                deny: 0,
            },
        );
        let member = Overwrite {
            allow: 0,
            deny: VIEW_CHANNEL,
        };

        let result = compute_channel_permissions(
            base,
            1,
            99,
            &[7],
            Some(everyone),
            &role_overwrites,
            Some(member),
        );

        // everyone denies history -> role re-allows it -> member denies view.
        assert!(can_read_history(result));
        assert!(!can_view(result));
    }

    #[test]
    fn combined_role_overwrites_union_before_applying() {
        let base = 0u64;
        let mut role_overwrites = HashMap::new();
        role_overwrites.insert(
            1,
            Overwrite {
                allow: VIEW_CHANNEL,
                deny: 0,
            },
        );
        role_overwrites.insert(
            2,
            Overwrite {
                allow: 0,
                deny: VIEW_CHANNEL,
            },
        );

        // Both role overwrites apply; deny is combined and cleared first,
        // then combined allow is set - so the net effect is VIEW_CHANNEL set.
        let result =
            compute_channel_permissions(base, 1, 99, &[1, 2], None, &role_overwrites, None);
        assert!(can_view(result));
    }

    #[test]
    fn voice_channels_require_connect_in_addition_to_view() {
        let view_only = VIEW_CHANNEL;
        assert!(!can_access_channel(view_only, 2));
        assert!(can_access_channel(view_only, 0));

        let view_and_connect = VIEW_CHANNEL | CONNECT;
        assert!(can_access_channel(view_and_connect, 2));
        assert!(can_access_channel(view_and_connect, 13));
    }

    #[test]
    fn parse_overwrites_splits_everyone_role_and_member() {
        use serde_json::json;
        let data = json!([
            {"id": "1", "type": 0, "allow": "0", "deny": "1024"},
            {"id": "7", "type": 0, "allow": "65536", "deny": "0"},
            {"id": "999", "type": 0, "allow": "0", "deny": "0"},
            {"id": "99", "type": 1, "allow": "0", "deny": "1024"},
        ]);
        let (everyone, roles, member) = parse_overwrites(&data, 1, 99, &[7]);
        assert_eq!(everyone.unwrap().deny, VIEW_CHANNEL);
        assert!(roles.contains_key(&7));
        assert!(!roles.contains_key(&999));
        assert_eq!(member.unwrap().deny, VIEW_CHANNEL);
    }

    #[test]
    fn monotonic_in_allows_antitonic_in_denies() {
        let base = 0u64;
        let without_allow =
            compute_channel_permissions(base, 1, 99, &[], None, &HashMap::new(), None);
        let with_allow = compute_channel_permissions(
            base,
            1,
            99,
            &[],
            Some(Overwrite {
                allow: VIEW_CHANNEL,
                deny: 0,
            }),
            &HashMap::new(),
            None,
        );
        assert!(with_allow & VIEW_CHANNEL >= without_allow & VIEW_CHANNEL);

        let base_with_view = VIEW_CHANNEL;
        let without_deny =
            compute_channel_permissions(base_with_view, 1, 99, &[], None, &HashMap::new(), None);
        let with_deny = compute_channel_permissions(
            base_with_view,
            1,
            99,
            &[],
            Some(Overwrite {
                allow: 0,
                deny: VIEW_CHANNEL,
            }),
            &HashMap::new(),
            None,
        );
        assert!(with_deny & VIEW_CHANNEL <= without_deny & VIEW_CHANNEL);
    }
}
