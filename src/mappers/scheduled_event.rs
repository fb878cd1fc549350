use serde_json::Value;

use crate::dto::{optional_i32, optional_id, optional_iso8601, optional_str, parse_iso8601, required_id, required_str};
use crate::error::ArchiveResult;
use crate::models::GuildScheduledEvent;

pub fn map_scheduled_event(data: &Value) -> ArchiveResult<GuildScheduledEvent> {
    Ok(GuildScheduledEvent {
        event_id: required_id(data, "id")?,
        guild_id: required_id(data, "guild_id")?,
        channel_id: optional_id(data, "channel_id")?,
        creator_id: optional_id(data, "creator_id")?,
        name: required_str(data, "name")?.to_string(),
        description: optional_str(data, "description"),
        image: optional_str(data, "image"),
        scheduled_start_time: parse_iso8601(required_str(data, "scheduled_start_time")?)?,
        scheduled_end_time: optional_iso8601(data, "scheduled_end_time")?,
        privacy_level: required_int(data, "privacy_level")?,
        status: required_int(data, "status")?,
        entity_type: required_int(data, "entity_type")?,
        entity_id: optional_id(data, "entity_id")?,
        entity_metadata: data.get("entity_metadata").cloned(),
        user_count: optional_i32(data, "user_count"),
        recurrence_rule: data.get("recurrence_rule").cloned(),
        raw: data.clone(),
    })
}

fn required_int(data: &Value, field: &str) -> ArchiveResult<i32> {
    data.get(field)
        .and_then(Value::as_i64)
        .map(|n| n as i32)
        .ok_or_else(|| crate::error::ArchiveError::DataShape(format!("missing required field `{field}`")))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn maps_event_with_end_time() {
        let data = json!({
            "id": "1", "guild_id": "2", "name": "Movie Night",
            "scheduled_start_time": "2023-05-01T20:00:00+00:00",
            "scheduled_end_time": "2023-05-01T22:00:00+00:00",
            "privacy_level": 2, "status": 1, "entity_type": 3,
        });
        let event = map_scheduled_event(&data).unwrap();
        assert_eq!(event.event_id, 1);
        assert!(event.scheduled_end_time.is_some());
    }

    #[test]
    fn maps_event_without_end_time() {
        let data = json!({
            "id": "1", "guild_id": "2", "name": "Stage Event",
            "scheduled_start_time": "2023-05-01T20:00:00+00:00",
            "privacy_level": 2, "status": 1, "entity_type": 1,
        });
        let event = map_scheduled_event(&data).unwrap();
        assert!(event.scheduled_end_time.is_none());
    }
}
