mod common;

use std::collections::HashSet;
use std::time::{SystemTime, UNIX_EPOCH};

use serde_json::json;
use serial_test::serial;

use discord_archivist::db::repositories::{persist_message_batch, upsert_channels, CheckpointRepository};
use discord_archivist::mappers::map_channel;
use discord_archivist::models::CHANNEL_TYPE_TEXT;

use common::test_pool;

/// Derives a channel id unlikely to collide with another test run,
/// without relying on forbidden nondeterministic helpers mid-assertion.
fn unique_id(salt: i64) -> i64 {
    let nanos = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap()
        .as_nanos() as i64;
    (nanos % 1_000_000_000) * 1000 + salt
}

async fn seed_channel(pool: &sqlx::PgPool, channel_id: i64) {
    let raw = json!({"id": channel_id.to_string(), "type": CHANNEL_TYPE_TEXT, "name": "general"});
    let channel = map_channel(&raw, None).unwrap();
    upsert_channels(pool, &[channel], &HashSet::new()).await.unwrap();
}

fn message_fixture(channel_id: i64, message_id: i64, author_id: i64, content: &str) -> serde_json::Value {
    json!({
        "id": message_id.to_string(),
        "channel_id": channel_id.to_string(),
        "author": {"id": author_id.to_string(), "username": "tester", "discriminator": "0", "bot": false},
        "content": content,
        "timestamp": "2024-01-01T00:00:00.000000+00:00",
        "type": 0,
        "tts": false,
        "flags": 0,
        "pinned": false,
        "mention_everyone": false,
        "mentions": [],
        "mention_roles": [],
        "embeds": [],
    })
}

#[tokio::test]
#[serial]
async fn rerunning_the_same_batch_does_not_duplicate_messages() {
    let pool = test_pool().await;
    let channel_id = unique_id(1);
    let message_id = unique_id(2);
    seed_channel(&pool, channel_id).await;

    let batch = vec![message_fixture(channel_id, message_id, unique_id(3), "hello")];

    let first = persist_message_batch(&pool, &batch, None).await.unwrap();
    let second = persist_message_batch(&pool, &batch, None).await.unwrap();
    assert_eq!(first, 1);
    assert_eq!(second, 1);

    let count: i64 = sqlx::query_scalar("SELECT count(*) FROM messages WHERE message_id = $1")
        .bind(message_id)
        .fetch_one(&pool)
        .await
        .unwrap();
    assert_eq!(count, 1, "re-observing a message must not duplicate the row");
}

#[tokio::test]
#[serial]
async fn nul_bytes_never_reach_persisted_content() {
    let pool = test_pool().await;
    let channel_id = unique_id(10);
    let message_id = unique_id(11);
    seed_channel(&pool, channel_id).await;

    let batch = vec![message_fixture(channel_id, message_id, unique_id(12), "hi\u{0}bye")];
    persist_message_batch(&pool, &batch, None).await.unwrap();

    let content: String = sqlx::query_scalar("SELECT content FROM messages WHERE message_id = $1")
        .bind(message_id)
        .fetch_one(&pool)
        .await
        .unwrap();
    assert_eq!(content, "hibye");
    assert!(!content.contains('\u{0}'));
}

#[tokio::test]
#[serial]
async fn checkpoint_oldest_never_increases_and_newest_never_decreases() {
    let pool = test_pool().await;
    let channel_id = unique_id(20);
    let guild_id = unique_id(21);
    let checkpoints = CheckpointRepository::new(&pool);

    checkpoints.update_oldest(channel_id, guild_id, 500).await.unwrap();
    checkpoints.update_oldest(channel_id, guild_id, 200).await.unwrap();
    checkpoints.update_oldest(channel_id, guild_id, 800).await.unwrap();

    let checkpoint = checkpoints.get(channel_id).await.unwrap().unwrap();
    assert_eq!(checkpoint.oldest_message_id, Some(200), "oldest must only ever decrease");

    checkpoints.update_newest(channel_id, guild_id, 600).await.unwrap();
    checkpoints.update_newest(channel_id, guild_id, 300).await.unwrap();
    let checkpoint = checkpoints.get(channel_id).await.unwrap().unwrap();
    assert_eq!(checkpoint.newest_message_id, Some(600), "newest must only ever increase");

    assert!(checkpoint.oldest_message_id.unwrap() <= checkpoint.newest_message_id.unwrap());
}

#[tokio::test]
#[serial]
async fn first_batch_seeds_both_frontiers_to_the_same_id() {
    let pool = test_pool().await;
    let channel_id = unique_id(30);
    let guild_id = unique_id(31);
    let checkpoints = CheckpointRepository::new(&pool);

    checkpoints.update_oldest(channel_id, guild_id, 777).await.unwrap();

    let checkpoint = checkpoints.get(channel_id).await.unwrap().unwrap();
    assert_eq!(checkpoint.oldest_message_id, Some(777));
    assert_eq!(checkpoint.newest_message_id, Some(777));
}

#[tokio::test]
#[serial]
async fn channel_two_pass_upsert_resolves_in_batch_parents_only() {
    let pool = test_pool().await;
    let parent_id = unique_id(40);
    let child_id = unique_id(41);
    let unknown_parent_id = unique_id(42);

    let parent_raw = json!({"id": parent_id.to_string(), "type": 4, "name": "category"});
    let child_raw = json!({
        "id": child_id.to_string(),
        "type": CHANNEL_TYPE_TEXT,
        "name": "general",
        "parent_id": parent_id.to_string(),
    });
    let orphan_raw = json!({
        "id": unique_id(43).to_string(),
        "type": CHANNEL_TYPE_TEXT,
        "name": "orphaned",
        "parent_id": unknown_parent_id.to_string(),
    });

    let known: HashSet<i64> = [parent_id, child_id].into_iter().collect();
    let channels = vec![
        map_channel(&parent_raw, Some(&known)).unwrap(),
        map_channel(&child_raw, Some(&known)).unwrap(),
        map_channel(&orphan_raw, Some(&known)).unwrap(),
    ];

    upsert_channels(&pool, &channels, &known).await.unwrap();

    let child_parent: Option<i64> = sqlx::query_scalar("SELECT parent_id FROM channels WHERE channel_id = $1")
        .bind(child_id)
        .fetch_one(&pool)
        .await
        .unwrap();
    assert_eq!(child_parent, Some(parent_id));

    let orphan_parent: Option<i64> = sqlx::query_scalar("SELECT parent_id FROM channels WHERE channel_id = $1")
        .bind(orphan_raw.get("id").unwrap().as_str().unwrap().parse::<i64>().unwrap())
        .fetch_one(&pool)
        .await
        .unwrap();
    assert_eq!(orphan_parent, None, "a parent outside the batch stays null, it's a soft reference");
}
