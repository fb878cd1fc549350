//! Single-host REST client: turns logical GET requests into JSON results,
//! interpreting the platform's retry / rate-limit / error contract.
//! Stateless across requests except for the underlying connection pool.

use std::time::Duration;

use reqwest::{Client, StatusCode};
use serde_json::Value;

use crate::error::{ArchiveError, ArchiveResult};

const BASE_URL: &str = "https://discord.com/api/v10";

const MAX_RETRIES: u32 = 5;
const MAX_RATE_LIMIT_RETRIES: u32 = 30;
const INITIAL_BACKOFF_SECS: f64 = 1.0;
const MAX_BACKOFF_SECS: f64 = 64.0;
const REQUEST_TIMEOUT_SECS: u64 = 30;

/// One HTTP client per account, scoped to that account's token - rate
/// limits and connection pooling are per-token on the remote.
#[derive(Clone)]
pub struct DiscordClient {
    http: Client,
    token: String,
    user_agent: String,
    base_url: String,
}

impl DiscordClient {
    pub fn new(token: impl Into<String>, user_agent: impl Into<String>) -> ArchiveResult<Self> {
        let http = Client::builder()
            .timeout(Duration::from_secs(REQUEST_TIMEOUT_SECS))
            .build()
            .map_err(|e| ArchiveError::Config(format!("failed to build http client: {e}")))?;
        Ok(Self {
            http,
            token: token.into(),
            user_agent: user_agent.into(),
            base_url: BASE_URL.to_string(),
        })
    }

    /// Points this client at a different host. Used in tests to run the
    /// retry/rate-limit state machine against a local mock server.
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    /// Issues a GET request to `path` (relative to the API base) with the
    /// retry / rate-limit / backoff state machine. Returns `None` on 204,
    /// the decoded JSON body on 200.
    pub async fn get(&self, path: &str, query: &[(&str, String)]) -> ArchiveResult<Option<Value>> {
        let url = format!("{}{path}", self.base_url);
        let mut backoff_secs = INITIAL_BACKOFF_SECS;
        let mut rate_limit_retries: u32 = 0;
        let mut attempt: u32 = 0;

        loop {
            let response = self
                .http
                .get(&url)
                .header("Authorization", &self.token)
                .header("User-Agent", &self.user_agent)
                .query(query)
                .send()
                .await;

            let response = match response {
                Ok(r) => r,
                Err(e) => {
                    if e.is_timeout() || e.is_connect() || e.is_request() {
                        if attempt < MAX_RETRIES {
                            tracing::warn!(attempt = attempt + 1, max = MAX_RETRIES, wait_secs = backoff_secs, reason = %e, "retrying after transport error");
                            tokio::time::sleep(Duration::from_secs_f64(backoff_secs)).await;
                            backoff_secs = (backoff_secs * 2.0).min(MAX_BACKOFF_SECS);
                            attempt += 1;
                            continue;
                        }
                        return Err(ArchiveError::Timeout);
                    }
                    return Err(ArchiveError::Http {
                        status: 0,
                        message: e.to_string(),
                    });
                }
            };

            match response.status() {
                StatusCode::OK => {
                    let body: Value = response.json().await.map_err(|e| {
                        ArchiveError::DataShape(format!("invalid JSON body: {e}"))
                    })?;
                    return Ok(Some(body));
                }
                StatusCode::NO_CONTENT => return Ok(None),
                StatusCode::TOO_MANY_REQUESTS => {
                    rate_limit_retries += 1;
                    if rate_limit_retries > MAX_RATE_LIMIT_RETRIES {
                        return Err(ArchiveError::RateLimitExhausted {
                            attempts: rate_limit_retries,
                        });
                    }
                    let retry_after = response
                        .headers()
                        .get("Retry-After")
                        .and_then(|v| v.to_str().ok())
                        .and_then(|v| v.parse::<f64>().ok())
                        .unwrap_or(1.0);
                    tracing::warn!(wait_secs = retry_after, attempt = rate_limit_retries, "rate limited");
                    tokio::time::sleep(Duration::from_secs_f64(retry_after)).await;
                    // Rate-limit waits never consume the attempt budget.
                    continue;
                }
                StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN | StatusCode::NOT_FOUND => {
                    let status = response.status().as_u16();
                    let message = extract_error_message(response).await;
                    return Err(ArchiveError::Http { status, message });
                }
                status if status.is_server_error() => {
                    if attempt < MAX_RETRIES {
                        tracing::warn!(attempt = attempt + 1, max = MAX_RETRIES, wait_secs = backoff_secs, status = status.as_u16(), "retrying after server error");
                        tokio::time::sleep(Duration::from_secs_f64(backoff_secs)).await;
                        backoff_secs = (backoff_secs * 2.0).min(MAX_BACKOFF_SECS);
                        attempt += 1;
                        continue;
                    }
                    let status = status.as_u16();
                    let message = extract_error_message(response).await;
                    return Err(ArchiveError::Http { status, message });
                }
                status => {
                    let status = status.as_u16();
                    let message = extract_error_message(response).await;
                    return Err(ArchiveError::Http { status, message });
                }
            }
        }
    }

    // -------------------------------------------------------------------
    // Guild endpoints
    // -------------------------------------------------------------------

    pub async fn get_guild(&self, guild_id: i64) -> ArchiveResult<Value> {
        self.require(self.get(&format!("/guilds/{guild_id}"), &[]).await?)
    }

    pub async fn get_guild_channels(&self, guild_id: i64) -> ArchiveResult<Vec<Value>> {
        self.require_array(self.get(&format!("/guilds/{guild_id}/channels"), &[]).await?)
    }

    // -------------------------------------------------------------------
    // Thread endpoints
    // -------------------------------------------------------------------

    pub async fn get_public_archived_threads(
        &self,
        channel_id: i64,
        before: Option<&str>,
    ) -> ArchiveResult<Value> {
        let mut query = vec![("limit", "100".to_string())];
        if let Some(before) = before {
            query.push(("before", before.to_string()));
        }
        self.require(
            self.get(&format!("/channels/{channel_id}/threads/archived/public"), &query)
                .await?,
        )
    }

    pub async fn get_private_archived_threads(
        &self,
        channel_id: i64,
        before: Option<&str>,
    ) -> ArchiveResult<Value> {
        let mut query = vec![("limit", "100".to_string())];
        if let Some(before) = before {
            query.push(("before", before.to_string()));
        }
        self.require(
            self.get(&format!("/channels/{channel_id}/threads/archived/private"), &query)
                .await?,
        )
    }

    // -------------------------------------------------------------------
    // Channel / message endpoints
    // -------------------------------------------------------------------

    pub async fn get_channel(&self, channel_id: i64) -> ArchiveResult<Value> {
        self.require(self.get(&format!("/channels/{channel_id}"), &[]).await?)
    }

    pub async fn get_messages(
        &self,
        channel_id: i64,
        limit: u32,
        before: Option<i64>,
        after: Option<i64>,
    ) -> ArchiveResult<Vec<Value>> {
        let mut query = vec![("limit", limit.min(100).to_string())];
        if let Some(before) = before {
            query.push(("before", before.to_string()));
        }
        if let Some(after) = after {
            query.push(("after", after.to_string()));
        }
        self.require_array(
            self.get(&format!("/channels/{channel_id}/messages"), &query)
                .await?,
        )
    }

    // -------------------------------------------------------------------
    // User endpoints
    // -------------------------------------------------------------------

    pub async fn get_user(&self, user_id: i64) -> ArchiveResult<Value> {
        self.require(self.get(&format!("/users/{user_id}"), &[]).await?)
    }

    pub async fn get_current_user(&self) -> ArchiveResult<Value> {
        self.require(self.get("/users/@me", &[]).await?)
    }

    pub async fn get_current_user_guild_member(&self, guild_id: i64) -> ArchiveResult<Value> {
        self.require(
            self.get(&format!("/users/@me/guilds/{guild_id}/member"), &[])
                .await?,
        )
    }

    // -------------------------------------------------------------------
    // Emoji / sticker / scheduled event endpoints
    // -------------------------------------------------------------------

    pub async fn get_guild_emojis(&self, guild_id: i64) -> ArchiveResult<Vec<Value>> {
        self.require_array(self.get(&format!("/guilds/{guild_id}/emojis"), &[]).await?)
    }

    pub async fn get_guild_stickers(&self, guild_id: i64) -> ArchiveResult<Vec<Value>> {
        self.require_array(self.get(&format!("/guilds/{guild_id}/stickers"), &[]).await?)
    }

    pub async fn get_guild_scheduled_events(&self, guild_id: i64) -> ArchiveResult<Vec<Value>> {
        self.require_array(
            self.get(
                &format!("/guilds/{guild_id}/scheduled-events"),
                &[("with_user_count", "true".to_string())],
            )
            .await?,
        )
    }

    fn require(&self, value: Option<Value>) -> ArchiveResult<Value> {
        value.ok_or_else(|| ArchiveError::DataShape("expected a JSON body, got 204".into()))
    }

    fn require_array(&self, value: Option<Value>) -> ArchiveResult<Vec<Value>> {
        match value {
            None => Ok(Vec::new()),
            Some(Value::Array(items)) => Ok(items),
            Some(_) => Err(ArchiveError::DataShape("expected a JSON array".into())),
        }
    }
}

async fn extract_error_message(response: reqwest::Response) -> String {
    let text = response.text().await.unwrap_or_default();
    serde_json::from_str::<Value>(&text)
        .ok()
        .and_then(|v| v.get("message").and_then(|m| m.as_str()).map(String::from))
        .unwrap_or(text)
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    // These tests exercise the retry/rate-limit state machine directly
    // through the low-level `get`, pointed at a wiremock server instead of
    // the real Discord host - `BASE_URL` itself is only used by the
    // endpoint-specific wrappers above, not by `get`'s retry loop logic,
    // so we reimplement just enough of it against an injected base url.

    async fn client_for(server: &MockServer) -> DiscordClient {
        DiscordClient::new("Bearer test-token", "discord-archivist-test/1.0")
            .unwrap()
            .with_base_url(server.uri())
    }

    #[tokio::test]
    async fn succeeds_on_first_200() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/guilds/1"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({"id": "1"})))
            .mount(&server)
            .await;

        let client = client_for(&server).await;
        let body = client.get("/guilds/1", &[]).await.unwrap();
        assert_eq!(body.unwrap()["id"], "1");
    }

    #[tokio::test]
    async fn retries_after_rate_limit_then_succeeds() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/channels/1/messages"))
            .respond_with(
                ResponseTemplate::new(429)
                    .insert_header("Retry-After", "0")
                    .set_body_json(serde_json::json!({"message": "rate limited"})),
            )
            .up_to_n_times(2)
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/channels/1/messages"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!([])))
            .mount(&server)
            .await;

        let client = client_for(&server).await;
        let body = client.get("/channels/1/messages", &[]).await.unwrap();
        assert_eq!(body.unwrap(), serde_json::json!([]));
    }

    #[tokio::test]
    async fn forbidden_fails_immediately_without_retry() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/guilds/1/emojis"))
            .respond_with(
                ResponseTemplate::new(403).set_body_json(serde_json::json!({"message": "missing access"})),
            )
            .expect(1)
            .mount(&server)
            .await;

        let client = client_for(&server).await;
        let err = client.get("/guilds/1/emojis", &[]).await.unwrap_err();
        assert!(err.is_forbidden());
    }

    #[tokio::test]
    async fn no_content_returns_none() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/channels/1"))
            .respond_with(ResponseTemplate::new(204))
            .mount(&server)
            .await;

        let client = client_for(&server).await;
        let body = client.get("/channels/1", &[]).await.unwrap();
        assert!(body.is_none());
    }
}
