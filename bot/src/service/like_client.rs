use std::time::Duration;

use anyhow::{Context, Result};
use reqwest::StatusCode;
use serde_json::Value;
use tracing::{debug, warn};

/// Header carrying the API key, sent only when a key is configured.
pub const API_KEY_HEADER: &str = "x-rapidapi-key";
/// Header naming the API host, sent alongside [`API_KEY_HEADER`].
pub const API_HOST_HEADER: &str = "x-rapidapi-host";

/// Default deadline for one call to the like service.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(15);

/// Optional credential for the like service.
#[derive(Debug, Clone)]
pub struct ApiCredential {
    pub key: String,
    /// Value for the host header. Defaults to the base URL when `None`.
    pub host: Option<String>,
}

/// Counts reported by the service for a successful like.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LikeReport {
    pub player: String,
    pub likes_added: i64,
    pub likes_before: Option<i64>,
    pub likes_after: Option<i64>,
}

/// A validated 2xx response body.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LikePayload {
    /// `status == 1`
    Liked(LikeReport),
    /// Any other status: the player already got today's maximum.
    Maxed,
}

impl LikePayload {
    /// Interpret a response body. The body must be a JSON object; unknown or
    /// mistyped fields fall back to their defaults.
    pub fn from_json(value: &Value) -> Result<Self, String> {
        let Some(obj) = value.as_object() else {
            return Err(format!("expected a JSON object, got {value}"));
        };

        if obj.get("status").and_then(Value::as_i64) != Some(1) {
            return Ok(LikePayload::Maxed);
        }

        let int = |key: &str| obj.get(key).and_then(Value::as_i64);
        Ok(LikePayload::Liked(LikeReport {
            player: obj
                .get("player")
                .and_then(Value::as_str)
                .unwrap_or("Unknown")
                .to_string(),
            likes_added: int("likes_added").unwrap_or(0),
            likes_before: int("likes_before"),
            likes_after: int("likes_after"),
        }))
    }
}

/// Classified result of one call to the like service.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ServiceResult {
    /// HTTP 404: no such player.
    NotFound,
    /// Any other non-2xx status (`Some`) or a transport failure (`None`).
    Unavailable { status: Option<u16> },
    /// The call exceeded its deadline.
    Timeout,
    Payload(LikePayload),
    /// The response could not be read or interpreted.
    Unexpected(String),
}

/// HTTP client for the external like service. Holds one connection pool for
/// the lifetime of the process.
pub struct LikeServiceClient {
    http: reqwest::Client,
    base_url: String,
    credential: Option<ApiCredential>,
    timeout: Duration,
}

impl LikeServiceClient {
    pub fn new(
        base_url: impl Into<String>,
        credential: Option<ApiCredential>,
        timeout: Duration,
    ) -> Result<Self> {
        let http = reqwest::Client::builder()
            .user_agent(concat!("likebot/", env!("CARGO_PKG_VERSION")))
            .build()
            .context("Failed to build HTTP client")?;

        Ok(Self {
            http,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            credential,
            timeout,
        })
    }

    /// Client with no credential and the default timeout.
    pub fn with_base_url(base_url: impl Into<String>) -> Result<Self> {
        Self::new(base_url, None, DEFAULT_TIMEOUT)
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Ask the service to send likes to `uid`. Never fails: every fault is
    /// folded into a [`ServiceResult`].
    pub async fn fetch_like(&self, uid: &str) -> ServiceResult {
        match tokio::time::timeout(self.timeout, self.exchange(uid)).await {
            Ok(result) => result,
            Err(_) => {
                warn!(uid = %uid, timeout = ?self.timeout, "like service timed out");
                ServiceResult::Timeout
            }
        }
    }

    async fn exchange(&self, uid: &str) -> ServiceResult {
        let url = format!("{}/like", self.base_url);
        let mut req = self.http.get(&url).query(&[("uid", uid)]);

        if let Some(cred) = &self.credential {
            req = req
                .header(API_KEY_HEADER, &cred.key)
                .header(
                    API_HOST_HEADER,
                    cred.host.as_deref().unwrap_or(&self.base_url),
                );
        }

        let resp = match req.send().await {
            Ok(resp) => resp,
            Err(e) if e.is_timeout() => return ServiceResult::Timeout,
            Err(e) => {
                warn!(error = %e, url = %url, "like service request failed");
                return ServiceResult::Unavailable { status: None };
            }
        };

        let status = resp.status();
        debug!(uid = %uid, status = %status, "like service responded");

        if status == StatusCode::NOT_FOUND {
            return ServiceResult::NotFound;
        }
        if !status.is_success() {
            warn!(status = %status, "like service returned an error status");
            return ServiceResult::Unavailable {
                status: Some(status.as_u16()),
            };
        }

        let body = match resp.bytes().await {
            Ok(body) => body,
            Err(e) if e.is_timeout() => return ServiceResult::Timeout,
            Err(e) => return ServiceResult::Unexpected(format!("failed to read body: {e}")),
        };

        let value: Value = match serde_json::from_slice(&body) {
            Ok(v) => v,
            Err(e) => return ServiceResult::Unexpected(format!("invalid JSON body: {e}")),
        };

        match LikePayload::from_json(&value) {
            Ok(payload) => ServiceResult::Payload(payload),
            Err(e) => ServiceResult::Unexpected(e),
        }
    }

    /// Release the connection pool.
    pub fn close(self) {
        debug!(base_url = %self.base_url, "closing like service client");
        drop(self.http);
    }
}
