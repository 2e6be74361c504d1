//! Timeline API client
//!
//! Reads a single user's recent posts from the X API v2, excluding
//! retweets and replies. Used by the discovery job to find posts worth
//! registering as derivative works.

use async_trait::async_trait;
use serde::Deserialize;
use thiserror::Error;
use tracing::debug;

/// Result type alias for timeline operations
pub type Result<T> = std::result::Result<T, TimelineError>;

/// Errors that can occur while reading a timeline
#[derive(Debug, Error)]
pub enum TimelineError {
    /// Transport-level failure reaching the API
    #[error("timeline request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// The API rejected the request with HTTP 429
    #[error("timeline API rate limit exceeded")]
    RateLimited,

    /// Any other non-success response from the API
    #[error("timeline API returned {status}: {message}")]
    Api {
        /// HTTP status code
        status: u16,
        /// Response body text for diagnosis
        message: String,
    },

    /// A field the client depends on was absent from the response
    #[error("timeline response missing field: {0}")]
    MissingField(&'static str),
}

/// One post from a user's timeline
#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct Post {
    pub id: String,
    pub text: String,
    #[serde(default)]
    pub created_at: Option<String>,
}

/// Configuration for the timeline API
#[derive(Debug, Clone)]
pub struct TimelineConfig {
    /// API base URL
    pub api_url: String,
    /// OAuth 2.0 bearer token
    pub bearer_token: String,
}

impl TimelineConfig {
    pub fn new(bearer_token: impl Into<String>) -> Self {
        Self {
            api_url: "https://api.twitter.com/2".to_string(),
            bearer_token: bearer_token.into(),
        }
    }
}

#[derive(Debug, Deserialize)]
struct UserLookupResponse {
    data: Option<UserData>,
}

#[derive(Debug, Deserialize)]
struct UserData {
    id: String,
}

#[derive(Debug, Deserialize)]
struct TimelineResponse {
    #[serde(default)]
    data: Vec<Post>,
}

/// Abstraction over the timeline so the discovery job can take fakes
#[async_trait]
pub trait Timeline: Send + Sync {
    /// Resolve a handle to the API's user ID
    async fn user_id_by_handle(&self, handle: &str) -> Result<String>;

    /// Most recent original posts for a user, newest first, excluding
    /// retweets and replies
    async fn recent_posts(&self, user_id: &str, max_results: u32) -> Result<Vec<Post>>;
}

/// HTTP client for the X API v2
pub struct TimelineClient {
    config: TimelineConfig,
    client: reqwest::Client,
}

impl TimelineClient {
    pub fn new(config: TimelineConfig) -> Self {
        Self {
            config,
            client: reqwest::Client::new(),
        }
    }

    async fn check_status(response: reqwest::Response) -> Result<reqwest::Response> {
        let status = response.status();
        if status.as_u16() == 429 {
            return Err(TimelineError::RateLimited);
        }
        if !status.is_success() {
            let message = response.text().await.unwrap_or_default();
            return Err(TimelineError::Api {
                status: status.as_u16(),
                message,
            });
        }
        Ok(response)
    }
}

#[async_trait]
impl Timeline for TimelineClient {
    async fn user_id_by_handle(&self, handle: &str) -> Result<String> {
        debug!("Looking up user ID for @{}", handle);

        let url = format!("{}/users/by/username/{}", self.config.api_url, handle);
        let response = self
            .client
            .get(&url)
            .bearer_auth(&self.config.bearer_token)
            .send()
            .await?;

        let response = Self::check_status(response).await?;
        let body: UserLookupResponse = response.json().await?;
        let user = body.data.ok_or(TimelineError::MissingField("data.id"))?;
        Ok(user.id)
    }

    async fn recent_posts(&self, user_id: &str, max_results: u32) -> Result<Vec<Post>> {
        // The API rejects page sizes below 5 and above 100
        let max_results = max_results.clamp(5, 100);
        debug!(
            "Fetching up to {} recent posts for user {}",
            max_results, user_id
        );

        let url = format!("{}/users/{}/tweets", self.config.api_url, user_id);
        let response = self
            .client
            .get(&url)
            .bearer_auth(&self.config.bearer_token)
            .query(&[
                ("exclude", "retweets,replies".to_string()),
                ("max_results", max_results.to_string()),
                ("tweet.fields", "created_at".to_string()),
            ])
            .send()
            .await?;

        let response = Self::check_status(response).await?;
        let body: TimelineResponse = response.json().await?;
        debug!("Fetched {} posts", body.data.len());
        Ok(body.data)
    }
}
