//! Submission listing: where candidate URLs come from.
//!
//! The orchestrator only needs "give me up to N submission URLs", so that
//! capability is the [`SubmissionSource`] trait. [`RedditSession`] is the
//! production implementation; tests substitute a fixed list.
//!
//! Authentication uses Reddit's OAuth2 password grant (script apps): the
//! client id/secret go in HTTP basic auth, the account user/password in the
//! form body. Every later request carries the bearer token.

use crate::error::WallsortError;
use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use tracing::{debug, info, warn};

/// Account and app credentials for the password grant.
#[derive(Clone, Default, Serialize, Deserialize)]
pub struct RedditCredentials {
    pub user: String,
    pub password: String,
    pub client_id: String,
    pub client_secret: String,
}

impl fmt::Debug for RedditCredentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RedditCredentials")
            .field("user", &self.user)
            .field("password", &"<redacted>")
            .field("client_id", &self.client_id)
            .field("client_secret", &"<redacted>")
            .finish()
    }
}

/// Listing sort order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ListingSort {
    #[default]
    Hot,
    New,
    Top,
    Rising,
    Controversial,
}

impl ListingSort {
    pub fn as_str(self) -> &'static str {
        match self {
            ListingSort::Hot => "hot",
            ListingSort::New => "new",
            ListingSort::Top => "top",
            ListingSort::Rising => "rising",
            ListingSort::Controversial => "controversial",
        }
    }
}

impl fmt::Display for ListingSort {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ListingSort {
    type Err = WallsortError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "hot" => Ok(ListingSort::Hot),
            "new" => Ok(ListingSort::New),
            "top" => Ok(ListingSort::Top),
            "rising" => Ok(ListingSort::Rising),
            "controversial" => Ok(ListingSort::Controversial),
            other => Err(WallsortError::InvalidConfig(format!(
                "unknown sort {other:?} (expected hot, new, top, rising or controversial)"
            ))),
        }
    }
}

/// What to list.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ListingRequest {
    pub subreddit: String,
    pub sort: ListingSort,
    pub limit: u32,
}

/// One listed post.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct Submission {
    pub url: String,
}

/// Anything that can list submissions for a [`ListingRequest`].
///
/// Failures are fatal to the whole run: no partial list is processed.
#[async_trait]
pub trait SubmissionSource: Send + Sync {
    async fn submissions(&self, request: &ListingRequest) -> Result<Vec<Submission>, WallsortError>;
}

/// Token and API base URLs. Overridable so tests can point at a mock server.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RedditEndpoints {
    pub token_url: String,
    pub api_base: String,
}

impl Default for RedditEndpoints {
    fn default() -> Self {
        Self {
            token_url: "https://www.reddit.com/api/v1/access_token".to_string(),
            api_base: "https://oauth.reddit.com".to_string(),
        }
    }
}

#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: Option<String>,
    error: Option<String>,
}

#[derive(Debug, Deserialize)]
struct Listing {
    data: ListingData,
}

#[derive(Debug, Deserialize)]
struct ListingData {
    children: Vec<Child>,
}

#[derive(Debug, Deserialize)]
struct Child {
    data: Submission,
}

/// Entry point for authenticating against Reddit.
pub struct RedditClient;

impl RedditClient {
    /// Exchange credentials for a bearer token.
    ///
    /// Reddit answers a bad password with `200 {"error": "invalid_grant"}`,
    /// so the body is checked as well as the status.
    pub async fn authenticate(
        http: Client,
        credentials: &RedditCredentials,
        endpoints: RedditEndpoints,
    ) -> Result<RedditSession, WallsortError> {
        let auth = |reason: String| WallsortError::Auth { reason };

        let response = http
            .post(&endpoints.token_url)
            .basic_auth(&credentials.client_id, Some(&credentials.client_secret))
            .form(&[
                ("grant_type", "password"),
                ("username", credentials.user.as_str()),
                ("password", credentials.password.as_str()),
            ])
            .send()
            .await
            .map_err(|e| auth(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(auth(format!("token endpoint returned HTTP {status}")));
        }

        let body: TokenResponse = response.json().await.map_err(|e| auth(e.to_string()))?;
        if let Some(error) = body.error {
            return Err(auth(error));
        }
        let token = body
            .access_token
            .filter(|t| !t.is_empty())
            .ok_or_else(|| auth("token response carried no access_token".into()))?;

        info!("Authenticated as u/{}", credentials.user);
        Ok(RedditSession {
            http,
            token,
            endpoints,
        })
    }
}

/// An authenticated Reddit API session.
pub struct RedditSession {
    http: Client,
    token: String,
    endpoints: RedditEndpoints,
}

impl fmt::Debug for RedditSession {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RedditSession")
            .field("token", &"<redacted>")
            .field("endpoints", &self.endpoints)
            .finish()
    }
}

#[async_trait]
impl SubmissionSource for RedditSession {
    async fn submissions(&self, request: &ListingRequest) -> Result<Vec<Submission>, WallsortError> {
        let listing_err = |reason: String| WallsortError::Listing {
            subreddit: request.subreddit.clone(),
            reason,
        };
        let url = format!(
            "{}/r/{}/{}",
            self.endpoints.api_base.trim_end_matches('/'),
            request.subreddit,
            request.sort
        );
        debug!("GET {} (limit {})", url, request.limit);

        let response = self
            .http
            .get(&url)
            .bearer_auth(&self.token)
            .query(&[("limit", request.limit.to_string()), ("raw_json", "1".to_string())])
            .send()
            .await
            .and_then(|r| r.error_for_status())
            .map_err(|e| listing_err(e.to_string()))?;

        let listing: Listing = response
            .json()
            .await
            .map_err(|e| listing_err(e.to_string()))?;

        let submissions: Vec<Submission> =
            listing.data.children.into_iter().map(|c| c.data).collect();
        info!(
            "Listed {} submissions from r/{} ({})",
            submissions.len(),
            request.subreddit,
            request.sort
        );
        Ok(submissions)
    }
}

/// A fixed submission list, for dry runs and tests.
#[derive(Debug, Clone, Default)]
pub struct StaticSource {
    urls: Vec<String>,
}

impl StaticSource {
    pub fn new<I, S>(urls: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            urls: urls.into_iter().map(Into::into).collect(),
        }
    }
}

#[async_trait]
impl SubmissionSource for StaticSource {
    async fn submissions(&self, request: &ListingRequest) -> Result<Vec<Submission>, WallsortError> {
        let limit = request.limit as usize;
        if self.urls.len() > limit {
            warn!(
                "Listing limit {} drops {} of {} URLs",
                limit,
                self.urls.len() - limit,
                self.urls.len()
            );
        }
        Ok(self
            .urls
            .iter()
            .take(limit)
            .map(|url| Submission { url: url.clone() })
            .collect())
    }
}
