//! On-disk configuration file.
//!
//! ```toml
//! [credentials]
//! user = "earthbot"
//! password = "…"
//!
//! [credentials.app]
//! client_id = "…"
//! client_secret = "…"
//!
//! [subreddit]
//! name = "EarthPorn"
//! sort = "hot"
//!
//! [subreddit.submissions]
//! limit = 25
//! allowed_extensions = ["jpg", "png"]
//!
//! [fetch]              # optional
//! max_concurrency = 8
//! horizontal_dir = "hori"
//! vertical_dir = "vert"
//! ```
//!
//! The file is read once at startup and turned into the explicit
//! [`FetchConfig`], [`ListingRequest`] and [`RedditCredentials`] values the
//! rest of the crate consumes.

use crate::config::{FetchConfig, DEFAULT_USER_AGENT};
use crate::error::WallsortError;
use crate::listing::{ListingRequest, ListingSort, RedditCredentials};
use serde::Deserialize;
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Settings {
    pub credentials: CredentialsSection,
    pub subreddit: SubredditSection,
    #[serde(default)]
    pub fetch: FetchSection,
}

#[derive(Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CredentialsSection {
    pub user: String,
    pub password: String,
    pub app: AppSection,
}

impl std::fmt::Debug for CredentialsSection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CredentialsSection")
            .field("user", &self.user)
            .field("password", &"<redacted>")
            .field("app.client_id", &self.app.client_id)
            .finish()
    }
}

#[derive(Clone, Deserialize)]
#[serde(deny_unknown_fields, rename_all = "kebab-case")]
pub struct AppSection {
    #[serde(alias = "client_id")]
    pub client_id: String,
    #[serde(alias = "client_secret")]
    pub client_secret: String,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SubredditSection {
    pub name: String,
    #[serde(default)]
    pub sort: ListingSort,
    pub submissions: SubmissionsSection,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields, rename_all = "kebab-case")]
pub struct SubmissionsSection {
    pub limit: u32,
    #[serde(alias = "allowed_extensions", alias = "allowedExtensions")]
    pub allowed_extensions: Vec<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct FetchSection {
    /// 0 or absent: unbounded.
    pub max_concurrency: Option<usize>,
    pub work_dir: Option<PathBuf>,
    pub horizontal_dir: Option<PathBuf>,
    pub vertical_dir: Option<PathBuf>,
    pub cleanup_on_failure: Option<bool>,
    pub user_agent: Option<String>,
}

impl Settings {
    /// Read and parse a TOML config file.
    pub fn load(path: &Path) -> Result<Self, WallsortError> {
        let text = std::fs::read_to_string(path).map_err(|e| match e.kind() {
            std::io::ErrorKind::NotFound => WallsortError::ConfigNotFound {
                path: path.to_path_buf(),
            },
            _ => WallsortError::ConfigParse(format!("{}: {e}", path.display())),
        })?;
        Self::from_toml_str(&text)
    }

    /// Parse settings from a TOML string.
    pub fn from_toml_str(text: &str) -> Result<Self, WallsortError> {
        toml::from_str(text).map_err(|e| WallsortError::ConfigParse(e.to_string()))
    }

    pub fn credentials(&self) -> RedditCredentials {
        RedditCredentials {
            user: self.credentials.user.clone(),
            password: self.credentials.password.clone(),
            client_id: self.credentials.app.client_id.clone(),
            client_secret: self.credentials.app.client_secret.clone(),
        }
    }

    pub fn listing_request(&self) -> ListingRequest {
        ListingRequest {
            subreddit: self.subreddit.name.clone(),
            sort: self.subreddit.sort,
            limit: self.subreddit.submissions.limit,
        }
    }

    /// Assemble a validated [`FetchConfig`]; unset `[fetch]` keys keep their defaults.
    pub fn fetch_config(&self) -> Result<FetchConfig, WallsortError> {
        let defaults = FetchConfig::default();
        let f = &self.fetch;
        FetchConfig::builder()
            .allowed_extensions(self.subreddit.submissions.allowed_extensions.clone())
            .max_concurrency(f.max_concurrency.unwrap_or(0))
            .work_dir(f.work_dir.clone().unwrap_or(defaults.work_dir))
            .horizontal_dir(f.horizontal_dir.clone().unwrap_or(defaults.horizontal_dir))
            .vertical_dir(f.vertical_dir.clone().unwrap_or(defaults.vertical_dir))
            .cleanup_on_failure(f.cleanup_on_failure.unwrap_or(false))
            .user_agent(
                f.user_agent
                    .clone()
                    .unwrap_or_else(|| DEFAULT_USER_AGENT.to_string()),
            )
            .build()
    }
}
