//! Creator discovery search seam.
//!
//! The discovery search API is a third-party service. The platform is
//! pinned to the Instagram connector; other platforms are not exposed.
//! Pagination is offset-based (`skip`/`limit`), so results are not
//! guaranteed consistent across pages if the underlying index changes
//! between calls.

use crate::error::DirectoryError;
use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::str::FromStr;
use std::time::Duration;

/// Follower-count tier for discovery filtering.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FollowerTier {
    /// 1k – 10k followers.
    Nano,
    /// 10k – 100k followers.
    Micro,
    /// 100k – 500k followers.
    Mid,
    /// 500k – 1M followers.
    Macro,
    /// 1M+ followers.
    Mega,
}

impl FollowerTier {
    /// Returns the follower range for this tier as `(min, max)`; `max` is
    /// `None` for the open-ended top tier.
    #[must_use]
    pub const fn follower_range(&self) -> (u64, Option<u64>) {
        match self {
            Self::Nano => (1_000, Some(10_000)),
            Self::Micro => (10_000, Some(100_000)),
            Self::Mid => (100_000, Some(500_000)),
            Self::Macro => (500_000, Some(1_000_000)),
            Self::Mega => (1_000_000, None),
        }
    }
}

impl FromStr for FollowerTier {
    type Err = DirectoryError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "nano" => Ok(Self::Nano),
            "micro" => Ok(Self::Micro),
            "mid" => Ok(Self::Mid),
            "macro" => Ok(Self::Macro),
            "mega" => Ok(Self::Mega),
            other => Err(DirectoryError::BadQuery {
                reason: format!("unknown follower tier: {other}"),
            }),
        }
    }
}

/// Engagement-rate bucket for discovery filtering.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EngagementBucket {
    /// Below 1%.
    Low,
    /// 1% – 3%.
    Average,
    /// Above 3%.
    High,
}

impl FromStr for EngagementBucket {
    type Err = DirectoryError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "low" => Ok(Self::Low),
            "average" => Ok(Self::Average),
            "high" => Ok(Self::High),
            other => Err(DirectoryError::BadQuery {
                reason: format!("unknown engagement bucket: {other}"),
            }),
        }
    }
}

/// Filter parameters for a creator discovery search.
#[derive(Debug, Clone, Default, Serialize)]
pub struct DiscoveryQuery {
    /// ISO country code, e.g. `IN`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub country: Option<String>,
    /// Follower tier.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tier: Option<FollowerTier>,
    /// Engagement-rate bucket.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub engagement: Option<EngagementBucket>,
    /// Content category, e.g. `fashion`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
    /// Creator gender filter.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub gender: Option<String>,
    /// Content language.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub language: Option<String>,
    /// Keyword matched against creator bios.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub bio_keyword: Option<String>,
    /// Offset into the result set.
    pub skip: usize,
    /// Maximum results to return.
    pub limit: usize,
}

/// A creator returned by discovery search.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreatorProfile {
    /// Platform handle, e.g. `@wanderlust.priya`.
    pub handle: String,
    /// Display name.
    pub full_name: String,
    /// Follower count.
    pub followers: u64,
    /// Engagement rate as a fraction (0.034 = 3.4%).
    pub engagement_rate: f64,
    /// ISO country code.
    pub country: String,
    /// Primary content category.
    pub category: String,
    /// Content language.
    pub language: String,
    /// Profile bio.
    pub bio: String,
}

/// Trait for creator discovery search.
#[async_trait]
pub trait CreatorDirectory: Send + Sync {
    /// Runs a discovery search and returns a flat result page.
    ///
    /// # Errors
    ///
    /// Returns an error if the search API is unreachable or returns an
    /// unusable response.
    async fn search(&self, query: &DiscoveryQuery) -> Result<Vec<CreatorProfile>, DirectoryError>;
}

#[derive(Debug, Deserialize)]
struct SearchResponse {
    results: Vec<CreatorProfile>,
}

const DIRECTORY_TIMEOUT_SECS: u64 = 30;

/// HTTP client for the discovery search API, pinned to the Instagram
/// connector.
#[derive(Debug, Clone)]
pub struct HttpCreatorDirectory {
    client: Client,
    base_url: String,
    api_key: String,
}

impl HttpCreatorDirectory {
    /// Creates a new directory client.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be built.
    pub fn new(
        base_url: impl Into<String>,
        api_key: impl Into<String>,
    ) -> Result<Self, DirectoryError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(DIRECTORY_TIMEOUT_SECS))
            .build()
            .map_err(|e| DirectoryError::Unavailable {
                reason: e.to_string(),
            })?;
        Ok(Self {
            client,
            base_url: base_url.into(),
            api_key: api_key.into(),
        })
    }

    fn search_url(&self) -> String {
        // Platform is fixed: only the Instagram connector is wired up.
        format!("{}/instagram/search", self.base_url.trim_end_matches('/'))
    }
}

#[async_trait]
impl CreatorDirectory for HttpCreatorDirectory {
    async fn search(&self, query: &DiscoveryQuery) -> Result<Vec<CreatorProfile>, DirectoryError> {
        tracing::debug!(skip = query.skip, limit = query.limit, "searching creator directory");

        let response = self
            .client
            .post(self.search_url())
            .bearer_auth(&self.api_key)
            .json(query)
            .send()
            .await
            .map_err(|e| DirectoryError::Unavailable {
                reason: e.to_string(),
            })?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| DirectoryError::Unavailable {
                reason: e.to_string(),
            })?;

        if !status.is_success() {
            return Err(DirectoryError::BadResponse {
                reason: format!("status {status}: {}", body.chars().take(200).collect::<String>()),
            });
        }

        let parsed: SearchResponse =
            serde_json::from_str(&body).map_err(|e| DirectoryError::BadResponse {
                reason: e.to_string(),
            })?;
        Ok(parsed.results)
    }
}
