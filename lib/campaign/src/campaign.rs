//! Campaign model and persistence seam.
//!
//! The relational store behind campaigns is an external collaborator; the
//! tool executors program against [`CampaignService`], and the in-memory
//! implementation backs tests and single-process deployments.

use crate::error::CampaignError;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use megaphone_core::{CampaignId, CreatorId};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::str::FromStr;
use tokio::sync::RwLock;

/// Lifecycle status of a campaign.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CampaignStatus {
    /// Being drafted, not yet live.
    Draft,
    /// Actively running.
    Active,
    /// Temporarily paused.
    Paused,
    /// Finished.
    Completed,
}

impl CampaignStatus {
    /// Returns the lowercase string form.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Draft => "draft",
            Self::Active => "active",
            Self::Paused => "paused",
            Self::Completed => "completed",
        }
    }
}

impl FromStr for CampaignStatus {
    type Err = CampaignError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "draft" => Ok(Self::Draft),
            "active" => Ok(Self::Active),
            "paused" => Ok(Self::Paused),
            "completed" => Ok(Self::Completed),
            other => Err(CampaignError::UnknownStatus {
                value: other.to_string(),
            }),
        }
    }
}

/// Where a linked creator stands in the outreach funnel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OutreachState {
    /// Found via discovery, not yet contacted.
    Discovered,
    /// Outreach email sent.
    Contacted,
    /// Terms being negotiated.
    Negotiating,
    /// Contract signed.
    Signed,
    /// Creator declined.
    Declined,
}

impl OutreachState {
    /// Returns the lowercase string form.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Discovered => "discovered",
            Self::Contacted => "contacted",
            Self::Negotiating => "negotiating",
            Self::Signed => "signed",
            Self::Declined => "declined",
        }
    }
}

impl FromStr for OutreachState {
    type Err = CampaignError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "discovered" => Ok(Self::Discovered),
            "contacted" => Ok(Self::Contacted),
            "negotiating" => Ok(Self::Negotiating),
            "signed" => Ok(Self::Signed),
            "declined" => Ok(Self::Declined),
            other => Err(CampaignError::UnknownOutreachState {
                value: other.to_string(),
            }),
        }
    }
}

/// A creator linked to a campaign.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreatorLink {
    /// Unique identifier for this link.
    pub creator_id: CreatorId,
    /// The creator's platform handle.
    pub handle: String,
    /// Outreach funnel position.
    pub state: OutreachState,
    /// When the creator was linked.
    pub added_at: DateTime<Utc>,
}

impl CreatorLink {
    /// Links a freshly discovered creator.
    #[must_use]
    pub fn discovered(handle: impl Into<String>) -> Self {
        Self {
            creator_id: CreatorId::new(),
            handle: handle.into(),
            state: OutreachState::Discovered,
            added_at: Utc::now(),
        }
    }
}

/// A marketing campaign.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Campaign {
    /// Unique campaign identifier.
    pub id: CampaignId,
    /// Campaign name.
    pub name: String,
    /// The brand running the campaign.
    pub brand: String,
    /// Free-form description/brief.
    pub description: String,
    /// Total budget in cents.
    pub budget_cents: i64,
    /// Lifecycle status.
    pub status: CampaignStatus,
    /// Linked creators.
    pub creators: Vec<CreatorLink>,
    /// When the campaign was created.
    pub created_at: DateTime<Utc>,
    /// When the campaign was last updated.
    pub updated_at: DateTime<Utc>,
}

/// Parameters for creating a campaign.
#[derive(Debug, Clone)]
pub struct NewCampaign {
    /// Campaign name.
    pub name: String,
    /// The brand running the campaign.
    pub brand: String,
    /// Free-form description/brief.
    pub description: String,
    /// Total budget in cents.
    pub budget_cents: i64,
}

impl Campaign {
    /// Creates a draft campaign.
    #[must_use]
    pub fn new(params: NewCampaign) -> Self {
        let now = Utc::now();
        Self {
            id: CampaignId::new(),
            name: params.name,
            brand: params.brand,
            description: params.description,
            budget_cents: params.budget_cents,
            status: CampaignStatus::Draft,
            creators: Vec::new(),
            created_at: now,
            updated_at: now,
        }
    }
}

/// Trait for campaign persistence.
#[async_trait]
pub trait CampaignService: Send + Sync {
    /// Creates a campaign.
    async fn create(&self, params: NewCampaign) -> Result<Campaign, CampaignError>;

    /// Lists campaigns, optionally filtered by status.
    async fn list(&self, status: Option<CampaignStatus>) -> Result<Vec<Campaign>, CampaignError>;

    /// Gets a campaign by id.
    async fn get(&self, id: CampaignId) -> Result<Campaign, CampaignError>;

    /// Links creators to a campaign by handle. Handles already linked are
    /// skipped.
    async fn add_creators(
        &self,
        id: CampaignId,
        handles: Vec<String>,
    ) -> Result<Campaign, CampaignError>;

    /// Updates a campaign's lifecycle status.
    async fn update_status(
        &self,
        id: CampaignId,
        status: CampaignStatus,
    ) -> Result<Campaign, CampaignError>;

    /// Deletes a campaign.
    async fn delete(&self, id: CampaignId) -> Result<(), CampaignError>;
}

/// In-memory campaign store.
#[derive(Debug, Default)]
pub struct InMemoryCampaignService {
    campaigns: RwLock<HashMap<CampaignId, Campaign>>,
}

impl InMemoryCampaignService {
    /// Creates an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl CampaignService for InMemoryCampaignService {
    async fn create(&self, params: NewCampaign) -> Result<Campaign, CampaignError> {
        let campaign = Campaign::new(params);
        let mut campaigns = self.campaigns.write().await;
        campaigns.insert(campaign.id, campaign.clone());
        tracing::info!(campaign_id = %campaign.id, name = %campaign.name, "campaign created");
        Ok(campaign)
    }

    async fn list(&self, status: Option<CampaignStatus>) -> Result<Vec<Campaign>, CampaignError> {
        let campaigns = self.campaigns.read().await;
        let mut result: Vec<Campaign> = campaigns
            .values()
            .filter(|c| status.is_none_or(|s| c.status == s))
            .cloned()
            .collect();
        result.sort_by_key(|c| c.created_at);
        Ok(result)
    }

    async fn get(&self, id: CampaignId) -> Result<Campaign, CampaignError> {
        let campaigns = self.campaigns.read().await;
        campaigns
            .get(&id)
            .cloned()
            .ok_or(CampaignError::NotFound { id })
    }

    async fn add_creators(
        &self,
        id: CampaignId,
        handles: Vec<String>,
    ) -> Result<Campaign, CampaignError> {
        let mut campaigns = self.campaigns.write().await;
        let campaign = campaigns
            .get_mut(&id)
            .ok_or(CampaignError::NotFound { id })?;

        for handle in handles {
            if campaign.creators.iter().any(|c| c.handle == handle) {
                continue;
            }
            campaign.creators.push(CreatorLink::discovered(handle));
        }
        campaign.updated_at = Utc::now();
        Ok(campaign.clone())
    }

    async fn update_status(
        &self,
        id: CampaignId,
        status: CampaignStatus,
    ) -> Result<Campaign, CampaignError> {
        let mut campaigns = self.campaigns.write().await;
        let campaign = campaigns
            .get_mut(&id)
            .ok_or(CampaignError::NotFound { id })?;
        campaign.status = status;
        campaign.updated_at = Utc::now();
        Ok(campaign.clone())
    }

    async fn delete(&self, id: CampaignId) -> Result<(), CampaignError> {
        let mut campaigns = self.campaigns.write().await;
        campaigns
            .remove(&id)
            .map(|_| ())
            .ok_or(CampaignError::NotFound { id })
    }
}
