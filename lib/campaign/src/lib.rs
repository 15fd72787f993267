//! Campaign domain and external collaborator seams for megaphone.
//!
//! This crate provides:
//!
//! - **Campaign model**: campaigns, creator links, outreach states
//! - **`CampaignService`**: campaign persistence seam with an in-memory
//!   implementation
//! - **`CreatorDirectory`**: third-party creator discovery search seam
//!   with an HTTP implementation
//! - **`Mailer`**: outbound email seam

pub mod campaign;
pub mod directory;
pub mod error;
pub mod mail;

pub use campaign::{
    Campaign, CampaignService, CampaignStatus, CreatorLink, InMemoryCampaignService, NewCampaign,
    OutreachState,
};
pub use directory::{
    CreatorDirectory, CreatorProfile, DiscoveryQuery, EngagementBucket, FollowerTier,
    HttpCreatorDirectory,
};
pub use error::{CampaignError, DirectoryError, MailError};
pub use mail::{Mailer, OutboundEmail, TracingMailer};
