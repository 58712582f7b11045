//! Patreon campaign data behind a TTL cache that falls back to the last good
//! snapshot when the upstream API misbehaves.

mod api;
mod client;
mod model;

use async_trait::async_trait;
use thiserror::Error;

pub use api::{PatreonApi, parse_campaign};
pub use client::PatreonClient;
pub use model::{CampaignData, CampaignInfo, TierInfo};

#[derive(Debug, Error)]
pub enum PatreonError {
    #[error("patreon request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("patreon API {status}: {body}")]
    Status { status: u16, body: String },

    #[error("decode response: {0}")]
    Decode(#[from] serde_json::Error),

    #[error("refresh task failed: {0}")]
    Task(String),
}

/// Where campaign data comes from. [`PatreonApi`] is the real one.
#[async_trait]
pub trait CampaignSource: Send + Sync {
    /// Whether credentials are present; an unconfigured source is never fetched.
    fn is_configured(&self) -> bool;

    async fn fetch_campaign(&self) -> Result<CampaignData, PatreonError>;
}
