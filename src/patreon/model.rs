use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Campaign and tier data as served to the site.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CampaignData {
    pub campaign: Option<CampaignInfo>,
    pub tiers: Vec<TierInfo>,
    pub cached_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CampaignInfo {
    pub patron_count: i64,
    pub creation_name: String,
    pub url: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TierInfo {
    pub title: String,
    pub amount_cents: i64,
    pub patron_count: i64,
    pub description: String,
}

// JSON:API 信封（Patreon v2）
#[derive(Debug, Deserialize)]
pub(crate) struct Envelope {
    pub data: Resource,
    #[serde(default)]
    pub included: Vec<Resource>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct Resource {
    #[serde(rename = "type", default)]
    pub kind: String,
    #[serde(default)]
    pub id: String,
    #[serde(default)]
    pub attributes: serde_json::Value,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub(crate) struct CampaignAttrs {
    pub patron_count: i64,
    pub creation_name: Option<String>,
    pub url: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub(crate) struct TierAttrs {
    pub title: Option<String>,
    pub amount_cents: i64,
    pub patron_count: i64,
    pub description: Option<String>,
    pub published: bool,
}
