use std::time::Duration;

use async_trait::async_trait;
use reqwest::header::AUTHORIZATION;

use super::model::{CampaignAttrs, CampaignData, CampaignInfo, Envelope, TierAttrs, TierInfo};
use super::{CampaignSource, PatreonError};

const REQUEST_TIMEOUT: Duration = Duration::from_secs(10);
const ERROR_BODY_LIMIT: usize = 1024;

const CAMPAIGN_FIELDS: &str = "patron_count,creation_name,url";
const TIER_FIELDS: &str = "title,amount_cents,patron_count,description,published";

/// Patreon v2 API access for a single campaign.
pub struct PatreonApi {
    http: reqwest::Client,
    base_url: String,
    token: String,
    campaign_id: String,
}

impl PatreonApi {
    pub fn new(
        base_url: impl Into<String>,
        token: impl Into<String>,
        campaign_id: impl Into<String>,
    ) -> Result<Self, PatreonError> {
        let http = reqwest::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()?;

        Ok(Self {
            http,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            token: token.into(),
            campaign_id: campaign_id.into(),
        })
    }
}

#[async_trait]
impl CampaignSource for PatreonApi {
    fn is_configured(&self) -> bool {
        !self.token.is_empty() && !self.campaign_id.is_empty()
    }

    async fn fetch_campaign(&self) -> Result<CampaignData, PatreonError> {
        let url = format!("{}/campaigns/{}", self.base_url, self.campaign_id);

        let resp = self
            .http
            .get(&url)
            .header(AUTHORIZATION, format!("Bearer {}", self.token))
            .query(&[
                ("include", "tiers"),
                ("fields[campaign]", CAMPAIGN_FIELDS),
                ("fields[tier]", TIER_FIELDS),
            ])
            .send()
            .await?;

        let status = resp.status();
        if !status.is_success() {
            let body = read_error_body(resp).await;
            return Err(PatreonError::Status {
                status: status.as_u16(),
                body,
            });
        }

        let body = resp.text().await?;
        parse_campaign(&body)
    }
}

// 只读取前 ERROR_BODY_LIMIT 字节，不缓冲整个错误响应
async fn read_error_body(mut resp: reqwest::Response) -> String {
    let mut buf = Vec::with_capacity(ERROR_BODY_LIMIT);

    while buf.len() < ERROR_BODY_LIMIT {
        match resp.chunk().await {
            Ok(Some(chunk)) => {
                let take = chunk.len().min(ERROR_BODY_LIMIT - buf.len());
                buf.extend_from_slice(&chunk[..take]);
            }
            Ok(None) => break,
            Err(e) => {
                tracing::warn!(error = %e, "Failed to read Patreon error body");
                break;
            }
        }
    }

    String::from_utf8_lossy(&buf).into_owned()
}

/// Decodes a campaign envelope. Tiers that fail to decode are skipped,
/// unpublished tiers are dropped and the rest are ordered by price.
pub fn parse_campaign(body: &str) -> Result<CampaignData, PatreonError> {
    let envelope: Envelope = serde_json::from_str(body)?;
    let campaign: CampaignAttrs = serde_json::from_value(envelope.data.attributes)?;

    let mut tiers: Vec<TierInfo> = envelope
        .included
        .into_iter()
        .filter(|res| res.kind == "tier")
        .filter_map(|res| match serde_json::from_value::<TierAttrs>(res.attributes) {
            Ok(attrs) => Some(attrs),
            Err(e) => {
                tracing::warn!(id = %res.id, error = %e, "Skipping malformed Patreon tier");
                None
            }
        })
        .filter(|attrs| attrs.published)
        .map(|attrs| TierInfo {
            title: attrs.title.unwrap_or_default(),
            amount_cents: attrs.amount_cents,
            patron_count: attrs.patron_count,
            description: attrs.description.unwrap_or_default(),
        })
        .collect();

    tiers.sort_by_key(|t| t.amount_cents);

    Ok(CampaignData {
        campaign: Some(CampaignInfo {
            patron_count: campaign.patron_count,
            creation_name: campaign.creation_name.unwrap_or_default(),
            url: campaign.url.unwrap_or_default(),
        }),
        tiers,
        cached_at: None,
    })
}
