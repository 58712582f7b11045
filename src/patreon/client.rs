use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use tokio::sync::Mutex;
use tokio::time::Instant;

use super::{CampaignData, CampaignSource, PatreonApi, PatreonError};
use crate::config::Config;

struct Snapshot {
    data: CampaignData,
    fetched_at: Instant,
}

/// Cached campaign lookups. Cloning shares the cache.
#[derive(Clone)]
pub struct PatreonClient {
    inner: Arc<Inner>,
}

struct Inner {
    source: Arc<dyn CampaignSource>,
    ttl: Duration,
    // 锁覆盖 新鲜度检查 + 拉取 + 写入，同一时间最多一个上游请求
    cache: Mutex<Option<Snapshot>>,
}

impl PatreonClient {
    pub fn new(source: Arc<dyn CampaignSource>, ttl: Duration) -> Self {
        Self {
            inner: Arc::new(Inner {
                source,
                ttl,
                cache: Mutex::new(None),
            }),
        }
    }

    pub fn from_config(config: &Config) -> Result<Self, PatreonError> {
        let api = PatreonApi::new(
            config.patreon_api_url.clone(),
            config.patreon_access_token.clone(),
            config.patreon_campaign_id.clone(),
        )?;
        Ok(Self::new(Arc::new(api), config.patreon_cache_ttl()))
    }

    pub fn enabled(&self) -> bool {
        self.inner.source.is_configured()
    }

    /// Returns campaign data, fetching only when the cached copy is older than the TTL.
    ///
    /// A failed refresh falls back to the previous snapshot, however old. The
    /// error is only returned when nothing has ever been cached. The refresh
    /// runs on its own task, so it completes and fills the cache even if the
    /// caller stops waiting.
    pub async fn get_campaign(&self) -> Result<CampaignData, PatreonError> {
        let inner = Arc::clone(&self.inner);

        tokio::spawn(async move { inner.get_or_refresh().await })
            .await
            .map_err(|e| PatreonError::Task(e.to_string()))?
    }

    /// The cached snapshot, if any, without touching the upstream.
    pub async fn cached(&self) -> Option<CampaignData> {
        self.inner
            .cache
            .lock()
            .await
            .as_ref()
            .map(|snapshot| snapshot.data.clone())
    }
}

impl Inner {
    async fn get_or_refresh(&self) -> Result<CampaignData, PatreonError> {
        let mut cache = self.cache.lock().await;

        if let Some(snapshot) = cache.as_ref() {
            if snapshot.fetched_at.elapsed() < self.ttl {
                return Ok(snapshot.data.clone());
            }
        }

        match self.source.fetch_campaign().await {
            Ok(mut data) => {
                data.cached_at = Some(Utc::now());
                *cache = Some(Snapshot {
                    data: data.clone(),
                    fetched_at: Instant::now(),
                });
                tracing::debug!(tiers = data.tiers.len(), "Refreshed Patreon campaign cache");
                Ok(data)
            }
            Err(e) => match cache.as_ref() {
                Some(snapshot) => {
                    tracing::warn!(error = %e, "Patreon fetch failed, returning stale cache");
                    Ok(snapshot.data.clone())
                }
                None => {
                    tracing::error!(error = %e, "Patreon fetch failed with nothing cached");
                    Err(e)
                }
            },
        }
    }
}
