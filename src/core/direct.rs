use crate::adapters::http::{build_client, get_json};
use crate::config::FetchConfig;
use crate::core::{ApiEnvelope, DrawResult, DrawSource};
use crate::utils::error::Result;

/// 直接呼叫官方 `LatestResult` API
pub struct DirectFetcher {
    config: FetchConfig,
}

impl DirectFetcher {
    pub fn new(config: FetchConfig) -> Self {
        Self { config }
    }
}

impl DrawSource for DirectFetcher {
    fn name(&self) -> &str {
        "API"
    }

    fn fetch_latest(&self) -> Result<Option<DrawResult>> {
        tracing::info!("🌐 正在抓取最新開獎結果 (API)...");
        let client = build_client(self.config.timeout)?;
        let payload = get_json(&client, &self.config.api_endpoint)?;
        ApiEnvelope::from_value(payload)?.into_draw_result()
    }
}
