#[cfg(feature = "cli")]
pub mod cli;

use crate::utils::error::Result;
use crate::utils::validation::{validate_path, validate_range, validate_url, Validate};
use std::path::PathBuf;
use std::time::Duration;

pub const API_URL: &str = "https://api.taiwanlottery.com/TLCAPIWeB/Lottery/LatestResult";
pub const PAGE_URL: &str = "https://www.taiwanlottery.com/lotto/lotto_lastest_result";
pub const DUMP_FILE: &str = "api_dump.json";

pub const DEFAULT_TIMEOUT_SECS: u64 = 15;
pub const DEFAULT_NAVIGATION_TIMEOUT_SECS: u64 = 60;
const MAX_TIMEOUT_SECS: u64 = 300;

/// 抓取開獎結果所需的設定
#[derive(Debug, Clone)]
pub struct FetchConfig {
    pub api_endpoint: String,
    pub page_url: String,
    /// 直接呼叫 API 的逾時，也是瀏覽器等待 API 回應的逾時
    pub timeout: Duration,
    pub navigation_timeout: Duration,
    pub chromium_path: Option<PathBuf>,
}

impl Default for FetchConfig {
    fn default() -> Self {
        Self {
            api_endpoint: API_URL.to_string(),
            page_url: PAGE_URL.to_string(),
            timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
            navigation_timeout: Duration::from_secs(DEFAULT_NAVIGATION_TIMEOUT_SECS),
            chromium_path: None,
        }
    }
}

impl FetchConfig {
    pub fn with_api_endpoint(mut self, api_endpoint: impl Into<String>) -> Self {
        self.api_endpoint = api_endpoint.into();
        self
    }
}

impl Validate for FetchConfig {
    fn validate(&self) -> Result<()> {
        validate_url("api_endpoint", &self.api_endpoint)?;
        validate_url("page_url", &self.page_url)?;
        validate_range("timeout_secs", self.timeout.as_secs(), 1, MAX_TIMEOUT_SECS)?;
        validate_range(
            "navigation_timeout_secs",
            self.navigation_timeout.as_secs(),
            1,
            MAX_TIMEOUT_SECS,
        )?;
        if let Some(path) = &self.chromium_path {
            validate_path("chromium_path", &path.to_string_lossy())?;
        }
        Ok(())
    }
}

/// 傾印工具的設定
#[derive(Debug, Clone)]
pub struct DumpConfig {
    pub api_endpoint: String,
    pub timeout: Duration,
    pub output: PathBuf,
}

impl Default for DumpConfig {
    fn default() -> Self {
        Self {
            api_endpoint: API_URL.to_string(),
            timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
            output: PathBuf::from(DUMP_FILE),
        }
    }
}

impl Validate for DumpConfig {
    fn validate(&self) -> Result<()> {
        validate_url("api_endpoint", &self.api_endpoint)?;
        validate_range("timeout_secs", self.timeout.as_secs(), 1, MAX_TIMEOUT_SECS)?;
        validate_path("output", &self.output.to_string_lossy())?;
        Ok(())
    }
}
