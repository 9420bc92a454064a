use crate::utils::error::Result;
use reqwest::blocking::Client;
use std::time::Duration;

/// 模擬一般桌面瀏覽器，避免被簡單的機器人阻擋
pub const USER_AGENT: &str = "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) \
AppleWebKit/537.36 (KHTML, like Gecko) \
Chrome/120.0.0.0 Safari/537.36";

pub fn build_client(timeout: Duration) -> Result<Client> {
    Ok(Client::builder()
        .user_agent(USER_AGENT)
        .timeout(timeout)
        .build()?)
}

/// 單次 GET，非 2xx 或非 JSON 都回傳錯誤；要不要吞掉錯誤由呼叫端決定
pub fn get_json(client: &Client, url: &str) -> Result<serde_json::Value> {
    tracing::debug!("Making API request to: {}", url);
    let response = client.get(url).send()?;
    tracing::debug!("API response status: {}", response.status());

    let body = response.error_for_status()?.text()?;
    Ok(serde_json::from_str(&body)?)
}
