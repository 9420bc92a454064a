use crate::adapters::http::{build_client, get_json};
use crate::config::DumpConfig;
use crate::utils::error::Result;
use std::fs;
use std::path::Path;

/// 抓取原始 API 回應並寫入檔案，所有錯誤都往上拋
pub fn run(config: &DumpConfig) -> Result<serde_json::Value> {
    let client = build_client(config.timeout)?;
    let payload = get_json(&client, &config.api_endpoint)?;
    write_payload(&config.output, &payload)?;
    Ok(payload)
}

/// 兩格縮排、保留中文字元，檔案已存在時直接覆寫
pub fn write_payload(path: &Path, payload: &serde_json::Value) -> Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)?;
    }

    let json_data = serde_json::to_string_pretty(payload)?;
    fs::write(path, json_data)?;
    tracing::debug!("Wrote API payload to {}", path.display());
    Ok(())
}
