use thiserror::Error;

#[derive(Error, Debug)]
pub enum LottoError {
    #[error("API request failed: {0}")]
    ApiError(#[from] reqwest::Error),

    #[error("Response is not valid JSON: {0}")]
    SerializationError(#[from] serde_json::Error),

    #[error("API rejected the request (rtCode {code}): {message}")]
    ApiRejected { code: i64, message: String },

    #[error("Browser automation failed: {0}")]
    BrowserError(#[from] chromiumoxide::error::CdpError),

    #[error("Browser session error: {message}")]
    BrowserSessionError { message: String },

    #[error("Timed out after {seconds}s waiting for {phase}")]
    TimeoutError { phase: &'static str, seconds: u64 },

    #[error("Async runtime unavailable: {message}")]
    RuntimeError { message: String },

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Invalid value for '{field}' ({value}): {reason}")]
    InvalidConfigValueError {
        field: String,
        value: String,
        reason: String,
    },
}

impl LottoError {
    /// 給終端使用者看的訊息
    pub fn user_friendly_message(&self) -> String {
        match self {
            LottoError::ApiError(e) if e.is_status() => format!("API 回應狀態異常: {}", e),
            LottoError::ApiError(e) => format!("API 連線失敗: {}", e),
            LottoError::SerializationError(e) => format!("API 回傳不是 JSON: {}", e),
            LottoError::ApiRejected { message, .. } => format!("API 回應錯誤: {}", message),
            LottoError::BrowserError(e) => format!("瀏覽器取得開獎結果失敗: {}", e),
            LottoError::BrowserSessionError { message } => format!("瀏覽器作業失敗: {}", message),
            LottoError::TimeoutError { phase, seconds } => {
                format!("等待 {} 逾時 ({} 秒)", phase, seconds)
            }
            LottoError::RuntimeError { message } => format!("無法建立非同步執行環境: {}", message),
            LottoError::IoError(e) => format!("檔案存取失敗: {}", e),
            LottoError::InvalidConfigValueError { field, reason, .. } => {
                format!("設定值 {} 無效: {}", field, reason)
            }
        }
    }
}

pub type Result<T> = std::result::Result<T, LottoError>;
