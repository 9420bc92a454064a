use crate::core::{DrawResult, DrawSource};

/// 先試主要來源，沒有結果才改用備援
pub struct FetchChain<P: DrawSource, F: DrawSource> {
    primary: P,
    fallback: F,
}

impl<P: DrawSource, F: DrawSource> FetchChain<P, F> {
    pub fn new(primary: P, fallback: F) -> Self {
        Self { primary, fallback }
    }

    pub fn fetch(&self) -> Option<DrawResult> {
        if let Some(result) = attempt(&self.primary) {
            return Some(result);
        }

        tracing::warn!("⚠️  {} 失敗，改用 {}...", self.primary.name(), self.fallback.name());
        let result = attempt(&self.fallback);
        if result.is_none() {
            tracing::error!("❌ 無法取得最新開獎結果，請稍後再執行一次。");
        }
        result
    }
}

fn attempt<S: DrawSource>(source: &S) -> Option<DrawResult> {
    match source.fetch_latest() {
        Ok(Some(result)) if !result.is_empty() => Some(result),
        Ok(_) => {
            tracing::warn!("{} 回應成功但尚無開獎資料", source.name());
            None
        }
        Err(e) => {
            tracing::error!("❌ {}: {}", source.name(), e.user_friendly_message());
            tracing::debug!("{} error detail: {:?}", source.name(), e);
            None
        }
    }
}
