use crate::domain::model::DrawResult;
use crate::utils::error::Result;

/// 一種取得最新開獎結果的來源
///
/// `Ok(None)` 表示 API 正常回應但還沒有資料；`Err` 表示明確的失敗。
pub trait DrawSource {
    fn name(&self) -> &str;
    fn fetch_latest(&self) -> Result<Option<DrawResult>>;
}
