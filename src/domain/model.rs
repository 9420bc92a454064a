use crate::utils::error::{LottoError, Result};
use serde::{Deserialize, Deserializer};

/// 威力彩單期開獎結果
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DrawResult {
    #[serde(default, deserialize_with = "deserialize_period")]
    pub period: Option<String>,
    #[serde(default)]
    pub lottery_date: Option<String>,
    #[serde(default)]
    pub draw_number_appear: Option<Vec<u32>>,
    #[serde(default)]
    pub draw_number_size: Option<Vec<u32>>,
    /// 其餘未列出的欄位
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

impl DrawResult {
    /// 開出順序，缺值視為空
    pub fn appear_order(&self) -> &[u32] {
        self.draw_number_appear.as_deref().unwrap_or_default()
    }

    /// 大小順序，缺值視為空
    pub fn size_order(&self) -> &[u32] {
        self.draw_number_size.as_deref().unwrap_or_default()
    }

    /// 只有 `{}` 這種完全沒有欄位的物件才等同於沒有資料
    pub fn is_empty(&self) -> bool {
        self.period.is_none()
            && self.lottery_date.is_none()
            && self.draw_number_appear.is_none()
            && self.draw_number_size.is_none()
            && self.extra.is_empty()
    }
}

// API 的期數有時是字串有時是數字
fn deserialize_period<'de, D>(deserializer: D) -> std::result::Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Period {
        Text(String),
        Number(i64),
    }

    Ok(Option::<Period>::deserialize(deserializer)?.map(|period| match period {
        Period::Text(text) => text,
        Period::Number(number) => number.to_string(),
    }))
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct EnvelopeContent {
    #[serde(rename = "superLotto638Result", default)]
    pub super_lotto638_result: Option<DrawResult>,
}

/// `LatestResult` API 的外層回應
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiEnvelope {
    #[serde(default)]
    pub rt_code: Option<i64>,
    #[serde(default)]
    pub rt_msg: Option<String>,
    #[serde(default)]
    pub content: Option<EnvelopeContent>,
}

impl ApiEnvelope {
    pub fn from_value(payload: serde_json::Value) -> Result<Self> {
        Ok(serde_json::from_value(payload)?)
    }

    /// rtCode 非 0 一律視為錯誤；rtCode 為 0 但沒有結果時回傳 `None`
    pub fn into_draw_result(self) -> Result<Option<DrawResult>> {
        match self.rt_code {
            Some(0) => Ok(self.content.and_then(|content| content.super_lotto638_result)),
            code => Err(LottoError::ApiRejected {
                code: code.unwrap_or(-1),
                message: self.rt_msg.unwrap_or_else(|| "(no rtMsg)".to_string()),
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn sample_payload() -> serde_json::Value {
        json!({
            "rtCode": 0,
            "rtMsg": "",
            "content": {
                "superLotto638Result": {
                    "period": "113000001",
                    "lotteryDate": "2024-01-02",
                    "drawNumberAppear": [1, 2, 3, 4, 5, 6, 7],
                    "drawNumberSize": [7, 1, 2, 3, 4, 5, 6]
                }
            }
        })
    }

    #[test]
    fn test_success_envelope_returns_nested_result() {
        let result = ApiEnvelope::from_value(sample_payload())
            .unwrap()
            .into_draw_result()
            .unwrap()
            .unwrap();

        assert_eq!(result.period.as_deref(), Some("113000001"));
        assert_eq!(result.lottery_date.as_deref(), Some("2024-01-02"));
        assert_eq!(result.appear_order(), &[1, 2, 3, 4, 5, 6, 7]);
        assert_eq!(result.size_order(), &[7, 1, 2, 3, 4, 5, 6]);
    }

    #[test]
    fn test_non_zero_rt_code_is_rejected_even_with_content() {
        let mut payload = sample_payload();
        payload["rtCode"] = json!(99);
        payload["rtMsg"] = json!("查無資料");

        let err = ApiEnvelope::from_value(payload)
            .unwrap()
            .into_draw_result()
            .unwrap_err();

        match err {
            LottoError::ApiRejected { code, message } => {
                assert_eq!(code, 99);
                assert_eq!(message, "查無資料");
            }
            other => panic!("unexpected error: {:?}", other),
        }
    }

    #[test]
    fn test_missing_rt_code_is_rejected() {
        let envelope = ApiEnvelope::from_value(json!({"content": {}})).unwrap();
        assert!(envelope.into_draw_result().is_err());
    }

    #[test]
    fn test_missing_nested_key_is_absent_not_error() {
        let envelope = ApiEnvelope::from_value(json!({"rtCode": 0, "content": {}})).unwrap();
        assert_eq!(envelope.into_draw_result().unwrap(), None);

        let envelope = ApiEnvelope::from_value(json!({"rtCode": 0, "content": null})).unwrap();
        assert_eq!(envelope.into_draw_result().unwrap(), None);
    }

    #[test]
    fn test_numeric_period_and_null_sequences() {
        let result: DrawResult = serde_json::from_value(json!({
            "period": 113000045,
            "lotteryDate": "2024-06-03T00:00:00",
            "drawNumberAppear": null
        }))
        .unwrap();

        assert_eq!(result.period.as_deref(), Some("113000045"));
        assert!(result.appear_order().is_empty());
        assert!(result.size_order().is_empty());
        assert!(!result.is_empty());
    }

    #[test]
    fn test_empty_object_is_empty_result() {
        let result: DrawResult = serde_json::from_value(json!({})).unwrap();
        assert!(result.is_empty());
    }

    #[test]
    fn test_unknown_fields_only_is_not_empty() {
        let result: DrawResult =
            serde_json::from_value(json!({"drawNumberExtra": [1, 2, 3]})).unwrap();

        assert!(!result.is_empty());
        assert!(result.appear_order().is_empty());
        assert_eq!(result.extra.get("drawNumberExtra"), Some(&json!([1, 2, 3])));
    }

    #[test]
    fn test_known_fields_are_not_duplicated_into_extra() {
        let result = ApiEnvelope::from_value(sample_payload())
            .unwrap()
            .into_draw_result()
            .unwrap()
            .unwrap();
        assert!(result.extra.is_empty());
    }
}
