use crate::core::DrawResult;
use chrono::{DateTime, Datelike, NaiveDate, NaiveDateTime};

/// 西元年轉民國年
pub const ROC_YEAR_OFFSET: i32 = 1911;
/// 六個一般號碼加上第二區
pub const MIN_DRAW_NUMBERS: usize = 7;
pub const UNKNOWN_DATE: &str = "未知日期";
pub const UNKNOWN_PERIOD: &str = "未知";
pub const INSUFFICIENT_DATA_MESSAGE: &str = "⚠️  開獎號碼資料不足，請稍後再試。";

const BORDER_WIDTH: usize = 40;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Summary {
    Ready(String),
    InsufficientData,
}

// 與 ISO 8601 相容的常見寫法，日期與時間之間可用 `T` 或空白
const DATE_TIME_FORMATS: [&str; 4] = [
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%dT%H:%M",
    "%Y-%m-%d %H:%M",
];

fn parse_calendar_date(value: &str) -> Option<NaiveDate> {
    if let Ok(date) = NaiveDate::parse_from_str(value, "%Y-%m-%d") {
        return Some(date);
    }

    DATE_TIME_FORMATS
        .iter()
        .find_map(|format| NaiveDateTime::parse_from_str(value, format).ok())
        .map(|dt| dt.date())
        .or_else(|| {
            DateTime::parse_from_rfc3339(value)
                .ok()
                .map(|dt| dt.date_naive())
        })
}

/// `2024-03-15` -> `113/03/15`；解析不了就原樣回傳
pub fn format_date(date: Option<&str>) -> String {
    let value = match date {
        Some(value) if !value.is_empty() => value,
        _ => return UNKNOWN_DATE.to_string(),
    };

    match parse_calendar_date(value) {
        Some(parsed) => format!(
            "{}/{:02}/{:02}",
            parsed.year() - ROC_YEAR_OFFSET,
            parsed.month(),
            parsed.day()
        ),
        None => value.to_string(),
    }
}

fn join_numbers(numbers: &[u32]) -> String {
    numbers
        .iter()
        .map(|n| format!("{:>2}", n))
        .collect::<Vec<_>>()
        .join("  ")
}

pub fn has_enough_numbers(result: &DrawResult) -> bool {
    result.appear_order().len() >= MIN_DRAW_NUMBERS
        && result.size_order().len() >= MIN_DRAW_NUMBERS
}

pub fn render_summary(result: &DrawResult) -> Summary {
    if !has_enough_numbers(result) {
        return Summary::InsufficientData;
    }

    let appear = result.appear_order();
    let size = result.size_order();
    let period = result.period.as_deref().unwrap_or(UNKNOWN_PERIOD);
    let title = format!(
        "威力彩 第{}期 ({})",
        period,
        format_date(result.lottery_date.as_deref())
    );
    let border = "═".repeat(BORDER_WIDTH);

    let block = [
        String::new(),
        border.clone(),
        format!("  🎰  {}", title),
        border.clone(),
        format!("📌 開出順序：{}", join_numbers(&appear[..6])),
        format!("🔢 大小順序：{}", join_numbers(&size[..6])),
        format!("🔴 第二區：  {:>2}", appear[6]),
        border,
        String::new(),
    ]
    .join("\n");

    Summary::Ready(block)
}
