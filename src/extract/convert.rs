use bigdecimal::BigDecimal;
use chrono::NaiveDate;
use std::str::FromStr;

const AFFIRMATIVE: [&str; 3] = ["sim", "yes", "true"];
const NEGATIVE: [&str; 3] = ["não", "no", "false"];

/// 去除 CNPJ 中的标点（`.`、`/`、`-`）和空白，只保留数字
pub fn normalize_cnpj(raw: &str) -> String {
    raw.chars()
        .filter(|c| !matches!(c, '.' | '/' | '-') && !c.is_whitespace())
        .collect()
}

/// 解析巴西格式金额，如 `1.234,56` 或 `12,3456%`
pub fn parse_decimal(raw: &str) -> Option<BigDecimal> {
    // 只接受数字、分隔符、百分号、负号和空白，排除科学计数法
    if !raw
        .chars()
        .all(|c| c.is_ascii_digit() || matches!(c, '.' | ',' | '%' | '-') || c.is_whitespace())
    {
        return None;
    }

    let normalized = raw
        .trim()
        .replace('%', "")
        .replace('.', "")
        .replace(',', ".");
    let normalized = normalized.trim();
    if normalized.is_empty() {
        return None;
    }
    BigDecimal::from_str(normalized).ok()
}

/// 解析 `DD/MM/YYYY` 日期
pub fn parse_date(raw: &str) -> Option<NaiveDate> {
    NaiveDate::parse_from_str(raw.trim(), "%d/%m/%Y").ok()
}

/// 将肯定/否定词映射为布尔值，其他值视为未知
pub fn parse_flag(raw: &str) -> Option<bool> {
    let word = raw.trim().to_lowercase();
    if AFFIRMATIVE.contains(&word.as_str()) {
        Some(true)
    } else if NEGATIVE.contains(&word.as_str()) {
        Some(false)
    } else {
        None
    }
}
