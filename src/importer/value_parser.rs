// ==========================================
// 商品批量导入引擎 - 值解析
// ==========================================
// 职责: 各收集器共用的"解析失败即告警跳过"工具
// 口径: 入参已去空白；空串由调用方视为"未提供"，不进入这里
// ==========================================

use crate::domain::product::{EavValue, DATETIME_FORMAT, DATE_FORMAT};
use crate::domain::types::BackendType;
use chrono::{NaiveDate, NaiveDateTime};

/// 收集结果: 有效行 + 非致命告警
#[derive(Debug, Clone)]
pub struct Collected<T> {
    pub rows: Vec<T>,
    pub warnings: Vec<String>,
}

impl<T> Default for Collected<T> {
    fn default() -> Self {
        Self {
            rows: Vec::new(),
            warnings: Vec::new(),
        }
    }
}

pub fn parse_int(raw: &str) -> Option<i64> {
    raw.parse::<i64>().ok()
}

/// 浮点解析；NaN / inf 视为非法
pub fn parse_decimal(raw: &str) -> Option<f64> {
    raw.parse::<f64>().ok().filter(|v| v.is_finite())
}

/// `YYYY-MM-DD HH:MM:SS`，降级 `YYYY-MM-DD`（零点）
pub fn parse_datetime(raw: &str) -> Option<NaiveDateTime> {
    NaiveDateTime::parse_from_str(raw, DATETIME_FORMAT)
        .ok()
        .or_else(|| {
            NaiveDate::parse_from_str(raw, DATE_FORMAT)
                .ok()
                .and_then(|d| d.and_hms_opt(0, 0, 0))
        })
}

/// 小无符号整数标记（is_in_stock / manage_stock）
pub fn parse_flag(raw: &str) -> Option<u16> {
    raw.parse::<u16>().ok()
}

/// 按后端类型转换；static 没有 EAV 值
pub fn convert_eav(backend: BackendType, raw: &str) -> Option<EavValue> {
    match backend {
        BackendType::Varchar => Some(EavValue::Varchar(raw.to_string())),
        BackendType::Text => Some(EavValue::Text(raw.to_string())),
        BackendType::Int => parse_int(raw).map(EavValue::Int),
        BackendType::Decimal => parse_decimal(raw).map(EavValue::Decimal),
        BackendType::Datetime => parse_datetime(raw).map(EavValue::Datetime),
        BackendType::Static => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_decimal_rejects_non_finite() {
        assert_eq!(parse_decimal("49.99"), Some(49.99));
        assert_eq!(parse_decimal("NaN"), None);
        assert_eq!(parse_decimal("inf"), None);
        assert_eq!(parse_decimal("abc"), None);
    }

    #[test]
    fn test_datetime_falls_back_to_date() {
        let full = parse_datetime("2026-03-01 12:30:00").unwrap();
        assert_eq!(full.format(DATETIME_FORMAT).to_string(), "2026-03-01 12:30:00");
        let date_only = parse_datetime("2026-03-01").unwrap();
        assert_eq!(date_only.format(DATETIME_FORMAT).to_string(), "2026-03-01 00:00:00");
        assert!(parse_datetime("not-a-date").is_none());
        assert!(parse_datetime("2026-13-01").is_none());
    }

    #[test]
    fn test_convert_eav_by_backend() {
        assert_eq!(convert_eav(BackendType::Int, "42"), Some(EavValue::Int(42)));
        assert_eq!(convert_eav(BackendType::Int, "4.2"), None);
        assert_eq!(
            convert_eav(BackendType::Text, "任意文本"),
            Some(EavValue::Text("任意文本".to_string()))
        );
        assert_eq!(convert_eav(BackendType::Static, "x"), None);
        assert_eq!(parse_flag("-1"), None);
    }
}
