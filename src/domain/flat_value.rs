// ==========================================
// 商品批量导入引擎 - 扁平属性值
// ==========================================
// 职责: 对外展示商品属性时的带标签值类型 + 显式转换规则
// 转换: string / int / bool / list
// ==========================================

use crate::domain::product::{EavValue, DATETIME_FORMAT};
use serde::{Deserialize, Serialize};

/// 扁平属性值（code → FlatValue）
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FlatValue {
    Null,
    Bool(bool),
    Int(i64),
    Decimal(f64),
    Text(String),
    List(Vec<FlatValue>),
}

impl FlatValue {
    /// 转字符串
    ///
    /// - Null → None
    /// - List → 以逗号连接各元素
    pub fn as_string(&self) -> Option<String> {
        match self {
            FlatValue::Null => None,
            FlatValue::Bool(b) => Some(if *b { "1" } else { "0" }.to_string()),
            FlatValue::Int(i) => Some(i.to_string()),
            FlatValue::Decimal(d) => Some(d.to_string()),
            FlatValue::Text(s) => Some(s.clone()),
            FlatValue::List(items) => Some(
                items
                    .iter()
                    .filter_map(|v| v.as_string())
                    .collect::<Vec<_>>()
                    .join(","),
            ),
        }
    }

    /// 转整数
    ///
    /// - Decimal 仅当无小数部分时可转
    /// - Text 需能解析为整数
    pub fn as_i64(&self) -> Option<i64> {
        match self {
            FlatValue::Bool(b) => Some(i64::from(*b)),
            FlatValue::Int(i) => Some(*i),
            FlatValue::Decimal(d) if d.fract() == 0.0 && d.is_finite() => Some(*d as i64),
            FlatValue::Text(s) => s.trim().parse::<i64>().ok(),
            _ => None,
        }
    }

    /// 转布尔
    ///
    /// - 数值: 非零为 true
    /// - 文本: 1/true/yes/y/on 为 true, 0/false/no/n/off/空 为 false
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            FlatValue::Bool(b) => Some(*b),
            FlatValue::Int(i) => Some(*i != 0),
            FlatValue::Decimal(d) => Some(*d != 0.0),
            FlatValue::Text(s) => match s.trim().to_lowercase().as_str() {
                "1" | "true" | "yes" | "y" | "on" => Some(true),
                "0" | "false" | "no" | "n" | "off" | "" => Some(false),
                _ => None,
            },
            _ => None,
        }
    }

    /// 转列表（标量包装为单元素列表, Null 为空列表）
    pub fn as_list(&self) -> Vec<FlatValue> {
        match self {
            FlatValue::Null => Vec::new(),
            FlatValue::List(items) => items.clone(),
            other => vec![other.clone()],
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self, FlatValue::Null)
    }
}

impl From<EavValue> for FlatValue {
    fn from(value: EavValue) -> Self {
        match value {
            EavValue::Varchar(s) | EavValue::Text(s) => FlatValue::Text(s),
            EavValue::Int(i) => FlatValue::Int(i),
            EavValue::Decimal(d) => FlatValue::Decimal(d),
            EavValue::Datetime(dt) => FlatValue::Text(dt.format(DATETIME_FORMAT).to_string()),
        }
    }
}

impl From<Option<EavValue>> for FlatValue {
    fn from(value: Option<EavValue>) -> Self {
        value.map(FlatValue::from).unwrap_or(FlatValue::Null)
    }
}
