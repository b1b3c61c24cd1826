// ==========================================
// 商品批量导入引擎 - 领域类型定义
// ==========================================
// 职责: 属性后端类型 / EAV 关联方案 / 写入策略
// ==========================================

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

// ==========================================
// 属性后端类型 (Backend Type)
// ==========================================
// 决定属性值落在哪张 EAV 副表
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BackendType {
    Static,   // 主表字段,不走 EAV
    Varchar,  // 短字符串
    Int,      // 整数
    Decimal,  // 小数
    Text,     // 长文本
    Datetime, // 时间戳
}

impl BackendType {
    /// 走 EAV 副表的后端类型（不含 static），顺序即写入任务的派发顺序
    pub const EAV: [BackendType; 5] = [
        BackendType::Varchar,
        BackendType::Int,
        BackendType::Decimal,
        BackendType::Text,
        BackendType::Datetime,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            BackendType::Static => "static",
            BackendType::Varchar => "varchar",
            BackendType::Int => "int",
            BackendType::Decimal => "decimal",
            BackendType::Text => "text",
            BackendType::Datetime => "datetime",
        }
    }

    /// 对应的 EAV 副表名；static 没有副表
    pub fn eav_table(&self) -> Option<&'static str> {
        match self {
            BackendType::Static => None,
            BackendType::Varchar => Some("catalog_product_entity_varchar"),
            BackendType::Int => Some("catalog_product_entity_int"),
            BackendType::Decimal => Some("catalog_product_entity_decimal"),
            BackendType::Text => Some("catalog_product_entity_text"),
            BackendType::Datetime => Some("catalog_product_entity_datetime"),
        }
    }
}

impl fmt::Display for BackendType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for BackendType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "static" => Ok(BackendType::Static),
            "varchar" => Ok(BackendType::Varchar),
            "int" => Ok(BackendType::Int),
            "decimal" => Ok(BackendType::Decimal),
            "text" => Ok(BackendType::Text),
            "datetime" => Ok(BackendType::Datetime),
            other => Err(format!("未知的 backend_type: {}", other)),
        }
    }
}

// ==========================================
// EAV 关联方案 (Linkage Scheme)
// ==========================================
// EntityId: EAV 副表通过 entity_id 直接关联主表
// RowId: EAV 副表通过 row_id 关联主表的版本行（分期/版本化目录）
// Unknown: 探测失败,不得静默回退
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum LinkageScheme {
    EntityId,
    RowId,
    Unknown,
}

impl LinkageScheme {
    /// EAV 副表 / 图库关联表中指向主表的列名
    pub fn link_column(&self) -> &'static str {
        match self {
            LinkageScheme::RowId => "row_id",
            _ => "entity_id",
        }
    }

    pub fn is_known(&self) -> bool {
        !matches!(self, LinkageScheme::Unknown)
    }
}

impl fmt::Display for LinkageScheme {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LinkageScheme::EntityId => write!(f, "entity_id"),
            LinkageScheme::RowId => write!(f, "row_id"),
            LinkageScheme::Unknown => write!(f, "unknown"),
        }
    }
}

// ==========================================
// 写入策略 (Write Strategy)
// ==========================================
// 两种策略落库结果必须一致
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum WriteStrategy {
    /// 每个分块生成一条多行参数化 INSERT ... ON CONFLICT 语句
    GeneratedStatement,
    /// 驱动原生批量：缓存的预编译 upsert 在单事务内逐行执行
    NativeBatch,
}

impl WriteStrategy {
    pub fn from_raw_sql_mode(raw_sql_mode: bool) -> Self {
        if raw_sql_mode {
            WriteStrategy::GeneratedStatement
        } else {
            WriteStrategy::NativeBatch
        }
    }
}

impl fmt::Display for WriteStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            WriteStrategy::GeneratedStatement => write!(f, "Raw SQL"),
            WriteStrategy::NativeBatch => write!(f, "Native batch"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_backend_type_parse() {
        assert_eq!("varchar".parse::<BackendType>().unwrap(), BackendType::Varchar);
        assert_eq!(" DateTime ".parse::<BackendType>().unwrap(), BackendType::Datetime);
        assert!("gallery".parse::<BackendType>().is_err());
    }

    #[test]
    fn test_static_has_no_eav_table() {
        assert!(BackendType::Static.eav_table().is_none());
        for bt in BackendType::EAV {
            assert!(bt.eav_table().is_some());
        }
    }

    #[test]
    fn test_link_column() {
        assert_eq!(LinkageScheme::EntityId.link_column(), "entity_id");
        assert_eq!(LinkageScheme::RowId.link_column(), "row_id");
        assert!(!LinkageScheme::Unknown.is_known());
    }
}
