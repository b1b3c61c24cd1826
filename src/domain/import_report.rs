// ==========================================
// 商品批量导入引擎 - 导入结果
// ==========================================
// 职责: 导入结果 / 库存 JSON 导入结果 / 计数键
// 红线: 每次导入新建,返回后不可变
// ==========================================

use crate::domain::types::{BackendType, LinkageScheme, WriteStrategy};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::time::Duration;

/// 计数键（与 EAV 后端类型名并列）
pub mod count_keys {
    pub const STOCK: &str = "stock";
    pub const GALLERY: &str = "gallery";
    pub const PRICE_INDEX: &str = "price_index";
}

// ==========================================
// ImportResult - CSV 导入结果
// ==========================================
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ImportResult {
    pub run_id: String,                    // 导入运行 ID
    pub total_rows: usize,                 // CSV 数据行数
    pub created: usize,                    // 新建商品数
    pub updated: usize,                    // 更新商品行数
    pub skipped: usize,                    // 空 SKU 跳过行数
    pub warnings: Vec<String>,             // 非致命告警
    pub counts: BTreeMap<String, usize>,   // 各目标表写入行数
    pub linkage: LinkageScheme,            // 本次使用的关联方案
    pub write_strategy: WriteStrategy,     // 本次使用的写入策略
    pub process_time: Duration,            // 解析 + 处理耗时
    pub db_time: Duration,                 // 批量写入耗时
    pub total_time: Duration,              // 总耗时
}

impl ImportResult {
    pub fn count(&self, key: &str) -> usize {
        self.counts.get(key).copied().unwrap_or(0)
    }

    pub fn eav_count(&self, backend: BackendType) -> usize {
        self.count(backend.as_str())
    }

    /// 全部 EAV 值行数
    pub fn eav_total(&self) -> usize {
        BackendType::EAV.iter().map(|bt| self.eav_count(*bt)).sum()
    }
}

// ==========================================
// StockImportResult - JSON 库存导入结果
// ==========================================
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct StockImportResult {
    pub imported: usize,
    pub skipped: usize,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub warnings: Vec<String>,
}
