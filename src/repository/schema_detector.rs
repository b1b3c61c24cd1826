// ==========================================
// 商品批量导入引擎 - EAV 关联方案探测
// ==========================================
// 职责: 每个存储连接探测一次关联方案（entity_id / row_id）
// 口径:
// - 参考表 catalog_product_entity_varchar 含 entity_id → EntityId
// - 含 row_id → RowId
// - 都没有 → Unknown（由调用方报致命错误，不回退）
// - 引擎不支持内省（查询本身失败）→ 默认 EntityId
// ==========================================

use crate::db::table_columns;
use crate::domain::types::LinkageScheme;
use rusqlite::Connection;
use std::sync::OnceLock;

/// 探测所读取的参考属性表
pub const REFERENCE_TABLE: &str = "catalog_product_entity_varchar";

/// 关联方案探测器（结果缓存在自身，随所属仓储的生命周期存在）
#[derive(Debug, Default)]
pub struct SchemaDetector {
    cached: OnceLock<LinkageScheme>,
}

impl SchemaDetector {
    pub fn new() -> Self {
        Self::default()
    }

    /// 探测关联方案；并发调用方阻塞等待首次探测结果，之后无锁读取
    pub fn detect(&self, conn: &Connection) -> LinkageScheme {
        *self.cached.get_or_init(|| {
            let scheme = detect_uncached(conn);
            tracing::info!(linkage = %scheme, table = REFERENCE_TABLE, "EAV 关联方案探测完成");
            scheme
        })
    }

    /// 已缓存的结果（未探测时为 None）
    pub fn cached(&self) -> Option<LinkageScheme> {
        self.cached.get().copied()
    }

    /// 完全清空缓存（替换缓存单元）
    pub fn reset(&mut self) {
        self.cached = OnceLock::new();
    }
}

fn detect_uncached(conn: &Connection) -> LinkageScheme {
    match table_columns(conn, REFERENCE_TABLE) {
        Ok(columns) => classify_columns(&columns),
        Err(e) => {
            tracing::warn!(error = %e, "存储引擎不支持列内省，按 entity_id 方案处理");
            LinkageScheme::EntityId
        }
    }
}

fn classify_columns(columns: &[String]) -> LinkageScheme {
    let has = |name: &str| columns.iter().any(|c| c.eq_ignore_ascii_case(name));
    if has("entity_id") {
        LinkageScheme::EntityId
    } else if has("row_id") {
        LinkageScheme::RowId
    } else {
        LinkageScheme::Unknown
    }
}
