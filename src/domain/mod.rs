// ==========================================
// 商品批量导入引擎 - 领域模型层
// ==========================================
// 职责: 定义领域实体、类型、导入结果
// 红线: 不含数据访问逻辑
// ==========================================

pub mod flat_value;
pub mod import_report;
pub mod product;
pub mod types;

// 重导出核心类型
pub use flat_value::FlatValue;
pub use import_report::{count_keys, ImportResult, StockImportResult};
pub use product::{
    AttributeCatalog, AttributeDefinition, EavValue, EavValueRow, MediaGalleryEntry,
    NewProductEntity, PriceIndexRow, SkuLinkMap, StockItem, StockItemInput,
};
pub use types::{BackendType, LinkageScheme, WriteStrategy};
