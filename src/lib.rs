// ==========================================
// 商品批量导入引擎 - 核心库
// ==========================================
// 输入: CSV 商品表 / JSON 库存批次
// 输出: SQLite 中的 EAV 属性值、库存、图库、价格索引
// 流程: 解析 → 列分类 → 实体解析 → 收集 → 并发写入
// ==========================================

pub mod domain;

// 仓储: 元数据加载 / 关联方案探测 / 批量写入
pub mod repository;

pub mod importer;

// 导入参数（config_kv 默认值 + 调用方覆盖）
pub mod config;

pub mod db;
pub mod perf;
pub mod logging;

// 对外入口（CLI 与集成测试共用）
pub mod api;

pub use api::{ApiError, ImportApi};
pub use domain::types::{BackendType, LinkageScheme, WriteStrategy};
pub use domain::{FlatValue, ImportResult, StockImportResult};
pub use importer::{ImportError, ProductImporter, ProductImporterImpl, StockImporter};

pub const VERSION: &str = env!("CARGO_PKG_VERSION");

pub const APP_NAME: &str = "商品批量导入引擎";
