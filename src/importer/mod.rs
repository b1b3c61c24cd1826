// ==========================================
// 商品批量导入引擎 - 导入层
// ==========================================
// 职责: CSV → 商品主表 + EAV 属性 + 库存 / 图库 / 价格索引
// 支持: CSV 商品导入, JSON 库存导入
// ==========================================

// 模块声明
pub mod column_classifier;
pub mod eav_collector;
pub mod entity_resolver;
pub mod error;
pub mod file_parser;
pub mod flush_orchestrator;
pub mod gallery_collector;
pub mod price_collector;
pub mod product_importer_impl;
pub mod product_importer_trait;
pub mod stock_collector;
pub mod stock_importer;
pub mod value_parser;

// 重导出核心类型
pub use column_classifier::{classify, ColumnLayout};
pub use entity_resolver::{EntityResolution, EntityResolver};
pub use error::{FlushFailure, ImportError};
pub use file_parser::{CsvParser, ParsedCsv};
pub use flush_orchestrator::{FlushBuffers, FlushOrchestrator, FlushReport};
pub use product_importer_impl::ProductImporterImpl;
pub use stock_importer::{StockImportRequest, StockImporter};

// 重导出 Trait 接口
pub use product_importer_trait::{FileParser, ProductImporter};
