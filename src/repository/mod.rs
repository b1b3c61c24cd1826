// ==========================================
// 商品批量导入引擎 - 数据仓储层
// ==========================================
// 红线: Repository 不含业务逻辑
// 职责: 元数据读取 / 关联方案探测 / 实体分配 / 批量 upsert
// 约束: 所有值均参数化绑定；表名/列名只来自内部常量
// ==========================================

pub mod catalog_schema;
pub mod error;
pub mod product_import_repo;
pub mod product_import_repo_impl;
pub mod schema_detector;

// 重导出核心仓储
pub use catalog_schema::{create_catalog_schema, default_attribute_definitions, seed_attributes};
pub use error::{RepositoryError, RepositoryResult};
pub use product_import_repo::{ProductImportRepository, WriteContext};
pub use product_import_repo_impl::ProductImportRepositoryImpl;
pub use schema_detector::SchemaDetector;
