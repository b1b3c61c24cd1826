// ==========================================
// 商品导入API
// ==========================================
// 职责: 封装商品 CSV 导入 / 库存 JSON 导入 / 属性回读 / 建库
// 配置: config_kv 中的全局默认值 + 调用方覆写
// ==========================================

use crate::api::error::{ApiError, ApiResult};
use crate::config::{ConfigManager, ImportConfigReader, ImportOptions, ImportOverrides};
use crate::db::open_sqlite_connection;
use crate::domain::flat_value::FlatValue;
use crate::domain::import_report::{ImportResult, StockImportResult};
use crate::domain::types::{LinkageScheme, WriteStrategy};
use crate::importer::{ProductImporter, ProductImporterImpl, StockImportRequest, StockImporter};
use crate::repository::{
    create_catalog_schema, default_attribute_definitions, seed_attributes,
    ProductImportRepository, ProductImportRepositoryImpl,
};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::sync::Arc;
use tracing::info;

/// 导入API响应（耗时以毫秒输出）
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ImportApiResponse {
    pub run_id: String,
    pub total_rows: usize,
    pub created: usize,
    pub updated: usize,
    pub skipped: usize,
    pub warnings: Vec<String>,
    /// 各写入目标行数（5 种 EAV 类型 + stock / gallery / price_index）
    pub counts: BTreeMap<String, usize>,
    pub linkage: LinkageScheme,
    pub write_strategy: WriteStrategy,
    pub process_ms: u64,
    pub db_ms: u64,
    pub total_ms: u64,
}

impl From<ImportResult> for ImportApiResponse {
    fn from(r: ImportResult) -> Self {
        Self {
            process_ms: r.process_time.as_millis() as u64,
            db_ms: r.db_time.as_millis() as u64,
            total_ms: r.total_time.as_millis() as u64,
            run_id: r.run_id,
            total_rows: r.total_rows,
            created: r.created,
            updated: r.updated,
            skipped: r.skipped,
            warnings: r.warnings,
            counts: r.counts,
            linkage: r.linkage,
            write_strategy: r.write_strategy,
        }
    }
}

/// 建库结果
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InitDatabaseResponse {
    pub linkage: LinkageScheme,
    pub attributes_seeded: usize,
}

/// 导入API
pub struct ImportApi {
    db_path: String,
}

impl ImportApi {
    pub fn new(db_path: impl Into<String>) -> Self {
        Self {
            db_path: db_path.into(),
        }
    }

    pub fn db_path(&self) -> &str {
        &self.db_path
    }

    fn create_repo(&self) -> ApiResult<Arc<ProductImportRepositoryImpl>> {
        let repo = ProductImportRepositoryImpl::new(&self.db_path)?;
        Ok(Arc::new(repo))
    }

    /// 读取 config_kv 中的默认值，再叠加覆写
    pub async fn resolve_options(&self, overrides: ImportOverrides) -> ApiResult<ImportOptions> {
        let config = ConfigManager::new(&self.db_path)
            .map_err(|e| ApiError::StorageUnavailable(e.to_string()))?;
        let base = config
            .load_import_options()
            .await
            .map_err(|e| ApiError::Internal(format!("读取导入配置失败: {}", e)))?;
        Ok(overrides.apply(base))
    }

    /// 导入商品 CSV
    ///
    /// # 参数
    /// - file_path: CSV 文件路径
    /// - overrides: 调用方覆写（store / batch_size / attribute_set / raw_sql_mode）
    ///
    /// # 返回
    /// - Ok(ImportApiResponse): 导入结果
    /// - Err(ApiError): 文件、元数据、关联方案、实体解析或写入错误
    pub async fn import_products(
        &self,
        file_path: &str,
        overrides: ImportOverrides,
    ) -> ApiResult<ImportApiResponse> {
        let options = self.resolve_options(overrides).await?;
        info!(
            file_path,
            store_id = options.store_id,
            batch_size = options.batch_size,
            attribute_set = options.attribute_set,
            mode = %options.write_strategy(),
            "商品导入请求"
        );

        let importer = ProductImporterImpl::new(self.create_repo()?, options);
        let result = importer.import_from_csv(file_path).await?;
        Ok(ImportApiResponse::from(result))
    }

    /// 导入库存 JSON（对象或裸数组）
    pub async fn import_stock_json(&self, body: &str) -> ApiResult<StockImportResult> {
        let request = StockImportRequest::from_json(body)?;
        if request.items.is_empty() {
            return Err(ApiError::InvalidInput("items 不能为空".to_string()));
        }
        let importer = StockImporter::new(self.create_repo()?);
        Ok(importer.import(request.items, request.batch_size).await?)
    }

    /// 读取单个商品的扁平属性
    ///
    /// # 返回
    /// - Err(NotFound): SKU 不存在
    pub async fn get_product_attributes(
        &self,
        sku: &str,
        store_id: u16,
    ) -> ApiResult<BTreeMap<String, FlatValue>> {
        let sku = sku.trim();
        if sku.is_empty() {
            return Err(ApiError::InvalidInput("sku 不能为空".to_string()));
        }
        let repo = self.create_repo()?;
        repo.load_flat_attributes(sku, store_id)
            .await?
            .ok_or_else(|| ApiError::NotFound(format!("商品(sku={})不存在", sku)))
    }

    /// 建库（幂等）并写入默认商品属性
    pub fn init_database(&self, scheme: LinkageScheme) -> ApiResult<InitDatabaseResponse> {
        if !scheme.is_known() {
            return Err(ApiError::InvalidInput("必须指定 entity_id 或 row_id 方案".to_string()));
        }
        let conn = open_sqlite_connection(&self.db_path)
            .map_err(|e| ApiError::StorageUnavailable(e.to_string()))?;
        create_catalog_schema(&conn, scheme).map_err(|e| ApiError::Storage(e.to_string()))?;
        let attributes_seeded = seed_attributes(&conn, &default_attribute_definitions())
            .map_err(|e| ApiError::Storage(e.to_string()))?;

        info!(db_path = %self.db_path, linkage = %scheme, attributes_seeded, "数据库初始化完成");
        Ok(InitDatabaseResponse {
            linkage: scheme,
            attributes_seeded,
        })
    }
}
