// ==========================================
// 商品批量导入引擎 - 库存 JSON 导入
// ==========================================
// 入参: {"items": [...], "batch_size": N} 或裸数组
// 口径:
// - 只查询已存在 SKU，不新建商品
// - 空 SKU / 未找到的 SKU 跳过并告警，计入 skipped
// - 未提供的字段沿用默认库存值
// ==========================================

use crate::config::import_options::DEFAULT_BATCH_SIZE;
use crate::domain::import_report::StockImportResult;
use crate::domain::product::StockItemInput;
use crate::domain::types::WriteStrategy;
use crate::importer::error::ImportError;
use crate::repository::product_import_repo::{ProductImportRepository, WriteContext};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::sync::Arc;
use tracing::{info, instrument, warn};

// ==========================================
// StockImportRequest - 请求体
// ==========================================
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StockImportRequest {
    #[serde(default)]
    pub items: Vec<StockItemInput>,
    #[serde(default)]
    pub batch_size: i64,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum StockImportBody {
    Items(Vec<StockItemInput>),
    Request(StockImportRequest),
}

impl StockImportRequest {
    /// 解析请求体（对象或裸数组）
    pub fn from_json(body: &str) -> Result<Self, ImportError> {
        let parsed: StockImportBody = serde_json::from_str(body)?;
        Ok(match parsed {
            StockImportBody::Request(req) => req,
            StockImportBody::Items(items) => StockImportRequest {
                items,
                batch_size: 0,
            },
        })
    }
}

// ==========================================
// StockImporter
// ==========================================
pub struct StockImporter<R: ProductImportRepository> {
    repo: Arc<R>,
}

impl<R: ProductImportRepository> StockImporter<R> {
    pub fn new(repo: Arc<R>) -> Self {
        Self { repo }
    }

    /// 导入库存条目
    ///
    /// # 参数
    /// - batch_size: ≤0 时使用默认值 500
    ///
    /// # 返回
    /// - Err(InvalidInput): 条目为空
    #[instrument(skip(self, items), fields(items = items.len()))]
    pub async fn import(
        &self,
        items: Vec<StockItemInput>,
        batch_size: i64,
    ) -> Result<StockImportResult, ImportError> {
        if items.is_empty() {
            return Err(ImportError::InvalidInput("items 不能为空".to_string()));
        }
        let batch_size = if batch_size <= 0 {
            DEFAULT_BATCH_SIZE
        } else {
            batch_size
        } as usize;

        let scheme = self.repo.detect_linkage().await?;
        if !scheme.is_known() {
            return Err(ImportError::LinkageUndetected(
                "EAV 副表既没有 entity_id 也没有 row_id 列".to_string(),
            ));
        }

        let mut seen: HashSet<&str> = HashSet::new();
        let skus: Vec<String> = items
            .iter()
            .map(|it| it.sku.trim())
            .filter(|sku| !sku.is_empty() && seen.insert(*sku))
            .map(str::to_string)
            .collect();

        let links = self
            .repo
            .lookup_skus(skus, scheme, batch_size)
            .await
            .map_err(|e| ImportError::SkuLookupError(e.to_string()))?;

        let mut result = StockImportResult::default();
        let mut rows = Vec::with_capacity(items.len());

        for item in items {
            let sku = item.sku.trim().to_string();
            if sku.is_empty() {
                result.skipped += 1;
                result.warnings.push("empty sku, skipping".to_string());
                continue;
            }
            let Some(link_id) = links.get(&sku).copied() else {
                result.skipped += 1;
                result.warnings.push(format!("sku={}: product not found", sku));
                continue;
            };
            rows.push(item.into_stock_item(link_id));
        }

        for w in &result.warnings {
            warn!("{}", w);
        }

        let ctx = WriteContext::new(scheme, batch_size, WriteStrategy::NativeBatch);
        result.imported = self.repo.upsert_stock_items(rows, ctx).await?;

        info!(
            imported = result.imported,
            skipped = result.skipped,
            "库存导入完成"
        );
        Ok(result)
    }
}
