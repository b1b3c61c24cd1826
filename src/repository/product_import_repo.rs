// ==========================================
// 商品批量导入引擎 - 商品导入 Repository Trait
// ==========================================
// 职责: 定义导入相关数据访问接口（不包含业务逻辑）
// 红线: Repository 不含业务规则，只做元数据读取 / 实体分配 / 批量 upsert
// ==========================================

use crate::domain::flat_value::FlatValue;
use crate::domain::product::{
    AttributeDefinition, EavValueRow, MediaGalleryEntry, NewProductEntity, PriceIndexRow,
    SkuLinkMap, StockItem,
};
use crate::domain::types::{BackendType, LinkageScheme, WriteStrategy};
use crate::repository::error::RepositoryResult;
use async_trait::async_trait;
use std::collections::BTreeMap;
use tokio_util::sync::CancellationToken;

// ==========================================
// WriteContext - 单个写入任务的上下文
// ==========================================
#[derive(Debug, Clone)]
pub struct WriteContext {
    pub scheme: LinkageScheme,
    pub batch_size: usize,
    pub strategy: WriteStrategy,
    /// 任一写入任务失败后触发，其余任务在分块间隙检查并停止
    pub cancel: CancellationToken,
}

impl WriteContext {
    pub fn new(scheme: LinkageScheme, batch_size: usize, strategy: WriteStrategy) -> Self {
        Self {
            scheme,
            batch_size: batch_size.max(1),
            strategy,
            cancel: CancellationToken::new(),
        }
    }
}

// ==========================================
// ProductImportRepository Trait
// ==========================================
// 实现者: ProductImportRepositoryImpl（使用 rusqlite）
#[async_trait]
pub trait ProductImportRepository: Send + Sync {
    // ===== 元数据 =====

    /// 探测 EAV 关联方案（按连接缓存）
    async fn detect_linkage(&self) -> RepositoryResult<LinkageScheme>;

    /// 加载商品属性定义（entity_type_id = 4）
    async fn load_attributes(&self) -> RepositoryResult<Vec<AttributeDefinition>>;

    // ===== 实体解析 =====

    /// 批量查询已存在 SKU 的 LinkID
    ///
    /// # 参数
    /// - skus: 去重后的 SKU 列表
    /// - batch_size: 每次 IN 查询的 SKU 数
    ///
    /// # 返回
    /// - 仅包含已存在的 SKU
    async fn lookup_skus(
        &self,
        skus: Vec<String>,
        scheme: LinkageScheme,
        batch_size: usize,
    ) -> RepositoryResult<SkuLinkMap>;

    /// 批量创建商品主表行，返回新 SKU 的 LinkID
    ///
    /// # 说明
    /// - RowId 方案先整块预留 sequence，再按偏移写入
    /// - 每个分块一个事务；失败的分块不可单独恢复
    async fn create_entities(
        &self,
        entities: Vec<NewProductEntity>,
        scheme: LinkageScheme,
        batch_size: usize,
    ) -> RepositoryResult<SkuLinkMap>;

    // ===== 批量 upsert（每个方法对应一个写入目标）=====

    /// EAV 值行 upsert，唯一键 (link, attribute_id, store_id)
    async fn upsert_eav_values(
        &self,
        backend: BackendType,
        rows: Vec<EavValueRow>,
        ctx: WriteContext,
    ) -> RepositoryResult<usize>;

    /// 库存行 upsert，唯一键 (product_id, stock_id)
    async fn upsert_stock_items(
        &self,
        rows: Vec<StockItem>,
        ctx: WriteContext,
    ) -> RepositoryResult<usize>;

    /// 图库条目 upsert + 关联到商品
    async fn upsert_gallery_entries(
        &self,
        rows: Vec<MediaGalleryEntry>,
        ctx: WriteContext,
    ) -> RepositoryResult<usize>;

    /// 价格索引 upsert，唯一键 (entity_id, customer_group_id, website_id)
    async fn upsert_price_rows(
        &self,
        rows: Vec<PriceIndexRow>,
        ctx: WriteContext,
    ) -> RepositoryResult<usize>;

    // ===== 查询 =====

    /// 读取单个商品的扁平属性（store 级值覆盖默认值）
    ///
    /// # 返回
    /// - Ok(None): SKU 不存在
    async fn load_flat_attributes(
        &self,
        sku: &str,
        store_id: u16,
    ) -> RepositoryResult<Option<BTreeMap<String, FlatValue>>>;
}
