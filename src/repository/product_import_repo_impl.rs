// ==========================================
// 商品批量导入引擎 - 商品导入 Repository 实现
// ==========================================
// 职责: 实现导入相关数据访问（使用 rusqlite）
// 连接模型:
// - 元数据 / SKU 查询 / 实体分配: 共享连接（Arc<Mutex<Connection>>）
// - 批量 upsert: 每个写入任务独立打开连接，并发写依赖 busy_timeout + WAL
// - 阻塞的 SQLite 调用全部放在 spawn_blocking 线程
// ==========================================

mod entity;
mod gallery;
mod read_back;
mod upsert;

use crate::db::open_sqlite_connection;
use crate::domain::flat_value::FlatValue;
use crate::domain::product::{
    AttributeDefinition, EavValueRow, MediaGalleryEntry, NewProductEntity, PriceIndexRow,
    SkuLinkMap, StockItem,
};
use crate::domain::types::{BackendType, LinkageScheme};
use crate::perf::PerfGuard;
use crate::repository::error::{RepositoryError, RepositoryResult};
use crate::repository::product_import_repo::{ProductImportRepository, WriteContext};
use crate::repository::schema_detector::SchemaDetector;
use async_trait::async_trait;
use rusqlite::Connection;
use std::collections::BTreeMap;
use std::sync::{Arc, Mutex};

fn flush_op(backend: BackendType) -> &'static str {
    match backend {
        BackendType::Varchar => "flush_varchar",
        BackendType::Int => "flush_int",
        BackendType::Decimal => "flush_decimal",
        BackendType::Text => "flush_text",
        BackendType::Datetime => "flush_datetime",
        BackendType::Static => "flush_static",
    }
}

// ==========================================
// ProductImportRepositoryImpl
// ==========================================
pub struct ProductImportRepositoryImpl {
    db_path: String,
    conn: Arc<Mutex<Connection>>,
    detector: Arc<SchemaDetector>,
}

impl ProductImportRepositoryImpl {
    /// 创建新的 Repository 实例
    ///
    /// # 参数
    /// - db_path: 数据库文件路径（写入任务会各自按此路径开连接）
    pub fn new(db_path: &str) -> RepositoryResult<Self> {
        let conn = open_sqlite_connection(db_path)
            .map_err(|e| RepositoryError::ConnectionFailed(e.to_string()))?;

        Ok(Self {
            db_path: db_path.to_string(),
            conn: Arc::new(Mutex::new(conn)),
            detector: Arc::new(SchemaDetector::new()),
        })
    }

    pub fn db_path(&self) -> &str {
        &self.db_path
    }

    /// 清空关联方案缓存（表结构变更后 / 测试隔离）
    pub fn reset_linkage_detection(&mut self) {
        match Arc::get_mut(&mut self.detector) {
            Some(detector) => detector.reset(),
            None => self.detector = Arc::new(SchemaDetector::new()),
        }
    }

    /// 在阻塞线程上使用共享连接
    async fn with_shared_conn<T, F>(&self, op: &'static str, f: F) -> RepositoryResult<T>
    where
        T: Send + 'static,
        F: FnOnce(&mut Connection) -> RepositoryResult<T> + Send + 'static,
    {
        let conn = Arc::clone(&self.conn);
        tokio::task::spawn_blocking(move || {
            let _perf = PerfGuard::new(op);
            let mut guard = conn
                .lock()
                .map_err(|e| RepositoryError::LockPoisoned(e.to_string()))?;
            f(&mut guard)
        })
        .await?
    }

    /// 在阻塞线程上使用写入任务自己的连接
    async fn with_own_conn<T, F>(&self, op: &'static str, f: F) -> RepositoryResult<T>
    where
        T: Send + 'static,
        F: FnOnce(&mut Connection) -> RepositoryResult<T> + Send + 'static,
    {
        let db_path = self.db_path.clone();
        tokio::task::spawn_blocking(move || {
            let _perf = PerfGuard::new(op);
            let mut conn = open_sqlite_connection(&db_path)
                .map_err(|e| RepositoryError::ConnectionFailed(e.to_string()))?;
            f(&mut conn)
        })
        .await?
    }
}

#[async_trait]
impl ProductImportRepository for ProductImportRepositoryImpl {
    async fn detect_linkage(&self) -> RepositoryResult<LinkageScheme> {
        if let Some(scheme) = self.detector.cached() {
            return Ok(scheme);
        }
        let detector = Arc::clone(&self.detector);
        self.with_shared_conn("detect_linkage", move |conn| Ok(detector.detect(conn)))
            .await
    }

    async fn load_attributes(&self) -> RepositoryResult<Vec<AttributeDefinition>> {
        self.with_shared_conn("load_attributes", |conn| read_back::load_attributes(conn))
            .await
    }

    async fn lookup_skus(
        &self,
        skus: Vec<String>,
        scheme: LinkageScheme,
        batch_size: usize,
    ) -> RepositoryResult<SkuLinkMap> {
        if skus.is_empty() {
            return Ok(SkuLinkMap::new());
        }
        self.with_shared_conn("lookup_skus", move |conn| {
            entity::lookup_skus(conn, &skus, scheme, batch_size)
        })
        .await
    }

    async fn create_entities(
        &self,
        entities: Vec<NewProductEntity>,
        scheme: LinkageScheme,
        batch_size: usize,
    ) -> RepositoryResult<SkuLinkMap> {
        if entities.is_empty() {
            return Ok(SkuLinkMap::new());
        }
        self.with_shared_conn("create_entities", move |conn| {
            entity::create_entities(conn, &entities, scheme, batch_size)
        })
        .await
    }

    async fn upsert_eav_values(
        &self,
        backend: BackendType,
        rows: Vec<EavValueRow>,
        ctx: WriteContext,
    ) -> RepositoryResult<usize> {
        let Some(table) = backend.eav_table() else {
            return Err(RepositoryError::UnsupportedBackend(backend));
        };
        if rows.is_empty() {
            return Ok(0);
        }
        self.with_own_conn(flush_op(backend), move |conn| {
            let spec = upsert::eav_spec(table, ctx.scheme.link_column());
            upsert::write_chunks(conn, &spec, &rows, &ctx, backend.as_str(), upsert::bind_eav)
        })
        .await
    }

    async fn upsert_stock_items(
        &self,
        rows: Vec<StockItem>,
        ctx: WriteContext,
    ) -> RepositoryResult<usize> {
        if rows.is_empty() {
            return Ok(0);
        }
        self.with_own_conn("flush_stock", move |conn| {
            upsert::write_chunks(conn, &upsert::stock_spec(), &rows, &ctx, "stock", upsert::bind_stock)
        })
        .await
    }

    async fn upsert_gallery_entries(
        &self,
        rows: Vec<MediaGalleryEntry>,
        ctx: WriteContext,
    ) -> RepositoryResult<usize> {
        if rows.is_empty() {
            return Ok(0);
        }
        self.with_own_conn("flush_gallery", move |conn| {
            gallery::write_gallery(conn, &rows, &ctx)
        })
        .await
    }

    async fn upsert_price_rows(
        &self,
        rows: Vec<PriceIndexRow>,
        ctx: WriteContext,
    ) -> RepositoryResult<usize> {
        if rows.is_empty() {
            return Ok(0);
        }
        self.with_own_conn("flush_price_index", move |conn| {
            upsert::write_chunks(
                conn,
                &upsert::price_spec(),
                &rows,
                &ctx,
                "price_index",
                upsert::bind_price,
            )
        })
        .await
    }

    async fn load_flat_attributes(
        &self,
        sku: &str,
        store_id: u16,
    ) -> RepositoryResult<Option<BTreeMap<String, FlatValue>>> {
        let scheme = self.detect_linkage().await?;
        let sku = sku.to_string();
        self.with_shared_conn("load_flat_attributes", move |conn| {
            read_back::load_flat_attributes(conn, scheme, &sku, store_id)
        })
        .await
    }
}
