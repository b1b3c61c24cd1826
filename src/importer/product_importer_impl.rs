// ==========================================
// 商品批量导入引擎 - 商品导入器实现
// ==========================================
// 职责: 整合导入流程，从 CSV 到数据库
// 流程: 解析 → 元数据 → 列分类 → 实体解析 → 收集 → 并发写入
// 口径: updated = 总行数 - 跳过 - 新建（按行计，同一 SKU 多行各计一次）
// ==========================================

use crate::config::ImportOptions;
use crate::domain::import_report::ImportResult;
use crate::domain::product::AttributeCatalog;
use crate::domain::types::LinkageScheme;
use crate::importer::column_classifier::{classify, require_sku_column};
use crate::importer::eav_collector::collect_eav;
use crate::importer::entity_resolver::EntityResolver;
use crate::importer::error::ImportError;
use crate::importer::file_parser::{CsvParser, ParsedCsv};
use crate::importer::flush_orchestrator::{FlushBuffers, FlushOrchestrator};
use crate::importer::gallery_collector::collect_gallery;
use crate::importer::price_collector::collect_price;
use crate::importer::product_importer_trait::{FileParser, ProductImporter};
use crate::importer::stock_collector::collect_stock;
use crate::repository::product_import_repo::{ProductImportRepository, WriteContext};
use async_trait::async_trait;
use std::io::Read;
use std::path::Path;
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, info, instrument, warn};
use uuid::Uuid;

// ==========================================
// ProductImporterImpl
// ==========================================
pub struct ProductImporterImpl<R>
where
    R: ProductImportRepository + 'static,
{
    // 数据访问层
    repo: Arc<R>,

    // 归一化后的导入选项
    options: ImportOptions,

    file_parser: Box<dyn FileParser>,
}

impl<R> ProductImporterImpl<R>
where
    R: ProductImportRepository + 'static,
{
    /// 创建导入器
    ///
    /// # 参数
    /// - repo: 导入数据仓储（写入任务共享）
    /// - options: 导入选项（内部会归一化）
    pub fn new(repo: Arc<R>, options: ImportOptions) -> Self {
        Self {
            repo,
            options: options.normalized(),
            file_parser: Box::new(CsvParser),
        }
    }

    async fn run(
        &self,
        parsed: ParsedCsv,
        run_id: String,
        started: Instant,
    ) -> Result<ImportResult, ImportError> {
        let total_rows = parsed.row_count();
        info!(run_id = %run_id, total_rows, "CSV 解析完成");

        // sku 列缺失时不做任何数据库操作
        require_sku_column(&parsed.headers)?;

        debug!("步骤 2: 加载属性元数据");
        let definitions = self
            .repo
            .load_attributes()
            .await
            .map_err(|e| ImportError::AttributeMetadataLoad(e.to_string()))?;
        let catalog = AttributeCatalog::new(definitions);
        debug!(attributes = catalog.len(), "属性元数据加载完成");

        let scheme = self.repo.detect_linkage().await?;
        if !scheme.is_known() {
            return Err(ImportError::LinkageUndetected(format!(
                "EAV 副表既没有 entity_id 也没有 row_id 列 (scheme={})",
                LinkageScheme::Unknown
            )));
        }

        debug!("步骤 3: 列分类");
        let (layout, mut warnings) = classify(&parsed.headers, &catalog)?;
        info!(
            attributes = layout.attributes.len(),
            stock_columns = layout.stock.len(),
            gallery_columns = layout.gallery.len(),
            price_columns = layout.price.len(),
            "列分类完成"
        );

        debug!("步骤 4: 实体解析");
        let batch_size = self.options.chunk_size();
        let resolution = EntityResolver::new(Arc::clone(&self.repo))
            .resolve(
                &parsed.rows,
                &layout,
                scheme,
                batch_size,
                self.options.attribute_set,
            )
            .await?;

        debug!("步骤 5: 收集写入缓冲");
        let rows = &parsed.rows;
        let links = &resolution.links;

        let eav = collect_eav(rows, &layout, links, self.options.store_id);
        let stock = collect_stock(rows, &layout, links);
        let price = collect_price(rows, &layout, links);
        let gallery = collect_gallery(rows, &layout, links, catalog.gallery_attribute_id());

        warnings.extend(eav.warnings);
        warnings.extend(stock.warnings);
        warnings.extend(price.warnings);

        for w in &warnings {
            warn!(run_id = %run_id, "{}", w);
        }

        let buffers = FlushBuffers {
            eav: eav.buckets,
            stock: stock.rows,
            gallery,
            price: price.rows,
        };
        info!(
            rows = buffers.total_rows(),
            destinations = buffers.destination_count(),
            warnings = warnings.len(),
            "收集完成"
        );

        let process_time = started.elapsed();

        debug!("步骤 6: 并发批量写入");
        let ctx = WriteContext::new(scheme, batch_size, self.options.write_strategy());
        let report = FlushOrchestrator::new(Arc::clone(&self.repo))
            .flush(buffers, ctx)
            .await?;

        let created = resolution.created;
        let skipped = resolution.skipped;
        let updated = total_rows.saturating_sub(skipped).saturating_sub(created);

        let result = ImportResult {
            run_id,
            total_rows,
            created,
            updated,
            skipped,
            warnings,
            counts: report.counts,
            linkage: scheme,
            write_strategy: self.options.write_strategy(),
            process_time,
            db_time: report.elapsed,
            total_time: started.elapsed(),
        };

        info!(
            run_id = %result.run_id,
            created,
            updated,
            skipped,
            eav_rows = result.eav_total(),
            total_ms = result.total_time.as_millis() as u64,
            "商品导入完成"
        );

        Ok(result)
    }
}

#[async_trait]
impl<R> ProductImporter for ProductImporterImpl<R>
where
    R: ProductImportRepository + 'static,
{
    #[instrument(skip(self, file_path), fields(run_id))]
    async fn import_from_csv<P: AsRef<Path> + Send>(
        &self,
        file_path: P,
    ) -> Result<ImportResult, ImportError> {
        let started = Instant::now();
        let run_id = Uuid::new_v4().to_string();
        tracing::Span::current().record("run_id", run_id.as_str());

        let file_path = file_path.as_ref();
        info!(file_path = %file_path.display(), "开始导入商品");

        debug!("步骤 1: 解析文件");
        let parsed = self.file_parser.parse_file(file_path)?;
        self.run(parsed, run_id, started).await
    }

    #[instrument(skip(self, reader), fields(run_id))]
    async fn import_from_reader<Rd: Read + Send>(
        &self,
        mut reader: Rd,
    ) -> Result<ImportResult, ImportError> {
        let started = Instant::now();
        let run_id = Uuid::new_v4().to_string();
        tracing::Span::current().record("run_id", run_id.as_str());

        let parsed = self.file_parser.parse_reader(&mut reader)?;
        self.run(parsed, run_id, started).await
    }
}
