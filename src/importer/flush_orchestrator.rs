// ==========================================
// 商品批量导入引擎 - 批量写入编排
// ==========================================
// 并发模型:
// - 每个非空写入目标一个任务（5 张 EAV 表 + 库存 + 图库 + 价格索引）
// - 任务内按分块顺序写，任务间并行
// - 任一任务失败即取消其余任务（分块间隙检查），收集全部失败
// 失败语义: 已提交的分块不回滚；成功目标的行数随错误一起返回
// ==========================================

use crate::domain::import_report::count_keys;
use crate::domain::product::{EavValueRow, MediaGalleryEntry, PriceIndexRow, StockItem};
use crate::domain::types::BackendType;
use crate::importer::error::{FlushFailure, ImportError};
use crate::repository::error::RepositoryResult;
use crate::repository::product_import_repo::{ProductImportRepository, WriteContext};
use std::collections::BTreeMap;
use std::future::Future;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::task::JoinSet;
use tokio_util::sync::CancellationToken;
use tracing::{error, info};

/// 异常退出任务的目标名（JoinError 不带目标信息）
const PANICKED_TARGET: &str = "<panicked>";

// ==========================================
// FlushBuffers - 收集阶段产出的全部写入缓冲
// ==========================================
#[derive(Debug, Clone, Default)]
pub struct FlushBuffers {
    pub eav: BTreeMap<BackendType, Vec<EavValueRow>>,
    pub stock: Vec<StockItem>,
    pub gallery: Vec<MediaGalleryEntry>,
    pub price: Vec<PriceIndexRow>,
}

impl FlushBuffers {
    pub fn total_rows(&self) -> usize {
        self.eav.values().map(Vec::len).sum::<usize>()
            + self.stock.len()
            + self.gallery.len()
            + self.price.len()
    }

    /// 非空写入目标数（即将派发的任务数）
    pub fn destination_count(&self) -> usize {
        self.eav.values().filter(|rows| !rows.is_empty()).count()
            + usize::from(!self.stock.is_empty())
            + usize::from(!self.gallery.is_empty())
            + usize::from(!self.price.is_empty())
    }
}

#[derive(Debug, Clone, Default)]
pub struct FlushReport {
    pub counts: BTreeMap<String, usize>,
    pub elapsed: Duration,
}

/// 全部写入目标计数置零（结果中始终包含 8 个键）
pub fn zero_counts() -> BTreeMap<String, usize> {
    BackendType::EAV
        .iter()
        .map(|bt| bt.as_str())
        .chain([count_keys::STOCK, count_keys::GALLERY, count_keys::PRICE_INDEX])
        .map(|k| (k.to_string(), 0))
        .collect()
}

type TaskOutcome = (String, RepositoryResult<usize>);

fn spawn_flush<F>(tasks: &mut JoinSet<TaskOutcome>, target: &str, cancel: CancellationToken, fut: F)
where
    F: Future<Output = RepositoryResult<usize>> + Send + 'static,
{
    let target = target.to_string();
    tasks.spawn(async move {
        let result = fut.await;
        if result.is_err() {
            cancel.cancel();
        }
        (target, result)
    });
}

// ==========================================
// FlushOrchestrator
// ==========================================
pub struct FlushOrchestrator<R: ProductImportRepository> {
    repo: Arc<R>,
}

impl<R: ProductImportRepository + 'static> FlushOrchestrator<R> {
    pub fn new(repo: Arc<R>) -> Self {
        Self { repo }
    }

    /// 并发写入全部缓冲
    ///
    /// # 返回
    /// - Ok(FlushReport): 各目标写入行数 + 写入耗时
    /// - Err(FlushFailed): 出错目标 + 被取消目标 + 各目标实际已提交行数
    pub async fn flush(
        &self,
        buffers: FlushBuffers,
        ctx: WriteContext,
    ) -> Result<FlushReport, ImportError> {
        let start = Instant::now();
        let mut tasks: JoinSet<TaskOutcome> = JoinSet::new();

        for (backend, rows) in buffers.eav {
            if rows.is_empty() {
                continue;
            }
            let repo = Arc::clone(&self.repo);
            let task_ctx = ctx.clone();
            spawn_flush(&mut tasks, backend.as_str(), ctx.cancel.clone(), async move {
                repo.upsert_eav_values(backend, rows, task_ctx).await
            });
        }

        if !buffers.stock.is_empty() {
            let repo = Arc::clone(&self.repo);
            let (rows, task_ctx) = (buffers.stock, ctx.clone());
            spawn_flush(&mut tasks, count_keys::STOCK, ctx.cancel.clone(), async move {
                repo.upsert_stock_items(rows, task_ctx).await
            });
        }

        if !buffers.gallery.is_empty() {
            let repo = Arc::clone(&self.repo);
            let (rows, task_ctx) = (buffers.gallery, ctx.clone());
            spawn_flush(&mut tasks, count_keys::GALLERY, ctx.cancel.clone(), async move {
                repo.upsert_gallery_entries(rows, task_ctx).await
            });
        }

        if !buffers.price.is_empty() {
            let repo = Arc::clone(&self.repo);
            let (rows, task_ctx) = (buffers.price, ctx.clone());
            spawn_flush(&mut tasks, count_keys::PRICE_INDEX, ctx.cancel.clone(), async move {
                repo.upsert_price_rows(rows, task_ctx).await
            });
        }

        info!(tasks = tasks.len(), strategy = %ctx.strategy, "批量写入开始");

        let mut counts = zero_counts();
        let mut failures = Vec::new();
        let mut cancelled = Vec::new();

        while let Some(joined) = tasks.join_next().await {
            match joined {
                Ok((target, Ok(written))) => {
                    info!(target_table = %target, written, "写入目标完成");
                    counts.insert(target, written);
                }
                Ok((target, Err(err))) => {
                    let written = err.committed_rows();
                    counts.insert(target.clone(), written);
                    if err.is_cancelled() {
                        info!(target_table = %target, written, "写入目标已随其他失败取消");
                        cancelled.push(target);
                    } else {
                        error!(target_table = %target, written, error = %err, "写入目标失败");
                        failures.push(FlushFailure {
                            target,
                            message: err.root_cause().to_string(),
                        });
                    }
                }
                Err(join_err) => {
                    ctx.cancel.cancel();
                    error!(error = %join_err, "写入任务异常退出");
                    failures.push(FlushFailure {
                        target: PANICKED_TARGET.to_string(),
                        message: join_err.to_string(),
                    });
                }
            }
        }

        let elapsed = start.elapsed();

        if !failures.is_empty() || !cancelled.is_empty() {
            failures.sort_by(|a, b| a.target.cmp(&b.target));
            cancelled.sort();
            return Err(ImportError::FlushFailed {
                failures,
                cancelled,
                committed: counts,
            });
        }

        info!(elapsed_ms = elapsed.as_millis() as u64, "批量写入完成");
        Ok(FlushReport { counts, elapsed })
    }
}
