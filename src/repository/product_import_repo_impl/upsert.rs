// ==========================================
// 批量 upsert 语句生成与分块写入
// ==========================================
// 两种写入策略共用同一份 SQL 模板:
// - GeneratedStatement: 每个分块一条多行 VALUES 语句
// - NativeBatch: 单行语句 prepare_cached 后在分块事务内逐行执行
// ==========================================

use crate::domain::product::{EavValue, EavValueRow, PriceIndexRow, StockItem, DATETIME_FORMAT};
use crate::domain::types::WriteStrategy;
use crate::repository::catalog_schema::{PRICE_INDEX_TABLE, STOCK_ITEM_TABLE};
use crate::repository::error::{RepositoryError, RepositoryResult};
use crate::repository::product_import_repo::WriteContext;
use rusqlite::types::Value;
use rusqlite::{params_from_iter, Connection, TransactionBehavior};

/// SQLite 单条语句可绑定参数上限（SQLITE_MAX_VARIABLE_NUMBER）
pub(super) const MAX_BIND_PARAMS: usize = 32_766;

/// `?, ?, ?`
pub(super) fn placeholders(n: usize) -> String {
    vec!["?"; n].join(", ")
}

/// `(?, ?), (?, ?)`
pub(super) fn row_placeholders(columns: usize, rows: usize) -> String {
    let row = format!("({})", placeholders(columns));
    vec![row.as_str(); rows].join(", ")
}

pub(super) fn ensure_not_cancelled(ctx: &WriteContext, destination: &str) -> RepositoryResult<()> {
    if ctx.cancel.is_cancelled() {
        return Err(RepositoryError::Cancelled(destination.to_string()));
    }
    Ok(())
}

pub(super) fn link_value(link_id: u64) -> Value {
    Value::Integer(link_id as i64)
}

// ==========================================
// UpsertSpec - 单表 upsert 模板
// ==========================================
pub(super) struct UpsertSpec {
    table: String,
    columns: Vec<String>,
    conflict: Vec<String>,
}

impl UpsertSpec {
    pub(super) fn new(table: &str, columns: &[&str], conflict: &[&str]) -> Self {
        Self {
            table: table.to_string(),
            columns: columns.iter().map(|c| c.to_string()).collect(),
            conflict: conflict.iter().map(|c| c.to_string()).collect(),
        }
    }

    pub(super) fn column_count(&self) -> usize {
        self.columns.len()
    }

    /// 生成 rows 行的 upsert 语句；非冲突列全部以 excluded 值覆盖
    pub(super) fn sql(&self, rows: usize) -> String {
        let updates = self
            .columns
            .iter()
            .filter(|c| !self.conflict.contains(c))
            .map(|c| format!("{c} = excluded.{c}"))
            .collect::<Vec<_>>();
        let action = if updates.is_empty() {
            "NOTHING".to_string()
        } else {
            format!("UPDATE SET {}", updates.join(", "))
        };
        format!(
            "INSERT INTO {} ({}) VALUES {} ON CONFLICT({}) DO {}",
            self.table,
            self.columns.join(", "),
            row_placeholders(self.columns.len(), rows),
            self.conflict.join(", "),
            action
        )
    }

    /// 单条生成语句最多容纳的行数
    pub(super) fn rows_per_statement(&self, batch_size: usize) -> usize {
        (MAX_BIND_PARAMS / self.columns.len().max(1))
            .min(batch_size)
            .max(1)
    }
}

/// 按写入策略分块 upsert；每个分块一个 IMMEDIATE 事务，分块之间检查取消信号
///
/// 中途失败时错误携带此前已提交的行数（见 RepositoryError::committed_rows）
pub(super) fn write_chunks<T, F>(
    conn: &mut Connection,
    spec: &UpsertSpec,
    rows: &[T],
    ctx: &WriteContext,
    destination: &str,
    bind: F,
) -> RepositoryResult<usize>
where
    F: Fn(&T) -> Vec<Value>,
{
    let chunk_size = match ctx.strategy {
        WriteStrategy::GeneratedStatement => spec.rows_per_statement(ctx.batch_size),
        WriteStrategy::NativeBatch => ctx.batch_size.max(1),
    };

    let mut written = 0;
    for (chunk_index, chunk) in rows.chunks(chunk_size).enumerate() {
        write_chunk(conn, spec, chunk, ctx, destination, &bind)
            .map_err(|e| e.after_committed(written))?;

        written += chunk.len();
        tracing::debug!(destination, chunk_index, rows = chunk.len(), "分块写入完成");
    }

    Ok(written)
}

fn write_chunk<T, F>(
    conn: &mut Connection,
    spec: &UpsertSpec,
    chunk: &[T],
    ctx: &WriteContext,
    destination: &str,
    bind: &F,
) -> RepositoryResult<()>
where
    F: Fn(&T) -> Vec<Value>,
{
    ensure_not_cancelled(ctx, destination)?;

    let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;
    match ctx.strategy {
        WriteStrategy::GeneratedStatement => {
            let sql = spec.sql(chunk.len());
            tx.execute(&sql, params_from_iter(chunk.iter().flat_map(bind)))?;
        }
        WriteStrategy::NativeBatch => {
            let mut stmt = tx.prepare_cached(&spec.sql(1))?;
            for row in chunk {
                stmt.execute(params_from_iter(bind(row)))?;
            }
        }
    }
    tx.commit()?;
    Ok(())
}

// ==========================================
// 各目标表的模板与参数绑定
// ==========================================

pub(super) fn eav_spec(table: &str, link_column: &str) -> UpsertSpec {
    UpsertSpec::new(
        table,
        &[link_column, "attribute_id", "store_id", "value"],
        &[link_column, "attribute_id", "store_id"],
    )
}

pub(super) fn eav_sql_value(value: &EavValue) -> Value {
    match value {
        EavValue::Varchar(s) | EavValue::Text(s) => Value::Text(s.clone()),
        EavValue::Int(i) => Value::Integer(*i),
        EavValue::Decimal(d) => Value::Real(*d),
        EavValue::Datetime(dt) => Value::Text(dt.format(DATETIME_FORMAT).to_string()),
    }
}

pub(super) fn bind_eav(row: &EavValueRow) -> Vec<Value> {
    vec![
        link_value(row.link_id),
        Value::Integer(i64::from(row.attribute_id)),
        Value::Integer(i64::from(row.store_id)),
        eav_sql_value(&row.value),
    ]
}

pub(super) fn stock_spec() -> UpsertSpec {
    UpsertSpec::new(
        STOCK_ITEM_TABLE,
        &[
            "product_id",
            "stock_id",
            "qty",
            "is_in_stock",
            "manage_stock",
            "min_qty",
            "min_sale_qty",
            "max_sale_qty",
        ],
        &["product_id", "stock_id"],
    )
}

pub(super) fn bind_stock(item: &StockItem) -> Vec<Value> {
    vec![
        link_value(item.link_id),
        Value::Integer(i64::from(item.stock_id)),
        Value::Real(item.qty),
        Value::Integer(i64::from(item.is_in_stock)),
        Value::Integer(i64::from(item.manage_stock)),
        Value::Real(item.min_qty),
        Value::Real(item.min_sale_qty),
        Value::Real(item.max_sale_qty),
    ]
}

pub(super) fn price_spec() -> UpsertSpec {
    UpsertSpec::new(
        PRICE_INDEX_TABLE,
        &[
            "entity_id",
            "customer_group_id",
            "website_id",
            "price",
            "final_price",
            "min_price",
            "max_price",
            "tier_price",
        ],
        &["entity_id", "customer_group_id", "website_id"],
    )
}

pub(super) fn bind_price(row: &PriceIndexRow) -> Vec<Value> {
    vec![
        link_value(row.link_id),
        Value::Integer(i64::from(row.customer_group_id)),
        Value::Integer(i64::from(row.website_id)),
        Value::Real(row.price),
        Value::Real(row.final_price),
        Value::Real(row.min_price),
        Value::Real(row.max_price),
        Value::Real(row.tier_price),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_upsert_sql_shape() {
        let spec = eav_spec("catalog_product_entity_int", "row_id");
        assert_eq!(
            spec.sql(2),
            "INSERT INTO catalog_product_entity_int (row_id, attribute_id, store_id, value) \
             VALUES (?, ?, ?, ?), (?, ?, ?, ?) \
             ON CONFLICT(row_id, attribute_id, store_id) DO UPDATE SET value = excluded.value"
        );
    }

    #[test]
    fn test_rows_per_statement_respects_param_limit() {
        let spec = stock_spec();
        assert_eq!(spec.rows_per_statement(500), 500);
        assert_eq!(spec.rows_per_statement(100_000), MAX_BIND_PARAMS / 8);
        assert_eq!(spec.rows_per_statement(0), 1);
    }

    #[test]
    fn test_all_conflict_columns_do_nothing() {
        let spec = UpsertSpec::new("t", &["a", "b"], &["a", "b"]);
        assert!(spec.sql(1).ends_with("DO NOTHING"));
    }
}
