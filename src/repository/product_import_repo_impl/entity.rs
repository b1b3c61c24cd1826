// ==========================================
// 商品主表: SKU 批量查询 / 实体批量分配
// ==========================================

use super::upsert::{placeholders, row_placeholders, MAX_BIND_PARAMS};
use crate::domain::product::{NewProductEntity, SkuLinkMap};
use crate::domain::types::LinkageScheme;
use crate::repository::catalog_schema::{PRODUCT_ENTITY_TABLE, SEQUENCE_TABLE};
use crate::repository::error::{RepositoryError, RepositoryResult};
use rusqlite::types::Value;
use rusqlite::{params_from_iter, Connection, Transaction, TransactionBehavior};

/// 批量查询 SKU → LinkID（RowId 方案取每个 SKU 的最新版本行）
pub(super) fn lookup_skus(
    conn: &Connection,
    skus: &[String],
    scheme: LinkageScheme,
    batch_size: usize,
) -> RepositoryResult<SkuLinkMap> {
    let mut found = SkuLinkMap::with_capacity(skus.len());
    let chunk_size = batch_size.clamp(1, MAX_BIND_PARAMS);

    for chunk in skus.chunks(chunk_size) {
        let sql = match scheme {
            LinkageScheme::RowId => format!(
                "SELECT sku, MAX(row_id) FROM {PRODUCT_ENTITY_TABLE} WHERE sku IN ({}) GROUP BY sku",
                placeholders(chunk.len())
            ),
            _ => format!(
                "SELECT sku, entity_id FROM {PRODUCT_ENTITY_TABLE} WHERE sku IN ({})",
                placeholders(chunk.len())
            ),
        };
        collect_links(conn, &sql, chunk.iter(), &mut found)?;
    }

    Ok(found)
}

fn collect_links<I, P>(
    conn: &Connection,
    sql: &str,
    params: I,
    into: &mut SkuLinkMap,
) -> RepositoryResult<usize>
where
    I: IntoIterator<Item = P>,
    P: rusqlite::ToSql,
{
    let mut stmt = conn.prepare(sql)?;
    let rows = stmt.query_map(params_from_iter(params), |row| {
        Ok((row.get::<_, String>(0)?, row.get::<_, i64>(1)?))
    })?;

    let mut count = 0;
    for row in rows {
        let (sku, link_id) = row?;
        into.insert(sku, link_id as u64);
        count += 1;
    }
    Ok(count)
}

/// 批量创建主表行，每个分块一个 IMMEDIATE 事务
pub(super) fn create_entities(
    conn: &mut Connection,
    entities: &[NewProductEntity],
    scheme: LinkageScheme,
    batch_size: usize,
) -> RepositoryResult<SkuLinkMap> {
    let mut created = SkuLinkMap::with_capacity(entities.len());
    let columns = if scheme == LinkageScheme::RowId { 4 } else { 3 };
    let chunk_size = batch_size.min(MAX_BIND_PARAMS / columns).max(1);

    for chunk in entities.chunks(chunk_size) {
        let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;
        match scheme {
            LinkageScheme::RowId => create_row_id_chunk(&tx, chunk, &mut created)?,
            _ => create_entity_id_chunk(&tx, chunk, &mut created)?,
        }
        tx.commit()?;
    }

    Ok(created)
}

fn create_entity_id_chunk(
    tx: &Transaction,
    chunk: &[NewProductEntity],
    created: &mut SkuLinkMap,
) -> RepositoryResult<()> {
    let sql = format!(
        "INSERT INTO {PRODUCT_ENTITY_TABLE} (sku, type_id, attribute_set_id) VALUES {}",
        row_placeholders(3, chunk.len())
    );
    let params = chunk.iter().flat_map(|e| {
        [
            Value::Text(e.sku.clone()),
            Value::Text(e.type_id.clone()),
            Value::Integer(i64::from(e.attribute_set_id)),
        ]
    });
    tx.execute(&sql, params_from_iter(params))?;

    // 读回自增 entity_id
    let sql = format!(
        "SELECT sku, entity_id FROM {PRODUCT_ENTITY_TABLE} WHERE sku IN ({})",
        placeholders(chunk.len())
    );
    let read_back = collect_links(tx, &sql, chunk.iter().map(|e| e.sku.as_str()), created)?;
    if read_back != chunk.len() {
        return Err(RepositoryError::Inconsistent(format!(
            "新建商品读回数量不一致: 写入 {} 行, 读回 {} 行",
            chunk.len(),
            read_back
        )));
    }
    Ok(())
}

// RowId 方案: 一次预留 n 个 sequence，再一次写入 n 个版本行；
// 同一事务内自增值连续，首个值 = last_insert_rowid - n + 1
fn create_row_id_chunk(
    tx: &Transaction,
    chunk: &[NewProductEntity],
    created: &mut SkuLinkMap,
) -> RepositoryResult<()> {
    let n = chunk.len() as i64;

    let reserve_sql = format!(
        "INSERT INTO {SEQUENCE_TABLE} (sequence_value) VALUES {}",
        vec!["(NULL)"; chunk.len()].join(", ")
    );
    tx.execute(&reserve_sql, [])?;
    let first_sequence = tx.last_insert_rowid() - n + 1;

    let sql = format!(
        "INSERT INTO {PRODUCT_ENTITY_TABLE} (entity_id, sku, type_id, attribute_set_id) VALUES {}",
        row_placeholders(4, chunk.len())
    );
    let params = chunk.iter().enumerate().flat_map(|(offset, e)| {
        [
            Value::Integer(first_sequence + offset as i64),
            Value::Text(e.sku.clone()),
            Value::Text(e.type_id.clone()),
            Value::Integer(i64::from(e.attribute_set_id)),
        ]
    });
    tx.execute(&sql, params_from_iter(params))?;
    let first_row_id = tx.last_insert_rowid() - n + 1;

    for (offset, entity) in chunk.iter().enumerate() {
        created.insert(entity.sku.clone(), (first_row_id + offset as i64) as u64);
    }

    tracing::debug!(
        rows = chunk.len(),
        first_sequence,
        first_row_id,
        "row_id 方案分块分配完成"
    );
    Ok(())
}
