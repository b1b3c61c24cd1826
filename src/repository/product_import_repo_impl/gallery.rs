// ==========================================
// 图库写入: 图库值表 upsert + 值到商品的关联
// ==========================================
// 图库值按 (attribute_id, value) 唯一，多个商品可共享同一路径，
// 关联表按 (value_id, link) 唯一，重复导入不产生重复关联
// ==========================================

use super::upsert::{ensure_not_cancelled, link_value, row_placeholders, UpsertSpec};
use crate::domain::product::MediaGalleryEntry;
use crate::domain::types::WriteStrategy;
use crate::repository::catalog_schema::{GALLERY_LINK_TABLE, GALLERY_TABLE};
use crate::repository::error::RepositoryResult;
use crate::repository::product_import_repo::WriteContext;
use rusqlite::types::Value;
use rusqlite::{params, params_from_iter, Connection, Transaction, TransactionBehavior};

const DESTINATION: &str = "gallery";

fn gallery_spec() -> UpsertSpec {
    UpsertSpec::new(
        GALLERY_TABLE,
        &["attribute_id", "value", "media_type", "disabled"],
        &["attribute_id", "value"],
    )
}

fn bind_gallery(entry: &MediaGalleryEntry) -> Vec<Value> {
    vec![
        Value::Integer(i64::from(entry.attribute_id)),
        Value::Text(entry.value.clone()),
        Value::Text(entry.media_type.clone()),
        Value::Integer(i64::from(entry.disabled)),
    ]
}

pub(super) fn write_gallery(
    conn: &mut Connection,
    entries: &[MediaGalleryEntry],
    ctx: &WriteContext,
) -> RepositoryResult<usize> {
    let spec = gallery_spec();
    let link_column = ctx.scheme.link_column();
    let chunk_size = match ctx.strategy {
        // 关联语句每行 3 个参数，图库语句每行 4 个，以较大者为准
        WriteStrategy::GeneratedStatement => spec.rows_per_statement(ctx.batch_size),
        WriteStrategy::NativeBatch => ctx.batch_size.max(1),
    };

    let mut written = 0;
    for chunk in entries.chunks(chunk_size) {
        write_chunk(conn, &spec, link_column, chunk, ctx)
            .map_err(|e| e.after_committed(written))?;
        written += chunk.len();
    }

    Ok(written)
}

fn write_chunk(
    conn: &mut Connection,
    spec: &UpsertSpec,
    link_column: &str,
    chunk: &[MediaGalleryEntry],
    ctx: &WriteContext,
) -> RepositoryResult<()> {
    ensure_not_cancelled(ctx, DESTINATION)?;

    let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;
    match ctx.strategy {
        WriteStrategy::GeneratedStatement => write_generated_chunk(&tx, spec, link_column, chunk)?,
        WriteStrategy::NativeBatch => write_native_chunk(&tx, spec, link_column, chunk)?,
    }
    tx.commit()?;
    Ok(())
}

fn write_generated_chunk(
    tx: &Transaction,
    spec: &UpsertSpec,
    link_column: &str,
    chunk: &[MediaGalleryEntry],
) -> RepositoryResult<()> {
    tx.execute(
        &spec.sql(chunk.len()),
        params_from_iter(chunk.iter().flat_map(bind_gallery)),
    )?;

    // WHERE 子句消除 INSERT ... SELECT 与 ON CONFLICT 的语法歧义
    let link_sql = format!(
        "INSERT INTO {GALLERY_LINK_TABLE} (value_id, {link_column}) \
         SELECT g.value_id, v.column2 FROM (VALUES {}) AS v, {GALLERY_TABLE} AS g \
         WHERE g.attribute_id = v.column3 AND g.value = v.column1 \
         ON CONFLICT(value_id, {link_column}) DO NOTHING",
        row_placeholders(3, chunk.len())
    );
    let link_params = chunk.iter().flat_map(|e| {
        [
            Value::Text(e.value.clone()),
            link_value(e.link_id),
            Value::Integer(i64::from(e.attribute_id)),
        ]
    });
    tx.execute(&link_sql, params_from_iter(link_params))?;
    Ok(())
}

fn write_native_chunk(
    tx: &Transaction,
    spec: &UpsertSpec,
    link_column: &str,
    chunk: &[MediaGalleryEntry],
) -> RepositoryResult<()> {
    let upsert_sql = format!("{} RETURNING value_id", spec.sql(1));
    let link_sql = format!(
        "INSERT INTO {GALLERY_LINK_TABLE} (value_id, {link_column}) VALUES (?1, ?2) \
         ON CONFLICT(value_id, {link_column}) DO NOTHING"
    );

    let mut upsert = tx.prepare_cached(&upsert_sql)?;
    let mut link = tx.prepare_cached(&link_sql)?;
    for entry in chunk {
        let value_id: i64 =
            upsert.query_row(params_from_iter(bind_gallery(entry)), |row| row.get(0))?;
        link.execute(params![value_id, entry.link_id as i64])?;
    }
    Ok(())
}
