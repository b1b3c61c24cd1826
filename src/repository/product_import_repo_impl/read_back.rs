// ==========================================
// 元数据读取 / 扁平属性回读
// ==========================================

use super::entity::lookup_skus;
use crate::domain::flat_value::FlatValue;
use crate::domain::product::{AttributeDefinition, PRODUCT_ENTITY_TYPE_ID};
use crate::domain::types::{BackendType, LinkageScheme};
use crate::repository::catalog_schema::{GALLERY_LINK_TABLE, GALLERY_TABLE};
use crate::repository::error::RepositoryResult;
use rusqlite::types::Value;
use rusqlite::{params, Connection};
use std::collections::BTreeMap;

/// 加载商品属性定义；无法识别的 backend_type / 越界 ID 跳过
pub(super) fn load_attributes(conn: &Connection) -> RepositoryResult<Vec<AttributeDefinition>> {
    let mut stmt = conn.prepare(
        "SELECT attribute_id, attribute_code, backend_type
         FROM eav_attribute
         WHERE entity_type_id = ?1
         ORDER BY attribute_id",
    )?;
    let rows = stmt.query_map(params![PRODUCT_ENTITY_TYPE_ID], |row| {
        Ok((
            row.get::<_, i64>(0)?,
            row.get::<_, String>(1)?,
            row.get::<_, String>(2)?,
        ))
    })?;

    let mut definitions = Vec::new();
    for row in rows {
        let (id, code, backend) = row?;
        let Ok(attribute_id) = u16::try_from(id) else {
            tracing::debug!(attribute_id = id, code = %code, "attribute_id 超出范围，跳过");
            continue;
        };
        match backend.parse::<BackendType>() {
            Ok(backend_type) => definitions.push(AttributeDefinition {
                attribute_id,
                code,
                backend_type,
            }),
            Err(e) => tracing::debug!(code = %code, error = %e, "跳过属性"),
        }
    }
    Ok(definitions)
}

fn flat_from_sql(backend: BackendType, value: Value) -> FlatValue {
    match value {
        Value::Null | Value::Blob(_) => FlatValue::Null,
        Value::Integer(i) if backend == BackendType::Decimal => FlatValue::Decimal(i as f64),
        Value::Integer(i) => FlatValue::Int(i),
        Value::Real(f) => FlatValue::Decimal(f),
        Value::Text(s) => FlatValue::Text(s),
    }
}

/// 回读单个商品的属性（store 级值覆盖 store 0）+ 图库路径列表
pub(super) fn load_flat_attributes(
    conn: &Connection,
    scheme: LinkageScheme,
    sku: &str,
    store_id: u16,
) -> RepositoryResult<Option<BTreeMap<String, FlatValue>>> {
    let links = lookup_skus(conn, &[sku.to_string()], scheme, 1)?;
    let Some(&link_id) = links.get(sku) else {
        return Ok(None);
    };
    let link_column = scheme.link_column();

    let mut flat = BTreeMap::new();
    flat.insert("sku".to_string(), FlatValue::Text(sku.to_string()));

    for backend in BackendType::EAV {
        let Some(table) = backend.eav_table() else {
            continue;
        };
        let sql = format!(
            "SELECT a.attribute_code, v.value
             FROM {table} v
             JOIN eav_attribute a ON a.attribute_id = v.attribute_id
             WHERE v.{link_column} = ?1 AND v.store_id IN (0, ?2)
             ORDER BY v.store_id, a.attribute_code"
        );
        let mut stmt = conn.prepare(&sql)?;
        let rows = stmt.query_map(params![link_id as i64, store_id], |row| {
            Ok((row.get::<_, String>(0)?, row.get::<_, Value>(1)?))
        })?;
        for row in rows {
            let (code, value) = row?;
            flat.insert(code, flat_from_sql(backend, value));
        }
    }

    let gallery_sql = format!(
        "SELECT g.value FROM {GALLERY_TABLE} g
         JOIN {GALLERY_LINK_TABLE} l ON l.value_id = g.value_id
         WHERE l.{link_column} = ?1 AND g.disabled = 0
         ORDER BY g.value_id"
    );
    let mut stmt = conn.prepare(&gallery_sql)?;
    let images = stmt
        .query_map(params![link_id as i64], |row| row.get::<_, String>(0))?
        .collect::<rusqlite::Result<Vec<_>>>()?;
    if !images.is_empty() {
        flat.insert(
            "media_gallery".to_string(),
            FlatValue::List(images.into_iter().map(FlatValue::Text).collect()),
        );
    }

    Ok(Some(flat))
}
