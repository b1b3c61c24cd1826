// ==========================================
// 商品批量导入引擎 - 目录库表结构
// ==========================================
// 职责: 按关联方案建库（db:init / 测试夹具）+ 默认属性目录
// 方案:
// - EntityId: 主表 entity_id 自增，EAV 副表以 entity_id 关联
// - RowId: sequence_product 分配 entity_id，主表 row_id 自增（版本行），
//          EAV 副表以 row_id 关联
// ==========================================

use crate::domain::product::{AttributeDefinition, PRODUCT_ENTITY_TYPE_ID};
use crate::domain::types::{BackendType, LinkageScheme};
use rusqlite::{params, Connection};

pub const PRODUCT_ENTITY_TABLE: &str = "catalog_product_entity";
pub const SEQUENCE_TABLE: &str = "sequence_product";
pub const STOCK_ITEM_TABLE: &str = "cataloginventory_stock_item";
pub const GALLERY_TABLE: &str = "catalog_product_entity_media_gallery";
pub const GALLERY_LINK_TABLE: &str = "catalog_product_entity_media_gallery_value_to_entity";
pub const PRICE_INDEX_TABLE: &str = "catalog_product_index_price";

/// 默认商品属性目录（code, attribute_id, backend_type）
pub const DEFAULT_PRODUCT_ATTRIBUTES: &[(&str, u16, BackendType)] = &[
    ("name", 73, BackendType::Varchar),
    ("sku", 74, BackendType::Static),
    ("description", 75, BackendType::Text),
    ("short_description", 76, BackendType::Text),
    ("price", 77, BackendType::Decimal),
    ("special_price", 78, BackendType::Decimal),
    ("special_from_date", 79, BackendType::Datetime),
    ("special_to_date", 80, BackendType::Datetime),
    ("cost", 81, BackendType::Decimal),
    ("weight", 82, BackendType::Decimal),
    ("manufacturer", 83, BackendType::Int),
    ("meta_title", 84, BackendType::Varchar),
    ("meta_keyword", 85, BackendType::Text),
    ("meta_description", 86, BackendType::Varchar),
    ("image", 87, BackendType::Varchar),
    ("small_image", 88, BackendType::Varchar),
    ("thumbnail", 89, BackendType::Varchar),
    ("media_gallery", 90, BackendType::Static),
    ("news_from_date", 94, BackendType::Datetime),
    ("status", 97, BackendType::Int),
    ("visibility", 99, BackendType::Int),
    ("url_key", 121, BackendType::Varchar),
    ("tax_class_id", 136, BackendType::Int),
    ("created_at", 112, BackendType::Static),
    ("updated_at", 113, BackendType::Static),
];

/// 创建目录库全部表（幂等）
pub fn create_catalog_schema(conn: &Connection, scheme: LinkageScheme) -> rusqlite::Result<()> {
    conn.execute_batch(
        r#"
        CREATE TABLE IF NOT EXISTS eav_attribute (
            attribute_id INTEGER PRIMARY KEY,
            entity_type_id INTEGER NOT NULL,
            attribute_code TEXT NOT NULL,
            backend_type TEXT NOT NULL DEFAULT 'static',
            UNIQUE (entity_type_id, attribute_code)
        );

        CREATE TABLE IF NOT EXISTS config_kv (
            scope_id TEXT NOT NULL,
            key TEXT NOT NULL,
            value TEXT NOT NULL,
            updated_at TEXT NOT NULL DEFAULT CURRENT_TIMESTAMP,
            PRIMARY KEY (scope_id, key)
        );
        "#,
    )?;

    match scheme {
        LinkageScheme::RowId => conn.execute_batch(&format!(
            r#"
            CREATE TABLE IF NOT EXISTS {SEQUENCE_TABLE} (
                sequence_value INTEGER PRIMARY KEY AUTOINCREMENT
            );
            CREATE TABLE IF NOT EXISTS {PRODUCT_ENTITY_TABLE} (
                row_id INTEGER PRIMARY KEY AUTOINCREMENT,
                entity_id INTEGER NOT NULL REFERENCES {SEQUENCE_TABLE}(sequence_value),
                created_in INTEGER NOT NULL DEFAULT 1,
                updated_in INTEGER NOT NULL DEFAULT 2147483647,
                attribute_set_id INTEGER NOT NULL DEFAULT 4,
                type_id TEXT NOT NULL DEFAULT 'simple',
                sku TEXT NOT NULL,
                created_at TEXT NOT NULL DEFAULT CURRENT_TIMESTAMP,
                updated_at TEXT NOT NULL DEFAULT CURRENT_TIMESTAMP
            );
            CREATE INDEX IF NOT EXISTS idx_product_entity_sku ON {PRODUCT_ENTITY_TABLE}(sku);
            "#
        ))?,
        _ => conn.execute_batch(&format!(
            r#"
            CREATE TABLE IF NOT EXISTS {PRODUCT_ENTITY_TABLE} (
                entity_id INTEGER PRIMARY KEY AUTOINCREMENT,
                attribute_set_id INTEGER NOT NULL DEFAULT 4,
                type_id TEXT NOT NULL DEFAULT 'simple',
                sku TEXT NOT NULL UNIQUE,
                created_at TEXT NOT NULL DEFAULT CURRENT_TIMESTAMP,
                updated_at TEXT NOT NULL DEFAULT CURRENT_TIMESTAMP
            );
            "#
        ))?,
    }

    let link = scheme.link_column();
    for backend in BackendType::EAV {
        let Some(table) = backend.eav_table() else {
            continue;
        };
        let value_type = match backend {
            BackendType::Int => "INTEGER",
            BackendType::Decimal => "REAL",
            _ => "TEXT",
        };
        conn.execute_batch(&format!(
            r#"
            CREATE TABLE IF NOT EXISTS {table} (
                value_id INTEGER PRIMARY KEY AUTOINCREMENT,
                attribute_id INTEGER NOT NULL,
                store_id INTEGER NOT NULL DEFAULT 0,
                {link} INTEGER NOT NULL REFERENCES {PRODUCT_ENTITY_TABLE}({link}) ON DELETE CASCADE,
                value {value_type},
                UNIQUE ({link}, attribute_id, store_id)
            );
            "#
        ))?;
    }

    conn.execute_batch(&format!(
        r#"
        CREATE TABLE IF NOT EXISTS {STOCK_ITEM_TABLE} (
            item_id INTEGER PRIMARY KEY AUTOINCREMENT,
            product_id INTEGER NOT NULL,
            stock_id INTEGER NOT NULL DEFAULT 1,
            qty REAL NOT NULL DEFAULT 0,
            is_in_stock INTEGER NOT NULL DEFAULT 1,
            manage_stock INTEGER NOT NULL DEFAULT 1,
            min_qty REAL NOT NULL DEFAULT 0,
            min_sale_qty REAL NOT NULL DEFAULT 0,
            max_sale_qty REAL NOT NULL DEFAULT 0,
            UNIQUE (product_id, stock_id)
        );

        CREATE TABLE IF NOT EXISTS {GALLERY_TABLE} (
            value_id INTEGER PRIMARY KEY AUTOINCREMENT,
            attribute_id INTEGER NOT NULL,
            value TEXT NOT NULL,
            media_type TEXT NOT NULL DEFAULT 'image',
            disabled INTEGER NOT NULL DEFAULT 0,
            UNIQUE (attribute_id, value)
        );

        CREATE TABLE IF NOT EXISTS {GALLERY_LINK_TABLE} (
            value_id INTEGER NOT NULL REFERENCES {GALLERY_TABLE}(value_id) ON DELETE CASCADE,
            {link} INTEGER NOT NULL,
            UNIQUE (value_id, {link})
        );

        CREATE TABLE IF NOT EXISTS {PRICE_INDEX_TABLE} (
            entity_id INTEGER NOT NULL,
            customer_group_id INTEGER NOT NULL,
            website_id INTEGER NOT NULL,
            tax_class_id INTEGER NOT NULL DEFAULT 0,
            price REAL,
            final_price REAL,
            min_price REAL,
            max_price REAL,
            tier_price REAL,
            PRIMARY KEY (entity_id, customer_group_id, website_id)
        );
        "#
    ))?;

    Ok(())
}

/// 写入属性定义（已存在的 attribute_id 覆盖）
pub fn seed_attributes(conn: &Connection, definitions: &[AttributeDefinition]) -> rusqlite::Result<usize> {
    let mut stmt = conn.prepare(
        "INSERT INTO eav_attribute (attribute_id, entity_type_id, attribute_code, backend_type)
         VALUES (?1, ?2, ?3, ?4)
         ON CONFLICT(attribute_id) DO UPDATE SET
            attribute_code = excluded.attribute_code,
            backend_type = excluded.backend_type",
    )?;
    let mut count = 0;
    for def in definitions {
        count += stmt.execute(params![
            def.attribute_id,
            PRODUCT_ENTITY_TYPE_ID,
            def.code,
            def.backend_type.as_str()
        ])?;
    }
    Ok(count)
}

/// 默认属性目录
pub fn default_attribute_definitions() -> Vec<AttributeDefinition> {
    DEFAULT_PRODUCT_ATTRIBUTES
        .iter()
        .map(|(code, id, backend)| AttributeDefinition {
            attribute_id: *id,
            code: code.to_string(),
            backend_type: *backend,
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::table_columns;

    #[test]
    fn test_row_id_schema_links_by_row_id() {
        let conn = Connection::open_in_memory().unwrap();
        create_catalog_schema(&conn, LinkageScheme::RowId).unwrap();
        let cols = table_columns(&conn, "catalog_product_entity_int").unwrap();
        assert!(cols.contains(&"row_id".to_string()));
        assert!(!cols.contains(&"entity_id".to_string()));
        assert!(table_columns(&conn, SEQUENCE_TABLE).unwrap().len() == 1);
    }

    #[test]
    fn test_schema_is_idempotent_and_seedable() {
        let conn = Connection::open_in_memory().unwrap();
        create_catalog_schema(&conn, LinkageScheme::EntityId).unwrap();
        create_catalog_schema(&conn, LinkageScheme::EntityId).unwrap();
        let defs = default_attribute_definitions();
        assert_eq!(seed_attributes(&conn, &defs).unwrap(), defs.len());
        let n: i64 = conn
            .query_row("SELECT COUNT(*) FROM eav_attribute", [], |r| r.get(0))
            .unwrap();
        assert_eq!(n as usize, defs.len());
    }
}
