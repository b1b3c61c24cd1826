// ==========================================
// 商品 CSV 导入集成测试
// ==========================================
// 覆盖: 幂等重导 / 类型不符跳过 / 未知列 / 图库去重 / row_id 关联 /
//       缺少 sku 列 / 已存在 SKU 更新 / 两种写入策略一致 / 写入失败汇总 /
//       关联方案缓存与重置
// ==========================================


use catalog_import::config::ImportOptions;
use catalog_import::domain::{BackendType, LinkageScheme, WriteStrategy};
use catalog_import::importer::{ImportError, ProductImporter, ProductImporterImpl};
use catalog_import::logging;
use catalog_import::repository::{ProductImportRepository, ProductImportRepositoryImpl};
use rusqlite::types::Value;
use std::io::Cursor;
use test_helpers::*;

fn importer(db_path: &str, options: ImportOptions) -> ProductImporterImpl<ProductImportRepositoryImpl> {
    ProductImporterImpl::new(new_repo(db_path), options)
}

fn default_importer(db_path: &str) -> ProductImporterImpl<ProductImportRepositoryImpl> {
    importer(db_path, ImportOptions::default())
}

// ==========================================
// 幂等
// ==========================================

#[tokio::test]
async fn test_reimport_is_idempotent() {
    logging::init_test();
    let (_tmp, db_path) = create_test_db(LinkageScheme::EntityId).unwrap();
    let csv = write_csv(
        "sku,name,price,status,qty\n\
         IDEM-1,One,1.5,1,3\n\
         IDEM-2,Two,2.5,1,4\n\
         IDEM-3,Three,3.5,2,5\n",
    );

    let first = default_importer(&db_path).import_from_csv(csv.path()).await.unwrap();
    assert_eq!(first.total_rows, 3);
    assert_eq!(first.created, 3);
    assert_eq!(first.updated, 0);

    let tables = [
        "catalog_product_entity",
        "catalog_product_entity_varchar",
        "catalog_product_entity_decimal",
        "catalog_product_entity_int",
        "cataloginventory_stock_item",
    ];
    let before: Vec<i64> = tables.iter().map(|t| count_rows(&db_path, t)).collect();
    assert_eq!(before, vec![3, 3, 3, 3, 3]);

    let second = default_importer(&db_path).import_from_csv(csv.path()).await.unwrap();
    assert_eq!(second.created, 0);
    assert_eq!(second.updated, 3);
    assert!(second.warnings.is_empty());

    let after: Vec<i64> = tables.iter().map(|t| count_rows(&db_path, t)).collect();
    assert_eq!(before, after);
}

// ==========================================
// 类型不符: 告警并跳过，不中断
// ==========================================

#[tokio::test]
async fn test_invalid_typed_values_are_skipped_with_warnings() {
    let (_tmp, db_path) = create_test_db(LinkageScheme::EntityId).unwrap();
    let csv = write_csv("sku,status,price,special_from_date\nSKU-BAD,not_a_number,abc,not-a-date\n");

    let result = default_importer(&db_path).import_from_csv(csv.path()).await.unwrap();

    assert_eq!(result.warnings.len(), 3);
    assert!(result.warnings.iter().all(|w| w.starts_with("sku=SKU-BAD attr=")));
    assert!(result.warnings[0].contains("not_a_number"));
    assert_eq!(result.created, 1);
    assert_eq!(result.eav_count(BackendType::Int), 0);
    assert_eq!(result.eav_count(BackendType::Decimal), 0);
    assert_eq!(result.eav_count(BackendType::Datetime), 0);
    assert_eq!(count_rows(&db_path, "catalog_product_entity_int"), 0);
    assert_eq!(count_rows(&db_path, "catalog_product_entity_decimal"), 0);
    assert_eq!(count_rows(&db_path, "catalog_product_entity_datetime"), 0);
}

#[tokio::test]
async fn test_unknown_column_is_tolerated() {
    let (_tmp, db_path) = create_test_db(LinkageScheme::EntityId).unwrap();
    let csv = write_csv("sku,name,colour\nUNK-1,Unknown Col,red\n");

    let result = default_importer(&db_path).import_from_csv(csv.path()).await.unwrap();

    assert_eq!(result.warnings, vec!["column \"colour\": unknown, skipping".to_string()]);
    assert_eq!(
        attribute_value(&db_path, "catalog_product_entity_varchar", "UNK-1", 73),
        Some(Value::Text("Unknown Col".to_string()))
    );
}

// ==========================================
// 图库去重
// ==========================================

#[tokio::test]
async fn test_gallery_dedup_across_columns() {
    let (_tmp, db_path) = create_test_db(LinkageScheme::EntityId).unwrap();
    let csv = write_csv("sku,image,media_gallery\nGAL-1,/g/a.jpg,/g/a.jpg | /g/b.jpg\n");

    let result = default_importer(&db_path).import_from_csv(csv.path()).await.unwrap();

    assert_eq!(result.count("gallery"), 2);
    assert_eq!(count_rows(&db_path, "catalog_product_entity_media_gallery"), 2);
    assert_eq!(
        count_rows(&db_path, "catalog_product_entity_media_gallery_value_to_entity"),
        2
    );
    // image 同时是 varchar 属性
    assert_eq!(result.eav_count(BackendType::Varchar), 1);

    // 图库属性 ID 取目录中的 media_gallery
    let attr = query_value(
        &db_path,
        "SELECT DISTINCT attribute_id FROM catalog_product_entity_media_gallery",
        &[],
    );
    assert_eq!(attr, Some(Value::Integer(90)));
}

// ==========================================
// row_id 关联方案
// ==========================================

#[tokio::test]
async fn test_row_id_scheme_links_values_to_version_rows() {
    let (_tmp, db_path) = create_test_db(LinkageScheme::RowId).unwrap();
    {
        // 已存在商品有两个版本行，让 row_id 与 entity_id 错开
        let conn = open(&db_path);
        conn.execute_batch(
            "INSERT INTO sequence_product (sequence_value) VALUES (NULL);
             INSERT INTO catalog_product_entity (entity_id, sku, created_in, updated_in) VALUES (1, 'OLD', 1, 100);
             INSERT INTO catalog_product_entity (entity_id, sku, created_in, updated_in) VALUES (1, 'OLD', 100, 2147483647);",
        )
        .unwrap();
    }

    let csv = write_csv("sku,name,status\nROW-1,First,1\nROW-2,Second,1\nOLD,Old Latest,2\n");
    let result = default_importer(&db_path).import_from_csv(csv.path()).await.unwrap();

    assert_eq!(result.linkage, LinkageScheme::RowId);
    assert_eq!(result.created, 2);
    assert_eq!(result.updated, 1);

    let owner = |value: &str| {
        query_value(
            &db_path,
            "SELECT e.sku FROM catalog_product_entity_varchar v
             JOIN catalog_product_entity e ON e.row_id = v.row_id
             WHERE v.attribute_id = 73 AND v.value = ?1",
            &[&value],
        )
    };
    assert_eq!(owner("First"), Some(Value::Text("ROW-1".to_string())));
    assert_eq!(owner("Second"), Some(Value::Text("ROW-2".to_string())));

    // 已存在 SKU 写到最新版本行
    let old_row = query_value(
        &db_path,
        "SELECT row_id FROM catalog_product_entity_varchar WHERE value = 'Old Latest'",
        &[],
    );
    assert_eq!(old_row, Some(Value::Integer(2)));

    // 新实体的 entity_id 来自 sequence 连续区间
    let entity_ids = dump(
        &db_path,
        "SELECT entity_id FROM catalog_product_entity WHERE sku LIKE 'ROW-%' ORDER BY sku",
    );
    assert_eq!(entity_ids, vec!["Integer(2)", "Integer(3)"]);
}

// ==========================================
// 缺少 sku 列
// ==========================================

#[tokio::test]
async fn test_missing_sku_column_writes_nothing() {
    let (_tmp, db_path) = create_test_db(LinkageScheme::EntityId).unwrap();
    let csv = write_csv("name,price\nNo Sku,1.0\n");

    let err = default_importer(&db_path).import_from_csv(csv.path()).await.unwrap_err();

    assert!(matches!(err, ImportError::MissingSkuColumn));
    assert!(err.to_string().contains("sku"));
    assert_eq!(count_rows(&db_path, "catalog_product_entity"), 0);
    assert_eq!(count_rows(&db_path, "catalog_product_entity_varchar"), 0);
}

// ==========================================
// 已存在 SKU 更新
// ==========================================

#[tokio::test]
async fn test_existing_sku_is_updated_in_place() {
    let (_tmp, db_path) = create_test_db(LinkageScheme::EntityId).unwrap();
    insert_product(&db_path, "SKU-EXIST", "Old Name");

    let result = default_importer(&db_path)
        .import_from_reader(Cursor::new("sku,name,price\nSKU-EXIST,New Name,49.99\n"))
        .await
        .unwrap();

    assert_eq!(result.created, 0);
    assert_eq!(result.updated, 1);
    assert_eq!(count_rows(&db_path, "catalog_product_entity"), 1);
    assert_eq!(
        attribute_value(&db_path, "catalog_product_entity_varchar", "SKU-EXIST", 73),
        Some(Value::Text("New Name".to_string()))
    );
    assert_eq!(
        attribute_value(&db_path, "catalog_product_entity_decimal", "SKU-EXIST", 77),
        Some(Value::Real(49.99))
    );
}

#[tokio::test]
async fn test_empty_sku_rows_are_skipped() {
    let (_tmp, db_path) = create_test_db(LinkageScheme::EntityId).unwrap();
    let csv = write_csv("sku,name\n,No Sku\n  ,Blank\nOK-1,Fine\n");

    let result = default_importer(&db_path).import_from_csv(csv.path()).await.unwrap();

    assert_eq!(result.total_rows, 3);
    assert_eq!(result.skipped, 2);
    assert_eq!(result.created, 1);
    assert_eq!(result.updated, 0);
    assert_eq!(count_rows(&db_path, "catalog_product_entity_varchar"), 1);
}

// ==========================================
// 混合列夹具
// ==========================================

#[tokio::test]
async fn test_mixed_fixture_fills_every_destination() {
    let (_tmp, db_path) = create_test_db(LinkageScheme::EntityId).unwrap();

    let result = default_importer(&db_path)
        .import_from_csv(fixture_path("products_mixed.csv"))
        .await
        .unwrap();

    assert_eq!(result.total_rows, 4);
    assert_eq!(result.created, 3);
    assert_eq!(result.updated, 1);
    assert!(result.warnings.is_empty(), "{:?}", result.warnings);
    assert_eq!(result.count("stock"), 3);
    assert_eq!(result.count("price_index"), 3);
    assert_eq!(result.count("gallery"), 4);
    assert_eq!(result.eav_count(BackendType::Datetime), 2);

    // 同一 SKU 的后一行覆盖 name
    assert_eq!(
        attribute_value(&db_path, "catalog_product_entity_varchar", "MX-001", 73),
        Some(Value::Text("Alpha Tee v2".to_string()))
    );
    // 仅日期的值补零点
    assert_eq!(
        attribute_value(&db_path, "catalog_product_entity_datetime", "MX-002", 94),
        Some(Value::Text("2026-02-01 00:00:00".to_string()))
    );
    // 新实体的 type_id / attribute_set_id 取自行
    let entity = dump(
        &db_path,
        "SELECT sku, type_id, attribute_set_id FROM catalog_product_entity ORDER BY sku",
    );
    assert_eq!(entity[1], "Text(\"MX-002\")|Text(\"simple\")|Integer(4)");
    assert_eq!(entity[2], "Text(\"MX-003\")|Text(\"virtual\")|Integer(9)");

    let stock = dump(
        &db_path,
        "SELECT s.qty, s.is_in_stock FROM cataloginventory_stock_item s
         JOIN catalog_product_entity e ON e.entity_id = s.product_id ORDER BY e.sku",
    );
    assert_eq!(stock, vec!["Real(10.0)|Integer(1)", "Real(0.0)|Integer(0)", "Real(3.5)|Integer(1)"]);
}

// ==========================================
// 两种写入策略结果一致
// ==========================================

const STRATEGY_DUMPS: &[&str] = &[
    "SELECT entity_id, sku, type_id, attribute_set_id FROM catalog_product_entity ORDER BY entity_id",
    "SELECT entity_id, attribute_id, store_id, value FROM catalog_product_entity_varchar ORDER BY 1, 2, 3",
    "SELECT entity_id, attribute_id, store_id, value FROM catalog_product_entity_int ORDER BY 1, 2, 3",
    "SELECT entity_id, attribute_id, store_id, value FROM catalog_product_entity_decimal ORDER BY 1, 2, 3",
    "SELECT entity_id, attribute_id, store_id, value FROM catalog_product_entity_text ORDER BY 1, 2, 3",
    "SELECT entity_id, attribute_id, store_id, value FROM catalog_product_entity_datetime ORDER BY 1, 2, 3",
    "SELECT product_id, stock_id, qty, is_in_stock, manage_stock, min_qty, min_sale_qty, max_sale_qty
     FROM cataloginventory_stock_item ORDER BY 1, 2",
    "SELECT attribute_id, value, media_type, disabled FROM catalog_product_entity_media_gallery ORDER BY 2",
    "SELECT g.value, l.entity_id FROM catalog_product_entity_media_gallery_value_to_entity l
     JOIN catalog_product_entity_media_gallery g ON g.value_id = l.value_id ORDER BY 1, 2",
    "SELECT entity_id, customer_group_id, website_id, price, final_price, min_price, max_price, tier_price
     FROM catalog_product_index_price ORDER BY 1",
];

#[tokio::test]
async fn test_write_strategies_store_identical_rows() {
    let (_tmp_a, native_db) = create_test_db(LinkageScheme::EntityId).unwrap();
    let (_tmp_b, generated_db) = create_test_db(LinkageScheme::EntityId).unwrap();

    let native = ImportOptions {
        batch_size: 2,
        ..ImportOptions::default()
    };
    let generated = ImportOptions {
        raw_sql_mode: true,
        ..native
    };

    for _ in 0..2 {
        let a = importer(&native_db, native)
            .import_from_csv(fixture_path("products_mixed.csv"))
            .await
            .unwrap();
        let b = importer(&generated_db, generated)
            .import_from_csv(fixture_path("products_mixed.csv"))
            .await
            .unwrap();
        assert_eq!(a.write_strategy, WriteStrategy::NativeBatch);
        assert_eq!(b.write_strategy, WriteStrategy::GeneratedStatement);
        assert_eq!(a.counts, b.counts);
    }

    for sql in STRATEGY_DUMPS {
        assert_eq!(dump(&native_db, sql), dump(&generated_db, sql), "{}", sql);
    }
}

// ==========================================
// 写入失败汇总
// ==========================================

#[tokio::test]
async fn test_flush_failure_reports_failed_destination() {
    let (_tmp, db_path) = create_test_db(LinkageScheme::EntityId).unwrap();
    open(&db_path)
        .execute_batch("DROP TABLE catalog_product_entity_int;")
        .unwrap();

    let csv = write_csv("sku,name,status\nFAIL-1,Broken,1\n");
    let err = default_importer(&db_path).import_from_csv(csv.path()).await.unwrap_err();

    let (failures, cancelled, committed) = match err {
        ImportError::FlushFailed {
            failures,
            cancelled,
            committed,
        } => (failures, cancelled, committed),
        other => panic!("expected FlushFailed, got {other}"),
    };
    let targets: Vec<&str> = failures.iter().map(|f| f.target.as_str()).collect();
    assert_eq!(targets, vec!["int"]);
    assert!(failures[0].message.contains("no such table"), "{}", failures[0].message);

    // varchar 要么已提交，要么被取消；两种情况下计数都与库中一致
    assert!(cancelled.iter().all(|t| t == "varchar"), "{:?}", cancelled);
    assert_eq!(
        committed["varchar"] as i64,
        count_rows(&db_path, "catalog_product_entity_varchar")
    );
    assert_eq!(committed["int"], 0);

    // 已创建的实体不回滚
    assert_eq!(count_rows(&db_path, "catalog_product_entity"), 1);
}

#[tokio::test]
async fn test_flush_failure_counts_chunks_committed_before_error() {
    let (_tmp, db_path) = create_test_db(LinkageScheme::EntityId).unwrap();
    open(&db_path)
        .execute_batch(
            "CREATE TRIGGER reject_boom BEFORE INSERT ON catalog_product_entity_varchar
             WHEN NEW.value = 'boom'
             BEGIN SELECT RAISE(ABORT, 'boom'); END;",
        )
        .unwrap();

    let options = ImportOptions {
        batch_size: 1,
        ..ImportOptions::default()
    };
    for raw_sql_mode in [false, true] {
        let csv = write_csv("sku,name
P-1,ok
P-2,boom
");
        let err = importer(&db_path, ImportOptions { raw_sql_mode, ..options })
            .import_from_csv(csv.path())
            .await
            .unwrap_err();

        let (failures, cancelled, committed) = match err {
            ImportError::FlushFailed {
                failures,
                cancelled,
                committed,
            } => (failures, cancelled, committed),
            other => panic!("expected FlushFailed, got {other}"),
        };
        assert_eq!(failures.len(), 1);
        assert_eq!(failures[0].target, "varchar");
        assert!(failures[0].message.contains("boom"), "{}", failures[0].message);
        assert!(cancelled.is_empty());

        // 第一个分块已提交且计入 committed
        assert_eq!(committed["varchar"], 1, "raw_sql_mode={}", raw_sql_mode);
        assert_eq!(count_rows(&db_path, "catalog_product_entity_varchar"), 1);
        assert_eq!(
            attribute_value(&db_path, "catalog_product_entity_varchar", "P-1", 73),
            Some(Value::Text("ok".into()))
        );
    }
}

#[tokio::test]
async fn test_undetectable_linkage_is_fatal() {
    let tmp = tempfile::NamedTempFile::new().unwrap();
    let db_path = tmp.path().to_str().unwrap().to_string();
    open(&db_path)
        .execute_batch(
            "CREATE TABLE eav_attribute (attribute_id INTEGER PRIMARY KEY, entity_type_id INTEGER,
                 attribute_code TEXT, backend_type TEXT);
             INSERT INTO eav_attribute VALUES (73, 4, 'name', 'varchar');
             CREATE TABLE catalog_product_entity_varchar (value_id INTEGER PRIMARY KEY, product_ref INTEGER);",
        )
        .unwrap();

    let csv = write_csv("sku,name\nX,Y\n");
    let err = default_importer(&db_path).import_from_csv(csv.path()).await.unwrap_err();
    assert!(matches!(err, ImportError::LinkageUndetected(_)), "{err}");
}

#[tokio::test]
async fn test_linkage_detection_is_shared_until_reset() {
    let (_tmp, db_path) = create_test_db(LinkageScheme::EntityId).unwrap();
    let mut repo = ProductImportRepositoryImpl::new(&db_path).unwrap();

    let (a, b) = tokio::join!(repo.detect_linkage(), repo.detect_linkage());
    assert_eq!(a.unwrap(), LinkageScheme::EntityId);
    assert_eq!(b.unwrap(), LinkageScheme::EntityId);

    // 换成 row_id 结构后，缓存仍返回首次探测结果
    open(&db_path)
        .execute_batch(
            "DROP TABLE catalog_product_entity_varchar;
             CREATE TABLE catalog_product_entity_varchar (
                 value_id INTEGER PRIMARY KEY, attribute_id INTEGER, store_id INTEGER,
                 row_id INTEGER, value TEXT);",
        )
        .unwrap();
    assert_eq!(repo.detect_linkage().await.unwrap(), LinkageScheme::EntityId);

    repo.reset_linkage_detection();
    assert_eq!(repo.detect_linkage().await.unwrap(), LinkageScheme::RowId);
}
