// ==========================================
// 库存 JSON 导入集成测试
// ==========================================


use catalog_import::domain::{LinkageScheme, StockItemInput};
use catalog_import::importer::{ImportError, StockImportRequest, StockImporter};
use rusqlite::types::Value;
use test_helpers::*;

fn item(sku: &str, qty: Option<f64>) -> StockItemInput {
    StockItemInput {
        sku: sku.to_string(),
        qty,
        ..Default::default()
    }
}

#[tokio::test]
async fn test_stock_import_skips_empty_and_unknown_skus() {
    let (_tmp, db_path) = create_test_db(LinkageScheme::EntityId).unwrap();
    let a = insert_product(&db_path, "STK-A", "A");
    insert_product(&db_path, "STK-B", "B");

    let body = std::fs::read_to_string(fixture_path("stock_items.json")).unwrap();
    let request = StockImportRequest::from_json(&body).unwrap();
    assert_eq!(request.batch_size, 2);

    // 夹具里的 SKU 换成本测试插入的商品
    let mut items = request.items;
    items[0].sku = "STK-A".to_string();
    items[1].sku = "STK-B".to_string();

    let result = StockImporter::new(new_repo(&db_path))
        .import(items, request.batch_size)
        .await
        .unwrap();

    assert_eq!(result.imported, 2);
    assert_eq!(result.skipped, 2);
    assert_eq!(
        result.warnings,
        vec![
            "empty sku, skipping".to_string(),
            "sku=NOPE-404: product not found".to_string(),
        ]
    );
    // 不新建商品
    assert_eq!(count_rows(&db_path, "catalog_product_entity"), 2);

    let row = dump(
        &db_path,
        &format!(
            "SELECT qty, is_in_stock, manage_stock, stock_id FROM cataloginventory_stock_item WHERE product_id = {}",
            a
        ),
    );
    assert_eq!(row, vec!["Real(25.0)|Integer(1)|Integer(1)|Integer(1)"]);
}

#[tokio::test]
async fn test_stock_reimport_updates_single_row() {
    let (_tmp, db_path) = create_test_db(LinkageScheme::EntityId).unwrap();
    insert_product(&db_path, "STK-U", "U");
    let importer = StockImporter::new(new_repo(&db_path));

    importer.import(vec![item("STK-U", Some(1.0))], 0).await.unwrap();
    let result = importer.import(vec![item("STK-U", Some(9.0))], 0).await.unwrap();

    assert_eq!(result.imported, 1);
    assert_eq!(count_rows(&db_path, "cataloginventory_stock_item"), 1);
    assert_eq!(
        query_value(&db_path, "SELECT qty FROM cataloginventory_stock_item", &[]),
        Some(Value::Real(9.0))
    );
}

#[tokio::test]
async fn test_stock_import_rejects_empty_items() {
    let (_tmp, db_path) = create_test_db(LinkageScheme::EntityId).unwrap();
    let err = StockImporter::new(new_repo(&db_path))
        .import(Vec::new(), 500)
        .await
        .unwrap_err();
    assert!(matches!(err, ImportError::InvalidInput(_)));
}

#[tokio::test]
async fn test_stock_import_under_row_id_scheme() {
    let (_tmp, db_path) = create_test_db(LinkageScheme::RowId).unwrap();
    open(&db_path)
        .execute_batch(
            "INSERT INTO sequence_product (sequence_value) VALUES (NULL);
             INSERT INTO catalog_product_entity (entity_id, sku) VALUES (1, 'RID');
             INSERT INTO catalog_product_entity (entity_id, sku) VALUES (1, 'RID');",
        )
        .unwrap();

    let result = StockImporter::new(new_repo(&db_path))
        .import(vec![item("RID", Some(4.0))], 10)
        .await
        .unwrap();

    assert_eq!(result.imported, 1);
    assert_eq!(
        query_value(&db_path, "SELECT product_id FROM cataloginventory_stock_item", &[]),
        Some(Value::Integer(2))
    );
}
