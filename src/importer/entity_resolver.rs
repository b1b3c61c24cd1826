// ==========================================
// 商品批量导入引擎 - 实体解析器
// ==========================================
// 职责: SKU → LinkID
// 流程: 去重 → 分批查询已存在 SKU → 为缺失 SKU 批量建行
// 口径: 同一输入中重复的新 SKU 只建一次（第一次出现的行决定 type_id / attribute_set_id）
// ==========================================

use crate::domain::product::{NewProductEntity, SkuLinkMap, DEFAULT_TYPE_ID};
use crate::domain::types::LinkageScheme;
use crate::importer::column_classifier::ColumnLayout;
use crate::importer::error::ImportError;
use crate::importer::file_parser::cell;
use crate::repository::product_import_repo::ProductImportRepository;
use std::collections::HashSet;
use std::sync::Arc;
use tracing::{debug, info};

/// 解析结果
#[derive(Debug, Clone, Default)]
pub struct EntityResolution {
    pub links: SkuLinkMap,
    /// 本次新建的商品数
    pub created: usize,
    /// 空 SKU 行数
    pub skipped: usize,
}

pub struct EntityResolver<R: ProductImportRepository> {
    repo: Arc<R>,
}

impl<R: ProductImportRepository> EntityResolver<R> {
    pub fn new(repo: Arc<R>) -> Self {
        Self { repo }
    }

    /// 解析全部行的 SKU
    ///
    /// # 参数
    /// - default_attribute_set: 行内未给出合法 attribute_set_id 时使用
    pub async fn resolve(
        &self,
        rows: &[Vec<String>],
        layout: &ColumnLayout,
        scheme: LinkageScheme,
        batch_size: usize,
        default_attribute_set: u16,
    ) -> Result<EntityResolution, ImportError> {
        let mut skipped = 0usize;
        let mut seen: HashSet<&str> = HashSet::new();
        let mut unique_skus: Vec<String> = Vec::new();
        let mut first_rows: Vec<&Vec<String>> = Vec::new();

        for row in rows {
            let sku = cell(row, layout.sku);
            if sku.is_empty() {
                skipped += 1;
                continue;
            }
            if seen.insert(sku) {
                unique_skus.push(sku.to_string());
                first_rows.push(row);
            }
        }

        debug!(
            unique = unique_skus.len(),
            skipped, "SKU 去重完成"
        );

        let mut links = self
            .repo
            .lookup_skus(unique_skus.clone(), scheme, batch_size)
            .await
            .map_err(|e| ImportError::SkuLookupError(e.to_string()))?;

        let existing = links.len();

        let new_entities: Vec<NewProductEntity> = unique_skus
            .into_iter()
            .zip(first_rows)
            .filter(|(sku, _)| !links.contains_key(sku))
            .map(|(sku, row)| new_entity(sku, row, layout, default_attribute_set))
            .collect();

        let created = new_entities.len();
        if created > 0 {
            let created_links = self
                .repo
                .create_entities(new_entities, scheme, batch_size)
                .await
                .map_err(|e| ImportError::EntityCreationError(e.to_string()))?;
            links.extend(created_links);
        }

        info!(existing, created, skipped, "实体解析完成");

        Ok(EntityResolution {
            links,
            created,
            skipped,
        })
    }
}

/// 行的 SKU 及其 LinkID；空 SKU 或未解析的 SKU 返回 None
pub fn row_link<'a>(
    row: &'a [String],
    layout: &ColumnLayout,
    links: &SkuLinkMap,
) -> Option<(&'a str, u64)> {
    let sku = cell(row, layout.sku);
    if sku.is_empty() {
        return None;
    }
    links.get(sku).map(|id| (sku, *id))
}

fn new_entity(
    sku: String,
    row: &[String],
    layout: &ColumnLayout,
    default_attribute_set: u16,
) -> NewProductEntity {
    let type_id = layout
        .type_id
        .map(|idx| cell(row, idx))
        .filter(|v| !v.is_empty())
        .unwrap_or(DEFAULT_TYPE_ID)
        .to_string();

    let attribute_set_id = layout
        .attribute_set_id
        .and_then(|idx| cell(row, idx).parse::<u16>().ok())
        .filter(|v| *v > 0)
        .unwrap_or(default_attribute_set);

    NewProductEntity {
        sku,
        type_id,
        attribute_set_id,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row(values: &[&str]) -> Vec<String> {
        values.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_new_entity_defaults() {
        let layout = ColumnLayout {
            sku: 0,
            type_id: Some(1),
            attribute_set_id: Some(2),
            ..Default::default()
        };
        let e = new_entity("A".to_string(), &row(&["A", "", "abc"]), &layout, 4);
        assert_eq!(e.type_id, "simple");
        assert_eq!(e.attribute_set_id, 4);

        let e = new_entity("B".to_string(), &row(&["B", "virtual", "9"]), &layout, 4);
        assert_eq!(e.type_id, "virtual");
        assert_eq!(e.attribute_set_id, 9);

        let e = new_entity("C".to_string(), &row(&["C", "simple", "0"]), &layout, 4);
        assert_eq!(e.attribute_set_id, 4);
    }
}
