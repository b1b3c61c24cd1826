// ==========================================
// 商品批量导入引擎 - 属性值收集器
// ==========================================
// 职责: 属性列 → 按后端类型分桶的 EAV 值行
// 口径: 空值静默跳过；类型不符只跳过该值并告警
// ==========================================

use crate::domain::product::{EavValueRow, SkuLinkMap};
use crate::domain::types::BackendType;
use crate::importer::column_classifier::ColumnLayout;
use crate::importer::entity_resolver::row_link;
use crate::importer::file_parser::cell;
use crate::importer::value_parser::convert_eav;
use std::collections::BTreeMap;

/// 按后端类型分桶的收集结果
#[derive(Debug, Clone, Default)]
pub struct EavBuckets {
    pub buckets: BTreeMap<BackendType, Vec<EavValueRow>>,
    pub warnings: Vec<String>,
}

impl EavBuckets {
    pub fn rows(&self, backend: BackendType) -> &[EavValueRow] {
        self.buckets.get(&backend).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn total(&self) -> usize {
        self.buckets.values().map(Vec::len).sum()
    }
}

pub fn collect_eav(
    rows: &[Vec<String>],
    layout: &ColumnLayout,
    links: &SkuLinkMap,
    store_id: u16,
) -> EavBuckets {
    let mut out = EavBuckets::default();
    if layout.attributes.is_empty() {
        return out;
    }

    for row in rows {
        let Some((sku, link_id)) = row_link(row, layout, links) else {
            continue;
        };

        for column in &layout.attributes {
            let raw = cell(row, column.index);
            if raw.is_empty() {
                continue;
            }

            let backend = column.attribute.backend_type;
            match convert_eav(backend, raw) {
                Some(value) => out.buckets.entry(backend).or_default().push(EavValueRow {
                    link_id,
                    attribute_id: column.attribute.attribute_id,
                    store_id,
                    value,
                }),
                None => out.warnings.push(format!(
                    "sku={} attr={}: invalid {} {:?}",
                    sku, column.attribute.code, backend, raw
                )),
            }
        }
    }

    out
}
