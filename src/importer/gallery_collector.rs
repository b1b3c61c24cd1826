// ==========================================
// 商品批量导入引擎 - 图库收集器
// ==========================================
// 图片列按 '|' 拆分，去空白、去空串
// 去重键: (sku, 路径)，跨列去重
// ==========================================

use crate::domain::product::{MediaGalleryEntry, SkuLinkMap};
use crate::importer::column_classifier::ColumnLayout;
use crate::importer::entity_resolver::row_link;
use crate::importer::file_parser::cell;
use std::collections::HashSet;

pub const MEDIA_TYPE_IMAGE: &str = "image";

pub fn collect_gallery(
    rows: &[Vec<String>],
    layout: &ColumnLayout,
    links: &SkuLinkMap,
    gallery_attribute_id: u16,
) -> Vec<MediaGalleryEntry> {
    let mut entries = Vec::new();
    if layout.gallery.is_empty() {
        return entries;
    }

    let mut seen: HashSet<(&str, &str)> = HashSet::new();

    for row in rows {
        let Some((sku, link_id)) = row_link(row, layout, links) else {
            continue;
        };

        for (_, index) in layout.gallery.iter() {
            for path in cell(row, index).split('|').map(str::trim) {
                if path.is_empty() || !seen.insert((sku, path)) {
                    continue;
                }
                entries.push(MediaGalleryEntry {
                    link_id,
                    sku: sku.to_string(),
                    attribute_id: gallery_attribute_id,
                    value: path.to_string(),
                    media_type: MEDIA_TYPE_IMAGE.to_string(),
                    disabled: false,
                });
            }
        }
    }

    entries
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::product::AttributeCatalog;
    use crate::importer::column_classifier::classify;

    fn strings(values: &[&str]) -> Vec<String> {
        values.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_split_and_dedup_across_columns() {
        let headers = strings(&["sku", "image", "media_gallery"]);
        let (layout, _) = classify(&headers, &AttributeCatalog::default()).unwrap();
        let links: SkuLinkMap = [("A".to_string(), 1), ("B".to_string(), 2)]
            .into_iter()
            .collect();
        let rows = vec![
            strings(&["A", "/a.jpg", " /a.jpg | /b.jpg ||"]),
            strings(&["B", "/a.jpg", ""]),
        ];

        let entries = collect_gallery(&rows, &layout, &links, 90);
        let values: Vec<(&str, &str)> = entries
            .iter()
            .map(|e| (e.sku.as_str(), e.value.as_str()))
            .collect();
        assert_eq!(values, vec![("A", "/a.jpg"), ("A", "/b.jpg"), ("B", "/a.jpg")]);
        assert!(entries.iter().all(|e| e.attribute_id == 90 && !e.disabled));
    }

    #[test]
    fn test_colons_in_sku_and_path_do_not_collide() {
        let headers = strings(&["sku", "image"]);
        let (layout, _) = classify(&headers, &AttributeCatalog::default()).unwrap();
        let links: SkuLinkMap = [("A:x".to_string(), 1), ("A".to_string(), 2)]
            .into_iter()
            .collect();
        let rows = vec![strings(&["A:x", "y"]), strings(&["A", "x:y"])];

        let entries = collect_gallery(&rows, &layout, &links, 90);
        let values: Vec<(&str, &str)> = entries
            .iter()
            .map(|e| (e.sku.as_str(), e.value.as_str()))
            .collect();
        assert_eq!(values, vec![("A:x", "y"), ("A", "x:y")]);
    }
}
