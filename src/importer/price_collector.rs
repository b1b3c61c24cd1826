// ==========================================
// 商品批量导入引擎 - 价格索引收集器
// ==========================================
// 默认: customer_group_id = 0 / website_id = 1
// 口径: price_index 同时写 price/final/min/max，后续列覆盖
// ==========================================

use crate::domain::product::{PriceIndexRow, SkuLinkMap};
use crate::importer::column_classifier::ColumnLayout;
use crate::importer::entity_resolver::row_link;
use crate::importer::file_parser::cell;
use crate::importer::value_parser::{parse_decimal, Collected};

pub fn collect_price(
    rows: &[Vec<String>],
    layout: &ColumnLayout,
    links: &SkuLinkMap,
) -> Collected<PriceIndexRow> {
    let mut out = Collected::default();
    if layout.price.is_empty() {
        return out;
    }

    'rows: for row in rows {
        let Some((sku, link_id)) = row_link(row, layout, links) else {
            continue;
        };

        let mut item = PriceIndexRow::with_defaults(link_id);
        let mut populated = false;

        // layout.price 按 PRICE_COLUMNS 顺序排列
        for (column, index) in layout.price.iter() {
            let raw = cell(row, index);
            if raw.is_empty() {
                continue;
            }
            let Some(value) = parse_decimal(raw) else {
                out.warnings
                    .push(format!("sku={}: invalid {} {:?}", sku, column, raw));
                continue 'rows;
            };

            match column {
                "price_index" => {
                    item.price = value;
                    item.final_price = value;
                    item.min_price = value;
                    item.max_price = value;
                }
                "final_price" => item.final_price = value,
                "min_price" => item.min_price = value,
                "max_price" => item.max_price = value,
                "tier_price" => item.tier_price = value,
                _ => continue,
            }
            populated = true;
        }

        if populated {
            out.rows.push(item);
        }
    }

    out
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
    fn test_later_columns_override_price_index() {
        // 表头顺序与保留列顺序无关
        let headers = strings(&["sku", "min_price", "price_index"]);
        let (layout, _) = classify(&headers, &AttributeCatalog::default()).unwrap();
        let links: SkuLinkMap = [("A".to_string(), 7)].into_iter().collect();

        let out = collect_price(&[strings(&["A", "5", "10"])], &layout, &links);
        assert_eq!(out.rows.len(), 1);
        let row = &out.rows[0];
        assert_eq!(row.price, 10.0);
        assert_eq!(row.final_price, 10.0);
        assert_eq!(row.min_price, 5.0);
        assert_eq!(row.max_price, 10.0);
        assert_eq!(row.website_id, 1);
    }

    #[test]
    fn test_invalid_price_skips_row() {
        let headers = strings(&["sku", "price_index"]);
        let (layout, _) = classify(&headers, &AttributeCatalog::default()).unwrap();
        let links: SkuLinkMap = [("A".to_string(), 7)].into_iter().collect();

        let out = collect_price(&[strings(&["A", "n/a"])], &layout, &links);
        assert!(out.rows.is_empty());
        assert_eq!(out.warnings, vec!["sku=A: invalid price_index \"n/a\"".to_string()]);
    }
}
