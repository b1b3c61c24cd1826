// ==========================================
// 商品批量导入引擎 - 库存收集器
// ==========================================
// 默认: is_in_stock = 1 / manage_stock = 1 / stock_id = 1
// 口径: 任一库存列有值即产生一行；任一值非法则整行跳过并告警
// ==========================================

use crate::domain::product::{SkuLinkMap, StockItem};
use crate::importer::column_classifier::ColumnLayout;
use crate::importer::entity_resolver::row_link;
use crate::importer::file_parser::cell;
use crate::importer::value_parser::{parse_decimal, parse_flag, Collected};

pub fn collect_stock(
    rows: &[Vec<String>],
    layout: &ColumnLayout,
    links: &SkuLinkMap,
) -> Collected<StockItem> {
    let mut out = Collected::default();
    if layout.stock.is_empty() {
        return out;
    }

    'rows: for row in rows {
        let Some((sku, link_id)) = row_link(row, layout, links) else {
            continue;
        };

        let mut item = StockItem::with_defaults(link_id);
        let mut populated = false;

        for (column, index) in layout.stock.iter() {
            let raw = cell(row, index);
            if raw.is_empty() {
                continue;
            }

            let applied = match column {
                "is_in_stock" => parse_flag(raw).map(|v| item.is_in_stock = v),
                "manage_stock" => parse_flag(raw).map(|v| item.manage_stock = v),
                "qty" => parse_decimal(raw).map(|v| item.qty = v),
                "min_qty" => parse_decimal(raw).map(|v| item.min_qty = v),
                "min_sale_qty" => parse_decimal(raw).map(|v| item.min_sale_qty = v),
                "max_sale_qty" => parse_decimal(raw).map(|v| item.max_sale_qty = v),
                _ => Some(()),
            };

            if applied.is_none() {
                out.warnings
                    .push(format!("sku={}: invalid {} {:?}", sku, column, raw));
                continue 'rows;
            }
            populated = true;
        }

        if populated {
            out.rows.push(item);
        }
    }

    out
}
