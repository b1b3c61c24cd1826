// ==========================================
// 商品批量导入引擎 - 列分类器
// ==========================================
// 输入: CSV 表头 + 属性目录
// 输出: 标识列 / 属性列 / 附属表（库存/图库/价格）保留列的位置
// 口径: 无法识别的列只告警，不中断
// ==========================================

use crate::domain::product::{AttributeCatalog, AttributeDefinition};
use crate::importer::error::ImportError;
use std::collections::HashSet;

pub const SKU_COLUMN: &str = "sku";
pub const TYPE_ID_COLUMN: &str = "type_id";
pub const ATTRIBUTE_SET_COLUMN: &str = "attribute_set_id";

pub const IDENTITY_COLUMNS: [&str; 3] = [SKU_COLUMN, TYPE_ID_COLUMN, ATTRIBUTE_SET_COLUMN];

pub const STOCK_COLUMNS: [&str; 6] = [
    "qty",
    "is_in_stock",
    "manage_stock",
    "min_qty",
    "min_sale_qty",
    "max_sale_qty",
];

pub const GALLERY_COLUMNS: [&str; 4] = ["image", "small_image", "thumbnail", "media_gallery"];

// 顺序有意义: price_index 先写 price/final/min/max，后面的列再覆盖
pub const PRICE_COLUMNS: [&str; 5] = [
    "price_index",
    "final_price",
    "min_price",
    "max_price",
    "tier_price",
];

/// 属性列
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClassifiedColumn {
    pub index: usize,
    pub attribute: AttributeDefinition,
}

/// 某个附属表在表头中出现的保留列（按保留列声明顺序）
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SatelliteColumns {
    columns: Vec<(&'static str, usize)>,
}

impl SatelliteColumns {
    fn collect(reserved: &[&'static str], first_index: impl Fn(&str) -> Option<usize>) -> Self {
        let columns = reserved
            .iter()
            .filter_map(|name| first_index(name).map(|idx| (*name, idx)))
            .collect();
        Self { columns }
    }

    pub fn get(&self, name: &str) -> Option<usize> {
        self.columns
            .iter()
            .find(|(n, _)| *n == name)
            .map(|(_, idx)| *idx)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&'static str, usize)> + '_ {
        self.columns.iter().copied()
    }

    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }

    pub fn len(&self) -> usize {
        self.columns.len()
    }
}

// ==========================================
// ColumnLayout - 分类结果
// ==========================================
#[derive(Debug, Clone, Default)]
pub struct ColumnLayout {
    pub sku: usize,
    pub type_id: Option<usize>,
    pub attribute_set_id: Option<usize>,
    pub attributes: Vec<ClassifiedColumn>,
    pub stock: SatelliteColumns,
    pub gallery: SatelliteColumns,
    pub price: SatelliteColumns,
}

/// 仅检查 sku 列（在加载元数据之前调用，缺失时不触库）
pub fn require_sku_column(headers: &[String]) -> Result<usize, ImportError> {
    headers
        .iter()
        .position(|h| h == SKU_COLUMN)
        .ok_or(ImportError::MissingSkuColumn)
}

/// 分类表头
///
/// # 返回
/// - (ColumnLayout, 告警列表)
/// - Err(MissingSkuColumn): 表头中没有 sku
pub fn classify(
    headers: &[String],
    catalog: &AttributeCatalog,
) -> Result<(ColumnLayout, Vec<String>), ImportError> {
    let sku = require_sku_column(headers)?;
    let mut warnings = Vec::new();

    // 重复列名: 第一次出现生效
    let mut seen: HashSet<&str> = HashSet::new();
    let mut first_occurrence: Vec<(usize, &str)> = Vec::with_capacity(headers.len());
    for (index, header) in headers.iter().enumerate() {
        if seen.insert(header.as_str()) {
            first_occurrence.push((index, header.as_str()));
        } else {
            warnings.push(format!(
                "column {:?}: duplicate, using first occurrence",
                header
            ));
        }
    }

    let first_index = |name: &str| {
        first_occurrence
            .iter()
            .find(|(_, h)| *h == name)
            .map(|(idx, _)| *idx)
    };

    let mut layout = ColumnLayout {
        sku,
        type_id: first_index(TYPE_ID_COLUMN),
        attribute_set_id: first_index(ATTRIBUTE_SET_COLUMN),
        stock: SatelliteColumns::collect(&STOCK_COLUMNS, first_index),
        gallery: SatelliteColumns::collect(&GALLERY_COLUMNS, first_index),
        price: SatelliteColumns::collect(&PRICE_COLUMNS, first_index),
        ..Default::default()
    };

    for (index, header) in &first_occurrence {
        let mut recognised = IDENTITY_COLUMNS.contains(header)
            || STOCK_COLUMNS.contains(header)
            || GALLERY_COLUMNS.contains(header)
            || PRICE_COLUMNS.contains(header);

        // 保留列同时是非 static 属性时，两边都要
        if let Some(def) = catalog.eav_attribute(header) {
            if !IDENTITY_COLUMNS.contains(header) {
                layout.attributes.push(ClassifiedColumn {
                    index: *index,
                    attribute: def.clone(),
                });
                recognised = true;
            }
        }

        if !recognised {
            warnings.push(format!("column {:?}: unknown, skipping", header));
        }
    }

    Ok((layout, warnings))
}
