// ==========================================
// 商品批量导入引擎 - 商品领域模型
// ==========================================
// 职责: 属性元数据 / EAV 值行 / 库存 / 图库 / 价格索引
// 对齐: catalog_product_* 系列表
// ==========================================

use crate::domain::types::BackendType;
use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// 商品实体类型 ID（eav_attribute.entity_type_id）
pub const PRODUCT_ENTITY_TYPE_ID: i64 = 4;

/// 库存 ID（单仓）
pub const DEFAULT_STOCK_ID: u16 = 1;

/// 图库属性 ID（目录中没有 media_gallery 属性时使用）
pub const DEFAULT_GALLERY_ATTRIBUTE_ID: u16 = 87;

/// 价格索引默认客户组 / 网站
pub const DEFAULT_CUSTOMER_GROUP_ID: u16 = 0;
pub const DEFAULT_WEBSITE_ID: u16 = 1;

/// 新建商品默认类型
pub const DEFAULT_TYPE_ID: &str = "simple";

/// datetime 属性的存储格式
pub const DATETIME_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// datetime 属性的降级输入格式（补零点）
pub const DATE_FORMAT: &str = "%Y-%m-%d";

/// SKU → LinkID 映射（所有收集器唯一的 ID 来源）
pub type SkuLinkMap = HashMap<String, u64>;

// ==========================================
// AttributeDefinition - 属性定义
// ==========================================
// 用途: 单次导入内只读
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AttributeDefinition {
    pub attribute_id: u16,
    pub code: String,
    pub backend_type: BackendType,
}

// ==========================================
// AttributeCatalog - 属性目录（按 code 索引）
// ==========================================
#[derive(Debug, Clone, Default)]
pub struct AttributeCatalog {
    by_code: HashMap<String, AttributeDefinition>,
}

impl AttributeCatalog {
    pub fn new(definitions: Vec<AttributeDefinition>) -> Self {
        let by_code = definitions
            .into_iter()
            .map(|def| (def.code.clone(), def))
            .collect();
        Self { by_code }
    }

    pub fn get(&self, code: &str) -> Option<&AttributeDefinition> {
        self.by_code.get(code)
    }

    /// 仅返回走 EAV 的属性（排除 static）
    pub fn eav_attribute(&self, code: &str) -> Option<&AttributeDefinition> {
        self.by_code
            .get(code)
            .filter(|def| def.backend_type != BackendType::Static)
    }

    pub fn len(&self) -> usize {
        self.by_code.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_code.is_empty()
    }

    /// 图库属性 ID：优先取目录中的 media_gallery，否则用默认常量
    pub fn gallery_attribute_id(&self) -> u16 {
        self.by_code
            .get("media_gallery")
            .map(|def| def.attribute_id)
            .unwrap_or(DEFAULT_GALLERY_ATTRIBUTE_ID)
    }
}

// ==========================================
// EavValue - 按后端类型区分的属性值
// ==========================================
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "value", rename_all = "lowercase")]
pub enum EavValue {
    Varchar(String),
    Int(i64),
    Decimal(f64),
    Text(String),
    Datetime(NaiveDateTime),
}

impl EavValue {
    pub fn backend_type(&self) -> BackendType {
        match self {
            EavValue::Varchar(_) => BackendType::Varchar,
            EavValue::Int(_) => BackendType::Int,
            EavValue::Decimal(_) => BackendType::Decimal,
            EavValue::Text(_) => BackendType::Text,
            EavValue::Datetime(_) => BackendType::Datetime,
        }
    }
}

// ==========================================
// EavValueRow - EAV 值行
// ==========================================
// 唯一约束: (link_id, attribute_id, store_id)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EavValueRow {
    pub link_id: u64,
    pub attribute_id: u16,
    pub store_id: u16,
    pub value: EavValue,
}

// ==========================================
// NewProductEntity - 待新建的商品主表行
// ==========================================
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewProductEntity {
    pub sku: String,
    pub type_id: String,
    pub attribute_set_id: u16,
}

// ==========================================
// StockItem - 库存行
// ==========================================
// 唯一约束: (link_id, stock_id)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StockItem {
    pub link_id: u64,
    pub stock_id: u16,
    pub qty: f64,
    pub is_in_stock: u16,
    pub manage_stock: u16,
    pub min_qty: f64,
    pub min_sale_qty: f64,
    pub max_sale_qty: f64,
}

impl StockItem {
    /// 默认值: 有货 / 管理库存 / 单仓
    pub fn with_defaults(link_id: u64) -> Self {
        Self {
            link_id,
            stock_id: DEFAULT_STOCK_ID,
            qty: 0.0,
            is_in_stock: 1,
            manage_stock: 1,
            min_qty: 0.0,
            min_sale_qty: 0.0,
            max_sale_qty: 0.0,
        }
    }
}

// ==========================================
// StockItemInput - JSON 库存导入入参
// ==========================================
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StockItemInput {
    #[serde(default)]
    pub sku: String,
    #[serde(default)]
    pub qty: Option<f64>,
    #[serde(default)]
    pub is_in_stock: Option<u16>,
    #[serde(default)]
    pub manage_stock: Option<u16>,
    #[serde(default)]
    pub min_qty: Option<f64>,
    #[serde(default)]
    pub min_sale_qty: Option<f64>,
    #[serde(default)]
    pub max_sale_qty: Option<f64>,
}

impl StockItemInput {
    /// 合并到默认库存行（未提供的字段保持默认）
    pub fn into_stock_item(self, link_id: u64) -> StockItem {
        let mut item = StockItem::with_defaults(link_id);
        if let Some(v) = self.qty {
            item.qty = v;
        }
        if let Some(v) = self.is_in_stock {
            item.is_in_stock = v;
        }
        if let Some(v) = self.manage_stock {
            item.manage_stock = v;
        }
        if let Some(v) = self.min_qty {
            item.min_qty = v;
        }
        if let Some(v) = self.min_sale_qty {
            item.min_sale_qty = v;
        }
        if let Some(v) = self.max_sale_qty {
            item.max_sale_qty = v;
        }
        item
    }
}

// ==========================================
// MediaGalleryEntry - 图库条目
// ==========================================
// 去重键: (sku, value)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MediaGalleryEntry {
    pub link_id: u64,
    pub sku: String,
    pub attribute_id: u16,
    pub value: String,
    pub media_type: String,
    pub disabled: bool,
}

// ==========================================
// PriceIndexRow - 价格索引行
// ==========================================
// 唯一约束: (link_id, customer_group_id, website_id)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PriceIndexRow {
    pub link_id: u64,
    pub customer_group_id: u16,
    pub website_id: u16,
    pub price: f64,
    pub final_price: f64,
    pub min_price: f64,
    pub max_price: f64,
    pub tier_price: f64,
}

impl PriceIndexRow {
    pub fn with_defaults(link_id: u64) -> Self {
        Self {
            link_id,
            customer_group_id: DEFAULT_CUSTOMER_GROUP_ID,
            website_id: DEFAULT_WEBSITE_ID,
            price: 0.0,
            final_price: 0.0,
            min_price: 0.0,
            max_price: 0.0,
            tier_price: 0.0,
        }
    }
}
