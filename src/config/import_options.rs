// ==========================================
// 商品批量导入引擎 - 导入选项
// ==========================================
// 职责: 单次导入的可调参数 + 默认值归一
// 默认: store_id=0 / batch_size=500 / attribute_set=4 / raw_sql_mode=false
// ==========================================

use crate::domain::types::WriteStrategy;
use serde::{Deserialize, Serialize};

pub const DEFAULT_STORE_ID: u16 = 0;
pub const DEFAULT_BATCH_SIZE: i64 = 500;
pub const DEFAULT_ATTRIBUTE_SET: u16 = 4;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ImportOptions {
    /// 属性值的 store 作用域
    pub store_id: u16,
    /// 所有批量操作的分块大小（≤0 时强制为默认值）
    pub batch_size: i64,
    /// 新建商品的默认属性集（0 时强制为默认值）
    pub attribute_set: u16,
    /// true: 生成语句批量 upsert；false: 驱动原生批量
    pub raw_sql_mode: bool,
}

impl Default for ImportOptions {
    fn default() -> Self {
        Self {
            store_id: DEFAULT_STORE_ID,
            batch_size: DEFAULT_BATCH_SIZE,
            attribute_set: DEFAULT_ATTRIBUTE_SET,
            raw_sql_mode: false,
        }
    }
}

impl ImportOptions {
    /// 归一化: 非法的 batch_size / attribute_set 回落到默认值
    pub fn normalized(mut self) -> Self {
        if self.batch_size <= 0 {
            self.batch_size = DEFAULT_BATCH_SIZE;
        }
        if self.attribute_set == 0 {
            self.attribute_set = DEFAULT_ATTRIBUTE_SET;
        }
        self
    }

    /// 归一化后的分块大小
    pub fn chunk_size(&self) -> usize {
        if self.batch_size <= 0 {
            DEFAULT_BATCH_SIZE as usize
        } else {
            self.batch_size as usize
        }
    }

    pub fn write_strategy(&self) -> WriteStrategy {
        WriteStrategy::from_raw_sql_mode(self.raw_sql_mode)
    }
}

// ==========================================
// ImportOverrides - 调用方显式覆写（CLI 参数 / API 入参）
// ==========================================
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImportOverrides {
    pub store_id: Option<u16>,
    pub batch_size: Option<i64>,
    pub attribute_set: Option<u16>,
    pub raw_sql_mode: Option<bool>,
}

impl ImportOverrides {
    /// 覆写到基础选项上，返回归一化后的结果
    pub fn apply(&self, base: ImportOptions) -> ImportOptions {
        ImportOptions {
            store_id: self.store_id.unwrap_or(base.store_id),
            batch_size: self.batch_size.unwrap_or(base.batch_size),
            attribute_set: self.attribute_set.unwrap_or(base.attribute_set),
            raw_sql_mode: self.raw_sql_mode.unwrap_or(base.raw_sql_mode),
        }
        .normalized()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalized_forces_defaults() {
        let opts = ImportOptions {
            store_id: 2,
            batch_size: -1,
            attribute_set: 0,
            raw_sql_mode: true,
        }
        .normalized();
        assert_eq!(opts.store_id, 2);
        assert_eq!(opts.batch_size, DEFAULT_BATCH_SIZE);
        assert_eq!(opts.attribute_set, DEFAULT_ATTRIBUTE_SET);
        assert_eq!(opts.write_strategy(), WriteStrategy::GeneratedStatement);
    }

    #[test]
    fn test_overrides_win_over_base() {
        let base = ImportOptions {
            batch_size: 100,
            ..Default::default()
        };
        let merged = ImportOverrides {
            batch_size: Some(0),
            store_id: Some(3),
            ..Default::default()
        }
        .apply(base);
        assert_eq!(merged.batch_size, DEFAULT_BATCH_SIZE);
        assert_eq!(merged.store_id, 3);
        assert!(!merged.raw_sql_mode);
    }

    #[test]
    fn test_partial_json_uses_defaults() {
        let opts: ImportOptions = serde_json::from_str(r#"{"raw_sql_mode": true}"#).unwrap();
        assert_eq!(opts.batch_size, DEFAULT_BATCH_SIZE);
        assert!(opts.raw_sql_mode);
    }
}
