// ==========================================
// 商品批量导入引擎 - 配置层
// ==========================================
// 职责: 导入参数默认值 + 调用方覆写
// 存储: config_kv 表
// ==========================================

pub mod config_manager;
pub mod import_config_trait;
pub mod import_options;

pub use config_manager::{config_keys, ConfigManager};
pub use import_config_trait::{ConfigResult, ImportConfigReader};
pub use import_options::{ImportOptions, ImportOverrides};
