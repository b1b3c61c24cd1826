// ==========================================
// 商品批量导入引擎 - 导入配置读取 Trait
// ==========================================
// 职责: 定义导入模块所需的配置读取接口（不包含实现）
// 红线: 不包含配置写入、不包含业务逻辑
// ==========================================

use crate::config::import_options::ImportOptions;
use async_trait::async_trait;
use std::error::Error;

pub type ConfigResult<T> = Result<T, Box<dyn Error + Send + Sync>>;

// ==========================================
// ImportConfigReader Trait
// ==========================================
// 用途: 导入模块所需的配置读取接口
// 实现者: ConfigManager（从 config_kv 表读取）
#[async_trait]
pub trait ImportConfigReader: Send + Sync {
    /// 获取属性值的 store 作用域
    ///
    /// # 默认值
    /// - 0
    async fn get_store_id(&self) -> ConfigResult<u16>;

    /// 获取批量操作分块大小
    ///
    /// # 默认值
    /// - 500（配置值 ≤ 0 时同样回落为 500）
    async fn get_batch_size(&self) -> ConfigResult<i64>;

    /// 获取新建商品的默认属性集
    ///
    /// # 默认值
    /// - 4
    async fn get_attribute_set(&self) -> ConfigResult<u16>;

    /// 是否使用生成语句写入
    ///
    /// # 默认值
    /// - false（驱动原生批量）
    async fn get_raw_sql_mode(&self) -> ConfigResult<bool>;

    /// 汇总为归一化后的导入选项
    async fn load_import_options(&self) -> ConfigResult<ImportOptions> {
        Ok(ImportOptions {
            store_id: self.get_store_id().await?,
            batch_size: self.get_batch_size().await?,
            attribute_set: self.get_attribute_set().await?,
            raw_sql_mode: self.get_raw_sql_mode().await?,
        }
        .normalized())
    }
}
