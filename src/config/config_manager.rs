// ==========================================
// 商品批量导入引擎 - 配置管理器
// ==========================================
// 职责: 导入默认参数的加载与写入
// 存储: config_kv 表 (scope_id + key + value)
// 口径: 表或键缺失时回落到内置默认值
// ==========================================

use crate::config::import_config_trait::{ConfigResult, ImportConfigReader};
use crate::config::import_options::{DEFAULT_ATTRIBUTE_SET, DEFAULT_BATCH_SIZE, DEFAULT_STORE_ID};
use crate::db::open_sqlite_connection;
use async_trait::async_trait;
use rusqlite::{params, Connection, OptionalExtension};
use std::sync::{Arc, Mutex};

pub struct ConfigManager {
    conn: Arc<Mutex<Connection>>,
}

impl ConfigManager {
    /// 打开目标库读取导入默认值
    pub fn new(db_path: &str) -> ConfigResult<Self> {
        let conn = open_sqlite_connection(db_path)?;

        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    /// 复用已有连接（重新应用 PRAGMA，幂等）
    pub fn from_connection(conn: Arc<Mutex<Connection>>) -> ConfigResult<Self> {
        {
            let conn_guard = conn.lock().map_err(|e| format!("锁获取失败: {}", e))?;
            crate::db::configure_sqlite_connection(&conn_guard)?;
        }

        Ok(Self { conn })
    }

    /// global 作用域取值；config_kv 表不存在按未配置处理
    fn get_config_value(&self, key: &str) -> ConfigResult<Option<String>> {
        let conn = self.conn.lock().map_err(|e| format!("锁获取失败: {}", e))?;

        let has_table = conn
            .query_row(
                "SELECT 1 FROM sqlite_master WHERE type='table' AND name='config_kv' LIMIT 1",
                [],
                |_row| Ok(true),
            )
            .optional()?
            .unwrap_or(false);
        if !has_table {
            return Ok(None);
        }

        let value = conn
            .query_row(
                "SELECT value FROM config_kv WHERE scope_id = 'global' AND key = ?1",
                params![key],
                |row| row.get::<_, String>(0),
            )
            .optional()?;
        Ok(value)
    }

    fn get_config_or_default(&self, key: &str, default: &str) -> ConfigResult<String> {
        Ok(self
            .get_config_value(key)?
            .unwrap_or_else(|| default.to_string()))
    }

    /// 写入 global scope 的配置值（UPSERT）
    pub fn set_global_config_value(&self, key: &str, value: &str) -> ConfigResult<()> {
        let conn = self.conn.lock().map_err(|e| format!("锁获取失败: {}", e))?;
        conn.execute(
            "INSERT INTO config_kv (scope_id, key, value) VALUES ('global', ?1, ?2)
             ON CONFLICT(scope_id, key) DO UPDATE SET value = excluded.value",
            params![key, value],
        )?;
        Ok(())
    }
}

fn parse_or_warn<T: std::str::FromStr>(key: &str, raw: &str, default: T) -> T {
    raw.trim().parse::<T>().unwrap_or_else(|_| {
        tracing::warn!(config_key = key, raw_value = %raw, "配置值格式错误，使用默认值");
        default
    })
}

// ==========================================
// ImportConfigReader Trait 实现
// ==========================================
#[async_trait]
impl ImportConfigReader for ConfigManager {
    async fn get_store_id(&self) -> ConfigResult<u16> {
        let value =
            self.get_config_or_default(config_keys::STORE_ID, &DEFAULT_STORE_ID.to_string())?;
        Ok(parse_or_warn(config_keys::STORE_ID, &value, DEFAULT_STORE_ID))
    }

    async fn get_batch_size(&self) -> ConfigResult<i64> {
        let value =
            self.get_config_or_default(config_keys::BATCH_SIZE, &DEFAULT_BATCH_SIZE.to_string())?;
        let size = parse_or_warn(config_keys::BATCH_SIZE, &value, DEFAULT_BATCH_SIZE);
        Ok(if size <= 0 { DEFAULT_BATCH_SIZE } else { size })
    }

    async fn get_attribute_set(&self) -> ConfigResult<u16> {
        let value = self.get_config_or_default(
            config_keys::ATTRIBUTE_SET,
            &DEFAULT_ATTRIBUTE_SET.to_string(),
        )?;
        let set = parse_or_warn(config_keys::ATTRIBUTE_SET, &value, DEFAULT_ATTRIBUTE_SET);
        Ok(if set == 0 { DEFAULT_ATTRIBUTE_SET } else { set })
    }

    async fn get_raw_sql_mode(&self) -> ConfigResult<bool> {
        let value = self.get_config_or_default(config_keys::RAW_SQL_MODE, "false")?;
        Ok(matches!(
            value.trim().to_lowercase().as_str(),
            "1" | "true" | "yes" | "on"
        ))
    }
}

// ==========================================
// 配置键常量
// ==========================================
pub mod config_keys {
    pub const STORE_ID: &str = "import.store_id";
    pub const BATCH_SIZE: &str = "import.batch_size";
    pub const ATTRIBUTE_SET: &str = "import.attribute_set";
    pub const RAW_SQL_MODE: &str = "import.raw_sql_mode";
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::import_options::ImportOptions;

    fn manager_with_table() -> ConfigManager {
        let conn = Connection::open_in_memory().unwrap();
        conn.execute_batch(
            "CREATE TABLE config_kv (
                scope_id TEXT NOT NULL,
                key TEXT NOT NULL,
                value TEXT NOT NULL,
                PRIMARY KEY (scope_id, key)
            );",
        )
        .unwrap();
        ConfigManager::from_connection(Arc::new(Mutex::new(conn))).unwrap()
    }

    #[tokio::test]
    async fn test_defaults_without_config_table() {
        let conn = Connection::open_in_memory().unwrap();
        let manager = ConfigManager::from_connection(Arc::new(Mutex::new(conn))).unwrap();
        let opts = manager.load_import_options().await.unwrap();
        assert_eq!(opts, ImportOptions::default());
    }

    #[tokio::test]
    async fn test_stored_values_are_normalized() {
        let manager = manager_with_table();
        manager.set_global_config_value(config_keys::BATCH_SIZE, "0").unwrap();
        manager.set_global_config_value(config_keys::STORE_ID, "2").unwrap();
        manager.set_global_config_value(config_keys::RAW_SQL_MODE, "true").unwrap();
        manager.set_global_config_value(config_keys::ATTRIBUTE_SET, "abc").unwrap();

        let opts = manager.load_import_options().await.unwrap();
        assert_eq!(opts.batch_size, DEFAULT_BATCH_SIZE);
        assert_eq!(opts.store_id, 2);
        assert!(opts.raw_sql_mode);
        assert_eq!(opts.attribute_set, DEFAULT_ATTRIBUTE_SET);
    }
}
