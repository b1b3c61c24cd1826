// ==========================================
// 商品批量导入引擎 - SQLite 连接初始化
// ==========================================
// 目标:
// - 统一所有 Connection::open 的 PRAGMA 行为（外键 / busy_timeout / WAL）
// - 写入任务各自开连接，并发写依赖 busy_timeout + WAL 排队
// - 提供列级内省，供关联方案探测使用
// ==========================================

use crate::perf;
use rusqlite::Connection;
use std::time::Duration;

/// 默认 busy_timeout（毫秒）
pub const DEFAULT_BUSY_TIMEOUT_MS: u64 = 5_000;

/// 配置 SQLite 连接的统一 PRAGMA
///
/// 说明：
/// - foreign_keys / busy_timeout 需要"每个连接"单独配置
/// - journal_mode 是库级设置，内存库会返回 "memory"，不视为错误
pub fn configure_sqlite_connection(conn: &Connection) -> rusqlite::Result<()> {
    conn.execute_batch("PRAGMA foreign_keys = ON;")?;
    conn.busy_timeout(Duration::from_millis(DEFAULT_BUSY_TIMEOUT_MS))?;
    let mode: String = conn.pragma_update_and_check(None, "journal_mode", "WAL", |row| row.get(0))?;
    if !mode.eq_ignore_ascii_case("wal") {
        tracing::debug!(journal_mode = %mode, "WAL 未启用，沿用当前日志模式");
    }
    Ok(())
}

/// 打开 SQLite 连接并应用统一配置（含 SQL 计数/慢查询 trace）
pub fn open_sqlite_connection(db_path: &str) -> rusqlite::Result<Connection> {
    let mut conn = Connection::open(db_path)?;
    configure_sqlite_connection(&conn)?;
    perf::install_sqlite_tracing(&mut conn);
    Ok(conn)
}

/// 读取表的物理列名（表不存在时返回空列表）
pub fn table_columns(conn: &Connection, table: &str) -> rusqlite::Result<Vec<String>> {
    let sql = format!("PRAGMA table_info(\"{}\")", table.replace('"', "\"\""));
    let mut stmt = conn.prepare(&sql)?;
    let columns = stmt
        .query_map([], |row| row.get::<_, String>(1))?
        .collect::<rusqlite::Result<Vec<_>>>()?;
    Ok(columns)
}
