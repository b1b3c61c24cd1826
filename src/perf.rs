// ==========================================
// 商品批量导入引擎 - SQL 性能统计
// ==========================================
// 计数口径: 线程内计数，PerfGuard 必须与 SQL 执行在同一线程
// （写入任务在 spawn_blocking 线程内创建自己的 Guard）
// 开关: CATALOG_IMPORT_PERF_SQL / CATALOG_IMPORT_SLOW_SQL_MS，进程内只读一次
// ==========================================

use rusqlite::Connection;
use std::cell::Cell;
use std::sync::OnceLock;
use std::time::{Duration, Instant};

pub const PERF_SQL_ENV: &str = "CATALOG_IMPORT_PERF_SQL";
pub const SLOW_SQL_MS_ENV: &str = "CATALOG_IMPORT_SLOW_SQL_MS";

const SLOW_SQL_LOG_CHARS: usize = 420;

// ==========================================
// SqlTraceSettings - 追踪开关
// ==========================================
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SqlTraceSettings {
    pub enabled: bool,
    /// None: 不记录慢 SQL
    pub slow_threshold: Option<Duration>,
}

impl SqlTraceSettings {
    /// Debug 默认开启（阈值 50ms），Release 默认关闭（开启后阈值 200ms）
    pub fn from_env() -> Self {
        Self::from_values(
            std::env::var(PERF_SQL_ENV).ok().as_deref(),
            std::env::var(SLOW_SQL_MS_ENV).ok().as_deref(),
        )
    }

    fn from_values(perf_sql: Option<&str>, slow_ms: Option<&str>) -> Self {
        let enabled = perf_sql.map(is_true).unwrap_or(cfg!(debug_assertions));
        let default_ms = if cfg!(debug_assertions) { 50 } else { 200 };
        let slow_ms = slow_ms
            .and_then(|v| v.trim().parse::<u64>().ok())
            .unwrap_or(default_ms);
        Self {
            enabled,
            slow_threshold: (slow_ms > 0).then(|| Duration::from_millis(slow_ms)),
        }
    }
}

static SETTINGS: OnceLock<SqlTraceSettings> = OnceLock::new();

pub fn settings() -> SqlTraceSettings {
    *SETTINGS.get_or_init(SqlTraceSettings::from_env)
}

fn is_true(v: &str) -> bool {
    matches!(
        v.trim().to_lowercase().as_str(),
        "1" | "true" | "yes" | "y" | "on"
    )
}

// 批量 upsert 语句动辄上万字符，日志里只留开头
fn truncate_sql(sql: &str, max_chars: usize) -> String {
    let s = sql.trim().replace('\n', " ");
    match s.char_indices().nth(max_chars) {
        Some((idx, _)) => format!("{}…", &s[..idx]),
        None => s,
    }
}

// ==========================================
// 线程内计数
// ==========================================
#[derive(Debug, Clone, Copy, Default)]
struct ThreadCounters {
    active_guards: u32,
    statements: u64,
    slow_statements: u64,
}

thread_local! {
    static COUNTERS: Cell<ThreadCounters> = const {
        Cell::new(ThreadCounters {
            active_guards: 0,
            statements: 0,
            slow_statements: 0,
        })
    };
}

fn counters() -> ThreadCounters {
    COUNTERS.with(|c| c.get())
}

fn update_counters(f: impl FnOnce(&mut ThreadCounters)) {
    COUNTERS.with(|c| {
        let mut v = c.get();
        f(&mut v);
        c.set(v);
    });
}

/// 安装 SQLite 语句 trace/profile（SQL 计数 + 慢查询日志）
pub fn install_sqlite_tracing(conn: &mut Connection) {
    if !settings().enabled {
        conn.trace(None);
        conn.profile(None);
        return;
    }
    conn.trace(Some(on_statement));
    conn.profile(Some(on_statement_finished));
}

fn on_statement(_sql: &str) {
    update_counters(|c| {
        if c.active_guards > 0 {
            c.statements = c.statements.saturating_add(1);
        }
    });
}

fn on_statement_finished(sql: &str, duration: Duration) {
    let Some(threshold) = settings().slow_threshold else {
        return;
    };
    if duration < threshold {
        return;
    }
    tracing::warn!(
        target: "slow_sql",
        duration_ms = duration.as_millis() as u64,
        sql = %truncate_sql(sql, SLOW_SQL_LOG_CHARS),
        "slow sql"
    );
    update_counters(|c| {
        if c.active_guards > 0 {
            c.slow_statements = c.slow_statements.saturating_add(1);
        }
    });
}

/// 单个仓储操作的耗时 + SQL 语句数 + 慢 SQL 数（drop 时输出，target = perf）
///
/// ```ignore
/// let _perf = catalog_import::perf::PerfGuard::new("flush_varchar");
/// ```
pub struct PerfGuard {
    op: &'static str,
    start: Instant,
    base: ThreadCounters,
}

impl PerfGuard {
    pub fn new(op: &'static str) -> Self {
        update_counters(|c| c.active_guards = c.active_guards.saturating_add(1));
        Self {
            op,
            start: Instant::now(),
            base: counters(),
        }
    }

    /// 当前 Guard 范围内已执行的 SQL 语句数
    pub fn sql_count(&self) -> u64 {
        counters().statements.saturating_sub(self.base.statements)
    }

    fn slow_sql_count(&self) -> u64 {
        counters()
            .slow_statements
            .saturating_sub(self.base.slow_statements)
    }
}

impl Drop for PerfGuard {
    fn drop(&mut self) {
        tracing::info!(
            target: "perf",
            op = self.op,
            elapsed_ms = self.start.elapsed().as_millis() as u64,
            sql_count = self.sql_count(),
            slow_sql_count = self.slow_sql_count(),
            "done"
        );
        update_counters(|c| c.active_guards = c.active_guards.saturating_sub(1));
    }
}
