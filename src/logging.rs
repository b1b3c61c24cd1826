// ==========================================
// 商品批量导入引擎 - 日志初始化
// ==========================================
// 输出: stderr（stdout 留给 CLI 报告）
// 过滤: RUST_LOG，缺省 info
// 专用 target: perf（仓储操作耗时） / slow_sql（慢查询）
// ==========================================

use tracing_subscriber::{fmt, EnvFilter};

const DEFAULT_FILTER: &str = "info";

/// 日志格式
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LogFormat {
    #[default]
    Pretty,
    /// 每行一个 JSON 对象，带当前 span（run_id）
    Json,
}

fn env_filter() -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER))
}

/// 按格式初始化；重复初始化时静默忽略
///
/// # 示例
/// ```no_run
/// use catalog_import::logging::{self, LogFormat};
/// logging::init_with(LogFormat::Json);
/// ```
pub fn init_with(format: LogFormat) {
    let builder = fmt()
        .with_env_filter(env_filter())
        .with_target(true)
        .with_writer(std::io::stderr);

    let result = match format {
        LogFormat::Pretty => builder.with_line_number(true).try_init(),
        LogFormat::Json => builder.json().with_current_span(true).try_init(),
    };
    if let Err(e) = result {
        eprintln!("日志系统已初始化，忽略: {}", e);
    }
}

/// 可读格式（例: RUST_LOG=catalog_import=debug,perf=off）
pub fn init() {
    init_with(LogFormat::Pretty);
}

pub fn init_json() {
    init_with(LogFormat::Json);
}

/// 测试用: debug 级别 + 测试输出捕获
pub fn init_test() {
    let _ = fmt()
        .with_env_filter(EnvFilter::new("debug"))
        .with_test_writer()
        .try_init();
}
