// ==========================================
// 商品批量导入引擎 - 导入模块错误类型
// ==========================================
// 工具: thiserror 派生宏
// 口径: 这里只放致命错误；行级问题走告警列表
// ==========================================

use crate::repository::error::RepositoryError;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use thiserror::Error;

/// 单个写入目标的失败记录
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FlushFailure {
    pub target: String,
    pub message: String,
}

impl fmt::Display for FlushFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.target, self.message)
    }
}

fn join_failures(failures: &[FlushFailure]) -> String {
    failures
        .iter()
        .map(|f| f.to_string())
        .collect::<Vec<_>>()
        .join("; ")
}

fn join_cancelled(cancelled: &[String]) -> String {
    if cancelled.is_empty() {
        String::new()
    } else {
        format!("；已取消: {}", cancelled.join(", "))
    }
}

/// 导入模块错误类型
#[derive(Error, Debug)]
pub enum ImportError {
    // ===== 文件相关错误 =====
    #[error("文件不存在: {0}")]
    FileNotFound(String),

    #[error("文件格式不支持: {0}（仅支持 .csv）")]
    UnsupportedFormat(String),

    #[error("文件读取失败: {0}")]
    FileReadError(String),

    #[error("CSV 解析失败: {0}")]
    CsvParseError(String),

    #[error("JSON 解析失败: {0}")]
    JsonParseError(String),

    // ===== 表头错误 =====
    #[error("CSV 缺少必需的 'sku' 列")]
    MissingSkuColumn,

    // ===== 元数据 / 关联方案 =====
    #[error("属性元数据加载失败: {0}")]
    AttributeMetadataLoad(String),

    #[error("无法识别 EAV 关联方案: {0}")]
    LinkageUndetected(String),

    // ===== 实体解析 =====
    #[error("SKU 批量查询失败: {0}")]
    SkuLookupError(String),

    #[error("商品实体创建失败: {0}")]
    EntityCreationError(String),

    // ===== 批量写入 =====
    /// failures: 自身出错的目标；cancelled: 因其他目标失败而中止的目标；
    /// committed: 每个目标实际已提交的行数（含失败/取消目标在中止前提交的分块）
    #[error(
        "批量写入失败 ({} 个目标): {}{}",
        failures.len(),
        join_failures(failures),
        join_cancelled(cancelled)
    )]
    FlushFailed {
        failures: Vec<FlushFailure>,
        cancelled: Vec<String>,
        committed: BTreeMap<String, usize>,
    },

    // ===== 入参错误 =====
    #[error("无效输入: {0}")]
    InvalidInput(String),

    // ===== 通用错误 =====
    #[error(transparent)]
    Repository(#[from] RepositoryError),

    #[error("内部错误: {0}")]
    InternalError(String),
}

// 实现 From<std::io::Error>
impl From<std::io::Error> for ImportError {
    fn from(err: std::io::Error) -> Self {
        ImportError::FileReadError(err.to_string())
    }
}

// 实现 From<csv::Error>
impl From<csv::Error> for ImportError {
    fn from(err: csv::Error) -> Self {
        ImportError::CsvParseError(err.to_string())
    }
}

// 实现 From<serde_json::Error>
impl From<serde_json::Error> for ImportError {
    fn from(err: serde_json::Error) -> Self {
        ImportError::JsonParseError(err.to_string())
    }
}
