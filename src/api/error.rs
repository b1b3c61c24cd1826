// ==========================================
// 商品批量导入引擎 - API层错误类型
// ==========================================
// 职责: 把导入层/仓储层错误收敛为调用方可处理的几类
// 约定: code() 为稳定错误码，消息文本可变
// ==========================================

use crate::importer::error::ImportError;
use crate::repository::error::RepositoryError;
use std::collections::BTreeMap;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ApiError {
    // ===== 调用方问题 =====
    #[error("无效输入: {0}")]
    InvalidInput(String),

    #[error("资源未找到: {0}")]
    NotFound(String),

    // ===== 存储 =====
    #[error("存储不可用: {0}")]
    StorageUnavailable(String),

    #[error("存储错误: {0}")]
    Storage(String),

    // ===== 导入 =====
    #[error("导入失败: {0}")]
    ImportFailed(String),

    /// 部分写入目标失败；已提交的行不回滚
    #[error("部分写入失败: {}", failed.join("; "))]
    PartialWrite {
        failed: Vec<String>,
        cancelled: Vec<String>,
        committed: BTreeMap<String, usize>,
    },

    #[error("内部错误: {0}")]
    Internal(String),
}

impl ApiError {
    pub fn code(&self) -> &'static str {
        match self {
            ApiError::InvalidInput(_) => "INVALID_INPUT",
            ApiError::NotFound(_) => "NOT_FOUND",
            ApiError::StorageUnavailable(_) => "STORAGE_UNAVAILABLE",
            ApiError::Storage(_) => "STORAGE_ERROR",
            ApiError::ImportFailed(_) => "IMPORT_FAILED",
            ApiError::PartialWrite { .. } => "PARTIAL_WRITE",
            ApiError::Internal(_) => "INTERNAL",
        }
    }
}

impl From<RepositoryError> for ApiError {
    fn from(err: RepositoryError) -> Self {
        // 中途失败按根因归类，消息保留已提交行数
        let message = err.to_string();
        match err.into_root_cause() {
            RepositoryError::NotFound { entity, key } => {
                ApiError::NotFound(format!("{}({})", entity, key))
            }
            RepositoryError::ConnectionFailed(_)
            | RepositoryError::LockPoisoned(_)
            | RepositoryError::Busy(_) => ApiError::StorageUnavailable(message),
            RepositoryError::UnsupportedBackend(_) => ApiError::InvalidInput(message),
            RepositoryError::Cancelled(_) | RepositoryError::TaskJoin(_) => {
                ApiError::Internal(message)
            }
            _ => ApiError::Storage(message),
        }
    }
}

impl From<ImportError> for ApiError {
    fn from(err: ImportError) -> Self {
        match err {
            ImportError::InvalidInput(msg) | ImportError::JsonParseError(msg) => {
                ApiError::InvalidInput(msg)
            }
            ImportError::FileNotFound(path) => ApiError::NotFound(format!("文件 {}", path)),
            ImportError::FlushFailed {
                failures,
                cancelled,
                committed,
            } => ApiError::PartialWrite {
                failed: failures.iter().map(|f| f.to_string()).collect(),
                cancelled,
                committed,
            },
            ImportError::Repository(repo_err) => ApiError::from(repo_err),
            other => ApiError::ImportFailed(other.to_string()),
        }
    }
}

/// Result 类型别名
pub type ApiResult<T> = Result<T, ApiError>;
