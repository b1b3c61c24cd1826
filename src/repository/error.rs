// ==========================================
// 商品批量导入引擎 - 仓储层错误类型
// ==========================================
// 工具: thiserror 派生宏
// 分类: 按 SQLite 扩展错误码区分 busy / 唯一约束 / 外键
// ==========================================

use crate::domain::types::BackendType;
use rusqlite::ffi;
use rusqlite::ErrorCode;
use thiserror::Error;

/// 仓储层错误类型
#[derive(Error, Debug)]
pub enum RepositoryError {
    // ===== 连接 =====
    #[error("数据库连接失败: {0}")]
    ConnectionFailed(String),

    #[error("共享连接锁获取失败: {0}")]
    LockPoisoned(String),

    // ===== SQL 执行 =====
    #[error("数据库繁忙，busy_timeout 内未获得写锁: {0}")]
    Busy(String),

    #[error("唯一约束冲突: {0}")]
    UniqueViolation(String),

    #[error("外键约束冲突: {0}")]
    ForeignKeyViolation(String),

    #[error("SQL 执行失败: {0}")]
    Sql(String),

    // ===== 写入任务 =====
    #[error("写入任务已取消: {0}")]
    Cancelled(String),

    #[error("写入任务异常退出: {0}")]
    TaskJoin(String),

    /// 分块写入中途失败，written 为失败前已提交的行数
    #[error("{source}（失败前已提交 {written} 行）")]
    Interrupted {
        written: usize,
        #[source]
        source: Box<RepositoryError>,
    },

    // ===== 数据 =====
    #[error("{entity} 不存在: {key}")]
    NotFound { entity: String, key: String },

    #[error("{0} 属性没有 EAV 副表")]
    UnsupportedBackend(BackendType),

    #[error("写入结果不一致: {0}")]
    Inconsistent(String),
}

impl RepositoryError {
    /// 附加失败前已提交的行数（0 行时原样返回）
    pub fn after_committed(self, written: usize) -> Self {
        if written == 0 {
            return self;
        }
        match self {
            RepositoryError::Interrupted {
                written: inner,
                source,
            } => RepositoryError::Interrupted {
                written: inner + written,
                source,
            },
            other => RepositoryError::Interrupted {
                written,
                source: Box::new(other),
            },
        }
    }

    /// 失败前已提交的行数
    pub fn committed_rows(&self) -> usize {
        match self {
            RepositoryError::Interrupted { written, .. } => *written,
            _ => 0,
        }
    }

    pub fn root_cause(&self) -> &RepositoryError {
        match self {
            RepositoryError::Interrupted { source, .. } => source.root_cause(),
            other => other,
        }
    }

    pub fn into_root_cause(self) -> RepositoryError {
        match self {
            RepositoryError::Interrupted { source, .. } => source.into_root_cause(),
            other => other,
        }
    }

    pub fn is_cancelled(&self) -> bool {
        matches!(self.root_cause(), RepositoryError::Cancelled(_))
    }
}

impl From<rusqlite::Error> for RepositoryError {
    fn from(err: rusqlite::Error) -> Self {
        match err {
            rusqlite::Error::SqliteFailure(code, msg) => {
                let msg = msg.unwrap_or_else(|| code.to_string());
                match code.code {
                    ErrorCode::DatabaseBusy | ErrorCode::DatabaseLocked => RepositoryError::Busy(msg),
                    ErrorCode::ConstraintViolation => match code.extended_code {
                        ffi::SQLITE_CONSTRAINT_UNIQUE | ffi::SQLITE_CONSTRAINT_PRIMARYKEY => {
                            RepositoryError::UniqueViolation(msg)
                        }
                        ffi::SQLITE_CONSTRAINT_FOREIGNKEY => RepositoryError::ForeignKeyViolation(msg),
                        _ => RepositoryError::Sql(msg),
                    },
                    _ => RepositoryError::Sql(msg),
                }
            }
            rusqlite::Error::QueryReturnedNoRows => RepositoryError::NotFound {
                entity: "row".to_string(),
                key: "-".to_string(),
            },
            other => RepositoryError::Sql(other.to_string()),
        }
    }
}

impl From<tokio::task::JoinError> for RepositoryError {
    fn from(err: tokio::task::JoinError) -> Self {
        RepositoryError::TaskJoin(err.to_string())
    }
}

/// Result 类型别名
pub type RepositoryResult<T> = Result<T, RepositoryError>;
