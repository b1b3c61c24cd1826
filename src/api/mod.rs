// ==========================================
// 商品批量导入引擎 - API 层
// ==========================================
// 职责: 面向调用方（CLI / 上层服务）的业务接口，与传输层无关
// ==========================================

pub mod error;
pub mod import_api;

// 重导出核心类型
pub use error::{ApiError, ApiResult};
pub use import_api::{ImportApi, ImportApiResponse, InitDatabaseResponse};
