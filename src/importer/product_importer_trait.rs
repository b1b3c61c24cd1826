// ==========================================
// 商品批量导入引擎 - 导入 Trait
// ==========================================
// 职责: 定义商品导入接口（不包含实现）
// ==========================================

use crate::domain::import_report::ImportResult;
use crate::importer::error::ImportError;
use crate::importer::file_parser::ParsedCsv;
use async_trait::async_trait;
use std::io::Read;
use std::path::Path;

// ==========================================
// ProductImporter Trait
// ==========================================
// 实现者: ProductImporterImpl
#[async_trait]
pub trait ProductImporter: Send + Sync {
    /// 从 CSV 文件导入商品
    ///
    /// # 返回
    /// - Ok(ImportResult): 行数 / 新建 / 更新 / 跳过 / 告警 / 各目标行数 / 耗时
    /// - Err: 缺少 sku 列、元数据加载失败、关联方案无法识别、实体解析失败、写入失败
    ///
    /// # 导入流程
    /// 1. 解析 CSV（表头 + 原始行）
    /// 2. 加载属性元数据 + 探测关联方案
    /// 3. 列分类
    /// 4. 实体解析（查询已存在 SKU + 批量新建）
    /// 5. 收集属性值 / 库存 / 图库 / 价格索引
    /// 6. 并发批量写入
    async fn import_from_csv<P: AsRef<Path> + Send>(
        &self,
        file_path: P,
    ) -> Result<ImportResult, ImportError>;

    /// 从任意 CSV 数据流导入（流程同上）
    async fn import_from_reader<Rd: Read + Send>(
        &self,
        reader: Rd,
    ) -> Result<ImportResult, ImportError>;
}

// ==========================================
// FileParser Trait
// ==========================================
// 实现者: CsvParser
pub trait FileParser: Send + Sync {
    /// 解析文件，返回表头和按位置对齐的原始行
    fn parse_file(&self, file_path: &Path) -> Result<ParsedCsv, ImportError>;

    /// 解析数据流
    fn parse_reader(&self, reader: &mut (dyn Read + Send)) -> Result<ParsedCsv, ImportError>;
}
