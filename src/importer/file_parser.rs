// ==========================================
// 商品批量导入引擎 - CSV 解析器
// ==========================================
// 输出: 表头 + 按位置对齐的原始行（值不做任何转换）
// ==========================================

use crate::importer::error::ImportError;
use crate::importer::product_importer_trait::FileParser;
use csv::ReaderBuilder;
use std::fs::File;
use std::io::Read;
use std::path::Path;

// ==========================================
// ParsedCsv - 解析结果
// ==========================================
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ParsedCsv {
    pub headers: Vec<String>,
    pub rows: Vec<Vec<String>>,
}

impl ParsedCsv {
    pub fn row_count(&self) -> usize {
        self.rows.len()
    }
}

/// 取单元格并去除首尾空白；行长度不足时视为空
pub fn cell(row: &[String], index: usize) -> &str {
    row.get(index).map(|v| v.trim()).unwrap_or("")
}

// ==========================================
// CSV Parser 实现
// ==========================================
pub struct CsvParser;

impl CsvParser {
    fn parse<R: Read>(&self, reader: R) -> Result<ParsedCsv, ImportError> {
        let mut reader = ReaderBuilder::new()
            .has_headers(true)
            .flexible(true) // 允许行长度不一致
            .from_reader(reader);

        // 读取表头（去 BOM + 去空白）
        let headers: Vec<String> = reader
            .headers()?
            .iter()
            .map(|h| h.trim_start_matches('\u{feff}').trim().to_string())
            .collect();

        let mut rows = Vec::new();
        for result in reader.records() {
            let record = result?;
            let row: Vec<String> = record.iter().map(|v| v.to_string()).collect();

            // 跳过完全空白的行
            if row.iter().all(|v| v.trim().is_empty()) {
                continue;
            }
            rows.push(row);
        }

        Ok(ParsedCsv { headers, rows })
    }
}

impl FileParser for CsvParser {
    fn parse_file(&self, file_path: &Path) -> Result<ParsedCsv, ImportError> {
        // 检查文件存在
        if !file_path.exists() {
            return Err(ImportError::FileNotFound(file_path.display().to_string()));
        }

        // 检查扩展名
        if let Some(ext) = file_path.extension() {
            if !ext.eq_ignore_ascii_case("csv") {
                return Err(ImportError::UnsupportedFormat(
                    ext.to_string_lossy().to_string(),
                ));
            }
        }

        let file = File::open(file_path)?;
        self.parse(file)
    }

    fn parse_reader(&self, reader: &mut (dyn Read + Send)) -> Result<ParsedCsv, ImportError> {
        self.parse(reader)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    #[test]
    fn test_parse_positional_rows() {
        let mut input = Cursor::new("\u{feff}sku , name\nA,Alpha\n,,\nB\n");
        let parsed = CsvParser.parse_reader(&mut input).unwrap();
        assert_eq!(parsed.headers, vec!["sku", "name"]);
        assert_eq!(parsed.row_count(), 2);
        assert_eq!(cell(&parsed.rows[1], 0), "B");
        assert_eq!(cell(&parsed.rows[1], 1), "");
    }

    #[test]
    fn test_rejects_non_csv_extension() {
        let tmp = tempfile::Builder::new().suffix(".xlsx").tempfile().unwrap();
        let err = CsvParser.parse_file(tmp.path()).unwrap_err();
        assert!(matches!(err, ImportError::UnsupportedFormat(_)));
    }

    #[test]
    fn test_missing_file() {
        let err = CsvParser
            .parse_file(Path::new("/nonexistent/products.csv"))
            .unwrap_err();
        assert!(matches!(err, ImportError::FileNotFound(_)));
    }
}
