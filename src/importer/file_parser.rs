// ==========================================
// 1895 农业普查单位归一化 - 文件解析器实现
// ==========================================
// 支持: Excel (.xlsx/.xls，读取第一个工作表) / CSV (.csv)
// 输出: 表头 + 位置行（不做列名映射，列位置由 ColumnLayout 决定）
// ==========================================

use crate::domain::cell::{CellValue, Row};
use crate::importer::census_formatter_trait::FileParser;
use crate::importer::error::{ImportError, ImportResult};
use calamine::{open_workbook, open_workbook_auto, Data, Range, Reader, Xlsx};
use csv::ReaderBuilder;
use std::borrow::Cow;
use std::fs::File;
use std::io::BufReader;
use std::path::Path;
use tracing::warn;

// ==========================================
// RawSheet - 解析后的原始表
// ==========================================
#[derive(Debug, Clone, PartialEq, Default)]
pub struct RawSheet {
    pub headers: Vec<String>,
    pub rows: Vec<Row>,
}

impl RawSheet {
    /// 表宽度（表头与最宽数据行取大）
    pub fn width(&self) -> usize {
        self.rows
            .iter()
            .map(Row::width)
            .max()
            .unwrap_or(0)
            .max(self.headers.len())
    }
}

/// 检查文件存在并返回小写扩展名
fn checked_extension(path: &Path) -> ImportResult<String> {
    if !path.exists() {
        return Err(ImportError::FileNotFound(path.display().to_string()));
    }
    Ok(path
        .extension()
        .and_then(|e| e.to_str())
        .unwrap_or("")
        .to_lowercase())
}

/// 行补齐到指定宽度（缺失位置为 Empty）
fn pad_cells(mut cells: Vec<CellValue>, width: usize) -> Vec<CellValue> {
    if cells.len() < width {
        cells.resize(width, CellValue::Empty);
    }
    cells
}

fn decode_field(field: &[u8]) -> Cow<'_, str> {
    String::from_utf8_lossy(field)
}

// ==========================================
// CSV Parser 实现
// ==========================================
pub struct CsvParser;

impl FileParser for CsvParser {
    fn parse_sheet(&self, file_path: &Path) -> ImportResult<RawSheet> {
        let ext = checked_extension(file_path)?;
        if ext != "csv" {
            return Err(ImportError::UnsupportedFormat(ext));
        }

        let file = File::open(file_path)?;
        let mut reader = ReaderBuilder::new()
            .has_headers(true)
            .flexible(true) // 允许行长度不一致
            .from_reader(file);

        // 按字节读取，非 UTF-8 字节替换为 U+FFFD，不整表失败
        let headers: Vec<String> = reader
            .byte_headers()?
            .iter()
            .map(|h| decode_field(h).trim().to_string())
            .collect();

        // 全空行保留，由 SheetCleaner 统计后删除
        let mut rows = Vec::new();
        let mut lossy_rows = 0usize;
        for (idx, result) in reader.byte_records().enumerate() {
            let record = result?;
            if std::str::from_utf8(record.as_slice()).is_err() {
                lossy_rows += 1;
            }
            let cells = record
                .iter()
                .map(|field| CellValue::from_raw(&decode_field(field)))
                .collect();
            rows.push(Row::new(idx + 1, pad_cells(cells, headers.len())));
        }
        if lossy_rows > 0 {
            warn!(
                file = %file_path.display(),
                rows = lossy_rows,
                "CSV 含非 UTF-8 字节，已替换为 U+FFFD"
            );
        }

        Ok(RawSheet { headers, rows })
    }
}

// ==========================================
// Excel Parser 实现
// ==========================================
pub struct ExcelParser;

impl ExcelParser {
    /// calamine 单元格 → CellValue
    ///
    /// 布尔、日期等渲染为文本；错误单元格（#N/A 等）读作文本
    pub fn convert_cell(cell: &Data) -> CellValue {
        match cell {
            Data::Empty => CellValue::Empty,
            Data::Float(v) => CellValue::Number(*v),
            Data::Int(v) => CellValue::Number(*v as f64),
            Data::String(s) => CellValue::from_raw(s),
            other => CellValue::from_raw(&other.to_string()),
        }
    }

    fn first_sheet<R>(workbook: &mut R) -> ImportResult<Range<Data>>
    where
        R: Reader<BufReader<File>>,
        ImportError: From<R::Error>,
    {
        let sheet_names = workbook.sheet_names();
        let Some(sheet_name) = sheet_names.first() else {
            return Err(ImportError::ExcelParseError("Excel 文件无工作表".to_string()));
        };
        Ok(workbook.worksheet_range(sheet_name)?)
    }

    fn range_to_sheet(range: &Range<Data>) -> ImportResult<RawSheet> {
        let mut rows = range.rows();
        let header_row = rows
            .next()
            .ok_or_else(|| ImportError::ExcelParseError("Excel 文件无表头行".to_string()))?;

        let headers: Vec<String> = header_row
            .iter()
            .map(|cell| cell.to_string().trim().to_string())
            .collect();

        let rows = rows
            .enumerate()
            .map(|(idx, data_row)| {
                let cells = data_row.iter().map(Self::convert_cell).collect();
                Row::new(idx + 1, pad_cells(cells, headers.len()))
            })
            .collect();

        Ok(RawSheet { headers, rows })
    }
}

impl FileParser for ExcelParser {
    fn parse_sheet(&self, file_path: &Path) -> ImportResult<RawSheet> {
        let ext = checked_extension(file_path)?;
        let range = match ext.as_str() {
            "xlsx" => {
                let mut workbook: Xlsx<_> = open_workbook(file_path)?;
                Self::first_sheet(&mut workbook)?
            }
            "xls" => {
                let mut workbook = open_workbook_auto(file_path)?;
                Self::first_sheet(&mut workbook)?
            }
            _ => return Err(ImportError::UnsupportedFormat(ext)),
        };
        Self::range_to_sheet(&range)
    }
}

// ==========================================
// 通用文件解析器（根据扩展名自动选择）
// ==========================================
pub struct UniversalFileParser;

impl UniversalFileParser {
    /// 是否为可处理的普查表文件
    pub fn is_supported(path: &Path) -> bool {
        matches!(
            path.extension()
                .and_then(|e| e.to_str())
                .map(|e| e.to_lowercase())
                .as_deref(),
            Some("csv" | "xlsx" | "xls")
        )
    }
}

impl FileParser for UniversalFileParser {
    fn parse_sheet(&self, file_path: &Path) -> ImportResult<RawSheet> {
        let ext = file_path
            .extension()
            .and_then(|e| e.to_str())
            .unwrap_or("")
            .to_lowercase();

        match ext.as_str() {
            "csv" => CsvParser.parse_sheet(file_path),
            "xlsx" | "xls" => ExcelParser.parse_sheet(file_path),
            _ => Err(ImportError::UnsupportedFormat(ext)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    fn csv_file(lines: &[&str]) -> NamedTempFile {
        let mut temp_file = tempfile::Builder::new().suffix(".csv").tempfile().unwrap();
        for line in lines {
            writeln!(temp_file, "{}", line).unwrap();
        }
        temp_file
    }

    #[test]
    fn test_csv_parser_positional_rows() {
        let temp_file = csv_file(&[
            "Titular,Tipo,Extension,medida",
            "Juan Pérez,a,5 cc,CC",
            "María López,m,12,H",
        ]);

        let sheet = CsvParser.parse_sheet(temp_file.path()).unwrap();

        assert_eq!(sheet.headers, vec!["Titular", "Tipo", "Extension", "medida"]);
        assert_eq!(sheet.rows.len(), 2);
        assert_eq!(sheet.rows[0].row_number, 1);
        assert_eq!(sheet.rows[0].get(2), Some(&CellValue::Text("5 cc".to_string())));
        assert_eq!(sheet.rows[1].get(3), Some(&CellValue::Text("H".to_string())));
    }

    #[test]
    fn test_csv_parser_file_not_found() {
        let result = CsvParser.parse_sheet(Path::new("non_existent.csv"));
        assert!(matches!(result, Err(ImportError::FileNotFound(_))));
    }

    #[test]
    fn test_csv_parser_keeps_blank_rows_and_pads() {
        let temp_file = csv_file(&["a,b,c", "x,1,2", ",,", "y"]);

        let sheet = CsvParser.parse_sheet(temp_file.path()).unwrap();

        // 全空行交给 SheetCleaner 统计
        assert_eq!(sheet.rows.len(), 3);
        assert!(sheet.rows[1].is_blank());
        assert_eq!(sheet.rows[2].width(), 3);
        assert_eq!(sheet.rows[2].get(2), Some(&CellValue::Empty));
    }

    #[test]
    fn test_csv_parser_tolerates_latin1_bytes() {
        let mut temp_file = tempfile::Builder::new().suffix(".csv").tempfile().unwrap();
        // "P\xe9rez" 为 Latin-1 编码
        temp_file
            .write_all(b"Titular,Tipo,Extension,medida\nP\xe9rez,a,5,CC\nG\xf3mez,m,12,H\n")
            .unwrap();

        let sheet = CsvParser.parse_sheet(temp_file.path()).unwrap();

        assert_eq!(sheet.rows.len(), 2);
        assert_eq!(sheet.rows[0].get(0), Some(&CellValue::Text("P\u{FFFD}rez".to_string())));
        assert_eq!(sheet.rows[0].get(2), Some(&CellValue::Text("5".to_string())));
        assert_eq!(sheet.rows[1].get(3), Some(&CellValue::Text("H".to_string())));
    }

    #[test]
    fn test_universal_parser_rejects_unknown_extension() {
        let temp_file = tempfile::Builder::new().suffix(".txt").tempfile().unwrap();
        let result = UniversalFileParser.parse_sheet(temp_file.path());
        assert!(matches!(result, Err(ImportError::UnsupportedFormat(_))));
    }

    #[test]
    fn test_excel_cell_conversion() {
        assert_eq!(ExcelParser::convert_cell(&Data::Empty), CellValue::Empty);
        assert_eq!(ExcelParser::convert_cell(&Data::Int(3)), CellValue::Number(3.0));
        assert_eq!(
            ExcelParser::convert_cell(&Data::String("  ".to_string())),
            CellValue::Empty
        );
        assert_eq!(
            ExcelParser::convert_cell(&Data::Bool(true)),
            CellValue::Text("true".to_string())
        );
    }

    #[test]
    fn test_is_supported() {
        assert!(UniversalFileParser::is_supported(Path::new("a.XLSX")));
        assert!(UniversalFileParser::is_supported(Path::new("b.csv")));
        assert!(!UniversalFileParser::is_supported(Path::new("c.json")));
    }
}
