// ==========================================
// 1895 农业普查单位归一化 - 导入层
// ==========================================
// 职责: 普查表读取、预处理、归一化调度、写出
// 支持: Excel (.xlsx/.xls), CSV
// ==========================================

// 模块声明
pub mod census_formatter_impl;
pub mod census_formatter_trait;
pub mod error;
pub mod file_parser;
pub mod sheet_cleaner;
pub mod writer;

// 重导出核心类型
pub use census_formatter_impl::{list_input_files, CensusFormatterImpl, FilePipeline};
pub use error::{ImportError, ImportResult};
pub use file_parser::{CsvParser, ExcelParser, RawSheet, UniversalFileParser};
pub use sheet_cleaner::SheetCleaner;
pub use writer::{resolve_headers, OutputWriter};

// 重导出 Trait 接口
pub use census_formatter_trait::{CensusFormatter, FileParser};
