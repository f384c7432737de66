// ==========================================
// 1895 农业普查单位归一化 - 格式化流程 Trait
// ==========================================
// 职责: 定义单文件格式化与批处理接口（不包含实现）
// ==========================================

use crate::domain::report::{FileReport, RunSummary};
use crate::importer::error::ImportResult;
use crate::importer::file_parser::RawSheet;
use async_trait::async_trait;
use std::path::{Path, PathBuf};

// ==========================================
// CensusFormatter Trait
// ==========================================
// 用途: 普查表格式化主接口
// 实现者: CensusFormatterImpl
#[async_trait]
pub trait CensusFormatter: Send + Sync {
    /// 格式化单个文件
    ///
    /// # 参数
    /// - run_id: 批次 ID
    /// - file_path: 普查表路径（.xlsx/.xls/.csv）
    ///
    /// # 返回
    /// - FileReport: 成功、跳过、失败都以报告形式返回，不返回 Err
    ///
    /// # 流程
    /// 1. 解析第一个工作表
    /// 2. 删除全空行
    /// 3. 删除前导列 / 按名称删除列
    /// 4. 表结构校验
    /// 5. 删除含 '?' 的行
    /// 6. 经营方式首字母提取
    /// 7. 单位归一化（收集 ErrorMask）
    /// 8. 写出 CSV 与 ErrorMask
    /// 9. 过滤级联计数
    async fn format_file(&self, run_id: &str, file_path: &Path) -> FileReport;

    /// 批量格式化多个文件（并发执行）
    ///
    /// # 说明
    /// - 每个文件独立处理，某个文件失败不影响其他文件
    /// - 报告按文件名排序返回
    async fn batch_format(&self, file_paths: Vec<PathBuf>) -> RunSummary;

    /// 格式化输入目录下的全部普查表
    ///
    /// # 返回
    /// - Err: 输入目录无法列出
    async fn format_directory(&self) -> ImportResult<RunSummary>;
}

// ==========================================
// FileParser Trait
// ==========================================
// 用途: 文件解析接口
// 实现者: CsvParser, ExcelParser, UniversalFileParser
pub trait FileParser: Send + Sync {
    /// 解析文件为表头 + 位置行
    fn parse_sheet(&self, file_path: &Path) -> ImportResult<RawSheet>;
}
