// ==========================================
// 1895 农业普查单位归一化 - 诊断与运行报告
// ==========================================
// 职责: ErrorMask（数值转换失败记录）、单文件报告、批次汇总
// 红线: ErrorMask 仅为诊断输出，不参与任何控制流
// ==========================================

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

// ==========================================
// 数值转换失败原因
// ==========================================
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum CoercionReason {
    NoUnitToken,                          // 既非数值也无单位记号
    TokenWithoutNumber { token: String }, // 找到记号但前面没有数字
}

impl fmt::Display for CoercionReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CoercionReason::NoUnitToken => write!(f, "无法解析为数值且无单位记号"),
            CoercionReason::TokenWithoutNumber { token } => {
                write!(f, "找到单位记号 {} 但缺少前置数字", token)
            }
        }
    }
}

// ==========================================
// CoercionIssue - ErrorMask 条目
// ==========================================
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CoercionIssue {
    pub row_number: usize, // 源表数据行号
    pub column: usize,     // 列位置（删除前导列之后）
    pub raw: String,       // 原始值
    pub reason: CoercionReason,
}

// ==========================================
// ErrorMask - (行, 列) → 转换失败
// ==========================================
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ErrorMask {
    issues: Vec<CoercionIssue>,
}

impl ErrorMask {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record(&mut self, issue: CoercionIssue) {
        self.issues.push(issue);
    }

    pub fn extend<I: IntoIterator<Item = CoercionIssue>>(&mut self, issues: I) {
        self.issues.extend(issues);
    }

    /// 查询单元格是否转换失败
    pub fn is_flagged(&self, row_number: usize, column: usize) -> bool {
        self.issues
            .iter()
            .any(|i| i.row_number == row_number && i.column == column)
    }

    pub fn issues(&self) -> &[CoercionIssue] {
        &self.issues
    }

    pub fn len(&self) -> usize {
        self.issues.len()
    }

    pub fn is_empty(&self) -> bool {
        self.issues.is_empty()
    }
}

// ==========================================
// 单文件处理状态
// ==========================================
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum FileStatus {
    Processed,      // 已处理并写出
    SchemaMismatch, // 缺少必需列，整文件跳过
    ReadFailed,     // 读取失败
    WriteFailed,    // 写出失败
    Failed,         // 处理线程异常终止
}

impl FileStatus {
    pub fn is_success(self) -> bool {
        matches!(self, FileStatus::Processed)
    }
}

impl fmt::Display for FileStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FileStatus::Processed => write!(f, "PROCESSED"),
            FileStatus::SchemaMismatch => write!(f, "SCHEMA_MISMATCH"),
            FileStatus::ReadFailed => write!(f, "READ_FAILED"),
            FileStatus::WriteFailed => write!(f, "WRITE_FAILED"),
            FileStatus::Failed => write!(f, "FAILED"),
        }
    }
}

impl std::str::FromStr for FileStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "PROCESSED" => Ok(FileStatus::Processed),
            "SCHEMA_MISMATCH" => Ok(FileStatus::SchemaMismatch),
            "READ_FAILED" => Ok(FileStatus::ReadFailed),
            "WRITE_FAILED" => Ok(FileStatus::WriteFailed),
            "FAILED" => Ok(FileStatus::Failed),
            other => Err(format!("未知文件状态: {}", other)),
        }
    }
}

// ==========================================
// 过滤级联统计
// ==========================================
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FilterStageCount {
    pub stage: String, // 例如 "4_filtro_tipo_AMP"
    pub rows: usize,
}

// ==========================================
// FileReport - 单文件处理报告
// ==========================================
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FileReport {
    pub run_id: String,
    pub file_name: String,
    pub status: FileStatus,
    pub rows_read: usize,             // 读取的数据行数
    pub rows_blank_dropped: usize,    // 删除的全空行
    pub rows_question_dropped: usize, // 含 '?' 被删除的行
    pub rows_written: usize,
    pub conversions: usize,           // 发生单位换算的单元格数
    pub coercion_failures: usize,     // ErrorMask 条目数
    pub filter_stages: Vec<FilterStageCount>,
    pub output_path: Option<String>,
    pub elapsed_ms: u64,
    pub message: Option<String>,      // 跳过/失败原因
}

impl FileReport {
    /// 失败或跳过的报告（无行统计）
    pub fn failure(
        run_id: impl Into<String>,
        file_name: impl Into<String>,
        status: FileStatus,
        message: impl Into<String>,
    ) -> Self {
        Self {
            run_id: run_id.into(),
            file_name: file_name.into(),
            status,
            rows_read: 0,
            rows_blank_dropped: 0,
            rows_question_dropped: 0,
            rows_written: 0,
            conversions: 0,
            coercion_failures: 0,
            filter_stages: Vec::new(),
            output_path: None,
            elapsed_ms: 0,
            message: Some(message.into()),
        }
    }
}

// ==========================================
// RunSummary - 批次汇总
// ==========================================
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunSummary {
    pub run_id: String,
    pub started_at: DateTime<Utc>,
    pub reports: Vec<FileReport>,
}

impl RunSummary {
    pub fn processed(&self) -> usize {
        self.count(FileStatus::Processed)
    }

    pub fn skipped(&self) -> usize {
        self.count(FileStatus::SchemaMismatch)
    }

    pub fn failed(&self) -> usize {
        self.reports
            .iter()
            .filter(|r| {
                matches!(
                    r.status,
                    FileStatus::ReadFailed | FileStatus::WriteFailed | FileStatus::Failed
                )
            })
            .count()
    }

    fn count(&self, status: FileStatus) -> usize {
        self.reports.iter().filter(|r| r.status == status).count()
    }
}
