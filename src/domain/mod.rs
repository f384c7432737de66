// ==========================================
// 1895 农业普查单位归一化 - 领域模型层
// ==========================================
// 职责: 定义单元格、行、命名视图、诊断与报告类型
// 红线: 不含文件读写逻辑,不含换算逻辑
// ==========================================

pub mod cell;
pub mod census;
pub mod report;
pub mod types;

// 重导出核心类型
pub use cell::{CellValue, Row};
pub use census::{CensusRecord, ColumnLayout};
pub use report::{
    CoercionIssue, CoercionReason, ErrorMask, FileReport, FileStatus, FilterStageCount,
    RunSummary,
};
pub use types::{McFactorPolicy, RescanPolicy, Scale, TenureCode, TokenOrder, UnitIndicator};
