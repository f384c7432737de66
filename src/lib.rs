// ==========================================
// 1895 农业普查单位归一化 - 核心库
// ==========================================
// 技术栈: Rust + calamine/csv + SQLite（可选台账）
// 系统定位: 历史普查表格式化阶段（单位换算为公顷）
// ==========================================

// ==========================================
// 模块声明
// ==========================================

// 领域层 - 单元格、行、报告
pub mod domain;

// 数据仓储层 - 运行台账
pub mod repository;

// 引擎层 - 记号解析与单位传播
pub mod engine;

// 导入层 - 读取、预处理、写出
pub mod importer;

// 配置层 - 流水线配置
pub mod config;

// 数据库基础设施（连接初始化/PRAGMA 统一）
pub mod db;

// 日志系统
pub mod logging;

// ==========================================
// 重导出核心类型
// ==========================================

// 领域类型
pub use domain::{
    CellValue, CensusRecord, ColumnLayout, ErrorMask, FileReport, FileStatus, McFactorPolicy,
    RescanPolicy, Row, RunSummary, TenureCode, TokenOrder, UnitIndicator,
};

// 引擎
pub use engine::{
    FilterCascade, RowNormalizer, TenureExtractor, UnitPropagator, UnitTokenParser,
};

// 导入
pub use importer::{CensusFormatter, CensusFormatterImpl};

// 配置
pub use config::{ConfigOverrides, PipelineConfig, Revision};

// ==========================================
// 常量定义
// ==========================================

// 系统版本
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

// 系统名称
pub const APP_NAME: &str = "censo-normalizer";

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_version() {
        assert!(!VERSION.is_empty());
    }
}
