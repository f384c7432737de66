// ==========================================
// 1895 农业普查单位归一化 - 数据仓储层
// ==========================================
// 红线: Repository 不含业务逻辑
// ==========================================
// 职责: 运行台账（每个文件一条处理记录），可选启用
// 约束: 所有查询使用参数化
// ==========================================

pub mod error;
pub mod run_ledger_repo;

// 重导出核心仓储
pub use error::{RepositoryError, RepositoryResult};
pub use run_ledger_repo::{LedgerEntry, RunLedgerRepository};
