// ==========================================
// 1895 农业普查单位归一化 - 运行台账仓储
// ==========================================
// 表: format_run_file（每个 FileReport 一行）
// 红线: 台账只追加，不修改历史记录
// ==========================================

mod core;
mod queries;

#[cfg(test)]
mod tests;

pub use core::{LedgerEntry, RunLedgerRepository};
