// ==========================================
// 1895 农业普查单位归一化 - 配置层
// ==========================================
// 职责: 外部化的流水线配置，支持版本预设与多级覆写
// 来源: 版本预设 → TOML 文件 → 命令行
// ==========================================

pub mod error;
pub mod pipeline_config;
pub mod revision;

// 重导出核心配置
pub use error::{ConfigError, ConfigResult};
pub use pipeline_config::{
    ConfigOverrides, LayoutOverrides, PipelineConfig, DEFAULT_MAX_PARALLEL_FILES,
};
pub use revision::{Revision, RevisionPreset, V3_OUTPUT_HEADERS};
