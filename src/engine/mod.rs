// ==========================================
// 1895 农业普查单位归一化 - 引擎层
// ==========================================
// 职责: 单位记号解析、行级单位传播、经营方式提取、行分类过滤
// 红线: 引擎不做文件读写，所有转换失败以返回值形式给出
// ==========================================

pub mod normalizer;
pub mod row_filters;
pub mod tenure;
pub mod unit_parser;
pub mod unit_propagation;

// 重导出核心引擎
pub use normalizer::{NormalizerSettings, RowNormalizer, RowOutcome};
pub use row_filters::{CultivationThresholds, FilterCascade, FilterStage};
pub use tenure::TenureExtractor;
pub use unit_parser::{
    CoercionFailure, ConversionRule, ParsedQuantity, TokenTransform, UnitTokenParser,
    UnitTokenTable,
};
pub use unit_propagation::{PropagationOutcome, UnitPropagator};
