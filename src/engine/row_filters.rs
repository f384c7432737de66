// ==========================================
// 1895 农业普查单位归一化 - 行分类过滤器
// ==========================================
// 职责: 下游清洗阶段使用的行谓词 + 逐级过滤统计
// 级联: 原表 → 户主非空 → 面积非空 → 经营方式非空 → 经营方式∈{A,M,P} → 最低耕作规模
// 红线: 依赖 null 语义，空单元格与 0.0 不可混同
// ==========================================

use crate::domain::cell::Row;
use crate::domain::census::{CensusRecord, ColumnLayout};
use crate::domain::report::FilterStageCount;
use serde::{Deserialize, Serialize};

// ==========================================
// 最低耕作规模阈值
// ==========================================
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CultivationThresholds {
    pub crop_columns: Vec<usize>, // 作物面积列
    pub crop_min: f64,            // 任一作物列 ≥ crop_min
    pub extension_min: f64,       // 或总面积 ≥ extension_min
}

impl Default for CultivationThresholds {
    fn default() -> Self {
        Self {
            crop_columns: vec![4, 5, 6, 7],
            crop_min: 1.0,
            extension_min: 10.0,
        }
    }
}

// ===== 行谓词 =====

pub fn has_holder(record: &CensusRecord<'_>) -> bool {
    record.holder().is_some()
}

pub fn has_extension(record: &CensusRecord<'_>) -> bool {
    record.extension().is_some()
}

pub fn has_tenure(record: &CensusRecord<'_>) -> bool {
    record.tenure_cell().is_some()
}

pub fn tenure_is_amp(record: &CensusRecord<'_>) -> bool {
    record.tenure().is_some()
}

/// 任一作物列 ≥ crop_min 或总面积 ≥ extension_min（文本按缺失处理）
pub fn meets_minimum_cultivation(
    record: &CensusRecord<'_>,
    thresholds: &CultivationThresholds,
) -> bool {
    let crop_ok = record
        .measurements(&thresholds.crop_columns)
        .into_iter()
        .filter_map(|(_, cell)| cell.coerce_number())
        .any(|v| v >= thresholds.crop_min);

    let extension_ok = record
        .extension()
        .and_then(|cell| cell.coerce_number())
        .map(|v| v >= thresholds.extension_min)
        .unwrap_or(false);

    crop_ok || extension_ok
}

// ==========================================
// FilterStage - 级联阶段
// ==========================================
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FilterStage {
    Original,
    HolderPresent,
    ExtensionPresent,
    TenurePresent,
    TenureAmp,
    MinimumCultivation,
}

impl FilterStage {
    pub const ALL: [FilterStage; 6] = [
        FilterStage::Original,
        FilterStage::HolderPresent,
        FilterStage::ExtensionPresent,
        FilterStage::TenurePresent,
        FilterStage::TenureAmp,
        FilterStage::MinimumCultivation,
    ];

    /// 阶段名（与历史工作表名一致）
    pub fn label(self) -> &'static str {
        match self {
            FilterStage::Original => "0_tabla_original",
            FilterStage::HolderPresent => "1_filtro_titular_(nonulo)",
            FilterStage::ExtensionPresent => "2_filtro_extension_(nonulo)",
            FilterStage::TenurePresent => "3_filtro_tipo_(nonulos)",
            FilterStage::TenureAmp => "4_filtro_tipo_AMP",
            FilterStage::MinimumCultivation => "5_filtro_cultivo_(_1)",
        }
    }

    /// 本阶段自身的谓词（不含前序阶段）
    fn own_predicate(self, record: &CensusRecord<'_>, thresholds: &CultivationThresholds) -> bool {
        match self {
            FilterStage::Original => true,
            FilterStage::HolderPresent => has_holder(record),
            FilterStage::ExtensionPresent => has_extension(record),
            FilterStage::TenurePresent => has_tenure(record),
            FilterStage::TenureAmp => tenure_is_amp(record),
            FilterStage::MinimumCultivation => meets_minimum_cultivation(record, thresholds),
        }
    }
}

// ==========================================
// FilterCascade
// ==========================================
#[derive(Debug, Clone)]
pub struct FilterCascade {
    layout: ColumnLayout,
    thresholds: CultivationThresholds,
}

impl FilterCascade {
    pub fn new(layout: ColumnLayout, thresholds: CultivationThresholds) -> Self {
        Self { layout, thresholds }
    }

    /// 行是否通过指定阶段（含全部前序阶段）
    pub fn passes(&self, row: &Row, stage: FilterStage) -> bool {
        let record = CensusRecord::new(row, &self.layout);
        FilterStage::ALL
            .iter()
            .take_while(|s| **s != stage)
            .chain(std::iter::once(&stage))
            .all(|s| s.own_predicate(&record, &self.thresholds))
    }

    /// 指定阶段保留的行
    pub fn rows_at<'r>(&self, rows: &'r [Row], stage: FilterStage) -> Vec<&'r Row> {
        rows.iter().filter(|row| self.passes(row, stage)).collect()
    }

    /// 各阶段保留行数
    pub fn stage_counts(&self, rows: &[Row]) -> Vec<FilterStageCount> {
        FilterStage::ALL
            .iter()
            .map(|&stage| FilterStageCount {
                stage: stage.label().to_string(),
                rows: rows.iter().filter(|row| self.passes(row, stage)).count(),
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::cell::CellValue;

    fn row(n: usize, cells: Vec<CellValue>) -> Row {
        Row::new(n, cells)
    }

    fn rows() -> Vec<Row> {
        use CellValue::{Empty, Number};
        vec![
            // 全部通过
            row(1, vec!["Pérez".into(), "A".into(), Number(50.0), "H".into(), Number(2.0), Empty, Empty, Empty]),
            // 户主为空
            row(2, vec![Empty, "A".into(), Number(50.0), "H".into(), Empty, Empty, Empty, Empty]),
            // 面积为空
            row(3, vec!["Gómez".into(), "M".into(), Empty, "H".into(), Number(3.0), Empty, Empty, Empty]),
            // 经营方式 X
            row(4, vec!["Díaz".into(), "X".into(), Number(50.0), "H".into(), Empty, Empty, Empty, Empty]),
            // 面积 0.0（非空）且作物不足
            row(5, vec!["Ruiz".into(), "P".into(), Number(0.0), "H".into(), Number(0.5), Empty, Empty, Empty]),
        ]
    }

    #[test]
    fn test_stage_counts_cascade() {
        let cascade = FilterCascade::new(ColumnLayout::default(), CultivationThresholds::default());
        let counts: Vec<usize> = cascade.stage_counts(&rows()).iter().map(|c| c.rows).collect();
        assert_eq!(counts, vec![5, 4, 3, 3, 2, 1]);
    }

    #[test]
    fn test_zero_extension_is_present() {
        let rows = rows();
        let layout = ColumnLayout::default();
        let record = CensusRecord::new(&rows[4], &layout);
        assert!(has_extension(&record));
        assert!(!meets_minimum_cultivation(&record, &CultivationThresholds::default()));
    }

    #[test]
    fn test_minimum_cultivation_by_extension() {
        let layout = ColumnLayout::default();
        let r = row(9, vec!["Sosa".into(), "A".into(), "12,5".into(), "H".into()]);
        let record = CensusRecord::new(&r, &layout);
        assert!(meets_minimum_cultivation(&record, &CultivationThresholds::default()));
    }

    #[test]
    fn test_stage_labels() {
        assert_eq!(FilterStage::TenureAmp.label(), "4_filtro_tipo_AMP");
        let cascade = FilterCascade::new(ColumnLayout::default(), CultivationThresholds::default());
        let all = rows();
        let kept = cascade.rows_at(&all, FilterStage::TenureAmp);
        assert_eq!(kept.iter().map(|r| r.row_number).collect::<Vec<_>>(), vec![1, 5]);
    }
}
