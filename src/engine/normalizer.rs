// ==========================================
// 1895 农业普查单位归一化 - 行归一化器
// ==========================================
// 流程: 行级单位传播 → 逐格记号扫描（按 RescanPolicy）→ 收集 ErrorMask
// 说明: 行级已换算的单元格变为数值，逐格扫描只处理文本单元格，
//       因此同一单元格不会被两条路径重复换算
// ==========================================

use crate::domain::cell::{CellValue, Row};
use crate::domain::census::ColumnLayout;
use crate::domain::report::CoercionIssue;
use crate::domain::types::{McFactorPolicy, RescanPolicy, TokenOrder};
use crate::engine::unit_parser::UnitTokenParser;
use crate::engine::unit_propagation::UnitPropagator;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

// ==========================================
// NormalizerSettings
// ==========================================
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NormalizerSettings {
    pub layout: ColumnLayout,
    pub transform_columns: Vec<usize>,
    pub mc_factor_policy: McFactorPolicy,
    pub rescan_policy: RescanPolicy,
    pub token_order: TokenOrder,
}

/// 单行归一化结果
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RowOutcome {
    pub conversions: usize,         // 发生单位换算的单元格数
    pub indicator_rewritten: bool,  // 单位标记是否被改写为 H
    pub issues: Vec<CoercionIssue>, // 变换列中的转换失败
}

// ==========================================
// RowNormalizer
// ==========================================
#[derive(Debug, Clone)]
pub struct RowNormalizer {
    layout: ColumnLayout,
    transform_columns: BTreeSet<usize>,
    rescan_policy: RescanPolicy,
    parser: UnitTokenParser,
    propagator: UnitPropagator,
}

impl RowNormalizer {
    pub fn new(settings: &NormalizerSettings) -> Self {
        Self {
            layout: settings.layout.clone(),
            transform_columns: settings.transform_columns.iter().copied().collect(),
            rescan_policy: settings.rescan_policy,
            parser: UnitTokenParser::new(settings.token_order),
            propagator: UnitPropagator::new(settings.mc_factor_policy),
        }
    }

    pub fn parser(&self) -> &UnitTokenParser {
        &self.parser
    }

    pub fn transform_columns(&self) -> impl Iterator<Item = usize> + '_ {
        self.transform_columns.iter().copied()
    }

    /// 归一化单行（原地修改）
    pub fn normalize(&self, row: &mut Row) -> RowOutcome {
        let indicator_column = self.layout.unit_indicator_column;
        let transform: Vec<usize> = self.transform_columns.iter().copied().collect();

        // === 步骤 1: 行级单位传播 ===
        let propagation = self.propagator.propagate(row, indicator_column, &transform);
        let mut outcome = RowOutcome {
            conversions: propagation.converted_columns.len(),
            indicator_rewritten: propagation.scale.is_some(),
            issues: Vec::new(),
        };

        // === 步骤 2: 逐格记号扫描 ===
        for column in self.rescan_columns(row.width()) {
            let Some(CellValue::Text(text)) = row.get(column) else {
                continue;
            };
            match self.parser.parse(text) {
                Ok(parsed) => {
                    if parsed.converted() {
                        outcome.conversions += 1;
                    }
                    row.set(column, CellValue::Number(parsed.value));
                }
                Err(failure) => {
                    if self.transform_columns.contains(&column) {
                        outcome.issues.push(CoercionIssue {
                            row_number: row.row_number,
                            column,
                            raw: failure.raw,
                            reason: failure.reason,
                        });
                    }
                }
            }
        }

        outcome
    }

    fn rescan_columns(&self, width: usize) -> Vec<usize> {
        let indicator_column = self.layout.unit_indicator_column;
        match self.rescan_policy {
            RescanPolicy::Historical => (0..width).filter(|c| *c != indicator_column).collect(),
            RescanPolicy::TransformColumnsOnly => self
                .transform_columns
                .iter()
                .copied()
                .filter(|c| *c < width && *c != indicator_column)
                .collect(),
        }
    }
}
