// ==========================================
// 1895 农业普查单位归一化 - 行级单位传播
// ==========================================
// 职责: 按行级单位标记（CC / M / MC）换算整行变换列，并把标记改写为 H
// 红线: 换算失败的单元格原样保留，不向调用方抛错
// 红线: 标记为 H 的行不再换算（幂等）
// ==========================================

use crate::domain::cell::{CellValue, Row};
use crate::domain::types::{McFactorPolicy, Scale, UnitIndicator};
use crate::engine::unit_parser::{canonicalize, parse_plain_number};
use tracing::trace;

/// 行级传播结果
#[derive(Debug, Clone, PartialEq)]
pub struct PropagationOutcome {
    pub indicator: Option<UnitIndicator>, // 传播前的标记（空单元格为 None）
    pub scale: Option<Scale>,             // 实际应用的换算
    pub converted_columns: Vec<usize>,    // 被换算的列
}

impl PropagationOutcome {
    fn untouched(indicator: Option<UnitIndicator>) -> Self {
        Self {
            indicator,
            scale: None,
            converted_columns: Vec::new(),
        }
    }
}

// ==========================================
// UnitPropagator
// ==========================================
#[derive(Debug, Clone, Copy, Default)]
pub struct UnitPropagator {
    mc_policy: McFactorPolicy,
}

impl UnitPropagator {
    pub fn new(mc_policy: McFactorPolicy) -> Self {
        Self { mc_policy }
    }

    /// 对一行应用行级换算
    ///
    /// # 参数
    /// - row: 待处理行（原地修改）
    /// - indicator_column: 单位标记列
    /// - transform_columns: 变换列（越界列与标记列自身被忽略）
    pub fn propagate(
        &self,
        row: &mut Row,
        indicator_column: usize,
        transform_columns: &[usize],
    ) -> PropagationOutcome {
        let indicator = match row.get(indicator_column) {
            Some(cell) if !cell.is_empty() => UnitIndicator::parse(&cell.render()),
            _ => return PropagationOutcome::untouched(None),
        };

        let scale = match indicator.scale(self.mc_policy) {
            Some(scale) => scale,
            None => return PropagationOutcome::untouched(Some(indicator)),
        };

        let mut converted_columns = Vec::new();
        for &column in transform_columns {
            if column == indicator_column {
                continue;
            }
            let Some(cell) = row.get_mut(column) else {
                continue;
            };
            if let Some(value) = coerce_for_scaling(cell) {
                *cell = CellValue::Number(scale.apply(value));
                converted_columns.push(column);
            }
        }

        row.set(indicator_column, CellValue::Text(UnitIndicator::Hectares.to_string()));

        trace!(
            row_number = row.row_number,
            indicator = %indicator,
            converted = converted_columns.len(),
            "行级单位换算"
        );

        PropagationOutcome {
            indicator: Some(indicator),
            scale: Some(scale),
            converted_columns,
        }
    }
}

/// 换算前的数值读取（逗号视为小数点；失败返回 None，单元格保持原样）
fn coerce_for_scaling(cell: &CellValue) -> Option<f64> {
    match cell {
        CellValue::Number(value) => Some(*value),
        CellValue::Text(text) => parse_plain_number(&canonicalize(text)),
        CellValue::Empty => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row(indicator: &str) -> Row {
        Row::new(
            1,
            vec![
                CellValue::from("Pérez"),
                CellValue::from(indicator),
                CellValue::from("10,5"),
                CellValue::Number(2000.0),
                CellValue::from("?"),
                CellValue::Empty,
            ],
        )
    }

    #[test]
    fn test_cc_multiplies_and_rewrites_indicator() {
        let mut r = row("CC");
        let outcome = UnitPropagator::default().propagate(&mut r, 1, &[2, 3, 4, 5]);

        assert_eq!(r.get(1), Some(&CellValue::from("H")));
        assert_eq!(r.get(2), Some(&CellValue::Number(17.64)));
        assert_eq!(r.get(3), Some(&CellValue::Number(3360.0)));
        // 无法转换 → 原样保留；空值保持空
        assert_eq!(r.get(4), Some(&CellValue::from("?")));
        assert_eq!(r.get(5), Some(&CellValue::Empty));
        assert_eq!(outcome.converted_columns, vec![2, 3]);
        assert_eq!(outcome.indicator, Some(UnitIndicator::Cc));
    }

    #[test]
    fn test_meters_divide_by_thousand() {
        let mut r = row("M");
        UnitPropagator::default().propagate(&mut r, 1, &[3]);
        assert_eq!(r.get(3), Some(&CellValue::Number(2.0)));
        // 不在变换列中的单元格不受影响
        assert_eq!(r.get(2), Some(&CellValue::from("10,5")));
    }

    #[test]
    fn test_mc_policy_selects_factor() {
        let mut r = row("MC");
        UnitPropagator::new(McFactorPolicy::RowLevel).propagate(&mut r, 1, &[3]);
        assert_eq!(r.get(3), Some(&CellValue::Number(0.2)));

        let mut r = row("MC");
        UnitPropagator::new(McFactorPolicy::PerCell).propagate(&mut r, 1, &[3]);
        assert_eq!(r.get(3), Some(&CellValue::Number(2.0)));
    }

    #[test]
    fn test_hectares_row_is_noop() {
        let mut r = row("H");
        let before = r.clone();
        let outcome = UnitPropagator::default().propagate(&mut r, 1, &[2, 3, 4]);

        assert_eq!(r, before);
        assert_eq!(outcome.scale, None);
    }

    #[test]
    fn test_second_application_is_noop() {
        let mut r = row("CC");
        let propagator = UnitPropagator::default();
        propagator.propagate(&mut r, 1, &[2, 3]);
        let once = r.clone();
        propagator.propagate(&mut r, 1, &[2, 3]);
        assert_eq!(r, once);
    }

    #[test]
    fn test_tenure_code_indicator_untouched() {
        let mut r = row("A");
        let outcome = UnitPropagator::default().propagate(&mut r, 1, &[2, 3]);
        assert_eq!(r.get(1), Some(&CellValue::from("A")));
        assert_eq!(outcome.indicator, Some(UnitIndicator::Other("A".to_string())));
    }

    #[test]
    fn test_out_of_range_columns_ignored() {
        let mut r = row("CC");
        let outcome = UnitPropagator::default().propagate(&mut r, 1, &[3, 40]);
        assert_eq!(outcome.converted_columns, vec![3]);
    }
}
