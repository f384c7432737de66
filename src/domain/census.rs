// ==========================================
// 1895 农业普查单位归一化 - 普查记录视图
// ==========================================
// 职责: 以命名字段访问位置行，列位置由 ColumnLayout 给出
// 用途: 引擎层与过滤层不直接使用整数下标
// ==========================================

use crate::domain::cell::{CellValue, Row};
use crate::domain::types::{TenureCode, UnitIndicator};
use serde::{Deserialize, Serialize};

// ==========================================
// ColumnLayout - 列位置映射
// ==========================================
// 不同版本的脚本因删除前导列而偏移，这里显式配置
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ColumnLayout {
    pub holder_column: usize,          // 户主姓名
    pub tenure_column: Option<usize>,  // 经营方式（A/M/P），None 表示不做首字母提取
    pub unit_indicator_column: usize,  // 行级单位标记
    pub extension_column: usize,       // 耕作总面积
}

impl Default for ColumnLayout {
    fn default() -> Self {
        Self {
            holder_column: 0,
            tenure_column: Some(1),
            unit_indicator_column: 3,
            extension_column: 2,
        }
    }
}

impl ColumnLayout {
    /// 必需列（缺任何一列即视为表结构不匹配）
    pub fn required_columns(&self) -> Vec<usize> {
        let mut columns = vec![
            self.holder_column,
            self.unit_indicator_column,
            self.extension_column,
        ];
        if let Some(tenure) = self.tenure_column {
            columns.push(tenure);
        }
        columns.sort_unstable();
        columns.dedup();
        columns
    }

    /// 行宽至少需要的列数
    pub fn min_width(&self) -> usize {
        self.required_columns()
            .last()
            .map(|max| max + 1)
            .unwrap_or(0)
    }
}

// ==========================================
// CensusRecord - 命名字段视图（只读借用）
// ==========================================
#[derive(Debug, Clone, Copy)]
pub struct CensusRecord<'a> {
    row: &'a Row,
    layout: &'a ColumnLayout,
}

impl<'a> CensusRecord<'a> {
    pub fn new(row: &'a Row, layout: &'a ColumnLayout) -> Self {
        Self { row, layout }
    }

    pub fn row_number(&self) -> usize {
        self.row.row_number
    }

    pub fn holder(&self) -> Option<&'a CellValue> {
        self.non_empty(self.layout.holder_column)
    }

    pub fn extension(&self) -> Option<&'a CellValue> {
        self.non_empty(self.layout.extension_column)
    }

    /// 经营方式单元格（未配置经营方式列时为 None）
    pub fn tenure_cell(&self) -> Option<&'a CellValue> {
        self.layout
            .tenure_column
            .and_then(|column| self.non_empty(column))
    }

    pub fn tenure(&self) -> Option<TenureCode> {
        self.tenure_cell()
            .and_then(|cell| TenureCode::parse(&cell.render()))
    }

    pub fn unit_indicator(&self) -> Option<UnitIndicator> {
        self.non_empty(self.layout.unit_indicator_column)
            .map(|cell| UnitIndicator::parse(&cell.render()))
    }

    /// 指定列的单元格（空白视为缺失）
    pub fn measurement(&self, column: usize) -> Option<&'a CellValue> {
        self.non_empty(column)
    }

    /// 多列取值，跳过空白与越界列
    pub fn measurements(&self, columns: &[usize]) -> Vec<(usize, &'a CellValue)> {
        columns
            .iter()
            .filter_map(|&column| self.non_empty(column).map(|cell| (column, cell)))
            .collect()
    }

    fn non_empty(&self, column: usize) -> Option<&'a CellValue> {
        self.row.get(column).filter(|cell| !cell.is_empty())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_row() -> Row {
        Row::new(
            7,
            vec![
                CellValue::from("Pérez"),
                CellValue::from("a"),
                CellValue::Number(120.0),
                CellValue::from("CC"),
                CellValue::Empty,
            ],
        )
    }

    #[test]
    fn test_named_access() {
        let row = sample_row();
        let layout = ColumnLayout::default();
        let record = CensusRecord::new(&row, &layout);

        assert_eq!(record.row_number(), 7);
        assert_eq!(record.holder(), Some(&CellValue::from("Pérez")));
        assert_eq!(record.extension(), Some(&CellValue::Number(120.0)));
        assert_eq!(record.tenure(), Some(TenureCode::Owner));
        assert_eq!(record.unit_indicator(), Some(UnitIndicator::Cc));
        assert_eq!(record.measurement(4), None);
        assert_eq!(record.measurement(99), None);

        let measurements = record.measurements(&[2, 4, 99]);
        assert_eq!(measurements, vec![(2, &CellValue::Number(120.0))]);
    }

    #[test]
    fn test_required_columns_and_min_width() {
        let layout = ColumnLayout::default();
        assert_eq!(layout.required_columns(), vec![0, 1, 2, 3]);
        assert_eq!(layout.min_width(), 4);

        let layout = ColumnLayout {
            holder_column: 0,
            tenure_column: None,
            unit_indicator_column: 1,
            extension_column: 2,
        };
        assert_eq!(layout.min_width(), 3);
    }
}
