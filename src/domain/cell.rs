// ==========================================
// 1895 农业普查单位归一化 - 单元格与行模型
// ==========================================
// 职责: 定义普查表格的单元格值与位置行
// 红线: 空值(Empty)与数值 0.0 必须可区分，下游过滤依赖 null 语义
// ==========================================

use serde::{Deserialize, Serialize};
use std::fmt;

// ==========================================
// CellValue - 单元格值
// ==========================================
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "value", rename_all = "snake_case")]
pub enum CellValue {
    Empty,          // 空单元格（null 标记）
    Number(f64),    // 数值（归一化后单位为公顷）
    Text(String),   // 文本（含未能解析的记号）
}

impl CellValue {
    /// 从原始文本构造单元格（去除首尾空白，空白 → Empty）
    ///
    /// 注意: 不做数值识别，数值识别是 UnitTokenParser 的职责
    pub fn from_raw(raw: &str) -> Self {
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            CellValue::Empty
        } else {
            CellValue::Text(trimmed.to_string())
        }
    }

    pub fn is_empty(&self) -> bool {
        match self {
            CellValue::Empty => true,
            CellValue::Text(s) => s.trim().is_empty(),
            CellValue::Number(_) => false,
        }
    }

    pub fn as_number(&self) -> Option<f64> {
        match self {
            CellValue::Number(v) => Some(*v),
            _ => None,
        }
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            CellValue::Text(s) => Some(s.as_str()),
            _ => None,
        }
    }

    /// 宽松数值读取（下游过滤用）
    ///
    /// - Number → Some
    /// - Text 若可直接解析为有限浮点数（逗号视为小数点）→ Some
    /// - 其他 → None（等价于 errors='coerce'）
    pub fn coerce_number(&self) -> Option<f64> {
        match self {
            CellValue::Number(v) => Some(*v),
            CellValue::Text(s) => s
                .replace(',', ".")
                .trim()
                .parse::<f64>()
                .ok()
                .filter(|v| v.is_finite()),
            CellValue::Empty => None,
        }
    }

    /// 单元格的字符串形式（输出/记号扫描用）
    pub fn render(&self) -> String {
        self.to_string()
    }
}

impl fmt::Display for CellValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CellValue::Empty => Ok(()),
            CellValue::Number(v) => write!(f, "{}", v),
            CellValue::Text(s) => write!(f, "{}", s),
        }
    }
}

impl From<f64> for CellValue {
    fn from(v: f64) -> Self {
        CellValue::Number(v)
    }
}

impl From<&str> for CellValue {
    fn from(s: &str) -> Self {
        CellValue::Text(s.to_string())
    }
}

// ==========================================
// Row - 位置行
// ==========================================
// 列按位置寻址（0 = 户主, 1 = 经营方式/单位标记, 2 = 总面积, 3.. = 作物面积与农机数量）
// 具体位置由 ColumnLayout 配置，变换逻辑不硬编码下标
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Row {
    pub row_number: usize, // 源表数据行号（从 1 开始，不含表头）
    pub cells: Vec<CellValue>,
}

impl Row {
    pub fn new(row_number: usize, cells: Vec<CellValue>) -> Self {
        Self { row_number, cells }
    }

    pub fn get(&self, column: usize) -> Option<&CellValue> {
        self.cells.get(column)
    }

    pub fn get_mut(&mut self, column: usize) -> Option<&mut CellValue> {
        self.cells.get_mut(column)
    }

    /// 写入单元格（越界时忽略）
    pub fn set(&mut self, column: usize, value: CellValue) {
        if let Some(cell) = self.cells.get_mut(column) {
            *cell = value;
        }
    }

    pub fn width(&self) -> usize {
        self.cells.len()
    }

    /// 整行是否完全空白
    pub fn is_blank(&self) -> bool {
        self.cells.iter().all(CellValue::is_empty)
    }

    /// 删除指定列（列号需升序去重）
    pub fn drop_columns(&mut self, columns: &[usize]) {
        for &column in columns.iter().rev() {
            if column < self.cells.len() {
                self.cells.remove(column);
            }
        }
    }
}
