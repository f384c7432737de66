// ==========================================
// 1895 农业普查单位归一化 - 经营方式首字母提取
// ==========================================
// 规则: 转字符串 → 取首字符 → 大写
// 空输入 → 空输出（保持 null，不报错）
// ==========================================

use crate::domain::cell::CellValue;

pub struct TenureExtractor;

impl TenureExtractor {
    /// 提取单元格首字母并大写
    pub fn extract(cell: &CellValue) -> CellValue {
        let rendered = cell.render();
        match rendered.trim_start().chars().next() {
            Some(first) => CellValue::Text(first.to_uppercase().collect()),
            None => CellValue::Empty,
        }
    }
}
