// ==========================================
// 1895 农业普查单位归一化 - 表格预处理
// ==========================================
// 职责: 删除全空行 / 删除列（前导列、按名称）/ 删除含 '?' 的行 / 表结构校验
// 红线: 预处理只删不改，单元格内容的改写留给引擎层
// ==========================================

use crate::domain::census::ColumnLayout;
use crate::importer::error::{ImportError, ImportResult};
use crate::importer::file_parser::RawSheet;
use tracing::debug;

/// 未辨认单元格的标记
pub const QUESTION_MARK: &str = "?";

pub struct SheetCleaner;

impl SheetCleaner {
    /// 删除完全空白的行，返回删除行数
    pub fn drop_blank_rows(&self, sheet: &mut RawSheet) -> usize {
        let before = sheet.rows.len();
        sheet.rows.retain(|row| !row.is_blank());
        before - sheet.rows.len()
    }

    /// 删除前 `leading` 列以及表头名匹配 `named`（不区分大小写）的列
    ///
    /// 返回被删除的原始列号（升序）
    pub fn drop_columns(
        &self,
        sheet: &mut RawSheet,
        leading: usize,
        named: &[String],
    ) -> Vec<usize> {
        let width = sheet.width();
        let mut dropped: Vec<usize> = (0..leading.min(width)).collect();
        for (idx, header) in sheet.headers.iter().enumerate() {
            let header = header.trim();
            if named.iter().any(|name| name.trim().eq_ignore_ascii_case(header)) {
                dropped.push(idx);
            }
        }
        dropped.sort_unstable();
        dropped.dedup();

        if dropped.is_empty() {
            return dropped;
        }

        for &column in dropped.iter().rev() {
            if column < sheet.headers.len() {
                sheet.headers.remove(column);
            }
        }
        for row in &mut sheet.rows {
            row.drop_columns(&dropped);
        }
        debug!(columns = ?dropped, "删除列");
        dropped
    }

    /// 表结构校验：ColumnLayout 中的每个位置都必须存在
    pub fn check_schema(&self, sheet: &RawSheet, layout: &ColumnLayout) -> ImportResult<()> {
        let found = sheet.width();
        if layout.min_width() > found {
            return Err(ImportError::SchemaMismatch {
                required: layout.required_columns(),
                found,
            });
        }
        Ok(())
    }

    /// 删除在 `columns` 任一位置上为 "?" 的行，返回删除行数
    ///
    /// 超出行宽的位置忽略
    pub fn drop_question_rows(&self, sheet: &mut RawSheet, columns: &[usize]) -> usize {
        let before = sheet.rows.len();
        sheet.rows.retain(|row| {
            !columns.iter().any(|&column| {
                row.get(column)
                    .and_then(|cell| cell.as_text())
                    .map(|text| text.trim() == QUESTION_MARK)
                    .unwrap_or(false)
            })
        });
        before - sheet.rows.len()
    }
}
