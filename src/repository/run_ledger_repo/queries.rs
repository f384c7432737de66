use super::core::{LedgerEntry, RunLedgerRepository, TIMESTAMP_FORMAT};
use crate::domain::report::FileStatus;
use crate::repository::error::RepositoryResult;
use chrono::NaiveDateTime;
use rusqlite::types::Type;
use rusqlite::{params, Result as SqliteResult, Row};

const SELECT_COLUMNS: &str = r#"
    SELECT id, run_id, file_name, status, rows_read, rows_blank_dropped,
           rows_question_dropped, rows_written, conversions, coercion_failures,
           filter_stages_json, output_path, elapsed_ms, message, recorded_at
    FROM format_run_file
"#;

impl RunLedgerRepository {
    // ==========================================
    // 查询操作
    // ==========================================

    /// 查询某次运行的全部文件记录（按文件名排序）
    pub fn list_run(&self, run_id: &str) -> RepositoryResult<Vec<LedgerEntry>> {
        let conn = self.get_conn()?;

        let mut stmt = conn.prepare(&format!(
            "{SELECT_COLUMNS} WHERE run_id = ? ORDER BY file_name ASC, id ASC"
        ))?;

        let entries = stmt
            .query_map(params![run_id], |row| self.map_row(row))?
            .collect::<SqliteResult<Vec<_>>>()?;

        Ok(entries)
    }

    /// 最近的失败/跳过记录（新记录在前）
    pub fn recent_failures(&self, limit: usize) -> RepositoryResult<Vec<LedgerEntry>> {
        let conn = self.get_conn()?;

        let mut stmt = conn.prepare(&format!(
            "{SELECT_COLUMNS} WHERE status <> ? ORDER BY id DESC LIMIT ?"
        ))?;

        let entries = stmt
            .query_map(
                params![FileStatus::Processed.to_string(), limit as i64],
                |row| self.map_row(row),
            )?
            .collect::<SqliteResult<Vec<_>>>()?;

        Ok(entries)
    }

    /// 台账中记录过的运行 ID（最近的在前）
    pub fn recent_runs(&self, limit: usize) -> RepositoryResult<Vec<String>> {
        let conn = self.get_conn()?;

        let mut stmt = conn.prepare(
            r#"
            SELECT run_id
            FROM format_run_file
            GROUP BY run_id
            ORDER BY MAX(id) DESC
            LIMIT ?
            "#,
        )?;

        let runs = stmt
            .query_map(params![limit as i64], |row| row.get(0))?
            .collect::<SqliteResult<Vec<String>>>()?;

        Ok(runs)
    }

    // ==========================================
    // 辅助方法
    // ==========================================

    fn map_row(&self, row: &Row) -> SqliteResult<LedgerEntry> {
        let status_text: String = row.get(3)?;
        let status = status_text.parse::<FileStatus>().map_err(|e| {
            rusqlite::Error::FromSqlConversionFailure(3, Type::Text, e.into())
        })?;

        let stages_json: String = row.get(10)?;
        let filter_stages = serde_json::from_str(&stages_json).map_err(|e| {
            rusqlite::Error::FromSqlConversionFailure(10, Type::Text, Box::new(e))
        })?;

        let recorded_at_text: String = row.get(14)?;
        let recorded_at = NaiveDateTime::parse_from_str(&recorded_at_text, TIMESTAMP_FORMAT)
            .map_err(|e| rusqlite::Error::FromSqlConversionFailure(14, Type::Text, Box::new(e)))?;

        Ok(LedgerEntry {
            id: row.get(0)?,
            run_id: row.get(1)?,
            file_name: row.get(2)?,
            status,
            rows_read: row.get::<_, i64>(4)? as usize,
            rows_blank_dropped: row.get::<_, i64>(5)? as usize,
            rows_question_dropped: row.get::<_, i64>(6)? as usize,
            rows_written: row.get::<_, i64>(7)? as usize,
            conversions: row.get::<_, i64>(8)? as usize,
            coercion_failures: row.get::<_, i64>(9)? as usize,
            filter_stages,
            output_path: row.get(11)?,
            elapsed_ms: row.get::<_, i64>(12)? as u64,
            message: row.get(13)?,
            recorded_at,
        })
    }
}
