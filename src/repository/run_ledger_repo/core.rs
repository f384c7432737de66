use crate::db::{
    configure_sqlite_connection, open_sqlite_connection, read_schema_version,
    write_schema_version, CURRENT_SCHEMA_VERSION,
};
use crate::domain::report::{FileReport, FileStatus, FilterStageCount, RunSummary};
use crate::repository::error::{RepositoryError, RepositoryResult};
use chrono::{NaiveDateTime, Utc};
use rusqlite::{params, Connection};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use std::sync::{Arc, Mutex};
use tracing::{debug, warn};

pub(super) const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

// ==========================================
// LedgerEntry - 台账记录
// ==========================================
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LedgerEntry {
    pub id: i64,
    pub run_id: String,
    pub file_name: String,
    pub status: FileStatus,
    pub rows_read: usize,
    pub rows_blank_dropped: usize,
    pub rows_question_dropped: usize,
    pub rows_written: usize,
    pub conversions: usize,
    pub coercion_failures: usize,
    pub filter_stages: Vec<FilterStageCount>,
    pub output_path: Option<String>,
    pub elapsed_ms: u64,
    pub message: Option<String>,
    pub recorded_at: NaiveDateTime,
}

// ==========================================
// RunLedgerRepository - 运行台账仓储
// ==========================================
// 红线: Repository 不做业务逻辑,只做数据映射
pub struct RunLedgerRepository {
    conn: Arc<Mutex<Connection>>,
}

impl RunLedgerRepository {
    /// 使用已有连接创建仓储
    pub fn new(conn: Arc<Mutex<Connection>>) -> Self {
        Self { conn }
    }

    /// 打开（必要时创建）台账文件并建表
    pub fn open(db_path: &Path) -> RepositoryResult<Self> {
        if let Some(parent) = db_path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }
        let conn = open_sqlite_connection(db_path)?;
        let repo = Self::new(Arc::new(Mutex::new(conn)));
        repo.ensure_schema()?;
        debug!(path = %db_path.display(), "运行台账已打开");
        Ok(repo)
    }

    /// 内存台账（不落盘）
    pub fn open_in_memory() -> RepositoryResult<Self> {
        let conn = Connection::open_in_memory()?;
        configure_sqlite_connection(&conn)?;
        let repo = Self::new(Arc::new(Mutex::new(conn)));
        repo.ensure_schema()?;
        Ok(repo)
    }

    /// 获取数据库连接
    pub(super) fn get_conn(&self) -> RepositoryResult<std::sync::MutexGuard<Connection>> {
        self.conn
            .lock()
            .map_err(|e| RepositoryError::LockError(e.to_string()))
    }

    /// 建表（幂等）
    pub fn ensure_schema(&self) -> RepositoryResult<()> {
        let conn = self.get_conn()?;
        conn.execute_batch(
            r#"
            CREATE TABLE IF NOT EXISTS format_run_file (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                run_id TEXT NOT NULL,
                file_name TEXT NOT NULL,
                status TEXT NOT NULL,
                rows_read INTEGER NOT NULL,
                rows_blank_dropped INTEGER NOT NULL,
                rows_question_dropped INTEGER NOT NULL,
                rows_written INTEGER NOT NULL,
                conversions INTEGER NOT NULL,
                coercion_failures INTEGER NOT NULL,
                filter_stages_json TEXT NOT NULL,
                output_path TEXT,
                elapsed_ms INTEGER NOT NULL,
                message TEXT,
                recorded_at TEXT NOT NULL
            );
            CREATE INDEX IF NOT EXISTS idx_format_run_file_run_id
                ON format_run_file (run_id);
            CREATE INDEX IF NOT EXISTS idx_format_run_file_status
                ON format_run_file (status);
            "#,
        )?;

        match read_schema_version(&conn)? {
            Some(version) if version > CURRENT_SCHEMA_VERSION => {
                warn!(
                    found = version,
                    expected = CURRENT_SCHEMA_VERSION,
                    "台账 schema 版本高于当前程序"
                );
            }
            Some(_) => {}
            None => write_schema_version(&conn, CURRENT_SCHEMA_VERSION)?,
        }
        Ok(())
    }

    // ==========================================
    // 写入操作
    // ==========================================

    /// 写入单个文件的处理报告
    ///
    /// # 返回
    /// - `Ok(id)`: 新记录的自增 ID
    pub fn record_report(&self, report: &FileReport) -> RepositoryResult<i64> {
        let conn = self.get_conn()?;
        insert_report(&conn, report)?;
        Ok(conn.last_insert_rowid())
    }

    /// 写入整批报告（单事务）
    pub fn record_summary(&self, summary: &RunSummary) -> RepositoryResult<usize> {
        let mut conn = self.get_conn()?;
        let tx = conn.transaction()?;

        let mut count = 0;
        for report in &summary.reports {
            insert_report(&tx, report)?;
            count += 1;
        }

        tx.commit()?;
        Ok(count)
    }
}

fn insert_report(conn: &Connection, report: &FileReport) -> RepositoryResult<()> {
    let filter_stages_json =
        serde_json::to_string(&report.filter_stages).map_err(|e| {
            RepositoryError::SerializationError {
                field: "filter_stages".to_string(),
                message: e.to_string(),
            }
        })?;

    conn.execute(
        r#"
        INSERT INTO format_run_file (
            run_id, file_name, status, rows_read, rows_blank_dropped,
            rows_question_dropped, rows_written, conversions, coercion_failures,
            filter_stages_json, output_path, elapsed_ms, message, recorded_at
        ) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
        "#,
        params![
            report.run_id,
            report.file_name,
            report.status.to_string(),
            report.rows_read as i64,
            report.rows_blank_dropped as i64,
            report.rows_question_dropped as i64,
            report.rows_written as i64,
            report.conversions as i64,
            report.coercion_failures as i64,
            filter_stages_json,
            report.output_path,
            report.elapsed_ms as i64,
            report.message,
            Utc::now().naive_utc().format(TIMESTAMP_FORMAT).to_string(),
        ],
    )?;
    Ok(())
}
