// ==========================================
// 1895 农业普查单位归一化 - 输出写出
// ==========================================
// 输出: <output_dir>/<stem>.csv 与可选的 <stem>.errors.json
// 红线: Empty 写为空字段，不写 0
// ==========================================

use crate::domain::cell::Row;
use crate::domain::report::ErrorMask;
use crate::importer::error::{ImportError, ImportResult};
use csv::WriterBuilder;
use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::PathBuf;

pub const ERROR_MASK_SUFFIX: &str = "errors.json";

/// 输出表头
///
/// 配置了固定表头时按行宽截断或用源表头补齐，否则直接使用源表头
pub fn resolve_headers(configured: &[String], source: &[String], width: usize) -> Vec<String> {
    if configured.is_empty() {
        let mut headers = source.to_vec();
        headers.resize(width.max(source.len()), String::new());
        return headers;
    }
    (0..width)
        .map(|idx| {
            configured
                .get(idx)
                .or_else(|| source.get(idx))
                .cloned()
                .unwrap_or_default()
        })
        .collect()
}

pub struct OutputWriter {
    output_dir: PathBuf,
}

impl OutputWriter {
    pub fn new(output_dir: impl Into<PathBuf>) -> Self {
        Self {
            output_dir: output_dir.into(),
        }
    }

    pub fn csv_path(&self, stem: &str) -> PathBuf {
        self.output_dir.join(format!("{stem}.csv"))
    }

    pub fn error_mask_path(&self, stem: &str) -> PathBuf {
        self.output_dir.join(format!("{stem}.{ERROR_MASK_SUFFIX}"))
    }

    fn ensure_dir(&self) -> ImportResult<()> {
        fs::create_dir_all(&self.output_dir).map_err(|e| {
            ImportError::FileWriteError(format!("{}: {}", self.output_dir.display(), e))
        })
    }

    /// 写出归一化后的表
    pub fn write_csv(&self, stem: &str, headers: &[String], rows: &[Row]) -> ImportResult<PathBuf> {
        self.ensure_dir()?;
        let path = self.csv_path(stem);
        let write_err = |e: csv::Error| {
            ImportError::FileWriteError(format!("{}: {}", path.display(), e))
        };

        let mut writer = WriterBuilder::new()
            .flexible(true)
            .from_path(&path)
            .map_err(write_err)?;
        writer.write_record(headers).map_err(write_err)?;
        for row in rows {
            writer
                .write_record(row.cells.iter().map(|cell| cell.render()))
                .map_err(write_err)?;
        }
        writer
            .flush()
            .map_err(|e| ImportError::FileWriteError(format!("{}: {}", path.display(), e)))?;
        Ok(path)
    }

    /// 写出 ErrorMask（JSON）
    pub fn write_error_mask(&self, stem: &str, mask: &ErrorMask) -> ImportResult<PathBuf> {
        self.ensure_dir()?;
        let path = self.error_mask_path(stem);
        let write_err = |e: std::io::Error| {
            ImportError::FileWriteError(format!("{}: {}", path.display(), e))
        };

        let mut writer = BufWriter::new(File::create(&path).map_err(write_err)?);
        serde_json::to_writer_pretty(&mut writer, mask)?;
        writer.flush().map_err(write_err)?;
        Ok(path)
    }
}
