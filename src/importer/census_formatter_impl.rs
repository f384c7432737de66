// ==========================================
// 1895 农业普查单位归一化 - 普查表格式化实现
// ==========================================
// 职责: 整合单文件格式化流程，并发处理整个输入目录
// 流程: 解析 → 删空行 → 删列 → 结构校验 → 删 '?' 行 → 首字母提取
//       → 单位归一化 → 写出 → 过滤级联计数
// ==========================================

use crate::config::PipelineConfig;
use crate::domain::cell::{CellValue, Row};
use crate::domain::report::{ErrorMask, FileReport, FileStatus, RunSummary};
use crate::engine::normalizer::RowNormalizer;
use crate::engine::row_filters::FilterCascade;
use crate::engine::tenure::TenureExtractor;
use crate::importer::census_formatter_trait::{CensusFormatter, FileParser};
use crate::importer::error::{ImportError, ImportResult};
use crate::importer::file_parser::UniversalFileParser;
use crate::importer::sheet_cleaner::SheetCleaner;
use crate::importer::writer::{resolve_headers, OutputWriter};
use async_trait::async_trait;
use chrono::Utc;
use futures::stream::{self, StreamExt};
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, error, info, instrument, warn};
use uuid::Uuid;

/// 单表归一化统计
#[derive(Debug, Clone, Default)]
pub struct SheetNormalization {
    pub conversions: usize,
    pub mask: ErrorMask,
}

// ==========================================
// FilePipeline - 单文件同步流程（在阻塞线程池中执行）
// ==========================================
pub struct FilePipeline {
    config: PipelineConfig,
    normalizer: RowNormalizer,
    cascade: FilterCascade,
    cleaner: SheetCleaner,
    writer: OutputWriter,
    file_parser: Box<dyn FileParser>,
}

impl FilePipeline {
    pub fn new(config: PipelineConfig, file_parser: Box<dyn FileParser>) -> Self {
        let normalizer = RowNormalizer::new(&config.normalizer_settings());
        let cascade = FilterCascade::new(config.layout.clone(), config.cultivation.clone());
        let writer = OutputWriter::new(config.output_dir.clone());
        Self {
            config,
            normalizer,
            cascade,
            cleaner: SheetCleaner,
            writer,
            file_parser,
        }
    }

    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    /// 处理单个文件，所有错误转换为报告状态
    #[instrument(skip(self, file_path), fields(file = %file_path.display()))]
    pub fn run(&self, run_id: &str, file_path: &Path) -> FileReport {
        let start_time = Instant::now();
        let file_name = file_name_of(file_path);

        let mut report = match self.process(run_id, &file_name, file_path) {
            Ok(report) => report,
            Err(e) => {
                let status = match &e {
                    ImportError::SchemaMismatch { .. } => FileStatus::SchemaMismatch,
                    e if e.is_write_error() => FileStatus::WriteFailed,
                    _ => FileStatus::ReadFailed,
                };
                match status {
                    FileStatus::SchemaMismatch => {
                        warn!(run_id = %run_id, error = %e, "表结构不匹配，跳过文件")
                    }
                    _ => error!(run_id = %run_id, status = %status, error = %e, "文件处理失败"),
                }
                FileReport::failure(run_id, file_name, status, e.to_string())
            }
        };

        report.elapsed_ms = start_time.elapsed().as_millis() as u64;
        report
    }

    fn process(&self, run_id: &str, file_name: &str, file_path: &Path) -> ImportResult<FileReport> {
        let config = &self.config;

        // === 步骤 1: 解析文件 ===
        let mut sheet = self.file_parser.parse_sheet(file_path)?;
        let rows_read = sheet.rows.len();
        debug!(rows = rows_read, columns = sheet.width(), "文件解析完成");

        // === 步骤 2-5: 表格预处理 ===
        let rows_blank_dropped = self.cleaner.drop_blank_rows(&mut sheet);
        self.cleaner.drop_columns(
            &mut sheet,
            config.drop_leading_columns,
            &config.drop_columns_named,
        );
        self.cleaner.check_schema(&sheet, &config.layout)?;
        let rows_question_dropped = self
            .cleaner
            .drop_question_rows(&mut sheet, &config.question_check_columns);
        debug!(
            blank = rows_blank_dropped,
            question = rows_question_dropped,
            remaining = sheet.rows.len(),
            "预处理完成"
        );

        // === 步骤 6-7: 首字母提取 + 单位归一化 ===
        // 经营方式列与单位标记列共用时，先换算再提取首字母
        let shared_column =
            config.layout.tenure_column == Some(config.layout.unit_indicator_column);
        if !shared_column {
            self.extract_tenure(&mut sheet.rows);
        }
        let normalization = self.normalize_rows(&mut sheet.rows);
        if shared_column {
            self.extract_tenure(&mut sheet.rows);
        }
        if config.blank_unparsed {
            self.blank_unparsed_cells(&mut sheet.rows);
        }
        info!(
            conversions = normalization.conversions,
            coercion_failures = normalization.mask.len(),
            "单位归一化完成"
        );

        // === 步骤 8: 写出 ===
        let stem = stem_of(file_path);
        let headers = resolve_headers(&config.output_headers, &sheet.headers, sheet.width());
        let output_path = self.writer.write_csv(&stem, &headers, &sheet.rows)?;
        if config.write_error_mask {
            self.writer.write_error_mask(&stem, &normalization.mask)?;
        }

        // === 步骤 9: 过滤级联计数 ===
        let filter_stages = self.cascade.stage_counts(&sheet.rows);
        for stage in &filter_stages {
            debug!(stage = %stage.stage, rows = stage.rows, "过滤级联");
        }

        info!(
            rows_written = sheet.rows.len(),
            output = %output_path.display(),
            "文件处理完成"
        );

        Ok(FileReport {
            run_id: run_id.to_string(),
            file_name: file_name.to_string(),
            status: FileStatus::Processed,
            rows_read,
            rows_blank_dropped,
            rows_question_dropped,
            rows_written: sheet.rows.len(),
            conversions: normalization.conversions,
            coercion_failures: normalization.mask.len(),
            filter_stages,
            output_path: Some(output_path.display().to_string()),
            elapsed_ms: 0,
            message: None,
        })
    }

    fn extract_tenure(&self, rows: &mut [Row]) {
        let Some(column) = self.config.layout.tenure_column else {
            return;
        };
        for row in rows {
            if let Some(cell) = row.get(column) {
                let extracted = TenureExtractor::extract(cell);
                row.set(column, extracted);
            }
        }
    }

    /// 逐行归一化并收集 ErrorMask
    pub fn normalize_rows(&self, rows: &mut [Row]) -> SheetNormalization {
        let mut result = SheetNormalization::default();
        for row in rows {
            let outcome = self.normalizer.normalize(row);
            result.conversions += outcome.conversions;
            result.mask.extend(outcome.issues);
        }
        result
    }

    /// 变换列中仍为文本的单元格置空
    fn blank_unparsed_cells(&self, rows: &mut [Row]) {
        for row in rows {
            for column in self.normalizer.transform_columns() {
                if matches!(row.get(column), Some(CellValue::Text(_))) {
                    row.set(column, CellValue::Empty);
                }
            }
        }
    }
}

fn file_name_of(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().to_string())
        .unwrap_or_else(|| path.display().to_string())
}

fn stem_of(path: &Path) -> String {
    path.file_stem()
        .map(|n| n.to_string_lossy().to_string())
        .unwrap_or_else(|| "output".to_string())
}

/// 列出目录下的普查表（不递归，按文件名排序）
pub fn list_input_files(input_dir: &Path) -> ImportResult<Vec<PathBuf>> {
    if !input_dir.is_dir() {
        return Err(ImportError::FileNotFound(input_dir.display().to_string()));
    }
    let mut files = Vec::new();
    for entry in fs::read_dir(input_dir)? {
        let path = entry?.path();
        if path.is_file() && UniversalFileParser::is_supported(&path) {
            files.push(path);
        }
    }
    files.sort_by_key(|p| file_name_of(p));
    Ok(files)
}

// ==========================================
// CensusFormatterImpl - 普查表格式化器实现
// ==========================================
pub struct CensusFormatterImpl {
    pipeline: Arc<FilePipeline>,
}

impl CensusFormatterImpl {
    /// 使用按扩展名自动选择的解析器
    pub fn new(config: PipelineConfig) -> Self {
        Self::with_parser(config, Box::new(UniversalFileParser))
    }

    pub fn with_parser(config: PipelineConfig, file_parser: Box<dyn FileParser>) -> Self {
        Self {
            pipeline: Arc::new(FilePipeline::new(config, file_parser)),
        }
    }

    pub fn pipeline(&self) -> &FilePipeline {
        &self.pipeline
    }
}

#[async_trait]
impl CensusFormatter for CensusFormatterImpl {
    async fn format_file(&self, run_id: &str, file_path: &Path) -> FileReport {
        let pipeline = Arc::clone(&self.pipeline);
        let task_run_id = run_id.to_string();
        let task_path = file_path.to_path_buf();

        match tokio::task::spawn_blocking(move || pipeline.run(&task_run_id, &task_path)).await {
            Ok(report) => report,
            Err(e) => {
                error!(file = %file_path.display(), error = %e, "处理线程异常终止");
                FileReport::failure(
                    run_id,
                    file_name_of(file_path),
                    FileStatus::Failed,
                    format!("处理线程异常终止: {}", e),
                )
            }
        }
    }

    async fn batch_format(&self, file_paths: Vec<PathBuf>) -> RunSummary {
        let run_id = Uuid::new_v4().to_string();
        let started_at = Utc::now();
        let max_parallel = self.pipeline.config().max_parallel_files.max(1);

        let mut file_paths = file_paths;
        file_paths.sort_by_key(|p| file_name_of(p));
        info!(
            run_id = %run_id,
            count = file_paths.len(),
            max_parallel = max_parallel,
            "开始批量格式化"
        );

        // buffered 保持输入顺序
        let reports: Vec<FileReport> = stream::iter(file_paths)
            .map(|path| {
                let run_id = run_id.clone();
                async move { self.format_file(&run_id, &path).await }
            })
            .buffered(max_parallel)
            .collect()
            .await;

        let summary = RunSummary {
            run_id,
            started_at,
            reports,
        };
        info!(
            run_id = %summary.run_id,
            processed = summary.processed(),
            skipped = summary.skipped(),
            failed = summary.failed(),
            "批量格式化完成"
        );
        summary
    }

    async fn format_directory(&self) -> ImportResult<RunSummary> {
        let input_dir = self.pipeline.config().input_dir.clone();
        let files = list_input_files(&input_dir)?;
        if files.is_empty() {
            warn!(input_dir = %input_dir.display(), "输入目录中没有普查表");
        }
        Ok(self.batch_format(files).await)
    }
}
