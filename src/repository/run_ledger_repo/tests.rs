use super::RunLedgerRepository;
use crate::domain::report::{FileReport, FileStatus, FilterStageCount, RunSummary};
use chrono::Utc;

fn processed_report(run_id: &str, file_name: &str) -> FileReport {
    let mut report = FileReport::failure(run_id, file_name, FileStatus::Processed, "");
    report.message = None;
    report.rows_read = 10;
    report.rows_written = 8;
    report.conversions = 5;
    report.coercion_failures = 1;
    report.filter_stages = vec![
        FilterStageCount {
            stage: "0_tabla_original".to_string(),
            rows: 8,
        },
        FilterStageCount {
            stage: "1_filtro_titular_(nonulo)".to_string(),
            rows: 7,
        },
    ];
    report.output_path = Some(format!("out/{file_name}"));
    report.elapsed_ms = 12;
    report
}

#[test]
fn test_record_report_and_list_run() {
    let repo = RunLedgerRepository::open_in_memory().unwrap();

    let id = repo.record_report(&processed_report("run-1", "b.csv")).unwrap();
    assert!(id > 0);
    repo.record_report(&processed_report("run-1", "a.csv")).unwrap();
    repo.record_report(&processed_report("run-2", "c.csv")).unwrap();

    let entries = repo.list_run("run-1").unwrap();
    assert_eq!(entries.len(), 2);
    assert_eq!(entries[0].file_name, "a.csv");
    assert_eq!(entries[0].status, FileStatus::Processed);
    assert_eq!(entries[0].rows_written, 8);
    assert_eq!(entries[0].filter_stages.len(), 2);
    assert_eq!(entries[0].filter_stages[1].rows, 7);
    assert_eq!(entries[0].message, None);
}

#[test]
fn test_record_summary_and_recent_failures() {
    let repo = RunLedgerRepository::open_in_memory().unwrap();
    let summary = RunSummary {
        run_id: "run-9".to_string(),
        started_at: Utc::now(),
        reports: vec![
            processed_report("run-9", "a.csv"),
            FileReport::failure("run-9", "b.csv", FileStatus::SchemaMismatch, "缺少单位标记列"),
            FileReport::failure("run-9", "c.xlsx", FileStatus::ReadFailed, "文件损坏"),
        ],
    };

    assert_eq!(repo.record_summary(&summary).unwrap(), 3);

    let failures = repo.recent_failures(10).unwrap();
    assert_eq!(failures.len(), 2);
    // 新记录在前
    assert_eq!(failures[0].file_name, "c.xlsx");
    assert_eq!(failures[0].status, FileStatus::ReadFailed);
    assert_eq!(failures[1].message.as_deref(), Some("缺少单位标记列"));

    assert_eq!(repo.recent_failures(1).unwrap().len(), 1);
    assert_eq!(repo.recent_runs(5).unwrap(), vec!["run-9".to_string()]);
}

#[test]
fn test_open_file_ledger_persists_across_connections() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("nested").join("ledger.db");

    {
        let repo = RunLedgerRepository::open(&path).unwrap();
        repo.record_report(&processed_report("run-1", "a.csv")).unwrap();
    }

    let reopened = RunLedgerRepository::open(&path).unwrap();
    let entries = reopened.list_run("run-1").unwrap();
    assert_eq!(entries.len(), 1);
    assert_eq!(entries[0].output_path.as_deref(), Some("out/a.csv"));
}
