// ==========================================
// 配置加载与运行台账集成测试
// ==========================================
// 测试目标: TOML 配置 + 命令行覆写优先级；批处理结果写入台账后可查询
// ==========================================


use censo_normalizer::config::{ConfigOverrides, PipelineConfig, Revision};
use censo_normalizer::domain::{FileStatus, McFactorPolicy, RescanPolicy};
use censo_normalizer::importer::{CensusFormatter, CensusFormatterImpl};
use censo_normalizer::repository::RunLedgerRepository;
use std::io::Write;
use tempfile::NamedTempFile;
use test_helpers::{TestWorkspace, V2_HEADER};

#[test]
fn test_load_toml_then_cli_overrides() {
    let mut config_file = NamedTempFile::new().unwrap();
    writeln!(
        config_file,
        r#"
input_dir = "/datos/censo1895/entrada"
output_dir = "/datos/censo1895/salida"
revision = "v2"
rescan_policy = "historical"
max_parallel_files = 2
"#
    )
    .unwrap();

    let cli = ConfigOverrides {
        output_dir: Some("/tmp/salida".into()),
        mc_factor_policy: Some(McFactorPolicy::PerCell),
        ..Default::default()
    };
    let config = PipelineConfig::load(Some(config_file.path()), cli).unwrap();

    assert_eq!(config.revision, Revision::V2);
    assert_eq!(config.input_dir.to_str(), Some("/datos/censo1895/entrada"));
    assert_eq!(config.output_dir.to_str(), Some("/tmp/salida"));
    assert_eq!(config.rescan_policy, RescanPolicy::Historical);
    assert_eq!(config.mc_factor_policy, McFactorPolicy::PerCell);
    assert_eq!(config.max_parallel_files, 2);
}

#[test]
fn test_load_rejects_malformed_toml() {
    let mut config_file = NamedTempFile::new().unwrap();
    writeln!(config_file, "revision = ").unwrap();

    assert!(PipelineConfig::load(Some(config_file.path()), ConfigOverrides::default()).is_err());
}

#[test]
fn test_resolved_config_round_trips_through_toml() {
    let ws = TestWorkspace::new();
    let config = ws.config(ConfigOverrides::default());

    let rendered = config.to_toml().unwrap();
    let reparsed: PipelineConfig = toml::from_str(&rendered).unwrap();

    assert_eq!(reparsed, config);
}

#[tokio::test]
async fn test_batch_summary_recorded_in_ledger() {
    let ws = TestWorkspace::new();
    ws.write_csv("a.csv", &[V2_HEADER, "Juan Pérez,a,5,CC,1,1,1"]);
    ws.write_csv("b.csv", &["Titular", "Ana Gómez"]);

    let formatter = CensusFormatterImpl::new(ws.config(ConfigOverrides {
        revision: Some(Revision::V2),
        transform_columns: Some(vec![2, 4, 5, 6]),
        question_check_columns: Some(vec![2]),
        ..Default::default()
    }));
    let summary = formatter.format_directory().await.unwrap();

    let ledger_dir = tempfile::tempdir().unwrap();
    let repo = RunLedgerRepository::open(&ledger_dir.path().join("ledger.db")).unwrap();
    assert_eq!(repo.record_summary(&summary).unwrap(), 2);

    let entries = repo.list_run(&summary.run_id).unwrap();
    assert_eq!(entries.len(), 2);
    assert_eq!(entries[0].file_name, "a.csv");
    assert_eq!(entries[0].status, FileStatus::Processed);
    assert_eq!(entries[0].filter_stages.len(), 6);

    let failures = repo.recent_failures(5).unwrap();
    assert_eq!(failures.len(), 1);
    assert_eq!(failures[0].file_name, "b.csv");
    assert_eq!(failures[0].status, FileStatus::SchemaMismatch);
}
