// ==========================================
// 1895 农业普查单位归一化 - 命令行入口
// ==========================================
// 子命令: run / parse / show-config / ledger
// 退出码: 仅配置错误返回非零，单文件失败体现在汇总中
// ==========================================

use anyhow::{Context, Result};
use censo_normalizer::config::{ConfigOverrides, PipelineConfig, Revision};
use censo_normalizer::domain::{FileReport, McFactorPolicy, RescanPolicy, RunSummary, TokenOrder};
use censo_normalizer::engine::UnitTokenParser;
use censo_normalizer::importer::{CensusFormatter, CensusFormatterImpl};
use censo_normalizer::repository::{LedgerEntry, RunLedgerRepository};
use censo_normalizer::{logging, APP_NAME, VERSION};
use clap::{Args, Parser, Subcommand, ValueEnum};
use std::path::{Path, PathBuf};
use tracing::{info, warn};

#[derive(Parser)]
#[command(name = "censo-normalizer")]
#[command(about = "1895 年阿根廷农业普查表格的单位归一化（格式化阶段）")]
#[command(version)]
struct Cli {
    /// 以 JSON 格式输出日志
    #[arg(long, global = true)]
    log_json: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// 格式化输入目录下的全部普查表
    Run(ConfigArgs),
    /// 解析单元格文本并打印换算结果
    Parse {
        /// 待解析的单元格文本
        #[arg(required = true)]
        values: Vec<String>,
        #[arg(long, value_enum, default_value = "longest-first")]
        token_order: TokenOrderArg,
    },
    /// 打印合并后的配置（TOML）
    ShowConfig(ConfigArgs),
    /// 查询运行台账
    Ledger(LedgerArgs),
}

#[derive(Args, Debug, Clone, Default)]
struct ConfigArgs {
    /// TOML 配置文件
    #[arg(long)]
    config: Option<PathBuf>,
    /// 流水线版本预设（v2 / v3）
    #[arg(long)]
    revision: Option<Revision>,
    /// 输入目录
    #[arg(long)]
    input: Option<PathBuf>,
    /// 输出目录
    #[arg(long)]
    output: Option<PathBuf>,
    /// 变换列，逗号分隔（例如 2,4,5）
    #[arg(long, value_delimiter = ',')]
    transform_columns: Option<Vec<usize>>,
    #[arg(long, value_enum)]
    mc_policy: Option<McPolicyArg>,
    #[arg(long, value_enum)]
    rescan: Option<RescanArg>,
    #[arg(long, value_enum)]
    token_order: Option<TokenOrderArg>,
    /// 并发处理的文件数
    #[arg(long)]
    max_parallel: Option<usize>,
    /// 运行台账 SQLite 文件
    #[arg(long)]
    ledger: Option<PathBuf>,
    /// 使用默认位置的运行台账
    #[arg(long, conflicts_with = "ledger")]
    ledger_default: bool,
}

#[derive(Args, Debug)]
struct LedgerArgs {
    /// 运行台账 SQLite 文件（缺省为默认位置）
    #[arg(long)]
    ledger: Option<PathBuf>,
    /// 只列出指定运行
    #[arg(long)]
    run: Option<String>,
    /// 最近失败记录条数
    #[arg(long, default_value_t = 20)]
    limit: usize,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum McPolicyArg {
    RowLevel,
    PerCell,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum RescanArg {
    Historical,
    TransformColumns,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum TokenOrderArg {
    LongestFirst,
    Listed,
}

impl From<McPolicyArg> for McFactorPolicy {
    fn from(arg: McPolicyArg) -> Self {
        match arg {
            McPolicyArg::RowLevel => McFactorPolicy::RowLevel,
            McPolicyArg::PerCell => McFactorPolicy::PerCell,
        }
    }
}

impl From<RescanArg> for RescanPolicy {
    fn from(arg: RescanArg) -> Self {
        match arg {
            RescanArg::Historical => RescanPolicy::Historical,
            RescanArg::TransformColumns => RescanPolicy::TransformColumnsOnly,
        }
    }
}

impl From<TokenOrderArg> for TokenOrder {
    fn from(arg: TokenOrderArg) -> Self {
        match arg {
            TokenOrderArg::LongestFirst => TokenOrder::LongestFirst,
            TokenOrderArg::Listed => TokenOrder::Listed,
        }
    }
}

/// 默认台账位置: <data_local_dir>/censo-normalizer/ledger.db
fn default_ledger_path() -> Result<PathBuf> {
    let base = dirs::data_local_dir().context("无法确定本地数据目录")?;
    Ok(base.join(APP_NAME).join("ledger.db"))
}

impl ConfigArgs {
    fn overrides(&self) -> Result<ConfigOverrides> {
        let ledger_path = match (&self.ledger, self.ledger_default) {
            (Some(path), _) => Some(path.clone()),
            (None, true) => Some(default_ledger_path()?),
            (None, false) => None,
        };
        Ok(ConfigOverrides {
            input_dir: self.input.clone(),
            output_dir: self.output.clone(),
            revision: self.revision,
            transform_columns: self.transform_columns.clone(),
            mc_factor_policy: self.mc_policy.map(Into::into),
            rescan_policy: self.rescan.map(Into::into),
            token_order: self.token_order.map(Into::into),
            max_parallel_files: self.max_parallel,
            ledger_path,
            ..Default::default()
        })
    }

    fn load(&self) -> Result<PipelineConfig> {
        let config = PipelineConfig::load(self.config.as_deref(), self.overrides()?)
            .context("配置加载失败")?;
        Ok(config)
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    if cli.log_json {
        logging::init_json();
    } else {
        logging::init();
    }

    match cli.command {
        Commands::Run(args) => run(&args).await,
        Commands::Parse {
            values,
            token_order,
        } => {
            parse_values(&values, token_order.into());
            Ok(())
        }
        Commands::ShowConfig(args) => {
            let config = args.load()?;
            print!("{}", config.to_toml().context("配置序列化失败")?);
            Ok(())
        }
        Commands::Ledger(args) => show_ledger(&args),
    }
}

async fn run(args: &ConfigArgs) -> Result<()> {
    let config = args.load()?;
    info!(
        version = VERSION,
        revision = %config.revision,
        input = %config.input_dir.display(),
        output = %config.output_dir.display(),
        mc_policy = %config.mc_factor_policy,
        rescan = %config.rescan_policy,
        "开始格式化"
    );

    let ledger_path = config.ledger_path.clone();
    let formatter = CensusFormatterImpl::new(config);
    let summary = formatter
        .format_directory()
        .await
        .context("无法读取输入目录")?;

    print_summary(&summary);

    if let Some(path) = ledger_path {
        record_ledger(&path, &summary);
    }
    Ok(())
}

/// 写入运行台账（失败只记录警告）
fn record_ledger(path: &Path, summary: &RunSummary) {
    let result = RunLedgerRepository::open(path).and_then(|repo| repo.record_summary(summary));
    match result {
        Ok(count) => info!(ledger = %path.display(), records = count, "运行台账已写入"),
        Err(e) => warn!(ledger = %path.display(), error = %e, "运行台账写入失败"),
    }
}

fn print_summary(summary: &RunSummary) {
    println!("运行 {} ({})", summary.run_id, summary.started_at.format("%Y-%m-%d %H:%M:%S"));
    for report in &summary.reports {
        print_report(report);
    }
    println!(
        "合计: 处理 {} / 跳过 {} / 失败 {}",
        summary.processed(),
        summary.skipped(),
        summary.failed()
    );
}

fn print_report(report: &FileReport) {
    match &report.message {
        Some(message) => println!("  [{}] {}: {}", report.status, report.file_name, message),
        None => println!(
            "  [{}] {}: 写出 {} 行, 换算 {} 格, 无法解析 {} 格, 删除空行 {} / 含 '?' 行 {}",
            report.status,
            report.file_name,
            report.rows_written,
            report.conversions,
            report.coercion_failures,
            report.rows_blank_dropped,
            report.rows_question_dropped
        ),
    }
}

fn parse_values(values: &[String], order: TokenOrder) {
    let parser = UnitTokenParser::new(order);
    for value in values {
        match parser.parse(value) {
            Ok(parsed) => println!(
                "{:?} -> {} (记号: {})",
                value,
                parsed.value,
                parsed.token.unwrap_or("-")
            ),
            Err(failure) => println!("{:?} -> 无法解析: {}", value, failure),
        }
    }
}

fn show_ledger(args: &LedgerArgs) -> Result<()> {
    let path = match &args.ledger {
        Some(path) => path.clone(),
        None => default_ledger_path()?,
    };
    let repo = RunLedgerRepository::open(&path)
        .with_context(|| format!("无法打开运行台账 {}", path.display()))?;

    let entries = match &args.run {
        Some(run_id) => repo.list_run(run_id)?,
        None => repo.recent_failures(args.limit)?,
    };
    if entries.is_empty() {
        println!("台账中没有匹配的记录");
    }
    for entry in &entries {
        print_entry(entry);
    }
    Ok(())
}

fn print_entry(entry: &LedgerEntry) {
    println!(
        "{} {} [{}] {} 行写出 {}{}",
        entry.recorded_at.format("%Y-%m-%d %H:%M:%S"),
        entry.run_id,
        entry.status,
        entry.file_name,
        entry.rows_written,
        entry
            .message
            .as_ref()
            .map(|m| format!(" ({})", m))
            .unwrap_or_default()
    );
}
