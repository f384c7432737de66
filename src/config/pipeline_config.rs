// ==========================================
// 1895 农业普查单位归一化 - 流水线配置
// ==========================================
// 优先级: 命令行 > 配置文件(TOML) > 版本预设 > 默认值
// 职责: 输入/输出目录、列位置、换算策略的外部化配置
// 红线: 列位置不在变换逻辑中硬编码
// ==========================================

use crate::config::error::{ConfigError, ConfigResult};
use crate::config::revision::Revision;
use crate::domain::census::ColumnLayout;
use crate::domain::types::{McFactorPolicy, RescanPolicy, TokenOrder};
use crate::engine::normalizer::NormalizerSettings;
use crate::engine::row_filters::CultivationThresholds;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

/// 默认并发处理文件数
pub const DEFAULT_MAX_PARALLEL_FILES: usize = 4;

// ==========================================
// LayoutOverrides - 列位置覆写
// ==========================================
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct LayoutOverrides {
    pub holder_column: Option<usize>,
    pub tenure_column: Option<usize>,
    /// false 表示不做经营方式首字母提取
    pub extract_tenure: Option<bool>,
    pub unit_indicator_column: Option<usize>,
    pub extension_column: Option<usize>,
}

// ==========================================
// ConfigOverrides - 可覆写配置（TOML 文件 / 命令行）
// ==========================================
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ConfigOverrides {
    pub input_dir: Option<PathBuf>,
    pub output_dir: Option<PathBuf>,
    pub revision: Option<Revision>,
    pub transform_columns: Option<Vec<usize>>,
    pub question_check_columns: Option<Vec<usize>>,
    pub crop_columns: Option<Vec<usize>>,
    pub crop_min: Option<f64>,
    pub extension_min: Option<f64>,
    pub drop_leading_columns: Option<usize>,
    pub drop_columns_named: Option<Vec<String>>,
    pub output_headers: Option<Vec<String>>,
    pub mc_factor_policy: Option<McFactorPolicy>,
    pub rescan_policy: Option<RescanPolicy>,
    pub token_order: Option<TokenOrder>,
    pub blank_unparsed: Option<bool>,
    pub write_error_mask: Option<bool>,
    pub max_parallel_files: Option<usize>,
    pub ledger_path: Option<PathBuf>,
    pub layout: LayoutOverrides,
}

macro_rules! prefer {
    ($higher:ident, $lower:ident, $($field:ident),+ $(,)?) => {
        $( $lower.$field = $higher.$field.or($lower.$field); )+
    };
}

impl ConfigOverrides {
    /// 从 TOML 文件读取
    pub fn from_file(path: &Path) -> ConfigResult<Self> {
        let content = fs::read_to_string(path).map_err(|e| ConfigError::Read {
            path: path.display().to_string(),
            message: e.to_string(),
        })?;
        Self::from_toml_str(&content).map_err(|e| match e {
            ConfigError::Parse { message, .. } => ConfigError::Parse {
                path: path.display().to_string(),
                message,
            },
            other => other,
        })
    }

    pub fn from_toml_str(content: &str) -> ConfigResult<Self> {
        toml::from_str(content).map_err(|e| ConfigError::Parse {
            path: "<inline>".to_string(),
            message: e.to_string(),
        })
    }

    /// 合并：higher 中的 Some 覆盖 self
    pub fn merge(mut self, higher: ConfigOverrides) -> ConfigOverrides {
        let mut lower_layout = self.layout;
        let higher_layout = higher.layout;
        prefer!(
            higher_layout,
            lower_layout,
            holder_column,
            tenure_column,
            extract_tenure,
            unit_indicator_column,
            extension_column,
        );
        prefer!(
            higher,
            self,
            input_dir,
            output_dir,
            revision,
            transform_columns,
            question_check_columns,
            crop_columns,
            crop_min,
            extension_min,
            drop_leading_columns,
            drop_columns_named,
            output_headers,
            mc_factor_policy,
            rescan_policy,
            token_order,
            blank_unparsed,
            write_error_mask,
            max_parallel_files,
            ledger_path,
        );
        self.layout = lower_layout;
        self
    }
}

// ==========================================
// PipelineConfig - 解析后的完整配置
// ==========================================
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PipelineConfig {
    pub input_dir: PathBuf,
    pub output_dir: PathBuf,
    pub revision: Revision,
    pub transform_columns: Vec<usize>,
    pub question_check_columns: Vec<usize>,
    pub drop_leading_columns: usize,
    pub drop_columns_named: Vec<String>,
    pub output_headers: Vec<String>,
    pub mc_factor_policy: McFactorPolicy,
    pub rescan_policy: RescanPolicy,
    pub token_order: TokenOrder,
    pub blank_unparsed: bool,
    pub write_error_mask: bool,
    pub max_parallel_files: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ledger_path: Option<PathBuf>,
    pub layout: ColumnLayout,
    pub cultivation: CultivationThresholds,
}

impl PipelineConfig {
    /// 加载配置
    ///
    /// # 参数
    /// - config_file: 可选 TOML 配置文件
    /// - cli: 命令行覆写（优先级最高）
    pub fn load(config_file: Option<&Path>, cli: ConfigOverrides) -> ConfigResult<Self> {
        let file_overrides = match config_file {
            Some(path) => {
                debug!(path = %path.display(), "读取配置文件");
                ConfigOverrides::from_file(path)?
            }
            None => ConfigOverrides::default(),
        };
        Self::resolve(file_overrides.merge(cli))
    }

    /// 在版本预设上应用覆写并校验
    pub fn resolve(overrides: ConfigOverrides) -> ConfigResult<Self> {
        let revision = overrides.revision.unwrap_or_default();
        let preset = revision.preset();

        let layout_overrides = overrides.layout;
        let tenure_column = match layout_overrides.extract_tenure {
            Some(false) => None,
            _ => layout_overrides.tenure_column.or(preset.layout.tenure_column),
        };
        let layout = ColumnLayout {
            holder_column: layout_overrides
                .holder_column
                .unwrap_or(preset.layout.holder_column),
            tenure_column,
            unit_indicator_column: layout_overrides
                .unit_indicator_column
                .unwrap_or(preset.layout.unit_indicator_column),
            extension_column: layout_overrides
                .extension_column
                .unwrap_or(preset.layout.extension_column),
        };

        let cultivation = CultivationThresholds {
            crop_columns: overrides
                .crop_columns
                .unwrap_or(preset.cultivation.crop_columns),
            crop_min: overrides.crop_min.unwrap_or(preset.cultivation.crop_min),
            extension_min: overrides
                .extension_min
                .unwrap_or(preset.cultivation.extension_min),
        };

        let config = PipelineConfig {
            input_dir: overrides.input_dir.unwrap_or_default(),
            output_dir: overrides.output_dir.unwrap_or_default(),
            revision,
            transform_columns: overrides
                .transform_columns
                .unwrap_or(preset.transform_columns),
            question_check_columns: overrides
                .question_check_columns
                .unwrap_or(preset.question_check_columns),
            drop_leading_columns: overrides
                .drop_leading_columns
                .unwrap_or(preset.drop_leading_columns),
            drop_columns_named: overrides
                .drop_columns_named
                .unwrap_or(preset.drop_columns_named),
            output_headers: overrides.output_headers.unwrap_or(preset.output_headers),
            mc_factor_policy: overrides.mc_factor_policy.unwrap_or_default(),
            rescan_policy: overrides.rescan_policy.unwrap_or_default(),
            token_order: overrides.token_order.unwrap_or_default(),
            blank_unparsed: overrides.blank_unparsed.unwrap_or(true),
            write_error_mask: overrides.write_error_mask.unwrap_or(true),
            max_parallel_files: overrides
                .max_parallel_files
                .unwrap_or(DEFAULT_MAX_PARALLEL_FILES),
            ledger_path: overrides.ledger_path,
            layout,
            cultivation,
        };

        config.validate()?;
        Ok(config)
    }

    /// 校验配置
    pub fn validate(&self) -> ConfigResult<()> {
        if self.input_dir.as_os_str().is_empty() {
            return Err(ConfigError::invalid("input_dir", "未配置输入目录"));
        }
        if self.output_dir.as_os_str().is_empty() {
            return Err(ConfigError::invalid("output_dir", "未配置输出目录"));
        }
        if self.max_parallel_files == 0 {
            return Err(ConfigError::invalid("max_parallel_files", "必须 ≥ 1"));
        }
        if self.transform_columns.is_empty() {
            return Err(ConfigError::invalid("transform_columns", "变换列不能为空"));
        }
        if self
            .transform_columns
            .contains(&self.layout.unit_indicator_column)
        {
            return Err(ConfigError::invalid(
                "transform_columns",
                format!(
                    "变换列不能包含单位标记列 {}",
                    self.layout.unit_indicator_column
                ),
            ));
        }
        if self.layout.tenure_column == Some(self.layout.unit_indicator_column) {
            warn!(
                column = self.layout.unit_indicator_column,
                "经营方式列与单位标记列相同，首字母提取推迟到单位换算之后"
            );
        }
        Ok(())
    }

    /// 引擎层所需的归一化设置
    pub fn normalizer_settings(&self) -> NormalizerSettings {
        NormalizerSettings {
            layout: self.layout.clone(),
            transform_columns: self.transform_columns.clone(),
            mc_factor_policy: self.mc_factor_policy,
            rescan_policy: self.rescan_policy,
            token_order: self.token_order,
        }
    }

    /// 导出为 TOML（show-config 命令）
    pub fn to_toml(&self) -> ConfigResult<String> {
        Ok(toml::to_string_pretty(self)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn dirs() -> ConfigOverrides {
        ConfigOverrides {
            input_dir: Some(PathBuf::from("input")),
            output_dir: Some(PathBuf::from("output")),
            ..Default::default()
        }
    }

    #[test]
    fn test_resolve_defaults_to_v3() {
        let config = PipelineConfig::resolve(dirs()).unwrap();
        assert_eq!(config.revision, Revision::V3);
        assert_eq!(config.transform_columns, vec![2, 4, 5, 6, 7, 8]);
        assert_eq!(config.mc_factor_policy, McFactorPolicy::RowLevel);
        assert_eq!(config.rescan_policy, RescanPolicy::TransformColumnsOnly);
        assert_eq!(config.max_parallel_files, DEFAULT_MAX_PARALLEL_FILES);
        assert!(config.blank_unparsed);
    }

    #[test]
    fn test_toml_overrides_preset() {
        let file = ConfigOverrides::from_toml_str(
            r#"
            revision = "v2"
            transform_columns = [2, 4, 5]
            mc_factor_policy = "per-cell"

            [layout]
            unit_indicator_column = 1
            extract_tenure = false
            "#,
        )
        .unwrap();
        let config = PipelineConfig::resolve(file.merge(dirs())).unwrap();

        assert_eq!(config.revision, Revision::V2);
        assert_eq!(config.transform_columns, vec![2, 4, 5]);
        assert_eq!(config.mc_factor_policy, McFactorPolicy::PerCell);
        assert_eq!(config.layout.unit_indicator_column, 1);
        assert_eq!(config.layout.tenure_column, None);
        assert_eq!(config.drop_columns_named, vec!["cuartel".to_string()]);
    }

    #[test]
    fn test_cli_wins_over_file() {
        let file = ConfigOverrides {
            input_dir: Some(PathBuf::from("from_file")),
            max_parallel_files: Some(2),
            ..dirs()
        };
        let cli = ConfigOverrides {
            input_dir: Some(PathBuf::from("from_cli")),
            ..Default::default()
        };
        let merged = file.merge(cli);
        assert_eq!(merged.input_dir, Some(PathBuf::from("from_cli")));
        assert_eq!(merged.max_parallel_files, Some(2));
    }

    #[test]
    fn test_unknown_field_rejected() {
        assert!(ConfigOverrides::from_toml_str("input_directory = \"x\"").is_err());
    }

    #[test]
    fn test_missing_dirs_rejected() {
        let err = PipelineConfig::resolve(ConfigOverrides::default()).unwrap_err();
        assert!(matches!(err, ConfigError::Invalid { ref key, .. } if key == "input_dir"));
    }

    #[test]
    fn test_indicator_in_transform_columns_rejected() {
        let overrides = ConfigOverrides {
            transform_columns: Some(vec![2, 3]),
            ..dirs()
        };
        assert!(PipelineConfig::resolve(overrides).is_err());
    }

    #[test]
    fn test_zero_parallelism_rejected() {
        let overrides = ConfigOverrides {
            max_parallel_files: Some(0),
            ..dirs()
        };
        assert!(PipelineConfig::resolve(overrides).is_err());
    }

    #[test]
    fn test_to_toml_contains_policies() {
        let config = PipelineConfig::resolve(dirs()).unwrap();
        let rendered = config.to_toml().unwrap();
        assert!(rendered.contains("mc_factor_policy = \"row-level\""));
        assert!(rendered.contains("[layout]"));
    }
}
