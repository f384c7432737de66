// ==========================================
// 1895 农业普查单位归一化 - 流水线版本预设
// ==========================================
// 两个历史版本的列位置差异（是否删除前导 cuartel 列）
// 预设只给出列位置与表头，策略类配置使用默认值
// ==========================================

use crate::config::error::ConfigError;
use crate::domain::census::ColumnLayout;
use crate::engine::row_filters::CultivationThresholds;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Revision {
    /// 按表头名删除 cuartel，变换列 2 与 7..=17
    V2,
    /// 删除第一列，变换列 2 与 4..=8，输出使用固定表头
    #[default]
    V3,
}

/// v3 输出表头（西班牙语原始列名）
pub const V3_OUTPUT_HEADERS: [&str; 16] = [
    "Titular",
    "La explota el propietario, arrendatario o mediero",
    "Extensión total de las tierras dedicadas a labranza",
    "medida",
    "Trigo",
    "Maíz",
    "Lino",
    "Cebada",
    "Alfalfa",
    "Arados",
    "Maquinas de segar",
    "Rastrillos",
    "Trilladoras a vapor",
    "Maquinas a vapor",
    "Maquinas a agua",
    "Bombas",
];

/// 版本预设
#[derive(Debug, Clone, PartialEq)]
pub struct RevisionPreset {
    pub layout: ColumnLayout,
    pub transform_columns: Vec<usize>,
    pub question_check_columns: Vec<usize>,
    pub drop_leading_columns: usize,
    pub drop_columns_named: Vec<String>,
    pub output_headers: Vec<String>,
    pub cultivation: CultivationThresholds,
}

impl Revision {
    pub fn preset(self) -> RevisionPreset {
        match self {
            Revision::V2 => {
                let transform: Vec<usize> = std::iter::once(2).chain(7..=17).collect();
                RevisionPreset {
                    layout: ColumnLayout::default(),
                    question_check_columns: transform.clone(),
                    transform_columns: transform,
                    drop_leading_columns: 0,
                    drop_columns_named: vec!["cuartel".to_string()],
                    output_headers: Vec::new(),
                    cultivation: CultivationThresholds::default(),
                }
            }
            Revision::V3 => RevisionPreset {
                layout: ColumnLayout::default(),
                transform_columns: std::iter::once(2).chain(4..=8).collect(),
                question_check_columns: std::iter::once(2).chain(4..=15).collect(),
                drop_leading_columns: 1,
                drop_columns_named: Vec::new(),
                output_headers: V3_OUTPUT_HEADERS.iter().map(|h| h.to_string()).collect(),
                cultivation: CultivationThresholds::default(),
            },
        }
    }
}

impl fmt::Display for Revision {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Revision::V2 => write!(f, "v2"),
            Revision::V3 => write!(f, "v3"),
        }
    }
}

impl FromStr for Revision {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "v2" | "2" => Ok(Revision::V2),
            "v3" | "3" => Ok(Revision::V3),
            other => Err(ConfigError::UnknownRevision(other.to_string())),
        }
    }
}
