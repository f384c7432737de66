// ==========================================
// 1895 农业普查单位归一化 - 领域类型定义
// ==========================================
// 职责: 单位标记、经营方式代码、可选择的历史版本策略
// ==========================================

use serde::{Deserialize, Serialize};
use std::fmt;

// ==========================================
// 行级单位标记 (Unit Indicator)
// ==========================================
// 取值来自单位标记列（精确匹配，区分大小写）
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum UnitIndicator {
    Cc,              // CC: 旧制面积单位（× 1.68）
    Meters,          // M: 米制记号（÷ 1000）
    SquareMeterCode, // MC: 平方米记号（÷ 10000 或 ÷ 1000，见 McFactorPolicy）
    Hectares,        // H: 公顷（规范单位）
    Other(String),   // 其他：经营方式代码或未知记号，不做换算
}

impl UnitIndicator {
    pub fn parse(raw: &str) -> Self {
        match raw.trim() {
            "CC" => UnitIndicator::Cc,
            "M" => UnitIndicator::Meters,
            "MC" => UnitIndicator::SquareMeterCode,
            "H" => UnitIndicator::Hectares,
            other => UnitIndicator::Other(other.to_string()),
        }
    }

    /// 行级换算（None 表示该标记不触发换算）
    pub fn scale(&self, mc_policy: McFactorPolicy) -> Option<Scale> {
        match self {
            UnitIndicator::Cc => Some(Scale::Multiply(1.68)),
            UnitIndicator::Meters => Some(Scale::Divide(1000.0)),
            UnitIndicator::SquareMeterCode => Some(mc_policy.scale()),
            UnitIndicator::Hectares | UnitIndicator::Other(_) => None,
        }
    }
}

impl fmt::Display for UnitIndicator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            UnitIndicator::Cc => write!(f, "CC"),
            UnitIndicator::Meters => write!(f, "M"),
            UnitIndicator::SquareMeterCode => write!(f, "MC"),
            UnitIndicator::Hectares => write!(f, "H"),
            UnitIndicator::Other(s) => write!(f, "{}", s),
        }
    }
}

// ==========================================
// 换算 (Scale)
// ==========================================
// 保留乘/除两种形式：x / 1000 与 x * 0.001 的浮点结果不同
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum Scale {
    Multiply(f64),
    Divide(f64),
}

impl Scale {
    pub fn apply(self, value: f64) -> f64 {
        match self {
            Scale::Multiply(factor) => value * factor,
            Scale::Divide(divisor) => value / divisor,
        }
    }
}

// ==========================================
// 经营方式 (Tenure Code)
// ==========================================
// A = 所有者自营, M = 承租, P = 分成佃农
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TenureCode {
    Owner,
    Tenant,
    Sharecropper,
}

impl TenureCode {
    /// 解析经营方式代码（不区分大小写）
    pub fn parse(raw: &str) -> Option<Self> {
        match raw.trim().to_uppercase().as_str() {
            "A" => Some(TenureCode::Owner),
            "M" => Some(TenureCode::Tenant),
            "P" => Some(TenureCode::Sharecropper),
            _ => None,
        }
    }
}

impl fmt::Display for TenureCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TenureCode::Owner => write!(f, "A"),
            TenureCode::Tenant => write!(f, "M"),
            TenureCode::Sharecropper => write!(f, "P"),
        }
    }
}

// ==========================================
// MC 换算系数策略
// ==========================================
// 同一记号 MC 在两条历史逻辑路径上系数不同:
// - 行级标记路径: ÷ 10000
// - 单元格记号路径: ÷ 1000
// 本策略只作用于行级标记路径，单元格记号路径始终 ÷ 1000
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum McFactorPolicy {
    #[default]
    RowLevel, // ÷ 10000
    PerCell,  // ÷ 1000
}

impl McFactorPolicy {
    pub fn scale(self) -> Scale {
        match self {
            McFactorPolicy::RowLevel => Scale::Divide(10000.0),
            McFactorPolicy::PerCell => Scale::Divide(1000.0),
        }
    }
}

impl fmt::Display for McFactorPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            McFactorPolicy::RowLevel => write!(f, "row-level"),
            McFactorPolicy::PerCell => write!(f, "per-cell"),
        }
    }
}

// ==========================================
// 二次逐格扫描策略
// ==========================================
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum RescanPolicy {
    /// 扫描整行所有文本单元格（单位标记列除外），与历史输出一致
    Historical,
    /// 只扫描变换列，户主姓名等文本列不会被改写
    #[default]
    TransformColumnsOnly,
}

impl fmt::Display for RescanPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RescanPolicy::Historical => write!(f, "historical"),
            RescanPolicy::TransformColumnsOnly => write!(f, "transform-columns"),
        }
    }
}

// ==========================================
// 单位记号扫描顺序
// ==========================================
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum TokenOrder {
    /// 长记号优先: METROS, 1 1/2, 1/2, MC, CC, cc, mt, H, h, M, m
    #[default]
    LongestFirst,
    /// 记号表原始列出顺序: MC, H, h, 1/2, 1 1/2, CC, cc, METROS, M, m, mt
    Listed,
}

impl fmt::Display for TokenOrder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TokenOrder::LongestFirst => write!(f, "longest-first"),
            TokenOrder::Listed => write!(f, "listed"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unit_indicator_parse() {
        assert_eq!(UnitIndicator::parse("CC"), UnitIndicator::Cc);
        assert_eq!(UnitIndicator::parse(" M "), UnitIndicator::Meters);
        assert_eq!(UnitIndicator::parse("MC"), UnitIndicator::SquareMeterCode);
        assert_eq!(UnitIndicator::parse("H"), UnitIndicator::Hectares);
        assert_eq!(UnitIndicator::parse("cc"), UnitIndicator::Other("cc".to_string()));
    }

    #[test]
    fn test_mc_factor_policy() {
        let mc = UnitIndicator::SquareMeterCode;
        assert_eq!(mc.scale(McFactorPolicy::RowLevel), Some(Scale::Divide(10000.0)));
        assert_eq!(mc.scale(McFactorPolicy::PerCell), Some(Scale::Divide(1000.0)));
        assert_eq!(UnitIndicator::Hectares.scale(McFactorPolicy::RowLevel), None);
        assert_eq!(Scale::Multiply(1.68).apply(5.0), 8.4);
        assert_eq!(Scale::Divide(1000.0).apply(2.0), 0.002);
    }

    #[test]
    fn test_tenure_code_parse() {
        assert_eq!(TenureCode::parse("a"), Some(TenureCode::Owner));
        assert_eq!(TenureCode::parse("M"), Some(TenureCode::Tenant));
        assert_eq!(TenureCode::parse("p"), Some(TenureCode::Sharecropper));
        assert_eq!(TenureCode::parse("X"), None);
        assert_eq!(TenureCode::Sharecropper.to_string(), "P");
    }

    #[test]
    fn test_policy_serde_kebab_case() {
        let json = serde_json::to_string(&McFactorPolicy::PerCell).unwrap();
        assert_eq!(json, "\"per-cell\"");
        let policy: RescanPolicy = serde_json::from_str("\"historical\"").unwrap();
        assert_eq!(policy, RescanPolicy::Historical);
    }
}
