// ==========================================
// 1895 农业普查单位归一化 - 单位记号解析器
// ==========================================
// 职责: 单元格值 → 公顷数值
// 流程: 逗号 → 句点 → 直接数值解析 → 按固定顺序扫描单位记号表
// 红线: 记号表按显式 Vec 顺序扫描，第一个成功换算的记号生效
// ==========================================

use crate::domain::cell::CellValue;
use crate::domain::report::CoercionReason;
use crate::domain::types::{Scale, TokenOrder};
use once_cell::sync::Lazy;
use regex::Regex;
use serde::Serialize;

// ==========================================
// 记号换算方式
// ==========================================
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum TokenTransform {
    Identity,       // 已是公顷
    Scaled(Scale),  // 对前置数字做乘/除
    Constant(f64),  // 分数简写，忽略前置数字
}

impl TokenTransform {
    fn needs_number(self) -> bool {
        !matches!(self, TokenTransform::Constant(_))
    }
}

// ==========================================
// ConversionRule - (记号, 换算) 对
// ==========================================
#[derive(Debug)]
pub struct ConversionRule {
    pub token: &'static str,
    pub transform: TokenTransform,
    pattern: Regex, // (数字)(可选空白)(记号)
}

impl ConversionRule {
    fn new(token: &'static str, transform: TokenTransform) -> Self {
        let pattern = Regex::new(&format!(r"([0-9]+\.?[0-9]*)\s*{}", regex::escape(token)))
            .expect("单位记号正则由常量构造，必定合法");
        Self {
            token,
            transform,
            pattern,
        }
    }

    /// 对已规范化的字符串应用本规则
    ///
    /// # 返回
    /// - Some(f64): 换算成功
    /// - None: 记号存在但 (数字)(记号) 模式不匹配
    fn apply(&self, canonical: &str) -> Option<f64> {
        match self.transform {
            TokenTransform::Constant(value) => Some(value),
            transform => {
                let captured = self.pattern.captures(canonical)?.get(1)?.as_str();
                let x = captured.parse::<f64>().ok()?;
                match transform {
                    TokenTransform::Identity => Some(x),
                    TokenTransform::Scaled(scale) => Some(scale.apply(x)),
                    TokenTransform::Constant(value) => Some(value),
                }
            }
        }
    }
}

// ==========================================
// UnitTokenTable - 有序记号表
// ==========================================
#[derive(Debug)]
pub struct UnitTokenTable {
    rules: Vec<ConversionRule>,
}

const METERS: TokenTransform = TokenTransform::Scaled(Scale::Divide(1000.0));
const CC: TokenTransform = TokenTransform::Scaled(Scale::Multiply(1.68));

static LONGEST_FIRST: Lazy<UnitTokenTable> = Lazy::new(|| {
    UnitTokenTable::from_rules(&[
        ("METROS", METERS),
        ("1 1/2", TokenTransform::Constant(1.5)),
        ("1/2", TokenTransform::Constant(0.5)),
        ("MC", METERS),
        ("CC", CC),
        ("cc", CC),
        ("mt", METERS),
        ("H", TokenTransform::Identity),
        ("h", TokenTransform::Identity),
        ("M", METERS),
        ("m", METERS),
    ])
});

static LISTED: Lazy<UnitTokenTable> = Lazy::new(|| {
    UnitTokenTable::from_rules(&[
        ("MC", METERS),
        ("H", TokenTransform::Identity),
        ("h", TokenTransform::Identity),
        ("1/2", TokenTransform::Constant(0.5)),
        ("1 1/2", TokenTransform::Constant(1.5)),
        ("CC", CC),
        ("cc", CC),
        ("METROS", METERS),
        ("M", METERS),
        ("m", METERS),
        ("mt", METERS),
    ])
});

impl UnitTokenTable {
    fn from_rules(rules: &[(&'static str, TokenTransform)]) -> Self {
        Self {
            rules: rules
                .iter()
                .map(|(token, transform)| ConversionRule::new(token, *transform))
                .collect(),
        }
    }

    /// 获取指定顺序的共享记号表（进程内只构造一次，只读）
    pub fn shared(order: TokenOrder) -> &'static UnitTokenTable {
        match order {
            TokenOrder::LongestFirst => &LONGEST_FIRST,
            TokenOrder::Listed => &LISTED,
        }
    }

    pub fn tokens(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.rules.iter().map(|r| r.token)
    }
}

// ==========================================
// 解析结果
// ==========================================
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ParsedQuantity {
    pub value: f64,
    pub token: Option<&'static str>, // None = 直接数值，无单位
}

impl ParsedQuantity {
    pub fn converted(&self) -> bool {
        self.token.is_some()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CoercionFailure {
    pub raw: String,
    pub reason: CoercionReason,
}

impl std::fmt::Display for CoercionFailure {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "'{}': {}", self.raw, self.reason)
    }
}

impl std::error::Error for CoercionFailure {}

// ==========================================
// UnitTokenParser
// ==========================================
#[derive(Debug, Clone, Copy)]
pub struct UnitTokenParser {
    table: &'static UnitTokenTable,
}

impl Default for UnitTokenParser {
    fn default() -> Self {
        Self::new(TokenOrder::default())
    }
}

impl UnitTokenParser {
    pub fn new(order: TokenOrder) -> Self {
        Self {
            table: UnitTokenTable::shared(order),
        }
    }

    pub fn table(&self) -> &'static UnitTokenTable {
        self.table
    }

    /// 解析原始字符串
    ///
    /// # 返回
    /// - Ok(ParsedQuantity): 直接数值或记号换算结果
    /// - Err(CoercionFailure): 既非数值也无可用记号（原值原样保留在 raw 中）
    pub fn parse(&self, raw: &str) -> Result<ParsedQuantity, CoercionFailure> {
        let canonical = canonicalize(raw);

        if let Some(value) = parse_plain_number(&canonical) {
            return Ok(ParsedQuantity { value, token: None });
        }

        let mut token_without_number = None;
        for rule in &self.table.rules {
            if !canonical.contains(rule.token) {
                continue;
            }
            match rule.apply(&canonical) {
                Some(value) => {
                    return Ok(ParsedQuantity {
                        value,
                        token: Some(rule.token),
                    })
                }
                None => {
                    if rule.transform.needs_number() && token_without_number.is_none() {
                        token_without_number = Some(rule.token);
                    }
                }
            }
        }

        Err(CoercionFailure {
            raw: raw.to_string(),
            reason: match token_without_number {
                Some(token) => CoercionReason::TokenWithoutNumber {
                    token: token.to_string(),
                },
                None => CoercionReason::NoUnitToken,
            },
        })
    }

    /// 解析单元格
    ///
    /// # 返回
    /// - Ok(None): 空单元格（保持 null，不记入 ErrorMask）
    /// - Ok(Some(_)): 数值
    /// - Err: 转换失败
    pub fn parse_cell(&self, cell: &CellValue) -> Result<Option<ParsedQuantity>, CoercionFailure> {
        match cell {
            CellValue::Empty => Ok(None),
            CellValue::Number(value) => Ok(Some(ParsedQuantity {
                value: *value,
                token: None,
            })),
            CellValue::Text(text) if text.trim().is_empty() => Ok(None),
            CellValue::Text(text) => self.parse(text).map(Some),
        }
    }
}

/// 小数点规范化：所有逗号替换为句点（无条件执行）
pub fn canonicalize(raw: &str) -> String {
    raw.replace(',', ".")
}

/// 直接数值解析（只接受有限值）
pub fn parse_plain_number(canonical: &str) -> Option<f64> {
    canonical
        .trim()
        .parse::<f64>()
        .ok()
        .filter(|v| v.is_finite())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parser() -> UnitTokenParser {
        UnitTokenParser::default()
    }

    fn value(raw: &str) -> f64 {
        parser().parse(raw).unwrap().value
    }

    #[test]
    fn test_comma_decimal_equals_period_decimal() {
        assert_eq!(value("12,5"), 12.5);
        assert_eq!(value("12.5"), 12.5);
        assert_eq!(parser().parse("12,5").unwrap().token, None);
    }

    #[test]
    fn test_plain_number_is_unchanged() {
        assert_eq!(value("40"), 40.0);
        assert_eq!(value(" 7 "), 7.0);
    }

    #[test]
    fn test_unit_tokens() {
        assert_eq!(value("5 CC"), 8.4);
        assert_eq!(value("5cc"), 8.4);
        assert_eq!(value("1000 M"), 1.0);
        assert_eq!(value("2 M"), 0.002);
        assert_eq!(value("3000 METROS"), 3.0);
        assert_eq!(value("1500 mt"), 1.5);
        assert_eq!(value("12 H"), 12.0);
        assert_eq!(value("12,5h"), 12.5);
        assert_eq!(value("500 MC"), 0.5);
    }

    #[test]
    fn test_fraction_shorthands() {
        assert_eq!(value("1/2"), 0.5);
        assert_eq!(value("1 1/2"), 1.5);
    }

    #[test]
    fn test_longest_first_avoids_partial_tokens() {
        let parsed = parser().parse("2000 METROS").unwrap();
        assert_eq!(parsed.token, Some("METROS"));
        let parsed = parser().parse("700 MC").unwrap();
        assert_eq!(parsed.token, Some("MC"));
    }

    #[test]
    fn test_listed_order_is_deterministic() {
        let listed = UnitTokenParser::new(TokenOrder::Listed);
        assert_eq!(listed.parse("5 CC").unwrap().value, 8.4);
        assert_eq!(listed.parse("1000 M").unwrap().value, 1.0);
        // 列表顺序下 1/2 先于 1 1/2
        assert_eq!(listed.parse("1 1/2").unwrap().value, 0.5);
        let tokens: Vec<_> = listed.table().tokens().collect();
        assert_eq!(tokens[0], "MC");
        assert_eq!(tokens.len(), 11);
    }

    #[test]
    fn test_unparseable_is_failure() {
        let failure = parser().parse("?").unwrap_err();
        assert_eq!(failure.raw, "?");
        assert_eq!(failure.reason, CoercionReason::NoUnitToken);
    }

    #[test]
    fn test_token_without_number() {
        let failure = parser().parse("CC").unwrap_err();
        assert_eq!(
            failure.reason,
            CoercionReason::TokenWithoutNumber {
                token: "CC".to_string()
            }
        );
    }

    #[test]
    fn test_non_finite_is_not_number() {
        assert!(parser().parse("nan").is_err());
        assert!(parser().parse("inf").is_err());
    }

    #[test]
    fn test_parse_cell_preserves_empty() {
        assert_eq!(parser().parse_cell(&CellValue::Empty).unwrap(), None);
        let zero = parser().parse_cell(&CellValue::Number(0.0)).unwrap();
        assert_eq!(zero.map(|p| p.value), Some(0.0));
    }
}
