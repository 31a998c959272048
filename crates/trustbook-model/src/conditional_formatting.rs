use serde::{Deserialize, Serialize};

use crate::{CellRef, CellValue, Color, Range};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CellIsOperator {
    GreaterThan,
    GreaterThanOrEqual,
    LessThan,
    LessThanOrEqual,
    Equal,
    NotEqual,
    Between,
    NotBetween,
}

impl CellIsOperator {
    /// Evaluate the comparison against numeric operands.
    pub fn matches(self, value: f64, operands: &[f64]) -> bool {
        let a = operands.first().copied().unwrap_or(f64::NAN);
        let b = operands.get(1).copied().unwrap_or(f64::NAN);
        match self {
            CellIsOperator::GreaterThan => value > a,
            CellIsOperator::GreaterThanOrEqual => value >= a,
            CellIsOperator::LessThan => value < a,
            CellIsOperator::LessThanOrEqual => value <= a,
            CellIsOperator::Equal => value == a,
            CellIsOperator::NotEqual => value != a,
            CellIsOperator::Between => value >= a.min(b) && value <= a.max(b),
            CellIsOperator::NotBetween => value < a.min(b) || value > a.max(b),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub enum CfRuleKind {
    /// Compare the cell's numeric value against constant operands.
    CellIs {
        operator: CellIsOperator,
        operands: Vec<f64>,
    },
    /// Formula rule, evaluated relative to the top-left cell of `applies_to`.
    Expression { formula: String },
}

/// A conditional formatting rule that paints a solid fill when it matches.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct CfRule {
    pub applies_to: Range,
    pub kind: CfRuleKind,
    pub fill: Color,
    pub stop_if_true: bool,
}

impl CfRule {
    pub fn cell_is(applies_to: Range, operator: CellIsOperator, operands: &[f64], fill: Color) -> Self {
        Self {
            applies_to,
            kind: CfRuleKind::CellIs {
                operator,
                operands: operands.to_vec(),
            },
            fill,
            stop_if_true: true,
        }
    }

    pub fn expression(applies_to: Range, formula: impl Into<String>, fill: Color) -> Self {
        Self {
            applies_to,
            kind: CfRuleKind::Expression {
                formula: formula.into(),
            },
            fill,
            stop_if_true: true,
        }
    }

    /// Same range and condition; the fill is irrelevant for deduplication.
    pub fn same_condition(&self, other: &CfRule) -> bool {
        self.applies_to == other.applies_to && self.kind == other.kind
    }

    /// Whether the rule matches `cell` holding `value`.
    ///
    /// `CellIs` rules only match numeric cells. Expression rules support the
    /// `NOT(ISNUMBER(<ref>))` / `ISNUMBER(<ref>)` shapes where `<ref>` is the
    /// top-left cell of `applies_to`, i.e. a self-reference for every cell in
    /// the range; any other formula never matches.
    pub fn matches(&self, cell: CellRef, value: &CellValue) -> bool {
        if !self.applies_to.contains(cell) {
            return false;
        }
        match &self.kind {
            CfRuleKind::CellIs { operator, operands } => value
                .as_number()
                .is_some_and(|n| operator.matches(n, operands)),
            CfRuleKind::Expression { formula } => {
                let anchor = self.applies_to.start.to_a1();
                let formula = formula.trim().trim_start_matches('=').to_ascii_uppercase();
                let is_number = value.as_number().is_some();
                if formula == format!("NOT(ISNUMBER({anchor}))") {
                    !is_number
                } else if formula == format!("ISNUMBER({anchor})") {
                    is_number
                } else {
                    false
                }
            }
        }
    }
}

/// Resolve the fill a list of rules paints on `cell`, honoring priority order and `stop_if_true`.
pub fn resolve_fill(rules: &[CfRule], cell: CellRef, value: &CellValue) -> Option<Color> {
    let mut fill = None;
    for rule in rules {
        if rule.matches(cell, value) {
            fill.get_or_insert(rule.fill);
            if rule.stop_if_true {
                break;
            }
        }
    }
    fill
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn between_is_inclusive_and_order_insensitive() {
        assert!(CellIsOperator::Between.matches(0.5, &[-0.5, 0.5]));
        assert!(CellIsOperator::Between.matches(-0.5, &[0.5, -0.5]));
        assert!(!CellIsOperator::Between.matches(0.51, &[-0.5, 0.5]));
        assert!(CellIsOperator::NotBetween.matches(-0.51, &[-0.5, 0.5]));
        assert!(!CellIsOperator::NotBetween.matches(0.0, &[-0.5, 0.5]));
    }

    #[test]
    fn non_numeric_rule_precedes_cell_is_rules() {
        let range = Range::from_a1("E3:F5").unwrap();
        let yellow = Color::rgb(0xFFF59E);
        let red = Color::rgb(0xFF5F5F);
        let rules = vec![
            CfRule::expression(range, "NOT(ISNUMBER(E3))", yellow),
            CfRule::cell_is(range, CellIsOperator::LessThan, &[0.0], red),
        ];

        let e4 = CellRef::from_a1("E4").unwrap();
        assert_eq!(resolve_fill(&rules, e4, &CellValue::from("#NUM!")), Some(yellow));
        assert_eq!(resolve_fill(&rules, e4, &CellValue::Number(-0.2)), Some(red));
        assert_eq!(resolve_fill(&rules, e4, &CellValue::Number(0.2)), None);

        let outside = CellRef::from_a1("G4").unwrap();
        assert_eq!(resolve_fill(&rules, outside, &CellValue::Empty), None);
    }

    #[test]
    fn sign_operators() {
        assert!(CellIsOperator::LessThan.matches(-0.1, &[0.0]));
        assert!(CellIsOperator::GreaterThan.matches(0.1, &[0.0]));
        assert!(CellIsOperator::Equal.matches(0.0, &[0.0]));
        assert!(!CellIsOperator::Equal.matches(f64::NAN, &[0.0]));
    }
}
