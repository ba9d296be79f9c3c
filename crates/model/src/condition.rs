//! Conditional-formatting rules.

use brass_style::StyleOverride;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// The comparison a conditional rule performs against its operand.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "kebab-case")]
pub enum CompareOp {
    Eq,
    NotEq,
    Lt,
    LtEq,
    Gt,
    GtEq,
    Contains,
}

/// One ordered conditional-formatting rule.
///
/// A rule compares a candidate value against `operand` with `op` and, when
/// the comparison holds, applies its per-property style patch. Row-level
/// rules may declare their own `expression`; its result replaces the raw
/// candidate. Operand/candidate type mismatches make the rule a no-op.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ConditionalRule {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expression: Option<String>,
    pub op: CompareOp,
    pub operand: Value,
    pub set: StyleOverride,
}

impl ConditionalRule {
    pub fn new(op: CompareOp, operand: impl Into<Value>, set: StyleOverride) -> Self {
        Self { expression: None, op, operand: operand.into(), set }
    }

    pub fn with_expression(mut self, expression: impl Into<String>) -> Self {
        self.expression = Some(expression.into());
        self
    }
}
