//! The evaluation engine for executing a parsed expression AST against a
//! namespace value.
//!
//! The namespace is a plain JSON object assembled by the caller; selections
//! like `col.amount` are ordinary path lookups into it. A path that selects
//! nothing resolves to `Null` rather than failing, so a band with no bound
//! columns can still evaluate static expressions.

use crate::ast::{BinaryOperator, Expression, PathSegment, Selection, UnaryOperator};
use crate::error::ExprError;
use crate::functions::FunctionRegistry;
use brass_types::{as_bool, as_number, display_string, values_equal};
use serde_json::{Number, Value};
use std::cmp::Ordering;

/// A container for all state needed during expression evaluation.
pub struct EvaluationContext<'a> {
    /// The namespace object selections resolve against.
    pub root: &'a Value,
    /// Registered scalar functions.
    pub functions: &'a FunctionRegistry,
}

/// Evaluates a compiled expression and returns a concrete JSON value.
pub fn evaluate(expr: &Expression, e_ctx: &EvaluationContext) -> Result<Value, ExprError> {
    match expr {
        Expression::Literal(v) => Ok(v.clone()),
        Expression::Selection(selection) => Ok(select(selection, e_ctx.root)),
        Expression::FunctionCall { name, args } => {
            let func = e_ctx
                .functions
                .get(name)
                .ok_or_else(|| ExprError::UnknownFunction(name.clone()))?;
            let mut resolved = Vec::with_capacity(args.len());
            for arg in args {
                resolved.push(evaluate(arg, e_ctx)?);
            }
            Ok(func(&resolved))
        }
        Expression::Unary { op, expr } => {
            let value = evaluate(expr, e_ctx)?;
            apply_unary(*op, &value)
        }
        Expression::Binary { left, op, right } => apply_binary(*op, left, right, e_ctx),
    }
}

/// Evaluates an expression and coerces the result to a boolean.
pub fn evaluate_as_bool(expr: &Expression, e_ctx: &EvaluationContext) -> Result<bool, ExprError> {
    Ok(as_bool(&evaluate(expr, e_ctx)?))
}

/// Resolves a selection path against the namespace. Missing keys select
/// `Null`.
pub fn select(selection: &Selection, root: &Value) -> Value {
    let mut current = root;
    for segment in &selection.segments {
        let next = match segment {
            PathSegment::Key(k) => current.get(k),
            PathSegment::Index(i) => current.get(i),
        };
        match next {
            Some(v) => current = v,
            None => return Value::Null,
        }
    }
    current.clone()
}

fn apply_unary(op: UnaryOperator, value: &Value) -> Result<Value, ExprError> {
    match op {
        UnaryOperator::Not => Ok(Value::Bool(!as_bool(value))),
        UnaryOperator::Minus => {
            if value.is_null() {
                return Ok(Value::Null);
            }
            let n = as_number(value)
                .ok_or_else(|| ExprError::TypeError(format!("Cannot negate {}", value)))?;
            Ok(number_value(-n))
        }
    }
}

fn apply_binary(
    op: BinaryOperator,
    left: &Expression,
    right: &Expression,
    e_ctx: &EvaluationContext,
) -> Result<Value, ExprError> {
    // Logical operators short-circuit.
    match op {
        BinaryOperator::Or => {
            if evaluate_as_bool(left, e_ctx)? {
                return Ok(Value::Bool(true));
            }
            return Ok(Value::Bool(evaluate_as_bool(right, e_ctx)?));
        }
        BinaryOperator::And => {
            if !evaluate_as_bool(left, e_ctx)? {
                return Ok(Value::Bool(false));
            }
            return Ok(Value::Bool(evaluate_as_bool(right, e_ctx)?));
        }
        _ => {}
    }

    let lhs = evaluate(left, e_ctx)?;
    let rhs = evaluate(right, e_ctx)?;

    match op {
        BinaryOperator::Equals => Ok(Value::Bool(loose_equals(&lhs, &rhs))),
        BinaryOperator::NotEquals => Ok(Value::Bool(!loose_equals(&lhs, &rhs))),
        BinaryOperator::LessThan => relational(&lhs, &rhs, |o| o == Ordering::Less),
        BinaryOperator::LessThanOrEqual => relational(&lhs, &rhs, |o| o != Ordering::Greater),
        BinaryOperator::GreaterThan => relational(&lhs, &rhs, |o| o == Ordering::Greater),
        BinaryOperator::GreaterThanOrEqual => relational(&lhs, &rhs, |o| o != Ordering::Less),
        BinaryOperator::Plus => arithmetic(&lhs, &rhs, |a, b| a + b),
        BinaryOperator::Minus => arithmetic(&lhs, &rhs, |a, b| a - b),
        BinaryOperator::Multiply => arithmetic(&lhs, &rhs, |a, b| a * b),
        BinaryOperator::Divide => arithmetic(&lhs, &rhs, |a, b| a / b),
        BinaryOperator::Modulo => arithmetic(&lhs, &rhs, |a, b| a % b),
        BinaryOperator::Or | BinaryOperator::And => unreachable!("handled above"),
    }
}

/// Equality with numeric coercion on both sides, so `col.qty = '2'`
/// matches a numeric 2. Falls back to strict value equality.
fn loose_equals(a: &Value, b: &Value) -> bool {
    if let (Some(x), Some(y)) = (as_number(a), as_number(b)) {
        return x == y;
    }
    values_equal(a, b)
}

fn relational(
    a: &Value,
    b: &Value,
    test: impl Fn(Ordering) -> bool,
) -> Result<Value, ExprError> {
    if a.is_null() || b.is_null() {
        return Ok(Value::Bool(false));
    }
    let ordering = if let (Some(x), Some(y)) = (as_number(a), as_number(b)) {
        x.partial_cmp(&y)
    } else if let (Value::String(x), Value::String(y)) = (a, b) {
        Some(x.cmp(y))
    } else {
        None
    };
    match ordering {
        Some(o) => Ok(Value::Bool(test(o))),
        None => Err(ExprError::TypeError(format!(
            "Cannot order {} against {}",
            display_string(a),
            display_string(b)
        ))),
    }
}

fn arithmetic(
    a: &Value,
    b: &Value,
    f: impl Fn(f64, f64) -> f64,
) -> Result<Value, ExprError> {
    // Null propagates through arithmetic, matching SQL aggregates upstream.
    if a.is_null() || b.is_null() {
        return Ok(Value::Null);
    }
    match (as_number(a), as_number(b)) {
        (Some(x), Some(y)) => Ok(number_value(f(x, y))),
        _ => Err(ExprError::TypeError(format!(
            "Cannot do arithmetic on {} and {}",
            a, b
        ))),
    }
}

/// Builds a JSON number, preferring the integer representation and mapping
/// non-finite results to `Null`.
pub fn number_value(n: f64) -> Value {
    if !n.is_finite() {
        return Value::Null;
    }
    if n.fract() == 0.0 && n.abs() < (i64::MAX as f64) {
        return Value::Number(Number::from(n as i64));
    }
    Number::from_f64(n).map(Value::Number).unwrap_or(Value::Null)
}
