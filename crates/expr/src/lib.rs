//! The cell expression language: dotted namespace paths, literals,
//! comparison/arithmetic/logical operators, and scalar function calls.
//!
//! Expressions are evaluated against a namespace object assembled by the
//! caller (column values, parameters, report variables, aggregate values),
//! so the language itself stays ignorant of where data comes from.

pub mod ast;
pub mod engine;
pub mod error;
pub mod functions;
mod parser;

// --- Public API ---
pub use ast::{BinaryOperator, Expression, PathSegment, Selection, UnaryOperator};
pub use engine::{EvaluationContext, evaluate, evaluate_as_bool, select};
pub use error::ExprError;
pub use functions::{FunctionRegistry, ScalarFn};
pub use parser::parse_expression;
