//! Defines the registry and built-in implementations for scalar functions.
use brass_types::{as_bool, as_number, display_string};
use serde_json::{Value, json};
use std::collections::HashMap;

/// The signature for a scalar function implementation. Functions are total:
/// bad arguments resolve to `Null` instead of failing the cell.
pub type ScalarFn = fn(args: &[Value]) -> Value;

/// A registry to hold all available scalar functions for the evaluation
/// engine.
#[derive(Clone)]
pub struct FunctionRegistry {
    functions: HashMap<String, ScalarFn>,
}

impl FunctionRegistry {
    /// Creates a new, empty function registry.
    pub fn new() -> Self {
        Self { functions: HashMap::new() }
    }

    /// Registers a new function.
    pub fn register(&mut self, name: &str, func: ScalarFn) {
        self.functions.insert(name.to_lowercase(), func);
    }

    /// Finds a function by name (case-insensitive).
    pub fn get(&self, name: &str) -> Option<&ScalarFn> {
        self.functions.get(&name.to_lowercase())
    }
}

// --- Built-in Function Implementations ---

fn upper(args: &[Value]) -> Value {
    args.first()
        .and_then(|v| v.as_str())
        .map(|s| s.to_uppercase().into())
        .unwrap_or(Value::Null)
}

fn lower(args: &[Value]) -> Value {
    args.first()
        .and_then(|v| v.as_str())
        .map(|s| s.to_lowercase().into())
        .unwrap_or(Value::Null)
}

fn concat(args: &[Value]) -> Value {
    args.iter().map(display_string).collect::<String>().into()
}

fn contains(args: &[Value]) -> Value {
    let haystack = args.first().and_then(|v| v.as_str());
    let needle = args.get(1).and_then(|v| v.as_str());
    match (haystack, needle) {
        (Some(h), Some(n)) => h.contains(n).into(),
        _ => false.into(),
    }
}

fn substring(args: &[Value]) -> Value {
    let Some(s) = args.first().and_then(|v| v.as_str()) else {
        return Value::Null;
    };
    let start = args.get(1).and_then(as_number).unwrap_or(0.0).max(0.0) as usize;
    let chars: Vec<char> = s.chars().collect();
    let end = match args.get(2).and_then(as_number) {
        Some(len) => (start + len.max(0.0) as usize).min(chars.len()),
        None => chars.len(),
    };
    if start >= chars.len() {
        return json!("");
    }
    chars[start..end].iter().collect::<String>().into()
}

fn abs(args: &[Value]) -> Value {
    args.first()
        .and_then(as_number)
        .map(|n| crate::engine::number_value(n.abs()))
        .unwrap_or(Value::Null)
}

fn round(args: &[Value]) -> Value {
    let Some(n) = args.first().and_then(as_number) else {
        return Value::Null;
    };
    let places = args.get(1).and_then(as_number).unwrap_or(0.0) as i32;
    let factor = 10f64.powi(places);
    crate::engine::number_value((n * factor).round() / factor)
}

fn iif(args: &[Value]) -> Value {
    let condition = args.first().map(as_bool).unwrap_or(false);
    let pick = if condition { args.get(1) } else { args.get(2) };
    pick.cloned().unwrap_or(Value::Null)
}

fn coalesce(args: &[Value]) -> Value {
    args.iter()
        .find(|v| !v.is_null())
        .cloned()
        .unwrap_or(Value::Null)
}

impl Default for FunctionRegistry {
    /// Creates a new registry populated with all built-in functions.
    fn default() -> Self {
        let mut registry = Self::new();
        registry.register("upper", upper);
        registry.register("lower", lower);
        registry.register("concat", concat);
        registry.register("contains", contains);
        registry.register("substring", substring);
        registry.register("abs", abs);
        registry.register("round", round);
        registry.register("iif", iif);
        registry.register("coalesce", coalesce);
        registry
    }
}
