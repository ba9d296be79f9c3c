//! Running aggregates and the registry that resolves them by name.
//!
//! The engine's only obligation towards an aggregate is lifecycle: create
//! one instance per declaration at construction, `reset` it when its
//! owning group (re)starts, `compute` every row while the group is open,
//! and read `computed_value` when the owning band prints.

use brass_types::as_number;
use serde_json::Value;
use std::collections::HashMap;

/// One running aggregate computation.
pub trait Aggregate: Send {
    /// Forget everything and start a fresh fold.
    fn reset(&mut self);

    /// Fold one more row's value.
    fn compute(&mut self, value: &Value);

    /// The current result of the fold.
    fn computed_value(&self) -> Value;
}

/// Builds a fresh aggregate instance.
pub type AggregateFactory = fn() -> Box<dyn Aggregate>;

/// A registry resolving aggregate names (case-insensitive) to factories.
#[derive(Clone)]
pub struct AggregateRegistry {
    factories: HashMap<String, AggregateFactory>,
}

impl AggregateRegistry {
    /// Creates a new, empty registry.
    pub fn new() -> Self {
        Self { factories: HashMap::new() }
    }

    /// Registers a new aggregate kind.
    pub fn register(&mut self, name: &str, factory: AggregateFactory) {
        self.factories.insert(name.to_lowercase(), factory);
    }

    /// Builds an instance of the named aggregate, if registered.
    pub fn create(&self, name: &str) -> Option<Box<dyn Aggregate>> {
        self.factories.get(&name.to_lowercase()).map(|f| f())
    }
}

// --- Built-in aggregate implementations ---

#[derive(Default)]
struct Sum {
    total: f64,
    seen: bool,
}

impl Aggregate for Sum {
    fn reset(&mut self) {
        self.total = 0.0;
        self.seen = false;
    }

    fn compute(&mut self, value: &Value) {
        if let Some(n) = as_number(value) {
            self.total += n;
            self.seen = true;
        }
    }

    fn computed_value(&self) -> Value {
        if self.seen {
            brass_expr::engine::number_value(self.total)
        } else {
            Value::Null
        }
    }
}

#[derive(Default)]
struct Count {
    count: u64,
}

impl Aggregate for Count {
    fn reset(&mut self) {
        self.count = 0;
    }

    fn compute(&mut self, value: &Value) {
        if !value.is_null() {
            self.count += 1;
        }
    }

    fn computed_value(&self) -> Value {
        Value::from(self.count)
    }
}

#[derive(Default)]
struct Average {
    total: f64,
    count: u64,
}

impl Aggregate for Average {
    fn reset(&mut self) {
        self.total = 0.0;
        self.count = 0;
    }

    fn compute(&mut self, value: &Value) {
        if let Some(n) = as_number(value) {
            self.total += n;
            self.count += 1;
        }
    }

    fn computed_value(&self) -> Value {
        if self.count == 0 {
            return Value::Null;
        }
        brass_expr::engine::number_value(self.total / self.count as f64)
    }
}

struct Extreme {
    current: Value,
    want_max: bool,
}

impl Extreme {
    fn new(want_max: bool) -> Self {
        Self { current: Value::Null, want_max }
    }

    fn beats(&self, challenger: &Value) -> bool {
        if self.current.is_null() {
            return true;
        }
        if let (Some(a), Some(b)) = (as_number(challenger), as_number(&self.current)) {
            return if self.want_max { a > b } else { a < b };
        }
        if let (Value::String(a), Value::String(b)) = (challenger, &self.current) {
            return if self.want_max { a > b } else { a < b };
        }
        false
    }
}

impl Aggregate for Extreme {
    fn reset(&mut self) {
        self.current = Value::Null;
    }

    fn compute(&mut self, value: &Value) {
        if !value.is_null() && self.beats(value) {
            self.current = value.clone();
        }
    }

    fn computed_value(&self) -> Value {
        self.current.clone()
    }
}

#[derive(Default)]
struct First {
    value: Option<Value>,
}

impl Aggregate for First {
    fn reset(&mut self) {
        self.value = None;
    }

    fn compute(&mut self, value: &Value) {
        if self.value.is_none() {
            self.value = Some(value.clone());
        }
    }

    fn computed_value(&self) -> Value {
        self.value.clone().unwrap_or(Value::Null)
    }
}

#[derive(Default)]
struct Last {
    value: Option<Value>,
}

impl Aggregate for Last {
    fn reset(&mut self) {
        self.value = None;
    }

    fn compute(&mut self, value: &Value) {
        self.value = Some(value.clone());
    }

    fn computed_value(&self) -> Value {
        self.value.clone().unwrap_or(Value::Null)
    }
}

impl Default for AggregateRegistry {
    /// Creates a new registry populated with all built-in aggregates.
    fn default() -> Self {
        let mut registry = Self::new();
        registry.register("sum", || Box::new(Sum::default()));
        registry.register("count", || Box::new(Count::default()));
        registry.register("avg", || Box::new(Average::default()));
        registry.register("average", || Box::new(Average::default()));
        registry.register("min", || Box::new(Extreme::new(false)));
        registry.register("max", || Box::new(Extreme::new(true)));
        registry.register("first", || Box::new(First::default()));
        registry.register("last", || Box::new(Last::default()));
        registry
    }
}
