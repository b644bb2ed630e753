use crate::error::BrickFailure;
use crate::executor::ExecutionContext;
use crate::value::{DataType, Instance, Value};
use ahash::AHashMap;
use itertools::Itertools;
use std::fmt;
use std::sync::Arc;

mod catalog;

pub use catalog::register_default_brick_types;

/// Which side of a brick a port sits on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PortDirection {
    Input,
    Output,
}

impl fmt::Display for PortDirection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PortDirection::Input => f.write_str("input"),
            PortDirection::Output => f.write_str("output"),
        }
    }
}

/// A named, typed input or output of a brick type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PortSpec {
    pub name: String,
    pub data_type: DataType,
    pub required: bool,
}

impl PortSpec {
    pub fn required(name: &str, data_type: DataType) -> Self {
        Self {
            name: name.to_string(),
            data_type,
            required: true,
        }
    }

    pub fn optional(name: &str, data_type: DataType) -> Self {
        Self {
            name: name.to_string(),
            data_type,
            required: false,
        }
    }
}

/// Input values bound to a brick right before it is evaluated.
#[derive(Debug, Clone, Default)]
pub struct BoundInputs {
    values: AHashMap<String, Value>,
}

impl BoundInputs {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, name: &str, value: Value) {
        self.values.insert(name.to_string(), value);
    }

    pub fn get(&self, name: &str) -> Option<&Value> {
        self.values.get(name)
    }

    fn require(&self, name: &str) -> Result<&Value, BrickFailure> {
        self.values
            .get(name)
            .ok_or_else(|| BrickFailure::InputUnavailable(name.to_string()))
    }

    pub fn text(&self, name: &str) -> Result<&str, BrickFailure> {
        match self.require(name)? {
            Value::Text(s) => Ok(s),
            _ => Err(BrickFailure::InputUnavailable(name.to_string())),
        }
    }

    pub fn number(&self, name: &str) -> Result<f64, BrickFailure> {
        match self.require(name)? {
            Value::Number(n) => Ok(*n),
            _ => Err(BrickFailure::InputUnavailable(name.to_string())),
        }
    }

    pub fn boolean(&self, name: &str) -> Result<bool, BrickFailure> {
        match self.require(name)? {
            Value::Boolean(b) => Ok(*b),
            _ => Err(BrickFailure::InputUnavailable(name.to_string())),
        }
    }

    pub fn instance(&self, name: &str) -> Result<&Instance, BrickFailure> {
        match self.require(name)? {
            Value::Instance(instance) => Ok(instance),
            _ => Err(BrickFailure::InputUnavailable(name.to_string())),
        }
    }

    pub fn instances(&self, name: &str) -> Result<&[Instance], BrickFailure> {
        match self.require(name)? {
            Value::InstanceList(list) => Ok(list),
            _ => Err(BrickFailure::InputUnavailable(name.to_string())),
        }
    }
}

/// What a brick produced: its output values and any console lines.
#[derive(Debug, Clone, Default)]
pub struct BrickOutput {
    pub values: AHashMap<String, Value>,
    pub console: Vec<String>,
}

impl BrickOutput {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_value(mut self, output: &str, value: Value) -> Self {
        self.values.insert(output.to_string(), value);
        self
    }

    pub fn with_line(mut self, line: impl Into<String>) -> Self {
        self.console.push(line.into());
        self
    }
}

/// The evaluation contract of a brick type. It must not hold state between calls.
pub type EvaluateFn = fn(&BoundInputs, &ExecutionContext) -> Result<BrickOutput, BrickFailure>;

/// Immutable schema and behavior shared by every brick of one kind.
#[derive(Debug, Clone)]
pub struct BrickType {
    pub name: String,
    pub inputs: Vec<PortSpec>,
    pub outputs: Vec<PortSpec>,
    evaluate: EvaluateFn,
}

impl BrickType {
    pub fn new(
        name: &str,
        inputs: Vec<PortSpec>,
        outputs: Vec<PortSpec>,
        evaluate: EvaluateFn,
    ) -> Self {
        Self {
            name: name.to_string(),
            inputs,
            outputs,
            evaluate,
        }
    }

    pub fn input(&self, name: &str) -> Option<&PortSpec> {
        self.inputs.iter().find(|p| p.name == name)
    }

    pub fn output(&self, name: &str) -> Option<&PortSpec> {
        self.outputs.iter().find(|p| p.name == name)
    }

    pub fn port(&self, name: &str, direction: PortDirection) -> Option<&PortSpec> {
        match direction {
            PortDirection::Input => self.input(name),
            PortDirection::Output => self.output(name),
        }
    }

    pub fn evaluate(
        &self,
        inputs: &BoundInputs,
        context: &ExecutionContext,
    ) -> Result<BrickOutput, BrickFailure> {
        (self.evaluate)(inputs, context)
    }
}

/// Catalog of brick types, keyed by name.
///
/// `BrickTypeRegistry::new()` holds the built-in catalog. Further kinds are
/// added by registering new `BrickType` records.
#[derive(Debug, Clone)]
pub struct BrickTypeRegistry {
    types: AHashMap<String, Arc<BrickType>>,
}

impl BrickTypeRegistry {
    pub fn new() -> Self {
        let mut registry = Self::empty();
        register_default_brick_types(&mut registry);
        registry
    }

    pub fn empty() -> Self {
        Self {
            types: AHashMap::new(),
        }
    }

    /// Registers a brick type, returning the one it replaced, if any.
    pub fn register(&mut self, brick_type: BrickType) -> Option<Arc<BrickType>> {
        self.types
            .insert(brick_type.name.clone(), Arc::new(brick_type))
    }

    pub fn with_brick_type(mut self, brick_type: BrickType) -> Self {
        self.register(brick_type);
        self
    }

    pub fn get(&self, name: &str) -> Option<&Arc<BrickType>> {
        self.types.get(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.types.contains_key(name)
    }

    pub fn len(&self) -> usize {
        self.types.len()
    }

    pub fn is_empty(&self) -> bool {
        self.types.is_empty()
    }

    /// Brick types sorted by name.
    pub fn iter(&self) -> impl Iterator<Item = &Arc<BrickType>> {
        self.types
            .values()
            .sorted_by(|a, b| a.name.cmp(&b.name))
    }
}

impl Default for BrickTypeRegistry {
    fn default() -> Self {
        Self::new()
    }
}
