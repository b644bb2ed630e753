use crate::error::ConfigConversionError;
use crate::model::InstanceId;
use itertools::Itertools;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// The data type carried by a brick port.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DataType {
    Text,
    Number,
    Boolean,
    Instance,
    InstanceList,
}

impl DataType {
    /// Scalar types can be satisfied by a literal in the brick configuration.
    /// Instance types only ever arrive through a connection.
    pub fn is_configurable(self) -> bool {
        matches!(self, DataType::Text | DataType::Number | DataType::Boolean)
    }
}

impl fmt::Display for DataType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            DataType::Text => "text",
            DataType::Number => "number",
            DataType::Boolean => "boolean",
            DataType::Instance => "instance",
            DataType::InstanceList => "instance_list",
        };
        f.write_str(name)
    }
}

/// A literal stored in a brick's configuration or an instance's attributes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum ConfigValue {
    Text(String),
    Number(f64),
    Boolean(bool),
    Object(BTreeMap<String, ConfigValue>),
}

/// String-keyed configuration of a single brick.
pub type Configuration = BTreeMap<String, ConfigValue>;

impl ConfigValue {
    pub fn kind(&self) -> &'static str {
        match self {
            ConfigValue::Text(_) => "text",
            ConfigValue::Number(_) => "number",
            ConfigValue::Boolean(_) => "boolean",
            ConfigValue::Object(_) => "object",
        }
    }

    /// Converts the literal into a runtime value of the requested type.
    /// Returns `None` when the literal cannot represent that type.
    pub fn to_value(&self, data_type: DataType) -> Option<Value> {
        match (self, data_type) {
            (ConfigValue::Text(s), DataType::Text) => Some(Value::Text(s.clone())),
            (ConfigValue::Number(n), DataType::Number) => Some(Value::Number(*n)),
            (ConfigValue::Boolean(b), DataType::Boolean) => Some(Value::Boolean(*b)),
            _ => None,
        }
    }

    pub fn to_json(&self) -> serde_json::Value {
        match self {
            ConfigValue::Text(s) => serde_json::Value::String(s.clone()),
            ConfigValue::Number(n) => serde_json::json!(n),
            ConfigValue::Boolean(b) => serde_json::Value::Bool(*b),
            ConfigValue::Object(map) => serde_json::Value::Object(
                map.iter().map(|(k, v)| (k.clone(), v.to_json())).collect(),
            ),
        }
    }
}

impl TryFrom<serde_json::Value> for ConfigValue {
    type Error = ConfigConversionError;

    fn try_from(value: serde_json::Value) -> Result<Self, Self::Error> {
        match value {
            serde_json::Value::String(s) => Ok(ConfigValue::Text(s)),
            serde_json::Value::Bool(b) => Ok(ConfigValue::Boolean(b)),
            serde_json::Value::Number(n) => n
                .as_f64()
                .map(ConfigValue::Number)
                .ok_or_else(|| ConfigConversionError::UnsupportedNumber(n.to_string())),
            serde_json::Value::Object(map) => map
                .into_iter()
                .map(|(k, v)| ConfigValue::try_from(v).map(|v| (k, v)))
                .collect::<Result<BTreeMap<_, _>, _>>()
                .map(ConfigValue::Object),
            serde_json::Value::Null => Err(ConfigConversionError::UnsupportedKind("null")),
            serde_json::Value::Array(_) => Err(ConfigConversionError::UnsupportedKind("array")),
        }
    }
}

impl fmt::Display for ConfigValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigValue::Text(s) => write!(f, "{}", s),
            ConfigValue::Number(n) => write_number(f, *n),
            ConfigValue::Boolean(b) => write!(f, "{}", b),
            ConfigValue::Object(map) => write!(
                f,
                "{{{}}}",
                map.iter().map(|(k, v)| format!("{}: {}", k, v)).join(", ")
            ),
        }
    }
}

/// Largest magnitude below which every integral `f64` converts to `i64` exactly.
const EXACT_INTEGER_LIMIT: f64 = (1u64 << 53) as f64;

/// Integral numbers print without a fractional part. Larger magnitudes fall
/// back to the float rendering, which is also free of a fraction.
fn write_number(f: &mut fmt::Formatter<'_>, n: f64) -> fmt::Result {
    if n.fract() == 0.0 && n.abs() < EXACT_INTEGER_LIMIT {
        write!(f, "{}", n as i64)
    } else {
        write!(f, "{}", n)
    }
}

/// Attribute types allowed in a database schema.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AttributeType {
    Text,
    Number,
    Boolean,
}

impl AttributeType {
    pub fn accepts(self, value: &ConfigValue) -> bool {
        matches!(
            (self, value),
            (AttributeType::Text, ConfigValue::Text(_))
                | (AttributeType::Number, ConfigValue::Number(_))
                | (AttributeType::Boolean, ConfigValue::Boolean(_))
        )
    }
}

impl fmt::Display for AttributeType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            AttributeType::Text => "text",
            AttributeType::Number => "number",
            AttributeType::Boolean => "boolean",
        };
        f.write_str(name)
    }
}

/// A record of a project database, as seen by the bricks reading it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Instance {
    pub id: InstanceId,
    pub database: String,
    pub values: BTreeMap<String, ConfigValue>,
}

/// Runtime values flowing along connections during execution.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Text(String),
    Number(f64),
    Boolean(bool),
    Instance(Instance),
    InstanceList(Vec<Instance>),
}

impl Value {
    pub fn data_type(&self) -> DataType {
        match self {
            Value::Text(_) => DataType::Text,
            Value::Number(_) => DataType::Number,
            Value::Boolean(_) => DataType::Boolean,
            Value::Instance(_) => DataType::Instance,
            Value::InstanceList(_) => DataType::InstanceList,
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Text(s) => write!(f, "{}", s),
            Value::Number(n) => write_number(f, *n),
            Value::Boolean(b) => write!(f, "{}", b),
            Value::Instance(instance) => write!(f, "{}#{}", instance.database, instance.id),
            Value::InstanceList(list) => write!(f, "[{} instances]", list.len()),
        }
    }
}
