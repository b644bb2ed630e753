use crate::error::DefinitionError;
use crate::value::{AttributeType, ConfigValue, Configuration};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;

/// A portable document describing databases and functions to import into a project.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct WorkspaceDefinition {
    #[serde(default)]
    pub databases: Vec<DatabaseDefinition>,
    #[serde(default)]
    pub functions: Vec<FunctionDefinition>,
}

impl WorkspaceDefinition {
    pub fn from_json(json: &str) -> Result<Self, DefinitionError> {
        serde_json::from_str(json).map_err(|e| DefinitionError::JsonParseError(e.to_string()))
    }

    pub fn from_file(path: &str) -> Result<Self, DefinitionError> {
        let content = fs::read_to_string(path).map_err(|e| {
            DefinitionError::JsonParseError(format!("Could not read '{}': {}", path, e))
        })?;
        Self::from_json(&content)
    }

    pub fn to_json(&self) -> Result<String, DefinitionError> {
        serde_json::to_string_pretty(self)
            .map_err(|e| DefinitionError::JsonParseError(e.to_string()))
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseDefinition {
    pub name: String,
    pub schema: BTreeMap<String, AttributeType>,
    #[serde(default)]
    pub instances: Vec<serde_json::Map<String, serde_json::Value>>,
}

/// A function graph where bricks are referenced by document-local keys.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FunctionDefinition {
    pub name: String,
    #[serde(default)]
    pub bricks: Vec<BrickDefinition>,
    #[serde(default)]
    pub connections: Vec<ConnectionDefinition>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BrickDefinition {
    pub key: String,
    pub brick_type: String,
    #[serde(default)]
    pub position_x: i64,
    #[serde(default)]
    pub position_y: i64,
    #[serde(default)]
    pub configuration: serde_json::Map<String, serde_json::Value>,
}

impl BrickDefinition {
    /// Converts the JSON configuration into typed literals.
    pub fn configuration(&self) -> Result<Configuration, DefinitionError> {
        self.configuration
            .iter()
            .map(|(key, value)| {
                ConfigValue::try_from(value.clone())
                    .map(|v| (key.clone(), v))
                    .map_err(|source| DefinitionError::Configuration {
                        brick: self.key.clone(),
                        key: key.clone(),
                        source,
                    })
            })
            .collect()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConnectionDefinition {
    pub from: String,
    pub from_output: String,
    pub to: String,
    pub to_input: String,
}
