use super::ids::*;
use crate::value::{AttributeType, ConfigValue, Configuration};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Layout position of a brick on the editor canvas. Never used by execution.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Position {
    pub x: i64,
    pub y: i64,
}

impl Position {
    pub fn new(x: i64, y: i64) -> Self {
        Self { x, y }
    }

    pub fn is_valid(&self) -> bool {
        self.x >= 0 && self.y >= 0
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProjectRow {
    pub id: ProjectId,
    pub owner: UserId,
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DatabaseRow {
    pub id: DatabaseId,
    pub project_id: ProjectId,
    pub name: String,
    pub schema: BTreeMap<String, AttributeType>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InstanceRow {
    pub id: InstanceId,
    pub database_id: DatabaseId,
    pub values: BTreeMap<String, ConfigValue>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FunctionRow {
    pub id: FunctionId,
    pub project_id: ProjectId,
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BrickRow {
    pub id: BrickId,
    pub function_id: FunctionId,
    pub brick_type: String,
    pub position: Position,
    pub configuration: Configuration,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConnectionRow {
    pub id: ConnectionId,
    pub from_brick_id: BrickId,
    pub from_output_name: String,
    pub to_brick_id: BrickId,
    pub to_input_name: String,
}
