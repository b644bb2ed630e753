//! Common test utilities for building workspaces, rows and graphs.
use brickflow::prelude::*;
use std::collections::BTreeMap;

/// A workspace with one project, a `Customers` database and one empty function.
///
/// Customers: `Ada` (31), `Grace` (45), `Linus` (28), created in that order.
#[allow(dead_code)]
pub struct Fixture {
    pub workspace: Workspace,
    pub project: ProjectRow,
    pub database: DatabaseRow,
    pub instances: Vec<InstanceRow>,
    pub function: FunctionRow,
}

#[allow(dead_code)]
impl Fixture {
    pub fn new() -> Self {
        Self::with_workspace(Workspace::default())
    }

    pub fn with_workspace(workspace: Workspace) -> Self {
        let project = workspace
            .create_project(UserId(1), "Shop")
            .expect("Failed to create project");
        let database = workspace
            .create_database(project.id, "Customers", customer_schema())
            .expect("Failed to create database");
        let instances = [("Ada", 31.0), ("Grace", 45.0), ("Linus", 28.0)]
            .into_iter()
            .map(|(name, age)| {
                workspace
                    .create_instance(database.id, customer(name, age))
                    .expect("Failed to create instance")
            })
            .collect();
        let function = workspace
            .create_function(project.id, "main")
            .expect("Failed to create function");

        Self {
            workspace,
            project,
            database,
            instances,
            function,
        }
    }

    /// Adds a brick at the origin of the canvas and returns its id.
    pub fn add(&self, brick_type: &str, configuration: Configuration) -> BrickId {
        self.workspace
            .add_brick(self.function.id, brick_type, Position::new(0, 0), configuration)
            .expect("Failed to add brick")
            .id
    }

    pub fn connect(&self, from: BrickId, output: &str, to: BrickId, input: &str) -> ConnectionId {
        self.workspace
            .connect(self.function.id, from, output, to, input)
            .expect("Failed to connect bricks")
            .id
    }

    pub fn try_connect(
        &self,
        from: BrickId,
        output: &str,
        to: BrickId,
        input: &str,
    ) -> Result<ConnectionRow, ConnectError> {
        self.workspace.connect(self.function.id, from, output, to, input)
    }

    pub fn connection_count(&self) -> usize {
        self.workspace
            .function_rows(self.function.id)
            .expect("Failed to load function")
            .connections
            .len()
    }

    pub fn execute(&self) -> Result<ExecutionResult, ExecuteError> {
        self.workspace.execute(self.function.id)
    }

    /// `ListInstancesByDBName` reading the Customers database.
    pub fn customers(&self) -> BrickId {
        self.add("ListInstancesByDBName", config(&[("database_name", text("Customers"))]))
    }
}

#[allow(dead_code)]
pub fn customer_schema() -> BTreeMap<String, AttributeType> {
    BTreeMap::from([
        ("name".to_string(), AttributeType::Text),
        ("age".to_string(), AttributeType::Number),
    ])
}

#[allow(dead_code)]
pub fn customer(name: &str, age: f64) -> BTreeMap<String, ConfigValue> {
    BTreeMap::from([
        ("name".to_string(), text(name)),
        ("age".to_string(), ConfigValue::Number(age)),
    ])
}

#[allow(dead_code)]
pub fn text(s: &str) -> ConfigValue {
    ConfigValue::Text(s.to_string())
}

#[allow(dead_code)]
pub fn config(entries: &[(&str, ConfigValue)]) -> Configuration {
    entries
        .iter()
        .map(|(k, v)| (k.to_string(), v.clone()))
        .collect()
}

// --- Raw rows, for building graphs without a store ---

#[allow(dead_code)]
pub fn function_row() -> FunctionRow {
    FunctionRow {
        id: FunctionId(1),
        project_id: ProjectId(1),
        name: "graph".to_string(),
    }
}

#[allow(dead_code)]
pub fn brick_row(id: u64, brick_type: &str, configuration: Configuration) -> BrickRow {
    BrickRow {
        id: BrickId(id),
        function_id: FunctionId(1),
        brick_type: brick_type.to_string(),
        position: Position::default(),
        configuration,
    }
}

#[allow(dead_code)]
pub fn wire(id: u64, from: u64, output: &str, to: u64, input: &str) -> ConnectionRow {
    ConnectionRow {
        id: ConnectionId(id),
        from_brick_id: BrickId(from),
        from_output_name: output.to_string(),
        to_brick_id: BrickId(to),
        to_input_name: input.to_string(),
    }
}

#[allow(dead_code)]
pub fn build_graph(
    bricks: Vec<BrickRow>,
    connections: Vec<ConnectionRow>,
) -> Result<FunctionGraph, GraphError> {
    FunctionGraph::build(function_row(), bricks, connections, &BrickTypeRegistry::new())
}

/// `ConcatText` with both inputs configured, so it is complete on its own.
#[allow(dead_code)]
pub fn concat_row(id: u64) -> BrickRow {
    brick_row(
        id,
        "ConcatText",
        config(&[("left", text("l")), ("right", text("r"))]),
    )
}

/// A JSON workspace document with one database and one function that lists it.
#[allow(dead_code)]
pub const SHOP_WORKSPACE_JSON: &str = r#"
{
  "databases": [
    {
      "name": "Products",
      "schema": { "title": "text", "price": "number", "in_stock": "boolean" },
      "instances": [
        { "title": "Lamp", "price": 40, "in_stock": true },
        { "title": "Desk", "price": 250.5, "in_stock": false }
      ]
    }
  ],
  "functions": [
    {
      "name": "inventory",
      "bricks": [
        { "key": "list", "brick_type": "ListInstancesByDBName", "position_x": 10, "position_y": 10,
          "configuration": { "database_name": "Products" } },
        { "key": "count", "brick_type": "CountInstances" },
        { "key": "label", "brick_type": "NumberToText" },
        { "key": "prefix", "brick_type": "ConcatText", "configuration": { "left": "products: " } },
        { "key": "log", "brick_type": "LogText" }
      ],
      "connections": [
        { "from": "list", "from_output": "instances", "to": "count", "to_input": "instances" },
        { "from": "count", "from_output": "count", "to": "label", "to_input": "value" },
        { "from": "label", "from_output": "text", "to": "prefix", "to_input": "right" },
        { "from": "prefix", "from_output": "text", "to": "log", "to_input": "message" }
      ]
    }
  ]
}
"#;
