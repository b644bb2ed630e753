//! The operations exposed to the surrounding service layer.
//!
//! Callers are expected to have checked authentication and project access
//! already. Every mutation here is guarded by the limit checks and runs as a
//! single transaction against the store.

use crate::error::*;
use crate::executor::{self, ExecutionResult};
use crate::graph::{self, FunctionGraph};
use crate::limits::Limits;
use crate::model::*;
use crate::registry::BrickTypeRegistry;
use crate::store::{FunctionRows, MemoryStore};
use crate::value::{AttributeType, ConfigValue, Configuration};
use ahash::AHashMap;
use std::collections::BTreeMap;
use std::sync::Arc;

pub struct Workspace {
    store: MemoryStore,
    registry: Arc<BrickTypeRegistry>,
    limits: Limits,
}

impl Default for Workspace {
    fn default() -> Self {
        Self::new(BrickTypeRegistry::new())
    }
}

impl Workspace {
    pub fn new(registry: BrickTypeRegistry) -> Self {
        Self::with_store(MemoryStore::new(), Arc::new(registry))
    }

    pub fn with_store(store: MemoryStore, registry: Arc<BrickTypeRegistry>) -> Self {
        Self {
            store,
            registry,
            limits: Limits::default(),
        }
    }

    pub fn with_limits(mut self, limits: Limits) -> Self {
        self.limits = limits;
        self
    }

    pub fn store(&self) -> &MemoryStore {
        &self.store
    }

    pub fn registry(&self) -> &BrickTypeRegistry {
        &self.registry
    }

    pub fn limits(&self) -> &Limits {
        &self.limits
    }

    // --- Projects, databases and instances ---

    pub fn create_project(&self, owner: UserId, name: &str) -> Result<ProjectRow, CreateError> {
        let mut tables = self.store.write()?;
        self.limits.check_projects(tables.count_projects(owner))?;

        let row = ProjectRow {
            id: ProjectId(tables.allocate_id()),
            owner,
            name: name.to_string(),
        };
        tables.projects.insert(row.id, row.clone());
        tracing::info!(project = %row.id, %owner, "created project");
        Ok(row)
    }

    /// Grants `user` access to a project. Sharing with the owner or sharing
    /// twice changes nothing.
    pub fn share_project(&self, project: ProjectId, user: UserId) -> Result<(), StoreError> {
        let mut tables = self.store.write()?;
        let owner = tables.project(project)?.owner;
        if owner != user && !tables.shares.contains(&(project, user)) {
            tables.shares.push((project, user));
        }
        Ok(())
    }

    pub fn create_database(
        &self,
        project: ProjectId,
        name: &str,
        schema: BTreeMap<String, AttributeType>,
    ) -> Result<DatabaseRow, CreateError> {
        let mut tables = self.store.write()?;
        tables.project(project)?;
        if tables
            .databases
            .values()
            .any(|d| d.project_id == project && d.name == name)
        {
            return Err(StoreError::DuplicateDatabaseName {
                project,
                name: name.to_string(),
            }
            .into());
        }

        let row = DatabaseRow {
            id: DatabaseId(tables.allocate_id()),
            project_id: project,
            name: name.to_string(),
            schema,
        };
        tables.databases.insert(row.id, row.clone());
        Ok(row)
    }

    /// Deletes a database together with its instances.
    pub fn delete_database(&self, database: DatabaseId) -> Result<(), StoreError> {
        let mut tables = self.store.write()?;
        let instances = tables
            .remove_database(database)
            .ok_or(StoreError::DatabaseNotFound(database))?;
        tracing::info!(%database, instances, "deleted database");
        Ok(())
    }

    /// Adds an instance. `values` must provide exactly the schema's
    /// attributes, each with the declared type.
    pub fn create_instance(
        &self,
        database: DatabaseId,
        values: BTreeMap<String, ConfigValue>,
    ) -> Result<InstanceRow, CreateError> {
        let mut tables = self.store.write()?;
        let schema = &tables.database(database)?.schema;
        check_instance_values(database, schema, &values)?;
        self.limits
            .check_instances(tables.count_instances(database))?;

        let row = InstanceRow {
            id: InstanceId(tables.allocate_id()),
            database_id: database,
            values,
        };
        tables.insert_instance(row.clone());
        Ok(row)
    }

    // --- Functions ---

    pub fn create_function(
        &self,
        project: ProjectId,
        name: &str,
    ) -> Result<FunctionRow, CreateError> {
        let mut tables = self.store.write()?;
        tables.project(project)?;
        let name = name.trim();
        if name.is_empty() {
            return Err(StoreError::EmptyFunctionName.into());
        }
        if tables
            .functions
            .values()
            .any(|f| f.project_id == project && f.name == name)
        {
            return Err(StoreError::DuplicateFunctionName {
                project,
                name: name.to_string(),
            }
            .into());
        }
        self.limits
            .check_functions(tables.count_functions(project))?;

        let row = FunctionRow {
            id: FunctionId(tables.allocate_id()),
            project_id: project,
            name: name.to_string(),
        };
        tables.functions.insert(row.id, row.clone());
        tracing::info!(function = %row.id, %project, "created function");
        Ok(row)
    }

    /// Deletes a function together with its bricks and connections.
    pub fn delete_function(&self, function: FunctionId) -> Result<(), StoreError> {
        let mut tables = self.store.write()?;
        let (bricks, connections) = tables
            .remove_function(function)
            .ok_or(StoreError::FunctionNotFound(function))?;
        tracing::info!(%function, bricks, connections, "deleted function");
        Ok(())
    }

    pub fn function_rows(&self, function: FunctionId) -> Result<FunctionRows, StoreError> {
        self.store.function_rows(function)
    }

    // --- Bricks and connections ---

    pub fn add_brick(
        &self,
        function: FunctionId,
        brick_type: &str,
        position: Position,
        configuration: Configuration,
    ) -> Result<BrickRow, AddBrickError> {
        let mut tables = self.store.write()?;
        tables.function(function)?;
        self.limits.check_bricks(tables.count_bricks(function))?;
        if !self.registry.contains(brick_type) {
            tracing::warn!(%function, brick_type, "rejected unknown brick type");
            return Err(AddBrickError::InvalidBrickType(brick_type.to_string()));
        }
        if !position.is_valid() {
            return Err(AddBrickError::InvalidPosition {
                x: position.x,
                y: position.y,
            });
        }

        let row = BrickRow {
            id: BrickId(tables.allocate_id()),
            function_id: function,
            brick_type: brick_type.to_string(),
            position,
            configuration,
        };
        tables.insert_brick(row.clone());
        tables.touch(function);
        tracing::debug!(%function, brick = %row.id, brick_type, "added brick");
        Ok(row)
    }

    /// Deletes a brick and the connections attached to it.
    pub fn delete_brick(&self, function: FunctionId, brick: BrickId) -> Result<(), StoreError> {
        let mut tables = self.store.write()?;
        tables.function(function)?;
        match tables.brick(brick) {
            Some(row) if row.function_id == function => {}
            _ => return Err(StoreError::BrickNotFound(brick)),
        }
        tables.remove_brick(brick);
        tables.touch(function);
        Ok(())
    }

    /// Connects `from.from_output` to `to.to_input`.
    ///
    /// The edge is stored only if the port types match, the input is still
    /// free, and no path already leads from `to` back to `from`.
    pub fn connect(
        &self,
        function: FunctionId,
        from: BrickId,
        from_output: &str,
        to: BrickId,
        to_input: &str,
    ) -> Result<ConnectionRow, ConnectError> {
        let mut tables = self.store.write()?;
        let rows = tables.function_rows(function)?;
        let built = self.build_graph(rows)?;

        if let Err(e) = graph::check_connection(&built, from, from_output, to, to_input) {
            tracing::warn!(%function, %from, %to, error = %e, "rejected connection");
            return Err(e);
        }

        let row = ConnectionRow {
            id: ConnectionId(tables.allocate_id()),
            from_brick_id: from,
            from_output_name: from_output.to_string(),
            to_brick_id: to,
            to_input_name: to_input.to_string(),
        };
        tables.insert_connection(function, row.clone());
        tables.touch(function);
        Ok(row)
    }

    pub fn disconnect(
        &self,
        function: FunctionId,
        connection: ConnectionId,
    ) -> Result<(), StoreError> {
        let mut tables = self.store.write()?;
        tables.function(function)?;
        tables
            .remove_connection(function, connection)
            .ok_or(StoreError::ConnectionNotFound(connection))?;
        tables.touch(function);
        Ok(())
    }

    // --- Execution ---

    /// Loads, validates and runs a function, caching the result for
    /// `console_output`. A failed run is cached as unsuccessful with no lines.
    pub fn execute(&self, function: FunctionId) -> Result<ExecutionResult, ExecuteError> {
        let (rows, context, revision) = {
            let tables = self.store.read()?;
            let rows = tables.function_rows(function)?;
            let context = tables.execution_context(rows.function.project_id);
            (rows, context, tables.revision(function))
        };
        tracing::debug!(
            %function,
            databases = context.database_count(),
            "loaded function for execution"
        );

        let outcome = self
            .build_graph(rows)
            .map_err(ExecuteError::from)
            .and_then(|built| {
                graph::validate(&built)?;
                Ok(executor::execute(&built, &context)?)
            });

        let cached = match &outcome {
            Ok(result) => result.clone(),
            Err(e) => {
                tracing::info!(%function, error = %e, "execution rejected");
                ExecutionResult::failed()
            }
        };
        let mut tables = self.store.write()?;
        // A mutation that landed while running makes this result stale.
        if tables.functions.contains_key(&function) && tables.revision(function) == revision {
            tables.cache_console(function, cached);
        }
        outcome
    }

    /// Runs full validation without executing.
    pub fn validate(&self, function: FunctionId) -> Result<(), ExecuteError> {
        let built = self.build_graph(self.store.function_rows(function)?)?;
        graph::validate(&built)?;
        Ok(())
    }

    fn build_graph(&self, rows: FunctionRows) -> Result<FunctionGraph, GraphError> {
        FunctionGraph::build(rows.function, rows.bricks, rows.connections, &self.registry)
    }

    /// The result of the most recent execution, if the graph has not changed since.
    pub fn console_output(
        &self,
        function: FunctionId,
    ) -> Result<Option<ExecutionResult>, StoreError> {
        let tables = self.store.read()?;
        tables.function(function)?;
        Ok(tables.cached_console(function).cloned())
    }

    // --- Definitions ---

    /// Creates a function from a definition by replaying `add_brick` and
    /// `connect`, so every invariant and limit applies. A failure removes the
    /// partially imported function.
    pub fn import_function(
        &self,
        project: ProjectId,
        definition: &FunctionDefinition,
    ) -> Result<FunctionRow, DefinitionError> {
        let function = self.create_function(project, &definition.name)?;
        match self.populate_function(function.id, definition) {
            Ok(()) => Ok(function),
            Err(e) => {
                if let Err(cleanup) = self.delete_function(function.id) {
                    tracing::error!(
                        function = %function.id,
                        error = %cleanup,
                        "failed to roll back import"
                    );
                }
                Err(e)
            }
        }
    }

    fn populate_function(
        &self,
        function: FunctionId,
        definition: &FunctionDefinition,
    ) -> Result<(), DefinitionError> {
        let mut keys: AHashMap<&str, BrickId> = AHashMap::new();
        for brick in &definition.bricks {
            if keys.contains_key(brick.key.as_str()) {
                return Err(DefinitionError::DuplicateBrickKey(brick.key.clone()));
            }
            let position = Position::new(brick.position_x, brick.position_y);
            let row = self
                .add_brick(function, &brick.brick_type, position, brick.configuration()?)
                .map_err(|source| DefinitionError::AddBrick {
                    key: brick.key.clone(),
                    source,
                })?;
            keys.insert(brick.key.as_str(), row.id);
        }

        for connection in &definition.connections {
            let resolve = |key: &str| {
                keys.get(key)
                    .copied()
                    .ok_or_else(|| DefinitionError::UnknownBrickKey(key.to_string()))
            };
            let from = resolve(&connection.from)?;
            let to = resolve(&connection.to)?;
            self.connect(function, from, &connection.from_output, to, &connection.to_input)
                .map_err(|source| DefinitionError::Connect {
                    from: connection.from.clone(),
                    to: connection.to.clone(),
                    source,
                })?;
        }
        Ok(())
    }

    /// Imports databases with their instances, then every function.
    ///
    /// The import is all-or-nothing: on failure every database and function
    /// it created is deleted again.
    pub fn import_workspace(
        &self,
        project: ProjectId,
        definition: &WorkspaceDefinition,
    ) -> Result<Vec<FunctionRow>, DefinitionError> {
        let mut databases = Vec::new();
        let mut functions = Vec::new();
        match self.populate_workspace(project, definition, &mut databases, &mut functions) {
            Ok(()) => Ok(functions),
            Err(e) => {
                let cleanup = functions
                    .iter()
                    .map(|f| self.delete_function(f.id))
                    .chain(databases.iter().map(|d| self.delete_database(*d)));
                for result in cleanup {
                    if let Err(cleanup) = result {
                        tracing::error!(%project, error = %cleanup, "failed to roll back import");
                    }
                }
                Err(e)
            }
        }
    }

    /// Records what it creates in `databases` and `functions` as it goes.
    fn populate_workspace(
        &self,
        project: ProjectId,
        definition: &WorkspaceDefinition,
        databases: &mut Vec<DatabaseId>,
        functions: &mut Vec<FunctionRow>,
    ) -> Result<(), DefinitionError> {
        for database in &definition.databases {
            let row = self.create_database(project, &database.name, database.schema.clone())?;
            databases.push(row.id);
            for raw in &database.instances {
                let values = raw
                    .iter()
                    .map(|(key, value)| {
                        ConfigValue::try_from(value.clone())
                            .map(|v| (key.clone(), v))
                            .map_err(|source| DefinitionError::Configuration {
                                brick: database.name.clone(),
                                key: key.clone(),
                                source,
                            })
                    })
                    .collect::<Result<BTreeMap<_, _>, _>>()?;
                self.create_instance(row.id, values)?;
            }
        }

        for function in &definition.functions {
            functions.push(self.import_function(project, function)?);
        }
        Ok(())
    }
}

fn check_instance_values(
    database: DatabaseId,
    schema: &BTreeMap<String, AttributeType>,
    values: &BTreeMap<String, ConfigValue>,
) -> Result<(), StoreError> {
    let invalid = |reason: String| StoreError::InvalidInstance { database, reason };

    if let Some(extra) = values.keys().find(|k| !schema.contains_key(*k)) {
        return Err(invalid(format!("unknown attribute '{}'", extra)));
    }
    for (name, attribute_type) in schema {
        match values.get(name) {
            None => return Err(invalid(format!("missing attribute '{}'", name))),
            Some(value) if !attribute_type.accepts(value) => {
                return Err(invalid(format!(
                    "attribute '{}' must be {}, found {}",
                    name,
                    attribute_type,
                    value.kind()
                )));
            }
            Some(_) => {}
        }
    }
    Ok(())
}
