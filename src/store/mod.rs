//! The persistence boundary: lock-protected row tables.
//!
//! Every mutation runs inside a single write section and only writes once all
//! of its checks passed, which keeps cascades all-or-nothing. Graph loads for
//! execution run inside a single read section, so a run never sees a
//! half-applied mutation.

use crate::error::StoreError;
use crate::executor::{ExecutionContext, ExecutionResult};
use crate::model::*;
use crate::value::Instance;
use ahash::AHashMap;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};

mod snapshot;

/// All rows of one function, bricks and connections in creation order.
#[derive(Debug, Clone, PartialEq)]
pub struct FunctionRows {
    pub function: FunctionRow,
    pub bricks: Vec<BrickRow>,
    pub connections: Vec<ConnectionRow>,
}

/// Row tables. Ids come from one monotonically increasing counter, so
/// iterating a table by key yields rows in creation order.
///
/// The per-owner indexes are derived from the tables and rebuilt after a
/// snapshot load. Rows are only added or removed through the methods below
/// so the indexes stay in step.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub(crate) struct Tables {
    next_id: u64,
    pub(crate) projects: BTreeMap<ProjectId, ProjectRow>,
    pub(crate) shares: Vec<(ProjectId, UserId)>,
    pub(crate) databases: BTreeMap<DatabaseId, DatabaseRow>,
    instances: BTreeMap<InstanceId, InstanceRow>,
    pub(crate) functions: BTreeMap<FunctionId, FunctionRow>,
    bricks: BTreeMap<BrickId, BrickRow>,
    connections: BTreeMap<ConnectionId, ConnectionRow>,
    /// Instance ids per database, in creation order.
    #[serde(skip)]
    instance_index: AHashMap<DatabaseId, Vec<InstanceId>>,
    /// Brick ids per function, in creation order.
    #[serde(skip)]
    brick_index: AHashMap<FunctionId, Vec<BrickId>>,
    /// Connection ids per function, in creation order.
    #[serde(skip)]
    connection_index: AHashMap<FunctionId, Vec<ConnectionId>>,
    /// Bumped on every mutation of a function's graph.
    #[serde(skip)]
    revisions: AHashMap<FunctionId, u64>,
    /// Last execution result per function.
    #[serde(skip)]
    console: AHashMap<FunctionId, ExecutionResult>,
}

impl Tables {
    pub(crate) fn allocate_id(&mut self) -> u64 {
        self.next_id += 1;
        self.next_id
    }

    /// Rebuilds the per-owner indexes from the row tables.
    fn rebuild_indexes(&mut self) {
        self.instance_index.clear();
        self.brick_index.clear();
        self.connection_index.clear();
        for row in self.instances.values() {
            self.instance_index.entry(row.database_id).or_default().push(row.id);
        }
        for row in self.bricks.values() {
            self.brick_index.entry(row.function_id).or_default().push(row.id);
        }
        for row in self.connections.values() {
            if let Some(brick) = self.bricks.get(&row.from_brick_id) {
                self.connection_index
                    .entry(brick.function_id)
                    .or_default()
                    .push(row.id);
            }
        }
    }

    pub(crate) fn project(&self, id: ProjectId) -> Result<&ProjectRow, StoreError> {
        self.projects.get(&id).ok_or(StoreError::ProjectNotFound(id))
    }

    pub(crate) fn database(&self, id: DatabaseId) -> Result<&DatabaseRow, StoreError> {
        self.databases.get(&id).ok_or(StoreError::DatabaseNotFound(id))
    }

    pub(crate) fn function(&self, id: FunctionId) -> Result<&FunctionRow, StoreError> {
        self.functions.get(&id).ok_or(StoreError::FunctionNotFound(id))
    }

    /// Projects a user owns plus projects shared with them.
    pub(crate) fn count_projects(&self, user: UserId) -> usize {
        let owned = self.projects.values().filter(|p| p.owner == user).count();
        let shared = self.shares.iter().filter(|(_, u)| *u == user).count();
        owned + shared
    }

    pub(crate) fn count_functions(&self, project: ProjectId) -> usize {
        self.functions
            .values()
            .filter(|f| f.project_id == project)
            .count()
    }

    pub(crate) fn count_instances(&self, database: DatabaseId) -> usize {
        self.instance_index.get(&database).map_or(0, Vec::len)
    }

    pub(crate) fn count_bricks(&self, function: FunctionId) -> usize {
        self.brick_index.get(&function).map_or(0, Vec::len)
    }

    pub(crate) fn insert_instance(&mut self, row: InstanceRow) {
        self.instance_index
            .entry(row.database_id)
            .or_default()
            .push(row.id);
        self.instances.insert(row.id, row);
    }

    pub(crate) fn insert_brick(&mut self, row: BrickRow) {
        self.brick_index.entry(row.function_id).or_default().push(row.id);
        self.bricks.insert(row.id, row);
    }

    pub(crate) fn brick(&self, id: BrickId) -> Option<&BrickRow> {
        self.bricks.get(&id)
    }

    pub(crate) fn insert_connection(&mut self, function: FunctionId, row: ConnectionRow) {
        self.connection_index.entry(function).or_default().push(row.id);
        self.connections.insert(row.id, row);
    }

    /// Removes a connection of `function`. Connections of other functions
    /// are left alone.
    pub(crate) fn remove_connection(
        &mut self,
        function: FunctionId,
        connection: ConnectionId,
    ) -> Option<ConnectionRow> {
        let ids = self.connection_index.get_mut(&function)?;
        let position = ids.iter().position(|id| *id == connection)?;
        ids.remove(position);
        self.connections.remove(&connection)
    }

    pub(crate) fn bricks_of(&self, function: FunctionId) -> impl Iterator<Item = &BrickRow> {
        self.brick_index
            .get(&function)
            .into_iter()
            .flatten()
            .filter_map(|id| self.bricks.get(id))
    }

    /// Connections whose source brick belongs to `function`.
    pub(crate) fn connections_of(
        &self,
        function: FunctionId,
    ) -> impl Iterator<Item = &ConnectionRow> {
        self.connection_index
            .get(&function)
            .into_iter()
            .flatten()
            .filter_map(|id| self.connections.get(id))
    }

    pub(crate) fn function_rows(&self, function: FunctionId) -> Result<FunctionRows, StoreError> {
        let row = self.function(function)?.clone();
        Ok(FunctionRows {
            function: row,
            bricks: self.bricks_of(function).cloned().collect(),
            connections: self.connections_of(function).cloned().collect(),
        })
    }

    /// Removes a brick and every connection touching it.
    pub(crate) fn remove_brick(&mut self, brick: BrickId) -> Option<BrickRow> {
        let removed = self.bricks.remove(&brick)?;
        if let Some(ids) = self.brick_index.get_mut(&removed.function_id) {
            ids.retain(|id| *id != brick);
        }
        if let Some(ids) = self.connection_index.get_mut(&removed.function_id) {
            let connections = &mut self.connections;
            ids.retain(|id| {
                let touches = connections
                    .get(id)
                    .is_some_and(|c| c.from_brick_id == brick || c.to_brick_id == brick);
                if touches {
                    connections.remove(id);
                }
                !touches
            });
        }
        Some(removed)
    }

    /// Removes a function with all of its bricks and connections.
    /// Returns the number of bricks and connections removed.
    pub(crate) fn remove_function(&mut self, function: FunctionId) -> Option<(usize, usize)> {
        self.functions.remove(&function)?;
        let bricks = self.brick_index.remove(&function).unwrap_or_default();
        let connections = self.connection_index.remove(&function).unwrap_or_default();
        for id in &connections {
            self.connections.remove(id);
        }
        for id in &bricks {
            self.bricks.remove(id);
        }
        self.revisions.remove(&function);
        self.console.remove(&function);
        Some((bricks.len(), connections.len()))
    }

    /// Removes a database with all of its instances.
    /// Returns the number of instances removed.
    pub(crate) fn remove_database(&mut self, database: DatabaseId) -> Option<usize> {
        self.databases.remove(&database)?;
        let instances = self.instance_index.remove(&database).unwrap_or_default();
        for id in &instances {
            self.instances.remove(id);
        }
        Some(instances.len())
    }

    /// Instances of every database in `project`, keyed by database name.
    pub(crate) fn execution_context(&self, project: ProjectId) -> ExecutionContext {
        let mut context = ExecutionContext::new();
        for database in self.databases.values().filter(|d| d.project_id == project) {
            let instances = self
                .instance_index
                .get(&database.id)
                .into_iter()
                .flatten()
                .filter_map(|id| self.instances.get(id))
                .map(|i| Instance {
                    id: i.id,
                    database: database.name.clone(),
                    values: i.values.clone(),
                })
                .collect();
            context.insert_database(&database.name, instances);
        }
        context
    }

    pub(crate) fn revision(&self, function: FunctionId) -> u64 {
        self.revisions.get(&function).copied().unwrap_or(0)
    }

    /// Marks a function's graph as changed and drops its cached console output.
    pub(crate) fn touch(&mut self, function: FunctionId) {
        *self.revisions.entry(function).or_insert(0) += 1;
        self.console.remove(&function);
    }

    pub(crate) fn cache_console(&mut self, function: FunctionId, result: ExecutionResult) {
        self.console.insert(function, result);
    }

    pub(crate) fn cached_console(&self, function: FunctionId) -> Option<&ExecutionResult> {
        self.console.get(&function)
    }
}

/// An in-process row store standing in for the relational backend.
#[derive(Debug, Default)]
pub struct MemoryStore {
    tables: RwLock<Tables>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub(crate) fn from_tables(mut tables: Tables) -> Self {
        tables.rebuild_indexes();
        Self {
            tables: RwLock::new(tables),
        }
    }

    pub(crate) fn read(&self) -> Result<RwLockReadGuard<'_, Tables>, StoreError> {
        self.tables.read().map_err(|_| StoreError::Poisoned)
    }

    pub(crate) fn write(&self) -> Result<RwLockWriteGuard<'_, Tables>, StoreError> {
        self.tables.write().map_err(|_| StoreError::Poisoned)
    }

    pub fn function_rows(&self, function: FunctionId) -> Result<FunctionRows, StoreError> {
        self.read()?.function_rows(function)
    }

    pub fn brick_count(&self, function: FunctionId) -> Result<usize, StoreError> {
        let tables = self.read()?;
        tables.function(function)?;
        Ok(tables.count_bricks(function))
    }

    pub fn function_count(&self, project: ProjectId) -> Result<usize, StoreError> {
        let tables = self.read()?;
        tables.project(project)?;
        Ok(tables.count_functions(project))
    }

    pub fn instance_count(&self, database: DatabaseId) -> Result<usize, StoreError> {
        let tables = self.read()?;
        tables.database(database)?;
        Ok(tables.count_instances(database))
    }

    pub fn project_count(&self, user: UserId) -> Result<usize, StoreError> {
        Ok(self.read()?.count_projects(user))
    }

    /// Bricks in the store that point at `function`, whether or not it still exists.
    /// Scans the whole brick table rather than trusting the index.
    pub fn orphaned_bricks(&self, function: FunctionId) -> Result<usize, StoreError> {
        let tables = self.read()?;
        Ok(tables
            .bricks
            .values()
            .filter(|b| b.function_id == function)
            .count())
    }

    /// Connections with an endpoint that no longer exists.
    pub fn dangling_connections(&self) -> Result<usize, StoreError> {
        let tables = self.read()?;
        Ok(tables
            .connections
            .values()
            .filter(|c| {
                !tables.bricks.contains_key(&c.from_brick_id)
                    || !tables.bricks.contains_key(&c.to_brick_id)
            })
            .count())
    }
}
