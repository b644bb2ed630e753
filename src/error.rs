use crate::limits::Resource;
use crate::model::{BrickId, ConnectionId, DatabaseId, FunctionId, ProjectId};
use crate::registry::PortDirection;
use crate::value::DataType;
use itertools::Itertools;
use thiserror::Error;

/// Errors raised while turning stored rows into a `FunctionGraph`.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum GraphError {
    #[error(
        "Connection {connection} references brick {missing_brick}, which is not part of function {function}"
    )]
    MalformedGraph {
        function: FunctionId,
        connection: ConnectionId,
        missing_brick: BrickId,
    },

    #[error("Brick {brick} has an unregistered brick type '{type_name}'")]
    UnknownBrickType { brick: BrickId, type_name: String },
}

/// Broad classes of validation failures.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    /// The shape of the graph is wrong.
    Structural,
    /// The graph is well formed but cannot run as configured.
    Completeness,
}

/// Errors found by full-graph validation before execution.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ValidationError {
    #[error(
        "Connection {connection} links an output of type {output_type} to an input of type {input_type}"
    )]
    TypeMismatch {
        connection: ConnectionId,
        output_type: DataType,
        input_type: DataType,
    },

    #[error("Connection {connection} uses {direction} '{port}', which brick {brick} does not declare")]
    UnknownPort {
        connection: ConnectionId,
        brick: BrickId,
        port: String,
        direction: PortDirection,
    },

    #[error("Input '{input}' of brick {brick} has more than one incoming connection")]
    DuplicateInputBinding { brick: BrickId, input: String },

    #[error("Circular dependency: {}", .path.iter().join(" -> "))]
    CircularDependency { path: Vec<BrickId> },

    #[error("Input '{input}' of brick {brick} is neither connected nor configured")]
    UnconfiguredInput { brick: BrickId, input: String },

    #[error("Input '{input}' of brick {brick} requires a connection")]
    MissingConnection { brick: BrickId, input: String },

    #[error("The function has no bricks to execute")]
    EmptyFunction,
}

impl ValidationError {
    pub fn category(&self) -> ErrorCategory {
        match self {
            ValidationError::TypeMismatch { .. }
            | ValidationError::UnknownPort { .. }
            | ValidationError::DuplicateInputBinding { .. }
            | ValidationError::CircularDependency { .. } => ErrorCategory::Structural,
            ValidationError::UnconfiguredInput { .. }
            | ValidationError::MissingConnection { .. }
            | ValidationError::EmptyFunction => ErrorCategory::Completeness,
        }
    }
}

/// Why a single brick's evaluation failed.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum BrickFailure {
    #[error("Configured value for input '{input}' must be {expected}, but found {found}")]
    InvalidConfiguration {
        input: String,
        expected: DataType,
        found: &'static str,
    },

    #[error("Input '{0}' has no value bound")]
    InputUnavailable(String),

    #[error("Database '{0}' does not exist in this project")]
    DatabaseNotFound(String),

    #[error("The instance list is empty")]
    EmptyInstanceList,

    #[error("Instance has no attribute '{0}'")]
    MissingAttribute(String),

    #[error("Output '{0}' was not produced")]
    MissingOutput(String),

    #[error("Output '{output}' must be {expected}, but a {found} was produced")]
    OutputTypeMismatch {
        output: String,
        expected: DataType,
        found: DataType,
    },

    #[error("{0}")]
    Failed(String),
}

/// Errors that abort a running execution.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ExecutionError {
    #[error("Brick {brick} ({brick_type}) failed: {cause}")]
    ExecutionFailed {
        brick: BrickId,
        brick_type: String,
        cause: BrickFailure,
    },

    #[error(
        "Executor finished after evaluating {evaluated} of {total} bricks; the graph was not acyclic"
    )]
    ExecutorInvariantBroken { evaluated: usize, total: usize },
}

/// A resource cap was reached before a mutation.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum LimitError {
    #[error("Limit reached for {resource}: {count} of {limit} already in use")]
    LimitReached {
        resource: Resource,
        limit: usize,
        count: usize,
    },
}

/// Errors raised by the row store.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum StoreError {
    #[error("The store lock was poisoned by a panicking writer")]
    Poisoned,

    #[error("Project {0} not found")]
    ProjectNotFound(ProjectId),

    #[error("Database {0} not found")]
    DatabaseNotFound(DatabaseId),

    #[error("Function {0} not found")]
    FunctionNotFound(FunctionId),

    #[error("Brick {0} not found")]
    BrickNotFound(BrickId),

    #[error("Connection {0} not found")]
    ConnectionNotFound(ConnectionId),

    #[error("Function name must not be empty")]
    EmptyFunctionName,

    #[error("Project {project} already has a function named '{name}'")]
    DuplicateFunctionName { project: ProjectId, name: String },

    #[error("Project {project} already has a database named '{name}'")]
    DuplicateDatabaseName { project: ProjectId, name: String },

    #[error("Invalid data values for database {database}: {reason}")]
    InvalidInstance { database: DatabaseId, reason: String },

    #[error("Snapshot error: {0}")]
    Snapshot(String),
}

/// Errors from creating projects, databases, instances and functions.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum CreateError {
    #[error(transparent)]
    Limit(#[from] LimitError),

    #[error(transparent)]
    Store(#[from] StoreError),
}

/// Errors from `Workspace::add_brick`.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum AddBrickError {
    #[error(transparent)]
    LimitReached(#[from] LimitError),

    #[error("Invalid brick type '{0}'")]
    InvalidBrickType(String),

    #[error("Invalid position ({x}, {y}); coordinates must be non-negative")]
    InvalidPosition { x: i64, y: i64 },

    #[error(transparent)]
    Store(#[from] StoreError),
}

/// Errors from `Workspace::connect`.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ConnectError {
    #[error("Cannot connect an output of type {output_type} to an input of type {input_type}")]
    TypeMismatch {
        output_type: DataType,
        input_type: DataType,
    },

    #[error("Brick {brick} does not declare {direction} '{port}'")]
    UnknownPort {
        brick: BrickId,
        port: String,
        direction: PortDirection,
    },

    #[error("Connection would close a cycle: {}", .path.iter().join(" -> "))]
    CircularDependency { path: Vec<BrickId> },

    #[error("Input '{input}' of brick {brick} is already connected")]
    InputAlreadyConnected { brick: BrickId, input: String },

    #[error("Brick {0} not found in this function")]
    BrickNotFound(BrickId),

    #[error(transparent)]
    Graph(#[from] GraphError),

    #[error(transparent)]
    Store(#[from] StoreError),
}

/// Errors from `Workspace::execute`.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ExecuteError {
    #[error(transparent)]
    Store(#[from] StoreError),

    #[error(transparent)]
    Graph(#[from] GraphError),

    #[error("Validation failed: {0}")]
    Validation(#[from] ValidationError),

    #[error(transparent)]
    Execution(#[from] ExecutionError),
}

/// Errors converting JSON configuration into `ConfigValue`s.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ConfigConversionError {
    #[error("JSON {0} values are not supported in brick configuration")]
    UnsupportedKind(&'static str),

    #[error("Number {0} cannot be represented")]
    UnsupportedNumber(String),
}

/// Errors importing a `FunctionDefinition` or `WorkspaceDefinition` document.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum DefinitionError {
    #[error("Failed to parse definition JSON: {0}")]
    JsonParseError(String),

    #[error("Brick key '{0}' is defined more than once")]
    DuplicateBrickKey(String),

    #[error("Connection refers to unknown brick key '{0}'")]
    UnknownBrickKey(String),

    #[error("Configuration '{key}' of brick '{brick}' is invalid: {source}")]
    Configuration {
        brick: String,
        key: String,
        source: ConfigConversionError,
    },

    #[error("Brick '{key}': {source}")]
    AddBrick { key: String, source: AddBrickError },

    #[error("Connection '{from}' -> '{to}': {source}")]
    Connect {
        from: String,
        to: String,
        source: ConnectError,
    },

    #[error(transparent)]
    Create(#[from] CreateError),
}
