//! Prelude module for convenient imports
//!
//! Re-exports the types most callers need to edit and run functions.
//!
//! # Example
//!
//! ```rust,no_run
//! use brickflow::prelude::*;
//!
//! # fn run_example() -> Result<()> {
//! let definition = WorkspaceDefinition::from_file("path/to/workspace.json")?;
//! let workspace = Workspace::default();
//! let project = workspace.create_project(UserId(1), "demo")?;
//!
//! for function in workspace.import_workspace(project.id, &definition)? {
//!     let result = workspace.execute(function.id)?;
//!     println!("{}", ConsoleFormatter::format_result(&result));
//! }
//! # Ok(())
//! # }
//! ```

// Operations and execution
pub use crate::executor::{ExecutionContext, ExecutionResult, Executor};
pub use crate::graph::{FunctionGraph, validate};
pub use crate::workspace::Workspace;

// Brick types and values
pub use crate::registry::{BoundInputs, BrickOutput, BrickType, BrickTypeRegistry, PortSpec};
pub use crate::value::{AttributeType, ConfigValue, Configuration, DataType, Instance, Value};

// Rows, ids and definitions
pub use crate::model::*;

// Limits and storage
pub use crate::limits::{Limits, Resource};
pub use crate::store::MemoryStore;

// Error types
pub use crate::error::{
    AddBrickError, BrickFailure, ConnectError, CreateError, DefinitionError, ExecuteError,
    ExecutionError, GraphError, LimitError, StoreError, ValidationError,
};

// Console formatting
pub use crate::console::ConsoleFormatter;

// Result type alias for convenience
pub type Result<T, E = Box<dyn std::error::Error>> = std::result::Result<T, E>;
