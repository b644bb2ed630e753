//! # brickflow - Brick Graph Execution Engine
//!
//! **brickflow** runs user-authored "functions": directed graphs of typed
//! processing units called bricks, wired together by typed connections.
//! Running a function evaluates its bricks in dependency order and collects
//! an ordered console trace.
//!
//! ## Core Workflow
//!
//! 1.  **Register brick types**: `BrickTypeRegistry::new()` ships the built-in
//!     catalog. Additional kinds are plain `BrickType` records.
//! 2.  **Edit a function**: `Workspace` exposes the mutations (`add_brick`,
//!     `connect`, `delete_brick`, `delete_function`, ...). Each one is checked
//!     against the resource limits and the graph invariants before it is
//!     stored: inputs accept a single connection, connected ports share a
//!     type, and no connection may close a cycle.
//! 3.  **Execute**: `Workspace::execute` loads the function into a
//!     `FunctionGraph`, validates it, and runs it with a topological executor.
//!     Bricks that become ready together run in creation order, so the same
//!     graph always produces the same console output.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use brickflow::prelude::*;
//!
//! fn main() -> Result<()> {
//!     let workspace = Workspace::default();
//!     let project = workspace.create_project(UserId(1), "Shop")?;
//!     let function = workspace.create_function(project.id, "greet")?;
//!
//!     let mut configuration = Configuration::new();
//!     configuration.insert("message".to_string(), ConfigValue::Text("Hello".to_string()));
//!     workspace.add_brick(function.id, "LogText", Position::new(100, 200), configuration)?;
//!
//!     let result = workspace.execute(function.id)?;
//!     assert_eq!(result.console_output, vec!["Hello".to_string()]);
//!     Ok(())
//! }
//! ```

pub mod console;
pub mod error;
pub mod executor;
pub mod graph;
pub mod limits;
pub mod model;
pub mod prelude;
pub mod registry;
pub mod store;
pub mod value;
pub mod workspace;
