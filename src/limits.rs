//! Resource caps checked before every creating mutation.
//!
//! Guards compare an explicit count, read from the store by the caller,
//! against the configured limit. A count at or above the limit rejects.

use crate::error::LimitError;
use serde::{Deserialize, Serialize};
use std::fmt;

pub const MAX_BRICKS_PER_FUNCTION: usize = 100;
pub const MAX_INSTANCES_PER_DATABASE: usize = 10_000;
pub const MAX_FUNCTIONS_PER_PROJECT: usize = 500;
pub const MAX_PROJECTS_PER_USER: usize = 1_000;

/// A capped resource.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Resource {
    BricksPerFunction,
    InstancesPerDatabase,
    FunctionsPerProject,
    ProjectsPerUser,
}

impl fmt::Display for Resource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Resource::BricksPerFunction => "bricks per function",
            Resource::InstancesPerDatabase => "database instances per database",
            Resource::FunctionsPerProject => "functions per project",
            Resource::ProjectsPerUser => "projects per user",
        };
        f.write_str(name)
    }
}

/// Configured caps. `Limits::default()` holds the published numbers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Limits {
    pub bricks_per_function: usize,
    pub instances_per_database: usize,
    pub functions_per_project: usize,
    pub projects_per_user: usize,
}

impl Default for Limits {
    fn default() -> Self {
        Self {
            bricks_per_function: MAX_BRICKS_PER_FUNCTION,
            instances_per_database: MAX_INSTANCES_PER_DATABASE,
            functions_per_project: MAX_FUNCTIONS_PER_PROJECT,
            projects_per_user: MAX_PROJECTS_PER_USER,
        }
    }
}

impl Limits {
    pub fn limit_for(&self, resource: Resource) -> usize {
        match resource {
            Resource::BricksPerFunction => self.bricks_per_function,
            Resource::InstancesPerDatabase => self.instances_per_database,
            Resource::FunctionsPerProject => self.functions_per_project,
            Resource::ProjectsPerUser => self.projects_per_user,
        }
    }

    /// Rejects when `count` existing items already reach the cap for `resource`.
    pub fn check(&self, resource: Resource, count: usize) -> Result<(), LimitError> {
        ensure_below(resource, count, self.limit_for(resource))
    }

    pub fn check_bricks(&self, count: usize) -> Result<(), LimitError> {
        self.check(Resource::BricksPerFunction, count)
    }

    pub fn check_instances(&self, count: usize) -> Result<(), LimitError> {
        self.check(Resource::InstancesPerDatabase, count)
    }

    pub fn check_functions(&self, count: usize) -> Result<(), LimitError> {
        self.check(Resource::FunctionsPerProject, count)
    }

    pub fn check_projects(&self, count: usize) -> Result<(), LimitError> {
        self.check(Resource::ProjectsPerUser, count)
    }
}

pub fn ensure_below(resource: Resource, count: usize, limit: usize) -> Result<(), LimitError> {
    if count >= limit {
        tracing::warn!(%resource, count, limit, "limit reached");
        return Err(LimitError::LimitReached {
            resource,
            limit,
            count,
        });
    }
    Ok(())
}
