use crate::value::Instance;
use ahash::AHashMap;

/// Read-only data a run may consult: the project's database instances,
/// keyed by database name, captured before execution starts.
#[derive(Debug, Clone, Default)]
pub struct ExecutionContext {
    databases: AHashMap<String, Vec<Instance>>,
}

impl ExecutionContext {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_database(mut self, name: &str, instances: Vec<Instance>) -> Self {
        self.insert_database(name, instances);
        self
    }

    pub fn insert_database(&mut self, name: &str, instances: Vec<Instance>) {
        self.databases.insert(name.to_string(), instances);
    }

    pub fn instances(&self, database: &str) -> Option<&[Instance]> {
        self.databases.get(database).map(Vec::as_slice)
    }

    pub fn database_count(&self) -> usize {
        self.databases.len()
    }
}
