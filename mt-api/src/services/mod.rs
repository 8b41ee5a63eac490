use std::sync::Arc;

use mt_core::{MemoryEngine, TenantDataSource, TenantService};
use serde_json::Value;

pub mod todos;

pub use todos::{TodoItem, TodosService};

pub struct Services {
    pub todos: Arc<dyn TenantService<Value>>,
}

/// Data source backed by the in-memory engine.
pub fn memory_source() -> TenantDataSource<TodoItem> {
    TenantDataSource::new(Arc::new(MemoryEngine::<TodoItem>::new()))
}

pub fn configure(source: TenantDataSource<TodoItem>) -> Services {
    Services {
        todos: Arc::new(TodosService::new(source)),
    }
}
