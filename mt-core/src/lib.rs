//! mt-core: transport-agnostic tenant isolation.
//!
//! - [`TenantRegistry`]: the configured tenants and the header naming one
//! - [`TenantContext`]: request-scoped, bind-once tenant identity
//! - [`TenantDataSource`] / [`TenantSession`]: storage access that scopes
//!   every read and checks every write against the bound tenant

pub mod config;
pub mod errors;
pub mod memory;
pub mod registry;
pub mod service;
pub mod store;
pub mod tenant;

pub use config::{ConfigStore, TenancyConfig, TenantEntry};
pub use errors::{ErrorKind, MtError, TenancyError};
pub use memory::MemoryEngine;
pub use registry::TenantRegistry;
pub use service::{ServiceCapabilities, ServiceMethodKind, ServiceParams, TenantService};
pub use store::{Change, StorageEngine, TenantDataSource, TenantScoped, TenantSession};
pub use tenant::{TenantContext, TenantDefinition, TenantId};
