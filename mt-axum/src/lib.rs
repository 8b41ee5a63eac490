//! mt-axum: Axum adapter for mt-core.
//!
//! Puts the tenant gate in front of an axum router and exposes
//! tenant services over REST.

pub mod app;
pub mod extract;
pub mod resolver;
pub mod rest;
pub mod state;
mod error;

pub use app::TenantApp;
pub use error::MtAxumError;
pub use extract::Tenant;
pub use resolver::{resolve_tenant, BypassList, Resolution, TenantResolver};
pub use state::ServiceState;
