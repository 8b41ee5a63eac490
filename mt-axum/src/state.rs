use std::sync::Arc;

use mt_core::TenantService;

/// Router state for one mounted service.
pub struct ServiceState<R>
where
    R: Send + Sync + 'static,
{
    pub path: Arc<str>,
    pub service: Arc<dyn TenantService<R>>,
}

impl<R> Clone for ServiceState<R>
where
    R: Send + Sync + 'static,
{
    fn clone(&self) -> Self {
        Self {
            path: Arc::clone(&self.path),
            service: Arc::clone(&self.service),
        }
    }
}

impl<R> ServiceState<R>
where
    R: Send + Sync + 'static,
{
    pub fn new(path: &str, service: Arc<dyn TenantService<R>>) -> Self {
        Self {
            path: Arc::from(path.trim_end_matches('/')),
            service,
        }
    }

    pub fn name(&self) -> &str {
        self.path.trim_start_matches('/')
    }
}
