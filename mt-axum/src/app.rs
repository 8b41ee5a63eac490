use std::sync::Arc;

use axum::routing::MethodRouter;
use axum::{middleware, Router};
use mt_core::{TenancyConfig, TenantService};
use serde::de::DeserializeOwned;
use serde::Serialize;
use tokio::net::{TcpListener, ToSocketAddrs};
use tower_http::request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer};
use tower_http::trace::TraceLayer;

use crate::resolver::{resolve_tenant, TenantResolver};
use crate::rest;

/// Router builder with the tenant gate in front of every route.
///
/// ```no_run
/// # use std::sync::Arc;
/// # use mt_core::TenancyConfig;
/// # async fn run(todos: Arc<dyn mt_core::TenantService<serde_json::Value>>) -> anyhow::Result<()> {
/// let config = TenancyConfig::default().with_tenant("acme", "Acme Corp");
/// mt_axum::TenantApp::from_config(&config)
///     .use_service("/todos", todos)
///     .listen("127.0.0.1:3030")
///     .await
/// # }
/// ```
#[derive(Clone)]
pub struct TenantApp {
    resolver: TenantResolver,
    router: Router<()>,
}

impl TenantApp {
    pub fn new(resolver: TenantResolver) -> Self {
        Self {
            resolver,
            router: Router::new(),
        }
    }

    pub fn from_config(config: &TenancyConfig) -> Self {
        Self::new(TenantResolver::from_config(config))
    }

    pub fn resolver(&self) -> &TenantResolver {
        &self.resolver
    }

    pub fn use_router(mut self, path: &str, router: Router<()>) -> Self {
        self.router = self.router.nest(path, router);
        self
    }

    pub fn route(mut self, path: &str, method_router: MethodRouter<()>) -> Self {
        self.router = self.router.route(path, method_router);
        self
    }

    pub fn use_service<R>(self, path: &str, service: Arc<dyn TenantService<R>>) -> Self
    where
        R: Serialize + DeserializeOwned + Send + Sync + 'static,
    {
        let router = rest::service_router(path, service);
        self.use_router(path, router)
    }

    /// Finish the router. Outermost first: request id, tracing, request id
    /// propagation, tenant resolution.
    pub fn into_router(self) -> Router<()> {
        self.router
            .layer(middleware::from_fn_with_state(self.resolver, resolve_tenant))
            .layer(PropagateRequestIdLayer::x_request_id())
            .layer(TraceLayer::new_for_http())
            .layer(SetRequestIdLayer::x_request_id(MakeRequestUuid))
    }

    pub async fn listen<A>(self, addr: A) -> anyhow::Result<()>
    where
        A: ToSocketAddrs,
    {
        let listener = TcpListener::bind(addr).await?;
        tracing::info!(addr = %listener.local_addr()?, "listening");
        axum::serve(listener, self.into_router()).await?;
        Ok(())
    }
}
