//! Tenant-enforcing data access.
//!
//! Services never touch a [`StorageEngine`] directly. They hold a
//! [`TenantDataSource`], and the only thing a data source can do is open a
//! [`TenantSession`] for a request's [`TenantContext`]. Every read through a
//! session is filtered to the bound tenant, and every commit is checked
//! against it before anything reaches the engine.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use anyhow::Result;
use async_trait::async_trait;

use crate::errors::TenancyError;
use crate::tenant::{TenantContext, TenantId};

/// A persisted record that belongs to exactly one tenant.
pub trait TenantScoped: Clone + Send + Sync + 'static {
    /// Primary key, unique across all tenants.
    ///
    /// Creating a key another tenant already holds fails with `Conflict`,
    /// which tells the caller the key is taken. Keys should therefore be
    /// generated server-side and be unguessable (UUIDs), never taken from
    /// client input.
    fn key(&self) -> &str;

    fn tenant_id(&self) -> &str;

    fn set_tenant_id(&mut self, tenant: &TenantId);
}

/// A pending write.
#[derive(Debug, Clone, PartialEq)]
pub enum Change<R> {
    Create(R),
    Update(R),
    Delete(R),
}

impl<R> Change<R> {
    pub fn record(&self) -> &R {
        match self {
            Change::Create(r) | Change::Update(r) | Change::Delete(r) => r,
        }
    }
}

pub type Predicate<'a, R> = &'a (dyn Fn(&R) -> bool + Send + Sync);

/// The underlying storage engine.
///
/// `query` knows nothing about tenants. `commit` writes on behalf of one
/// tenant and must apply the whole batch or none of it.
#[async_trait]
pub trait StorageEngine<R>: Send + Sync
where
    R: Send + Sync + 'static,
{
    async fn query(&self, predicate: Predicate<'_, R>) -> Result<Vec<R>>;

    /// Apply a batch atomically for `tenant`, returning the number of
    /// changes applied.
    ///
    /// Every record in the batch must carry `tenant`, and every stored row an
    /// update or delete replaces must belong to `tenant`. Both are checked
    /// under the same lock or transaction that applies the writes. A
    /// violation fails the whole batch with
    /// [`TenancyError::CrossTenantWriteBlocked`].
    async fn commit(&self, tenant: &TenantId, batch: Vec<Change<R>>) -> Result<usize>;
}

/// Handle that services hold instead of an engine.
pub struct TenantDataSource<R>
where
    R: TenantScoped,
{
    engine: Arc<dyn StorageEngine<R>>,
}

impl<R> Clone for TenantDataSource<R>
where
    R: TenantScoped,
{
    fn clone(&self) -> Self {
        Self {
            engine: Arc::clone(&self.engine),
        }
    }
}

impl<R> TenantDataSource<R>
where
    R: TenantScoped,
{
    pub fn new(engine: Arc<dyn StorageEngine<R>>) -> Self {
        Self { engine }
    }

    /// Open a unit of work for one request.
    pub fn session(&self, ctx: &TenantContext) -> TenantSession<R> {
        TenantSession {
            engine: Arc::clone(&self.engine),
            tenant: ctx.tenant_id().ok().cloned(),
            pending: Vec::new(),
        }
    }
}

/// A request-scoped unit of work.
///
/// Writes are staged with [`add`](Self::add), [`update`](Self::update) and
/// [`remove`](Self::remove) and only reach storage on
/// [`save_changes`](Self::save_changes). Dropping a session discards
/// whatever is still staged.
pub struct TenantSession<R>
where
    R: TenantScoped,
{
    engine: Arc<dyn StorageEngine<R>>,
    tenant: Option<TenantId>,
    pending: Vec<Change<R>>,
}

impl<R> TenantSession<R>
where
    R: TenantScoped,
{
    pub fn tenant(&self) -> Result<&TenantId, TenancyError> {
        self.tenant.as_ref().ok_or(TenancyError::ContextNotBound)
    }

    /// Records of the bound tenant matching `predicate`.
    pub async fn find<F>(&self, predicate: F) -> Result<Vec<R>>
    where
        F: Fn(&R) -> bool + Send + Sync,
    {
        let tenant = self.tenant()?.clone();
        let scoped = move |r: &R| r.tenant_id() == tenant.as_str() && predicate(r);
        self.engine.query(&scoped).await
    }

    pub async fn list(&self) -> Result<Vec<R>> {
        self.find(|_| true).await
    }

    /// Look up one record by key. A record owned by another tenant is
    /// reported exactly like a missing one.
    pub async fn get(&self, key: &str) -> Result<Option<R>> {
        let mut found = self.find(|r| r.key() == key).await?;
        Ok(found.pop())
    }

    pub fn add(&mut self, record: R) {
        self.pending.push(Change::Create(record));
    }

    pub fn update(&mut self, record: R) {
        self.pending.push(Change::Update(record));
    }

    pub fn remove(&mut self, record: R) {
        self.pending.push(Change::Delete(record));
    }

    pub fn pending(&self) -> usize {
        self.pending.len()
    }

    /// Validate the whole staged batch against the bound tenant, then hand
    /// it to the engine. Any violation drops the batch; nothing is written.
    ///
    /// - new records are stamped with the bound tenant
    /// - updated and deleted records must carry the bound tenant, and so
    ///   must the stored row they replace
    ///
    /// The stored-row check is repeated by the engine at commit time, so a
    /// row another tenant writes in between is never overwritten.
    pub async fn save_changes(&mut self) -> Result<usize> {
        let batch = std::mem::take(&mut self.pending);

        let Some(tenant) = self.tenant.clone() else {
            tracing::error!(staged = batch.len(), "refusing to write without a bound tenant");
            return Err(TenancyError::TenantContextUnbound.into_anyhow());
        };

        if batch.is_empty() {
            return Ok(0);
        }

        let touched: HashSet<String> = batch
            .iter()
            .filter(|c| !matches!(c, Change::Create(_)))
            .map(|c| c.record().key().to_string())
            .collect();

        let stored: HashMap<String, R> = if touched.is_empty() {
            HashMap::new()
        } else {
            let wanted = |r: &R| touched.contains(r.key());
            self.engine
                .query(&wanted)
                .await?
                .into_iter()
                .map(|r| (r.key().to_string(), r))
                .collect()
        };

        let mut checked = Vec::with_capacity(batch.len());
        for change in batch {
            match change {
                Change::Create(mut record) => {
                    record.set_tenant_id(&tenant);
                    checked.push(Change::Create(record));
                }
                Change::Update(record) | Change::Delete(record)
                    if !owned_by(&record, &tenant, stored.get(record.key())) =>
                {
                    tracing::warn!(
                        security = true,
                        tenant = %tenant,
                        record_tenant = record.tenant_id(),
                        key = record.key(),
                        "cross-tenant write blocked"
                    );
                    return Err(TenancyError::CrossTenantWriteBlocked.into_anyhow());
                }
                other => checked.push(other),
            }
        }

        match self.engine.commit(&tenant, checked).await {
            Ok(applied) => {
                tracing::debug!(tenant = %tenant, applied, "changes saved");
                Ok(applied)
            }
            Err(err) => {
                if err.downcast_ref::<TenancyError>() == Some(&TenancyError::CrossTenantWriteBlocked) {
                    tracing::warn!(security = true, tenant = %tenant, "cross-tenant write blocked at commit");
                }
                Err(err)
            }
        }
    }
}

fn owned_by<R: TenantScoped>(record: &R, tenant: &TenantId, stored: Option<&R>) -> bool {
    record.tenant_id() == tenant.as_str()
        && stored.map_or(true, |s| s.tenant_id() == tenant.as_str())
}
