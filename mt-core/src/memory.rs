use std::collections::{BTreeMap, HashSet};

use anyhow::Result;
use async_trait::async_trait;
use tokio::sync::RwLock;

use crate::errors::{MtError, TenancyError};
use crate::store::{Change, Predicate, StorageEngine, TenantScoped};
use crate::tenant::TenantId;

/// In-memory storage engine for development and tests.
///
/// A batch is checked in full under the write lock before any row changes,
/// so a failed commit leaves the map untouched. Ownership of the rows an
/// update or delete replaces is checked under that same lock.
pub struct MemoryEngine<R> {
    rows: RwLock<BTreeMap<String, R>>,
}

impl<R> MemoryEngine<R> {
    pub fn new() -> Self {
        Self {
            rows: RwLock::new(BTreeMap::new()),
        }
    }

    pub async fn len(&self) -> usize {
        self.rows.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.rows.read().await.is_empty()
    }
}

impl<R> Default for MemoryEngine<R> {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl<R> StorageEngine<R> for MemoryEngine<R>
where
    R: TenantScoped,
{
    async fn query(&self, predicate: Predicate<'_, R>) -> Result<Vec<R>> {
        let rows = self.rows.read().await;
        Ok(rows.values().filter(|r| predicate(r)).cloned().collect())
    }

    async fn commit(&self, tenant: &TenantId, batch: Vec<Change<R>>) -> Result<usize> {
        let mut rows = self.rows.write().await;

        // Replay key presence over the batch before mutating anything.
        let mut created: HashSet<&str> = HashSet::new();
        let mut deleted: HashSet<&str> = HashSet::new();
        for change in &batch {
            let record = change.record();
            let key = record.key();
            let exists = (rows.contains_key(key) || created.contains(key)) && !deleted.contains(key);
            let foreign_row = !created.contains(key)
                && rows.get(key).is_some_and(|r| r.tenant_id() != tenant.as_str());
            match change {
                _ if record.tenant_id() != tenant.as_str() => {
                    return Err(TenancyError::CrossTenantWriteBlocked.into_anyhow());
                }
                Change::Create(_) if exists => {
                    return Err(MtError::conflict(format!("Record already exists: {key}")).into_anyhow());
                }
                Change::Create(_) => {
                    created.insert(key);
                    deleted.remove(key);
                }
                Change::Update(_) | Change::Delete(_) if exists && foreign_row => {
                    return Err(TenancyError::CrossTenantWriteBlocked.into_anyhow());
                }
                Change::Update(_) | Change::Delete(_) if !exists => {
                    return Err(MtError::not_found(format!("Record not found: {key}")).into_anyhow());
                }
                Change::Update(_) => {}
                Change::Delete(_) => {
                    deleted.insert(key);
                }
            }
        }

        let applied = batch.len();
        for change in batch {
            match change {
                Change::Create(r) | Change::Update(r) => {
                    rows.insert(r.key().to_string(), r);
                }
                Change::Delete(r) => {
                    rows.remove(r.key());
                }
            }
        }

        Ok(applied)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, Clone, PartialEq)]
    struct Row {
        id: String,
        tenant: String,
    }

    impl TenantScoped for Row {
        fn key(&self) -> &str {
            &self.id
        }

        fn tenant_id(&self) -> &str {
            &self.tenant
        }

        fn set_tenant_id(&mut self, tenant: &TenantId) {
            self.tenant = tenant.as_str().to_string();
        }
    }

    fn row(id: &str, tenant: &str) -> Row {
        Row {
            id: id.to_string(),
            tenant: tenant.to_string(),
        }
    }

    fn blocked(err: &anyhow::Error) -> bool {
        err.downcast_ref::<TenancyError>() == Some(&TenancyError::CrossTenantWriteBlocked)
    }

    #[tokio::test]
    async fn commit_refuses_rows_of_another_tenant() {
        let engine = MemoryEngine::<Row>::new();
        let acme = TenantId::new("acme");
        let globex = TenantId::new("globex");
        engine.commit(&globex, vec![Change::Create(row("k", "globex"))]).await.unwrap();

        let err = engine.commit(&acme, vec![Change::Update(row("k", "acme"))]).await.unwrap_err();
        assert!(blocked(&err));
        let err = engine.commit(&acme, vec![Change::Delete(row("k", "acme"))]).await.unwrap_err();
        assert!(blocked(&err));
        let err = engine.commit(&acme, vec![Change::Create(row("n", "globex"))]).await.unwrap_err();
        assert!(blocked(&err));

        let rows = engine.query(&|_: &Row| true).await.unwrap();
        assert_eq!(rows, vec![row("k", "globex")]);
    }

    #[tokio::test]
    async fn delete_then_recreate_in_one_batch_is_allowed() {
        let engine = MemoryEngine::<Row>::new();
        let acme = TenantId::new("acme");
        engine.commit(&acme, vec![Change::Create(row("k", "acme"))]).await.unwrap();

        let applied = engine
            .commit(&acme, vec![Change::Delete(row("k", "acme")), Change::Create(row("k", "acme"))])
            .await
            .unwrap();
        assert_eq!(applied, 2);
        assert_eq!(engine.len().await, 1);
    }
}
