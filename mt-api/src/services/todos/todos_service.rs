use anyhow::Result;
use async_trait::async_trait;
use mt_core::{MtError, ServiceCapabilities, ServiceParams, TenantContext, TenantDataSource, TenantService};
use serde_json::Value;

use super::todo::{CreateTodoRequest, TodoItem, UpdateTodoRequest};
use super::todos_shared;

pub struct TodosService {
    source: TenantDataSource<TodoItem>,
}

impl TodosService {
    pub fn new(source: TenantDataSource<TodoItem>) -> Self {
        Self { source }
    }

    async fn apply_update(&self, ctx: &TenantContext, id: &str, data: Value) -> Result<Value> {
        let request: UpdateTodoRequest = todos_shared::parse_body(data)?;
        let title = todos_shared::clean_title(request.title.as_deref());
        if title.is_none() && request.is_done.is_none() {
            return Err(MtError::bad_request("Provide Title and/or IsDone").into_anyhow());
        }

        let mut session = self.source.session(ctx);
        let mut item = session.get(id).await?.ok_or_else(|| todos_shared::not_found(id))?;

        if let Some(title) = title {
            todos_shared::check_title_len(title)?;
            item.title = title.to_string();
        }
        if let Some(done) = request.is_done {
            item.is_done = done;
        }

        let dto = item.dto();
        session.update(item);
        session.save_changes().await?;
        Ok(dto)
    }
}

#[async_trait]
impl TenantService<Value> for TodosService {
    fn capabilities(&self) -> ServiceCapabilities {
        todos_shared::crud_capabilities()
    }

    async fn find(&self, ctx: &TenantContext, params: ServiceParams) -> Result<Vec<Value>> {
        let session = self.source.session(ctx);
        let mut items = match todos_shared::done_filter(&params)? {
            Some(done) => session.find(|t: &TodoItem| t.is_done == done).await?,
            None => session.list().await?,
        };
        items.sort_by(|a, b| b.created_utc.cmp(&a.created_utc));
        Ok(items.iter().map(TodoItem::summary).collect())
    }

    async fn get(&self, ctx: &TenantContext, id: &str, _params: ServiceParams) -> Result<Value> {
        let item = self
            .source
            .session(ctx)
            .get(id)
            .await?
            .ok_or_else(|| todos_shared::not_found(id))?;
        Ok(item.dto())
    }

    async fn create(&self, ctx: &TenantContext, data: Value, _params: ServiceParams) -> Result<Value> {
        let request: CreateTodoRequest = todos_shared::parse_body(data)?;
        let Some(title) = todos_shared::clean_title(request.title.as_deref()) else {
            return Err(MtError::bad_request("Title is required").into_anyhow());
        };
        todos_shared::check_title_len(title)?;

        let item = TodoItem::new(title);
        let id = item.id.clone();

        let mut session = self.source.session(ctx);
        session.add(item);
        session.save_changes().await?;

        // Read back through the session to return what was actually stored.
        let stored = session.get(&id).await?.ok_or_else(|| todos_shared::not_found(&id))?;
        tracing::info!(tenant = %stored.tenant_id, id = %stored.id, "todo created");
        Ok(serde_json::to_value(stored)?)
    }

    async fn update(&self, ctx: &TenantContext, id: &str, data: Value, _params: ServiceParams) -> Result<Value> {
        self.apply_update(ctx, id, data).await
    }

    async fn patch(&self, ctx: &TenantContext, id: &str, data: Value, _params: ServiceParams) -> Result<Value> {
        self.apply_update(ctx, id, data).await
    }

    async fn remove(&self, ctx: &TenantContext, id: &str, _params: ServiceParams) -> Result<Value> {
        let mut session = self.source.session(ctx);
        let item = session.get(id).await?.ok_or_else(|| todos_shared::not_found(id))?;
        let dto = item.dto();

        session.remove(item);
        session.save_changes().await?;
        tracing::info!(id, "todo removed");
        Ok(dto)
    }
}
