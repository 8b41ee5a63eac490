use chrono::{DateTime, Utc};
use mt_core::{TenantId, TenantScoped};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use uuid::Uuid;

pub const TITLE_MAX_LEN: usize = 200;

/// A todo entry. `tenant_id` is assigned by the data store, never by the
/// client.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TodoItem {
    pub id: String,
    pub tenant_id: String,
    pub title: String,
    pub is_done: bool,
    pub created_utc: DateTime<Utc>,
}

impl TodoItem {
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            tenant_id: String::new(),
            title: title.into(),
            is_done: false,
            created_utc: Utc::now(),
        }
    }

    /// Listing shape.
    pub fn summary(&self) -> Value {
        json!({ "id": self.id, "title": self.title, "isDone": self.is_done })
    }

    /// Single-item shape.
    pub fn dto(&self) -> Value {
        json!({
            "id": self.id,
            "title": self.title,
            "isDone": self.is_done,
            "createdUtc": self.created_utc,
        })
    }
}

impl TenantScoped for TodoItem {
    fn key(&self) -> &str {
        &self.id
    }

    fn tenant_id(&self) -> &str {
        &self.tenant_id
    }

    fn set_tenant_id(&mut self, tenant: &TenantId) {
        self.tenant_id = tenant.as_str().to_string();
    }
}

#[derive(Debug, Deserialize)]
pub struct CreateTodoRequest {
    pub title: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateTodoRequest {
    pub title: Option<String>,
    pub is_done: Option<bool>,
}
