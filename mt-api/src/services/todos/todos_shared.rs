use mt_core::{MtError, ServiceCapabilities, ServiceParams};
use serde::de::DeserializeOwned;
use serde_json::Value;

use super::todo::TITLE_MAX_LEN;

pub fn crud_capabilities() -> ServiceCapabilities {
    ServiceCapabilities::standard_crud()
}

pub fn parse_body<T: DeserializeOwned>(data: Value) -> anyhow::Result<T> {
    serde_json::from_value(data).map_err(|e| {
        MtError::bad_request("Invalid todo payload")
            .with_errors(serde_json::json!({ "_schema": [e.to_string()] }))
            .with_source(e.into())
            .into_anyhow()
    })
}

/// Trimmed title, or `None` when blank.
pub fn clean_title(title: Option<&str>) -> Option<&str> {
    title.map(str::trim).filter(|t| !t.is_empty())
}

pub fn check_title_len(title: &str) -> anyhow::Result<()> {
    if title.chars().count() > TITLE_MAX_LEN {
        mt_core::bail_mt!(bad_request, "Title must be at most {} characters", TITLE_MAX_LEN);
    }
    Ok(())
}

pub fn not_found(id: &str) -> anyhow::Error {
    MtError::not_found(format!("Todo not found: {id}")).into_anyhow()
}

/// `?isDone=true|false` on list requests.
pub fn done_filter(params: &ServiceParams) -> anyhow::Result<Option<bool>> {
    match params.param("isDone") {
        None => Ok(None),
        Some(raw) => match raw.trim().to_ascii_lowercase().as_str() {
            "true" => Ok(Some(true)),
            "false" => Ok(Some(false)),
            _ => Err(MtError::bad_request("isDone must be true or false").into_anyhow()),
        },
    }
}
