//! Email template service

use super::{ListParams, NoFilter};
use crate::http::ApiClient;
use crate::models::{Template, TemplatePayload};
use crate::normalize::{unwrap_entity, unwrap_entity_fields, unwrap_page, Page};
use mailreach_common::types::TemplateId;
use mailreach_common::Result;
use serde_json::{Map, Value};

/// Template endpoints
#[derive(Clone, Debug)]
pub struct TemplateService {
    client: ApiClient,
}

impl TemplateService {
    pub fn new(client: ApiClient) -> Self {
        Self { client }
    }

    pub async fn list(&self, params: &ListParams<NoFilter>) -> Result<Page<Template>> {
        let body = self.client.get_with_query("/templates", params).await?;
        unwrap_page(&body, "templates", params.page, params.limit)
    }

    pub async fn get(&self, id: TemplateId) -> Result<Template> {
        let body = self.client.get(&format!("/templates/{}", id)).await?;
        unwrap_entity(&body, "template")
    }

    pub async fn create(&self, input: &TemplatePayload) -> Result<Template> {
        let body = self.client.post("/templates", input).await?;
        unwrap_entity(&body, "template")
    }

    pub async fn update(&self, id: TemplateId, input: &TemplatePayload) -> Result<Map<String, Value>> {
        let body = self.client.put(&format!("/templates/{}", id), input).await?;
        unwrap_entity_fields(&body, "template")
    }

    pub async fn delete(&self, id: TemplateId) -> Result<()> {
        self.client.delete(&format!("/templates/{}", id)).await?;
        Ok(())
    }
}
