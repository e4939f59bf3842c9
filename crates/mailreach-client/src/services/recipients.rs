//! Recipient list and recipient service

use super::{ListParams, NoFilter};
use crate::http::ApiClient;
use crate::models::{Recipient, RecipientList, RecipientListPayload, RecipientPayload, UploadSummary};
use crate::normalize::{unwrap_entity, unwrap_entity_fields, unwrap_page, Page};
use mailreach_common::types::{RecipientId, RecipientListId, RecipientStatus};
use mailreach_common::Result;
use serde::Serialize;
use serde_json::{Map, Value};

/// Server-side filters of the recipient table
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct RecipientFilter {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<RecipientStatus>,
}

/// Recipient endpoints
#[derive(Clone, Debug)]
pub struct RecipientService {
    client: ApiClient,
}

impl RecipientService {
    pub fn new(client: ApiClient) -> Self {
        Self { client }
    }

    /// GET /recipients/lists
    pub async fn list_lists(&self, params: &ListParams<NoFilter>) -> Result<Page<RecipientList>> {
        let body = self.client.get_with_query("/recipients/lists", params).await?;
        unwrap_page(&body, "lists", params.page, params.limit)
    }

    /// GET /recipients/lists/:id
    pub async fn get_list(&self, id: RecipientListId) -> Result<RecipientList> {
        let body = self.client.get(&format!("/recipients/lists/{}", id)).await?;
        unwrap_entity(&body, "list")
    }

    /// POST /recipients/lists
    pub async fn create_list(&self, input: &RecipientListPayload) -> Result<RecipientList> {
        let body = self.client.post("/recipients/lists", input).await?;
        unwrap_entity(&body, "list")
    }

    /// PUT /recipients/lists/:id
    pub async fn update_list(
        &self,
        id: RecipientListId,
        input: &RecipientListPayload,
    ) -> Result<Map<String, Value>> {
        let body = self
            .client
            .put(&format!("/recipients/lists/{}", id), input)
            .await?;
        unwrap_entity_fields(&body, "list")
    }

    /// DELETE /recipients/lists/:id
    pub async fn delete_list(&self, id: RecipientListId) -> Result<()> {
        self.client.delete(&format!("/recipients/lists/{}", id)).await?;
        Ok(())
    }

    /// GET /recipients/lists/:id/recipients
    pub async fn list_recipients(
        &self,
        list_id: RecipientListId,
        params: &ListParams<RecipientFilter>,
    ) -> Result<Page<Recipient>> {
        let body = self
            .client
            .get_with_query(&format!("/recipients/lists/{}/recipients", list_id), params)
            .await?;
        unwrap_page(&body, "recipients", params.page, params.limit)
    }

    /// POST /recipients/lists/:id/recipients
    pub async fn add_recipient(
        &self,
        list_id: RecipientListId,
        input: &RecipientPayload,
    ) -> Result<Recipient> {
        let body = self
            .client
            .post(&format!("/recipients/lists/{}/recipients", list_id), input)
            .await?;
        unwrap_entity(&body, "recipient")
    }

    /// PUT /recipients/lists/:id/recipients/:recipient_id
    pub async fn update_recipient(
        &self,
        list_id: RecipientListId,
        id: RecipientId,
        input: &RecipientPayload,
    ) -> Result<Map<String, Value>> {
        let body = self
            .client
            .put(
                &format!("/recipients/lists/{}/recipients/{}", list_id, id),
                input,
            )
            .await?;
        unwrap_entity_fields(&body, "recipient")
    }

    /// DELETE /recipients/lists/:id/recipients/:recipient_id
    pub async fn delete_recipient(&self, list_id: RecipientListId, id: RecipientId) -> Result<()> {
        self.client
            .delete(&format!("/recipients/lists/{}/recipients/{}", list_id, id))
            .await?;
        Ok(())
    }

    /// POST /recipients/lists/:id/upload with a CSV file
    pub async fn upload(
        &self,
        list_id: RecipientListId,
        file_name: &str,
        content: Vec<u8>,
    ) -> Result<UploadSummary> {
        let body = self
            .client
            .upload(
                &format!("/recipients/lists/{}/upload", list_id),
                file_name,
                content,
                "text/csv",
            )
            .await?;
        unwrap_entity(&body, "summary")
    }
}
