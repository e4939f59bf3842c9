//! SMTP account service

use super::ListParams;
use crate::http::ApiClient;
use crate::models::{ConnectionTestResult, CreateSmtpAccount, SmtpAccount, UpdateSmtpAccount};
use crate::normalize::{unwrap_entity, unwrap_entity_fields, unwrap_page, Page};
use mailreach_common::types::{AccountId, Provider};
use mailreach_common::Result;
use serde::Serialize;
use serde_json::{Map, Value};

/// Server-side filters of the SMTP account list
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct SmtpFilter {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub provider: Option<Provider>,
    #[serde(skip_serializing_if = "std::ops::Not::not")]
    pub active_only: bool,
}

/// SMTP account endpoints
#[derive(Clone, Debug)]
pub struct SmtpService {
    client: ApiClient,
}

impl SmtpService {
    pub fn new(client: ApiClient) -> Self {
        Self { client }
    }

    /// GET /smtp/accounts
    pub async fn list(&self, params: &ListParams<SmtpFilter>) -> Result<Page<SmtpAccount>> {
        let body = self.client.get_with_query("/smtp/accounts", params).await?;
        unwrap_page(&body, "accounts", params.page, params.limit)
    }

    /// GET /smtp/accounts/:id
    pub async fn get(&self, id: AccountId) -> Result<SmtpAccount> {
        let body = self.client.get(&format!("/smtp/accounts/{}", id)).await?;
        unwrap_entity(&body, "account")
    }

    /// POST /smtp/accounts
    pub async fn create(&self, input: &CreateSmtpAccount) -> Result<SmtpAccount> {
        let body = self.client.post("/smtp/accounts", input).await?;
        unwrap_entity(&body, "account")
    }

    /// PUT /smtp/accounts/:id, returning the fields the backend sent back
    pub async fn update(&self, id: AccountId, input: &UpdateSmtpAccount) -> Result<Map<String, Value>> {
        let body = self
            .client
            .put(&format!("/smtp/accounts/{}", id), input)
            .await?;
        unwrap_entity_fields(&body, "account")
    }

    /// DELETE /smtp/accounts/:id
    pub async fn delete(&self, id: AccountId) -> Result<()> {
        self.client.delete(&format!("/smtp/accounts/{}", id)).await?;
        Ok(())
    }

    /// POST /smtp/accounts/:id/test
    pub async fn test_connection(&self, id: AccountId) -> Result<ConnectionTestResult> {
        let body = self
            .client
            .post_empty(&format!("/smtp/accounts/{}/test", id))
            .await?;
        unwrap_entity(&body, "result")
    }
}
