//! Single email service

use super::ListParams;
use crate::http::ApiClient;
use crate::models::{SingleEmail, SingleEmailPayload};
use crate::normalize::{maybe_entity, unwrap_entity, unwrap_entity_fields, unwrap_page, Page};
use mailreach_common::types::{Priority, SingleEmailId, SingleEmailStatus};
use mailreach_common::Result;
use serde::Serialize;
use serde_json::{Map, Value};

/// Server-side filters of the single email list
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct SingleEmailFilter {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<SingleEmailStatus>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub priority: Option<Priority>,
}

/// Single email endpoints
#[derive(Clone, Debug)]
pub struct SingleEmailService {
    client: ApiClient,
}

impl SingleEmailService {
    pub fn new(client: ApiClient) -> Self {
        Self { client }
    }

    /// GET /single-emails
    pub async fn list(&self, params: &ListParams<SingleEmailFilter>) -> Result<Page<SingleEmail>> {
        let body = self.client.get_with_query("/single-emails", params).await?;
        unwrap_page(&body, "emails", params.page, params.limit)
    }

    /// GET /single-emails/:id
    pub async fn get(&self, id: SingleEmailId) -> Result<SingleEmail> {
        let body = self.client.get(&format!("/single-emails/{}", id)).await?;
        unwrap_entity(&body, "email")
    }

    /// POST /single-emails, saved as a draft
    pub async fn create(&self, input: &SingleEmailPayload) -> Result<SingleEmail> {
        let body = self.client.post("/single-emails", input).await?;
        unwrap_entity(&body, "email")
    }

    /// PUT /single-emails/:id
    pub async fn update(
        &self,
        id: SingleEmailId,
        input: &SingleEmailPayload,
    ) -> Result<Map<String, Value>> {
        let body = self
            .client
            .put(&format!("/single-emails/{}", id), input)
            .await?;
        unwrap_entity_fields(&body, "email")
    }

    /// DELETE /single-emails/:id
    pub async fn delete(&self, id: SingleEmailId) -> Result<()> {
        self.client.delete(&format!("/single-emails/{}", id)).await?;
        Ok(())
    }

    /// POST /single-emails/:id/send
    pub async fn send(&self, id: SingleEmailId) -> Result<Option<SingleEmail>> {
        let body = self
            .client
            .post_empty(&format!("/single-emails/{}/send", id))
            .await?;
        maybe_entity(&body, "email")
    }

    /// POST /single-emails/send-now, creating and sending in one call
    pub async fn send_now(&self, input: &SingleEmailPayload) -> Result<SingleEmail> {
        let body = self.client.post("/single-emails/send-now", input).await?;
        unwrap_entity(&body, "email")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::test_support::client_for;
    use serde_json::json;
    use wiremock::matchers::{body_partial_json, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    #[tokio::test]
    async fn test_send_now() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/single-emails/send-now"))
            .and(body_partial_json(json!({"to_email": "bob@example.com", "priority": "high"})))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "data": {"email": {"id": 11, "to_email": "bob@example.com", "status": "sent", "priority": "high"}}
            })))
            .mount(&server)
            .await;

        let service = SingleEmailService::new(client_for(&server));
        let payload = SingleEmailPayload {
            to_email: "bob@example.com".to_string(),
            subject: "Hello".to_string(),
            body: "Hi Bob".to_string(),
            priority: Priority::High,
            ..Default::default()
        };
        let email = service.send_now(&payload).await.unwrap();
        assert_eq!(email.id, 11);
        assert_eq!(email.status, SingleEmailStatus::Sent);
    }

    #[tokio::test]
    async fn test_send_failure_surfaces_message() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/single-emails/4/send"))
            .respond_with(
                ResponseTemplate::new(400)
                    .set_body_json(json!({"detail": "SMTP account is inactive"})),
            )
            .mount(&server)
            .await;

        let service = SingleEmailService::new(client_for(&server));
        let err = service.send(4).await.unwrap_err();
        assert_eq!(err.status_code(), Some(400));
        assert_eq!(err.to_string(), "SMTP account is inactive");
    }
}
