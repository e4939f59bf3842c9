//! Campaign service

use super::ListParams;
use crate::http::ApiClient;
use crate::models::{Campaign, CampaignPayload};
use crate::normalize::{maybe_entity, unwrap_entity, unwrap_entity_fields, unwrap_page, Page};
use mailreach_common::types::{CampaignAction, CampaignId, CampaignStatus};
use mailreach_common::Result;
use serde::Serialize;
use serde_json::{Map, Value};

/// Server-side filters of the campaign list
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct CampaignFilter {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<CampaignStatus>,
}

/// Campaign endpoints
#[derive(Clone, Debug)]
pub struct CampaignService {
    client: ApiClient,
}

impl CampaignService {
    pub fn new(client: ApiClient) -> Self {
        Self { client }
    }

    /// GET /campaigns
    pub async fn list(&self, params: &ListParams<CampaignFilter>) -> Result<Page<Campaign>> {
        let body = self.client.get_with_query("/campaigns", params).await?;
        unwrap_page(&body, "campaigns", params.page, params.limit)
    }

    /// GET /campaigns/:id
    pub async fn get(&self, id: CampaignId) -> Result<Campaign> {
        let body = self.client.get(&format!("/campaigns/{}", id)).await?;
        unwrap_entity(&body, "campaign")
    }

    /// POST /campaigns
    pub async fn create(&self, input: &CampaignPayload) -> Result<Campaign> {
        let body = self.client.post("/campaigns", input).await?;
        unwrap_entity(&body, "campaign")
    }

    /// PUT /campaigns/:id
    pub async fn update(&self, id: CampaignId, input: &CampaignPayload) -> Result<Map<String, Value>> {
        let body = self.client.put(&format!("/campaigns/{}", id), input).await?;
        unwrap_entity_fields(&body, "campaign")
    }

    /// DELETE /campaigns/:id
    pub async fn delete(&self, id: CampaignId) -> Result<()> {
        self.client.delete(&format!("/campaigns/{}", id)).await?;
        Ok(())
    }

    /// POST /campaigns/:id/{send,pause,resume,cancel,duplicate}
    ///
    /// Returns the campaign when the backend sends it back. For `duplicate`
    /// that is the new copy.
    pub async fn perform(&self, id: CampaignId, action: CampaignAction) -> Result<Option<Campaign>> {
        let body = self
            .client
            .post_empty(&format!("/campaigns/{}/{}", id, action))
            .await?;
        maybe_entity(&body, "campaign")
    }

    pub async fn send(&self, id: CampaignId) -> Result<Option<Campaign>> {
        self.perform(id, CampaignAction::Send).await
    }

    pub async fn pause(&self, id: CampaignId) -> Result<Option<Campaign>> {
        self.perform(id, CampaignAction::Pause).await
    }

    pub async fn resume(&self, id: CampaignId) -> Result<Option<Campaign>> {
        self.perform(id, CampaignAction::Resume).await
    }

    pub async fn cancel(&self, id: CampaignId) -> Result<Option<Campaign>> {
        self.perform(id, CampaignAction::Cancel).await
    }

    pub async fn duplicate(&self, id: CampaignId) -> Result<Option<Campaign>> {
        self.perform(id, CampaignAction::Duplicate).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::test_support::client_for;
    use serde_json::json;
    use wiremock::matchers::{method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    #[tokio::test]
    async fn test_list_by_status() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/campaigns"))
            .and(query_param("status", "draft"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "campaigns": [{"id": 1, "name": "Spring", "status": "draft"}]
            })))
            .mount(&server)
            .await;

        let service = CampaignService::new(client_for(&server));
        let mut params = ListParams::<CampaignFilter>::default();
        params.filter.status = Some(CampaignStatus::Draft);
        let page = service.list(&params).await.unwrap();
        assert_eq!(page.items[0].status, CampaignStatus::Draft);
    }

    #[tokio::test]
    async fn test_actions_with_and_without_entity() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/campaigns/3/pause"))
            .respond_with(
                ResponseTemplate::new(200).set_body_json(json!({"message": "Campaign paused"})),
            )
            .mount(&server)
            .await;
        Mock::given(method("POST"))
            .and(path("/campaigns/3/duplicate"))
            .respond_with(ResponseTemplate::new(201).set_body_json(json!({
                "data": {"campaign": {"id": 8, "name": "Spring (copy)", "status": "draft"}}
            })))
            .mount(&server)
            .await;

        let service = CampaignService::new(client_for(&server));
        assert!(service.pause(3).await.unwrap().is_none());

        let copy = service.duplicate(3).await.unwrap().unwrap();
        assert_eq!(copy.id, 8);
        assert_eq!(copy.name, "Spring (copy)");
    }
}
