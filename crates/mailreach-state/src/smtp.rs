//! SMTP account slice

use crate::async_op::AsyncOp;
use crate::query::ListQuery;
use crate::slice::ListSlice;
use crate::store::Store;
use mailreach_client::models::{
    validate_payload, ConnectionTestResult, CreateSmtpAccount, SmtpAccount, UpdateSmtpAccount,
};
use mailreach_client::services::SmtpFilter;
use mailreach_common::types::AccountId;
use mailreach_common::Result;
use std::collections::HashMap;
use tracing::info;

#[derive(Debug, Clone)]
pub struct SmtpState {
    pub accounts: ListSlice<SmtpAccount, SmtpFilter>,
    pub test: AsyncOp,
    /// Last connection test outcome per account
    pub test_results: HashMap<AccountId, ConnectionTestResult>,
}

impl SmtpState {
    pub fn new(page_size: u32) -> Self {
        Self {
            accounts: ListSlice::new(page_size),
            test: AsyncOp::concurrent(),
            test_results: HashMap::new(),
        }
    }

    /// First account flagged as default
    pub fn default_account(&self) -> Option<&SmtpAccount> {
        self.accounts.items.items().iter().find(|a| a.is_default)
    }

    pub fn active_accounts(&self) -> impl Iterator<Item = &SmtpAccount> {
        self.accounts.items.items().iter().filter(|a| a.is_active)
    }
}

impl Store {
    /// GET the current page of SMTP accounts
    pub async fn fetch_smtp_accounts(&self) -> Result<()> {
        let service = &self.services().smtp;
        self.fetch_list(
            |s| &mut s.smtp.accounts,
            |_, params| async move { service.list(&params).await },
        )
        .await
    }

    /// Change the account query and refetch when it actually changed
    pub async fn update_smtp_query(
        &self,
        change: impl FnOnce(&mut ListQuery<SmtpFilter>) -> bool,
    ) -> Result<bool> {
        if !self.change_query(|s| &mut s.smtp.accounts, change).await {
            return Ok(false);
        }
        self.fetch_smtp_accounts().await?;
        Ok(true)
    }

    pub async fn create_smtp_account(&self, input: &CreateSmtpAccount) -> Result<SmtpAccount> {
        validate_payload(input)?;
        let account = self
            .create_in(|s| &mut s.smtp.accounts, self.services().smtp.create(input))
            .await?;
        info!("Created SMTP account {} ({})", account.id, account.name);
        Ok(account)
    }

    pub async fn update_smtp_account(
        &self,
        id: AccountId,
        input: &UpdateSmtpAccount,
    ) -> Result<Option<SmtpAccount>> {
        validate_payload(input)?;
        self.merge_in(
            |s| &mut s.smtp.accounts,
            id,
            self.services().smtp.update(id, input),
        )
        .await
    }

    pub async fn delete_smtp_account(&self, id: AccountId) -> Result<()> {
        self.remove_in(|s| &mut s.smtp.accounts, id, self.services().smtp.delete(id))
            .await?;
        self.update(|s| s.smtp.test_results.remove(&id)).await;
        Ok(())
    }

    /// Run a connection test and keep its outcome next to the account
    pub async fn test_smtp_connection(&self, id: AccountId) -> Result<ConnectionTestResult> {
        self.dispatch(
            |s| &mut s.smtp.test,
            self.services().smtp.test_connection(id),
            move |s, result: &ConnectionTestResult| {
                s.smtp.test_results.insert(id, result.clone());
            },
        )
        .await
    }
}

#[cfg(test)]
mod tests {
    use crate::store::test_support::{store_for, store_with};
    use mailreach_client::models::UpdateSmtpAccount;
    use mailreach_common::config::SyncConfig;
    use mailreach_common::types::Provider;
    use mailreach_common::Error;
    use pretty_assertions::assert_eq;
    use serde_json::json;
    use wiremock::matchers::{method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    async fn mount_accounts(server: &MockServer) {
        Mock::given(method("GET"))
            .and(path("/smtp/accounts"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "data": {
                    "accounts": [
                        {"id": 1, "name": "Main", "is_default": true},
                        {"id": 2, "name": "Backup", "is_active": false}
                    ],
                    "pagination": {"total": 2, "page": 1, "pages": 1, "limit": 10}
                }
            })))
            .mount(server)
            .await;
    }

    #[tokio::test]
    async fn test_fetch_populates_slice() {
        let server = MockServer::start().await;
        mount_accounts(&server).await;

        let store = store_for(&server);
        store.fetch_smtp_accounts().await.unwrap();

        let state = store.read().await;
        assert_eq!(state.smtp.accounts.items.len(), 2);
        assert_eq!(state.smtp.accounts.pagination.total, 2);
        assert_eq!(state.smtp.default_account().unwrap().name, "Main");
        assert_eq!(state.smtp.active_accounts().count(), 1);
    }

    #[tokio::test]
    async fn test_update_merges_returned_fields() {
        let server = MockServer::start().await;
        mount_accounts(&server).await;
        Mock::given(method("PUT"))
            .and(path("/smtp/accounts/2"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "account": {"id": 2, "is_active": true}
            })))
            .mount(&server)
            .await;

        let store = store_for(&server);
        store.fetch_smtp_accounts().await.unwrap();
        let before = store.snapshot(|s| s.smtp.accounts.items.get(1).cloned()).await;

        let update = UpdateSmtpAccount {
            is_active: Some(true),
            ..Default::default()
        };
        let merged = store.update_smtp_account(2, &update).await.unwrap().unwrap();
        assert!(merged.is_active);
        assert_eq!(merged.name, "Backup");

        let after = store.snapshot(|s| s.smtp.accounts.items.get(1).cloned()).await;
        assert_eq!(before, after);
    }

    #[tokio::test]
    async fn test_invalid_update_sends_nothing() {
        let server = MockServer::start().await;
        let store = store_for(&server);

        let update = UpdateSmtpAccount {
            email: Some("nope".to_string()),
            ..Default::default()
        };
        let err = store.update_smtp_account(1, &update).await.unwrap_err();
        assert!(matches!(err, Error::Validation(_)));
        assert!(server.received_requests().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_filter_change_refetches_from_first_page() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/smtp/accounts"))
            .and(query_param("provider", "gmail"))
            .and(query_param("page", "1"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!([
                {"id": 7, "name": "Gmail", "provider": "gmail"}
            ])))
            .expect(1)
            .mount(&server)
            .await;

        let store = store_for(&server);
        store
            .update(|s| s.smtp.accounts.query.set_page(3))
            .await;

        let refetched = store
            .update_smtp_query(|q| q.update_filter(|f| f.provider = Some(Provider::Gmail)))
            .await
            .unwrap();
        assert!(refetched);
        assert_eq!(store.snapshot(|s| s.smtp.accounts.query.page()).await, 1);

        let again = store
            .update_smtp_query(|q| q.update_filter(|f| f.provider = Some(Provider::Gmail)))
            .await
            .unwrap();
        assert!(!again);
    }

    #[tokio::test]
    async fn test_unrecognized_shape_strict_and_lenient() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/smtp/accounts"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"result": "ok"})))
            .mount(&server)
            .await;

        let strict = store_for(&server);
        let err = strict.fetch_smtp_accounts().await.unwrap_err();
        assert!(matches!(err, Error::UnrecognizedShape { .. }));
        assert!(strict.read().await.smtp.accounts.fetch.error().is_some());

        let lenient = store_with(
            &server,
            SyncConfig {
                strict_shapes: false,
                ..Default::default()
            },
        );
        lenient
            .update(|s| {
                s.smtp
                    .accounts
                    .apply_created(serde_json::from_value(json!({"id": 9})).unwrap())
            })
            .await;
        lenient.fetch_smtp_accounts().await.unwrap();
        let state = lenient.read().await;
        assert!(state.smtp.accounts.items.is_empty());
        assert!(state.smtp.accounts.error().is_none());
    }

    #[tokio::test]
    async fn test_connection_result_is_kept_until_delete() {
        let server = MockServer::start().await;
        mount_accounts(&server).await;
        Mock::given(method("POST"))
            .and(path("/smtp/accounts/1/test"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "success": false,
                "message": "Authentication failed"
            })))
            .mount(&server)
            .await;
        Mock::given(method("DELETE"))
            .and(path("/smtp/accounts/1"))
            .respond_with(ResponseTemplate::new(204))
            .mount(&server)
            .await;

        let store = store_for(&server);
        store.fetch_smtp_accounts().await.unwrap();

        let result = store.test_smtp_connection(1).await.unwrap();
        assert!(!result.success);
        assert_eq!(
            store
                .snapshot(|s| s.smtp.test_results[&1].message.clone())
                .await
                .as_deref(),
            Some("Authentication failed")
        );

        store.delete_smtp_account(1).await.unwrap();
        let state = store.read().await;
        assert!(state.smtp.test_results.is_empty());
        assert_eq!(state.smtp.accounts.items.ids(), vec![2]);
    }
}
