//! Recipient list and recipient slice
//!
//! Recipients are always shown for one selected list. The selection is the
//! scope of the recipient table, so switching lists drops the old rows and
//! returns to the first page.

use crate::async_op::AsyncOp;
use crate::query::ListQuery;
use crate::slice::ListSlice;
use crate::store::Store;
use mailreach_client::models::{
    validate_payload, Recipient, RecipientList, RecipientListPayload, RecipientPayload,
    UploadSummary,
};
use mailreach_client::services::RecipientFilter;
use mailreach_client::NoFilter;
use mailreach_common::types::{RecipientId, RecipientListId};
use mailreach_common::{Error, Result};
use tracing::info;

#[derive(Debug, Clone)]
pub struct RecipientsState {
    pub lists: ListSlice<RecipientList, NoFilter>,
    /// Recipients of the selected list
    pub recipients: ListSlice<Recipient, RecipientFilter>,
    pub upload: AsyncOp,
    pub last_upload: Option<UploadSummary>,
}

impl RecipientsState {
    pub fn new(page_size: u32) -> Self {
        Self {
            lists: ListSlice::new(page_size),
            recipients: ListSlice::new(page_size),
            upload: AsyncOp::concurrent(),
            last_upload: None,
        }
    }

    pub fn selected_list(&self) -> Option<RecipientListId> {
        self.recipients.scope()
    }

    /// Name of a cached list, for resolving `recipient_list_id` references
    pub fn list_name(&self, id: RecipientListId) -> Option<&str> {
        self.lists.items.get(id).map(|list| list.name.as_str())
    }

    fn adjust_count(&mut self, list_id: RecipientListId, delta: i64) {
        self.lists.items.update_with(list_id, |list| {
            list.recipient_count = list.recipient_count.saturating_add_signed(delta);
        });
    }
}

fn no_selection() -> Error {
    Error::Validation("No recipient list selected".to_string())
}

impl Store {
    pub async fn fetch_recipient_lists(&self) -> Result<()> {
        let service = &self.services().recipients;
        self.fetch_list(
            |s| &mut s.recipients.lists,
            |_, params| async move { service.list_lists(&params).await },
        )
        .await
    }

    pub async fn update_recipient_list_query(
        &self,
        change: impl FnOnce(&mut ListQuery<NoFilter>) -> bool,
    ) -> Result<bool> {
        if !self.change_query(|s| &mut s.recipients.lists, change).await {
            return Ok(false);
        }
        self.fetch_recipient_lists().await?;
        Ok(true)
    }

    pub async fn create_recipient_list(&self, input: &RecipientListPayload) -> Result<RecipientList> {
        validate_payload(input)?;
        self.create_in(
            |s| &mut s.recipients.lists,
            self.services().recipients.create_list(input),
        )
        .await
    }

    pub async fn update_recipient_list(
        &self,
        id: RecipientListId,
        input: &RecipientListPayload,
    ) -> Result<Option<RecipientList>> {
        validate_payload(input)?;
        self.merge_in(
            |s| &mut s.recipients.lists,
            id,
            self.services().recipients.update_list(id, input),
        )
        .await
    }

    /// Delete a list. Its recipients go with it when it was selected.
    pub async fn delete_recipient_list(&self, id: RecipientListId) -> Result<()> {
        self.dispatch(
            |s| &mut s.recipients.lists.delete,
            self.services().recipients.delete_list(id),
            move |s, _: &()| {
                s.recipients.lists.apply_removed(id);
                if s.recipients.selected_list() == Some(id) {
                    s.recipients.recipients.set_scope(None);
                }
            },
        )
        .await
    }

    /// Select a list and load its first page of recipients
    pub async fn select_recipient_list(&self, id: RecipientListId) -> Result<()> {
        self.update(|s| {
            if s.recipients.recipients.set_scope(Some(id)) {
                info!("Selected recipient list {}", id);
            }
        })
        .await;
        self.fetch_recipients().await
    }

    /// GET the current page of recipients of the selected list
    pub async fn fetch_recipients(&self) -> Result<()> {
        if self.snapshot(|s| s.recipients.selected_list()).await.is_none() {
            return Err(no_selection());
        }
        let service = &self.services().recipients;
        self.fetch_list(
            |s| &mut s.recipients.recipients,
            |scope, params| async move {
                let list_id = scope.ok_or_else(no_selection)?;
                service.list_recipients(list_id, &params).await
            },
        )
        .await
    }

    pub async fn update_recipient_query(
        &self,
        change: impl FnOnce(&mut ListQuery<RecipientFilter>) -> bool,
    ) -> Result<bool> {
        if !self.change_query(|s| &mut s.recipients.recipients, change).await {
            return Ok(false);
        }
        self.fetch_recipients().await?;
        Ok(true)
    }

    async fn selected_list_or_err(&self) -> Result<RecipientListId> {
        self.snapshot(|s| s.recipients.selected_list())
            .await
            .ok_or_else(no_selection)
    }

    /// Add a recipient to the selected list
    pub async fn add_recipient(&self, input: &RecipientPayload) -> Result<Recipient> {
        validate_payload(input)?;
        let list_id = self.selected_list_or_err().await?;
        self.dispatch(
            |s| &mut s.recipients.recipients.create,
            self.services().recipients.add_recipient(list_id, input),
            move |s, recipient: &Recipient| {
                if s.recipients.selected_list() == Some(list_id) {
                    s.recipients.recipients.apply_created(recipient.clone());
                }
                s.recipients.adjust_count(list_id, 1);
            },
        )
        .await
    }

    pub async fn update_recipient(
        &self,
        id: RecipientId,
        input: &RecipientPayload,
    ) -> Result<Option<Recipient>> {
        validate_payload(input)?;
        let list_id = self.selected_list_or_err().await?;
        self.merge_in(
            |s| &mut s.recipients.recipients,
            id,
            self.services().recipients.update_recipient(list_id, id, input),
        )
        .await
    }

    pub async fn delete_recipient(&self, id: RecipientId) -> Result<()> {
        let list_id = self.selected_list_or_err().await?;
        self.dispatch(
            |s| &mut s.recipients.recipients.delete,
            self.services().recipients.delete_recipient(list_id, id),
            move |s, _: &()| {
                s.recipients.recipients.apply_removed(id);
                s.recipients.adjust_count(list_id, -1);
            },
        )
        .await
    }

    /// Upload a CSV of recipients into the selected list, then reload it
    pub async fn upload_recipients(&self, file_name: &str, content: Vec<u8>) -> Result<UploadSummary> {
        let list_id = self.selected_list_or_err().await?;
        let summary = self
            .dispatch(
                |s| &mut s.recipients.upload,
                self.services().recipients.upload(list_id, file_name, content),
                move |s, summary: &UploadSummary| {
                    s.recipients.adjust_count(list_id, summary.added as i64);
                    s.recipients.last_upload = Some(summary.clone());
                },
            )
            .await?;
        info!(
            "Imported {} recipients into list {} ({} skipped)",
            summary.added, list_id, summary.skipped
        );

        if self.snapshot(|s| s.recipients.selected_list()).await == Some(list_id) {
            self.fetch_recipients().await?;
        }
        Ok(summary)
    }
}
