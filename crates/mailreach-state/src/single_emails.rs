//! Single email slice

use crate::async_op::AsyncOp;
use crate::query::ListQuery;
use crate::slice::ListSlice;
use crate::store::Store;
use crate::view::poller::Poller;
use mailreach_client::models::{validate_payload, SingleEmail, SingleEmailPayload};
use mailreach_client::services::SingleEmailFilter;
use mailreach_common::types::{SingleEmailId, SingleEmailStatus};
use mailreach_common::Result;
use serde::Serialize;
use std::ops::ControlFlow;
use std::time::Duration;
use tracing::{debug, info, warn};

/// Result of re-sending a batch of emails
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct BulkOutcome {
    pub succeeded: Vec<SingleEmailId>,
    /// Failed ids with the error each one returned
    pub failed: Vec<(SingleEmailId, String)>,
}

impl BulkOutcome {
    pub fn attempted(&self) -> usize {
        self.succeeded.len() + self.failed.len()
    }

    pub fn all_succeeded(&self) -> bool {
        self.failed.is_empty()
    }
}

#[derive(Debug, Clone)]
pub struct SingleEmailsState {
    pub emails: ListSlice<SingleEmail, SingleEmailFilter>,
    pub send: AsyncOp,
    pub retry: AsyncOp,
    pub last_retry: Option<BulkOutcome>,
}

impl SingleEmailsState {
    pub fn new(page_size: u32) -> Self {
        Self {
            emails: ListSlice::new(page_size),
            send: AsyncOp::concurrent(),
            retry: AsyncOp::concurrent(),
            last_retry: None,
        }
    }

    /// Ids of cached emails whose delivery failed
    pub fn failed_ids(&self) -> Vec<SingleEmailId> {
        self.emails
            .items
            .items()
            .iter()
            .filter(|e| e.status == SingleEmailStatus::Failed)
            .map(|e| e.id)
            .collect()
    }

    fn apply_sent(&mut self, id: SingleEmailId, returned: Option<&SingleEmail>) {
        match returned {
            Some(email) => {
                self.emails.items.update_with(id, |cached| *cached = email.clone());
            }
            None => {
                self.emails.items.update_with(id, |cached| {
                    cached.status = SingleEmailStatus::Sending;
                    cached.error_message = None;
                });
            }
        }
    }
}

impl Store {
    pub async fn fetch_single_emails(&self) -> Result<()> {
        let service = &self.services().single_emails;
        self.fetch_list(
            |s| &mut s.single_emails.emails,
            |_, params| async move { service.list(&params).await },
        )
        .await
    }

    pub async fn update_single_email_query(
        &self,
        change: impl FnOnce(&mut ListQuery<SingleEmailFilter>) -> bool,
    ) -> Result<bool> {
        if !self.change_query(|s| &mut s.single_emails.emails, change).await {
            return Ok(false);
        }
        self.fetch_single_emails().await?;
        Ok(true)
    }

    /// Save a draft
    pub async fn create_single_email(&self, input: &SingleEmailPayload) -> Result<SingleEmail> {
        validate_payload(input)?;
        self.create_in(
            |s| &mut s.single_emails.emails,
            self.services().single_emails.create(input),
        )
        .await
    }

    pub async fn update_single_email(
        &self,
        id: SingleEmailId,
        input: &SingleEmailPayload,
    ) -> Result<Option<SingleEmail>> {
        validate_payload(input)?;
        self.merge_in(
            |s| &mut s.single_emails.emails,
            id,
            self.services().single_emails.update(id, input),
        )
        .await
    }

    pub async fn delete_single_email(&self, id: SingleEmailId) -> Result<()> {
        self.remove_in(
            |s| &mut s.single_emails.emails,
            id,
            self.services().single_emails.delete(id),
        )
        .await
    }

    /// Send a saved email. Without a returned email the row is marked as
    /// sending until the next refresh.
    pub async fn send_single_email(&self, id: SingleEmailId) -> Result<Option<SingleEmail>> {
        self.dispatch(
            |s| &mut s.single_emails.send,
            self.services().single_emails.send(id),
            move |s, returned: &Option<SingleEmail>| {
                s.single_emails.apply_sent(id, returned.as_ref())
            },
        )
        .await
    }

    /// Create and send in one call
    pub async fn send_single_email_now(&self, input: &SingleEmailPayload) -> Result<SingleEmail> {
        validate_payload(input)?;
        let email = self
            .dispatch(
                |s| &mut s.single_emails.send,
                self.services().single_emails.send_now(input),
                |s, email: &SingleEmail| s.single_emails.emails.apply_created(email.clone()),
            )
            .await?;
        info!("Sent email {} to {}", email.id, email.to_email);
        Ok(email)
    }

    /// Re-send every cached email in the failed state, one after another.
    ///
    /// Individual failures are collected rather than aborting the batch.
    pub async fn retry_failed_single_emails(&self) -> Result<BulkOutcome> {
        let ids = self.snapshot(|s| s.single_emails.failed_ids()).await;
        if ids.is_empty() {
            return Ok(BulkOutcome::default());
        }
        info!("Retrying {} failed emails", ids.len());

        let outcome = self
            .dispatch(
                |s| &mut s.single_emails.retry,
                async move {
                    let mut outcome = BulkOutcome::default();
                    for id in ids {
                        match self.send_single_email(id).await {
                            Ok(_) => outcome.succeeded.push(id),
                            Err(e) => outcome.failed.push((id, e.to_string())),
                        }
                    }
                    Ok(outcome)
                },
                |s, outcome: &BulkOutcome| s.single_emails.last_retry = Some(outcome.clone()),
            )
            .await?;

        if !outcome.all_succeeded() {
            warn!(
                "{} of {} retried emails failed again",
                outcome.failed.len(),
                outcome.attempted()
            );
        }
        Ok(outcome)
    }

    /// Refresh the email list every `single_email_refresh_secs`, skipping a
    /// tick while a fetch is still in flight
    pub fn auto_refresh_single_emails(&self) -> Poller {
        let store = self.clone();
        let period = Duration::from_secs(self.settings().single_email_refresh_secs.max(1));
        Poller::spawn(period, move || {
            let store = store.clone();
            async move {
                if store.snapshot(|s| s.single_emails.emails.is_loading()).await {
                    debug!("Email list refresh still in flight, skipping tick");
                } else if let Err(e) = store.fetch_single_emails().await {
                    warn!("Email list refresh failed: {}", e);
                }
                ControlFlow::Continue(())
            }
        })
    }
}
