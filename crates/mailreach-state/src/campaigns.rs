//! Campaign slice

use crate::async_op::AsyncOp;
use crate::cache::merge_fields;
use crate::query::ListQuery;
use crate::slice::ListSlice;
use crate::store::Store;
use crate::view::campaign_detail::{CampaignDetailView, DetailTab};
use crate::view::poller::Poller;
use mailreach_client::models::{validate_payload, Campaign, CampaignPayload};
use mailreach_client::services::CampaignFilter;
use mailreach_common::types::{CampaignAction, CampaignId, CampaignStatus};
use mailreach_common::{Error, Result};
use serde_json::{Map, Value};
use std::ops::ControlFlow;
use std::time::Duration;
use tracing::{debug, info, warn};

#[derive(Debug, Clone)]
pub struct CampaignsState {
    pub campaigns: ListSlice<Campaign, CampaignFilter>,
    /// Campaign shown on the detail page
    pub current: Option<Campaign>,
    pub detail: AsyncOp,
    pub view: Option<CampaignDetailView>,
    /// send / pause / resume / cancel / duplicate
    pub action: AsyncOp,
}

impl CampaignsState {
    pub fn new(page_size: u32) -> Self {
        Self {
            campaigns: ListSlice::new(page_size),
            current: None,
            detail: AsyncOp::latest_only(),
            view: None,
            action: AsyncOp::concurrent(),
        }
    }

    pub fn get(&self, id: CampaignId) -> Option<&Campaign> {
        self.current
            .as_ref()
            .filter(|c| c.id == id)
            .or_else(|| self.campaigns.items.get(id))
    }

    pub fn status_of(&self, id: CampaignId) -> Option<CampaignStatus> {
        self.get(id).map(|c| c.status)
    }

    fn apply_detail(&mut self, campaign: &Campaign) {
        self.campaigns
            .items
            .update_with(campaign.id, |cached| *cached = campaign.clone());
        if self.view.as_ref().map(|v| v.campaign_id) != Some(campaign.id) {
            self.view = Some(CampaignDetailView::new(campaign.id));
        }
        self.current = Some(campaign.clone());
    }

    /// Merge an update into the list row and the detail campaign. Either both
    /// change or neither does.
    fn apply_merged(&mut self, id: CampaignId, fields: &Map<String, Value>) -> Result<()> {
        let current = match self.current.as_ref().filter(|c| c.id == id) {
            Some(current) => Some(merge_fields(current, fields)?),
            None => None,
        };
        self.campaigns.apply_merged(id, fields)?;
        if current.is_some() {
            self.current = current;
        }
        Ok(())
    }

    fn apply_removed(&mut self, id: CampaignId) {
        self.campaigns.apply_removed(id);
        if self.current.as_ref().is_some_and(|c| c.id == id) {
            self.current = None;
            self.view = None;
        }
    }

    fn apply_action(&mut self, id: CampaignId, action: CampaignAction, returned: Option<&Campaign>) {
        match (action, returned) {
            (CampaignAction::Duplicate, Some(copy)) => self.campaigns.apply_created(copy.clone()),
            (CampaignAction::Duplicate, None) => {}
            (_, Some(campaign)) => {
                self.campaigns
                    .items
                    .update_with(id, |cached| *cached = campaign.clone());
                if let Some(current) = self.current.as_mut().filter(|c| c.id == id) {
                    *current = campaign.clone();
                }
            }
            (_, None) => {
                let Some(status) = status_after(action) else {
                    return;
                };
                self.campaigns.items.update_with(id, |cached| cached.status = status);
                if let Some(current) = self.current.as_mut().filter(|c| c.id == id) {
                    current.status = status;
                }
            }
        }
    }
}

/// Status a campaign moves to when the backend acknowledges `action`
/// without returning the campaign
fn status_after(action: CampaignAction) -> Option<CampaignStatus> {
    match action {
        CampaignAction::Send | CampaignAction::Resume => Some(CampaignStatus::Sending),
        CampaignAction::Pause => Some(CampaignStatus::Paused),
        CampaignAction::Cancel => Some(CampaignStatus::Cancelled),
        CampaignAction::Duplicate => None,
    }
}

impl Store {
    pub async fn fetch_campaigns(&self) -> Result<()> {
        let service = &self.services().campaigns;
        self.fetch_list(
            |s| &mut s.campaigns.campaigns,
            |_, params| async move { service.list(&params).await },
        )
        .await
    }

    pub async fn update_campaign_query(
        &self,
        change: impl FnOnce(&mut ListQuery<CampaignFilter>) -> bool,
    ) -> Result<bool> {
        if !self.change_query(|s| &mut s.campaigns.campaigns, change).await {
            return Ok(false);
        }
        self.fetch_campaigns().await?;
        Ok(true)
    }

    /// Load one campaign into the detail view
    pub async fn fetch_campaign(&self, id: CampaignId) -> Result<Campaign> {
        self.dispatch(
            |s| &mut s.campaigns.detail,
            self.services().campaigns.get(id),
            |s, campaign: &Campaign| s.campaigns.apply_detail(campaign),
        )
        .await
    }

    pub async fn create_campaign(&self, input: &CampaignPayload) -> Result<Campaign> {
        validate_payload(input)?;
        let campaign = self
            .create_in(
                |s| &mut s.campaigns.campaigns,
                self.services().campaigns.create(input),
            )
            .await?;
        info!("Created campaign {} ({})", campaign.id, campaign.name);
        Ok(campaign)
    }

    /// Save campaign content. Only editable statuses accept changes.
    pub async fn update_campaign(
        &self,
        id: CampaignId,
        input: &CampaignPayload,
    ) -> Result<Option<Campaign>> {
        validate_payload(input)?;
        if let Some(status) = self.snapshot(|s| s.campaigns.status_of(id)).await {
            if !status.is_editable() {
                return Err(Error::Validation(format!(
                    "A {} campaign can no longer be edited",
                    status
                )));
            }
        }

        self.try_dispatch(
            |s| &mut s.campaigns.campaigns.update,
            self.services().campaigns.update(id, input),
            move |s, fields: &Map<String, Value>| {
                s.campaigns.apply_merged(id, fields)?;
                if let Some(view) = s.campaigns.view.as_mut().filter(|v| v.campaign_id == id) {
                    view.stop_editing();
                }
                Ok(())
            },
        )
        .await?;
        Ok(self.snapshot(|s| s.campaigns.get(id).cloned()).await)
    }

    /// Switch the detail page tab
    pub async fn select_campaign_tab(&self, tab: DetailTab) {
        self.update(|s| {
            if let Some(view) = s.campaigns.view.as_mut() {
                view.select_tab(tab);
            }
        })
        .await
    }

    /// Enter edit mode for the loaded campaign if its status allows it
    pub async fn start_editing_campaign(&self) -> Result<()> {
        self.update(|s| {
            let campaigns = &mut s.campaigns;
            let (Some(current), Some(view)) = (campaigns.current.as_ref(), campaigns.view.as_mut())
            else {
                return Err(Error::NotFound("No campaign loaded".to_string()));
            };
            view.start_editing(current.status)
        })
        .await
    }

    pub async fn delete_campaign(&self, id: CampaignId) -> Result<()> {
        self.dispatch(
            |s| &mut s.campaigns.campaigns.delete,
            self.services().campaigns.delete(id),
            move |s, _: &()| s.campaigns.apply_removed(id),
        )
        .await
    }

    /// Run a status action. The transition is checked against the cached
    /// status first; unknown campaigns are left to the backend to judge.
    ///
    /// Returns the campaign the backend sent back, which for `Duplicate` is
    /// the new copy.
    pub async fn campaign_action(
        &self,
        id: CampaignId,
        action: CampaignAction,
    ) -> Result<Option<Campaign>> {
        if let Some(status) = self.snapshot(|s| s.campaigns.status_of(id)).await {
            if !status.allows(action) {
                return Err(Error::Validation(format!(
                    "Cannot {} a {} campaign",
                    action, status
                )));
            }
        }

        let returned = self
            .dispatch(
                |s| &mut s.campaigns.action,
                self.services().campaigns.perform(id, action),
                move |s, returned: &Option<Campaign>| {
                    s.campaigns.apply_action(id, action, returned.as_ref())
                },
            )
            .await?;
        info!("Campaign {}: {} accepted", id, action);

        if action == CampaignAction::Duplicate && returned.is_none() {
            self.fetch_campaigns().await?;
        }
        Ok(returned)
    }

    pub async fn send_campaign(&self, id: CampaignId) -> Result<Option<Campaign>> {
        self.campaign_action(id, CampaignAction::Send).await
    }

    pub async fn pause_campaign(&self, id: CampaignId) -> Result<Option<Campaign>> {
        self.campaign_action(id, CampaignAction::Pause).await
    }

    pub async fn resume_campaign(&self, id: CampaignId) -> Result<Option<Campaign>> {
        self.campaign_action(id, CampaignAction::Resume).await
    }

    pub async fn cancel_campaign(&self, id: CampaignId) -> Result<Option<Campaign>> {
        self.campaign_action(id, CampaignAction::Cancel).await
    }

    pub async fn duplicate_campaign(&self, id: CampaignId) -> Result<Option<Campaign>> {
        self.campaign_action(id, CampaignAction::Duplicate).await
    }

    /// Refresh the campaign every `campaign_poll_secs` while it is sending.
    ///
    /// Ticks are skipped while a detail fetch is still in flight. Polling
    /// ends on its own once the campaign reaches a terminal status.
    pub fn poll_campaign_progress(&self, id: CampaignId) -> Poller {
        let store = self.clone();
        let period = Duration::from_secs(self.settings().campaign_poll_secs.max(1));
        Poller::spawn(period, move || {
            let store = store.clone();
            async move {
                if store.snapshot(|s| s.campaigns.detail.is_loading()).await {
                    debug!("Campaign {} refresh still in flight, skipping tick", id);
                    return ControlFlow::Continue(());
                }
                match store.fetch_campaign(id).await {
                    Ok(campaign) if campaign.status.is_terminal() => {
                        info!("Campaign {} finished as {}, polling stopped", id, campaign.status);
                        ControlFlow::Break(())
                    }
                    Ok(_) => ControlFlow::Continue(()),
                    Err(e) => {
                        warn!("Campaign {} refresh failed: {}", id, e);
                        ControlFlow::Continue(())
                    }
                }
            }
        })
    }
}
