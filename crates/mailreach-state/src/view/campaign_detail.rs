//! Campaign detail page state

use mailreach_common::types::{CampaignId, CampaignStatus};
use mailreach_common::{Error, Result};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DetailTab {
    #[default]
    Compose,
    Analytics,
}

/// Selected tab and edit mode of one campaign's detail page
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CampaignDetailView {
    pub campaign_id: CampaignId,
    tab: DetailTab,
    editing: bool,
}

impl CampaignDetailView {
    pub fn new(campaign_id: CampaignId) -> Self {
        Self {
            campaign_id,
            tab: DetailTab::Compose,
            editing: false,
        }
    }

    pub fn tab(&self) -> DetailTab {
        self.tab
    }

    pub fn is_editing(&self) -> bool {
        self.editing
    }

    /// Switching to analytics leaves edit mode
    pub fn select_tab(&mut self, tab: DetailTab) {
        self.tab = tab;
        if tab == DetailTab::Analytics {
            self.editing = false;
        }
    }

    /// Enter edit mode on the compose tab
    pub fn start_editing(&mut self, status: CampaignStatus) -> Result<()> {
        if !status.is_editable() {
            return Err(Error::Validation(format!(
                "A {} campaign can no longer be edited",
                status
            )));
        }
        self.tab = DetailTab::Compose;
        self.editing = true;
        Ok(())
    }

    pub fn stop_editing(&mut self) {
        self.editing = false;
    }
}
