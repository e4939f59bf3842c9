//! View-model helpers
//!
//! Derived state the dashboard pages render from: client-side search,
//! summary statistics, the SMTP account form, the campaign detail tabs and
//! interval polling.

pub mod campaign_detail;
pub mod poller;
pub mod search;
pub mod smtp_form;
pub mod stats;

pub use campaign_detail::{CampaignDetailView, DetailTab};
pub use poller::Poller;
pub use search::{
    search, search_accounts, search_campaigns, search_recipients, search_single_emails, Searchable,
};
pub use smtp_form::{provider_preset, ProviderPreset, SmtpAccountForm};
pub use stats::{CampaignStats, SingleEmailStats, SmtpUsage};
