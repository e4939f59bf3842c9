//! Domain services
//!
//! One service per backend resource. Each method maps one action onto one
//! HTTP call with a fixed path template and returns the normalized result.

mod auth;
mod campaigns;
mod recipients;
mod single_emails;
mod smtp;
mod templates;

pub use auth::AuthService;
pub use campaigns::{CampaignFilter, CampaignService};
pub use recipients::{RecipientFilter, RecipientService};
pub use single_emails::{SingleEmailFilter, SingleEmailService};
pub use smtp::{SmtpFilter, SmtpService};
pub use templates::TemplateService;

use crate::http::ApiClient;
use serde::Serialize;

/// Query string of a paginated list call
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ListParams<F> {
    pub page: u32,
    pub limit: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub search: Option<String>,
    #[serde(flatten)]
    pub filter: F,
}

impl<F: Default> ListParams<F> {
    pub fn new(limit: u32) -> Self {
        Self {
            page: 1,
            limit,
            search: None,
            filter: F::default(),
        }
    }
}

impl<F: Default> Default for ListParams<F> {
    fn default() -> Self {
        Self::new(10)
    }
}

/// Filter for resources listed without extra criteria
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct NoFilter {}

/// All services sharing one client
#[derive(Clone, Debug)]
pub struct Services {
    pub auth: AuthService,
    pub smtp: SmtpService,
    pub recipients: RecipientService,
    pub campaigns: CampaignService,
    pub single_emails: SingleEmailService,
    pub templates: TemplateService,
}

impl Services {
    pub fn new(client: ApiClient) -> Self {
        Self {
            auth: AuthService::new(client.clone()),
            smtp: SmtpService::new(client.clone()),
            recipients: RecipientService::new(client.clone()),
            campaigns: CampaignService::new(client.clone()),
            single_emails: SingleEmailService::new(client.clone()),
            templates: TemplateService::new(client),
        }
    }
}
