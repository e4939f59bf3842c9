//! Backend resource models and request payloads
//!
//! Response models are lenient: every field except the id has a default so a
//! partial payload still deserializes. Payloads derive [`Validate`] and are
//! checked before any request leaves the client.

use mailreach_common::types::{
    AccountId, CampaignId, CampaignStatus, Entity, Priority, Provider, RecipientId,
    RecipientListId, RecipientStatus, SingleEmailId, SingleEmailStatus, TemplateId, Timestamp,
};
use mailreach_common::{Error, Result};
use serde::{Deserialize, Serialize};
use validator::Validate;

/// Run payload validation, flattening field errors into one message
pub fn validate_payload<T: Validate>(payload: &T) -> Result<()> {
    payload.validate().map_err(|errors| {
        let mut messages: Vec<String> = errors
            .field_errors()
            .into_iter()
            .flat_map(|(field, errs)| {
                errs.iter().map(move |e| match &e.message {
                    Some(message) => format!("{}: {}", field, message),
                    None => format!("{}: invalid value", field),
                })
            })
            .collect();
        messages.sort();
        Error::Validation(messages.join(", "))
    })
}

// ---------------------------------------------------------------------------
// Auth
// ---------------------------------------------------------------------------

/// Authenticated user
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct User {
    pub id: i64,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub username: Option<String>,
    #[serde(default)]
    pub full_name: Option<String>,
    #[serde(default = "default_true")]
    pub is_active: bool,
}

impl Entity for User {
    fn id(&self) -> i64 {
        self.id
    }
}

#[derive(Debug, Clone, Serialize, Validate)]
pub struct LoginRequest {
    #[validate(email(message = "must be a valid email address"))]
    pub email: String,
    #[validate(length(min = 1, message = "is required"))]
    pub password: String,
}

#[derive(Debug, Clone, Serialize, Validate)]
pub struct RegisterRequest {
    #[validate(email(message = "must be a valid email address"))]
    pub email: String,
    #[validate(length(min = 3, max = 50, message = "must be 3-50 characters"))]
    pub username: String,
    #[validate(length(min = 8, message = "must be at least 8 characters"))]
    pub password: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub full_name: Option<String>,
}

/// Token pair returned by login and refresh
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct TokenResponse {
    #[serde(alias = "token")]
    pub access_token: String,
    #[serde(default)]
    pub refresh_token: Option<String>,
    #[serde(default)]
    pub token_type: Option<String>,
    #[serde(default)]
    pub user: Option<User>,
}

// ---------------------------------------------------------------------------
// SMTP accounts
// ---------------------------------------------------------------------------

/// SMTP sending account. The password is write-only and never cached.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SmtpAccount {
    pub id: AccountId,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub provider: Provider,
    #[serde(default)]
    pub smtp_server: String,
    #[serde(default = "default_smtp_port")]
    pub smtp_port: u16,
    #[serde(default)]
    pub username: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub use_tls: bool,
    #[serde(default)]
    pub use_ssl: bool,
    #[serde(default = "default_true")]
    pub is_active: bool,
    #[serde(default)]
    pub is_default: bool,
    #[serde(default)]
    pub daily_limit: Option<u32>,
    #[serde(default)]
    pub monthly_limit: Option<u32>,
    #[serde(default)]
    pub emails_sent_today: u32,
    #[serde(default)]
    pub emails_sent_this_month: u32,
    #[serde(default)]
    pub created_at: Option<Timestamp>,
    #[serde(default)]
    pub updated_at: Option<Timestamp>,
}

impl Entity for SmtpAccount {
    fn id(&self) -> i64 {
        self.id
    }
}

impl SmtpAccount {
    /// Share of the daily limit already used, in percent
    pub fn daily_usage_percent(&self) -> Option<f64> {
        self.daily_limit
            .filter(|limit| *limit > 0)
            .map(|limit| self.emails_sent_today as f64 * 100.0 / limit as f64)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Validate)]
pub struct CreateSmtpAccount {
    #[validate(length(min = 1, message = "is required"))]
    pub name: String,
    pub provider: Provider,
    #[validate(length(min = 1, message = "is required"))]
    pub smtp_server: String,
    #[validate(range(min = 1, message = "must be 1-65535"))]
    pub smtp_port: u16,
    #[validate(length(min = 1, message = "is required"))]
    pub username: String,
    #[validate(email(message = "must be a valid email address"))]
    pub email: String,
    #[validate(length(min = 1, message = "is required"))]
    pub password: String,
    pub use_tls: bool,
    pub use_ssl: bool,
    pub is_active: bool,
    pub is_default: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub daily_limit: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub monthly_limit: Option<u32>,
}

/// Partial SMTP account update; `None` fields are left out of the request
#[derive(Debug, Clone, Default, PartialEq, Serialize, Validate)]
pub struct UpdateSmtpAccount {
    #[serde(skip_serializing_if = "Option::is_none")]
    #[validate(length(min = 1, message = "must not be empty"))]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub provider: Option<Provider>,
    #[serde(skip_serializing_if = "Option::is_none")]
    #[validate(length(min = 1, message = "must not be empty"))]
    pub smtp_server: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    #[validate(range(min = 1, message = "must be 1-65535"))]
    pub smtp_port: Option<u16>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub username: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    #[validate(email(message = "must be a valid email address"))]
    pub email: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub password: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub use_tls: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub use_ssl: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub is_active: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub is_default: Option<bool>,
    /// `Some(None)` is sent as `null` and removes the limit
    #[serde(skip_serializing_if = "Option::is_none")]
    pub daily_limit: Option<Option<u32>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub monthly_limit: Option<Option<u32>>,
}

/// Outcome of `POST /smtp/accounts/:id/test`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConnectionTestResult {
    #[serde(default)]
    pub success: bool,
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default)]
    pub details: Option<serde_json::Value>,
}

// ---------------------------------------------------------------------------
// Recipients
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecipientList {
    pub id: RecipientListId,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default, alias = "total_recipients")]
    pub recipient_count: u64,
    #[serde(default)]
    pub created_at: Option<Timestamp>,
    #[serde(default)]
    pub updated_at: Option<Timestamp>,
}

impl Entity for RecipientList {
    fn id(&self) -> i64 {
        self.id
    }

    fn field_aliases() -> &'static [(&'static str, &'static str)] {
        &[("total_recipients", "recipient_count")]
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Validate)]
pub struct RecipientListPayload {
    #[validate(length(min = 1, max = 255, message = "is required"))]
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Recipient {
    pub id: RecipientId,
    #[serde(default)]
    pub list_id: Option<RecipientListId>,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub first_name: Option<String>,
    #[serde(default)]
    pub last_name: Option<String>,
    #[serde(default)]
    pub company: Option<String>,
    #[serde(default)]
    pub phone: Option<String>,
    #[serde(default)]
    pub status: RecipientStatus,
    #[serde(default)]
    pub created_at: Option<Timestamp>,
    #[serde(default)]
    pub updated_at: Option<Timestamp>,
}

impl Entity for Recipient {
    fn id(&self) -> i64 {
        self.id
    }
}

impl Recipient {
    /// "First Last", or the email when no name is known
    pub fn display_name(&self) -> String {
        let name = [self.first_name.as_deref(), self.last_name.as_deref()]
            .into_iter()
            .flatten()
            .filter(|s| !s.is_empty())
            .collect::<Vec<_>>()
            .join(" ");
        if name.is_empty() {
            self.email.clone()
        } else {
            name
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Validate)]
pub struct RecipientPayload {
    #[validate(email(message = "must be a valid email address"))]
    pub email: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub first_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub company: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<RecipientStatus>,
}

/// Summary returned by a CSV upload
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct UploadSummary {
    #[serde(default, alias = "imported")]
    pub added: u64,
    #[serde(default)]
    pub skipped: u64,
    #[serde(default)]
    pub errors: Vec<String>,
}

// ---------------------------------------------------------------------------
// Campaigns
// ---------------------------------------------------------------------------

/// Analytics snapshot attached to a campaign
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CampaignAnalytics {
    #[serde(default)]
    pub total_recipients: u64,
    #[serde(default)]
    pub sent_count: u64,
    #[serde(default)]
    pub delivered_count: u64,
    #[serde(default)]
    pub opened_count: u64,
    #[serde(default)]
    pub clicked_count: u64,
    #[serde(default)]
    pub bounced_count: u64,
    #[serde(default)]
    pub failed_count: u64,
    #[serde(default)]
    pub open_rate: f64,
    #[serde(default)]
    pub click_rate: f64,
    #[serde(default)]
    pub bounce_rate: f64,
}

impl CampaignAnalytics {
    /// Share of recipients already processed, in percent
    pub fn progress_percentage(&self) -> f64 {
        if self.total_recipients == 0 {
            return 0.0;
        }
        let processed = self.sent_count + self.failed_count;
        (processed as f64 * 100.0 / self.total_recipients as f64).min(100.0)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Campaign {
    pub id: CampaignId,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub subject: String,
    #[serde(default, alias = "content")]
    pub body: String,
    #[serde(default)]
    pub status: CampaignStatus,
    #[serde(default)]
    pub recipient_list_id: Option<RecipientListId>,
    #[serde(default)]
    pub smtp_account_id: Option<AccountId>,
    #[serde(default)]
    pub scheduled_at: Option<Timestamp>,
    #[serde(flatten)]
    pub analytics: CampaignAnalytics,
    #[serde(default)]
    pub created_at: Option<Timestamp>,
    #[serde(default)]
    pub updated_at: Option<Timestamp>,
    #[serde(default)]
    pub sent_at: Option<Timestamp>,
}

impl Entity for Campaign {
    fn id(&self) -> i64 {
        self.id
    }

    fn field_aliases() -> &'static [(&'static str, &'static str)] {
        &[("content", "body")]
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Validate)]
pub struct CampaignPayload {
    #[validate(length(min = 1, message = "is required"))]
    pub name: String,
    #[validate(length(min = 1, message = "is required"))]
    pub subject: String,
    #[validate(length(min = 1, message = "is required"))]
    pub body: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub recipient_list_id: Option<RecipientListId>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub smtp_account_id: Option<AccountId>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub scheduled_at: Option<Timestamp>,
}

// ---------------------------------------------------------------------------
// Single emails
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SingleEmail {
    pub id: SingleEmailId,
    #[serde(default, alias = "recipient_email")]
    pub to_email: String,
    #[serde(default, alias = "recipient_name")]
    pub to_name: Option<String>,
    #[serde(default)]
    pub from_email: Option<String>,
    #[serde(default)]
    pub from_name: Option<String>,
    #[serde(default)]
    pub subject: String,
    #[serde(default)]
    pub body: String,
    #[serde(default)]
    pub status: SingleEmailStatus,
    #[serde(default)]
    pub priority: Priority,
    #[serde(default)]
    pub smtp_account_id: Option<AccountId>,
    #[serde(default, alias = "is_opened")]
    pub opened: bool,
    #[serde(default, alias = "is_clicked")]
    pub clicked: bool,
    #[serde(default)]
    pub error_message: Option<String>,
    #[serde(default)]
    pub created_at: Option<Timestamp>,
    #[serde(default)]
    pub sent_at: Option<Timestamp>,
}

impl Entity for SingleEmail {
    fn id(&self) -> i64 {
        self.id
    }

    fn field_aliases() -> &'static [(&'static str, &'static str)] {
        &[("recipient_email", "to_email"), ("recipient_name", "to_name"), ("is_opened", "opened"), ("is_clicked", "clicked")]
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Validate)]
pub struct SingleEmailPayload {
    #[validate(email(message = "must be a valid email address"))]
    pub to_email: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub to_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    #[validate(email(message = "must be a valid email address"))]
    pub from_email: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub from_name: Option<String>,
    #[validate(length(min = 1, message = "is required"))]
    pub subject: String,
    #[validate(length(min = 1, message = "is required"))]
    pub body: String,
    pub priority: Priority,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub smtp_account_id: Option<AccountId>,
}

// ---------------------------------------------------------------------------
// Templates
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Template {
    pub id: TemplateId,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub subject: String,
    #[serde(default, alias = "content")]
    pub body: String,
    #[serde(default)]
    pub category: Option<String>,
    #[serde(default)]
    pub created_at: Option<Timestamp>,
    #[serde(default)]
    pub updated_at: Option<Timestamp>,
}

impl Entity for Template {
    fn id(&self) -> i64 {
        self.id
    }

    fn field_aliases() -> &'static [(&'static str, &'static str)] {
        &[("content", "body")]
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Validate)]
pub struct TemplatePayload {
    #[validate(length(min = 1, message = "is required"))]
    pub name: String,
    pub subject: String,
    #[validate(length(min = 1, message = "is required"))]
    pub body: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
}

fn default_true() -> bool {
    true
}

fn default_smtp_port() -> u16 {
    587
}
