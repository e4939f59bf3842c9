//! Common types for MailReach

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Unique identifier for SMTP accounts
pub type AccountId = i64;

/// Unique identifier for campaigns
pub type CampaignId = i64;

/// Unique identifier for recipient lists
pub type RecipientListId = i64;

/// Unique identifier for recipients
pub type RecipientId = i64;

/// Unique identifier for single emails
pub type SingleEmailId = i64;

/// Unique identifier for templates
pub type TemplateId = i64;

/// Timestamp wrapper
pub type Timestamp = DateTime<Utc>;

/// A backend resource cached by id
pub trait Entity {
    fn id(&self) -> i64;

    /// Alternate wire names accepted for fields, as `(alias, field)` pairs
    fn field_aliases() -> &'static [(&'static str, &'static str)]
    where
        Self: Sized,
    {
        &[]
    }
}

macro_rules! string_enum {
    ($(#[$meta:meta])* $name:ident { $($variant:ident => $text:literal),+ $(,)? }) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
        #[serde(rename_all = "snake_case")]
        pub enum $name {
            $($variant),+
        }

        impl $name {
            pub const ALL: &'static [$name] = &[$($name::$variant),+];

            pub fn as_str(&self) -> &'static str {
                match self {
                    $($name::$variant => $text),+
                }
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                f.write_str(self.as_str())
            }
        }

        impl std::str::FromStr for $name {
            type Err = crate::Error;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                match s.to_ascii_lowercase().as_str() {
                    $($text => Ok($name::$variant),)+
                    _ => Err(crate::Error::Validation(format!(
                        concat!("Invalid ", stringify!($name), ": {}"),
                        s
                    ))),
                }
            }
        }
    };
}

string_enum! {
    /// SMTP provider preset
    Provider {
        Gmail => "gmail",
        Outlook => "outlook",
        Yahoo => "yahoo",
        Hostinger => "hostinger",
        Custom => "custom",
    }
}

impl Default for Provider {
    fn default() -> Self {
        Provider::Custom
    }
}

string_enum! {
    /// Campaign status
    CampaignStatus {
        Draft => "draft",
        Scheduled => "scheduled",
        Sending => "sending",
        Sent => "sent",
        Paused => "paused",
        Cancelled => "cancelled",
        Failed => "failed",
    }
}

impl Default for CampaignStatus {
    fn default() -> Self {
        CampaignStatus::Draft
    }
}

string_enum! {
    /// Action a user can take on a campaign
    CampaignAction {
        Send => "send",
        Pause => "pause",
        Resume => "resume",
        Cancel => "cancel",
        Duplicate => "duplicate",
    }
}

impl CampaignStatus {
    /// No further transitions happen from a terminal status
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            CampaignStatus::Sent | CampaignStatus::Cancelled | CampaignStatus::Failed
        )
    }

    /// Whether the campaign content may still be edited
    pub fn is_editable(&self) -> bool {
        matches!(
            self,
            CampaignStatus::Draft | CampaignStatus::Scheduled | CampaignStatus::Paused
        )
    }

    /// Whether `action` is offered for a campaign in this status
    pub fn allows(&self, action: CampaignAction) -> bool {
        match action {
            CampaignAction::Send => {
                matches!(self, CampaignStatus::Draft | CampaignStatus::Scheduled)
            }
            CampaignAction::Pause => *self == CampaignStatus::Sending,
            CampaignAction::Resume => *self == CampaignStatus::Paused,
            CampaignAction::Cancel => matches!(
                self,
                CampaignStatus::Scheduled | CampaignStatus::Sending | CampaignStatus::Paused
            ),
            CampaignAction::Duplicate => true,
        }
    }
}

string_enum! {
    /// Recipient subscription status
    RecipientStatus {
        Active => "active",
        Inactive => "inactive",
        Unsubscribed => "unsubscribed",
    }
}

impl Default for RecipientStatus {
    fn default() -> Self {
        RecipientStatus::Active
    }
}

string_enum! {
    /// Single email delivery status
    SingleEmailStatus {
        Draft => "draft",
        Sending => "sending",
        Sent => "sent",
        Failed => "failed",
    }
}

impl Default for SingleEmailStatus {
    fn default() -> Self {
        SingleEmailStatus::Draft
    }
}

string_enum! {
    /// Single email priority
    Priority {
        Low => "low",
        Normal => "normal",
        High => "high",
    }
}

impl Default for Priority {
    fn default() -> Self {
        Priority::Normal
    }
}

/// Server-side pagination state of a list view
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Pagination {
    pub page: u32,
    pub limit: u32,
    pub total: u64,
    pub pages: u32,
}

impl Pagination {
    /// Pagination for a page whose total is known
    pub fn new(page: u32, limit: u32, total: u64) -> Self {
        let limit = limit.max(1);
        let pages = u32::try_from(total.div_ceil(limit as u64).max(1)).unwrap_or(u32::MAX);
        Self {
            page: page.max(1),
            limit,
            total,
            pages,
        }
    }

    pub fn has_next(&self) -> bool {
        self.page < self.pages
    }

    pub fn has_prev(&self) -> bool {
        self.page > 1
    }
}

impl Default for Pagination {
    fn default() -> Self {
        Self::new(1, 10, 0)
    }
}
