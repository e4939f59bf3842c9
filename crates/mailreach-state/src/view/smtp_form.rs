//! SMTP account form with provider presets

use mailreach_client::models::{CreateSmtpAccount, SmtpAccount, UpdateSmtpAccount};
use mailreach_common::types::Provider;
use mailreach_common::{Error, Result};

/// Connection settings of a well-known provider
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ProviderPreset {
    pub server: &'static str,
    pub port: u16,
    pub use_tls: bool,
    pub use_ssl: bool,
}

/// Preset for `provider`, `None` for custom servers
pub fn provider_preset(provider: Provider) -> Option<ProviderPreset> {
    let (server, port, use_tls, use_ssl) = match provider {
        Provider::Gmail => ("smtp.gmail.com", 587, true, false),
        Provider::Outlook => ("smtp-mail.outlook.com", 587, true, false),
        Provider::Yahoo => ("smtp.mail.yahoo.com", 587, true, false),
        Provider::Hostinger => ("smtp.hostinger.com", 465, false, true),
        Provider::Custom => return None,
    };
    Some(ProviderPreset {
        server,
        port,
        use_tls,
        use_ssl,
    })
}

/// Editable state of the create/edit account dialog
#[derive(Debug, Clone, PartialEq)]
pub struct SmtpAccountForm {
    pub name: String,
    pub provider: Provider,
    pub smtp_server: String,
    pub smtp_port: Option<u16>,
    pub username: String,
    pub email: String,
    /// Blank on edit means "keep the stored password"
    pub password: String,
    pub use_tls: bool,
    pub use_ssl: bool,
    pub is_active: bool,
    pub is_default: bool,
    pub daily_limit: Option<u32>,
    pub monthly_limit: Option<u32>,
}

impl Default for SmtpAccountForm {
    fn default() -> Self {
        Self {
            name: String::new(),
            provider: Provider::Custom,
            smtp_server: String::new(),
            smtp_port: None,
            username: String::new(),
            email: String::new(),
            password: String::new(),
            use_tls: false,
            use_ssl: false,
            is_active: true,
            is_default: false,
            daily_limit: None,
            monthly_limit: None,
        }
    }
}

impl SmtpAccountForm {
    /// Form for a new account using `provider`'s preset
    pub fn new(provider: Provider) -> Self {
        let mut form = Self::default();
        form.apply_provider(provider);
        form
    }

    /// Prefill from a cached account. The password stays blank.
    pub fn from_account(account: &SmtpAccount) -> Self {
        Self {
            name: account.name.clone(),
            provider: account.provider,
            smtp_server: account.smtp_server.clone(),
            smtp_port: Some(account.smtp_port),
            username: account.username.clone(),
            email: account.email.clone(),
            password: String::new(),
            use_tls: account.use_tls,
            use_ssl: account.use_ssl,
            is_active: account.is_active,
            is_default: account.is_default,
            daily_limit: account.daily_limit,
            monthly_limit: account.monthly_limit,
        }
    }

    /// Switch provider. Server, port and encryption are overwritten by the
    /// preset; a custom provider clears them.
    pub fn apply_provider(&mut self, provider: Provider) {
        self.provider = provider;
        match provider_preset(provider) {
            Some(preset) => {
                self.smtp_server = preset.server.to_string();
                self.smtp_port = Some(preset.port);
                self.use_tls = preset.use_tls;
                self.use_ssl = preset.use_ssl;
            }
            None => {
                self.smtp_server.clear();
                self.smtp_port = None;
                self.use_tls = false;
                self.use_ssl = false;
            }
        }
    }

    /// Payload for creating the account
    pub fn to_create(&self) -> Result<CreateSmtpAccount> {
        let smtp_port = self
            .smtp_port
            .ok_or_else(|| Error::Validation("smtp_port: is required".to_string()))?;
        Ok(CreateSmtpAccount {
            name: self.name.trim().to_string(),
            provider: self.provider,
            smtp_server: self.smtp_server.trim().to_string(),
            smtp_port,
            username: self.username.trim().to_string(),
            email: self.email.trim().to_string(),
            password: self.password.clone(),
            use_tls: self.use_tls,
            use_ssl: self.use_ssl,
            is_active: self.is_active,
            is_default: self.is_default,
            daily_limit: self.daily_limit,
            monthly_limit: self.monthly_limit,
        })
    }

    /// Payload for editing the account. The password is only sent when a
    /// new one was typed; an emptied limit is sent as `null`.
    pub fn to_update(&self) -> UpdateSmtpAccount {
        UpdateSmtpAccount {
            name: Some(self.name.trim().to_string()),
            provider: Some(self.provider),
            smtp_server: Some(self.smtp_server.trim().to_string()),
            smtp_port: self.smtp_port,
            username: Some(self.username.trim().to_string()),
            email: Some(self.email.trim().to_string()),
            password: (!self.password.trim().is_empty()).then(|| self.password.clone()),
            use_tls: Some(self.use_tls),
            use_ssl: Some(self.use_ssl),
            is_active: Some(self.is_active),
            is_default: Some(self.is_default),
            daily_limit: Some(self.daily_limit),
            monthly_limit: Some(self.monthly_limit),
        }
    }
}
