//! Client-side search over an already fetched page

use mailreach_client::models::{Campaign, Recipient, SingleEmail, SmtpAccount};

/// Entities that can be matched by a free-text search box
pub trait Searchable {
    /// Text fields the search term is matched against
    fn search_fields(&self) -> Vec<&str>;

    /// Case-insensitive substring match. A blank term matches everything.
    fn matches(&self, term: &str) -> bool {
        let term = term.trim().to_lowercase();
        term.is_empty()
            || self
                .search_fields()
                .iter()
                .any(|field| field.to_lowercase().contains(&term))
    }
}

impl Searchable for SmtpAccount {
    fn search_fields(&self) -> Vec<&str> {
        vec![
            self.name.as_str(),
            self.email.as_str(),
            self.smtp_server.as_str(),
            self.provider.as_str(),
        ]
    }
}

impl Searchable for Campaign {
    fn search_fields(&self) -> Vec<&str> {
        vec![self.name.as_str(), self.subject.as_str()]
    }
}

impl Searchable for Recipient {
    fn search_fields(&self) -> Vec<&str> {
        [
            Some(self.email.as_str()),
            self.first_name.as_deref(),
            self.last_name.as_deref(),
            self.company.as_deref(),
        ]
        .into_iter()
        .flatten()
        .collect()
    }
}

impl Searchable for SingleEmail {
    fn search_fields(&self) -> Vec<&str> {
        [
            Some(self.to_email.as_str()),
            self.to_name.as_deref(),
            Some(self.subject.as_str()),
        ]
        .into_iter()
        .flatten()
        .collect()
    }
}

/// Rows of `items` matching `term`, in their original order
pub fn search<'a, T: Searchable>(items: &'a [T], term: &str) -> Vec<&'a T> {
    items.iter().filter(|item| item.matches(term)).collect()
}

pub fn search_accounts<'a>(accounts: &'a [SmtpAccount], term: &str) -> Vec<&'a SmtpAccount> {
    search(accounts, term)
}

pub fn search_campaigns<'a>(campaigns: &'a [Campaign], term: &str) -> Vec<&'a Campaign> {
    search(campaigns, term)
}

pub fn search_recipients<'a>(recipients: &'a [Recipient], term: &str) -> Vec<&'a Recipient> {
    search(recipients, term)
}

pub fn search_single_emails<'a>(emails: &'a [SingleEmail], term: &str) -> Vec<&'a SingleEmail> {
    search(emails, term)
}
