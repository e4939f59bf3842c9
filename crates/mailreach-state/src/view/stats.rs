//! Aggregate statistics derived from cached rows

use mailreach_client::models::{Campaign, SingleEmail, SmtpAccount};
use mailreach_common::types::{CampaignStatus, SingleEmailStatus};
use serde::Serialize;
use std::collections::BTreeMap;

/// Summary cards of the campaign list
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct CampaignStats {
    pub total: usize,
    pub by_status: BTreeMap<String, usize>,
    pub total_recipients: u64,
    pub total_sent: u64,
    /// Mean over campaigns that sent at least one email
    pub average_open_rate: f64,
    pub average_click_rate: f64,
}

impl CampaignStats {
    pub fn from_campaigns(campaigns: &[Campaign]) -> Self {
        let mut stats = Self {
            total: campaigns.len(),
            ..Default::default()
        };

        let mut rated = 0usize;
        let (mut open_sum, mut click_sum) = (0.0, 0.0);
        for campaign in campaigns {
            *stats
                .by_status
                .entry(campaign.status.to_string())
                .or_default() += 1;
            stats.total_recipients += campaign.analytics.total_recipients;
            stats.total_sent += campaign.analytics.sent_count;
            if campaign.analytics.sent_count > 0 {
                rated += 1;
                open_sum += campaign.analytics.open_rate;
                click_sum += campaign.analytics.click_rate;
            }
        }

        if rated > 0 {
            stats.average_open_rate = open_sum / rated as f64;
            stats.average_click_rate = click_sum / rated as f64;
        }
        stats
    }

    pub fn count(&self, status: CampaignStatus) -> usize {
        self.by_status.get(status.as_str()).copied().unwrap_or(0)
    }
}

/// Summary cards of the single email list
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct SingleEmailStats {
    pub total: usize,
    pub sent: usize,
    pub failed: usize,
    pub draft: usize,
    pub sending: usize,
    /// Percent of sent emails that were opened
    pub open_rate: f64,
    /// Percent of sent emails that were clicked
    pub click_rate: f64,
}

impl SingleEmailStats {
    pub fn from_emails(emails: &[SingleEmail]) -> Self {
        let mut stats = Self {
            total: emails.len(),
            ..Default::default()
        };
        let (mut opened, mut clicked) = (0usize, 0usize);

        for email in emails {
            match email.status {
                SingleEmailStatus::Sent => {
                    stats.sent += 1;
                    opened += email.opened as usize;
                    clicked += email.clicked as usize;
                }
                SingleEmailStatus::Failed => stats.failed += 1,
                SingleEmailStatus::Draft => stats.draft += 1,
                SingleEmailStatus::Sending => stats.sending += 1,
            }
        }

        if stats.sent > 0 {
            stats.open_rate = opened as f64 * 100.0 / stats.sent as f64;
            stats.click_rate = clicked as f64 * 100.0 / stats.sent as f64;
        }
        stats
    }
}

/// Sending capacity overview of the SMTP accounts
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct SmtpUsage {
    pub total: usize,
    pub active: usize,
    pub default_account: Option<i64>,
    pub sent_today: u64,
    /// Daily usage in percent per account that has a daily limit
    pub daily_usage: BTreeMap<i64, f64>,
}

impl SmtpUsage {
    pub fn from_accounts(accounts: &[SmtpAccount]) -> Self {
        Self {
            total: accounts.len(),
            active: accounts.iter().filter(|a| a.is_active).count(),
            default_account: accounts.iter().find(|a| a.is_default).map(|a| a.id),
            sent_today: accounts.iter().map(|a| a.emails_sent_today as u64).sum(),
            daily_usage: accounts
                .iter()
                .filter_map(|a| a.daily_usage_percent().map(|p| (a.id, p)))
                .collect(),
        }
    }

    /// Accounts at or above `threshold` percent of their daily limit
    pub fn near_limit(&self, threshold: f64) -> Vec<i64> {
        self.daily_usage
            .iter()
            .filter(|(_, usage)| **usage >= threshold)
            .map(|(id, _)| *id)
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    #[test]
    fn test_campaign_stats() {
        let campaigns: Vec<Campaign> = serde_json::from_value(json!([
            {"id": 1, "status": "sent", "total_recipients": 100, "sent_count": 100, "open_rate": 40.0, "click_rate": 10.0},
            {"id": 2, "status": "sent", "total_recipients": 50, "sent_count": 50, "open_rate": 20.0, "click_rate": 4.0},
            {"id": 3, "status": "draft", "total_recipients": 10}
        ]))
        .unwrap();

        let stats = CampaignStats::from_campaigns(&campaigns);
        assert_eq!(stats.total, 3);
        assert_eq!(stats.count(CampaignStatus::Sent), 2);
        assert_eq!(stats.count(CampaignStatus::Draft), 1);
        assert_eq!(stats.count(CampaignStatus::Paused), 0);
        assert_eq!(stats.total_recipients, 160);
        assert_eq!(stats.total_sent, 150);
        assert_eq!(stats.average_open_rate, 30.0);
        assert_eq!(stats.average_click_rate, 7.0);
    }

    #[test]
    fn test_single_email_stats() {
        let emails: Vec<SingleEmail> = serde_json::from_value(json!([
            {"id": 1, "status": "sent", "is_opened": true, "is_clicked": true},
            {"id": 2, "status": "sent", "opened": true},
            {"id": 3, "status": "sent"},
            {"id": 4, "status": "sent"},
            {"id": 5, "status": "failed"},
            {"id": 6, "status": "draft"}
        ]))
        .unwrap();

        let stats = SingleEmailStats::from_emails(&emails);
        assert_eq!(stats.sent, 4);
        assert_eq!(stats.failed, 1);
        assert_eq!(stats.draft, 1);
        assert_eq!(stats.sending, 0);
        assert_eq!(stats.open_rate, 50.0);
        assert_eq!(stats.click_rate, 25.0);
    }

    #[test]
    fn test_empty_inputs() {
        assert_eq!(SingleEmailStats::from_emails(&[]).open_rate, 0.0);
        assert_eq!(CampaignStats::from_campaigns(&[]).average_open_rate, 0.0);
        assert_eq!(SmtpUsage::from_accounts(&[]).default_account, None);
    }

    #[test]
    fn test_smtp_usage() {
        let accounts: Vec<SmtpAccount> = serde_json::from_value(json!([
            {"id": 1, "is_default": true, "daily_limit": 500, "emails_sent_today": 450},
            {"id": 2, "is_active": false, "emails_sent_today": 20},
            {"id": 3, "daily_limit": 100, "emails_sent_today": 10}
        ]))
        .unwrap();

        let usage = SmtpUsage::from_accounts(&accounts);
        assert_eq!(usage.active, 2);
        assert_eq!(usage.default_account, Some(1));
        assert_eq!(usage.sent_today, 480);
        assert_eq!(usage.daily_usage.get(&1), Some(&90.0));
        assert_eq!(usage.near_limit(80.0), vec![1]);
    }
}
