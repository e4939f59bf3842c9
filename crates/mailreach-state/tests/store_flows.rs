//! End-to-end store flows against a mock backend

use mailreach_client::{ApiClient, Session};
use mailreach_common::config::{ApiConfig, SyncConfig};
use mailreach_state::view::{search_accounts, SmtpUsage};
use mailreach_state::{OpStatus, Store};
use pretty_assertions::assert_eq;
use serde_json::{json, Value};
use std::time::Duration;
use wiremock::matchers::{header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn store_for(server: &MockServer) -> Store {
    let config = ApiConfig {
        base_url: server.uri(),
        timeout_secs: 5,
    };
    let client = ApiClient::new(&config, Session::in_memory()).unwrap();
    Store::new(client, SyncConfig::default())
}

#[tokio::test]
async fn test_fetch_then_delete_account() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/smtp/accounts"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "data": {"accounts": [{"id": 1, "name": "A"}]}
        })))
        .mount(&server)
        .await;
    Mock::given(method("DELETE"))
        .and(path("/smtp/accounts/1"))
        .respond_with(ResponseTemplate::new(204))
        .expect(1)
        .mount(&server)
        .await;

    let store = store_for(&server);
    store.fetch_smtp_accounts().await.unwrap();
    {
        let state = store.read().await;
        let rows: Vec<_> = state
            .smtp
            .accounts
            .items
            .items()
            .iter()
            .map(|a| a.name.as_str())
            .collect();
        assert_eq!(rows, vec!["A"]);
        assert_eq!(state.smtp.accounts.fetch.status(), OpStatus::Fulfilled);
    }

    store.delete_smtp_account(1).await.unwrap();
    let state = store.read().await;
    assert!(state.smtp.accounts.items.is_empty());
    assert_eq!(state.smtp.accounts.delete.status(), OpStatus::Fulfilled);
    assert!(!state.smtp.accounts.is_saving());
}

#[tokio::test]
async fn test_every_envelope_shape_gives_same_rows() {
    let rows = json!([{"id": 1, "name": "A"}, {"id": 2, "name": "B"}]);
    let shapes = [
        rows.clone(),
        json!({"data": rows.clone()}),
        json!({"data": {"accounts": rows.clone()}}),
        json!({"accounts": rows.clone()}),
    ];

    for shape in shapes {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/smtp/accounts"))
            .respond_with(ResponseTemplate::new(200).set_body_json(shape.clone()))
            .mount(&server)
            .await;

        let store = store_for(&server);
        store.fetch_smtp_accounts().await.unwrap();
        let ids = store.snapshot(|s| s.smtp.accounts.items.ids()).await;
        assert_eq!(ids, vec![1, 2], "shape {}", shape);
    }
}

#[tokio::test]
async fn test_slow_stale_search_does_not_overwrite_newer() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/smtp/accounts"))
        .and(query_param("search", "slow"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!([{"id": 1, "name": "Slow"}]))
                .set_delay(Duration::from_millis(400)),
        )
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/smtp/accounts"))
        .and(query_param("search", "fast"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([{"id": 2, "name": "Fast"}])))
        .mount(&server)
        .await;

    let store = store_for(&server);
    let slow = store.update_smtp_query(|q| q.set_search("slow"));
    let fast = async {
        tokio::time::sleep(Duration::from_millis(50)).await;
        store.update_smtp_query(|q| q.set_search("fast")).await
    };
    let (slow, fast) = tokio::join!(slow, fast);
    assert!(slow.unwrap());
    assert!(fast.unwrap());

    let state = store.read().await;
    assert_eq!(state.smtp.accounts.items.ids(), vec![2]);
    assert_eq!(state.smtp.accounts.query.search(), Some("fast"));
    assert!(!state.smtp.accounts.is_loading());
}

#[tokio::test]
async fn test_search_and_usage_over_fetched_page() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/smtp/accounts"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "accounts": [
                {"id": 1, "name": "Newsletter", "email": "news@acme.io", "is_default": true,
                 "daily_limit": 100, "emails_sent_today": 95},
                {"id": 2, "name": "Receipts", "email": "receipts@acme.io", "is_active": false}
            ]
        })))
        .mount(&server)
        .await;

    let store = store_for(&server);
    store.fetch_smtp_accounts().await.unwrap();

    let state = store.read().await;
    let accounts = state.smtp.accounts.items.items();
    assert_eq!(search_accounts(accounts, "receipts")[0].id, 2);

    let usage = SmtpUsage::from_accounts(accounts);
    assert_eq!(usage.active, 1);
    assert_eq!(usage.near_limit(90.0), vec![1]);
}

async fn mount_me(server: &MockServer, token: &str, status: u16) {
    let response = if status == 200 {
        ResponseTemplate::new(200).set_body_json(json!({"user": {"id": 1, "email": "ops@example.com"}}))
    } else {
        ResponseTemplate::new(status).set_body_json(json!({"detail": "Token expired"}))
    };
    Mock::given(method("GET"))
        .and(path("/auth/me"))
        .and(header("Authorization", format!("Bearer {}", token).as_str()))
        .respond_with(response)
        .mount(server)
        .await;
}

#[tokio::test]
async fn test_session_check_refreshes_expired_token() {
    let server = MockServer::start().await;
    mount_me(&server, "old", 401).await;
    mount_me(&server, "new", 200).await;
    Mock::given(method("POST"))
        .and(path("/auth/refresh"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "access_token": "new",
            "refresh_token": "r2"
        })))
        .expect(1)
        .mount(&server)
        .await;

    let store = store_for(&server);
    store.session().store_tokens("old", Some("r1")).unwrap();

    assert!(store.check_session().await.unwrap());
    assert_eq!(store.session().access_token().as_deref(), Some("new"));
    assert_eq!(store.session().refresh_token().as_deref(), Some("r2"));

    let state = store.read().await;
    assert!(state.auth.is_authenticated);
    assert_eq!(state.auth.user.as_ref().unwrap().email, "ops@example.com");
}

#[tokio::test]
async fn test_session_check_gives_up_after_one_refresh() {
    let server = MockServer::start().await;
    mount_me(&server, "old", 401).await;
    mount_me(&server, "new", 401).await;
    Mock::given(method("POST"))
        .and(path("/auth/refresh"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"access_token": "new"})))
        .expect(1)
        .mount(&server)
        .await;

    let store = store_for(&server);
    store.session().store_tokens("old", Some("r1")).unwrap();

    assert!(!store.check_session().await.unwrap());
    assert!(!store.session().is_present());
    assert!(store.session().refresh_token().is_none());

    let state = store.read().await;
    assert!(!state.auth.is_authenticated);
    assert_eq!(state.auth.session_check.status(), OpStatus::Rejected);
}

#[tokio::test]
async fn test_session_check_clears_when_refresh_rejected() {
    let server = MockServer::start().await;
    mount_me(&server, "old", 401).await;
    Mock::given(method("POST"))
        .and(path("/auth/refresh"))
        .respond_with(ResponseTemplate::new(400).set_body_json(json!({"detail": "Refresh token revoked"})))
        .expect(1)
        .mount(&server)
        .await;

    let store = store_for(&server);
    store.session().store_tokens("old", Some("r1")).unwrap();

    assert!(!store.check_session().await.unwrap());
    assert!(!store.session().is_present());
}

#[tokio::test]
async fn test_server_error_keeps_session() {
    let server = MockServer::start().await;
    mount_me(&server, "tok", 503).await;

    let store = store_for(&server);
    store.session().store_tokens("tok", None).unwrap();

    let err = store.check_session().await.unwrap_err();
    assert_eq!(err.status_code(), Some(503));
    assert_eq!(err.code(), "SERVER_ERROR");
    assert!(store.session().is_present());
}

#[tokio::test]
async fn test_retry_all_failed_emails() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/single-emails"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            {"id": 1, "to_email": "a@example.com", "status": "failed"},
            {"id": 2, "to_email": "b@example.com", "status": "failed"},
            {"id": 3, "to_email": "c@example.com", "status": "sent"}
        ])))
        .mount(&server)
        .await;
    for id in [1, 2] {
        Mock::given(method("POST"))
            .and(path(format!("/single-emails/{}/send", id)))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "data": {"email": {"id": id, "to_email": "x@example.com", "status": "sent"}}
            })))
            .expect(1)
            .mount(&server)
            .await;
    }

    let store = store_for(&server);
    store.fetch_single_emails().await.unwrap();

    let outcome = store.retry_failed_single_emails().await.unwrap();
    assert_eq!(outcome.succeeded, vec![1, 2]);
    assert!(outcome.all_succeeded());

    let failed = store.snapshot(|s| s.single_emails.failed_ids()).await;
    assert!(failed.is_empty());
}

#[tokio::test]
async fn test_campaign_progress_poll_stops_on_terminal_status() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/campaigns/7"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "campaign": {"id": 7, "name": "Launch", "status": "sent",
                         "total_recipients": 10, "sent_count": 10}
        })))
        .mount(&server)
        .await;

    let config = ApiConfig {
        base_url: server.uri(),
        timeout_secs: 5,
    };
    let client = ApiClient::new(&config, Session::in_memory()).unwrap();
    let store = Store::new(
        client,
        SyncConfig {
            campaign_poll_secs: 1,
            ..Default::default()
        },
    );

    let poller = store.poll_campaign_progress(7);
    tokio::time::sleep(Duration::from_millis(2500)).await;
    assert!(poller.is_finished());

    let requests = server.received_requests().await.unwrap();
    assert_eq!(requests.len(), 1);
    let progress = store
        .snapshot(|s| s.campaigns.current.as_ref().map(|c| c.analytics.progress_percentage()))
        .await;
    assert_eq!(progress, Some(100.0));
}

#[tokio::test]
async fn test_error_body_is_kept_on_the_error() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/campaigns"))
        .respond_with(ResponseTemplate::new(422).set_body_json(json!({
            "detail": [{"loc": ["body", "name"], "msg": "field required"}]
        })))
        .mount(&server)
        .await;

    let store = store_for(&server);
    let err = store
        .create_campaign(&mailreach_client::models::CampaignPayload {
            name: "Q3".to_string(),
            subject: "News".to_string(),
            body: "<p>Hi</p>".to_string(),
            ..Default::default()
        })
        .await
        .unwrap_err();

    assert_eq!(err.status_code(), Some(422));
    assert_eq!(err.to_string(), "field required");
    assert!(matches!(err.response_body(), Some(Value::Object(_))));
    let stored = store
        .snapshot(|s| s.campaigns.campaigns.create.error().map(str::to_string))
        .await;
    assert_eq!(stored.as_deref(), Some("field required"));
}
