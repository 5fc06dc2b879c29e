//! End-to-end tests for the monitor and digest passes against mocked Zoho
//! APIs: token exchange, task fetch, Cliq directory lookup, and DM delivery.

use backend::config::{Config, RegionEndpoints};
use backend::monitor::RiskMonitor;
use chrono::Utc;
use serde_json::json;
use wiremock::matchers::{body_string_contains, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

const PORTAL: &str = "testportal";
const PROJECT_ID: &str = "1001";

fn config_for(server: &MockServer) -> Config {
    Config {
        client_id: "client-id".to_string(),
        client_secret: "client-secret".to_string(),
        refresh_token: "refresh-token".to_string(),
        project_id: PROJECT_ID.to_string(),
        endpoints: RegionEndpoints {
            oauth_url: format!("{}/oauth/v2/token", server.uri()),
            projects_api_base: format!("{}/restapi/portal/{}", server.uri(), PORTAL),
            cliq_api_base: format!("{}/api/v2", server.uri()),
        },
        due_soon_hours: 24,
        webhook_secret: None,
        reference_tz: "Asia/Kolkata".parse().unwrap(),
        port: 0,
    }
}

fn tasks_path() -> String {
    format!("/restapi/portal/{}/projects/{}/tasks/", PORTAL, PROJECT_ID)
}

async fn mount_token_endpoint(server: &MockServer, expected_calls: u64, expires_in: i64) {
    Mock::given(method("POST"))
        .and(path("/oauth/v2/token"))
        .and(body_string_contains("grant_type=refresh_token"))
        .and(body_string_contains("refresh_token=refresh-token"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "access_token": "test-token",
            "expires_in": expires_in
        })))
        .expect(expected_calls)
        .mount(server)
        .await;
}

async fn mount_tasks(server: &MockServer, tasks: serde_json::Value) {
    Mock::given(method("GET"))
        .and(path(tasks_path()))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"tasks": tasks})))
        .mount(server)
        .await;
}

async fn mount_user_lookup(server: &MockServer, email: &str, zuid: &str) {
    Mock::given(method("GET"))
        .and(path("/api/v2/users"))
        .and(query_param("search", email))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "data": [{"zuid": zuid, "email_id": email}]
        })))
        .mount(server)
        .await;
}

fn overdue_task(name: &str, email: &str) -> serde_json::Value {
    let one_hour_ago = (Utc::now() - chrono::Duration::hours(1)).timestamp_millis();
    json!({
        "name": name,
        "percent_complete": 50,
        "end_date_long": one_hour_ago,
        "details": {"owners": [{"email": email}]}
    })
}

#[tokio::test]
async fn test_monitor_pass_alerts_overdue_task() {
    let server = MockServer::start().await;

    mount_token_endpoint(&server, 1, 3600).await;
    mount_tasks(&server, json!([overdue_task("Ship it", "a@x.com")])).await;
    mount_user_lookup(&server, "a@x.com", "z1").await;

    Mock::given(method("POST"))
        .and(path("/api/v2/buddies/z1/message"))
        .and(body_string_contains("OVERDUE"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"status": "ok"})))
        .expect(1)
        .mount(&server)
        .await;

    let monitor = RiskMonitor::new(&config_for(&server));
    let outcome = monitor.monitor_pass().await;

    let report = outcome.report().expect("pass should complete");
    assert_eq!(report.checked, 1);
    assert_eq!(report.alerts_sent, 1);
    assert_eq!(report.alerts.len(), 1);
    assert_eq!(report.alerts[0].task, "Ship it");
    assert_eq!(report.alerts[0].user, "a@x.com");
}

#[tokio::test]
async fn test_monitor_pass_skips_safe_and_complete_tasks() {
    let server = MockServer::start().await;

    mount_token_endpoint(&server, 1, 3600).await;

    let far_future = (Utc::now() + chrono::Duration::days(30)).timestamp_millis();
    let past = (Utc::now() - chrono::Duration::hours(2)).timestamp_millis();
    mount_tasks(
        &server,
        json!([
            // complete, even though overdue
            {"name": "Done", "percent_complete": 100, "end_date_long": past,
             "details": {"owners": [{"email": "a@x.com"}]}},
            // no due date at all
            {"name": "No date", "percent_complete": 10,
             "details": {"owners": [{"email": "a@x.com"}]}},
            // due well beyond the lookahead window
            {"name": "Later", "percent_complete": 10, "end_date_long": far_future,
             "details": {"owners": [{"email": "a@x.com"}]}}
        ]),
    )
    .await;

    // No directory lookups or sends may happen
    Mock::given(method("GET"))
        .and(path("/api/v2/users"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"data": []})))
        .expect(0)
        .mount(&server)
        .await;

    let monitor = RiskMonitor::new(&config_for(&server));
    let outcome = monitor.monitor_pass().await;

    let report = outcome.report().expect("pass should complete");
    assert_eq!(report.checked, 3);
    assert_eq!(report.alerts_sent, 0);
    assert!(report.alerts.is_empty());
}

#[tokio::test]
async fn test_non_list_tasks_field_fails_with_raw_body() {
    let server = MockServer::start().await;

    mount_token_endpoint(&server, 1, 3600).await;
    Mock::given(method("GET"))
        .and(path(tasks_path()))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"tasks": "oops"})))
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path("/api/v2/users"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;

    let monitor = RiskMonitor::new(&config_for(&server));
    let outcome = monitor.monitor_pass().await;

    let failure = outcome.failure().expect("pass should fail");
    assert_eq!(failure.error, "Invalid task format");
    assert_eq!(failure.raw, Some(json!({"tasks": "oops"})));
    assert!(failure.detail.is_none());
}

#[tokio::test]
async fn test_fetch_failure_surfaces_detail() {
    let server = MockServer::start().await;

    mount_token_endpoint(&server, 1, 3600).await;
    Mock::given(method("GET"))
        .and(path(tasks_path()))
        .respond_with(ResponseTemplate::new(503))
        .mount(&server)
        .await;

    let monitor = RiskMonitor::new(&config_for(&server));
    let outcome = monitor.monitor_pass().await;

    let failure = outcome.failure().expect("pass should fail");
    assert_eq!(failure.error, "Fetch failed");
    assert!(failure.detail.is_some());
}

#[tokio::test]
async fn test_token_exchange_failure_aborts_pass() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/oauth/v2/token"))
        .respond_with(ResponseTemplate::new(400).set_body_json(json!({"error": "invalid_code"})))
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path(tasks_path()))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;

    let monitor = RiskMonitor::new(&config_for(&server));
    let outcome = monitor.monitor_pass().await;

    let failure = outcome.failure().expect("pass should fail");
    assert_eq!(failure.error, "Fetch failed");
}

#[tokio::test]
async fn test_token_is_cached_across_passes() {
    let server = MockServer::start().await;

    // Exactly one token exchange despite two passes worth of API calls
    mount_token_endpoint(&server, 1, 3600).await;
    mount_tasks(&server, json!([])).await;

    let monitor = RiskMonitor::new(&config_for(&server));
    let first = monitor.monitor_pass().await;
    let second = monitor.monitor_pass().await;

    assert!(first.report().is_some());
    assert!(second.report().is_some());
}

#[tokio::test]
async fn test_expired_token_is_refreshed() {
    let server = MockServer::start().await;

    // expires_in of 0 makes the cached token stale immediately
    mount_token_endpoint(&server, 2, 0).await;
    mount_tasks(&server, json!([])).await;

    let monitor = RiskMonitor::new(&config_for(&server));
    monitor.monitor_pass().await;
    monitor.monitor_pass().await;
}

#[tokio::test]
async fn test_owner_lookup_miss_counts_as_not_sent() {
    let server = MockServer::start().await;

    mount_token_endpoint(&server, 1, 3600).await;
    mount_tasks(&server, json!([overdue_task("Ship it", "ghost@x.com")])).await;

    Mock::given(method("GET"))
        .and(path("/api/v2/users"))
        .and(query_param("search", "ghost@x.com"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"data": []})))
        .expect(1)
        .mount(&server)
        .await;

    let monitor = RiskMonitor::new(&config_for(&server));
    let outcome = monitor.monitor_pass().await;

    let report = outcome.report().expect("pass should complete");
    assert_eq!(report.checked, 1);
    assert_eq!(report.alerts_sent, 0);
}

#[tokio::test]
async fn test_self_message_restriction_is_not_fatal() {
    let server = MockServer::start().await;

    mount_token_endpoint(&server, 1, 3600).await;
    mount_tasks(
        &server,
        json!([
            overdue_task("Mine", "me@x.com"),
            overdue_task("Theirs", "them@x.com")
        ]),
    )
    .await;
    mount_user_lookup(&server, "me@x.com", "self1").await;
    mount_user_lookup(&server, "them@x.com", "z2").await;

    Mock::given(method("POST"))
        .and(path("/api/v2/buddies/self1/message"))
        .respond_with(
            ResponseTemplate::new(400)
                .set_body_json(json!({"code": "buddies_self_message_restricted"})),
        )
        .expect(1)
        .mount(&server)
        .await;

    Mock::given(method("POST"))
        .and(path("/api/v2/buddies/z2/message"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"status": "ok"})))
        .expect(1)
        .mount(&server)
        .await;

    let monitor = RiskMonitor::new(&config_for(&server));
    let outcome = monitor.monitor_pass().await;

    let report = outcome.report().expect("pass should complete");
    assert_eq!(report.alerts_sent, 1);
    assert_eq!(report.alerts[0].user, "them@x.com");
}

#[tokio::test]
async fn test_buddy_id_falls_back_to_email_id() {
    let server = MockServer::start().await;

    mount_token_endpoint(&server, 1, 3600).await;
    mount_tasks(&server, json!([overdue_task("Ship it", "a@x.com")])).await;

    Mock::given(method("GET"))
        .and(path("/api/v2/users"))
        .and(query_param("search", "a@x.com"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "data": [{"email_id": "a@x.com"}]
        })))
        .mount(&server)
        .await;

    Mock::given(method("POST"))
        .and(path("/api/v2/buddies/a@x.com/message"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"status": "ok"})))
        .expect(1)
        .mount(&server)
        .await;

    let monitor = RiskMonitor::new(&config_for(&server));
    let outcome = monitor.monitor_pass().await;
    assert_eq!(outcome.report().expect("pass should complete").alerts_sent, 1);
}

#[tokio::test]
async fn test_digest_audience_is_details_owners_only() {
    let server = MockServer::start().await;

    mount_token_endpoint(&server, 1, 3600).await;

    let past = (Utc::now() - chrono::Duration::hours(1)).timestamp_millis();
    mount_tasks(
        &server,
        json!([
            {"name": "Nested", "percent_complete": 10, "end_date_long": past,
             "details": {"owners": [{"email": "a@x.com"}]}},
            // At risk, but only reachable via the top-level owners field:
            // excluded from the digest audience by design.
            {"name": "Top level", "percent_complete": 10, "end_date_long": past,
             "owners": [{"email": "b@x.com"}]}
        ]),
    )
    .await;
    mount_user_lookup(&server, "a@x.com", "z1").await;

    Mock::given(method("POST"))
        .and(path("/api/v2/buddies/z1/message"))
        .and(body_string_contains("Daily Risk Digest"))
        .and(body_string_contains("Nested"))
        .and(body_string_contains("Top level"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"status": "ok"})))
        .expect(1)
        .mount(&server)
        .await;

    let monitor = RiskMonitor::new(&config_for(&server));
    let outcome = monitor.daily_digest().await;

    let report = outcome.report().expect("digest should complete");
    assert_eq!(report.status, "ok");
    assert_eq!(report.digest_sent, 1);
    assert_eq!(report.owners, vec!["a@x.com".to_string()]);
}

#[tokio::test]
async fn test_digest_deduplicates_owners() {
    let server = MockServer::start().await;

    mount_token_endpoint(&server, 1, 3600).await;

    let past = (Utc::now() - chrono::Duration::hours(1)).timestamp_millis();
    mount_tasks(
        &server,
        json!([
            {"name": "One", "percent_complete": 10, "end_date_long": past,
             "details": {"owners": [{"email": "a@x.com"}]}},
            {"name": "Two", "percent_complete": 20, "end_date_long": past,
             "details": {"owners": [{"email": "a@x.com"}]}}
        ]),
    )
    .await;
    mount_user_lookup(&server, "a@x.com", "z1").await;

    // Two at-risk tasks, one owner, exactly one digest message
    Mock::given(method("POST"))
        .and(path("/api/v2/buddies/z1/message"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"status": "ok"})))
        .expect(1)
        .mount(&server)
        .await;

    let monitor = RiskMonitor::new(&config_for(&server));
    let outcome = monitor.daily_digest().await;

    let report = outcome.report().expect("digest should complete");
    assert_eq!(report.digest_sent, 1);
    assert_eq!(report.owners.len(), 1);
}
