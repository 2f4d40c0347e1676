// End-to-end tests for the check-in pipeline
//
// Tests cover:
// - Scheduled cycle against an HTTP chat endpoint and a file export
// - Rate limit retry over HTTP
// - Preference gate for normal readings
// - Manual fetch and user chat sharing one transcript

use async_trait::async_trait;
use chrono::{Local, Months};
use serde_json::json;
use std::sync::Arc;
use std::time::Duration;
use tempfile::TempDir;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use mindpulse::api::app_state::AppState;
use mindpulse::clients::biometrics::FileBiometricSource;
use mindpulse::clients::chat_transport::HttpChatTransport;
use mindpulse::clients::notification::{BroadcastNotificationSink, NOTIFICATION_TITLE};
use mindpulse::models::message::Sender;
use mindpulse::observability::AppMetrics;
use mindpulse::services::conversation::{ConversationClient, Delay};
use mindpulse::services::pulse::{CycleOutcome, MISSING_SAMPLE_MESSAGE};
use mindpulse::storage::settings_store::FileSettingsStore;

/// Retries without waiting
struct NoDelay;

#[async_trait]
impl Delay for NoDelay {
    async fn sleep(&self, _duration: Duration) {}
}

struct Fixture {
    dir: TempDir,
    server: MockServer,
    state: AppState,
    notifications: BroadcastNotificationSink,
}

fn write_export(dir: &TempDir, heart_rate: f64, respiratory_rate: f64) {
    let export = json!({
        "heart_rate": [
            {"value": 60.0, "observed_at": "2024-06-01T07:00:00Z"},
            {"value": heart_rate, "observed_at": "2024-06-01T08:00:00Z"}
        ],
        "respiratory_rate": [
            {"value": respiratory_rate, "observed_at": "2024-06-01T08:00:00Z"}
        ]
    });
    std::fs::write(dir.path().join("biometrics.json"), export.to_string()).unwrap();
}

async fn fixture(age: u32, heart_rate: f64, respiratory_rate: f64) -> Fixture {
    let dir = tempfile::tempdir().unwrap();
    write_export(&dir, heart_rate, respiratory_rate);

    let server = MockServer::start().await;
    let transport = HttpChatTransport::new(
        &format!("{}/v1/chat/completions", server.uri()),
        "sk-test",
        Duration::from_secs(5),
    )
    .unwrap();

    let metrics = Arc::new(AppMetrics::default());
    let conversation = ConversationClient::new(Arc::new(transport), "gpt-4o", 2000, metrics.clone())
        .with_delay(Arc::new(NoDelay));
    let notifications = BroadcastNotificationSink::new(8);
    let state = AppState::assemble_with_client(
        Arc::new(FileSettingsStore::new(dir.path().join("settings.json"))),
        conversation,
        Arc::new(FileBiometricSource::new(dir.path().join("biometrics.json"))),
        Arc::new(notifications.clone()),
        metrics,
    );

    let today = Local::now().date_naive();
    state
        .settings
        .set_birthday(today - Months::new(age * 12))
        .await
        .unwrap();

    Fixture {
        dir,
        server,
        state,
        notifications,
    }
}

fn completion(content: &str) -> ResponseTemplate {
    ResponseTemplate::new(200).set_body_json(json!({
        "choices": [{"message": {"role": "assistant", "content": content}}]
    }))
}

fn rate_limited() -> ResponseTemplate {
    ResponseTemplate::new(429).set_body_json(json!({
        "error": {"code": "rate_limit_exceeded", "message": "Rate limit reached"}
    }))
}

#[tokio::test]
async fn test_abnormal_reading_notifies_with_reply() {
    let f = fixture(5, 130.0, 25.0).await;
    Mock::given(method("POST"))
        .and(path("/v1/chat/completions"))
        .respond_with(completion("  Your heart rate is a little high. Want to take a slow breath?  "))
        .expect(1)
        .mount(&f.server)
        .await;
    let mut rx = f.notifications.subscribe();

    let outcome = f.state.scheduler.run_cycle().await;

    let CycleOutcome::Delivered { message, notified } = outcome else {
        panic!("expected delivered outcome, got {:?}", outcome);
    };
    assert!(notified);
    assert_eq!(
        message.content,
        "Your heart rate is a little high. Want to take a slow breath?"
    );

    let notification = rx.recv().await.unwrap();
    assert_eq!(notification.title, NOTIFICATION_TITLE);
    assert_eq!(notification.body, message.content);

    let requests = f.server.received_requests().await.unwrap();
    let body: serde_json::Value = serde_json::from_slice(&requests[0].body).unwrap();
    assert_eq!(body["model"], "gpt-4o");
    assert_eq!(body["max_tokens"], 2000);
    assert_eq!(body["messages"].as_array().unwrap().len(), 1);
    assert_eq!(body["messages"][0]["role"], "system");
    let prompt = body["messages"][0]["content"].as_str().unwrap();
    assert!(prompt.contains("130.0"));
    assert!(prompt.contains("25.0"));
}

#[tokio::test]
async fn test_rate_limit_is_retried_then_succeeds() {
    let f = fixture(30, 120.0, 14.0).await;
    Mock::given(method("POST"))
        .and(path("/v1/chat/completions"))
        .respond_with(rate_limited())
        .up_to_n_times(2)
        .mount(&f.server)
        .await;
    Mock::given(method("POST"))
        .and(path("/v1/chat/completions"))
        .respond_with(completion("Third time lucky."))
        .mount(&f.server)
        .await;

    let outcome = f.state.scheduler.run_cycle().await;
    assert!(matches!(outcome, CycleOutcome::Delivered { .. }));
    assert_eq!(f.server.received_requests().await.unwrap().len(), 3);
}

#[tokio::test]
async fn test_persistent_rate_limit_drops_scheduled_result() {
    let f = fixture(30, 120.0, 14.0).await;
    Mock::given(method("POST"))
        .and(path("/v1/chat/completions"))
        .respond_with(rate_limited())
        .mount(&f.server)
        .await;

    let outcome = f.state.scheduler.run_cycle().await;
    assert!(matches!(outcome, CycleOutcome::Failed { .. }));
    assert_eq!(f.server.received_requests().await.unwrap().len(), 3);
    assert!(f.state.chat.transcript().is_empty());
}

#[tokio::test]
async fn test_normal_reading_respects_preference() {
    let f = fixture(5, 100.0, 22.0).await;
    Mock::given(method("POST"))
        .and(path("/v1/chat/completions"))
        .respond_with(completion("All looks calm."))
        .mount(&f.server)
        .await;

    f.state
        .settings
        .set_notify_on_normal_range(false)
        .await
        .unwrap();
    let outcome = f.state.scheduler.run_cycle().await;
    assert!(matches!(outcome, CycleOutcome::Suppressed { .. }));
    assert!(f.server.received_requests().await.unwrap().is_empty());

    f.state
        .settings
        .set_notify_on_normal_range(true)
        .await
        .unwrap();
    let outcome = f.state.scheduler.run_cycle().await;
    assert!(matches!(outcome, CycleOutcome::Delivered { notified: true, .. }));
}

#[tokio::test]
async fn test_manual_fetch_and_chat_share_transcript() {
    let f = fixture(30, 72.0, 14.0).await;
    Mock::given(method("POST"))
        .and(path("/v1/chat/completions"))
        .respond_with(completion("You seem relaxed today."))
        .up_to_n_times(1)
        .mount(&f.server)
        .await;
    Mock::given(method("POST"))
        .and(path("/v1/chat/completions"))
        .respond_with(completion("Happy to chat."))
        .mount(&f.server)
        .await;
    let mut rx = f.notifications.subscribe();

    let fetched = f.state.scheduler.fetch_now().await;
    assert_eq!(fetched.content, "You seem relaxed today.");
    assert!(rx.try_recv().is_err());

    let reply = f.state.chat.send_message("Thanks!").await.unwrap();
    assert_eq!(reply.content, "Happy to chat.");

    let transcript = f.state.chat.transcript();
    let senders: Vec<_> = transcript.iter().map(|m| m.sender).collect();
    assert_eq!(
        senders,
        vec![Sender::Assistant, Sender::User, Sender::Assistant]
    );

    let requests = f.server.received_requests().await.unwrap();
    let body: serde_json::Value = serde_json::from_slice(&requests[1].body).unwrap();
    let roles: Vec<_> = body["messages"]
        .as_array()
        .unwrap()
        .iter()
        .map(|m| m["role"].as_str().unwrap().to_string())
        .collect();
    assert_eq!(roles, vec!["system", "assistant", "user"]);
}

#[tokio::test]
async fn test_manual_fetch_without_readings_shows_hint() {
    let f = fixture(30, 72.0, 14.0).await;
    std::fs::remove_file(f.dir.path().join("biometrics.json")).unwrap();

    let message = f.state.scheduler.fetch_now().await;
    assert_eq!(message.sender, Sender::Assistant);
    assert_eq!(message.content, MISSING_SAMPLE_MESSAGE);
    assert!(f.server.received_requests().await.unwrap().is_empty());
}
