//! Telegram notifier against a mock Bot API

use alphadesk::services::{NotificationSender, TelegramNotifier};
use serde_json::json;
use std::time::Duration;
use wiremock::matchers::{body_json, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

#[tokio::test]
async fn send_posts_markdown_message() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/botTEST-TOKEN/sendMessage"))
        .and(body_json(json!({
            "chat_id": "12345",
            "text": "*hello*",
            "parse_mode": "Markdown",
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "ok": true })))
        .expect(1)
        .mount(&server)
        .await;

    let notifier =
        TelegramNotifier::new(server.uri(), "TEST-TOKEN", Duration::from_secs(5)).expect("notifier");
    notifier.send("12345", "*hello*").await.expect("delivered");
    assert_eq!(notifier.name(), "telegram");
}

#[tokio::test]
async fn rejected_message_is_an_error() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/botTEST-TOKEN/sendMessage"))
        .respond_with(
            ResponseTemplate::new(400)
                .set_body_json(json!({ "ok": false, "description": "chat not found" })),
        )
        .mount(&server)
        .await;

    let notifier =
        TelegramNotifier::new(server.uri(), "TEST-TOKEN", Duration::from_secs(5)).expect("notifier");
    let err = notifier.send("999", "hi").await.unwrap_err();

    assert!(err.to_string().contains("chat not found"));
}
