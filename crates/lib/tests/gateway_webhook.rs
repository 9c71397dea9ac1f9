//! Integration tests: start the gateway on a free port with mocked upstream
//! APIs and drive the webhook route end to end. Does not require Telegram,
//! Chat2Desk, or assistant credentials. Server tasks are left running when a
//! test ends.

use lib::config::Config;
use lib::gateway;
use std::time::Duration;

fn free_port() -> u16 {
    let listener = std::net::TcpListener::bind("127.0.0.1:0").expect("bind free port");
    listener.local_addr().expect("local_addr").port()
}

/// Config wired to the two mock upstreams. No Telegram token, so webhook
/// registration is skipped at startup.
fn test_config(port: u16, chat2desk_url: &str, assistant_url: &str) -> Config {
    let mut config = Config::default();
    config.gateway.port = port;
    config.gateway.bind = "127.0.0.1".to_string();
    config.chat2desk.token = Some("c2d-token".to_string());
    config.chat2desk.base_url = Some(chat2desk_url.to_string());
    config.assistant.api_key = Some("sk-test".to_string());
    config.assistant.assistant_id = Some("asst_1".to_string());
    config.assistant.base_url = Some(assistant_url.to_string());
    config.assistant.poll.interval_ms = 1;
    config.assistant.poll.max_interval_ms = 2;
    config.assistant.poll.max_attempts = 10;
    config
}

async fn start_gateway(config: Config) -> String {
    let port = config.gateway.port;
    tokio::spawn(async move {
        let _ = gateway::run_gateway(config).await;
    });

    let url = format!("http://127.0.0.1:{}/", port);
    let client = reqwest::Client::new();
    for _ in 0..100 {
        if let Ok(resp) = client.get(&url).send().await {
            if resp.status().is_success() {
                return format!("http://127.0.0.1:{}", port);
            }
        }
        tokio::time::sleep(Duration::from_millis(50)).await;
    }
    panic!("gateway did not come up on port {} within 5s", port);
}

/// Mount the assistant thread/run/message mocks for one completed run.
async fn mock_assistant_run(
    server: &mut mockito::Server,
    segments: &[&str],
) -> Vec<mockito::Mock> {
    let content: Vec<serde_json::Value> = segments
        .iter()
        .map(|s| {
            serde_json::json!({
                "role": "assistant",
                "content": [{ "type": "text", "text": { "value": s } }]
            })
        })
        .collect();
    vec![
        server
            .mock("POST", "/threads")
            .with_status(200)
            .with_body(r#"{"id":"thread_1"}"#)
            .create_async()
            .await,
        server
            .mock("POST", "/threads/thread_1/messages")
            .with_status(200)
            .with_body(r#"{"id":"msg_1"}"#)
            .create_async()
            .await,
        server
            .mock("POST", "/threads/thread_1/runs")
            .with_status(200)
            .with_body(r#"{"id":"run_1","status":"queued"}"#)
            .create_async()
            .await,
        server
            .mock("GET", "/threads/thread_1/runs/run_1")
            .with_status(200)
            .with_body(r#"{"id":"run_1","status":"completed"}"#)
            .create_async()
            .await,
        server
            .mock("GET", "/threads/thread_1/messages")
            .with_status(200)
            .with_body(serde_json::json!({ "data": content }).to_string())
            .create_async()
            .await,
    ]
}

#[tokio::test]
async fn gateway_health_responds_with_running() {
    let port = free_port();
    let config = test_config(port, "http://127.0.0.1:1", "http://127.0.0.1:1");
    let base = start_gateway(config).await;

    let json: serde_json::Value = reqwest::get(format!("{}/", base))
        .await
        .expect("health request")
        .json()
        .await
        .expect("parse JSON");
    assert_eq!(json.get("runtime").and_then(|v| v.as_str()), Some("running"));
    assert_eq!(json.get("port").and_then(|v| v.as_u64()), Some(port as u64));
}

#[tokio::test]
async fn webhook_relays_message_end_to_end() {
    let mut chat2desk = mockito::Server::new_async().await;
    let create_client = chat2desk
        .mock("POST", "/clients")
        .with_status(200)
        .with_body(r#"{"data":{"id":"c1"}}"#)
        .create_async()
        .await;
    let deliver = chat2desk
        .mock("POST", "/messages")
        .match_query(mockito::Matcher::AllOf(vec![
            mockito::Matcher::UrlEncoded("text".into(), "Hello there".into()),
            mockito::Matcher::UrlEncoded("client_id".into(), "c1".into()),
            mockito::Matcher::UrlEncoded("transport".into(), "telegram".into()),
        ]))
        .with_status(200)
        .create_async()
        .await;

    let mut assistant = mockito::Server::new_async().await;
    let _run_mocks = mock_assistant_run(&mut assistant, &["Hello", "【note:1】there"]).await;

    let port = free_port();
    let base = start_gateway(test_config(port, &chat2desk.url(), &assistant.url())).await;

    let resp = reqwest::Client::new()
        .post(format!("{}/telegram/webhook", base))
        .json(&serde_json::json!({
            "message": { "chat": { "id": 42 }, "text": "Hi" }
        }))
        .send()
        .await
        .expect("webhook request");
    assert_eq!(resp.status(), 200);
    let json: serde_json::Value = resp.json().await.expect("parse JSON");
    assert_eq!(json.get("status").and_then(|v| v.as_str()), Some("sent"));
    assert_eq!(
        json.get("response").and_then(|v| v.as_str()),
        Some("Hello there")
    );

    create_client.assert_async().await;
    deliver.assert_async().await;
}

#[tokio::test]
async fn webhook_defaults_missing_text_to_placeholder() {
    let mut chat2desk = mockito::Server::new_async().await;
    let _create_client = chat2desk
        .mock("POST", "/clients")
        .with_status(200)
        .with_body(r#"{"data":{"id":"c1"}}"#)
        .create_async()
        .await;
    let _deliver = chat2desk
        .mock("POST", "/messages")
        .with_status(200)
        .create_async()
        .await;

    let mut assistant = mockito::Server::new_async().await;
    let mut mocks = mock_assistant_run(&mut assistant, &["Hello"]).await;
    // The placeholder must reach the assistant as the user message.
    // Dropping a Mock no longer unregisters it from the server (mockito 1.x),
    // so explicitly remove the default messages mock before replacing it with
    // the body-matched one; otherwise the default serves the request first.
    mocks[1].remove_async().await;
    mocks[1] = assistant
        .mock("POST", "/threads/thread_1/messages")
        .match_body(mockito::Matcher::Json(serde_json::json!({
            "role": "user",
            "content": "No text provided"
        })))
        .with_status(200)
        .with_body(r#"{"id":"msg_1"}"#)
        .create_async()
        .await;

    let port = free_port();
    let base = start_gateway(test_config(port, &chat2desk.url(), &assistant.url())).await;

    let resp = reqwest::Client::new()
        .post(format!("{}/telegram/webhook", base))
        .json(&serde_json::json!({ "message": { "chat": { "id": 42 } } }))
        .send()
        .await
        .expect("webhook request");
    assert_eq!(resp.status(), 200);
    let json: serde_json::Value = resp.json().await.expect("parse JSON");
    assert_eq!(json.get("status").and_then(|v| v.as_str()), Some("sent"));
    assert_eq!(json.get("response").and_then(|v| v.as_str()), Some("Hello"));
    mocks[1].assert_async().await;
}

#[tokio::test]
async fn webhook_reports_identity_failure_with_http_200() {
    let mut chat2desk = mockito::Server::new_async().await;
    let _create_client = chat2desk
        .mock("POST", "/clients")
        .with_status(500)
        .with_body("down")
        .create_async()
        .await;

    let assistant = mockito::Server::new_async().await;
    let port = free_port();
    let base = start_gateway(test_config(port, &chat2desk.url(), &assistant.url())).await;

    let resp = reqwest::Client::new()
        .post(format!("{}/telegram/webhook", base))
        .json(&serde_json::json!({
            "message": { "chat": { "id": 42 }, "text": "Hi" }
        }))
        .send()
        .await
        .expect("webhook request");
    assert_eq!(resp.status(), 200);
    let json: serde_json::Value = resp.json().await.expect("parse JSON");
    assert_eq!(json.get("status").and_then(|v| v.as_str()), Some("error"));
    assert!(json.get("response").is_none());
}

#[tokio::test]
async fn webhook_rejects_malformed_payload_with_http_200() {
    let chat2desk = mockito::Server::new_async().await;
    let assistant = mockito::Server::new_async().await;
    let port = free_port();
    let base = start_gateway(test_config(port, &chat2desk.url(), &assistant.url())).await;

    let resp = reqwest::Client::new()
        .post(format!("{}/telegram/webhook", base))
        .header("content-type", "application/json")
        .body("not json")
        .send()
        .await
        .expect("webhook request");
    assert_eq!(resp.status(), 200);
    let json: serde_json::Value = resp.json().await.expect("parse JSON");
    assert_eq!(json.get("status").and_then(|v| v.as_str()), Some("error"));
}
