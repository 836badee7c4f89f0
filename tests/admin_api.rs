//! Admin API tests over real HTTP.

use std::time::Duration;

use futures_util::StreamExt;
use serde_json::{json, Value};
use tokio_tungstenite::tungstenite::client::IntoClientRequest;
use tokio_tungstenite::tungstenite::http::HeaderValue;

use failover_orchestrator::failover::{FailoverEvent, FailoverMode, FailoverState, ServiceCategory};
use failover_orchestrator::Shutdown;

mod common;

use common::{start_admin_server, test_config, wired_orchestrator, TEST_API_KEY};

fn client() -> reqwest::Client {
    reqwest::Client::builder().no_proxy().build().unwrap()
}

fn bearer() -> String {
    format!("Bearer {}", TEST_API_KEY)
}

#[tokio::test]
async fn test_requests_without_token_are_rejected() {
    let (orch, broadcaster) = wired_orchestrator(&test_config(FailoverMode::Automatic, 3));
    let shutdown = Shutdown::new();
    let addr = start_admin_server(orch, &broadcaster, &shutdown).await;

    let res = client().get(format!("http://{}/admin/status", addr)).send().await.unwrap();
    assert_eq!(res.status(), 401);

    let res = client()
        .get(format!("http://{}/admin/status", addr))
        .header("Authorization", "Bearer wrong-key")
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), 401);

    shutdown.trigger();
}

#[tokio::test]
async fn test_status_and_fallback_queries() {
    let (orch, broadcaster) = wired_orchestrator(&test_config(FailoverMode::Automatic, 3));
    let shutdown = Shutdown::new();
    let addr = start_admin_server(orch.clone(), &broadcaster, &shutdown).await;
    let http = client();

    let status: Value = http
        .get(format!("http://{}/admin/status", addr))
        .header("Authorization", bearer())
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(status["state"], "normal");
    assert_eq!(status["registered_fallbacks"], 6);
    assert_eq!(status["version"], env!("CARGO_PKG_VERSION"));

    let fallbacks: Value = http
        .get(format!("http://{}/admin/fallbacks", addr))
        .header("Authorization", bearer())
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(fallbacks["redis"]["fallback_target"], "in_memory_cache");
    assert_eq!(fallbacks["graph_store"]["is_active"], false);

    // camelCase spelling resolves to the same category
    let res = http
        .get(format!("http://{}/admin/fallbacks/searchIndex", addr))
        .header("Authorization", bearer())
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), 200);
    let fallback: Value = res.json().await.unwrap();
    assert_eq!(fallback["category"], "search_index");

    let res = http
        .get(format!("http://{}/admin/fallbacks/mainframe", addr))
        .header("Authorization", bearer())
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), 400);

    shutdown.trigger();
}

#[tokio::test]
async fn test_unregistered_category_returns_not_found() {
    let mut config = test_config(FailoverMode::Automatic, 3);
    config.categories.retain(|c| c.category != ServiceCategory::SubEngine);
    let (orch, broadcaster) = wired_orchestrator(&config);
    let shutdown = Shutdown::new();
    let addr = start_admin_server(orch.clone(), &broadcaster, &shutdown).await;

    let res = client()
        .post(format!("http://{}/admin/fallbacks/sub_engine/failover", addr))
        .header("Authorization", bearer())
        .json(&json!({}))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), 404);
    let body: Value = res.json().await.unwrap();
    assert!(body["error"].as_str().unwrap().contains("sub_engine"));
    assert!(orch.recent_events(10).is_empty());

    shutdown.trigger();
}

#[tokio::test]
async fn test_manual_failover_and_recovery_endpoints() {
    let (orch, broadcaster) = wired_orchestrator(&test_config(FailoverMode::Manual, 3));
    let shutdown = Shutdown::new();
    let addr = start_admin_server(orch.clone(), &broadcaster, &shutdown).await;
    let http = client();

    let res = http
        .post(format!("http://{}/admin/fallbacks/message_broker/failover", addr))
        .header("Authorization", bearer())
        .json(&json!({ "reason": "broker maintenance" }))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), 200);
    let body: Value = res.json().await.unwrap();
    assert_eq!(body["changed"], true);
    assert_eq!(body["event"]["trigger_reason"], "broker maintenance");
    assert_eq!(body["event"]["auto_triggered"], false);
    assert!(orch.fallback_status(ServiceCategory::MessageBroker).unwrap().is_active);

    let body: Value = http
        .post(format!("http://{}/admin/fallbacks/message_broker/failover", addr))
        .header("Authorization", bearer())
        .json(&json!({}))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(body["changed"], false);
    assert!(body["event"].is_null());

    let body: Value = http
        .post(format!("http://{}/admin/fallbacks/message_broker/recover", addr))
        .header("Authorization", bearer())
        .json(&json!({}))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(body["changed"], true);
    assert_eq!(body["event"]["to_state"], "recovery");
    assert_eq!(body["event"]["trigger_reason"], "manual recovery via admin API");

    let events: Value = http
        .get(format!("http://{}/admin/events?limit=1", addr))
        .header("Authorization", bearer())
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    let events = events.as_array().unwrap();
    assert_eq!(events.len(), 1);
    assert_eq!(events[0]["to_state"], "recovery");

    let metrics: Value = http
        .get(format!("http://{}/admin/metrics", addr))
        .header("Authorization", bearer())
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(metrics["total_failovers_triggered"], 1);
    assert_eq!(metrics["total_recoveries"], 1);
    assert_eq!(metrics["current_active_failovers"], 0);

    shutdown.trigger();
}

#[tokio::test]
async fn test_manual_endpoints_accept_empty_body() {
    let (orch, broadcaster) = wired_orchestrator(&test_config(FailoverMode::Automatic, 3));
    let shutdown = Shutdown::new();
    let addr = start_admin_server(orch.clone(), &broadcaster, &shutdown).await;
    let http = client();

    let res = http
        .post(format!("http://{}/admin/fallbacks/redis/failover", addr))
        .header("Authorization", bearer())
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), 200);
    let body: Value = res.json().await.unwrap();
    assert_eq!(body["changed"], true);
    assert_eq!(body["event"]["trigger_reason"], "manual failover via admin API");

    let res = http
        .post(format!("http://{}/admin/fallbacks/redis/recover", addr))
        .header("Authorization", bearer())
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), 200);
    let body: Value = res.json().await.unwrap();
    assert_eq!(body["event"]["trigger_reason"], "manual recovery via admin API");

    shutdown.trigger();
}

#[tokio::test]
async fn test_event_limit_follows_configured_history() {
    let mut config = test_config(FailoverMode::Automatic, 3);
    config.failover.event_history_limit = 1_500;
    let (orch, broadcaster) = wired_orchestrator(&config);
    for _ in 0..600 {
        orch.manual_failover(ServiceCategory::Redis, "drill").unwrap();
        orch.manual_recovery(ServiceCategory::Redis, "drill over").unwrap();
    }
    let shutdown = Shutdown::new();
    let addr = start_admin_server(orch.clone(), &broadcaster, &shutdown).await;
    let http = client();

    let events: Value = http
        .get(format!("http://{}/admin/events?limit=5000", addr))
        .header("Authorization", bearer())
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(events.as_array().unwrap().len(), 1_200);

    let events: Value = http
        .get(format!("http://{}/admin/events", addr))
        .header("Authorization", bearer())
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(events.as_array().unwrap().len(), 50);

    shutdown.trigger();
}

#[tokio::test]
async fn test_event_stream_delivers_transitions() {
    let (orch, broadcaster) = wired_orchestrator(&test_config(FailoverMode::Automatic, 3));
    let shutdown = Shutdown::new();
    let addr = start_admin_server(orch.clone(), &broadcaster, &shutdown).await;

    let mut request = format!("ws://{}/admin/events/stream", addr)
        .into_client_request()
        .unwrap();
    request
        .headers_mut()
        .insert("Authorization", HeaderValue::from_str(&bearer()).unwrap());
    let (mut ws, _) = tokio_tungstenite::connect_async(request).await.expect("WebSocket upgrade failed");

    orch.manual_failover(ServiceCategory::Redis, "cache cluster drained").unwrap();

    let msg = tokio::time::timeout(Duration::from_secs(5), ws.next())
        .await
        .expect("no event within timeout")
        .expect("stream closed")
        .unwrap();
    let event: FailoverEvent = serde_json::from_str(msg.to_text().unwrap()).unwrap();
    assert_eq!(event.category, ServiceCategory::Redis);
    assert_eq!(event.to_state, FailoverState::FailoverActive);
    assert_eq!(event.trigger_reason, "cache cluster drained");

    shutdown.trigger();
}
