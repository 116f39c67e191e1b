use super::*;
use serde_json::json;

const URL: &str = "https://utas.example.com/ut/game/fc25/purchased/items";

fn bridge() -> EventBridge {
    EventBridge::new(Arc::new(PurchaseStore::new()), &BridgeConfig::default()).unwrap()
}

fn capture(method: &str, url: &str, body: &str) -> RawCapture {
    RawCapture {
        frame_id: "main".to_string(),
        source: CaptureSource::Fetch,
        method: method.to_string(),
        url: url.to_string(),
        body: body.to_string(),
    }
}

#[test]
fn test_new_rejects_bad_config() {
    let store = Arc::new(PurchaseStore::new());
    let bad_pattern = BridgeConfig {
        url_pattern: "(".to_string(),
        ..BridgeConfig::default()
    };
    assert!(EventBridge::new(store.clone(), &bad_pattern).is_err());

    let zero = BridgeConfig {
        channel_capacity: 0,
        ..BridgeConfig::default()
    };
    assert!(matches!(
        EventBridge::new(store, &zero),
        Err(BridgeError::InvalidCapacity(0))
    ));
}

#[test]
fn test_ingest_records_and_returns_payload() {
    let bridge = bridge();
    let delivered = bridge
        .ingest(capture("GET", URL, r#"{"items":[{"rating":84}],"duplicateItemIdList":[1]}"#))
        .unwrap();

    assert!(delivered.ok);
    assert_eq!(delivered.url, URL);
    assert_eq!(bridge.delivered_count(), 1);
    assert_eq!(bridge.store().histogram().get(&84), Some(&1));
    assert!(bridge.store().stats().all_duplicates);
}

#[test]
fn test_ingest_swallows_bad_json() {
    let bridge = bridge();
    assert!(bridge.ingest(capture("GET", URL, "<html>oops")).is_none());
    assert!(bridge.ingest(capture("GET", URL, "")).is_none());
    assert_eq!(bridge.delivered_count(), 0);
    assert!(bridge.store().latest().is_none());
}

#[test]
fn test_ingest_ignores_non_matching() {
    let bridge = bridge();
    assert!(bridge.ingest(capture("PUT", URL, "{}")).is_none());
    assert!(bridge
        .ingest(capture("GET", "https://utas.example.com/ut/game/fc25/club", "{}"))
        .is_none());
    assert_eq!(bridge.delivered_count(), 0);
}

#[test]
fn test_mark_installed_is_idempotent() {
    let bridge = bridge();
    assert!(bridge.mark_installed("frame-1"));
    assert!(!bridge.mark_installed("frame-1"));
    assert!(bridge.mark_installed("frame-2"));
    assert!(bridge.is_installed("frame-1"));

    bridge.forget_frame("frame-1");
    assert!(!bridge.is_installed("frame-1"));
    assert!(bridge.mark_installed("frame-1"));
}

#[test]
fn test_hook_script_follows_url_pattern() {
    let config = BridgeConfig {
        url_pattern: r"/ut/game/fc26/purchased/items".to_string(),
        ..BridgeConfig::default()
    };
    let bridge = EventBridge::new(Arc::new(PurchaseStore::new()), &config).unwrap();

    assert!(bridge.hook_script().contains(r#"new RegExp("/ut/game/fc26/purchased/items")"#));
    assert!(!bridge.hook_script().contains("fc25"));
    assert!(bridge.hook_script().contains(crate::CAPTURE_BINDING));
}

#[test]
fn test_raw_capture_from_binding() {
    let payload = json!({
        "source": "xhr",
        "method": "POST",
        "url": URL,
        "body": "{\"items\":[]}"
    })
    .to_string();
    let capture = RawCapture::from_binding("child-frame", &payload).unwrap();
    assert_eq!(capture.frame_id, "child-frame");
    assert_eq!(capture.source, CaptureSource::Xhr);
    assert_eq!(capture.method, "POST");

    assert!(RawCapture::from_binding("f", "not json").is_none());
    assert!(RawCapture::from_binding("f", r#"{"source":"carrier-pigeon","url":"x"}"#).is_none());
}

#[test]
fn test_raw_capture_defaults_method() {
    let capture = RawCapture::from_binding("f", r#"{"source":"fetch","url":"u"}"#).unwrap();
    assert_eq!(capture.method, "GET");
    assert!(capture.body.is_empty());
}

#[tokio::test]
async fn test_waiter_receives_payload_delivered_after_arming() {
    let bridge = bridge();
    let waiter = bridge.arm();
    bridge.ingest(capture("GET", URL, r#"{"items":[]}"#));

    let response = waiter.wait(Duration::from_secs(1)).await.unwrap();
    assert_eq!(response.data, json!({"items": []}));
}

#[tokio::test]
async fn test_waiter_ignores_payloads_before_arming() {
    let bridge = bridge();
    bridge.ingest(capture("GET", URL, r#"{"items":[{"rating":1}]}"#));
    let waiter = bridge.arm();
    bridge.ingest(capture("GET", URL, r#"{"items":[{"rating":2}]}"#));

    let response = waiter.wait(Duration::from_secs(1)).await.unwrap();
    assert_eq!(response.data["items"][0]["rating"], 2);
}

#[tokio::test(start_paused = true)]
async fn test_waiter_times_out() {
    let bridge = bridge();
    let waiter = bridge.arm();
    assert!(waiter.wait(Duration::from_secs(12)).await.is_none());
}

#[tokio::test]
async fn test_single_capture_delivered_once_per_subscriber() {
    let bridge = bridge();
    let mut sub = bridge.subscribe();
    bridge.mark_installed("main");
    bridge.mark_installed("main");

    bridge.ingest(capture("GET", URL, r#"{"items":[]}"#));

    assert!(sub.recv().await.is_ok());
    assert!(matches!(
        sub.try_recv(),
        Err(tokio::sync::broadcast::error::TryRecvError::Empty)
    ));
}

#[tokio::test]
async fn test_spawn_ingest_forwards() {
    let bridge = Arc::new(bridge());
    let waiter = bridge.arm();
    let (tx, rx) = mpsc::unbounded_channel();
    let handle = bridge.spawn_ingest(rx);

    tx.send(capture("POST", URL, r#"{"items":[{"rating":86}]}"#)).unwrap();
    let response = waiter.wait(Duration::from_secs(5)).await.unwrap();
    assert_eq!(response.data["items"][0]["rating"], 86);

    drop(tx);
    handle.await.unwrap();
}
