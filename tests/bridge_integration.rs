//! Bridge integration tests — hub socket → bridge loop → publisher.

use std::path::PathBuf;
use std::time::Duration;

use telldus_bridge::ipc::{Bridge, BridgeStats};
use telldus_bridge::publish::{ChannelPublisher, Published};
use telldus_bridge::types::{BridgeConfig, MalformedPolicy};
use telldus_bridge::Error;
use tokio::io::AsyncWriteExt;
use tokio::net::{UnixListener, UnixStream};
use tokio::sync::mpsc::UnboundedReceiver;
use tokio::task::JoinHandle;

const ARCTECH_EVENT: &[u8] = b"16:TDRawDeviceEvent95:class:command;protocol:arctech;model:selflearning;house:29145578;unit:2;group:0;method:turnoff;i1s";
const SENSOR_EVENT: &[u8] = b"16:TDRawDeviceEvent;protocol:mandolyn;model:temperaturehumidity;id:11;temp:22.4;humidity:38;i2s";

/// Helper: fake hub listening on a temp socket, bridge task connected to it.
struct Harness {
    _dir: tempfile::TempDir,
    hub: UnixStream,
    rx: UnboundedReceiver<Published>,
    task: JoinHandle<telldus_bridge::Result<BridgeStats>>,
}

async fn start_bridge(config: BridgeConfig) -> Harness {
    let dir = tempfile::tempdir().unwrap();
    let path: PathBuf = dir.path().join("TelldusEvents");
    let listener = UnixListener::bind(&path).unwrap();

    let (publisher, rx) = ChannelPublisher::new();
    let task = tokio::spawn(async move {
        let mut bridge = Bridge::new(publisher, config, 512);
        bridge.run_socket(&path).await
    });

    let (hub, _) = listener.accept().await.unwrap();
    Harness {
        _dir: dir,
        hub,
        rx,
        task,
    }
}

/// Helper: wait for the next published message.
async fn next(rx: &mut UnboundedReceiver<Published>) -> Published {
    tokio::time::timeout(Duration::from_secs(5), rx.recv())
        .await
        .expect("timed out waiting for publish")
        .expect("publisher channel closed")
}

#[tokio::test]
async fn test_arctech_event_round_trip() {
    let mut h = start_bridge(BridgeConfig::default()).await;
    h.hub.write_all(ARCTECH_EVENT).await.unwrap();

    let compact = next(&mut h.rx).await;
    assert_eq!(compact.topic, "telldus/event");
    assert_eq!(compact.payload, "29145578-2-0-turnoff");

    let generic = next(&mut h.rx).await;
    let json: serde_json::Value = serde_json::from_str(&generic.payload).unwrap();
    assert_eq!(
        json,
        serde_json::json!({
            "protocol": "arctech",
            "model": "selflearning",
            "house": "29145578",
            "unit": "2",
            "group": "0",
            "method": "turnoff",
        })
    );

    drop(h.hub);
    let stats = h.task.await.unwrap().unwrap();
    assert_eq!(stats.events, 1);
    assert_eq!(stats.published, 2);
}

#[tokio::test]
async fn test_events_forwarded_sequentially() {
    let mut h = start_bridge(BridgeConfig::default()).await;

    h.hub.write_all(SENSOR_EVENT).await.unwrap();
    let first = next(&mut h.rx).await;
    assert!(first.payload.contains(r#""temp":"22.4""#));

    h.hub.write_all(ARCTECH_EVENT).await.unwrap();
    assert_eq!(next(&mut h.rx).await.payload, "29145578-2-0-turnoff");
    assert!(next(&mut h.rx).await.payload.starts_with('{'));

    drop(h.hub);
    let stats = h.task.await.unwrap().unwrap();
    assert_eq!(stats.events, 2);
    assert_eq!(stats.published, 3);
    assert!(h.rx.try_recv().is_err());
}

#[tokio::test]
async fn test_malformed_event_skipped() {
    let mut h = start_bridge(BridgeConfig::default()).await;

    h.hub
        .write_all(b"16:TDRawDeviceEvent;protocol:arctech;house;i1s")
        .await
        .unwrap();
    // Give the bridge time to consume the bad event as its own read.
    tokio::time::sleep(Duration::from_millis(100)).await;
    h.hub.write_all(SENSOR_EVENT).await.unwrap();

    let published = next(&mut h.rx).await;
    assert!(published.payload.contains(r#""protocol":"mandolyn""#));

    drop(h.hub);
    let stats = h.task.await.unwrap().unwrap();
    assert_eq!(stats.skipped, 1);
    assert_eq!(stats.published, 1);
}

#[tokio::test]
async fn test_malformed_event_aborts() {
    let config = BridgeConfig {
        on_malformed: MalformedPolicy::Abort,
        ..BridgeConfig::default()
    };
    let h = start_bridge(config).await;
    let mut hub = h.hub;

    hub.write_all(b"16:TDRawDeviceEvent;house;i1s").await.unwrap();

    let err = h.task.await.unwrap().unwrap_err();
    assert!(matches!(err, Error::MalformedField { .. }));
}

#[tokio::test]
async fn test_missing_socket_is_fatal() {
    let dir = tempfile::tempdir().unwrap();
    let (publisher, _rx) = ChannelPublisher::new();
    let mut bridge = Bridge::new(publisher, BridgeConfig::default(), 512);

    let err = bridge
        .run_socket(dir.path().join("TelldusEvents"))
        .await
        .unwrap_err();
    assert!(matches!(err, Error::Connection(_)));
    assert!(err.is_fatal());
}
