//! End-to-end tests for canary-core against a local HTTP stub of the Canary API.
//!
//! Run with: `cargo test --package canary-core --test integration`

use std::io::Write;
use std::sync::Arc;
use std::time::Duration;

use canary_core::{
    AirQuality, Bridge, BridgeSettings, CanaryApi, CanaryClient, Credentials, Error, PollOptions,
    Poller, SensorCache, Session, SessionManager, UpdateOutcome,
};
use mockito::{Matcher, Server};
use tokio::time::{sleep, timeout};

const WAIT: Duration = Duration::from_secs(5);

async fn mock_login(server: &mut Server) {
    server
        .mock("GET", "/login")
        .with_header("set-cookie", "XSRF-TOKEN=xsrf-1; Path=/")
        .create_async()
        .await;
    server
        .mock("POST", "/api/auth/login")
        .match_header("x-xsrf-token", "xsrf-1")
        .with_header("content-type", "application/json")
        .with_body(r#"{"access_token": "tok-1"}"#)
        .create_async()
        .await;
}

fn settings() -> BridgeSettings {
    BridgeSettings {
        name: "Hall".to_string(),
        serial: "C100".to_string(),
        session: None,
        credentials: Some(Credentials::new("me@example.com", "secret")),
        poll: PollOptions::from_secs(10),
    }
}

#[tokio::test]
async fn test_login_resolve_and_poll() {
    let mut server = Server::new_async().await;
    mock_login(&mut server).await;
    server
        .mock("GET", "/api/locations")
        .match_header("authorization", "Bearer tok-1")
        .with_header("content-type", "application/json")
        .with_body(
            r#"[
                {"name": "Home", "devices": [
                    {"id": 7, "serial_number": "C099"},
                    {"id": 42, "serial_number": "C100", "name": "Hall"}
                ]}
            ]"#,
        )
        .create_async()
        .await;
    let readings = server
        .mock("GET", "/api/readings")
        .match_header("authorization", "Bearer tok-1")
        .match_query(Matcher::AllOf(vec![
            Matcher::UrlEncoded("deviceId".into(), "42".into()),
            Matcher::UrlEncoded("type".into(), "canary".into()),
        ]))
        .with_header("content-type", "application/json")
        .with_body(
            r#"[
                {"sensor_type": "temperature", "value": 21.5},
                {"sensor_type": "humidity", "value": 38.0},
                {"sensor_type": "air_quality", "value": 0.52}
            ]"#,
        )
        .expect(1)
        .create_async()
        .await;

    let client = CanaryClient::new(&server.url()).unwrap();
    let bridge = Bridge::new(Arc::new(client), settings()).unwrap();
    let accessory = bridge.accessory();
    let session = bridge.session();
    let handle = bridge.start().await;

    timeout(WAIT, async {
        while handle.stats().snapshot().success_count == 0 {
            sleep(Duration::from_millis(20)).await;
        }
    })
    .await
    .expect("first update cycle did not complete");

    assert_eq!(session.current().unwrap().token(), "tok-1");
    assert_eq!(accessory.temperature().unwrap(), 21.5);
    assert_eq!(accessory.humidity().unwrap(), 38.0);
    assert_eq!(accessory.air_quality().unwrap(), AirQuality::Inferior);
    assert_eq!(handle.stats().snapshot().success_count, 1);

    handle.shutdown().await;
    readings.assert_async().await;
}

#[tokio::test]
async fn test_unknown_serial_keeps_cache_empty() {
    let mut server = Server::new_async().await;
    mock_login(&mut server).await;
    server
        .mock("GET", "/api/locations")
        .with_header("content-type", "application/json")
        .with_body(r#"[{"devices": [{"id": "abc", "serial_number": "OTHER"}]}]"#)
        .create_async()
        .await;
    let readings = server
        .mock("GET", "/api/readings")
        .match_query(Matcher::Any)
        .expect(0)
        .create_async()
        .await;

    let client = CanaryClient::new(&server.url()).unwrap();
    let bridge = Bridge::new(Arc::new(client), settings()).unwrap();
    let accessory = bridge.accessory();
    let handle = bridge.start().await;

    timeout(WAIT, async {
        while handle.stats().snapshot().failure_count == 0 {
            sleep(Duration::from_millis(20)).await;
        }
    })
    .await
    .expect("first update cycle did not fail");

    let stats = handle.stats().snapshot();
    assert!(stats.last_error.unwrap().contains("C100"));
    assert!(matches!(
        accessory.temperature(),
        Err(Error::NotInitialized { .. })
    ));
    assert!(handle.is_active());

    handle.shutdown().await;
    readings.assert_async().await;
}

#[tokio::test]
async fn test_dropped_readings_connection_keeps_cached_values() {
    let mut server = Server::new_async().await;
    server
        .mock("GET", "/api/locations")
        .with_header("content-type", "application/json")
        .with_body(r#"[{"devices": [{"id": 42, "serial_number": "C100"}]}]"#)
        .create_async()
        .await;
    let first = server
        .mock("GET", "/api/readings")
        .match_query(Matcher::Any)
        .with_header("content-type", "application/json")
        .with_body(r#"[{"sensor_type": "temperature", "value": 21.5}, {"sensor_type": "humidity", "value": 38.0}]"#)
        .expect(1)
        .create_async()
        .await;
    let dropped = server
        .mock("GET", "/api/readings")
        .match_query(Matcher::Any)
        .with_header("content-type", "application/json")
        .with_chunked_body(|w| {
            w.write_all(br#"[{"sensor_type": "temperature", "val"#)?;
            Err(std::io::Error::new(
                std::io::ErrorKind::ConnectionReset,
                "connection reset",
            ))
        })
        .expect(1)
        .create_async()
        .await;
    server
        .mock("GET", "/api/readings")
        .match_query(Matcher::Any)
        .with_header("content-type", "application/json")
        .with_body(r#"[{"sensor_type": "temperature", "value": 22.0}]"#)
        .create_async()
        .await;

    let api: Arc<dyn CanaryApi> = Arc::new(CanaryClient::new(&server.url()).unwrap());
    let session = Arc::new(SessionManager::new(
        Arc::clone(&api),
        Some(Session::new("tok-1")),
        None,
    ));
    let cache = Arc::new(SensorCache::new());
    let poller = Poller::new(
        api,
        session,
        Arc::clone(&cache),
        "C100",
        PollOptions::from_secs(10),
    )
    .unwrap();

    assert!(matches!(
        poller.run_cycle().await,
        Some(UpdateOutcome::Updated { readings: 2 })
    ));
    first.assert_async().await;

    let err = poller.update().await.unwrap_err();
    assert!(matches!(err, Error::Network { .. }), "got {err:?}");
    dropped.assert_async().await;
    assert_eq!(cache.get("temperature").unwrap(), 21.5);
    assert_eq!(cache.get("humidity").unwrap(), 38.0);

    assert!(matches!(
        poller.run_cycle().await,
        Some(UpdateOutcome::Updated { readings: 1 })
    ));
    assert_eq!(cache.get("temperature").unwrap(), 22.0);
    assert_eq!(cache.get("humidity").unwrap(), 38.0);
}
