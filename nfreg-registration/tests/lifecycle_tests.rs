//! End-to-end lifecycle tests against a mock NRF
//!
//! Run with: cargo test --test lifecycle_tests

use nfreg_core::{ConfigurationSnapshot, PlmnId};
use nfreg_registration::{
    NrfClient, NrfClientConfig, RegistrationCoordinator, RegistrationMonitor,
    RegistrationSettings, RegistrationState, TokioScheduler,
};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

const INSTANCE_PATH: &str = "/nnrf-nfm/v1/nf-instances/ausf-1";
const WAIT_LIMIT: Duration = Duration::from_secs(5);

struct Running {
    monitor: RegistrationMonitor,
    snapshots: mpsc::Sender<ConfigurationSnapshot>,
    shutdown: CancellationToken,
    task: JoinHandle<()>,
}

fn start_coordinator(server: &MockServer) -> Running {
    let client = NrfClient::new(NrfClientConfig {
        nrf_uri: server.uri(),
        nf_instance_id: "ausf-1".to_string(),
        nf_type: "AUSF".to_string(),
        ipv4_addresses: vec!["10.0.0.5".to_string()],
        fqdn: None,
        request_timeout: Duration::from_secs(1),
    })
    .expect("Failed to create NRF client");

    let coordinator = RegistrationCoordinator::new(
        Arc::new(client),
        Arc::new(TokioScheduler),
        RegistrationSettings {
            retry_interval: Duration::from_millis(100),
            default_heartbeat: Duration::from_secs(60),
        },
    );
    let monitor = coordinator.monitor();
    let (snapshots, rx) = mpsc::channel(4);
    let shutdown = CancellationToken::new();
    let task = tokio::spawn(coordinator.run(shutdown.clone(), rx));

    Running {
        monitor,
        snapshots,
        shutdown,
        task,
    }
}

fn served(ids: &[(&str, &str)]) -> ConfigurationSnapshot {
    ids.iter().map(|(mcc, mnc)| PlmnId::new(*mcc, *mnc)).collect()
}

async fn count(server: &MockServer, verb: &str) -> usize {
    server
        .received_requests()
        .await
        .unwrap_or_default()
        .iter()
        .filter(|r| r.method.as_str() == verb)
        .count()
}

/// Wait until the mock NRF has seen at least `at_least` requests of `verb`
async fn wait_for_requests(server: &MockServer, verb: &str, at_least: usize) {
    let deadline = tokio::time::Instant::now() + WAIT_LIMIT;
    while count(server, verb).await < at_least {
        assert!(
            tokio::time::Instant::now() < deadline,
            "timed out waiting for {at_least} {verb} request(s)"
        );
        tokio::time::sleep(Duration::from_millis(20)).await;
    }
}

async fn wait_for_state(monitor: &RegistrationMonitor, state: RegistrationState) {
    let deadline = tokio::time::Instant::now() + WAIT_LIMIT;
    while monitor.state() != state {
        assert!(
            tokio::time::Instant::now() < deadline,
            "timed out waiting for state {state}, still {}",
            monitor.state()
        );
        tokio::time::sleep(Duration::from_millis(20)).await;
    }
}

#[tokio::test]
async fn test_register_retry_heartbeat_and_withdraw() {
    let server = MockServer::start().await;
    Mock::given(method("PUT"))
        .and(path(INSTANCE_PATH))
        .respond_with(ResponseTemplate::new(503))
        .up_to_n_times(2)
        .mount(&server)
        .await;
    Mock::given(method("PUT"))
        .and(path(INSTANCE_PATH))
        .respond_with(
            ResponseTemplate::new(201).set_body_json(serde_json::json!({"heartBeatTimer": 1})),
        )
        .mount(&server)
        .await;
    Mock::given(method("PATCH"))
        .and(path(INSTANCE_PATH))
        .respond_with(ResponseTemplate::new(204))
        .mount(&server)
        .await;
    Mock::given(method("DELETE"))
        .and(path(INSTANCE_PATH))
        .respond_with(ResponseTemplate::new(204))
        .mount(&server)
        .await;

    let running = start_coordinator(&server);
    running.snapshots.send(served(&[("001", "01")])).await.unwrap();

    wait_for_state(&running.monitor, RegistrationState::Heartbeating).await;
    assert_eq!(count(&server, "PUT").await, 3);

    // the NRF advertised a 1s heartbeat
    wait_for_requests(&server, "PATCH", 1).await;
    assert!(running.monitor.status().keep_alive_armed);

    running.snapshots.send(ConfigurationSnapshot::empty()).await.unwrap();
    wait_for_requests(&server, "DELETE", 1).await;
    wait_for_state(&running.monitor, RegistrationState::Idle).await;

    let status = running.monitor.status();
    assert!(!status.keep_alive_armed);
    assert_eq!(status.served, None);

    running.shutdown.cancel();
    tokio::time::timeout(WAIT_LIMIT, running.task)
        .await
        .unwrap()
        .unwrap();
}

#[tokio::test]
async fn test_rejected_heartbeat_triggers_re_registration() {
    let server = MockServer::start().await;
    Mock::given(method("PUT"))
        .and(path(INSTANCE_PATH))
        .respond_with(
            ResponseTemplate::new(201).set_body_json(serde_json::json!({"heartBeatTimer": 1})),
        )
        .mount(&server)
        .await;
    Mock::given(method("PATCH"))
        .and(path(INSTANCE_PATH))
        .respond_with(ResponseTemplate::new(404))
        .up_to_n_times(1)
        .mount(&server)
        .await;
    Mock::given(method("PATCH"))
        .and(path(INSTANCE_PATH))
        .respond_with(ResponseTemplate::new(204))
        .mount(&server)
        .await;

    let running = start_coordinator(&server);
    running.snapshots.send(served(&[("001", "01")])).await.unwrap();

    wait_for_requests(&server, "PUT", 2).await;
    wait_for_requests(&server, "PATCH", 2).await;
    assert_eq!(running.monitor.state(), RegistrationState::Heartbeating);

    running.shutdown.cancel();
    tokio::time::timeout(WAIT_LIMIT, running.task)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(count(&server, "DELETE").await, 0);
}

#[tokio::test]
async fn test_shutdown_while_nrf_unreachable() {
    let server = MockServer::start().await;
    Mock::given(method("PUT"))
        .and(path(INSTANCE_PATH))
        .respond_with(ResponseTemplate::new(500))
        .mount(&server)
        .await;

    let running = start_coordinator(&server);
    running.snapshots.send(served(&[("001", "01")])).await.unwrap();

    wait_for_requests(&server, "PUT", 2).await;
    assert_eq!(running.monitor.state(), RegistrationState::Registering);

    running.shutdown.cancel();
    tokio::time::timeout(WAIT_LIMIT, running.task)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(running.monitor.state(), RegistrationState::Idle);
}
