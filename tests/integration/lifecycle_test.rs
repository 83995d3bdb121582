// tests/integration/lifecycle_test.rs

//! Start/stop semantics and connection teardown.

use super::test_helpers::{TestBridge, init_tracing, test_config, wait_until};
use mobdebug_bridge::core::state::ConnectionState;
use mobdebug_bridge::{BridgeError, DebugServer};
use std::sync::Arc;
use tokio::net::TcpStream;

#[tokio::test]
async fn stop_before_start_is_harmless() {
    init_tracing();
    let listener = Arc::new(super::test_helpers::RecordingListener::default());
    let server = DebugServer::new(test_config(), listener.clone());

    server.stop().await;
    server.stop().await;
    assert_eq!(server.state(), ConnectionState::Closed);
    assert!(matches!(
        server.start().await,
        Err(BridgeError::InvalidState(_))
    ));
    assert!(!server.add_text_command("RUN"));
    assert_eq!(listener.disconnects(), 0);
}

#[tokio::test]
async fn start_twice_is_rejected() {
    let bridge = TestBridge::start().await;
    assert_eq!(bridge.server.state(), ConnectionState::Listening);
    assert_eq!(bridge.server.local_addr(), Some(bridge.addr));
    assert!(matches!(
        bridge.server.start().await,
        Err(BridgeError::InvalidState(_))
    ));
    bridge.server.stop().await;
}

#[tokio::test]
async fn stop_while_listening_releases_port() {
    let bridge = TestBridge::start().await;
    bridge.server.stop().await;
    bridge.server.stop().await;

    assert_eq!(bridge.server.state(), ConnectionState::Closed);
    assert!(TcpStream::connect(bridge.addr).await.is_err());
}

#[tokio::test]
async fn stop_abandons_pending_and_closes_socket() {
    let bridge = TestBridge::start().await;
    let mut debuggee = bridge.attach_running().await;
    assert_eq!(bridge.server.state(), ConnectionState::Streaming);

    let pending = bridge.server.request("STACK", 1);
    assert_eq!(debuggee.expect_line().await, "STACK");
    let queued = bridge.server.request("EXEC x", 1);

    bridge.server.stop().await;
    bridge.server.stop().await;

    assert_eq!(pending.await, Err(BridgeError::ConnectionClosed));
    assert_eq!(queued.await, Err(BridgeError::ConnectionClosed));
    debuggee.expect_eof().await;
    assert_eq!(bridge.server.state(), ConnectionState::Closed);
    assert_eq!(bridge.listener.disconnects(), 1);
    // Shutdown is not a session failure.
    assert!(bridge.listener.faults().is_empty());

    let late = bridge.server.request("STEP", 1);
    assert_eq!(late.await, Err(BridgeError::ConnectionClosed));
}

#[tokio::test]
async fn debuggee_disconnect_closes_session() {
    let bridge = TestBridge::start().await;
    let debuggee = bridge.attach_running().await;
    let pending = bridge.server.request("STACK", 1);
    drop(debuggee);

    let listener = bridge.listener.clone();
    wait_until(move || listener.disconnects() == 1).await;
    assert_eq!(bridge.server.state(), ConnectionState::Closed);
    assert_eq!(pending.await, Err(BridgeError::ConnectionClosed));
    assert!(!bridge.server.add_text_command("RUN"));

    bridge.server.stop().await;
    assert_eq!(bridge.listener.disconnects(), 1);
}

#[tokio::test]
async fn only_one_connection_is_serviced() {
    let bridge = TestBridge::start().await;
    let mut debuggee = bridge.attach_running().await;

    assert!(TcpStream::connect(bridge.addr).await.is_err());

    bridge.server.add_text_command("STEP");
    assert_eq!(debuggee.expect_line().await, "STEP");
    bridge.server.stop().await;
}

#[tokio::test]
async fn bind_failure_is_reported_to_caller() {
    let bridge = TestBridge::start().await;
    let mut config = test_config();
    config.port = bridge.addr.port();

    let second = DebugServer::new(
        config,
        Arc::new(super::test_helpers::RecordingListener::default()),
    );
    let err = second.start().await.unwrap_err();
    assert!(matches!(err, BridgeError::Bind { .. }));
    assert!(err.is_transport_fault());
    assert_eq!(second.state(), ConnectionState::Unbound);

    bridge.server.stop().await;
}
