//! Connection Integration Tests
//!
//! Drives the connection manager against the in-process gateway: handshake,
//! dispatch decoding, heartbeats, reconnects and close codes.
//!
//! Run with: cargo test -p integration-tests --test connection_tests

use std::time::Duration;

use chat_common::AppError;
use chat_core::{ChatEvent, RoomId};
use chat_sync::connection::{
    ConnectionConfig, ConnectionEvent, ConnectionHandle, ConnectionManager, ConnectionState,
    DisconnectReason, ReconnectPolicy,
};
use chat_sync::events::OutboundSignal;
use chat_sync::protocol::GatewayMessage;
use integration_tests::*;
use serde_json::json;
use tokio::sync::mpsc;

fn config(gateway: &TestGateway) -> ConnectionConfig {
    ConnectionConfig {
        connect_timeout: Duration::from_secs(2),
        reconnect: ReconnectPolicy {
            initial_delay: Duration::from_millis(20),
            max_delay: Duration::from_millis(100),
            max_attempts: 0,
            ..ReconnectPolicy::default()
        },
        ..ConnectionConfig::new(gateway.url())
    }
}

async fn connect(
    gateway: &TestGateway,
) -> (ConnectionManager, ConnectionHandle, mpsc::Receiver<ConnectionEvent>) {
    let (events_tx, mut events) = mpsc::channel(64);
    let manager = ConnectionManager::new(config(gateway), events_tx);
    let handle = manager
        .connect(VALID_TOKEN, "chat")
        .await
        .expect("Failed to connect");

    match next_event(&mut events).await {
        ConnectionEvent::Connected { user_id, .. } => assert_eq!(user_id.as_str(), ME),
        other => panic!("expected Connected, got {other:?}"),
    }
    (manager, handle, events)
}

async fn next_event(events: &mut mpsc::Receiver<ConnectionEvent>) -> ConnectionEvent {
    within(events.recv())
        .await
        .expect("No connection event")
        .expect("Event channel closed")
}

// ============================================================================
// Handshake
// ============================================================================

#[tokio::test]
async fn test_connect_and_send_signal() {
    let gateway = TestGateway::start(ME).await.unwrap();
    let (manager, handle, _events) = connect(&gateway).await;

    assert_eq!(manager.state(), ConnectionState::Connected);
    assert!(handle.is_connected());
    assert_eq!(gateway.identified(), 1);

    handle
        .send(OutboundSignal::JoinRoom(RoomId::new("R42")))
        .unwrap();
    gateway
        .wait_for_command(|c| c == &OutboundSignal::JoinRoom(RoomId::new("R42")))
        .await
        .unwrap();
}

#[tokio::test]
async fn test_invalid_token_is_authentication_error() {
    let gateway = TestGateway::start(ME).await.unwrap();
    let (events_tx, _events) = mpsc::channel(8);
    let manager = ConnectionManager::new(config(&gateway), events_tx);

    let err = manager.connect("wrong-token", "chat").await.unwrap_err();
    assert!(matches!(err, AppError::Authentication(_)), "got {err:?}");
    assert!(err.is_fatal());
    assert_eq!(manager.state(), ConnectionState::Error);
    assert_eq!(gateway.identified(), 0);
}

// ============================================================================
// Dispatch
// ============================================================================

#[tokio::test]
async fn test_dispatch_becomes_push_event() {
    let gateway = TestGateway::start(ME).await.unwrap();
    let (_manager, _handle, mut events) = connect(&gateway).await;

    gateway.push(typing("R1", "alice", true));

    match next_event(&mut events).await {
        ConnectionEvent::Push(ChatEvent::Typing(event)) => {
            assert_eq!(event.room_id.as_str(), "R1");
            assert!(event.is_typing);
        }
        other => panic!("expected typing push, got {other:?}"),
    }
}

#[tokio::test]
async fn test_unknown_and_malformed_dispatches_are_skipped() {
    let gateway = TestGateway::start(ME).await.unwrap();
    let (_manager, handle, mut events) = connect(&gateway).await;

    gateway.push_raw(GatewayMessage::dispatch("ROOM_ARCHIVED", 90, json!({"roomId": "R1"})));
    gateway.push_raw(GatewayMessage::dispatch("NEW_MESSAGE", 91, json!({"roomId": 5})));
    gateway.push(online("bob"));

    assert!(matches!(
        next_event(&mut events).await,
        ConnectionEvent::Push(ChatEvent::UserOnline(_))
    ));
    assert!(handle.is_connected());
}

// ============================================================================
// Reconnect
// ============================================================================

#[tokio::test]
async fn test_server_requested_reconnect() {
    let gateway = TestGateway::start(ME).await.unwrap();
    let (manager, _handle, mut events) = connect(&gateway).await;

    gateway.kick(Kick::Reconnect);

    assert_eq!(
        next_event(&mut events).await,
        ConnectionEvent::Disconnected(DisconnectReason::ServerRequested)
    );
    assert!(matches!(
        next_event(&mut events).await,
        ConnectionEvent::Connected { .. }
    ));
    assert_eq!(gateway.identified(), 2);
    assert_eq!(manager.state(), ConnectionState::Connected);
}

#[tokio::test]
async fn test_dropped_socket_reconnects() {
    let gateway = TestGateway::start(ME).await.unwrap();
    let (_manager, handle, mut events) = connect(&gateway).await;

    gateway.kick(Kick::Drop);

    match next_event(&mut events).await {
        ConnectionEvent::Disconnected(reason) => assert!(reason.is_unexpected()),
        other => panic!("expected Disconnected, got {other:?}"),
    }
    assert!(matches!(
        next_event(&mut events).await,
        ConnectionEvent::Connected { .. }
    ));

    // the same handle keeps working on the new socket
    handle
        .send(OutboundSignal::LeaveRoom(RoomId::new("R7")))
        .unwrap();
    gateway
        .wait_for_command(|c| matches!(c, OutboundSignal::LeaveRoom(_)))
        .await
        .unwrap();
}

#[tokio::test]
async fn test_unacked_heartbeat_is_a_zombie() {
    let gateway = TestGateway::start_with_heartbeat(ME, 100).await.unwrap();
    gateway.ack_heartbeats(false);
    let (_manager, _handle, mut events) = connect(&gateway).await;

    assert_eq!(
        next_event(&mut events).await,
        ConnectionEvent::Disconnected(DisconnectReason::HeartbeatTimeout)
    );
}

#[tokio::test]
async fn test_acked_heartbeats_keep_connection() {
    let gateway = TestGateway::start_with_heartbeat(ME, 100).await.unwrap();
    let (_manager, handle, mut events) = connect(&gateway).await;

    tokio::time::sleep(Duration::from_millis(450)).await;
    assert!(handle.is_connected());
    assert!(events.try_recv().is_err());
    assert_eq!(gateway.identified(), 1);
}

// ============================================================================
// Close Codes
// ============================================================================

#[tokio::test]
async fn test_non_retryable_close_terminates() {
    let gateway = TestGateway::start(ME).await.unwrap();
    let (manager, handle, mut events) = connect(&gateway).await;

    gateway.kick(Kick::Close(4007));

    match next_event(&mut events).await {
        ConnectionEvent::Disconnected(DisconnectReason::Closed { code, .. }) => {
            assert_eq!(code, Some(4007));
        }
        other => panic!("expected Closed, got {other:?}"),
    }
    eventually(|| manager.state() == ConnectionState::Error)
        .await
        .unwrap();
    assert!(matches!(
        handle.send(OutboundSignal::JoinRoom(RoomId::new("R1"))),
        Err(AppError::NotConnected)
    ));
    tokio::time::sleep(Duration::from_millis(100)).await;
    assert_eq!(gateway.identified(), 1);
}

#[tokio::test]
async fn test_token_expiry_is_auth_error() {
    let gateway = TestGateway::start(ME).await.unwrap();
    let (manager, _handle, mut events) = connect(&gateway).await;

    gateway.kick(Kick::Close(4011));

    assert!(matches!(
        next_event(&mut events).await,
        ConnectionEvent::AuthError { .. }
    ));
    assert_eq!(manager.state(), ConnectionState::Error);
}

#[tokio::test]
async fn test_invalid_session_is_auth_error() {
    let gateway = TestGateway::start(ME).await.unwrap();
    let (_manager, _handle, mut events) = connect(&gateway).await;

    gateway.kick(Kick::Invalidate);

    assert!(matches!(
        next_event(&mut events).await,
        ConnectionEvent::AuthError { .. }
    ));
}

#[tokio::test]
async fn test_rejected_reconnect_is_auth_error() {
    let gateway = TestGateway::start(ME).await.unwrap();
    let (manager, _handle, mut events) = connect(&gateway).await;

    gateway.reject_all(true);
    gateway.kick(Kick::Drop);

    assert!(matches!(
        next_event(&mut events).await,
        ConnectionEvent::Disconnected(_)
    ));
    assert!(matches!(
        next_event(&mut events).await,
        ConnectionEvent::AuthError { .. }
    ));
    assert_eq!(manager.state(), ConnectionState::Error);
}

// ============================================================================
// Client Close
// ============================================================================

#[tokio::test]
async fn test_disconnect_stops_the_connection() {
    let gateway = TestGateway::start(ME).await.unwrap();
    let (manager, handle, _events) = connect(&gateway).await;

    handle.disconnect().await;

    eventually(|| manager.state() == ConnectionState::Disconnected)
        .await
        .unwrap();
    eventually(|| gateway.live_connections() == 0).await.unwrap();
    assert!(matches!(
        handle.send(OutboundSignal::LeaveRoom(RoomId::new("R1"))),
        Err(AppError::NotConnected)
    ));

    tokio::time::sleep(Duration::from_millis(100)).await;
    assert_eq!(gateway.identified(), 1);
}
