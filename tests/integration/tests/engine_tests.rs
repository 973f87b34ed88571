//! Engine Integration Tests
//!
//! Runs a full session against the in-process gateway and the in-memory
//! chat API. No external services are needed.
//!
//! Run with: cargo test -p integration-tests --test engine_tests

use std::sync::Arc;
use std::time::Duration;

use chat_common::AppError;
use chat_core::{
    CreateRoomRequest, DomainError, MessageId, ReactionAction, RoomId, SendMessageRequest, UserId,
};
use chat_sync::connection::ConnectionState;
use chat_sync::events::OutboundSignal;
use chat_sync::state::ActivationOutcome;
use chat_sync::{ChatSession, Identity};
use integration_tests::*;

async fn start_session(api: &Arc<FakeChatApi>, gateway: &TestGateway, rehydrate_after_secs: u64) -> ChatSession {
    let config = test_config(&gateway.url(), rehydrate_after_secs);
    ChatSession::start(Identity::new(ME, VALID_TOKEN), &config, api.clone())
        .await
        .expect("Failed to start session")
}

/// Gateway, API with [`three_rooms`] and three messages of history each, and a session
async fn setup(rehydrate_after_secs: u64) -> (TestGateway, Arc<FakeChatApi>, ChatSession) {
    let gateway = TestGateway::start(ME).await.expect("Failed to start gateway");
    let api = Arc::new(FakeChatApi::with_rooms(ME, three_rooms()));
    api.set_history("A", history("A", "alice", 3));
    api.set_history("B", history("B", "bob", 3));
    api.set_history("C", history("C", "carol", 3));

    let session = start_session(&api, &gateway, rehydrate_after_secs).await;
    session
        .client()
        .wait_for(|s| s.rooms.len() == 3)
        .await
        .expect("Room list never loaded");
    (gateway, api, session)
}

fn is_join(room: &str) -> impl Fn(&OutboundSignal) -> bool + '_ {
    move |signal| matches!(signal, OutboundSignal::JoinRoom(id) if id.as_str() == room)
}

// ============================================================================
// Room List
// ============================================================================

#[tokio::test]
async fn test_session_loads_room_list() {
    let (_gateway, api, session) = setup(60).await;
    let snapshot = session.client().snapshot();

    let ids: Vec<&str> = snapshot.rooms.iter().map(|r| r.id.as_str()).collect();
    assert_eq!(ids, ["A", "B", "C"]);
    assert_eq!(snapshot.connection, ConnectionState::Connected);
    assert!(snapshot.active_room.is_none());
    assert_eq!(api.list_calls(), 1);
    assert_eq!(session.connection_state(), ConnectionState::Connected);
}

#[tokio::test]
async fn test_background_message_updates_room_list() {
    let (gateway, _api, session) = setup(60).await;
    let client = session.client();
    client.activate_room("A").await.unwrap();

    gateway.push(new_message(text_message("c-new", "C", "carol", 30)));

    let snapshot = client
        .wait_for(|s| s.rooms.first().is_some_and(|r| r.id.as_str() == "C"))
        .await
        .unwrap();
    let c = snapshot.room(&RoomId::new("C")).unwrap();
    assert_eq!(c.unread_count, 1);
    assert_eq!(c.last_message.as_ref().unwrap().id.as_str(), "c-new");
    assert_eq!(snapshot.total_unread, 1);
    // the active room's messages are untouched
    assert_eq!(snapshot.message_ids(), ["A-1", "A-2", "A-3"]);
}

#[tokio::test]
async fn test_message_for_unknown_room_refreshes_list() {
    let (gateway, api, session) = setup(60).await;
    let client = session.client();

    let mut rooms = three_rooms();
    rooms.push(direct_room("D", "dave", 0));
    api.set_rooms(rooms);
    gateway.push(new_message(text_message("d-1", "D", "dave", 40)));

    client.wait_for(|s| s.rooms.len() == 4).await.unwrap();
    assert_eq!(api.list_calls(), 2);
}

#[tokio::test]
async fn test_refresh_rooms_failure_is_reported() {
    let (_gateway, api, session) = setup(60).await;
    api.fail_rooms(true);

    let err = session.client().refresh_rooms().await.unwrap_err();
    assert!(matches!(err, AppError::Network(_)));
    // cached list survives
    assert_eq!(session.client().snapshot().rooms.len(), 3);

    api.fail_rooms(false);
    session.client().refresh_rooms().await.unwrap();
}

// ============================================================================
// Room Activation
// ============================================================================

#[tokio::test]
async fn test_activate_room_hydrates_and_joins() {
    let (gateway, api, session) = setup(60).await;
    let client = session.client();

    let outcome = client.activate_room("A").await.unwrap();
    assert_eq!(outcome, ActivationOutcome::Activated(RoomId::new("A")));

    let snapshot = client.snapshot();
    assert_eq!(snapshot.active_room, Some(RoomId::new("A")));
    assert!(snapshot.activating.is_none());
    assert_eq!(snapshot.message_ids(), ["A-1", "A-2", "A-3"]);

    gateway.wait_for_command(is_join("A")).await.unwrap();
    eventually(|| api.marked_read().contains(&RoomId::new("A")))
        .await
        .unwrap();
}

#[tokio::test]
async fn test_switching_rooms_leaves_previous() {
    let (gateway, _api, session) = setup(60).await;
    let client = session.client();

    client.activate_room("A").await.unwrap();
    client.activate_room("B").await.unwrap();
    gateway.wait_for_command(is_join("B")).await.unwrap();

    assert_eq!(
        gateway.commands(),
        vec![
            OutboundSignal::JoinRoom(RoomId::new("A")),
            OutboundSignal::LeaveRoom(RoomId::new("A")),
            OutboundSignal::JoinRoom(RoomId::new("B")),
        ]
    );
    assert_eq!(client.snapshot().message_ids(), ["B-1", "B-2", "B-3"]);
}

#[tokio::test]
async fn test_stale_history_response_is_dropped() {
    let (_gateway, api, session) = setup(60).await;
    let client = session.client();
    let gate = api.hold_history("B");

    let slow = {
        let client = client.clone();
        tokio::spawn(async move { client.activate_room("B").await })
    };
    eventually(|| api.history_calls().contains(&RoomId::new("B")))
        .await
        .unwrap();

    let outcome = client.activate_room("C").await.unwrap();
    assert_eq!(outcome, ActivationOutcome::Activated(RoomId::new("C")));
    assert_eq!(slow.await.unwrap().unwrap(), ActivationOutcome::Superseded);

    // B's page arrives after C committed
    gate.release();
    tokio::time::sleep(Duration::from_millis(100)).await;

    let snapshot = client.snapshot();
    assert_eq!(snapshot.active_room, Some(RoomId::new("C")));
    assert_eq!(snapshot.message_ids(), ["C-1", "C-2", "C-3"]);
}

#[tokio::test]
async fn test_failed_activation_keeps_previous_room() {
    let (gateway, api, session) = setup(60).await;
    let client = session.client();
    client.activate_room("A").await.unwrap();
    api.fail_history("B");

    let err = client.activate_room("B").await.unwrap_err();
    assert!(matches!(err, AppError::Network(_)));

    let snapshot = client.snapshot();
    assert_eq!(snapshot.active_room, Some(RoomId::new("A")));
    assert_eq!(snapshot.message_ids(), ["A-1", "A-2", "A-3"]);

    // left A for B, then subscribed to A again
    gateway
        .wait_for_command(|c| c == &OutboundSignal::LeaveRoom(RoomId::new("A")))
        .await
        .unwrap();
    eventually(|| {
        gateway
            .commands()
            .iter()
            .filter(|c| **c == OutboundSignal::JoinRoom(RoomId::new("A")))
            .count()
            == 2
    })
    .await
    .unwrap();
}

#[tokio::test]
async fn test_activate_unknown_room() {
    let (_gateway, _api, session) = setup(60).await;
    let err = session.client().activate_room("nope").await.unwrap_err();
    assert!(matches!(
        err,
        AppError::Domain(DomainError::RoomNotFound(ref id)) if id.as_str() == "nope"
    ));
}

// ============================================================================
// Messages
// ============================================================================

#[tokio::test]
async fn test_send_has_no_local_echo() {
    let (gateway, _api, session) = setup(60).await;
    let client = session.client();
    client.activate_room("A").await.unwrap();

    client.send_text("hello").await.unwrap();
    let sent = gateway
        .wait_for_command(|c| matches!(c, OutboundSignal::SendMessage(_)))
        .await
        .unwrap();
    let OutboundSignal::SendMessage(command) = sent else {
        unreachable!()
    };
    assert_eq!(command.room_id, RoomId::new("A"));
    assert_eq!(command.message.content, "hello");
    assert_eq!(client.snapshot().messages.len(), 3);

    // the server broadcast is the only way in
    gateway.push(new_message(text_message("A-4", "A", ME, 10)));
    let snapshot = client.wait_for(|s| s.messages.len() == 4).await.unwrap();
    assert_eq!(snapshot.room(&RoomId::new("A")).unwrap().unread_count, 0);

    // redelivery is ignored
    gateway.push(new_message(text_message("A-4", "A", ME, 10)));
    gateway.push(new_message(text_message("A-5", "A", "alice", 11)));
    let snapshot = client.wait_for(|s| s.messages.len() >= 5).await.unwrap();
    assert_eq!(
        snapshot.message_ids(),
        ["A-1", "A-2", "A-3", "A-4", "A-5"]
    );
}

#[tokio::test]
async fn test_send_validation() {
    let (_gateway, _api, session) = setup(60).await;
    let client = session.client();

    let err = client.send_text("hello").await.unwrap_err();
    assert!(matches!(err, AppError::Domain(DomainError::NoActiveRoom)));

    client.activate_room("A").await.unwrap();
    let err = client.send_text("   ").await.unwrap_err();
    assert!(err.is_validation());

    let err = client
        .send_message(SendMessageRequest::artwork("", "caption"))
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::Domain(DomainError::MissingArtwork)));

    client.share_artwork("art-7", "look").await.unwrap();
}

// ============================================================================
// Reactions
// ============================================================================

#[tokio::test]
async fn test_reactions_are_idempotent() {
    let (gateway, _api, session) = setup(60).await;
    let client = session.client();
    client.activate_room("A").await.unwrap();
    let a1 = MessageId::new("A-1");

    gateway.push(reaction("A-1", "alice", "👍", ReactionAction::Added));
    gateway.push(reaction("A-1", "alice", "👍", ReactionAction::Added));
    gateway.push(reaction("A-1", "bob", "🔥", ReactionAction::Added));

    let snapshot = client
        .wait_for(|s| {
            s.message(&MessageId::new("A-1"))
                .is_some_and(|m| m.message.reactions.count("🔥") == 1)
        })
        .await
        .unwrap();
    let reactions = &snapshot.message(&a1).unwrap().message.reactions;
    assert_eq!(reactions.count("👍"), 1);
    assert!(reactions.has_reacted(&UserId::new("alice"), "👍"));

    gateway.push(reaction("A-1", "alice", "👍", ReactionAction::Removed));
    gateway.push(reaction("A-1", "alice", "👍", ReactionAction::Removed));
    let snapshot = client
        .wait_for(|s| {
            s.message(&MessageId::new("A-1"))
                .is_some_and(|m| m.message.reactions.get("👍").is_none())
        })
        .await
        .unwrap();
    assert_eq!(snapshot.message(&a1).unwrap().message.reactions.len(), 1);
}

#[tokio::test]
async fn test_react_sends_toggle() {
    let (gateway, _api, session) = setup(60).await;
    let client = session.client();
    client.activate_room("A").await.unwrap();

    client.react("A-2", "🔥").await.unwrap();
    let sent = gateway
        .wait_for_command(|c| matches!(c, OutboundSignal::AddReaction(_)))
        .await
        .unwrap();
    assert!(matches!(
        sent,
        OutboundSignal::AddReaction(cmd) if cmd.message_id.as_str() == "A-2" && cmd.emoji == "🔥"
    ));

    let err = client.react("B-1", "🔥").await.unwrap_err();
    assert!(matches!(err, AppError::Domain(DomainError::MessageNotFound(_))));
}

// ============================================================================
// Presence and Typing
// ============================================================================

#[tokio::test]
async fn test_presence_and_typing() {
    let (gateway, _api, session) = setup(60).await;
    let client = session.client();
    client.activate_room("A").await.unwrap();

    gateway.push(online("bob"));
    gateway.push(typing("A", "alice", true));

    let snapshot = client
        .wait_for(|s| !s.typing.is_empty())
        .await
        .unwrap();
    assert_eq!(snapshot.typing, vec![UserId::new("alice")]);
    let bob = snapshot
        .room(&RoomId::new("B"))
        .and_then(|r| r.counterpart(&UserId::new(ME)))
        .unwrap();
    assert!(bob.is_online());

    client.set_typing(true).await.unwrap();
    gateway
        .wait_for_command(|c| matches!(c, OutboundSignal::Typing(t) if t.is_typing))
        .await
        .unwrap();

    // a message from the typist clears the indicator
    gateway.push(new_message(text_message("A-4", "A", "alice", 10)));
    client.wait_for(|s| s.typing.is_empty()).await.unwrap();
}

// ============================================================================
// Reconnect
// ============================================================================

#[tokio::test]
async fn test_reconnect_rejoins_active_room() {
    let (gateway, api, session) = setup(60).await;
    let client = session.client();
    client.activate_room("A").await.unwrap();
    gateway.wait_for_command(is_join("A")).await.unwrap();
    gateway.clear_commands();

    gateway.kick(Kick::Drop);

    gateway.wait_for_command(is_join("A")).await.unwrap();
    assert_eq!(gateway.identified(), 2);
    // short gap: no re-hydration
    assert_eq!(api.history_calls(), vec![RoomId::new("A")]);
    assert_eq!(client.snapshot().message_ids(), ["A-1", "A-2", "A-3"]);
}

#[tokio::test]
async fn test_reconnect_after_gap_rehydrates() {
    let (gateway, api, session) = setup(0).await;
    let client = session.client();
    client.activate_room("A").await.unwrap();

    // messages that arrived while offline
    api.set_history("A", history("A", "alice", 5));
    gateway.kick(Kick::Drop);

    let snapshot = client.wait_for(|s| s.messages.len() == 5).await.unwrap();
    assert_eq!(snapshot.active_room, Some(RoomId::new("A")));
    eventually(|| api.list_calls() >= 2).await.unwrap();
}

#[tokio::test]
async fn test_auth_rejected_on_reconnect() {
    let (gateway, _api, session) = setup(60).await;
    let client = session.client();
    client.activate_room("A").await.unwrap();

    gateway.reject_all(true);
    gateway.kick(Kick::Drop);

    let snapshot = client
        .wait_for(|s| s.auth_error.is_some())
        .await
        .unwrap();
    assert_eq!(snapshot.connection, ConnectionState::Error);
    // cached state stays readable
    assert_eq!(snapshot.message_ids(), ["A-1", "A-2", "A-3"]);

    let err = client.send_text("anyone?").await.unwrap_err();
    assert!(matches!(err, AppError::NotConnected));
}

// ============================================================================
// Room Creation and Users
// ============================================================================

#[tokio::test]
async fn test_create_room_activates_it() {
    let (gateway, api, session) = setup(60).await;
    let client = session.client();

    let room = client
        .create_room(CreateRoomRequest::direct("dave"))
        .await
        .unwrap();
    let snapshot = client
        .wait_for(|s| s.active_room.as_ref() == Some(&room.id))
        .await
        .unwrap();
    assert_eq!(snapshot.rooms[0].id, room.id);
    assert_eq!(snapshot.rooms.len(), 4);
    gateway.wait_for_command(is_join(room.id.as_str())).await.unwrap();
    assert_eq!(api.created().len(), 1);
}

#[tokio::test]
async fn test_create_existing_direct_room_is_deduped() {
    let (_gateway, _api, session) = setup(60).await;
    let client = session.client();

    let room = client
        .create_room(CreateRoomRequest::direct("bob"))
        .await
        .unwrap();
    assert_eq!(room.id.as_str(), "B");

    let snapshot = client
        .wait_for(|s| s.active_room == Some(RoomId::new("B")))
        .await
        .unwrap();
    assert_eq!(snapshot.rooms.len(), 3);
    assert_eq!(snapshot.rooms[0].id.as_str(), "B");
}

#[tokio::test]
async fn test_create_room_validation() {
    let (_gateway, api, session) = setup(60).await;
    let client = session.client();

    let err = client
        .create_room(CreateRoomRequest::direct(ME))
        .await
        .unwrap_err();
    assert!(err.is_validation());
    let err = client
        .create_room(CreateRoomRequest::direct(""))
        .await
        .unwrap_err();
    assert!(err.is_validation());
    assert!(api.created().is_empty());
}

#[tokio::test]
async fn test_user_search() {
    let (_gateway, api, session) = setup(60).await;
    api.set_users(vec![user("alice"), user("bob"), user("dave"), user("erin")]);
    let client = session.client();

    let found = client.search_users("  alice ").await.unwrap();
    assert_eq!(found.len(), 1);
    assert_eq!(found[0].id.as_str(), "alice");

    let err = client.search_users("   ").await.unwrap_err();
    assert!(matches!(err, AppError::Domain(DomainError::InvalidQuery)));

    assert_eq!(client.recommended_users().await.unwrap().len(), 3);
}

// ============================================================================
// Shutdown
// ============================================================================

#[tokio::test]
async fn test_shutdown_settles_pending_activation() {
    let (gateway, api, session) = setup(60).await;
    let client = session.client();
    let _gate = api.hold_history("B");

    let pending = {
        let client = client.clone();
        tokio::spawn(async move { client.activate_room("B").await })
    };
    eventually(|| api.history_calls().contains(&RoomId::new("B")))
        .await
        .unwrap();

    session.shutdown().await;

    assert_eq!(pending.await.unwrap().unwrap(), ActivationOutcome::Superseded);
    assert!(client.snapshot().rooms.is_empty());
    eventually(|| gateway.live_connections() == 0).await.unwrap();
    assert!(client.activate_room("A").await.is_err());
}
