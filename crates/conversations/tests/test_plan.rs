use std::time::Duration;

use callbridge_auth::AdminTokenSource;
use callbridge_conversations::{
    AsrRequest, ConversationClient, ConversationError, JoinMemberRequest, NewEvent, UserPatch,
};
use httpmock::prelude::*;
use httpmock::Method::PATCH;
use serde_json::json;

fn client_for(server: &MockServer) -> ConversationClient {
    ConversationClient::new(
        server.base_url(),
        AdminTokenSource::Static("admin-token".into()),
        Duration::from_secs(5),
    )
    .expect("client")
}

#[tokio::test]
async fn requests_carry_bearer_and_json_headers() {
    let server = MockServer::start_async().await;
    let mock = server
        .mock_async(|when, then| {
            when.method(GET)
                .path("/conversations/CON-1")
                .header("authorization", "Bearer admin-token")
                .header("accept", "application/json")
                .header("content-type", "application/json");
            then.status(200)
                .json_body(json!({"id": "CON-1", "name": "messenger:123", "state": "ACTIVE"}));
        })
        .await;

    let conversation = client_for(&server)
        .get_conversation("CON-1")
        .await
        .expect("conversation");
    mock.assert_async().await;
    assert_eq!(conversation.name, "messenger:123");
    assert_eq!(conversation.state.as_deref(), Some("ACTIVE"));
}

#[tokio::test]
async fn conversation_names_are_cached() {
    let server = MockServer::start_async().await;
    let mock = server
        .mock_async(|when, then| {
            when.method(GET).path("/conversations/CON-2");
            then.status(200).json_body(json!({"id": "CON-2", "name": "sms:447700900000"}));
        })
        .await;

    let client = client_for(&server);
    assert_eq!(client.conversation_name("CON-2").await.unwrap(), "sms:447700900000");
    assert_eq!(client.conversation_name("CON-2").await.unwrap(), "sms:447700900000");
    mock.assert_hits_async(1).await;
}

#[tokio::test]
async fn failures_surface_status_and_body() {
    let server = MockServer::start_async().await;
    server
        .mock_async(|when, then| {
            when.method(DELETE).path("/users/USR-9");
            then.status(404).body("not found");
        })
        .await;

    let err = client_for(&server).delete_user("USR-9").await.unwrap_err();
    match err {
        ConversationError::Status {
            method,
            path,
            status,
            body,
        } => {
            assert_eq!(method, "DELETE");
            assert_eq!(path, "/users/USR-9");
            assert_eq!(status, 404);
            assert_eq!(body, "not found");
        }
        other => panic!("unexpected error: {other:?}"),
    }
}

#[tokio::test]
async fn empty_success_bodies_are_accepted() {
    let server = MockServer::start_async().await;
    let mock = server
        .mock_async(|when, then| {
            when.method(DELETE).path("/legs/LEG-1/asr");
            then.status(204);
        })
        .await;

    client_for(&server).stop_asr("LEG-1").await.expect("stop asr");
    mock.assert_async().await;
}

#[tokio::test]
async fn existing_joined_member_is_reused() {
    let server = MockServer::start_async().await;
    server
        .mock_async(|when, then| {
            when.method(GET).path("/conversations/CON-3/members");
            then.status(200).json_body(json!({
                "_embedded": {"members": [
                    {"id": "MEM-LEFT", "state": "LEFT", "_embedded": {"user": {"id": "USR-B", "name": "bot:vonage"}}},
                    {"id": "MEM-BOT", "state": "JOINED", "_embedded": {"user": {"id": "USR-B", "name": "bot:vonage"}}}
                ]}
            }));
        })
        .await;
    let join = server
        .mock_async(|when, then| {
            when.method(POST).path("/conversations/CON-3/members");
            then.status(201).json_body(json!({"id": "MEM-NEW"}));
        })
        .await;

    let member = client_for(&server)
        .add_user_to_conversation("CON-3", "bot:vonage")
        .await
        .unwrap();
    assert_eq!(member, "MEM-BOT");
    join.assert_hits_async(0).await;
}

#[tokio::test]
async fn bot_message_joins_bot_then_posts_text() {
    let server = MockServer::start_async().await;
    server
        .mock_async(|when, then| {
            when.method(GET).path("/conversations/CON-4/members");
            then.status(200).json_body(json!({"_embedded": {"members": []}}));
        })
        .await;
    let join = server
        .mock_async(|when, then| {
            when.method(POST)
                .path("/conversations/CON-4/members")
                .json_body(json!({
                    "user": {"name": "bot:vonage"},
                    "channel": {"type": "app", "preanswer": false},
                    "state": "JOINED"
                }));
            then.status(201).json_body(json!({"id": "MEM-BOT"}));
        })
        .await;
    let message = server
        .mock_async(|when, then| {
            when.method(POST)
                .path("/conversations/CON-4/events")
                .json_body(json!({
                    "type": "message",
                    "from": "MEM-BOT",
                    "body": {"message_type": "text", "text": "hello"}
                }));
            then.status(201).json_body(json!({"id": 5}));
        })
        .await;

    client_for(&server)
        .send_bot_text_message("CON-4", "bot:vonage", "hello")
        .await
        .unwrap();
    join.assert_async().await;
    message.assert_async().await;
}

#[tokio::test]
async fn rejoin_posts_member_request() {
    let server = MockServer::start_async().await;
    let mock = server
        .mock_async(|when, then| {
            when.method(POST)
                .path("/conversations/C1/members")
                .json_body(json!({"user": {"id": "U1"}, "channel": {"type": "app"}, "state": "joined"}));
            then.status(201).json_body(json!({"id": "MEM-1", "state": "JOINED"}));
        })
        .await;

    let member = client_for(&server)
        .join_member("C1", &JoinMemberRequest::rejoin_app_user("U1"))
        .await
        .unwrap();
    mock.assert_async().await;
    assert!(member.is_joined());
}

#[tokio::test]
async fn events_listing_unwraps_embedded_collection() {
    let server = MockServer::start_async().await;
    server
        .mock_async(|when, then| {
            when.method(GET).path("/conversations/CON-5/events");
            then.status(200).json_body(json!({
                "_embedded": {"events": [
                    {"id": 1, "type": "member:joined", "from": "MEM-1", "body": {}},
                    {"id": 2, "type": "message", "from": "MEM-1", "body": {"message_type": "text", "text": "hi"}}
                ]}
            }));
        })
        .await;

    let events = client_for(&server).list_events("CON-5").await.unwrap();
    assert_eq!(events.len(), 2);
    assert_eq!(events[1].kind, "message");
    assert_eq!(events[1].body["text"], "hi");
}

#[tokio::test]
async fn user_patch_and_auxiliary_calls_use_expected_routes() {
    let server = MockServer::start_async().await;
    let patch = server
        .mock_async(|when, then| {
            when.method(PATCH)
                .path("/users/USR-1")
                .json_body(json!({"display_name": "+447700900000 (phone)"}));
            then.status(200).json_body(json!({"id": "USR-1"}));
        })
        .await;
    let asr = server
        .mock_async(|when, then| {
            when.method(POST).path("/legs/LEG-2/asr").json_body(json!({
                "language": "en-US",
                "speech_context": ["a", "b"],
                "conversation_id": "CON-6",
                "end_on_silence_timeout": 5,
                "active": true,
                "sensitivity": 90
            }));
            then.status(200).json_body(json!({}));
        })
        .await;
    let push = server
        .mock_async(|when, then| {
            when.method(POST)
                .path("/users/alice/notifications")
                .json_body(json!({"title": "Custom Push Notification", "body": "wake"}));
            then.status(202);
        })
        .await;
    let audio = server
        .mock_async(|when, then| {
            when.method(POST)
                .path("/conversations/CON-6/events")
                .json_body(json!({"type": "audio:record", "from": "MEM-2"}));
            then.status(200).json_body(json!({"id": 9}));
        })
        .await;

    let client = client_for(&server);
    client
        .update_user(
            "USR-1",
            &UserPatch {
                display_name: Some("+447700900000 (phone)".into()),
                ..UserPatch::default()
            },
        )
        .await
        .unwrap();
    client
        .start_asr("LEG-2", &AsrRequest::for_conversation("CON-6"))
        .await
        .unwrap();
    client
        .send_push_notification("alice", "Custom Push Notification", "wake")
        .await
        .unwrap();
    client
        .create_event(
            "CON-6",
            &NewEvent::new("audio:record").from_member(Some("MEM-2".into())),
        )
        .await
        .unwrap();

    patch.assert_async().await;
    asr.assert_async().await;
    push.assert_async().await;
    audio.assert_async().await;
}
