use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use callbridge_auth::AdminTokenSource;
use callbridge_conversations::ConversationClient;
use callbridge_events::{
    ConversationHandlers, DispatchOutcome, EventDispatcher, EventSchemaError, HandlerError,
    RtcEvent, RtcEventHandler, RtcEventKind,
};
use httpmock::prelude::*;
use httpmock::Method::PATCH;
use serde_json::{json, Value};

const FIXTURES: &[(&str, &str)] = &[
    ("member:media", include_str!("fixtures/member_media.json")),
    ("member:invited", include_str!("fixtures/member_invited.json")),
    ("member:joined", include_str!("fixtures/member_joined.json")),
    ("member:left", include_str!("fixtures/member_left.json")),
    ("member:message:status", include_str!("fixtures/member_message_status.json")),
    ("rtc:hangup", include_str!("fixtures/rtc_hangup.json")),
    ("message", include_str!("fixtures/message.json")),
    ("conversation:created", include_str!("fixtures/conversation_created.json")),
    ("conversation:deleted", include_str!("fixtures/conversation_deleted.json")),
    ("app:knocking", include_str!("fixtures/app_knocking.json")),
    ("audio:say", include_str!("fixtures/audio_say.json")),
    ("audio:say:done", include_str!("fixtures/audio_say_done.json")),
    ("audio:say:stop", include_str!("fixtures/audio_say_stop.json")),
    ("audio:play", include_str!("fixtures/audio_play.json")),
    ("audio:play:done", include_str!("fixtures/audio_play_done.json")),
    ("audio:play:stop", include_str!("fixtures/audio_play_stop.json")),
    ("audio:record", include_str!("fixtures/audio_record.json")),
    ("audio:record:done", include_str!("fixtures/audio_record_done.json")),
    ("audio:record:stop", include_str!("fixtures/audio_record_stop.json")),
    ("audio:transcribe:done", include_str!("fixtures/audio_transcribe_done.json")),
    ("audio:asr:done", include_str!("fixtures/audio_asr_done.json")),
    ("audio:asr:record:done", include_str!("fixtures/audio_asr_record_done.json")),
];

#[derive(Default)]
struct RecordingHandler {
    calls: Mutex<Vec<RtcEventKind>>,
    fail: bool,
}

impl RecordingHandler {
    fn calls(&self) -> Vec<RtcEventKind> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl RtcEventHandler for RecordingHandler {
    async fn handle(&self, event: &RtcEvent) -> Result<(), HandlerError> {
        self.calls.lock().unwrap().push(event.kind());
        if self.fail {
            return Err(HandlerError::Missing("anything"));
        }
        Ok(())
    }
}

fn fixture(raw: &str) -> Value {
    serde_json::from_str(raw).expect("fixture should be valid JSON")
}

#[test]
fn fixtures_cover_every_recognised_type() {
    assert_eq!(FIXTURES.len(), RtcEventKind::ALL.len());
    for kind in RtcEventKind::ALL {
        assert!(
            FIXTURES.iter().any(|(name, _)| *name == kind.as_str()),
            "missing fixture for {kind}"
        );
    }
}

#[tokio::test]
async fn each_fixture_is_dispatched_exactly_once() {
    for (name, raw) in FIXTURES {
        let handler = Arc::new(RecordingHandler::default());
        let dispatcher = EventDispatcher::new(handler.clone());

        let outcome = dispatcher
            .dispatch(fixture(raw))
            .await
            .unwrap_or_else(|err| panic!("{name} fixture failed validation: {err}"));

        let expected: RtcEventKind = name.parse().unwrap();
        assert_eq!(outcome, DispatchOutcome::Handled(expected));
        assert_eq!(handler.calls(), vec![expected], "handler calls for {name}");
    }
}

#[tokio::test]
async fn unknown_types_invoke_no_handler() {
    let handler = Arc::new(RecordingHandler::default());
    let dispatcher = EventDispatcher::new(handler.clone());

    let outcome = dispatcher
        .dispatch(json!({
            "type": "leg:status:update",
            "timestamp": "2024-03-11T10:15:30.123Z",
            "body": {"status": "ringing"}
        }))
        .await
        .unwrap();

    assert_eq!(outcome, DispatchOutcome::Ignored("leg:status:update".into()));
    assert!(handler.calls().is_empty());
}

#[tokio::test]
async fn schema_failures_reach_no_handler() {
    let handler = Arc::new(RecordingHandler::default());
    let dispatcher = EventDispatcher::new(handler.clone());

    let err = dispatcher
        .dispatch(json!({"type": "rtc:hangup", "body": {"direction": "sideways"}}))
        .await
        .unwrap_err();

    assert!(matches!(err, EventSchemaError::Body { .. }));
    assert_eq!(err.event_type(), Some("rtc:hangup"));
    assert!(handler.calls().is_empty());
}

#[tokio::test]
async fn handler_errors_do_not_fail_dispatch() {
    let handler = Arc::new(RecordingHandler {
        fail: true,
        ..RecordingHandler::default()
    });
    let dispatcher = EventDispatcher::new(handler.clone());

    let outcome = dispatcher
        .dispatch(fixture(include_str!("fixtures/message.json")))
        .await
        .unwrap();
    assert_eq!(outcome, DispatchOutcome::Handled(RtcEventKind::Message));
    assert_eq!(handler.calls().len(), 1);
}

fn production_dispatcher(server: &MockServer) -> EventDispatcher {
    let client = ConversationClient::new(
        server.base_url(),
        AdminTokenSource::Static("admin".into()),
        Duration::from_secs(5),
    )
    .unwrap();
    EventDispatcher::new(Arc::new(ConversationHandlers::new(client, "bot:vonage")))
}

#[tokio::test]
async fn user_hangup_rejoins_member() {
    let server = MockServer::start_async().await;
    let rejoin = server
        .mock_async(|when, then| {
            when.method(POST)
                .path("/conversations/C1/members")
                .json_body(json!({"user": {"id": "U1"}, "channel": {"type": "app"}, "state": "joined"}));
            then.status(201).json_body(json!({"id": "MEM-1", "state": "JOINED"}));
        })
        .await;

    let outcome = production_dispatcher(&server)
        .dispatch(json!({
            "type": "member:left",
            "cid": "C1",
            "body": {"user": {"id": "U1"}, "reason": {"text": "app:user:hangup"}}
        }))
        .await
        .unwrap();

    assert_eq!(outcome, DispatchOutcome::Handled(RtcEventKind::MemberLeft));
    rejoin.assert_async().await;
}

#[tokio::test]
async fn other_leave_reasons_do_not_rejoin() {
    let server = MockServer::start_async().await;
    let rejoin = server
        .mock_async(|when, then| {
            when.method(POST).path("/conversations/C1/members");
            then.status(201).json_body(json!({"id": "MEM-1"}));
        })
        .await;

    production_dispatcher(&server)
        .dispatch(json!({
            "type": "member:left",
            "conversation_id": "C1",
            "body": {"user": {"id": "U1"}, "reason": {"text": "timeout"}}
        }))
        .await
        .unwrap();

    rejoin.assert_hits_async(0).await;
}

#[tokio::test]
async fn agent_joining_messaging_channel_gets_bot_announcement() {
    let server = MockServer::start_async().await;
    server
        .mock_async(|when, then| {
            when.method(GET).path("/conversations/CON-9");
            then.status(200).json_body(json!({"id": "CON-9", "name": "whatsapp:447700900000"}));
        })
        .await;
    server
        .mock_async(|when, then| {
            when.method(GET).path("/conversations/CON-9/members");
            then.status(200).json_body(json!({"_embedded": {"members": [
                {"id": "MEM-BOT", "state": "JOINED", "_embedded": {"user": {"id": "USR-BOT", "name": "bot:vonage"}}}
            ]}}));
        })
        .await;
    let announcement = server
        .mock_async(|when, then| {
            when.method(POST).path("/conversations/CON-9/events").json_body(json!({
                "type": "message",
                "from": "MEM-BOT",
                "body": {"message_type": "text", "text": "Agent 'Jane Doe' has joined the conversation"}
            }));
            then.status(201).json_body(json!({"id": 7}));
        })
        .await;

    production_dispatcher(&server)
        .dispatch(json!({
            "type": "member:joined",
            "cid": "CON-9",
            "body": {"user": {"id": "USR-1", "name": "jane.doe", "display_name": "Jane Doe"}}
        }))
        .await
        .unwrap();

    announcement.assert_async().await;
}

#[tokio::test]
async fn customer_joining_is_not_announced() {
    let server = MockServer::start_async().await;
    server
        .mock_async(|when, then| {
            when.method(GET).path("/conversations/CON-9");
            then.status(200).json_body(json!({"id": "CON-9", "name": "sms:447700900000"}));
        })
        .await;
    let events = server
        .mock_async(|when, then| {
            when.method(POST).path("/conversations/CON-9/events");
            then.status(201);
        })
        .await;

    production_dispatcher(&server)
        .dispatch(json!({
            "type": "member:joined",
            "cid": "CON-9",
            "body": {"user": {"id": "USR-2", "name": "sms:customer:447700900000"}}
        }))
        .await
        .unwrap();

    events.assert_hits_async(0).await;
}

#[tokio::test]
async fn knocking_phone_user_gets_display_name() {
    let server = MockServer::start_async().await;
    let patch = server
        .mock_async(|when, then| {
            when.method(PATCH)
                .path("/users/USR-1a2b3c4d")
                .json_body(json!({"display_name": "447700900000 (phone)"}));
            then.status(200).json_body(json!({"id": "USR-1a2b3c4d"}));
        })
        .await;

    production_dispatcher(&server)
        .dispatch(fixture(include_str!("fixtures/app_knocking.json")))
        .await
        .unwrap();

    patch.assert_async().await;
}

#[tokio::test]
async fn tts_command_posts_audio_say_from_sender() {
    let server = MockServer::start_async().await;
    let say = server
        .mock_async(|when, then| {
            when.method(POST)
                .path("/conversations/CON-1/events")
                .json_body(json!({
                    "type": "audio:say",
                    "from": "MEM-7",
                    "body": {"text": "good morning", "voice_name": "Amy", "level": 1, "queue": true, "loop": 1, "ssml": false}
                }));
            then.status(201).json_body(json!({"id": 8}));
        })
        .await;

    production_dispatcher(&server)
        .dispatch(json!({
            "type": "message",
            "cid": "CON-1",
            "body": {"message_type": "text", "text": "@tts good morning"},
            "_embedded": {"from_member": {"id": "MEM-7"}}
        }))
        .await
        .unwrap();

    say.assert_async().await;
}

#[tokio::test]
async fn asr_stop_command_deletes_leg_asr() {
    let server = MockServer::start_async().await;
    let stop = server
        .mock_async(|when, then| {
            when.method(DELETE).path("/legs/LEG-3/asr");
            then.status(204);
        })
        .await;

    production_dispatcher(&server)
        .dispatch(json!({
            "type": "message",
            "body": {"message_type": "text", "text": "@asr-stop LEG-3"}
        }))
        .await
        .unwrap();

    stop.assert_async().await;
}
