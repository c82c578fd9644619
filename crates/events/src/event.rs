//! Typed RTC events.
//!
//! Every webhook payload shares the [`Event`] envelope. The `body` is typed
//! per recognised event type; unknown fields anywhere are preserved or
//! ignored, never rejected.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, FixedOffset};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::error::EventSchemaError;
use crate::schemas::{
    AsrRecording, AsrResult, Channel, ConversationRef, Embedded, Media, Reason, Timestamps,
    Transcription, UserRef,
};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Event<B> {
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<DateTime<FixedOffset>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub application_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub conversation_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cid: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub from: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub params: Option<Map<String, Value>>,
    pub body: B,
    #[serde(rename = "_embedded", default, skip_serializing_if = "Option::is_none")]
    pub embedded: Option<Embedded>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl<B> Event<B> {
    /// `cid` wins over `conversation_id` when both are present.
    pub fn conversation(&self) -> Option<&str> {
        self.cid
            .as_deref()
            .or(self.conversation_id.as_deref())
            .filter(|cid| !cid.is_empty())
    }

    pub fn from_member_id(&self) -> Option<&str> {
        self.embedded
            .as_ref()?
            .from_member
            .as_ref()
            .map(|member| member.id.as_str())
    }
}

pub type GenericBody = Map<String, Value>;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MemberMediaBody {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub audio: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub media: Option<Media>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub channel: Option<Channel>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MemberInvitedBody {
    pub user: UserRef,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cname: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub member_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub channel: Option<Channel>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub conversation: Option<ConversationRef>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub media: Option<Media>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<Timestamps>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Body of `member:joined` and `member:left`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MemberBody {
    pub user: UserRef,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cname: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub member_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub channel: Option<Channel>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub conversation: Option<ConversationRef>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub media: Option<Media>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<Timestamps>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reason: Option<Reason>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LegDirection {
    Inbound,
    Outbound,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Bandwidth {
    pub bytes_in: u64,
    pub bytes_out: u64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HangupDetails {
    pub code: String,
    pub text: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sip_code: Option<u16>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RtcHangupBody {
    pub direction: LegDirection,
    pub reason: HangupDetails,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub channel: Option<Channel>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bandwidth: Option<Bandwidth>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub quality: Option<Map<String, Value>>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MessageType {
    Text,
    Image,
    Video,
    Audio,
    File,
    Vcard,
    Location,
    Template,
    Custom,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MessageBody {
    pub message_type: MessageType,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConversationCreatedBody {
    pub id: String,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<Timestamps>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub state: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub display_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image_url: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct KnockingUser {
    pub id: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AppKnockingBody {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user: Option<KnockingUser>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub channel: Option<Channel>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AudioSayBody {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub say_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub voice_name: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SayRef {
    pub say_id: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AudioPlayBody {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub play_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stream_url: Option<Value>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlayRef {
    pub play_id: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AudioRecordBody {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub record_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub transcription: Option<Transcription>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecordRef {
    pub record_id: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AudioRecordDoneBody {
    pub destination_url: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub recording_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub format: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub start_time: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub end_time: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub size: Option<u64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AudioTranscribeDoneBody {
    pub transcription_url: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub recording_id: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AudioAsrDoneBody {
    pub asr: AsrResult,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AudioAsrRecordDoneBody {
    pub asr: AsrRecording,
}

macro_rules! rtc_events {
    ($($variant:ident => $name:literal : $body:ty),+ $(,)?) => {
        /// Event types the webhook understands.
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
        pub enum RtcEventKind {
            $($variant),+
        }

        impl RtcEventKind {
            pub const ALL: &'static [RtcEventKind] = &[$(RtcEventKind::$variant),+];

            pub const fn as_str(self) -> &'static str {
                match self {
                    $(RtcEventKind::$variant => $name),+
                }
            }
        }

        impl FromStr for RtcEventKind {
            type Err = ();

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                match s {
                    $($name => Ok(RtcEventKind::$variant),)+
                    _ => Err(()),
                }
            }
        }

        #[derive(Debug, Clone, PartialEq)]
        pub enum RtcEvent {
            $($variant(Event<$body>)),+
        }

        impl RtcEvent {
            pub fn kind(&self) -> RtcEventKind {
                match self {
                    $(RtcEvent::$variant(_) => RtcEventKind::$variant),+
                }
            }

            /// Parses `payload` against the schema of `kind`.
            pub fn parse(kind: RtcEventKind, payload: Value) -> Result<Self, EventSchemaError> {
                match kind {
                    $(RtcEventKind::$variant => typed(kind, payload).map(RtcEvent::$variant)),+
                }
            }

            pub fn envelope(&self) -> EnvelopeRef<'_> {
                match self {
                    $(RtcEvent::$variant(event) => EnvelopeRef::of(event)),+
                }
            }
        }
    };
}

rtc_events! {
    MemberMedia => "member:media": MemberMediaBody,
    MemberInvited => "member:invited": MemberInvitedBody,
    MemberJoined => "member:joined": MemberBody,
    MemberLeft => "member:left": MemberBody,
    MemberMessageStatus => "member:message:status": GenericBody,
    RtcHangup => "rtc:hangup": RtcHangupBody,
    Message => "message": MessageBody,
    ConversationCreated => "conversation:created": ConversationCreatedBody,
    ConversationDeleted => "conversation:deleted": GenericBody,
    AppKnocking => "app:knocking": AppKnockingBody,
    AudioSay => "audio:say": AudioSayBody,
    AudioSayDone => "audio:say:done": SayRef,
    AudioSayStop => "audio:say:stop": SayRef,
    AudioPlay => "audio:play": AudioPlayBody,
    AudioPlayDone => "audio:play:done": PlayRef,
    AudioPlayStop => "audio:play:stop": PlayRef,
    AudioRecord => "audio:record": AudioRecordBody,
    AudioRecordDone => "audio:record:done": AudioRecordDoneBody,
    AudioRecordStop => "audio:record:stop": RecordRef,
    AudioTranscribeDone => "audio:transcribe:done": AudioTranscribeDoneBody,
    AudioAsrDone => "audio:asr:done": AudioAsrDoneBody,
    AudioAsrRecordDone => "audio:asr:record:done": AudioAsrRecordDoneBody,
}

impl fmt::Display for RtcEventKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Body-independent view of an event's envelope.
#[derive(Debug, Clone, Copy)]
pub struct EnvelopeRef<'a> {
    pub kind: &'a str,
    pub id: Option<u64>,
    pub conversation: Option<&'a str>,
    pub from_member: Option<&'a str>,
}

impl<'a> EnvelopeRef<'a> {
    fn of<B>(event: &'a Event<B>) -> Self {
        Self {
            kind: &event.kind,
            id: event.id,
            conversation: event.conversation(),
            from_member: event.from_member_id(),
        }
    }
}

/// Outcome of envelope validation: either a recognised type or the raw name.
#[derive(Debug)]
pub enum Classified {
    Known(RtcEventKind, Value),
    Unknown(String),
}

/// Validates the shared envelope and normalises a missing `body` to `{}`.
pub fn classify(mut payload: Value) -> Result<Classified, EventSchemaError> {
    let event_type = payload
        .get("type")
        .and_then(Value::as_str)
        .map(str::to_owned);

    if let Value::Object(map) = &mut payload {
        map.entry("body").or_insert_with(|| Value::Object(Map::new()));
    }

    let envelope: Event<GenericBody> =
        serde_json::from_value(payload.clone()).map_err(|source| EventSchemaError::Envelope {
            event_type: event_type.clone(),
            source,
        })?;

    Ok(match envelope.kind.parse::<RtcEventKind>() {
        Ok(kind) => Classified::Known(kind, payload),
        Err(()) => Classified::Unknown(envelope.kind),
    })
}

impl RtcEvent {
    /// Parses a raw payload; unknown event types yield `Ok(None)`.
    pub fn from_value(payload: Value) -> Result<Option<Self>, EventSchemaError> {
        match classify(payload)? {
            Classified::Known(kind, payload) => Self::parse(kind, payload).map(Some),
            Classified::Unknown(_) => Ok(None),
        }
    }
}

fn typed<B: DeserializeOwned>(kind: RtcEventKind, payload: Value) -> Result<Event<B>, EventSchemaError> {
    serde_json::from_value(payload).map_err(|source| EventSchemaError::Body {
        event_type: kind.as_str().to_string(),
        source,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn every_kind_round_trips_through_its_name() {
        assert_eq!(RtcEventKind::ALL.len(), 22);
        for kind in RtcEventKind::ALL {
            assert_eq!(kind.as_str().parse::<RtcEventKind>(), Ok(*kind));
        }
    }

    #[test]
    fn minimal_member_left_payload_parses() {
        let event = RtcEvent::from_value(json!({
            "type": "member:left",
            "cid": "C1",
            "body": {"user": {"id": "U1"}, "reason": {"text": "app:user:hangup"}}
        }))
        .unwrap()
        .unwrap();

        let RtcEvent::MemberLeft(event) = event else {
            panic!("expected member:left");
        };
        assert_eq!(event.conversation(), Some("C1"));
        assert_eq!(event.body.user.id, "U1");
        assert_eq!(
            event.body.reason.and_then(|r| r.text).as_deref(),
            Some("app:user:hangup")
        );
    }

    #[test]
    fn cid_takes_precedence_over_conversation_id() {
        let event = RtcEvent::from_value(json!({
            "type": "conversation:deleted",
            "cid": "CON-A",
            "conversation_id": "CON-B"
        }))
        .unwrap()
        .unwrap();
        assert_eq!(event.envelope().conversation, Some("CON-A"));
    }

    #[test]
    fn unknown_type_is_not_an_error() {
        assert_eq!(
            RtcEvent::from_value(json!({"type": "leg:status:update", "body": {}})).unwrap(),
            None
        );
    }

    #[test]
    fn invalid_timestamp_fails_envelope_validation() {
        let err = RtcEvent::from_value(json!({
            "type": "something:else",
            "timestamp": "yesterday"
        }))
        .unwrap_err();
        assert!(matches!(err, EventSchemaError::Envelope { .. }));
        assert_eq!(err.event_type(), Some("something:else"));
    }

    #[test]
    fn missing_type_fails_envelope_validation() {
        let err = RtcEvent::from_value(json!({"body": {}})).unwrap_err();
        assert_eq!(err.event_type(), None);
    }

    #[test]
    fn required_body_fields_are_enforced() {
        let err = RtcEvent::from_value(json!({
            "type": "member:joined",
            "body": {"member_id": "MEM-1"}
        }))
        .unwrap_err();
        assert!(matches!(err, EventSchemaError::Body { ref event_type, .. } if event_type == "member:joined"));
    }

    #[test]
    fn unknown_fields_are_preserved() {
        let event = RtcEvent::from_value(json!({
            "type": "message",
            "body": {"message_type": "text", "text": "hi"},
            "custom_field": 42
        }))
        .unwrap()
        .unwrap();
        let RtcEvent::Message(event) = event else {
            panic!("expected message");
        };
        assert_eq!(event.extra.get("custom_field"), Some(&json!(42)));
    }
}
