//! Request and response bodies of the conversation service.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Conversation {
    #[serde(default)]
    pub id: String,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub display_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub state: Option<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Messaging channels whose conversations are named `<channel>:<...>`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MessagingChannel {
    Messenger,
    Whatsapp,
    Sms,
    ViberService,
}

impl MessagingChannel {
    pub fn from_conversation_name(name: &str) -> Option<Self> {
        let prefix = name.split(':').next().unwrap_or_default();
        match prefix {
            "messenger" => Some(Self::Messenger),
            "whatsapp" => Some(Self::Whatsapp),
            "sms" => Some(Self::Sms),
            "viber_service" => Some(Self::ViberService),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MemberUser {
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub display_name: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MemberEmbedded {
    #[serde(default)]
    pub user: Option<MemberUser>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Member {
    pub id: String,
    #[serde(default)]
    pub state: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub channel: Option<Value>,
    #[serde(rename = "_embedded", default)]
    pub embedded: MemberEmbedded,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Member {
    pub fn user_name(&self) -> Option<&str> {
        self.embedded.user.as_ref()?.name.as_deref()
    }

    pub fn user_id(&self) -> Option<&str> {
        self.embedded.user.as_ref()?.id.as_deref()
    }

    pub fn is_joined(&self) -> bool {
        self.state
            .as_deref()
            .is_some_and(|state| state.eq_ignore_ascii_case("joined"))
    }
}

#[derive(Debug, Deserialize)]
pub(crate) struct MemberList {
    #[serde(rename = "_embedded", default)]
    pub embedded: MemberListEmbedded,
}

#[derive(Debug, Default, Deserialize)]
pub(crate) struct MemberListEmbedded {
    #[serde(default)]
    pub members: Vec<Member>,
}

/// A stored conversation event as returned by the events listing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConversationEvent {
    pub id: i64,
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub from: Option<String>,
    #[serde(default)]
    pub body: Value,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<String>,
    #[serde(rename = "_embedded", default, skip_serializing_if = "Option::is_none")]
    pub embedded: Option<Value>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct EventList {
    #[serde(rename = "_embedded", default)]
    pub embedded: EventListEmbedded,
}

#[derive(Debug, Default, Deserialize)]
pub(crate) struct EventListEmbedded {
    #[serde(default)]
    pub events: Vec<ConversationEvent>,
}

/// Body of `POST /conversations/{id}/events`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NewEvent {
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub from: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub body: Option<Value>,
}

impl NewEvent {
    pub fn new(kind: impl Into<String>) -> Self {
        Self {
            kind: kind.into(),
            from: None,
            body: None,
        }
    }

    pub fn from_member(mut self, member_id: Option<String>) -> Self {
        self.from = member_id;
        self
    }

    pub fn with_body(mut self, body: Value) -> Self {
        self.body = Some(body);
        self
    }

    pub fn text_message(text: impl Into<String>) -> Self {
        Self::new("message").with_body(serde_json::json!({
            "message_type": "text",
            "text": text.into(),
        }))
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct UserReference {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChannelRequest {
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub preanswer: Option<bool>,
}

/// Body of `POST /conversations/{id}/members`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct JoinMemberRequest {
    pub user: UserReference,
    pub channel: ChannelRequest,
    pub state: String,
}

impl JoinMemberRequest {
    /// Re-joins an app user by id, used when an app leg hangs up.
    pub fn rejoin_app_user(user_id: impl Into<String>) -> Self {
        Self {
            user: UserReference {
                id: Some(user_id.into()),
                name: None,
            },
            channel: ChannelRequest {
                kind: "app".to_string(),
                preanswer: None,
            },
            state: "joined".to_string(),
        }
    }

    pub fn app_user_by_name(user_name: impl Into<String>) -> Self {
        Self {
            user: UserReference {
                id: None,
                name: Some(user_name.into()),
            },
            channel: ChannelRequest {
                kind: "app".to_string(),
                preanswer: Some(false),
            },
            state: "JOINED".to_string(),
        }
    }
}

/// Body of `PATCH /users/{id}`.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct UserPatch {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub display_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub image_url: Option<String>,
}

/// Body of `POST /legs/{id}/asr`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AsrRequest {
    pub language: String,
    pub speech_context: Vec<String>,
    pub conversation_id: String,
    pub end_on_silence_timeout: u32,
    pub active: bool,
    pub sensitivity: u32,
}

impl AsrRequest {
    pub fn for_conversation(conversation_id: impl Into<String>) -> Self {
        Self {
            language: "en-US".to_string(),
            speech_context: vec!["a".to_string(), "b".to_string()],
            conversation_id: conversation_id.into(),
            end_on_silence_timeout: 5,
            active: true,
            sensitivity: 90,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub(crate) struct PushNotification<'a> {
    pub title: &'a str,
    pub body: &'a str,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn channel_prefix_is_taken_before_first_colon() {
        assert_eq!(
            MessagingChannel::from_conversation_name("whatsapp:447700900000:abc"),
            Some(MessagingChannel::Whatsapp)
        );
        assert_eq!(
            MessagingChannel::from_conversation_name("viber_service:123"),
            Some(MessagingChannel::ViberService)
        );
        assert_eq!(MessagingChannel::from_conversation_name("CON-1234"), None);
        assert_eq!(MessagingChannel::from_conversation_name(""), None);
    }

    #[test]
    fn rejoin_request_matches_wire_shape() {
        let body = serde_json::to_value(JoinMemberRequest::rejoin_app_user("U1")).unwrap();
        assert_eq!(
            body,
            json!({"user": {"id": "U1"}, "channel": {"type": "app"}, "state": "joined"})
        );
    }

    #[test]
    fn named_join_request_disables_preanswer() {
        let body = serde_json::to_value(JoinMemberRequest::app_user_by_name("bot:vonage")).unwrap();
        assert_eq!(
            body,
            json!({
                "user": {"name": "bot:vonage"},
                "channel": {"type": "app", "preanswer": false},
                "state": "JOINED"
            })
        );
    }

    #[test]
    fn new_event_omits_missing_sender() {
        let body = serde_json::to_value(NewEvent::new("audio:record")).unwrap();
        assert_eq!(body, json!({"type": "audio:record"}));
    }

    #[test]
    fn member_state_comparison_ignores_case() {
        let member: Member = serde_json::from_value(json!({
            "id": "MEM-1",
            "state": "joined",
            "_embedded": {"user": {"id": "USR-1", "name": "alice"}}
        }))
        .unwrap();
        assert!(member.is_joined());
        assert_eq!(member.user_name(), Some("alice"));
        assert_eq!(member.user_id(), Some("USR-1"));
    }
}
