use callbridge_conversations::ConversationEvent;
use serde_json::Value;

use crate::state::ChatState;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LineKind {
    MemberEvent,
    Text,
    Image,
    Audio,
    Video,
    File,
    Unknown(String),
}

/// One rendered line of the conversation timeline.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChatLine {
    pub event_id: i64,
    pub sender: String,
    pub content: String,
    pub kind: LineKind,
}

fn text_at<'a>(value: &'a Value, path: &[&str]) -> Option<&'a str> {
    path.iter()
        .try_fold(value, |value, key| value.get(key))
        .and_then(Value::as_str)
}

impl ChatState {
    /// Renders the cached events, oldest first. Messages sent by `me` are
    /// attributed to "You".
    pub fn timeline(&self, me: Option<&str>) -> Vec<ChatLine> {
        self.events().map(|event| self.line(event, me)).collect()
    }

    fn sender_name(&self, event: &ConversationEvent, me: Option<&str>) -> String {
        let member = event.from.as_deref().and_then(|id| self.member(id));
        let user = member.and_then(|member| member.embedded.user.as_ref());
        let name = user.and_then(|user| user.name.clone());

        match (name, me) {
            (Some(name), Some(me)) if name == me => "You".to_string(),
            (Some(name), _) => user
                .and_then(|user| user.display_name.clone())
                .unwrap_or(name),
            (None, _) => "Admin".to_string(),
        }
    }

    fn line(&self, event: &ConversationEvent, me: Option<&str>) -> ChatLine {
        let body = &event.body;
        let member_line = |verb: &str| {
            let user = text_at(body, &["user", "name"])
                .or_else(|| text_at(body, &["invitee", "name"]))
                .unwrap_or("unknown");
            ChatLine {
                event_id: event.id,
                sender: user.to_string(),
                content: format!("EVENT: '{user}' {verb}"),
                kind: LineKind::MemberEvent,
            }
        };

        match event.kind.as_str() {
            "member:invited" => {
                let inviter = self.sender_name(event, me);
                member_line(&format!("has been invited by '{inviter}'"))
            }
            "member:joined" => member_line("has joined the conversation"),
            "member:left" => member_line("has left the conversation"),
            "message" | "text" => {
                let message_type = text_at(body, &["message_type"]).unwrap_or("text");
                let (kind, content) = match message_type {
                    "text" => (LineKind::Text, text_at(body, &["text"])),
                    "image" => (LineKind::Image, text_at(body, &["image", "url"])),
                    "audio" => (LineKind::Audio, text_at(body, &["audio", "url"])),
                    "video" => (LineKind::Video, text_at(body, &["video", "url"])),
                    "file" => (LineKind::File, text_at(body, &["file", "url"])),
                    other => (LineKind::Unknown(other.to_string()), None),
                };
                ChatLine {
                    event_id: event.id,
                    sender: self.sender_name(event, me),
                    content: content.unwrap_or_default().to_string(),
                    kind,
                }
            }
            other => ChatLine {
                event_id: event.id,
                sender: self.sender_name(event, me),
                content: String::new(),
                kind: LineKind::Unknown(other.to_string()),
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn event(id: i64, kind: &str, from: &str, body: Value) -> ConversationEvent {
        ConversationEvent {
            id,
            kind: kind.to_string(),
            from: Some(from.to_string()),
            body,
            timestamp: None,
            embedded: None,
        }
    }

    #[test]
    fn renders_members_and_messages() {
        let mut state = ChatState::new("CON-1");
        state.apply(event(
            1,
            "member:joined",
            "MEM-1",
            json!({"user": {"id": "USR-1", "name": "alice", "display_name": "Alice"}}),
        ));
        state.apply(event(
            2,
            "message",
            "MEM-1",
            json!({"message_type": "text", "text": "hello"}),
        ));
        state.apply(event(
            3,
            "message",
            "MEM-1",
            json!({"message_type": "image", "image": {"url": "https://example.com/a.png"}}),
        ));

        let lines = state.timeline(None);
        assert_eq!(lines[0].content, "EVENT: 'alice' has joined the conversation");
        assert_eq!(lines[0].kind, LineKind::MemberEvent);
        assert_eq!(lines[1].sender, "Alice");
        assert_eq!(lines[1].content, "hello");
        assert_eq!(lines[2].kind, LineKind::Image);
        assert_eq!(lines[2].content, "https://example.com/a.png");

        let mine = state.timeline(Some("alice"));
        assert_eq!(mine[1].sender, "You");
    }

    #[test]
    fn unknown_senders_are_admin() {
        let mut state = ChatState::new("CON-1");
        state.apply(event(1, "custom:thing", "MEM-404", json!({})));
        let lines = state.timeline(None);
        assert_eq!(lines[0].sender, "Admin");
        assert_eq!(lines[0].kind, LineKind::Unknown("custom:thing".into()));
    }
}
