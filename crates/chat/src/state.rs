use std::collections::BTreeMap;
use std::fmt;

use callbridge_conversations::{
    ConversationClient, ConversationEvent, Member, MemberEmbedded, MemberUser,
};
use serde_json::Value;
use tracing::{debug, info};

use crate::ChatError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MemberState {
    Invited,
    Joined,
    Left,
    Unknown,
}

impl MemberState {
    pub fn parse(state: Option<&str>) -> Self {
        match state.map(str::to_ascii_lowercase).as_deref() {
            Some("invited") => MemberState::Invited,
            Some("joined") => MemberState::Joined,
            Some("left") => MemberState::Left,
            _ => MemberState::Unknown,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            MemberState::Invited => "INVITED",
            MemberState::Joined => "JOINED",
            MemberState::Left => "LEFT",
            MemberState::Unknown => "UNKNOWN",
        }
    }

    fn from_event_type(kind: &str) -> Option<Self> {
        match kind {
            "member:invited" => Some(MemberState::Invited),
            "member:joined" => Some(MemberState::Joined),
            "member:left" => Some(MemberState::Left),
            _ => None,
        }
    }
}

impl fmt::Display for MemberState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Default)]
pub struct ChatState {
    conversation_id: String,
    members: BTreeMap<String, Member>,
    events: BTreeMap<i64, ConversationEvent>,
}

impl ChatState {
    pub fn new(conversation_id: impl Into<String>) -> Self {
        Self {
            conversation_id: conversation_id.into(),
            ..Self::default()
        }
    }

    /// Fetches members and events of `cid` and builds a fresh cache.
    pub async fn load(client: &ConversationClient, cid: &str) -> Result<Self, ChatError> {
        let (members, events) = tokio::try_join!(client.list_members(cid), client.list_events(cid))
            .map_err(|source| ChatError::Load {
                cid: cid.to_string(),
                source,
            })?;

        let mut state = Self::new(cid);
        for member in members {
            state.members.insert(member.id.clone(), member);
        }
        for event in events {
            state.apply(event);
        }

        info!(
            conversation_id = cid,
            members = state.members.len(),
            events = state.events.len(),
            "chat state loaded"
        );
        Ok(state)
    }

    /// Stores `event`, replacing an earlier copy with the same id. Member
    /// lifecycle events also move the member to its new state.
    pub fn apply(&mut self, event: ConversationEvent) {
        if let Some(state) = MemberState::from_event_type(&event.kind) {
            self.apply_member_event(&event, state);
        }
        if self.events.insert(event.id, event).is_some() {
            debug!(conversation_id = %self.conversation_id, "replaced duplicate event");
        }
    }

    fn apply_member_event(&mut self, event: &ConversationEvent, state: MemberState) {
        let Some(member_id) = event_member_id(event) else {
            debug!(event_id = event.id, kind = %event.kind, "member event without member id");
            return;
        };

        let member = self
            .members
            .entry(member_id.clone())
            .or_insert_with(|| Member {
                id: member_id,
                state: None,
                channel: event.body.get("channel").cloned(),
                embedded: MemberEmbedded {
                    user: event_user(&event.body),
                },
                extra: Default::default(),
            });
        member.state = Some(state.as_str().to_string());
    }

    pub fn conversation_id(&self) -> &str {
        &self.conversation_id
    }

    pub fn members(&self) -> impl Iterator<Item = &Member> {
        self.members.values()
    }

    pub fn member(&self, member_id: &str) -> Option<&Member> {
        self.members.get(member_id)
    }

    pub fn member_state(&self, member_id: &str) -> MemberState {
        MemberState::parse(self.member(member_id).and_then(|member| member.state.as_deref()))
    }

    pub fn member_by_user_name(&self, user_name: &str) -> Option<&Member> {
        self.members
            .values()
            .find(|member| member.user_name() == Some(user_name))
    }

    /// Whether `user_name` must join before taking part in the conversation.
    pub fn should_show_join(&self, user_name: &str) -> bool {
        let state = self
            .member_by_user_name(user_name)
            .map(|member| MemberState::parse(member.state.as_deref()))
            .unwrap_or(MemberState::Unknown);
        !matches!(state, MemberState::Joined)
    }

    /// Events in ascending id order.
    pub fn events(&self) -> impl Iterator<Item = &ConversationEvent> {
        self.events.values()
    }

    pub fn event(&self, event_id: i64) -> Option<&ConversationEvent> {
        self.events.get(&event_id)
    }

    pub fn last_event_id(&self) -> Option<i64> {
        self.events.keys().next_back().copied()
    }
}

/// The member an event is about. `body.member_id` names it; `from` is the
/// sender, which differs for invites, so it is only a fallback.
fn event_member_id(event: &ConversationEvent) -> Option<String> {
    event
        .body
        .get("member_id")
        .and_then(Value::as_str)
        .map(str::to_string)
        .or_else(|| event.from.clone())
}

/// Client SDK payloads carry the invited user under `invitee`.
fn event_user(body: &Value) -> Option<MemberUser> {
    body.get("user")
        .or_else(|| body.get("invitee"))
        .cloned()
        .and_then(|user| serde_json::from_value::<MemberUser>(user).ok())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn event(id: i64, kind: &str, from: Option<&str>, body: Value) -> ConversationEvent {
        ConversationEvent {
            id,
            kind: kind.to_string(),
            from: from.map(str::to_string),
            body,
            timestamp: None,
            embedded: None,
        }
    }

    #[test]
    fn events_are_ordered_and_deduplicated() {
        let mut state = ChatState::new("CON-1");
        state.apply(event(3, "message", Some("MEM-1"), json!({"text": "third"})));
        state.apply(event(1, "message", Some("MEM-1"), json!({"text": "first"})));
        state.apply(event(3, "message", Some("MEM-1"), json!({"text": "edited"})));

        let ids: Vec<i64> = state.events().map(|event| event.id).collect();
        assert_eq!(ids, vec![1, 3]);
        assert_eq!(state.event(3).unwrap().body["text"], "edited");
        assert_eq!(state.last_event_id(), Some(3));
    }

    #[test]
    fn member_lifecycle_updates_member_map() {
        let mut state = ChatState::new("CON-1");
        let body = json!({"user": {"id": "USR-1", "name": "alice"}, "channel": {"type": "app"}});

        state.apply(event(1, "member:invited", Some("MEM-1"), body.clone()));
        assert_eq!(state.member_state("MEM-1"), MemberState::Invited);
        assert_eq!(state.member("MEM-1").unwrap().user_name(), Some("alice"));

        state.apply(event(2, "member:joined", Some("MEM-1"), body.clone()));
        assert_eq!(state.member_state("MEM-1"), MemberState::Joined);
        assert!(!state.should_show_join("alice"));

        state.apply(event(3, "member:left", Some("MEM-1"), body));
        assert_eq!(state.member_state("MEM-1"), MemberState::Left);
        assert!(state.should_show_join("alice"));
        assert_eq!(state.members().count(), 1);
    }

    #[test]
    fn member_id_falls_back_to_sender() {
        let mut state = ChatState::new("CON-1");
        state.apply(event(1, "member:joined", None, json!({"member_id": "MEM-7"})));
        state.apply(event(2, "member:joined", Some("MEM-8"), json!({})));
        assert_eq!(state.member_state("MEM-7"), MemberState::Joined);
        assert_eq!(state.member_state("MEM-8"), MemberState::Joined);
    }

    #[test]
    fn invites_update_the_invitee_not_the_inviter() {
        let mut state = ChatState::new("CON-1");
        state.apply(event(
            1,
            "member:joined",
            Some("MEM-A"),
            json!({"member_id": "MEM-A", "user": {"id": "USR-A", "name": "agent"}}),
        ));
        state.apply(event(
            2,
            "member:invited",
            Some("MEM-A"),
            json!({"member_id": "MEM-B", "invitee": {"id": "USR-B", "name": "customer"}}),
        ));

        assert_eq!(state.member_state("MEM-A"), MemberState::Joined);
        assert_eq!(state.member_state("MEM-B"), MemberState::Invited);
        assert_eq!(state.member("MEM-B").unwrap().user_name(), Some("customer"));
        assert!(!state.should_show_join("agent"));
        assert!(state.should_show_join("customer"));
    }

    #[test]
    fn unknown_members_need_to_join() {
        let state = ChatState::new("CON-1");
        assert!(state.should_show_join("nobody"));
        assert_eq!(state.last_event_id(), None);
    }

    #[test]
    fn member_state_parsing_ignores_case() {
        assert_eq!(MemberState::parse(Some("joined")), MemberState::Joined);
        assert_eq!(MemberState::parse(Some("INVITED")), MemberState::Invited);
        assert_eq!(MemberState::parse(None), MemberState::Unknown);
    }
}
