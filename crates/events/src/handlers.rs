use async_trait::async_trait;
use callbridge_conversations::{
    AsrRequest, ConversationClient, JoinMemberRequest, MessagingChannel, UserPatch,
};
use tracing::{debug, info};

use crate::commands::MessageCommand;
use crate::dispatcher::RtcEventHandler;
use crate::error::HandlerError;
use crate::event::{AppKnockingBody, Event, MemberBody, MessageBody, MessageType, RtcEvent};

const USER_HANGUP_REASON: &str = "app:user:hangup";
const PUSH_TITLE: &str = "Custom Push Notification";

pub fn is_customer(user_name: &str) -> bool {
    user_name.contains(":customer:")
}

pub fn is_bot(user_name: &str) -> bool {
    user_name.contains("bot:")
}

pub fn is_agent(user_name: &str) -> bool {
    !(is_customer(user_name) || is_bot(user_name))
}

/// Production handler set, acting on the conversation service.
#[derive(Clone)]
pub struct ConversationHandlers {
    client: ConversationClient,
    bot_name: String,
}

impl ConversationHandlers {
    pub fn new(client: ConversationClient, bot_name: impl Into<String>) -> Self {
        Self {
            client,
            bot_name: bot_name.into(),
        }
    }

    async fn on_member_left(&self, event: &Event<MemberBody>) -> Result<(), HandlerError> {
        let reason = event.body.reason.as_ref().and_then(|r| r.text.as_deref());
        if reason != Some(USER_HANGUP_REASON) {
            return Ok(());
        }

        let cid = event.conversation().ok_or(HandlerError::Missing("conversation id"))?;
        let user_id = &event.body.user.id;
        info!(conversation_id = %cid, user_id = %user_id, "re-joining app user after hangup");
        self.client
            .join_member(cid, &JoinMemberRequest::rejoin_app_user(user_id.clone()))
            .await?;
        Ok(())
    }

    async fn on_member_joined(&self, event: &Event<MemberBody>) -> Result<(), HandlerError> {
        let cid = event.conversation().ok_or(HandlerError::Missing("conversation id"))?;
        let name = self.client.conversation_name(cid).await?;
        if MessagingChannel::from_conversation_name(&name).is_none() {
            return Ok(());
        }

        let user = &event.body.user;
        let Some(user_name) = user.name.as_deref() else {
            return Ok(());
        };
        if !is_agent(user_name) {
            return Ok(());
        }

        let display = user.display_or_name().unwrap_or(user_name);
        self.client
            .send_bot_text_message(
                cid,
                &self.bot_name,
                &format!("Agent '{display}' has joined the conversation"),
            )
            .await?;
        Ok(())
    }

    async fn on_app_knocking(&self, event: &Event<AppKnockingBody>) -> Result<(), HandlerError> {
        let from = event.body.channel.as_ref().and_then(|c| c.from.as_ref());
        let Some(number) = from.and_then(|f| f.number.as_deref()) else {
            return Ok(());
        };
        let from_type = from.and_then(|f| f.kind.as_deref()).unwrap_or("unknown");
        let user_id = event
            .body
            .user
            .as_ref()
            .map(|u| u.id.as_str())
            .ok_or(HandlerError::Missing("user id"))?;

        debug!(user_id, number, "updating knocking user's display name");
        let patch = UserPatch {
            display_name: Some(format!("{number} ({from_type})")),
            ..UserPatch::default()
        };
        self.client.update_user(user_id, &patch).await?;
        Ok(())
    }

    async fn on_message(&self, event: &Event<MessageBody>) -> Result<(), HandlerError> {
        if event.body.message_type != MessageType::Text {
            return Ok(());
        }
        let text = event.body.text.as_deref().unwrap_or_default();
        let Some(command) = MessageCommand::parse(text) else {
            info!("no action taken");
            return Ok(());
        };

        let cid = event.conversation();
        if let Some(new_event) = command.to_event(event.from_member_id()) {
            let cid = cid.ok_or(HandlerError::Missing("conversation id"))?;
            debug!(conversation_id = %cid, event_type = %new_event.kind, "posting command event");
            self.client.create_event(cid, &new_event).await?;
            return Ok(());
        }

        match command {
            MessageCommand::Asr { leg_id } => {
                let cid = cid.ok_or(HandlerError::Missing("conversation id"))?;
                self.client
                    .start_asr(&leg_id, &AsrRequest::for_conversation(cid))
                    .await?;
            }
            MessageCommand::AsrStop { leg_id } => self.client.stop_asr(&leg_id).await?,
            MessageCommand::Push { user, text } => {
                self.client
                    .send_push_notification(&user, PUSH_TITLE, &text)
                    .await?;
            }
            _ => {}
        }
        Ok(())
    }
}

#[async_trait]
impl RtcEventHandler for ConversationHandlers {
    async fn handle(&self, event: &RtcEvent) -> Result<(), HandlerError> {
        match event {
            RtcEvent::MemberLeft(event) => self.on_member_left(event).await,
            RtcEvent::MemberJoined(event) => self.on_member_joined(event).await,
            RtcEvent::AppKnocking(event) => self.on_app_knocking(event).await,
            RtcEvent::Message(event) => self.on_message(event).await,
            other => {
                debug!(event_type = %other.kind(), "event received");
                Ok(())
            }
        }
    }
}
