use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use callbridge_auth::AdminTokenSource;
use callbridge_config::ConversationServiceConfig;
use reqwest::{header, Client, Method};
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;
use tokio::sync::RwLock;
use tracing::{debug, error};

use crate::error::{ConversationError, ConversationResult};
use crate::models::{
    AsrRequest, Conversation, ConversationEvent, EventList, JoinMemberRequest, Member, MemberList,
    NewEvent, PushNotification, UserPatch,
};

/// Bearer-authenticated client for the conversation service.
#[derive(Clone)]
pub struct ConversationClient {
    http: Client,
    endpoint: String,
    tokens: Arc<AdminTokenSource>,
    names: Arc<RwLock<HashMap<String, String>>>,
}

impl ConversationClient {
    pub fn new(
        endpoint: impl Into<String>,
        tokens: AdminTokenSource,
        timeout: Duration,
    ) -> ConversationResult<Self> {
        let http = Client::builder().timeout(timeout).build()?;
        let endpoint = endpoint.into().trim_end_matches('/').to_string();

        Ok(Self {
            http,
            endpoint,
            tokens: Arc::new(tokens),
            names: Arc::new(RwLock::new(HashMap::new())),
        })
    }

    pub fn from_config(
        config: &ConversationServiceConfig,
        tokens: AdminTokenSource,
    ) -> ConversationResult<Self> {
        Self::new(
            config.endpoint.clone(),
            tokens,
            Duration::from_secs(config.request_timeout_seconds),
        )
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    pub fn token_source(&self) -> &AdminTokenSource {
        &self.tokens
    }

    async fn request<T, B>(&self, method: Method, path: &str, body: Option<&B>) -> ConversationResult<T>
    where
        T: DeserializeOwned,
        B: Serialize + ?Sized,
    {
        let token = self.tokens.bearer()?;
        let url = format!("{}{}", self.endpoint, path);
        debug!(%method, %url, "conversation service request");

        let mut request = self
            .http
            .request(method.clone(), &url)
            .bearer_auth(token)
            .header(header::CONTENT_TYPE, "application/json")
            .header(header::ACCEPT, "application/json");
        if let Some(body) = body {
            request = request.json(body);
        }

        let response = request.send().await?;
        let status = response.status();
        let text = response.text().await?;

        if !status.is_success() {
            error!(%method, path, status = status.as_u16(), body = %text, "conversation service request failed");
            return Err(ConversationError::Status {
                method: method.to_string(),
                path: path.to_string(),
                status: status.as_u16(),
                body: text,
            });
        }

        let value = if text.trim().is_empty() {
            Value::Null
        } else {
            serde_json::from_str(&text)?
        };
        Ok(serde_json::from_value(value)?)
    }

    async fn send<T: DeserializeOwned>(&self, method: Method, path: &str) -> ConversationResult<T> {
        self.request::<T, ()>(method, path, None).await
    }

    pub async fn get_conversation(&self, cid: &str) -> ConversationResult<Conversation> {
        self.send(Method::GET, &format!("/conversations/{cid}")).await
    }

    /// Conversation names never change, so they are cached per id.
    pub async fn conversation_name(&self, cid: &str) -> ConversationResult<String> {
        if let Some(name) = self.names.read().await.get(cid) {
            return Ok(name.clone());
        }

        let conversation = self.get_conversation(cid).await?;
        self.names
            .write()
            .await
            .insert(cid.to_string(), conversation.name.clone());
        Ok(conversation.name)
    }

    pub async fn list_members(&self, cid: &str) -> ConversationResult<Vec<Member>> {
        let list: MemberList = self
            .send(Method::GET, &format!("/conversations/{cid}/members"))
            .await?;
        Ok(list.embedded.members)
    }

    pub async fn list_events(&self, cid: &str) -> ConversationResult<Vec<ConversationEvent>> {
        let list: EventList = self
            .send(Method::GET, &format!("/conversations/{cid}/events"))
            .await?;
        Ok(list.embedded.events)
    }

    pub async fn join_member(
        &self,
        cid: &str,
        request: &JoinMemberRequest,
    ) -> ConversationResult<Member> {
        self.request(
            Method::POST,
            &format!("/conversations/{cid}/members"),
            Some(request),
        )
        .await
    }

    /// Returns the id of `user_name`'s joined member, joining the user first if needed.
    pub async fn add_user_to_conversation(
        &self,
        cid: &str,
        user_name: &str,
    ) -> ConversationResult<String> {
        let members = self.list_members(cid).await?;
        if let Some(member) = members
            .iter()
            .find(|member| member.user_name() == Some(user_name) && member.is_joined())
        {
            debug!(conversation_id = %cid, user_name, "user already in conversation");
            return Ok(member.id.clone());
        }

        debug!(conversation_id = %cid, user_name, "adding user to conversation");
        let member = self
            .join_member(cid, &JoinMemberRequest::app_user_by_name(user_name))
            .await?;
        Ok(member.id)
    }

    pub async fn create_event(&self, cid: &str, event: &NewEvent) -> ConversationResult<Value> {
        self.request(
            Method::POST,
            &format!("/conversations/{cid}/events"),
            Some(event),
        )
        .await
    }

    pub async fn send_bot_text_message(
        &self,
        cid: &str,
        bot_name: &str,
        text: &str,
    ) -> ConversationResult<Value> {
        let bot_member = self.add_user_to_conversation(cid, bot_name).await?;
        let event = NewEvent::text_message(text).from_member(Some(bot_member));
        self.create_event(cid, &event).await
    }

    pub async fn update_user(&self, user_id: &str, patch: &UserPatch) -> ConversationResult<Value> {
        self.request(Method::PATCH, &format!("/users/{user_id}"), Some(patch))
            .await
    }

    pub async fn delete_conversation(&self, cid: &str) -> ConversationResult<()> {
        self.send::<Value>(Method::DELETE, &format!("/conversations/{cid}"))
            .await?;
        self.names.write().await.remove(cid);
        Ok(())
    }

    pub async fn delete_user(&self, user_id: &str) -> ConversationResult<()> {
        self.send::<Value>(Method::DELETE, &format!("/users/{user_id}"))
            .await
            .map(drop)
    }

    pub async fn start_asr(&self, leg_id: &str, request: &AsrRequest) -> ConversationResult<Value> {
        self.request(Method::POST, &format!("/legs/{leg_id}/asr"), Some(request))
            .await
    }

    pub async fn stop_asr(&self, leg_id: &str) -> ConversationResult<()> {
        self.send::<Value>(Method::DELETE, &format!("/legs/{leg_id}/asr"))
            .await
            .map(drop)
    }

    pub async fn send_push_notification(
        &self,
        user: &str,
        title: &str,
        body: &str,
    ) -> ConversationResult<Value> {
        self.request(
            Method::POST,
            &format!("/users/{user}/notifications"),
            Some(&PushNotification { title, body }),
        )
        .await
    }

    /// Lightweight authenticated request used by health checks.
    pub async fn check_reachable(&self) -> ConversationResult<()> {
        self.send::<Value>(Method::GET, "/conversations?page_size=1")
            .await
            .map(drop)
    }
}
