use std::collections::HashMap;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::SdkError;

/// Custom data passed to the voice-answer webhook with a server call.
pub type CallContext = HashMap<String, String>;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub display_name: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionErrorReason {
    TokenExpired,
    TransportClosed,
    PingTimeout,
}

impl SessionErrorReason {
    pub fn message(self) -> &'static str {
        match self {
            SessionErrorReason::TokenExpired => "Token has expired",
            SessionErrorReason::TransportClosed => "Connection closed",
            SessionErrorReason::PingTimeout => "Connection timeout",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HangupReason {
    RemoteReject,
    RemoteHangup,
    LocalHangup,
    MediaTimeout,
    RemoteNoAnswerTimeout,
}

impl HangupReason {
    pub const ALL: [HangupReason; 5] = [
        HangupReason::RemoteReject,
        HangupReason::RemoteHangup,
        HangupReason::LocalHangup,
        HangupReason::MediaTimeout,
        HangupReason::RemoteNoAnswerTimeout,
    ];
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InviteCancelReason {
    AnsweredElsewhere,
    RejectedElsewhere,
    RemoteCancel,
    RemoteTimeout,
}

impl InviteCancelReason {
    pub const ALL: [InviteCancelReason; 4] = [
        InviteCancelReason::AnsweredElsewhere,
        InviteCancelReason::RejectedElsewhere,
        InviteCancelReason::RemoteCancel,
        InviteCancelReason::RemoteTimeout,
    ];
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LegStatus {
    Ringing,
    Answered,
    Completed,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChannelType {
    App,
    Phone,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PushType {
    IncomingCall,
    Other,
}

/// Operations of the vendor voice SDK.
///
/// Callbacks travel the other way as [`crate::VoiceEvent`]s.
#[async_trait]
pub trait VoiceClient: Send + Sync {
    /// Returns the session id.
    async fn create_session(&self, token: &str) -> Result<String, SdkError>;
    async fn delete_session(&self) -> Result<(), SdkError>;
    async fn get_user(&self, user: &str) -> Result<User, SdkError>;

    /// Places a call through the voice-answer webhook and returns its call id.
    async fn server_call(&self, context: Option<CallContext>) -> Result<String, SdkError>;
    async fn answer(&self, call_id: &str) -> Result<(), SdkError>;
    async fn reject(&self, call_id: &str) -> Result<(), SdkError>;
    async fn hangup(&self, call_id: &str) -> Result<(), SdkError>;
    async fn mute(&self, call_id: &str) -> Result<(), SdkError>;
    async fn unmute(&self, call_id: &str) -> Result<(), SdkError>;
    async fn enable_earmuff(&self, call_id: &str) -> Result<(), SdkError>;
    async fn disable_earmuff(&self, call_id: &str) -> Result<(), SdkError>;
    async fn enable_noise_suppression(&self, call_id: &str) -> Result<(), SdkError>;
    async fn disable_noise_suppression(&self, call_id: &str) -> Result<(), SdkError>;
    async fn send_dtmf(&self, call_id: &str, digits: &str) -> Result<(), SdkError>;
    async fn reconnect_call(&self, call_id: &str) -> Result<(), SdkError>;

    /// Returns the device id bound to the push token.
    async fn register_device_push_token(&self, push_token: &str) -> Result<String, SdkError>;
    async fn unregister_device_push_token(&self, device_id: &str) -> Result<(), SdkError>;

    /// Hands an incoming-call push to the SDK, which answers with a call invite callback.
    async fn process_push_call_invite(&self, payload: &str) -> Result<(), SdkError>;
    fn push_notification_type(&self, payload: &str) -> PushType;
}
