use crate::sdk::{ChannelType, HangupReason, InviteCancelReason, LegStatus, SessionErrorReason};

/// Callbacks raised by the voice SDK.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum VoiceEvent {
    SessionError(SessionErrorReason),
    CallInvite {
        call_id: String,
        from: String,
        channel_type: ChannelType,
    },
    LegStatus {
        call_id: String,
        leg_id: String,
        status: LegStatus,
    },
    Hangup {
        call_id: String,
        reason: HangupReason,
    },
    InviteCancel {
        call_id: String,
        reason: InviteCancelReason,
    },
    Transfer {
        call_id: String,
        conversation_id: String,
    },
    MuteUpdate {
        call_id: String,
        leg_id: String,
        is_muted: bool,
    },
    DtmfReceived {
        call_id: String,
        leg_id: String,
        digits: String,
    },
    MediaDisconnect {
        call_id: String,
    },
    MediaReconnecting {
        call_id: String,
    },
    MediaReconnected {
        call_id: String,
    },
}

impl VoiceEvent {
    /// Call the event refers to; session errors have none.
    pub fn call_id(&self) -> Option<&str> {
        match self {
            VoiceEvent::SessionError(_) => None,
            VoiceEvent::CallInvite { call_id, .. }
            | VoiceEvent::LegStatus { call_id, .. }
            | VoiceEvent::Hangup { call_id, .. }
            | VoiceEvent::InviteCancel { call_id, .. }
            | VoiceEvent::Transfer { call_id, .. }
            | VoiceEvent::MuteUpdate { call_id, .. }
            | VoiceEvent::DtmfReceived { call_id, .. }
            | VoiceEvent::MediaDisconnect { call_id }
            | VoiceEvent::MediaReconnecting { call_id }
            | VoiceEvent::MediaReconnected { call_id } => Some(call_id),
        }
    }
}
