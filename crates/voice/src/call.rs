use std::fmt;

use crate::sdk::{HangupReason, InviteCancelReason};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CallDirection {
    Inbound,
    Outbound,
}

/// Why a call left the active slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DisconnectCause {
    Local,
    Remote,
    Rejected,
    Busy,
    Canceled,
    AnsweredElsewhere,
    Missed,
    Error,
}

impl From<HangupReason> for DisconnectCause {
    fn from(reason: HangupReason) -> Self {
        match reason {
            HangupReason::RemoteReject => DisconnectCause::Rejected,
            HangupReason::RemoteHangup => DisconnectCause::Remote,
            HangupReason::LocalHangup => DisconnectCause::Local,
            HangupReason::MediaTimeout => DisconnectCause::Busy,
            HangupReason::RemoteNoAnswerTimeout => DisconnectCause::Canceled,
        }
    }
}

impl From<InviteCancelReason> for DisconnectCause {
    fn from(reason: InviteCancelReason) -> Self {
        match reason {
            InviteCancelReason::AnsweredElsewhere => DisconnectCause::AnsweredElsewhere,
            InviteCancelReason::RejectedElsewhere => DisconnectCause::Rejected,
            InviteCancelReason::RemoteCancel => DisconnectCause::Canceled,
            InviteCancelReason::RemoteTimeout => DisconnectCause::Missed,
        }
    }
}

impl fmt::Display for DisconnectCause {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            DisconnectCause::Local => "local",
            DisconnectCause::Remote => "remote",
            DisconnectCause::Rejected => "rejected",
            DisconnectCause::Busy => "busy",
            DisconnectCause::Canceled => "canceled",
            DisconnectCause::AnsweredElsewhere => "answered elsewhere",
            DisconnectCause::Missed => "missed",
            DisconnectCause::Error => "error",
        };
        f.write_str(name)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionState {
    Ringing,
    Dialing,
    Initializing,
    Active,
    Disconnected(DisconnectCause),
}

/// The call occupying the active call slot.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CallSession {
    pub call_id: String,
    pub direction: CallDirection,
    pub caller_display_name: String,
    pub state: ConnectionState,
    pub is_muted: bool,
    pub is_on_hold: bool,
    pub is_noise_suppression_enabled: bool,
}

impl CallSession {
    pub fn inbound(call_id: impl Into<String>, from: impl Into<String>) -> Self {
        Self::new(call_id, from, CallDirection::Inbound, ConnectionState::Ringing)
    }

    /// Reconnected calls skip dialing and start active.
    pub fn outbound(call_id: impl Into<String>, callee: impl Into<String>, reconnected: bool) -> Self {
        let state = if reconnected {
            ConnectionState::Active
        } else {
            ConnectionState::Dialing
        };
        Self::new(call_id, callee, CallDirection::Outbound, state)
    }

    fn new(
        call_id: impl Into<String>,
        caller_display_name: impl Into<String>,
        direction: CallDirection,
        state: ConnectionState,
    ) -> Self {
        Self {
            call_id: call_id.into(),
            direction,
            caller_display_name: caller_display_name.into(),
            state,
            is_muted: false,
            is_on_hold: false,
            is_noise_suppression_enabled: false,
        }
    }

    /// Anything but a disconnected call blocks the slot.
    pub fn is_live(&self) -> bool {
        !matches!(self.state, ConnectionState::Disconnected(_))
    }

    pub fn disconnect_cause(&self) -> Option<DisconnectCause> {
        match self.state {
            ConnectionState::Disconnected(cause) => Some(cause),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn every_hangup_reason_maps_to_one_cause() {
        let causes: Vec<DisconnectCause> =
            HangupReason::ALL.into_iter().map(DisconnectCause::from).collect();
        assert_eq!(
            causes,
            vec![
                DisconnectCause::Rejected,
                DisconnectCause::Remote,
                DisconnectCause::Local,
                DisconnectCause::Busy,
                DisconnectCause::Canceled,
            ]
        );
    }

    #[test]
    fn every_invite_cancel_reason_maps_to_one_cause() {
        let causes: Vec<DisconnectCause> = InviteCancelReason::ALL
            .into_iter()
            .map(DisconnectCause::from)
            .collect();
        assert_eq!(
            causes,
            vec![
                DisconnectCause::AnsweredElsewhere,
                DisconnectCause::Rejected,
                DisconnectCause::Canceled,
                DisconnectCause::Missed,
            ]
        );
    }

    #[test]
    fn new_calls_start_in_their_direction_state() {
        assert_eq!(CallSession::inbound("c1", "alice").state, ConnectionState::Ringing);
        assert_eq!(CallSession::outbound("c2", "bob", false).state, ConnectionState::Dialing);
        assert_eq!(CallSession::outbound("c3", "bob", true).state, ConnectionState::Active);
    }

    #[test]
    fn disconnected_calls_are_not_live() {
        let mut call = CallSession::inbound("c1", "alice");
        assert!(call.is_live());
        call.state = ConnectionState::Disconnected(DisconnectCause::Remote);
        assert!(!call.is_live());
        assert_eq!(call.disconnect_cause(), Some(DisconnectCause::Remote));
    }
}
