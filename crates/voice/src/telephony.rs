use crate::call::DisconnectCause;
use crate::error::TelephonyError;
use crate::sdk::ChannelType;

/// The OS call framework that renders native call UI.
pub trait Telephony: Send + Sync {
    fn register_phone_account(&self) -> Result<(), TelephonyError>;
    fn start_incoming_call(
        &self,
        call_id: &str,
        from: &str,
        channel_type: ChannelType,
    ) -> Result<(), TelephonyError>;
    fn start_outgoing_call(
        &self,
        call_id: &str,
        callee: &str,
        reconnected: bool,
    ) -> Result<(), TelephonyError>;
    fn end_call(&self, call_id: &str, cause: DisconnectCause);
}

/// User actions reported by the OS call UI.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TelephonyAction {
    Answer,
    Reject,
    Disconnect,
    AudioStateChanged { muted: bool },
    PlayDtmf(char),
    /// The hold button; toggles between hold and unhold.
    Hold,
}
