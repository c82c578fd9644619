//! Client-side call orchestration on top of a vendor voice SDK.
//!
//! The SDK and the OS telephony framework are external collaborators,
//! modelled by the [`VoiceClient`] and [`Telephony`] traits. The
//! [`VoiceClientManager`] owns the single active call slot, maps SDK
//! callbacks ([`VoiceEvent`]) onto [`CallSession`] state, runs the call verbs
//! and keeps the SDK session alive with the credentials in the preference
//! store.

mod call;
mod controls;
mod error;
mod events;
mod manager;
mod sdk;
mod session;
mod telephony;

pub use call::{CallDirection, CallSession, ConnectionState, DisconnectCause};
pub use error::{SdkError, TelephonyError, VoiceError, VoiceResult};
pub use events::VoiceEvent;
pub use manager::{SessionState, VoiceClientManager, CONTEXT_KEY_CALLEE};
pub use sdk::{
    CallContext, ChannelType, HangupReason, InviteCancelReason, LegStatus, PushType,
    SessionErrorReason, User, VoiceClient,
};
pub use telephony::{Telephony, TelephonyAction};
