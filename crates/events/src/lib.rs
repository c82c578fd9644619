//! RTC event webhook schemas, dispatch and the production handlers, plus the
//! voice answer/event NCCO builders.

pub mod commands;
mod dispatcher;
mod error;
pub mod event;
mod handlers;
pub mod ncco;
pub mod schemas;

pub use commands::MessageCommand;
pub use dispatcher::{DispatchOutcome, EventDispatcher, RtcEventHandler};
pub use error::{EventSchemaError, HandlerError};
pub use event::{Event, RtcEvent, RtcEventKind};
pub use handlers::{is_agent, is_bot, is_customer, ConversationHandlers};
pub use ncco::{
    inbound_message_ncco, voice_event_ncco, CallTarget, Ncco, NccoAction, VoiceAnswer, VoiceAnswerError,
};
