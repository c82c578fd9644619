use callbridge_conversations::ConversationError;
use thiserror::Error;

/// A webhook payload that does not match the schema of its event type.
#[derive(Debug, Error)]
pub enum EventSchemaError {
    #[error("invalid event envelope: {source}")]
    Envelope {
        event_type: Option<String>,
        #[source]
        source: serde_json::Error,
    },
    #[error("invalid {event_type} event: {source}")]
    Body {
        event_type: String,
        #[source]
        source: serde_json::Error,
    },
}

impl EventSchemaError {
    pub fn event_type(&self) -> Option<&str> {
        match self {
            Self::Envelope { event_type, .. } => event_type.as_deref(),
            Self::Body { event_type, .. } => Some(event_type),
        }
    }
}

/// Failure while reacting to a well-formed event.
#[derive(Debug, Error)]
pub enum HandlerError {
    #[error("conversation service error: {0}")]
    Conversation(#[from] ConversationError),
    #[error("event has no {0}")]
    Missing(&'static str),
}
