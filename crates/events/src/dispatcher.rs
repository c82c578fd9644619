use std::sync::Arc;

use async_trait::async_trait;
use serde_json::Value;
use tracing::{debug, error, info};

use crate::error::{EventSchemaError, HandlerError};
use crate::event::{classify, Classified, RtcEvent, RtcEventKind};

/// Reacts to validated RTC events.
#[async_trait]
pub trait RtcEventHandler: Send + Sync {
    async fn handle(&self, event: &RtcEvent) -> Result<(), HandlerError>;
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DispatchOutcome {
    Handled(RtcEventKind),
    Ignored(String),
}

/// Routes webhook payloads to a handler by their `type`.
#[derive(Clone)]
pub struct EventDispatcher {
    handler: Arc<dyn RtcEventHandler>,
}

impl EventDispatcher {
    pub fn new(handler: Arc<dyn RtcEventHandler>) -> Self {
        Self { handler }
    }

    /// Handler failures are logged and do not fail the dispatch.
    pub async fn dispatch(&self, payload: Value) -> Result<DispatchOutcome, EventSchemaError> {
        let (kind, payload) = match classify(payload)? {
            Classified::Known(kind, payload) => (kind, payload),
            Classified::Unknown(event_type) => {
                debug!(event_type, "ignoring unknown event type");
                return Ok(DispatchOutcome::Ignored(event_type));
            }
        };

        let event = RtcEvent::parse(kind, payload)?;
        let envelope = event.envelope();
        info!(
            event_type = %kind,
            event_id = ?envelope.id,
            conversation_id = envelope.conversation.unwrap_or_default(),
            "rtc event received"
        );

        if let Err(err) = self.handler.handle(&event).await {
            error!(event_type = %kind, error = %err, "rtc event handler failed");
        }

        Ok(DispatchOutcome::Handled(kind))
    }
}
