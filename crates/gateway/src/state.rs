use std::sync::Arc;

use callbridge_conversations::ConversationClient;
use callbridge_events::{ConversationHandlers, EventDispatcher};

/// Shared state of the webhook router.
#[derive(Clone)]
pub struct GatewayState {
    pub dispatcher: EventDispatcher,
    pub conversations: ConversationClient,
    /// Serve `GET /admin` and `GET /user/{name}`.
    pub token_endpoints: bool,
}

impl GatewayState {
    pub fn new(dispatcher: EventDispatcher, conversations: ConversationClient) -> Self {
        Self {
            dispatcher,
            conversations,
            token_endpoints: false,
        }
    }

    pub fn with_token_endpoints(mut self, enabled: bool) -> Self {
        self.token_endpoints = enabled;
        self
    }

    /// Dispatches RTC events to [`ConversationHandlers`] backed by `conversations`.
    pub fn with_conversation_handlers(
        conversations: ConversationClient,
        bot_name: impl Into<String>,
    ) -> Self {
        let handlers = ConversationHandlers::new(conversations.clone(), bot_name);
        Self::new(EventDispatcher::new(Arc::new(handlers)), conversations)
    }
}
