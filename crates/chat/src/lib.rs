//! Read cache of one conversation: members by id and events ordered by id.
//!
//! [`ChatState::load`] rebuilds the cache from the conversation service and
//! [`ChatState::apply`] folds in events as they arrive.

mod state;
mod timeline;

pub use state::{ChatState, MemberState};
pub use timeline::{ChatLine, LineKind};

use callbridge_conversations::ConversationError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ChatError {
    #[error("unable to load conversation {cid}: {source}")]
    Load {
        cid: String,
        #[source]
        source: ConversationError,
    },
}
