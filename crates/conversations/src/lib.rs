//! Client for the conversation service REST API.

mod client;
mod error;
pub mod models;

pub use client::ConversationClient;
pub use error::{ConversationError, ConversationResult};
pub use models::{
    AsrRequest, Conversation, ConversationEvent, JoinMemberRequest, Member, MemberEmbedded,
    MemberUser, MessagingChannel, NewEvent, UserPatch,
};
