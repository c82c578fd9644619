use callbridge_auth::AuthError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConversationError {
    #[error("unable to obtain admin token: {0}")]
    Token(#[from] AuthError),
    #[error("http error: {0}")]
    Http(#[from] reqwest::Error),
    #[error("{method} {path} returned {status}: {body}")]
    Status {
        method: String,
        path: String,
        status: u16,
        body: String,
    },
    #[error("unexpected response body: {0}")]
    Decode(#[from] serde_json::Error),
}

pub type ConversationResult<T> = Result<T, ConversationError>;
