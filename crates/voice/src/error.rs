use callbridge_auth::AuthError;
use callbridge_store::StoreError;
use thiserror::Error;

/// Failure reported by the voice SDK.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{0}")]
pub struct SdkError(pub String);

impl SdkError {
    pub fn new(message: impl Into<String>) -> Self {
        Self(message.into())
    }
}

/// The OS telephony framework refused to start a call.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{0}")]
pub struct TelephonyError(pub String);

#[derive(Debug, Error)]
pub enum VoiceError {
    #[error("voice sdk error: {0}")]
    Sdk(#[from] SdkError),
    #[error("telephony error: {0}")]
    Telephony(#[from] TelephonyError),
    #[error("auth error: {0}")]
    Auth(#[from] AuthError),
    #[error("preference store error: {0}")]
    Store(#[from] StoreError),
    #[error("no active session")]
    NoSession,
    #[error("call {0} is already in progress")]
    CallInProgress(String),
    #[error("call {0} is not the active call")]
    NotActive(String),
}

pub type VoiceResult<T> = Result<T, VoiceError>;
