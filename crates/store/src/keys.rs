use std::fmt;
use std::str::FromStr;

use crate::error::StoreError;

/// Keys understood by the preference store.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum PreferenceKey {
    PushToken,
    DeviceId,
    AuthToken,
    RefreshToken,
    CallId,
    CallerDisplayName,
}

impl PreferenceKey {
    pub const ALL: [PreferenceKey; 6] = [
        PreferenceKey::PushToken,
        PreferenceKey::DeviceId,
        PreferenceKey::AuthToken,
        PreferenceKey::RefreshToken,
        PreferenceKey::CallId,
        PreferenceKey::CallerDisplayName,
    ];

    pub const fn as_str(self) -> &'static str {
        match self {
            PreferenceKey::PushToken => "PUSH_TOKEN",
            PreferenceKey::DeviceId => "DEVICE_ID",
            PreferenceKey::AuthToken => "AUTH_TOKEN",
            PreferenceKey::RefreshToken => "REFRESH_TOKEN",
            PreferenceKey::CallId => "CALL_ID",
            PreferenceKey::CallerDisplayName => "CALLER_DISPLAY_NAME",
        }
    }
}

impl fmt::Display for PreferenceKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for PreferenceKey {
    type Err = StoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        PreferenceKey::ALL
            .into_iter()
            .find(|key| key.as_str() == s)
            .ok_or_else(|| StoreError::UnknownKey(s.to_string()))
    }
}

/// Tokens and device registration data for the voice session.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SessionCredentials {
    pub auth_token: Option<String>,
    pub refresh_token: Option<String>,
    pub device_id: Option<String>,
    pub push_token: Option<String>,
}

/// Metadata of the most recent call, kept for reconnection after login.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CallInfo {
    pub call_id: String,
    pub caller_display_name: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn keys_round_trip_through_their_names() {
        for key in PreferenceKey::ALL {
            assert_eq!(key.as_str().parse::<PreferenceKey>().unwrap(), key);
        }
    }

    #[test]
    fn unknown_key_is_rejected() {
        let err = "SOMETHING_ELSE".parse::<PreferenceKey>().unwrap_err();
        assert!(matches!(err, StoreError::UnknownKey(name) if name == "SOMETHING_ELSE"));
    }
}
