//! Key/value preference storage for session credentials and call metadata.
//!
//! Two backends implement [`PreferenceStore`]: a sqlite table managed through
//! `sqlx` and an in-memory map used by tests and short-lived tools.

pub mod connection;
pub mod error;
pub mod keys;
pub mod memory;
pub mod sqlite;

pub use connection::prepare_store;
pub use error::{StoreError, StoreResult};
pub use keys::{CallInfo, PreferenceKey, SessionCredentials};
pub use memory::MemoryPreferenceStore;
pub use sqlite::SqlitePreferenceStore;

use async_trait::async_trait;

/// Persistent string preferences keyed by [`PreferenceKey`].
#[async_trait]
pub trait PreferenceStore: Send + Sync {
    async fn get(&self, key: PreferenceKey) -> StoreResult<Option<String>>;

    /// Stores `value` under `key`; `None` removes the entry.
    async fn set(&self, key: PreferenceKey, value: Option<String>) -> StoreResult<()>;

    async fn remove(&self, key: PreferenceKey) -> StoreResult<()> {
        self.set(key, None).await
    }

    async fn clear(&self) -> StoreResult<()>;

    async fn credentials(&self) -> StoreResult<SessionCredentials> {
        Ok(SessionCredentials {
            auth_token: self.get(PreferenceKey::AuthToken).await?,
            refresh_token: self.get(PreferenceKey::RefreshToken).await?,
            device_id: self.get(PreferenceKey::DeviceId).await?,
            push_token: self.get(PreferenceKey::PushToken).await?,
        })
    }

    async fn save_credentials(&self, credentials: &SessionCredentials) -> StoreResult<()> {
        self.set(PreferenceKey::AuthToken, credentials.auth_token.clone())
            .await?;
        self.set(PreferenceKey::RefreshToken, credentials.refresh_token.clone())
            .await?;
        self.set(PreferenceKey::DeviceId, credentials.device_id.clone())
            .await?;
        self.set(PreferenceKey::PushToken, credentials.push_token.clone())
            .await
    }

    /// Drops the auth and refresh tokens but keeps device registration data.
    async fn clear_session_tokens(&self) -> StoreResult<()> {
        self.remove(PreferenceKey::AuthToken).await?;
        self.remove(PreferenceKey::RefreshToken).await
    }

    async fn last_call(&self) -> StoreResult<Option<CallInfo>> {
        let Some(call_id) = self.get(PreferenceKey::CallId).await? else {
            return Ok(None);
        };
        let caller_display_name = self.get(PreferenceKey::CallerDisplayName).await?;
        Ok(Some(CallInfo {
            call_id,
            caller_display_name,
        }))
    }

    async fn set_last_call(&self, call: Option<CallInfo>) -> StoreResult<()> {
        match call {
            Some(info) => {
                self.set(PreferenceKey::CallId, Some(info.call_id)).await?;
                self.set(PreferenceKey::CallerDisplayName, info.caller_display_name)
                    .await
            }
            None => {
                self.remove(PreferenceKey::CallId).await?;
                self.remove(PreferenceKey::CallerDisplayName).await
            }
        }
    }
}
