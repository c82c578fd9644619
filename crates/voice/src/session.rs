use callbridge_store::PreferenceKey;
use tracing::{debug, info, warn};

use crate::call::DisconnectCause;
use crate::error::{VoiceError, VoiceResult};
use crate::manager::{SessionState, VoiceClientManager};
use crate::sdk::PushType;

impl VoiceClientManager {
    /// Creates an SDK session with `token`.
    ///
    /// A user-initiated login first unregisters any device left behind by a
    /// previous user; session restoration skips that step.
    pub async fn login(&self, token: &str, user_initiated: bool) -> VoiceResult<String> {
        if user_initiated {
            self.unregister_existing_device_if_needed().await;
        }
        self.create_session(token).await
    }

    /// Exchanges a device login code for tokens, then logs in.
    pub async fn login_with_code(&self, code: &str) -> VoiceResult<String> {
        let tokens = self.auth.login(code).await?;
        self.store
            .set(PreferenceKey::RefreshToken, Some(tokens.refresh_token))
            .await?;
        self.login(&tokens.vonage_token, true).await
    }

    /// Unregisters the push device and deletes the session.
    ///
    /// The local session survives if the SDK refuses to delete it.
    pub async fn logout(&self) -> VoiceResult<()> {
        self.unregister_device_token().await;
        self.client.delete_session().await?;
        info!("logged out");
        self.clear_session().await;
        Ok(())
    }

    /// Stores a new push token and registers it when a session is open.
    pub async fn set_push_token(&self, push_token: &str) -> VoiceResult<()> {
        self.store
            .set(PreferenceKey::PushToken, Some(push_token.to_string()))
            .await?;
        let session_active = self.session.borrow().is_active();
        if session_active {
            self.register_device_push_token().await;
        }
        Ok(())
    }

    /// Forwards an incoming-call push to the SDK, restoring the session first.
    pub async fn process_push(&self, payload: &str) -> VoiceResult<()> {
        if self.restore_session_if_needed().await.is_none() {
            warn!("unable to restore session, dropping push");
            return Err(VoiceError::NoSession);
        }

        match self.client.push_notification_type(payload) {
            PushType::IncomingCall => {
                debug!("processing incoming call push");
                self.client.process_push_call_invite(payload).await?;
            }
            PushType::Other => debug!("ignoring push that is not a call invite"),
        }
        Ok(())
    }

    /// The current session id, restoring one from stored credentials if needed.
    ///
    /// Tries the stored auth token, otherwise the refresh token.
    pub async fn restore_session_if_needed(&self) -> Option<String> {
        let current = self.session.borrow().session_id.clone();
        if let Some(session_id) = current {
            return Some(session_id);
        }

        if let Some(token) = self.stored(PreferenceKey::AuthToken).await {
            return self.restore_session_with_token(&token).await;
        }
        if let Some(refresh_token) = self.stored(PreferenceKey::RefreshToken).await {
            return self.restore_session_with_refresh_token(&refresh_token).await;
        }

        debug!("no stored credentials for session restoration");
        None
    }

    /// Recovers from a session error: the stored auth token first (unless it
    /// expired), then one refresh. Clears the session when both fail.
    pub(crate) async fn attempt_session_restoration(&self, skip_auth_token: bool) -> bool {
        if !skip_auth_token {
            if let Some(token) = self.stored(PreferenceKey::AuthToken).await {
                if self.restore_session_with_token(&token).await.is_some() {
                    return true;
                }
            }
        }

        if let Some(refresh_token) = self.stored(PreferenceKey::RefreshToken).await {
            if self
                .restore_session_with_refresh_token(&refresh_token)
                .await
                .is_some()
            {
                return true;
            }
        }

        warn!("all reconnection attempts failed, clearing session");
        self.clear_session().await;
        false
    }

    async fn restore_session_with_token(&self, token: &str) -> Option<String> {
        match self.login(token, false).await {
            Ok(session_id) => {
                info!(session_id = %session_id, "session restored");
                Some(session_id)
            }
            Err(err) => {
                warn!(error = %err, "failed to restore session");
                None
            }
        }
    }

    async fn restore_session_with_refresh_token(&self, refresh_token: &str) -> Option<String> {
        let tokens = match self.auth.refresh(refresh_token).await {
            Ok(tokens) => tokens,
            Err(err) => {
                warn!(error = %err, "token refresh failed");
                return None;
            }
        };

        if let Err(err) = self
            .store
            .set(PreferenceKey::RefreshToken, Some(tokens.refresh_token))
            .await
        {
            warn!(error = %err, "unable to store refresh token");
        }
        self.restore_session_with_token(&tokens.vonage_token).await
    }

    async fn create_session(&self, token: &str) -> VoiceResult<String> {
        let session_id = self.client.create_session(token).await?;
        info!(session_id = %session_id, "session created");

        self.register_device_push_token().await;
        self.store
            .set(PreferenceKey::AuthToken, Some(token.to_string()))
            .await?;

        let user = match self.client.get_user("me").await {
            Ok(user) => Some(user),
            Err(err) => {
                warn!(error = %err, "unable to fetch current user");
                None
            }
        };

        self.reconnect_call().await;
        self.session.send_replace(SessionState {
            session_id: Some(session_id.clone()),
            user,
        });
        Ok(session_id)
    }

    /// Drops the session and tokens; a live call ends as missed.
    pub(crate) async fn clear_session(&self) {
        self.session.send_replace(SessionState::default());
        if let Err(err) = self.store.clear_session_tokens().await {
            warn!(error = %err, "unable to clear session tokens");
        }
        if let Some(call) = self.live_call() {
            self.clean_up(&call.call_id, DisconnectCause::Missed).await;
        }
    }

    async fn register_device_push_token(&self) {
        let Some(push_token) = self.stored(PreferenceKey::PushToken).await else {
            debug!("no push token yet, skipping device registration");
            return;
        };

        match self.client.register_device_push_token(&push_token).await {
            Ok(device_id) => {
                info!(device_id = %device_id, "registered push token");
                if let Err(err) = self.store.set(PreferenceKey::DeviceId, Some(device_id)).await {
                    warn!(error = %err, "unable to store device id");
                }
            }
            Err(err) => warn!(error = %err, "failed to register push token"),
        }
    }

    /// The device id is forgotten whether or not the SDK call succeeds.
    async fn unregister_device_token(&self) {
        let Some(device_id) = self.stored(PreferenceKey::DeviceId).await else {
            debug!("no device id to unregister");
            return;
        };

        match self.client.unregister_device_push_token(&device_id).await {
            Ok(()) => info!(device_id = %device_id, "push token unregistered"),
            Err(err) => warn!(device_id = %device_id, error = %err, "failed to unregister push token"),
        }
        self.forget_device().await;
    }

    /// Uses a temporary session with the stored auth token to unregister a
    /// previously registered device.
    async fn unregister_existing_device_if_needed(&self) {
        let Some(device_id) = self.stored(PreferenceKey::DeviceId).await else {
            return;
        };
        let Some(auth_token) = self.stored(PreferenceKey::AuthToken).await else {
            debug!(device_id = %device_id, "no auth token for cleanup, forgetting stale device");
            self.forget_device().await;
            return;
        };

        debug!(device_id = %device_id, "cleaning up existing device");
        if let Err(err) = self.client.create_session(&auth_token).await {
            warn!(error = %err, "cleanup session failed");
            self.forget_device().await;
            return;
        }

        self.unregister_device_token().await;
        if let Err(err) = self.client.delete_session().await {
            warn!(error = %err, "failed to delete cleanup session");
        }
    }

    async fn forget_device(&self) {
        if let Err(err) = self.store.remove(PreferenceKey::DeviceId).await {
            warn!(error = %err, "unable to clear device id");
        }
    }

    /// Reconnects the call persisted before the previous session ended.
    async fn reconnect_call(&self) {
        let last_call = match self.store.last_call().await {
            Ok(Some(call)) => call,
            Ok(None) => return,
            Err(err) => {
                warn!(error = %err, "unable to read last call");
                return;
            }
        };

        if let Err(err) = self.client.reconnect_call(&last_call.call_id).await {
            warn!(call_id = %last_call.call_id, error = %err, "error reconnecting call");
            return;
        }
        info!(call_id = %last_call.call_id, "call reconnected");

        if self.live_call().is_some() {
            return;
        }
        let callee = last_call
            .caller_display_name
            .unwrap_or_else(|| self.config.default_callee.clone());
        if let Err(err) = self
            .place_outgoing_call(&last_call.call_id, &callee, true)
            .await
        {
            warn!(call_id = %last_call.call_id, error = %err, "unable to surface reconnected call");
        }
    }
}
