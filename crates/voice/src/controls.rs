use tracing::{info, warn};

use crate::call::{CallSession, DisconnectCause};
use crate::error::{VoiceError, VoiceResult};
use crate::manager::{VoiceClientManager, CONTEXT_KEY_CALLEE};
use crate::sdk::CallContext;
use crate::telephony::TelephonyAction;

impl VoiceClientManager {
    /// Places a server call; `context[CONTEXT_KEY_CALLEE]` names the callee
    /// shown in the call UI.
    pub async fn start_outbound_call(&self, context: Option<CallContext>) -> VoiceResult<String> {
        if let Some(active) = self.live_call() {
            return Err(VoiceError::CallInProgress(active.call_id));
        }

        let callee = context
            .as_ref()
            .and_then(|context| context.get(CONTEXT_KEY_CALLEE))
            .cloned()
            .unwrap_or_else(|| self.config.default_callee.clone());

        let call_id = self.client.server_call(context).await?;
        info!(call_id = %call_id, callee = %callee, "outbound call started");
        self.place_outgoing_call(&call_id, &callee, false).await?;
        Ok(call_id)
    }

    pub async fn answer_call(&self, call_id: &str) -> VoiceResult<()> {
        if self.take_if_active(call_id).is_none() {
            self.destroy_connection(call_id);
            return Err(VoiceError::NotActive(call_id.to_string()));
        }

        match self.client.answer(call_id).await {
            Ok(()) => {
                info!(call_id, "answered call");
                self.set_answered(call_id);
                Ok(())
            }
            Err(err) => {
                warn!(call_id, error = %err, "error answering call");
                self.clean_up(call_id, DisconnectCause::Error).await;
                Err(err.into())
            }
        }
    }

    pub async fn reject_call(&self, call_id: &str) -> VoiceResult<()> {
        if self.take_if_active(call_id).is_none() {
            self.destroy_connection(call_id);
            return Err(VoiceError::NotActive(call_id.to_string()));
        }

        match self.client.reject(call_id).await {
            Ok(()) => {
                info!(call_id, "rejected call");
                self.clean_up(call_id, DisconnectCause::Rejected).await;
                Ok(())
            }
            Err(err) => {
                warn!(call_id, error = %err, "error rejecting call");
                self.clean_up(call_id, DisconnectCause::Error).await;
                Err(err.into())
            }
        }
    }

    /// On success the call stays up until the SDK reports the hangup.
    pub async fn hangup_call(&self, call_id: &str) -> VoiceResult<()> {
        if self.take_if_active(call_id).is_none() {
            self.destroy_connection(call_id);
            return Err(VoiceError::NotActive(call_id.to_string()));
        }

        match self.client.hangup(call_id).await {
            Ok(()) => {
                info!(call_id, "hung up call");
                Ok(())
            }
            Err(err) => {
                // no hangup callback follows a failed hangup
                warn!(call_id, error = %err, "error hanging up call");
                self.clean_up(call_id, DisconnectCause::Local).await;
                Err(err.into())
            }
        }
    }

    pub async fn mute_call(&self, call_id: &str) -> VoiceResult<()> {
        let call = self.require_active(call_id)?;
        if call.is_muted {
            return Ok(());
        }
        self.client.mute(call_id).await?;
        info!(call_id, "muted call");
        self.update_call(call_id, |call| call.is_muted = true);
        Ok(())
    }

    pub async fn unmute_call(&self, call_id: &str) -> VoiceResult<()> {
        let call = self.require_active(call_id)?;
        if !call.is_muted {
            return Ok(());
        }
        self.client.unmute(call_id).await?;
        info!(call_id, "unmuted call");
        self.update_call(call_id, |call| call.is_muted = false);
        Ok(())
    }

    /// Earmuff then mute.
    pub async fn hold_call(&self, call_id: &str) -> VoiceResult<()> {
        let call = self.require_active(call_id)?;
        if call.is_on_hold {
            return Ok(());
        }
        self.client.enable_earmuff(call_id).await?;
        self.client.mute(call_id).await?;
        info!(call_id, "call put on hold");
        self.update_call(call_id, |call| call.is_on_hold = true);
        Ok(())
    }

    /// Unmute then disable earmuff.
    pub async fn unhold_call(&self, call_id: &str) -> VoiceResult<()> {
        let call = self.require_active(call_id)?;
        if !call.is_on_hold {
            return Ok(());
        }
        self.client.unmute(call_id).await?;
        self.client.disable_earmuff(call_id).await?;
        info!(call_id, "call removed from hold");
        self.update_call(call_id, |call| call.is_on_hold = false);
        Ok(())
    }

    pub async fn enable_noise_suppression(&self, call_id: &str) -> VoiceResult<()> {
        let call = self.require_active(call_id)?;
        if call.is_noise_suppression_enabled {
            return Ok(());
        }
        self.client.enable_noise_suppression(call_id).await?;
        info!(call_id, "enabled noise suppression");
        self.update_call(call_id, |call| call.is_noise_suppression_enabled = true);
        Ok(())
    }

    pub async fn disable_noise_suppression(&self, call_id: &str) -> VoiceResult<()> {
        let call = self.require_active(call_id)?;
        if !call.is_noise_suppression_enabled {
            return Ok(());
        }
        self.client.disable_noise_suppression(call_id).await?;
        info!(call_id, "disabled noise suppression");
        self.update_call(call_id, |call| call.is_noise_suppression_enabled = false);
        Ok(())
    }

    pub async fn send_dtmf(&self, call_id: &str, digits: &str) -> VoiceResult<()> {
        self.require_active(call_id)?;
        self.client.send_dtmf(call_id, digits).await?;
        info!(call_id, digits, "sent dtmf");
        Ok(())
    }

    /// Routes an action from the OS call UI to the matching call verb.
    pub async fn handle_telephony_action(
        &self,
        call_id: &str,
        action: TelephonyAction,
    ) -> VoiceResult<()> {
        match action {
            TelephonyAction::Answer => self.answer_call(call_id).await,
            TelephonyAction::Reject => self.reject_call(call_id).await,
            TelephonyAction::Disconnect => self.hangup_call(call_id).await,
            TelephonyAction::AudioStateChanged { muted } => {
                let call = self.require_active(call_id)?;
                match (muted, call.is_muted) {
                    (true, false) => self.mute_call(call_id).await,
                    (false, true) => self.unmute_call(call_id).await,
                    _ => Ok(()),
                }
            }
            TelephonyAction::PlayDtmf(digit) => self.send_dtmf(call_id, &digit.to_string()).await,
            TelephonyAction::Hold => {
                if self.require_active(call_id)?.is_on_hold {
                    self.unhold_call(call_id).await
                } else {
                    self.hold_call(call_id).await
                }
            }
        }
    }

    fn require_active(&self, call_id: &str) -> VoiceResult<CallSession> {
        self.take_if_active(call_id)
            .ok_or_else(|| VoiceError::NotActive(call_id.to_string()))
    }
}
