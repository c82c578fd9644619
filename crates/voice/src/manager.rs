use std::sync::Arc;
use std::time::Duration;

use callbridge_auth::CredentialExchange;
use callbridge_config::VoiceConfig;
use callbridge_store::{CallInfo, PreferenceKey, PreferenceStore};
use tokio::sync::{mpsc, watch};
use tracing::{debug, info, warn};

use crate::call::{CallSession, ConnectionState, DisconnectCause};
use crate::error::{VoiceError, VoiceResult};
use crate::events::VoiceEvent;
use crate::sdk::{ChannelType, LegStatus, SessionErrorReason, User, VoiceClient};
use crate::telephony::Telephony;

enum SlotClaim {
    Claimed,
    Duplicate,
    Busy(String),
}

/// Call context key naming the party an outbound call is placed to.
pub const CONTEXT_KEY_CALLEE: &str = "callee";

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SessionState {
    pub session_id: Option<String>,
    pub user: Option<User>,
}

impl SessionState {
    pub fn is_active(&self) -> bool {
        self.session_id.is_some()
    }
}

/// Owns the SDK session and the process-wide active call slot.
///
/// Every SDK callback and call verb is checked against the call in the slot;
/// anything addressed to another call is ignored. A disconnected call stays
/// in the slot for `disconnect_grace_millis` so observers can render the
/// outcome, then the slot is released.
pub struct VoiceClientManager {
    pub(crate) client: Arc<dyn VoiceClient>,
    pub(crate) telephony: Arc<dyn Telephony>,
    pub(crate) store: Arc<dyn PreferenceStore>,
    pub(crate) auth: Arc<dyn CredentialExchange>,
    pub(crate) config: VoiceConfig,
    active_call: Arc<watch::Sender<Option<CallSession>>>,
    pub(crate) session: watch::Sender<SessionState>,
}

impl VoiceClientManager {
    pub fn new(
        client: Arc<dyn VoiceClient>,
        telephony: Arc<dyn Telephony>,
        store: Arc<dyn PreferenceStore>,
        auth: Arc<dyn CredentialExchange>,
        config: VoiceConfig,
    ) -> Self {
        if let Err(err) = telephony.register_phone_account() {
            warn!(error = %err, "unable to register phone account");
        }

        let (active_call, _) = watch::channel(None);
        let (session, _) = watch::channel(SessionState::default());

        Self {
            client,
            telephony,
            store,
            auth,
            config,
            active_call: Arc::new(active_call),
            session,
        }
    }

    pub fn watch_active_call(&self) -> watch::Receiver<Option<CallSession>> {
        self.active_call.subscribe()
    }

    pub fn watch_session(&self) -> watch::Receiver<SessionState> {
        self.session.subscribe()
    }

    pub fn active_call(&self) -> Option<CallSession> {
        self.active_call.borrow().clone()
    }

    pub fn session_state(&self) -> SessionState {
        self.session.borrow().clone()
    }

    /// Feeds SDK callbacks into the manager until the channel closes.
    pub async fn run(&self, mut events: mpsc::Receiver<VoiceEvent>) {
        while let Some(event) = events.recv().await {
            self.handle_event(event).await;
        }
        debug!("voice event channel closed");
    }

    pub async fn handle_event(&self, event: VoiceEvent) {
        match event {
            VoiceEvent::SessionError(reason) => {
                warn!(reason = reason.message(), "session error");
                self.attempt_session_restoration(reason == SessionErrorReason::TokenExpired)
                    .await;
            }
            VoiceEvent::CallInvite {
                call_id,
                from,
                channel_type,
            } => self.on_call_invite(&call_id, &from, channel_type).await,
            VoiceEvent::LegStatus {
                call_id,
                leg_id,
                status,
            } => {
                debug!(call_id = %call_id, leg_id = %leg_id, ?status, "leg status updated");
                if status == LegStatus::Answered {
                    self.set_answered(&call_id);
                }
            }
            VoiceEvent::Hangup { call_id, reason } => {
                info!(call_id = %call_id, ?reason, "call hung up");
                self.clean_up(&call_id, DisconnectCause::from(reason)).await;
            }
            VoiceEvent::InviteCancel { call_id, reason } => {
                info!(call_id = %call_id, ?reason, "call invite cancelled");
                self.clean_up(&call_id, DisconnectCause::from(reason)).await;
            }
            VoiceEvent::Transfer {
                call_id,
                conversation_id,
            } => {
                info!(call_id = %call_id, conversation_id = %conversation_id, "call transferred");
                self.set_answered(&call_id);
            }
            VoiceEvent::MuteUpdate {
                call_id,
                leg_id,
                is_muted,
            } => {
                if call_id != leg_id {
                    return;
                }
                self.update_call(&call_id, |call| call.is_muted = is_muted);
            }
            VoiceEvent::DtmfReceived {
                call_id,
                leg_id,
                digits,
            } => {
                info!(call_id = %call_id, leg_id = %leg_id, digits = %digits, "dtmf received");
            }
            VoiceEvent::MediaDisconnect { call_id } => {
                warn!(call_id = %call_id, "media disconnected");
                self.clean_up(&call_id, DisconnectCause::Error).await;
            }
            VoiceEvent::MediaReconnecting { call_id } => {
                self.update_call(&call_id, |call| call.state = ConnectionState::Initializing);
            }
            VoiceEvent::MediaReconnected { call_id } => {
                self.update_call(&call_id, |call| call.state = ConnectionState::Active);
            }
        }
    }

    async fn on_call_invite(&self, call_id: &str, from: &str, channel_type: ChannelType) {
        info!(call_id, from, ?channel_type, "incoming call");

        match self.claim_slot(CallSession::inbound(call_id, from)) {
            SlotClaim::Claimed => {}
            SlotClaim::Duplicate => {
                debug!(call_id, "duplicate invite for the active call");
                return;
            }
            SlotClaim::Busy(active) => {
                warn!(call_id, active_call = %active, "rejecting invite while a call is active");
                if let Err(err) = self.client.reject(call_id).await {
                    warn!(call_id, error = %err, "failed to reject invite");
                }
                return;
            }
        }

        if let Err(err) = self.telephony.start_incoming_call(call_id, from, channel_type) {
            warn!(call_id, error = %err, "incoming call error, rejecting");
            self.vacate_slot(call_id);
            if let Err(err) = self.client.reject(call_id).await {
                debug!(call_id, error = %err, "reject after telephony failure failed");
            }
            return;
        }
        self.persist_call(call_id, from).await;
    }

    /// Claims the slot for an outgoing call the SDK has already placed.
    ///
    /// When another call took the slot while the call was being placed, the
    /// new call is hung up and never reaches telephony.
    pub(crate) async fn place_outgoing_call(
        &self,
        call_id: &str,
        callee: &str,
        reconnected: bool,
    ) -> VoiceResult<()> {
        match self.claim_slot(CallSession::outbound(call_id, callee, reconnected)) {
            SlotClaim::Claimed => {}
            SlotClaim::Duplicate => return Ok(()),
            SlotClaim::Busy(active) => {
                warn!(call_id, active_call = %active, "slot taken while dialing, hanging up");
                if let Err(err) = self.client.hangup(call_id).await {
                    debug!(call_id, error = %err, "hangup of displaced call failed");
                }
                return Err(VoiceError::CallInProgress(active));
            }
        }

        if let Err(err) = self
            .telephony
            .start_outgoing_call(call_id, callee, reconnected)
        {
            warn!(call_id, error = %err, "outgoing call error, hanging up");
            self.vacate_slot(call_id);
            if let Err(err) = self.client.hangup(call_id).await {
                debug!(call_id, error = %err, "hangup after telephony failure failed");
            }
            return Err(VoiceError::Telephony(err));
        }
        self.persist_call(call_id, callee).await;
        Ok(())
    }

    pub(crate) fn live_call(&self) -> Option<CallSession> {
        self.active_call.borrow().as_ref().filter(|call| call.is_live()).cloned()
    }

    /// The live call in the slot, if it is `call_id`.
    pub(crate) fn take_if_active(&self, call_id: &str) -> Option<CallSession> {
        self.live_call().filter(|call| call.call_id == call_id)
    }

    /// Puts `call` in the slot unless another live call holds it. Check and
    /// write happen under the slot lock.
    fn claim_slot(&self, call: CallSession) -> SlotClaim {
        let mut claim = SlotClaim::Claimed;
        self.active_call.send_if_modified(|slot| {
            match slot.as_ref().filter(|active| active.is_live()) {
                Some(active) if active.call_id == call.call_id => {
                    claim = SlotClaim::Duplicate;
                    false
                }
                Some(active) => {
                    claim = SlotClaim::Busy(active.call_id.clone());
                    false
                }
                None => {
                    info!(call_id = %call.call_id, direction = ?call.direction, "call placed in active slot");
                    *slot = Some(call);
                    true
                }
            }
        });
        claim
    }

    /// Drops `call_id` from the slot without a grace period.
    fn vacate_slot(&self, call_id: &str) {
        self.active_call.send_if_modified(|slot| {
            let matches = slot.as_ref().is_some_and(|call| call.call_id == call_id);
            if matches {
                *slot = None;
            }
            matches
        });
    }

    async fn persist_call(&self, call_id: &str, display_name: &str) {
        let info = CallInfo {
            call_id: call_id.to_string(),
            caller_display_name: Some(display_name.to_string()),
        };
        if let Err(err) = self.store.set_last_call(Some(info)).await {
            warn!(call_id, error = %err, "unable to persist call metadata");
        }
    }

    /// Applies `update` to the live call `call_id`; returns whether it matched.
    pub(crate) fn update_call(&self, call_id: &str, update: impl FnOnce(&mut CallSession)) -> bool {
        let updated = self.active_call.send_if_modified(|slot| match slot {
            Some(call) if call.call_id == call_id && call.is_live() => {
                update(call);
                true
            }
            _ => false,
        });
        if !updated {
            debug!(call_id, "ignoring update for inactive call");
        }
        updated
    }

    pub(crate) fn set_answered(&self, call_id: &str) {
        self.update_call(call_id, |call| call.state = ConnectionState::Active);
    }

    /// Disconnects the live call `call_id` and releases the slot after the grace delay.
    pub(crate) async fn clean_up(&self, call_id: &str, cause: DisconnectCause) {
        let disconnected = self.update_call(call_id, |call| {
            call.state = ConnectionState::Disconnected(cause);
        });
        if !disconnected {
            return;
        }

        info!(call_id, %cause, "call disconnected");
        self.telephony.end_call(call_id, cause);

        let grace = Duration::from_millis(self.config.disconnect_grace_millis);
        if grace.is_zero() {
            release_slot(&self.active_call, self.store.as_ref(), call_id).await;
            return;
        }

        let slot = Arc::clone(&self.active_call);
        let store = Arc::clone(&self.store);
        let call_id = call_id.to_string();
        tokio::spawn(async move {
            tokio::time::sleep(grace).await;
            release_slot(&slot, store.as_ref(), &call_id).await;
        });
    }

    /// Ends a connection the SDK no longer knows about.
    pub(crate) fn destroy_connection(&self, call_id: &str) {
        debug!(call_id, "connection is no longer active, destroying it");
        self.telephony.end_call(call_id, DisconnectCause::Local);
    }

    pub(crate) async fn stored(&self, key: PreferenceKey) -> Option<String> {
        match self.store.get(key).await {
            Ok(value) => value,
            Err(err) => {
                warn!(%key, error = %err, "unable to read preference");
                None
            }
        }
    }
}

/// Empties the slot if it still holds the disconnected call `call_id`.
async fn release_slot(
    slot: &watch::Sender<Option<CallSession>>,
    store: &dyn PreferenceStore,
    call_id: &str,
) {
    let released = slot.send_if_modified(|current| {
        let matches = current
            .as_ref()
            .is_some_and(|call| call.call_id == call_id && !call.is_live());
        if matches {
            *current = None;
        }
        matches
    });

    if released {
        debug!(call_id, "active call slot released");
        if let Err(err) = store.set_last_call(None).await {
            warn!(call_id, error = %err, "unable to clear call metadata");
        }
    }
}
