//! Call control objects returned from the voice webhooks.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;
use tracing::{debug, info};

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum ConnectEndpoint {
    Phone { number: String },
    App { user: String },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DtmfSettings {
    pub max_digits: u8,
    pub submit_on_hash: bool,
    pub time_out: u32,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "action", rename_all = "lowercase")]
pub enum NccoAction {
    Talk {
        text: String,
        #[serde(rename = "bargeIn", skip_serializing_if = "Option::is_none")]
        barge_in: Option<bool>,
    },
    Conversation {
        name: String,
    },
    Connect {
        endpoint: Vec<ConnectEndpoint>,
    },
    Input {
        #[serde(rename = "type")]
        kind: Vec<String>,
        dtmf: DtmfSettings,
    },
    Message {
        conversation_name: String,
        user: String,
        geo: String,
    },
}

impl NccoAction {
    pub fn talk(text: impl Into<String>) -> Self {
        Self::Talk {
            text: text.into(),
            barge_in: None,
        }
    }
}

pub type Ncco = Vec<NccoAction>;

/// Target encoded in a server call's `custom_data`.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(tag = "callType", rename_all = "lowercase")]
pub enum CallTarget {
    App { username: String },
    Phone { number: String },
    Conversation { name: String },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum VoiceAnswer {
    /// Call placed from a client SDK.
    ServerCall { from_user: String, target: CallTarget },
    /// PSTN call to the application's number.
    InboundCall { from: String, to: String },
}

#[derive(Debug, Error)]
pub enum VoiceAnswerError {
    #[error("answer payload must be a JSON object")]
    NotAnObject,
    #[error("server call is missing {0}")]
    MissingField(&'static str),
    #[error("invalid custom_data: {0}")]
    InvalidCustomData(#[source] serde_json::Error),
    #[error("payload is neither a server call nor an inbound call")]
    Unrecognised,
}

fn string_field<'a>(payload: &'a Value, field: &str) -> Option<&'a str> {
    payload.get(field).and_then(Value::as_str)
}

impl VoiceAnswer {
    pub fn from_value(payload: &Value) -> Result<Self, VoiceAnswerError> {
        if !payload.is_object() {
            return Err(VoiceAnswerError::NotAnObject);
        }

        if let Some(from_user) = string_field(payload, "from_user") {
            let custom_data = string_field(payload, "custom_data")
                .ok_or(VoiceAnswerError::MissingField("custom_data"))?;
            let target = serde_json::from_str::<CallTarget>(custom_data)
                .map_err(VoiceAnswerError::InvalidCustomData)?;
            return Ok(Self::ServerCall {
                from_user: from_user.to_string(),
                target,
            });
        }

        match (string_field(payload, "from"), string_field(payload, "to")) {
            (Some(from), Some(to)) => Ok(Self::InboundCall {
                from: from.to_string(),
                to: to.to_string(),
            }),
            _ => Err(VoiceAnswerError::Unrecognised),
        }
    }

    pub fn ncco(&self) -> Ncco {
        match self {
            Self::ServerCall { target, from_user } => {
                info!(from_user, "server call received");
                server_call_ncco(target)
            }
            Self::InboundCall { from, to } => {
                info!(from, to, "inbound call received");
                vec![
                    NccoAction::Talk {
                        text: "Insert the conversation code followed by #".to_string(),
                        barge_in: Some(true),
                    },
                    NccoAction::Input {
                        kind: vec!["dtmf".to_string()],
                        dtmf: DtmfSettings {
                            max_digits: 8,
                            submit_on_hash: true,
                            time_out: 10,
                        },
                    },
                ]
            }
        }
    }
}

fn server_call_ncco(target: &CallTarget) -> Ncco {
    match target {
        CallTarget::Conversation { name } => vec![
            NccoAction::talk("Hello inapp user, connecting you now"),
            NccoAction::Conversation { name: name.clone() },
        ],
        CallTarget::Phone { number } => vec![
            NccoAction::talk("Hello inapp user, connecting you now, please wait."),
            NccoAction::Connect {
                endpoint: vec![ConnectEndpoint::Phone {
                    number: number.clone(),
                }],
            },
        ],
        CallTarget::App { username } => vec![
            NccoAction::talk("Connecting you now, please wait."),
            NccoAction::Connect {
                endpoint: vec![ConnectEndpoint::App {
                    user: username.clone(),
                }],
            },
        ],
    }
}

/// Builds the follow-up NCCO for a voice event; only DTMF input produces one.
pub fn voice_event_ncco(payload: &Value) -> Option<Ncco> {
    let digits = payload
        .get("dtmf")
        .and_then(|dtmf| dtmf.get("digits"))
        .and_then(Value::as_str)
        .filter(|digits| !digits.is_empty())?;

    debug!(digits, "connecting caller to conversation");
    Some(vec![
        NccoAction::talk(format!(
            "You are getting connected to the conversation named {digits}"
        )),
        NccoAction::Conversation {
            name: digits.to_string(),
        },
    ])
}

/// Channels whose inbound messages are routed into a conversation.
pub const MESSAGE_CHANNELS: [&str; 3] = ["sms", "viber_service", "messenger"];

/// Routes an inbound message into the conversation named by the first word
/// of its text. Returns `None` for unsupported channels.
pub fn inbound_message_ncco(payload: &Value) -> Option<Ncco> {
    let channel = string_field(payload, "channel")
        .filter(|channel| MESSAGE_CHANNELS.contains(channel))?;
    let from = string_field(payload, "from").unwrap_or_default();
    let conversation_name = string_field(payload, "text")
        .and_then(|text| text.split_whitespace().next())
        .unwrap_or_default();

    info!(channel, from, conversation_name, "inbound message received");
    Some(vec![NccoAction::Message {
        conversation_name: conversation_name.to_string(),
        user: format!("{from} ({channel})"),
        geo: "us-2".to_string(),
    }])
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn phone_server_call_connects_number() {
        let answer = VoiceAnswer::from_value(&json!({
            "from_user": "alice",
            "custom_data": "{\"callType\":\"phone\",\"number\":\"447700900000\"}"
        }))
        .unwrap();

        assert_eq!(
            serde_json::to_value(answer.ncco()).unwrap(),
            json!([
                {"action": "talk", "text": "Hello inapp user, connecting you now, please wait."},
                {"action": "connect", "endpoint": [{"type": "phone", "number": "447700900000"}]}
            ])
        );
    }

    #[test]
    fn app_and_conversation_targets() {
        let app = VoiceAnswer::from_value(&json!({
            "from_user": "alice",
            "custom_data": "{\"callType\":\"app\",\"username\":\"bob\"}"
        }))
        .unwrap();
        assert_eq!(
            serde_json::to_value(app.ncco()).unwrap()[1],
            json!({"action": "connect", "endpoint": [{"type": "app", "user": "bob"}]})
        );

        let conversation = VoiceAnswer::from_value(&json!({
            "from_user": "alice",
            "custom_data": "{\"callType\":\"conversation\",\"name\":\"support\"}"
        }))
        .unwrap();
        assert_eq!(
            serde_json::to_value(conversation.ncco()).unwrap()[1],
            json!({"action": "conversation", "name": "support"})
        );
    }

    #[test]
    fn inbound_call_prompts_for_dtmf() {
        let answer = VoiceAnswer::from_value(&json!({
            "from": "447700900000",
            "to": "447700900001",
            "uuid": "abc"
        }))
        .unwrap();
        assert_eq!(
            serde_json::to_value(answer.ncco()).unwrap(),
            json!([
                {"action": "talk", "text": "Insert the conversation code followed by #", "bargeIn": true},
                {"action": "input", "type": ["dtmf"], "dtmf": {"maxDigits": 8, "submitOnHash": true, "timeOut": 10}}
            ])
        );
    }

    #[test]
    fn invalid_custom_data_is_rejected() {
        let err = VoiceAnswer::from_value(&json!({
            "from_user": "alice",
            "custom_data": "{\"callType\":\"fax\"}"
        }))
        .unwrap_err();
        assert!(matches!(err, VoiceAnswerError::InvalidCustomData(_)));

        let err = VoiceAnswer::from_value(&json!({"from_user": "alice"})).unwrap_err();
        assert!(matches!(err, VoiceAnswerError::MissingField("custom_data")));

        let err = VoiceAnswer::from_value(&json!({"uuid": "abc"})).unwrap_err();
        assert!(matches!(err, VoiceAnswerError::Unrecognised));
    }

    #[test]
    fn dtmf_digits_select_conversation() {
        let ncco = voice_event_ncco(&json!({"dtmf": {"digits": "1234", "timed_out": false}})).unwrap();
        assert_eq!(
            serde_json::to_value(ncco).unwrap()[1],
            json!({"action": "conversation", "name": "1234"})
        );
        assert!(voice_event_ncco(&json!({"status": "answered"})).is_none());
        assert!(voice_event_ncco(&json!({"dtmf": {"digits": ""}})).is_none());
    }

    #[test]
    fn inbound_sms_joins_conversation_named_by_first_word() {
        let ncco = inbound_message_ncco(&json!({
            "channel": "sms",
            "from": "447700900000",
            "text": "support please call me back"
        }))
        .unwrap();
        assert_eq!(
            serde_json::to_value(ncco).unwrap(),
            json!([{
                "action": "message",
                "conversation_name": "support",
                "user": "447700900000 (sms)",
                "geo": "us-2"
            }])
        );
    }

    #[test]
    fn inbound_messages_on_other_channels_are_ignored() {
        let viber = inbound_message_ncco(&json!({"channel": "viber_service", "from": "bob"})).unwrap();
        assert_eq!(
            serde_json::to_value(viber).unwrap()[0]["conversation_name"],
            json!("")
        );

        assert!(inbound_message_ncco(&json!({"channel": "whatsapp", "text": "hi"})).is_none());
        assert!(inbound_message_ncco(&json!({"text": "hi"})).is_none());
        assert!(inbound_message_ncco(&json!("sms")).is_none());
    }
}
