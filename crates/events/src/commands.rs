//! `@` text commands understood in conversation messages.

use callbridge_conversations::NewEvent;
use serde_json::json;

/// A text command. Matching is on the exact first whitespace-separated token.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MessageCommand {
    Say { text: String },
    SayStop { say_id: String },
    Stream { url: String },
    StreamStop { play_id: String },
    Record,
    RecordStop { record_id: String },
    Transcribe,
    TranscribeStop { record_id: String },
    Asr { leg_id: String },
    AsrStop { leg_id: String },
    Push { user: String, text: String },
    /// A bare URL; recognised but no action is taken.
    Link,
}

impl MessageCommand {
    /// Returns `None` for plain text and for commands missing their argument.
    pub fn parse(text: &str) -> Option<Self> {
        let mut tokens = text.split_whitespace();
        let command = tokens.next()?;
        let mut arg = || tokens.next().map(str::to_owned);

        match command {
            "@tts" => {
                let rest = text
                    .split_whitespace()
                    .skip(1)
                    .collect::<Vec<_>>()
                    .join(" ");
                (!rest.is_empty()).then_some(Self::Say { text: rest })
            }
            "@tts-stop" => arg().map(|say_id| Self::SayStop { say_id }),
            "@stream" => arg().map(|url| Self::Stream { url }),
            "@stream-stop" => arg().map(|play_id| Self::StreamStop { play_id }),
            "@record" => Some(Self::Record),
            "@record-stop" => arg().map(|record_id| Self::RecordStop { record_id }),
            "@transcribe" => Some(Self::Transcribe),
            "@transcribe-stop" => arg().map(|record_id| Self::TranscribeStop { record_id }),
            "@asr" => arg().map(|leg_id| Self::Asr { leg_id }),
            "@asr-stop" => arg().map(|leg_id| Self::AsrStop { leg_id }),
            "@push" => {
                let user = arg()?;
                let rest = text
                    .split_whitespace()
                    .skip(2)
                    .collect::<Vec<_>>()
                    .join(" ");
                (!rest.is_empty()).then_some(Self::Push { user, text: rest })
            }
            _ if url::Url::parse(text.trim()).is_ok() => Some(Self::Link),
            _ => None,
        }
    }

    /// The conversation event this command posts, if it posts one.
    pub fn to_event(&self, from_member: Option<&str>) -> Option<NewEvent> {
        let (kind, body) = match self {
            Self::Say { text } => (
                "audio:say",
                Some(json!({
                    "text": text,
                    "voice_name": "Amy",
                    "level": 1,
                    "queue": true,
                    "loop": 1,
                    "ssml": false,
                })),
            ),
            Self::SayStop { say_id } => ("audio:say:stop", Some(json!({ "say_id": say_id }))),
            Self::Stream { url } => (
                "audio:play",
                Some(json!({ "stream_url": url, "level": 1, "loop": 1 })),
            ),
            Self::StreamStop { play_id } => {
                ("audio:play:stop", Some(json!({ "play_id": play_id })))
            }
            Self::Record => ("audio:record", None),
            Self::RecordStop { record_id } | Self::TranscribeStop { record_id } => {
                ("audio:record:stop", Some(json!({ "record_id": record_id })))
            }
            Self::Transcribe => (
                "audio:record",
                Some(json!({
                    "transcription": { "language": "en-US", "sentiment_analysis": true }
                })),
            ),
            Self::Asr { .. } | Self::AsrStop { .. } | Self::Push { .. } | Self::Link => {
                return None
            }
        };

        let mut event = NewEvent::new(kind).from_member(from_member.map(str::to_owned));
        event.body = body;
        Some(event)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn stop_variants_are_not_shadowed_by_their_prefix() {
        assert_eq!(
            MessageCommand::parse("@tts-stop SAY-1"),
            Some(MessageCommand::SayStop {
                say_id: "SAY-1".into()
            })
        );
        assert_eq!(
            MessageCommand::parse("@record-stop REC-1"),
            Some(MessageCommand::RecordStop {
                record_id: "REC-1".into()
            })
        );
        assert_eq!(
            MessageCommand::parse("@asr-stop LEG-1"),
            Some(MessageCommand::AsrStop {
                leg_id: "LEG-1".into()
            })
        );
    }

    #[test]
    fn tts_keeps_the_whole_sentence() {
        assert_eq!(
            MessageCommand::parse("@tts hello   there world"),
            Some(MessageCommand::Say {
                text: "hello there world".into()
            })
        );
        assert_eq!(MessageCommand::parse("@tts"), None);
    }

    #[test]
    fn push_needs_user_and_text() {
        assert_eq!(MessageCommand::parse("@push alice"), None);
        assert_eq!(
            MessageCommand::parse("@push alice call me back"),
            Some(MessageCommand::Push {
                user: "alice".into(),
                text: "call me back".into()
            })
        );
    }

    #[test]
    fn urls_and_plain_text() {
        assert_eq!(
            MessageCommand::parse("https://example.com/cat.png"),
            Some(MessageCommand::Link)
        );
        assert_eq!(MessageCommand::parse("hello there"), None);
        assert_eq!(MessageCommand::parse("@unknown thing"), None);
        assert_eq!(MessageCommand::parse(""), None);
    }

    #[test]
    fn say_event_uses_default_voice() {
        let event = MessageCommand::parse("@tts hi")
            .unwrap()
            .to_event(Some("MEM-1"))
            .unwrap();
        assert_eq!(
            serde_json::to_value(event).unwrap(),
            json!({
                "type": "audio:say",
                "from": "MEM-1",
                "body": {
                    "text": "hi",
                    "voice_name": "Amy",
                    "level": 1,
                    "queue": true,
                    "loop": 1,
                    "ssml": false
                }
            })
        );
    }

    #[test]
    fn transcribe_requests_sentiment_analysis() {
        let event = MessageCommand::Transcribe.to_event(None).unwrap();
        assert_eq!(
            serde_json::to_value(event).unwrap(),
            json!({
                "type": "audio:record",
                "body": {"transcription": {"language": "en-US", "sentiment_analysis": true}}
            })
        );
    }

    #[test]
    fn rest_commands_have_no_event() {
        assert!(MessageCommand::Asr {
            leg_id: "LEG".into()
        }
        .to_event(None)
        .is_none());
    }
}
