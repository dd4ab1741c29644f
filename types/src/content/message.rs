use crate::content::items::ItemStatus;

/// `message` item. Content parts mutate in place as deltas stream in.
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct MessageItem {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<ItemStatus>,

    pub role: MessageRole,

    #[serde(default)]
    pub content: Vec<ContentPart>,
}

impl MessageItem {
    /// A user/system message carrying one `input_text` part, the shape sent
    /// with `conversation.item.create`.
    pub fn input_text(role: MessageRole, text: &str) -> Self {
        Self {
            id: None,
            status: None,
            role,
            content: vec![ContentPart::InputText {
                text: text.to_string(),
            }],
        }
    }

    pub fn with_id(mut self, id: &str) -> Self {
        self.id = Some(id.to_string());
        self
    }

    /// Readable text for this message: text parts verbatim, audio parts via
    /// their transcript, joined in content order. Used for the end-of-session
    /// transcript hand-off.
    pub fn display_text(&self) -> String {
        let mut pieces: Vec<&str> = Vec::new();
        for part in &self.content {
            match part {
                ContentPart::InputText { text } | ContentPart::Text { text } => {
                    if !text.is_empty() {
                        pieces.push(text);
                    }
                }
                ContentPart::InputAudio { transcript, .. }
                | ContentPart::Audio { transcript, .. } => {
                    if let Some(transcript) = transcript {
                        if !transcript.is_empty() {
                            pieces.push(transcript);
                        }
                    }
                }
            }
        }
        pieces.join(" ")
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MessageRole {
    User,
    Assistant,
    System,
}

/// One piece of message content.
///
/// The wire carries audio as base64 strings; here the bytes are stored
/// decoded so transcript harvesting and playback never re-decode. A part's
/// variant never changes after creation; deltas only extend the fields
/// inside it.
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(tag = "type")]
pub enum ContentPart {
    #[serde(rename = "input_text")]
    InputText { text: String },

    #[serde(rename = "text")]
    Text {
        #[serde(default)]
        text: String,
    },

    #[serde(rename = "input_audio")]
    InputAudio {
        #[serde(
            default,
            skip_serializing_if = "Vec::is_empty",
            with = "base64_bytes"
        )]
        audio: Vec<u8>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        transcript: Option<String>,
    },

    #[serde(rename = "audio")]
    Audio {
        #[serde(
            default,
            skip_serializing_if = "Vec::is_empty",
            with = "base64_bytes"
        )]
        audio: Vec<u8>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        transcript: Option<String>,
    },
}

impl ContentPart {
    pub fn input_text(text: &str) -> Self {
        ContentPart::InputText {
            text: text.to_string(),
        }
    }

    pub fn transcript(&self) -> Option<&str> {
        match self {
            ContentPart::InputAudio { transcript, .. } | ContentPart::Audio { transcript, .. } => {
                transcript.as_deref()
            }
            _ => None,
        }
    }
}

mod base64_bytes {
    use base64::Engine;
    use base64::engine::general_purpose::STANDARD;

    pub fn serialize<S: serde::Serializer>(bytes: &Vec<u8>, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&STANDARD.encode(bytes))
    }

    pub fn deserialize<'de, D: serde::Deserializer<'de>>(deserializer: D) -> Result<Vec<u8>, D::Error> {
        let encoded = <String as serde::Deserialize>::deserialize(deserializer)?;
        STANDARD
            .decode(encoded.as_bytes())
            .map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn content_part_audio_round_trips_as_base64() {
        let part = ContentPart::InputAudio {
            audio: vec![0x00, 0x01, 0xfe, 0xff],
            transcript: None,
        };
        let json = serde_json::to_value(&part).expect("part");
        assert_eq!(json["type"], "input_audio");
        assert_eq!(json["audio"], "AAH+/w==");
        let back: ContentPart = serde_json::from_value(json).expect("part");
        assert_eq!(back, part);
    }

    #[test]
    fn audio_part_without_bytes_decodes_empty() {
        // content_part payloads from the server carry transcripts only.
        let json = serde_json::json!({"type": "audio", "transcript": "Hello there"});
        let part: ContentPart = serde_json::from_value(json).expect("part");
        match part {
            ContentPart::Audio { audio, transcript } => {
                assert!(audio.is_empty());
                assert_eq!(transcript.as_deref(), Some("Hello there"));
            }
            other => panic!("unexpected part: {other:?}"),
        }
    }

    #[test]
    fn display_text_joins_parts_in_order() {
        let message = MessageItem {
            id: Some("item_1".to_string()),
            status: None,
            role: MessageRole::Assistant,
            content: vec![
                ContentPart::Text {
                    text: "Let's continue.".to_string(),
                },
                ContentPart::Audio {
                    audio: vec![1, 2],
                    transcript: Some("What felt hardest today?".to_string()),
                },
            ],
        };
        assert_eq!(
            message.display_text(),
            "Let's continue. What felt hardest today?"
        );
    }

    #[test]
    fn input_text_constructor_matches_create_shape() {
        let message = MessageItem::input_text(MessageRole::User, "I kept procrastinating.")
            .with_id("itemabc");
        let json = serde_json::to_value(&message).expect("message");
        assert_eq!(json["role"], "user");
        assert_eq!(json["content"][0]["type"], "input_text");
        assert_eq!(json["content"][0]["text"], "I kept procrastinating.");
    }
}
