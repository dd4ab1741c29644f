use crate::audio::{AudioFormat, InputAudioTranscription, Voice};
use crate::tools::{Tool, ToolChoice};

/// Server-negotiated session configuration.
///
/// The server sends the full object in `session.created` / `session.updated`;
/// the client mutates a local copy and resends it via `session.update`.
/// Fields left `None` are omitted on the wire and keep their server-side
/// value. All fields are public so an update closure can reshape the copy
/// directly.
#[derive(Debug, Clone, Default, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct Session {
    /// Server-assigned session identifier. Cleared before every
    /// `session.update` so the server keeps ownership of identity.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub model: Option<String>,

    /// Modalities the model may respond with. `[Text]` disables audio output.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub modalities: Option<Vec<Modality>>,

    /// System instructions prepended to model calls.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub instructions: Option<String>,

    /// Cannot be changed once the model has responded with audio.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub voice: Option<Voice>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub input_audio_format: Option<AudioFormat>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub output_audio_format: Option<AudioFormat>,

    /// Transcription of the user's audio. Disabled server-side when absent.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub input_audio_transcription: Option<InputAudioTranscription>,

    /// Server-side voice activity detection policy.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub turn_detection: Option<TurnDetection>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tools: Option<Vec<Tool>>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tool_choice: Option<ToolChoice>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub temperature: Option<f32>,

    /// Cap on response tokens, or unbounded.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_output_tokens: Option<MaxOutputTokens>,
}

impl Session {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_instructions(mut self, instructions: &str) -> Self {
        self.instructions = Some(instructions.to_string());
        self
    }

    pub fn with_voice(mut self, voice: Voice) -> Self {
        self.voice = Some(voice);
        self
    }

    pub fn with_modalities(mut self, modalities: Vec<Modality>) -> Self {
        self.modalities = Some(modalities);
        self
    }

    pub fn with_turn_detection(mut self, turn_detection: TurnDetection) -> Self {
        self.turn_detection = Some(turn_detection);
        self
    }

    pub fn with_input_audio_transcription(mut self, transcription: InputAudioTranscription) -> Self {
        self.input_audio_transcription = Some(transcription);
        self
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Modality {
    Text,
    Audio,
}

/// `turn_detection` block, tagged by detection strategy.
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(tag = "type")]
pub enum TurnDetection {
    #[serde(rename = "server_vad")]
    ServerVad(ServerVad),
}

/// Parameters for server-side voice activity detection. Unset fields keep
/// the server defaults (threshold 0.5, 300ms prefix, 500ms silence).
#[derive(Debug, Clone, Default, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct ServerVad {
    /// Activation energy threshold in `0.0..=1.0`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub threshold: Option<f32>,

    /// Audio retained before detected speech start.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub prefix_padding_ms: Option<u32>,

    /// Trailing silence that ends a turn.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub silence_duration_ms: Option<u32>,

    /// Whether the server auto-creates a response at end of turn.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub create_response: Option<bool>,
}

impl TurnDetection {
    pub fn server_vad() -> Self {
        TurnDetection::ServerVad(ServerVad::default())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MaxOutputTokens {
    Limited(u32),
    /// Wire value `"inf"`.
    Infinite,
}

impl serde::Serialize for MaxOutputTokens {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            MaxOutputTokens::Limited(n) => serializer.serialize_u32(*n),
            MaxOutputTokens::Infinite => serializer.serialize_str("inf"),
        }
    }
}

impl<'de> serde::Deserialize<'de> for MaxOutputTokens {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        struct TokenVisitor;

        impl serde::de::Visitor<'_> for TokenVisitor {
            type Value = MaxOutputTokens;

            fn expecting(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
                f.write_str("a token count or \"inf\"")
            }

            fn visit_u64<E: serde::de::Error>(self, v: u64) -> Result<Self::Value, E> {
                u32::try_from(v)
                    .map(MaxOutputTokens::Limited)
                    .map_err(|_| E::custom("token count out of range"))
            }

            fn visit_i64<E: serde::de::Error>(self, v: i64) -> Result<Self::Value, E> {
                u32::try_from(v)
                    .map(MaxOutputTokens::Limited)
                    .map_err(|_| E::custom("token count out of range"))
            }

            fn visit_str<E: serde::de::Error>(self, v: &str) -> Result<Self::Value, E> {
                if v == "inf" {
                    Ok(MaxOutputTokens::Infinite)
                } else {
                    Err(E::custom("expected \"inf\""))
                }
            }
        }

        deserializer.deserialize_any(TokenVisitor)
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn update_payload_skips_unset_fields() {
        let session = Session::new()
            .with_instructions("Keep questions short.")
            .with_voice(Voice::Coral);
        let json = serde_json::to_value(&session).expect("session");
        assert_eq!(
            json,
            serde_json::json!({
                "instructions": "Keep questions short.",
                "voice": "coral",
            })
        );
    }

    #[test]
    fn turn_detection_is_tagged() {
        let detection = TurnDetection::ServerVad(ServerVad {
            threshold: Some(0.5),
            prefix_padding_ms: Some(300),
            silence_duration_ms: Some(500),
            create_response: Some(true),
        });
        let json = serde_json::to_value(&detection).expect("turn detection");
        assert_eq!(json["type"], "server_vad");
        assert_eq!(json["silence_duration_ms"], 500);
    }

    #[test]
    fn max_output_tokens_round_trips() {
        let limited: MaxOutputTokens = serde_json::from_str("512").expect("number");
        assert_eq!(limited, MaxOutputTokens::Limited(512));
        let inf: MaxOutputTokens = serde_json::from_str("\"inf\"").expect("inf");
        assert_eq!(inf, MaxOutputTokens::Infinite);
        assert_eq!(serde_json::to_string(&inf).expect("inf"), "\"inf\"");
    }

    #[test]
    fn server_session_payload_decodes() {
        let json = serde_json::json!({
            "id": "sess_001",
            "model": "gpt-4o-mini-realtime-preview-2024-12-17",
            "modalities": ["audio", "text"],
            "voice": "alloy",
            "input_audio_format": "pcm16",
            "output_audio_format": "pcm16",
            "turn_detection": {
                "type": "server_vad",
                "threshold": 0.5,
                "prefix_padding_ms": 300,
                "silence_duration_ms": 500
            },
            "temperature": 0.8,
            "max_output_tokens": "inf",
            "object": "realtime.session"
        });
        let session: Session = serde_json::from_value(json).expect("session");
        assert_eq!(session.id.as_deref(), Some("sess_001"));
        assert_eq!(session.voice, Some(Voice::Alloy));
        assert_eq!(
            session.modalities,
            Some(vec![Modality::Audio, Modality::Text])
        );
        match session.turn_detection {
            Some(TurnDetection::ServerVad(vad)) => {
                assert_eq!(vad.silence_duration_ms, Some(500));
            }
            other => panic!("unexpected turn detection: {other:?}"),
        }
    }
}
