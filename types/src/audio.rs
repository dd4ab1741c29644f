/// Audio data encoded as base64, as it travels inside protocol events.
pub type Base64EncodedAudioBytes = String;

/// Voices the realtime endpoint can synthesize speech with.
///
/// The set grows server-side; names outside the known set are carried
/// through untouched via `Other`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Voice {
    Alloy,
    Ash,
    Ballad,
    Coral,
    Echo,
    Sage,
    Shimmer,
    Verse,
    Other(String),
}

impl Voice {
    pub fn as_str(&self) -> &str {
        match self {
            Voice::Alloy => "alloy",
            Voice::Ash => "ash",
            Voice::Ballad => "ballad",
            Voice::Coral => "coral",
            Voice::Echo => "echo",
            Voice::Sage => "sage",
            Voice::Shimmer => "shimmer",
            Voice::Verse => "verse",
            Voice::Other(name) => name,
        }
    }
}

impl From<&str> for Voice {
    fn from(name: &str) -> Self {
        match name {
            "alloy" => Voice::Alloy,
            "ash" => Voice::Ash,
            "ballad" => Voice::Ballad,
            "coral" => Voice::Coral,
            "echo" => Voice::Echo,
            "sage" => Voice::Sage,
            "shimmer" => Voice::Shimmer,
            "verse" => Voice::Verse,
            other => Voice::Other(other.to_string()),
        }
    }
}

impl std::fmt::Display for Voice {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl serde::Serialize for Voice {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> serde::Deserialize<'de> for Voice {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let name = String::deserialize(deserializer)?;
        Ok(Voice::from(name.as_str()))
    }
}

/// Wire encodings the protocol supports for audio payloads.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub enum AudioFormat {
    #[serde(rename = "pcm16")]
    Pcm16,
    #[serde(rename = "g711_ulaw")]
    Mulaw,
    #[serde(rename = "g711_alaw")]
    Alaw,
}

/// Model used to transcribe the user's input audio server-side.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TranscriptionModel {
    Whisper,
    Other(String),
}

impl TranscriptionModel {
    pub fn as_str(&self) -> &str {
        match self {
            TranscriptionModel::Whisper => "whisper-1",
            TranscriptionModel::Other(name) => name,
        }
    }
}

impl serde::Serialize for TranscriptionModel {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> serde::Deserialize<'de> for TranscriptionModel {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let name = String::deserialize(deserializer)?;
        Ok(match name.as_str() {
            "whisper-1" => TranscriptionModel::Whisper,
            _ => TranscriptionModel::Other(name),
        })
    }
}

/// `input_audio_transcription` block of the session configuration.
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct InputAudioTranscription {
    pub model: TranscriptionModel,
}

impl InputAudioTranscription {
    pub fn whisper() -> Self {
        Self {
            model: TranscriptionModel::Whisper,
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn serialize_voice() {
        let voice = Voice::Coral;
        assert_eq!(serde_json::to_string(&voice).expect("voice"), "\"coral\"");
    }

    #[test]
    fn deserialize_unknown_voice() {
        let voice: Voice = serde_json::from_str("\"cedar\"").expect("voice");
        assert_eq!(voice, Voice::Other("cedar".to_string()));
        assert_eq!(voice.as_str(), "cedar");
    }

    #[test]
    fn serialize_audio_format() {
        assert_eq!(
            serde_json::to_string(&AudioFormat::Pcm16).expect("format"),
            "\"pcm16\""
        );
        assert_eq!(
            serde_json::to_string(&AudioFormat::Mulaw).expect("format"),
            "\"g711_ulaw\""
        );
    }

    #[test]
    fn deserialize_transcription_model() {
        let model: TranscriptionModel = serde_json::from_str("\"whisper-1\"").expect("model");
        assert_eq!(model, TranscriptionModel::Whisper);
    }
}
