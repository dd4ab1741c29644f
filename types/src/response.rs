use crate::audio::{AudioFormat, Voice};
use crate::session::{MaxOutputTokens, Modality};

/// Per-response overrides carried by `response.create`. Unset fields fall
/// back to the session configuration.
#[derive(Debug, Clone, Default, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct ResponseConfig {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub modalities: Option<Vec<Modality>>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub instructions: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub voice: Option<Voice>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub output_audio_format: Option<AudioFormat>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub temperature: Option<f32>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_output_tokens: Option<MaxOutputTokens>,
}

impl ResponseConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_instructions(mut self, instructions: &str) -> Self {
        self.instructions = Some(instructions.to_string());
        self
    }

    pub fn text_only() -> Self {
        Self {
            modalities: Some(vec![Modality::Text]),
            ..Self::default()
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn empty_config_serializes_to_empty_object() {
        let json = serde_json::to_value(ResponseConfig::new()).expect("config");
        assert_eq!(json, serde_json::json!({}));
    }

    #[test]
    fn text_only_sets_modalities() {
        let json = serde_json::to_value(ResponseConfig::text_only()).expect("config");
        assert_eq!(json, serde_json::json!({"modalities": ["text"]}));
    }
}
