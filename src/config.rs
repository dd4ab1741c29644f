use secrecy::SecretString;
use serde::Deserialize;

use crate::types::audio::Voice;

pub const DEFAULT_BASE_URL: &str = "https://api.openai.com/v1/realtime";
pub const DEFAULT_WS_URL: &str = "wss://api.openai.com/v1/realtime";
pub const DEFAULT_MODEL: &str = "gpt-4o-mini-realtime-preview-2024-12-17";
pub const DEFAULT_VOICE: Voice = Voice::Alloy;

pub(crate) const AUTHORIZATION_HEADER: &str = "Authorization";
pub(crate) const OPENAI_BETA_HEADER: &str = "OpenAI-Beta";
pub(crate) const OPENAI_BETA_VALUE: &str = "realtime=v1";

fn default_model() -> String {
    DEFAULT_MODEL.to_string()
}

/// Short-lived bearer token plus the model and voice picked for one
/// session. Minted by a trusted backend; never the long-lived user
/// credential. The token is held behind [`SecretString`] so it stays out
/// of debug output.
#[derive(Clone, Debug, Deserialize)]
pub struct EphemeralCredential {
    token: SecretString,
    #[serde(default = "default_model")]
    model: String,
    #[serde(default)]
    voice: Option<Voice>,
}

impl EphemeralCredential {
    pub fn new(token: impl Into<String>) -> Self {
        Self {
            token: SecretString::from(token.into()),
            model: default_model(),
            voice: None,
        }
    }

    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }

    pub fn with_voice(mut self, voice: Voice) -> Self {
        self.voice = Some(voice);
        self
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    pub fn voice(&self) -> Option<&Voice> {
        self.voice.as_ref()
    }

    pub(crate) fn token(&self) -> &SecretString {
        &self.token
    }
}

/// Tuning shared by the transport connectors. The base URL override exists
/// for proxies and tests; each connector falls back to its own default
/// endpoint.
#[derive(Clone, Debug)]
pub struct ConnectOptions {
    base_url: Option<String>,
    capacity: usize,
}

impl Default for ConnectOptions {
    fn default() -> Self {
        Self {
            base_url: None,
            capacity: 1024,
        }
    }
}

impl ConnectOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = Some(base_url.into());
        self
    }

    pub fn with_capacity(mut self, capacity: usize) -> Self {
        self.capacity = capacity;
        self
    }

    pub fn base_url(&self) -> Option<&str> {
        self.base_url.as_deref()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn credential_decodes_from_minting_response() {
        let json = r#"{"token":"ek_abc123","voice":"sage"}"#;
        let credential: EphemeralCredential = serde_json::from_str(json).expect("decode");
        assert_eq!(credential.model(), DEFAULT_MODEL);
        assert_eq!(credential.voice().map(|v| v.as_str()), Some("sage"));
    }

    #[test]
    fn debug_output_redacts_token() {
        let credential = EphemeralCredential::new("ek_abc123");
        let debugged = format!("{:?}", credential);
        assert!(!debugged.contains("ek_abc123"));
    }
}
