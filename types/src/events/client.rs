use crate::audio::Base64EncodedAudioBytes;
use crate::content::items::Item;
use crate::response::ResponseConfig;
use crate::session::Session;

/// `session.update` event
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct SessionUpdateEvent {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    event_id: Option<String>,

    /// The session configuration to apply.
    pub session: Session,
}

impl SessionUpdateEvent {
    pub fn new(session: Session) -> Self {
        Self {
            event_id: None,
            session,
        }
    }

    pub fn with_event_id(mut self, event_id: &str) -> Self {
        self.event_id = Some(event_id.to_string());
        self
    }
}

/// `conversation.item.create` event
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct ConversationItemCreateEvent {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    event_id: Option<String>,

    /// Item after which the new item is inserted; appended when absent.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub previous_item_id: Option<String>,

    pub item: Item,
}

impl ConversationItemCreateEvent {
    pub fn new(item: Item) -> Self {
        Self {
            event_id: None,
            previous_item_id: None,
            item,
        }
    }

    pub fn with_event_id(mut self, event_id: &str) -> Self {
        self.event_id = Some(event_id.to_string());
        self
    }

    pub fn with_previous_item_id(mut self, previous_item_id: &str) -> Self {
        self.previous_item_id = Some(previous_item_id.to_string());
        self
    }
}

/// `conversation.item.truncate` event
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct ConversationItemTruncateEvent {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    event_id: Option<String>,

    /// The assistant message item to truncate.
    pub item_id: String,

    pub content_index: usize,

    /// Inclusive duration up to which audio is kept, in milliseconds.
    pub audio_end_ms: u64,
}

impl ConversationItemTruncateEvent {
    pub fn new(item_id: &str, content_index: usize, audio_end_ms: u64) -> Self {
        Self {
            event_id: None,
            item_id: item_id.to_string(),
            content_index,
            audio_end_ms,
        }
    }

    pub fn with_event_id(mut self, event_id: &str) -> Self {
        self.event_id = Some(event_id.to_string());
        self
    }
}

/// `input_audio_buffer.append` event
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct InputAudioBufferAppendEvent {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    event_id: Option<String>,

    /// Audio chunk in the session's input format, base64-encoded.
    pub audio: Base64EncodedAudioBytes,
}

impl InputAudioBufferAppendEvent {
    pub fn new(audio: Base64EncodedAudioBytes) -> Self {
        Self {
            event_id: None,
            audio,
        }
    }

    pub fn with_event_id(mut self, event_id: &str) -> Self {
        self.event_id = Some(event_id.to_string());
        self
    }
}

/// `input_audio_buffer.commit` event
#[derive(Debug, Clone, Default, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct InputAudioBufferCommitEvent {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    event_id: Option<String>,
}

impl InputAudioBufferCommitEvent {
    pub fn new() -> Self {
        Self { event_id: None }
    }

    pub fn with_event_id(mut self, event_id: &str) -> Self {
        self.event_id = Some(event_id.to_string());
        self
    }
}

/// `response.create` event
#[derive(Debug, Clone, Default, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct ResponseCreateEvent {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    event_id: Option<String>,

    /// Overrides for this response; session defaults apply when absent.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub response: Option<ResponseConfig>,
}

impl ResponseCreateEvent {
    pub fn new() -> Self {
        Self {
            event_id: None,
            response: None,
        }
    }

    pub fn with_event_id(mut self, event_id: &str) -> Self {
        self.event_id = Some(event_id.to_string());
        self
    }

    pub fn with_config(mut self, config: ResponseConfig) -> Self {
        self.response = Some(config);
        self
    }
}
