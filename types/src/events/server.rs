use crate::audio::Base64EncodedAudioBytes;
use crate::content::items::Item;
use crate::content::message::ContentPart;
use crate::session::Session;

/// Error payload carried by `error` events and transcription failures.
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct ErrorDetails {
    /// Error class, e.g. "invalid_request_error", "server_error".
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    kind: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    code: Option<String>,

    message: String,

    /// Parameter the error relates to, when applicable.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    param: Option<String>,

    /// Client event id that triggered the error, when applicable.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    event_id: Option<String>,
}

impl ErrorDetails {
    pub fn new(message: &str) -> Self {
        Self {
            kind: None,
            code: None,
            message: message.to_string(),
            param: None,
            event_id: None,
        }
    }

    pub fn with_kind(mut self, kind: &str) -> Self {
        self.kind = Some(kind.to_string());
        self
    }

    pub fn kind(&self) -> Option<&str> {
        self.kind.as_deref()
    }

    pub fn code(&self) -> Option<&str> {
        self.code.as_deref()
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    pub fn param(&self) -> Option<&str> {
        self.param.as_deref()
    }

    pub fn event_id(&self) -> Option<&str> {
        self.event_id.as_deref()
    }
}

impl std::fmt::Display for ErrorDetails {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match (&self.kind, &self.code) {
            (Some(kind), Some(code)) => write!(f, "{} ({}/{})", self.message, kind, code),
            (Some(kind), None) => write!(f, "{} ({})", self.message, kind),
            (None, Some(code)) => write!(f, "{} ({})", self.message, code),
            (None, None) => f.write_str(&self.message),
        }
    }
}

/// `error` event
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct ErrorEvent {
    event_id: String,
    error: ErrorDetails,
}

impl ErrorEvent {
    pub fn event_id(&self) -> &str {
        &self.event_id
    }

    pub fn error(&self) -> &ErrorDetails {
        &self.error
    }

    pub fn into_error(self) -> ErrorDetails {
        self.error
    }
}

/// `session.created` event
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct SessionCreatedEvent {
    event_id: String,
    session: Session,
}

impl SessionCreatedEvent {
    pub fn event_id(&self) -> &str {
        &self.event_id
    }

    pub fn session(&self) -> &Session {
        &self.session
    }

    pub fn into_session(self) -> Session {
        self.session
    }
}

/// `session.updated` event
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct SessionUpdatedEvent {
    event_id: String,
    session: Session,
}

impl SessionUpdatedEvent {
    pub fn event_id(&self) -> &str {
        &self.event_id
    }

    pub fn session(&self) -> &Session {
        &self.session
    }

    pub fn into_session(self) -> Session {
        self.session
    }
}

/// Conversation descriptor inside `conversation.created`.
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct ConversationMeta {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    id: Option<String>,
}

impl ConversationMeta {
    pub fn id(&self) -> Option<&str> {
        self.id.as_deref()
    }
}

/// `conversation.created` event
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct ConversationCreatedEvent {
    event_id: String,
    conversation: ConversationMeta,
}

impl ConversationCreatedEvent {
    pub fn event_id(&self) -> &str {
        &self.event_id
    }

    pub fn conversation(&self) -> &ConversationMeta {
        &self.conversation
    }
}

/// `conversation.item.created` event
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct ConversationItemCreatedEvent {
    event_id: String,

    /// Item this one was inserted after, if any.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    previous_item_id: Option<String>,

    item: Item,
}

impl ConversationItemCreatedEvent {
    pub fn event_id(&self) -> &str {
        &self.event_id
    }

    pub fn previous_item_id(&self) -> Option<&str> {
        self.previous_item_id.as_deref()
    }

    pub fn item(&self) -> &Item {
        &self.item
    }

    pub fn into_item(self) -> Item {
        self.item
    }
}

/// `conversation.item.deleted` event
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct ConversationItemDeletedEvent {
    event_id: String,
    item_id: String,
}

impl ConversationItemDeletedEvent {
    pub fn event_id(&self) -> &str {
        &self.event_id
    }

    pub fn item_id(&self) -> &str {
        &self.item_id
    }
}

/// `conversation.item.input_audio_transcription.completed` event
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct InputAudioTranscriptionCompletedEvent {
    event_id: String,
    item_id: String,
    content_index: usize,
    transcript: String,
}

impl InputAudioTranscriptionCompletedEvent {
    pub fn event_id(&self) -> &str {
        &self.event_id
    }

    pub fn item_id(&self) -> &str {
        &self.item_id
    }

    pub fn content_index(&self) -> usize {
        self.content_index
    }

    pub fn transcript(&self) -> &str {
        &self.transcript
    }
}

/// `conversation.item.input_audio_transcription.failed` event
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct InputAudioTranscriptionFailedEvent {
    event_id: String,
    item_id: String,
    content_index: usize,
    error: ErrorDetails,
}

impl InputAudioTranscriptionFailedEvent {
    pub fn event_id(&self) -> &str {
        &self.event_id
    }

    pub fn item_id(&self) -> &str {
        &self.item_id
    }

    pub fn content_index(&self) -> usize {
        self.content_index
    }

    pub fn error(&self) -> &ErrorDetails {
        &self.error
    }

    pub fn into_error(self) -> ErrorDetails {
        self.error
    }
}

/// `response.content_part.added` event
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct ResponseContentPartAddedEvent {
    event_id: String,
    response_id: String,
    item_id: String,
    output_index: usize,
    content_index: usize,
    part: ContentPart,
}

impl ResponseContentPartAddedEvent {
    pub fn event_id(&self) -> &str {
        &self.event_id
    }

    pub fn response_id(&self) -> &str {
        &self.response_id
    }

    pub fn item_id(&self) -> &str {
        &self.item_id
    }

    pub fn output_index(&self) -> usize {
        self.output_index
    }

    pub fn content_index(&self) -> usize {
        self.content_index
    }

    pub fn part(&self) -> &ContentPart {
        &self.part
    }
}

/// `response.content_part.done` event
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct ResponseContentPartDoneEvent {
    event_id: String,
    response_id: String,
    item_id: String,
    output_index: usize,
    content_index: usize,
    part: ContentPart,
}

impl ResponseContentPartDoneEvent {
    pub fn event_id(&self) -> &str {
        &self.event_id
    }

    pub fn item_id(&self) -> &str {
        &self.item_id
    }

    pub fn content_index(&self) -> usize {
        self.content_index
    }

    pub fn part(&self) -> &ContentPart {
        &self.part
    }
}

/// `response.text.delta` event
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct ResponseTextDeltaEvent {
    event_id: String,
    response_id: String,
    item_id: String,
    output_index: usize,
    content_index: usize,
    delta: String,
}

impl ResponseTextDeltaEvent {
    pub fn event_id(&self) -> &str {
        &self.event_id
    }

    pub fn item_id(&self) -> &str {
        &self.item_id
    }

    pub fn content_index(&self) -> usize {
        self.content_index
    }

    pub fn delta(&self) -> &str {
        &self.delta
    }
}

/// `response.text.done` event
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct ResponseTextDoneEvent {
    event_id: String,
    response_id: String,
    item_id: String,
    output_index: usize,
    content_index: usize,
    text: String,
}

impl ResponseTextDoneEvent {
    pub fn event_id(&self) -> &str {
        &self.event_id
    }

    pub fn item_id(&self) -> &str {
        &self.item_id
    }

    pub fn content_index(&self) -> usize {
        self.content_index
    }

    pub fn text(&self) -> &str {
        &self.text
    }
}

/// `response.audio_transcript.delta` event
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct ResponseAudioTranscriptDeltaEvent {
    event_id: String,
    response_id: String,
    item_id: String,
    output_index: usize,
    content_index: usize,
    delta: String,
}

impl ResponseAudioTranscriptDeltaEvent {
    pub fn event_id(&self) -> &str {
        &self.event_id
    }

    pub fn item_id(&self) -> &str {
        &self.item_id
    }

    pub fn content_index(&self) -> usize {
        self.content_index
    }

    pub fn delta(&self) -> &str {
        &self.delta
    }
}

/// `response.audio_transcript.done` event
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct ResponseAudioTranscriptDoneEvent {
    event_id: String,
    response_id: String,
    item_id: String,
    output_index: usize,
    content_index: usize,
    transcript: String,
}

impl ResponseAudioTranscriptDoneEvent {
    pub fn event_id(&self) -> &str {
        &self.event_id
    }

    pub fn item_id(&self) -> &str {
        &self.item_id
    }

    pub fn content_index(&self) -> usize {
        self.content_index
    }

    pub fn transcript(&self) -> &str {
        &self.transcript
    }
}

/// `response.audio.delta` event
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct ResponseAudioDeltaEvent {
    event_id: String,
    response_id: String,
    item_id: String,
    output_index: usize,
    content_index: usize,

    /// PCM16 chunk, base64-encoded.
    delta: Base64EncodedAudioBytes,
}

impl ResponseAudioDeltaEvent {
    pub fn event_id(&self) -> &str {
        &self.event_id
    }

    pub fn item_id(&self) -> &str {
        &self.item_id
    }

    pub fn content_index(&self) -> usize {
        self.content_index
    }

    pub fn delta(&self) -> &Base64EncodedAudioBytes {
        &self.delta
    }
}

/// `response.function_call_arguments.delta` event
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct ResponseFunctionCallArgumentsDeltaEvent {
    event_id: String,
    response_id: String,
    item_id: String,
    output_index: usize,
    call_id: String,
    delta: String,
}

impl ResponseFunctionCallArgumentsDeltaEvent {
    pub fn event_id(&self) -> &str {
        &self.event_id
    }

    pub fn item_id(&self) -> &str {
        &self.item_id
    }

    pub fn call_id(&self) -> &str {
        &self.call_id
    }

    pub fn delta(&self) -> &str {
        &self.delta
    }
}

/// `response.function_call_arguments.done` event
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct ResponseFunctionCallArgumentsDoneEvent {
    event_id: String,
    response_id: String,
    item_id: String,
    output_index: usize,
    call_id: String,
    arguments: String,
}

impl ResponseFunctionCallArgumentsDoneEvent {
    pub fn event_id(&self) -> &str {
        &self.event_id
    }

    pub fn item_id(&self) -> &str {
        &self.item_id
    }

    pub fn call_id(&self) -> &str {
        &self.call_id
    }

    pub fn arguments(&self) -> &str {
        &self.arguments
    }
}

/// `response.output_item.done` event
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct ResponseOutputItemDoneEvent {
    event_id: String,
    response_id: String,
    output_index: usize,
    item: Item,
}

impl ResponseOutputItemDoneEvent {
    pub fn event_id(&self) -> &str {
        &self.event_id
    }

    pub fn item(&self) -> &Item {
        &self.item
    }

    pub fn into_item(self) -> Item {
        self.item
    }
}

/// `input_audio_buffer.speech_started` event
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct SpeechStartedEvent {
    event_id: String,

    /// Offset of detected speech start within the input buffer.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    audio_start_ms: Option<u64>,

    /// User message item the buffer will commit to.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    item_id: Option<String>,
}

impl SpeechStartedEvent {
    pub fn event_id(&self) -> &str {
        &self.event_id
    }

    pub fn audio_start_ms(&self) -> Option<u64> {
        self.audio_start_ms
    }

    pub fn item_id(&self) -> Option<&str> {
        self.item_id.as_deref()
    }
}

/// `input_audio_buffer.speech_stopped` event
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct SpeechStoppedEvent {
    event_id: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    audio_end_ms: Option<u64>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    item_id: Option<String>,
}

impl SpeechStoppedEvent {
    pub fn event_id(&self) -> &str {
        &self.event_id
    }

    pub fn audio_end_ms(&self) -> Option<u64> {
        self.audio_end_ms
    }

    pub fn item_id(&self) -> Option<&str> {
        self.item_id.as_deref()
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::content::message::MessageRole;
    use crate::events::ServerEvent;

    #[test]
    fn item_created_decodes_message() {
        let decoded: ServerEvent = serde_json::from_str(
            r#"{
                "type": "conversation.item.created",
                "event_id": "evt_2",
                "previous_item_id": null,
                "item": {
                    "type": "message",
                    "id": "item_A",
                    "status": "in_progress",
                    "role": "assistant",
                    "content": []
                }
            }"#,
        )
        .expect("decode");
        match decoded {
            ServerEvent::ConversationItemCreated(event) => {
                let item = event.into_item();
                assert_eq!(item.id(), Some("item_A"));
                let message = item.as_message().expect("message");
                assert_eq!(message.role, MessageRole::Assistant);
                assert!(message.content.is_empty());
            }
            other => panic!("unexpected event: {other:?}"),
        }
    }

    #[test]
    fn output_item_done_carries_full_item() {
        let decoded: ServerEvent = serde_json::from_str(
            r#"{
                "type": "response.output_item.done",
                "event_id": "evt_12",
                "response_id": "resp_1",
                "output_index": 0,
                "item": {
                    "type": "message",
                    "id": "item_A",
                    "status": "completed",
                    "role": "assistant",
                    "content": [{"type": "text", "text": "Hello"}]
                }
            }"#,
        )
        .expect("decode");
        match decoded {
            ServerEvent::ResponseOutputItemDone(event) => {
                let message = event.item().as_message().expect("message");
                assert_eq!(message.display_text(), "Hello");
            }
            other => panic!("unexpected event: {other:?}"),
        }
    }

    #[test]
    fn audio_delta_keeps_base64_payload() {
        let decoded: ServerEvent = serde_json::from_str(
            r#"{
                "type": "response.audio.delta",
                "event_id": "evt_20",
                "response_id": "resp_1",
                "item_id": "item_A",
                "output_index": 0,
                "content_index": 0,
                "delta": "AAECAw=="
            }"#,
        )
        .expect("decode");
        match decoded {
            ServerEvent::ResponseAudioDelta(event) => {
                assert_eq!(event.delta(), "AAECAw==");
                assert_eq!(event.item_id(), "item_A");
            }
            other => panic!("unexpected event: {other:?}"),
        }
    }

    #[test]
    fn transcription_failed_carries_error_details() {
        let decoded: ServerEvent = serde_json::from_str(
            r#"{
                "type": "conversation.item.input_audio_transcription.failed",
                "event_id": "evt_30",
                "item_id": "item_U",
                "content_index": 0,
                "error": {
                    "type": "transcription_error",
                    "message": "Audio too short."
                }
            }"#,
        )
        .expect("decode");
        match decoded {
            ServerEvent::InputAudioTranscriptionFailed(event) => {
                assert_eq!(event.item_id(), "item_U");
                assert_eq!(event.error().kind(), Some("transcription_error"));
                assert_eq!(event.error().to_string(), "Audio too short. (transcription_error)");
            }
            other => panic!("unexpected event: {other:?}"),
        }
    }
}
