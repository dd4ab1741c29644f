pub mod client;
pub mod server;

use client::*;
use server::*;

/// Events the client sends over the data channel.
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(tag = "type")]
pub enum ClientEvent {
    #[serde(rename = "session.update")]
    SessionUpdate(SessionUpdateEvent),
    #[serde(rename = "conversation.item.create")]
    ConversationItemCreate(ConversationItemCreateEvent),
    #[serde(rename = "conversation.item.truncate")]
    ConversationItemTruncate(ConversationItemTruncateEvent),
    #[serde(rename = "input_audio_buffer.append")]
    InputAudioBufferAppend(InputAudioBufferAppendEvent),
    #[serde(rename = "input_audio_buffer.commit")]
    InputAudioBufferCommit(InputAudioBufferCommitEvent),
    #[serde(rename = "response.create")]
    ResponseCreate(ResponseCreateEvent),
}

/// Events the server streams back.
///
/// Types outside this set decode to `Unknown` and are dropped by the
/// session, so new server events never break an old client.
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(tag = "type")]
pub enum ServerEvent {
    #[serde(rename = "error")]
    Error(ErrorEvent),
    #[serde(rename = "session.created")]
    SessionCreated(SessionCreatedEvent),
    #[serde(rename = "session.updated")]
    SessionUpdated(SessionUpdatedEvent),
    #[serde(rename = "conversation.created")]
    ConversationCreated(ConversationCreatedEvent),
    #[serde(rename = "conversation.item.created")]
    ConversationItemCreated(ConversationItemCreatedEvent),
    #[serde(rename = "conversation.item.deleted")]
    ConversationItemDeleted(ConversationItemDeletedEvent),
    #[serde(rename = "conversation.item.input_audio_transcription.completed")]
    InputAudioTranscriptionCompleted(InputAudioTranscriptionCompletedEvent),
    #[serde(rename = "conversation.item.input_audio_transcription.failed")]
    InputAudioTranscriptionFailed(InputAudioTranscriptionFailedEvent),
    #[serde(rename = "response.content_part.added")]
    ResponseContentPartAdded(ResponseContentPartAddedEvent),
    #[serde(rename = "response.content_part.done")]
    ResponseContentPartDone(ResponseContentPartDoneEvent),
    #[serde(rename = "response.text.delta")]
    ResponseTextDelta(ResponseTextDeltaEvent),
    #[serde(rename = "response.text.done")]
    ResponseTextDone(ResponseTextDoneEvent),
    #[serde(rename = "response.audio_transcript.delta")]
    ResponseAudioTranscriptDelta(ResponseAudioTranscriptDeltaEvent),
    #[serde(rename = "response.audio_transcript.done")]
    ResponseAudioTranscriptDone(ResponseAudioTranscriptDoneEvent),
    #[serde(rename = "response.audio.delta")]
    ResponseAudioDelta(ResponseAudioDeltaEvent),
    #[serde(rename = "response.function_call_arguments.delta")]
    ResponseFunctionCallArgumentsDelta(ResponseFunctionCallArgumentsDeltaEvent),
    #[serde(rename = "response.function_call_arguments.done")]
    ResponseFunctionCallArgumentsDone(ResponseFunctionCallArgumentsDoneEvent),
    #[serde(rename = "response.output_item.done")]
    ResponseOutputItemDone(ResponseOutputItemDoneEvent),
    #[serde(rename = "input_audio_buffer.speech_started")]
    SpeechStarted(SpeechStartedEvent),
    #[serde(rename = "input_audio_buffer.speech_stopped")]
    SpeechStopped(SpeechStoppedEvent),
    #[serde(other)]
    Unknown,
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::content::message::{MessageItem, MessageRole};
    use crate::response::ResponseConfig;
    use crate::session::Session;
    use crate::Item;

    fn round_trip(event: ClientEvent) {
        let encoded = serde_json::to_string(&event).expect("encode");
        let decoded: ClientEvent = serde_json::from_str(&encoded).expect("decode");
        assert_eq!(decoded, event);
    }

    #[test]
    fn every_outbound_variant_round_trips() {
        round_trip(ClientEvent::SessionUpdate(SessionUpdateEvent::new(
            Session::new().with_instructions("Ask one question at a time."),
        )));
        round_trip(ClientEvent::ConversationItemCreate(
            ConversationItemCreateEvent::new(Item::Message(
                MessageItem::input_text(MessageRole::User, "hello").with_id("item_1"),
            )),
        ));
        round_trip(ClientEvent::ConversationItemTruncate(
            ConversationItemTruncateEvent::new("item_2", 0, 850),
        ));
        round_trip(ClientEvent::InputAudioBufferAppend(
            InputAudioBufferAppendEvent::new("AAECAw==".to_string()),
        ));
        round_trip(ClientEvent::InputAudioBufferCommit(
            InputAudioBufferCommitEvent::new(),
        ));
        round_trip(ClientEvent::ResponseCreate(
            ResponseCreateEvent::new().with_config(ResponseConfig::text_only()),
        ));
    }

    #[test]
    fn truncate_event_wire_shape() {
        let event = ClientEvent::ConversationItemTruncate(ConversationItemTruncateEvent::new(
            "item_9", 0, 850,
        ));
        let json = serde_json::to_value(&event).expect("event");
        assert_eq!(
            json,
            serde_json::json!({
                "type": "conversation.item.truncate",
                "item_id": "item_9",
                "content_index": 0,
                "audio_end_ms": 850,
            })
        );
    }

    #[test]
    fn unknown_server_event_is_tolerated() {
        let decoded: ServerEvent = serde_json::from_str(
            r#"{"type": "response.created", "event_id": "evt_1", "response": {"id": "resp_1"}}"#,
        )
        .expect("decode");
        assert_eq!(decoded, ServerEvent::Unknown);
    }

    #[test]
    fn text_delta_decodes() {
        let decoded: ServerEvent = serde_json::from_str(
            r#"{
                "type": "response.text.delta",
                "event_id": "evt_5",
                "response_id": "resp_1",
                "item_id": "item_3",
                "output_index": 0,
                "content_index": 0,
                "delta": "He"
            }"#,
        )
        .expect("decode");
        match decoded {
            ServerEvent::ResponseTextDelta(event) => {
                assert_eq!(event.item_id(), "item_3");
                assert_eq!(event.content_index(), 0);
                assert_eq!(event.delta(), "He");
            }
            other => panic!("unexpected event: {other:?}"),
        }
    }

    #[test]
    fn speech_started_decodes() {
        let decoded: ServerEvent = serde_json::from_str(
            r#"{
                "type": "input_audio_buffer.speech_started",
                "event_id": "evt_8",
                "audio_start_ms": 120,
                "item_id": "item_6"
            }"#,
        )
        .expect("decode");
        match decoded {
            ServerEvent::SpeechStarted(event) => {
                assert_eq!(event.audio_start_ms(), Some(120));
                assert_eq!(event.item_id(), Some("item_6"));
            }
            other => panic!("unexpected event: {other:?}"),
        }
    }

    #[test]
    fn error_event_decodes() {
        let decoded: ServerEvent = serde_json::from_str(
            r#"{
                "type": "error",
                "event_id": "evt_9",
                "error": {
                    "type": "invalid_request_error",
                    "code": "invalid_value",
                    "message": "Unknown parameter.",
                    "param": "session.foo"
                }
            }"#,
        )
        .expect("decode");
        match decoded {
            ServerEvent::Error(event) => {
                assert_eq!(event.error().message(), "Unknown parameter.");
                assert_eq!(event.error().code(), Some("invalid_value"));
            }
            other => panic!("unexpected event: {other:?}"),
        }
    }
}
