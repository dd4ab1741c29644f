//! Error types for the realtime session crate.

use thiserror::Error;

use crate::types::events::server::ErrorDetails;
use reflect_realtime_audio::AudioError;

/// Errors raised while establishing or driving a transport connector.
#[derive(Error, Debug)]
pub enum ConnectorError {
    /// The data channel is not open. The event was not sent and is never
    /// buffered for later.
    #[error("data channel is not open")]
    ChannelNotOpen,

    /// Peer connection or media setup failed before the channel existed.
    #[error("connection setup failed: {0}")]
    Handshake(String),

    /// The remote endpoint rejected the session description offer.
    #[error("sdp exchange failed with status {status}: {body}")]
    SdpExchange { status: u16, body: String },

    #[error("http error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("webrtc error: {0}")]
    WebRtc(#[from] webrtc::Error),

    #[error("websocket error: {0}")]
    WebSocket(#[from] tokio_tungstenite::tungstenite::Error),

    /// An inbound payload failed to decode. Later events still flow.
    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),

    /// The transport closed underneath an in-flight operation.
    #[error("connection closed")]
    Closed,
}

/// Errors surfaced by a [`Conversation`](crate::Conversation), either as
/// command results or on its side error stream.
#[derive(Error, Debug)]
pub enum ConversationError {
    /// An operation that needs a live session ran before the server
    /// confirmed one.
    #[error("session not established")]
    SessionNotEstablished,

    /// A voice operation ran on a conversation built without an audio
    /// bridge.
    #[error("no audio bridge configured")]
    AudioUnavailable,

    /// The transport went away before or during the operation.
    #[error("transport disconnected")]
    Disconnected,

    #[error(transparent)]
    Connector(#[from] ConnectorError),

    #[error(transparent)]
    Audio(#[from] AudioError),

    /// Error event reported by the server. Non-fatal to the session.
    #[error("server error: {0}")]
    Server(ErrorDetails),
}
