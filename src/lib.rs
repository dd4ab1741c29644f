//! Realtime conversation sessions for voice and text self-reflection.
//!
//! A [`Conversation`] connects to a realtime model endpoint over a peer
//! connection (or WebSocket), mirrors the server-side conversation as an
//! ordered transcript and moves 24kHz PCM16 audio in both directions while
//! voice is engaged. Protocol types live in [`types`], audio plumbing in
//! [`audio`].

mod config;
mod conversation;
mod error;

pub mod connector;

pub use reflect_realtime_audio as audio;
pub use reflect_realtime_types as types;

pub use config::{
    ConnectOptions, EphemeralCredential, DEFAULT_BASE_URL, DEFAULT_MODEL, DEFAULT_VOICE,
    DEFAULT_WS_URL,
};
pub use connector::{Connector, DisconnectHook, EventStream, RtcConnector, WsConnector};
pub use conversation::{Conversation, Snapshot};
pub use error::{ConnectorError, ConversationError};
