//! Audio side of the realtime session: wire codec, sample-rate conversion,
//! the playback queue with per-item position accounting, and the narrow
//! [`AudioBridge`] seam the session drives. The cpal-backed duplex engine
//! lives behind the `device` feature so the protocol core builds headless.

pub mod bridge;
pub mod codec;
pub mod playback;
pub mod resample;

#[cfg(feature = "device")]
pub mod device;

mod error;

pub use bridge::{AudioBridge, BridgeNotice, CaptureSink, NoticeSink};
pub use codec::{WIRE_CHANNELS, WIRE_SAMPLE_RATE};
pub use error::AudioError;
pub use playback::{PlaybackCursor, PlaybackQueue};
