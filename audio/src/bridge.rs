use bytes::Bytes;
use tokio::sync::mpsc;

use crate::error::AudioError;
use crate::playback::PlaybackCursor;

/// Receives captured microphone audio as little-endian PCM16 at the wire
/// sample rate, one buffer per device callback.
pub type CaptureSink = mpsc::UnboundedSender<Bytes>;

/// Receives out-of-band notifications from the bridge.
pub type NoticeSink = mpsc::UnboundedSender<BridgeNotice>;

#[derive(Debug)]
pub enum BridgeNotice {
    /// The playback queue ran dry and the output node paused.
    Drained,
    /// An audio thread failed. Playback or capture stops for the affected
    /// direction; the session stays usable.
    Fault(AudioError),
}

/// Narrow seam between the conversation state machine and a platform audio
/// backend. The session never touches a device API directly; backends
/// convert between device formats and the wire format on their own threads
/// and hand results across via the sinks.
///
/// All methods return promptly. Work that blocks, such as device start, is
/// expected to happen on a thread the backend owns.
pub trait AudioBridge: Send + Sync {
    /// Prepares both directions and begins rendering queued playback audio.
    fn start(&self, notices: NoticeSink) -> Result<(), AudioError>;

    /// Releases devices and stops all backend threads. Idempotent.
    fn shutdown(&self);

    /// Starts forwarding captured microphone audio to `sink` until
    /// `stop_capture` is called.
    fn start_capture(&self, sink: CaptureSink) -> Result<(), AudioError>;

    fn stop_capture(&self);

    /// Schedules a decoded PCM16 chunk of the given response item for
    /// playback after everything already queued.
    fn enqueue(&self, item_id: &str, audio: &[u8]) -> Result<(), AudioError>;

    /// Halts the output node and discards queued audio. Returns how far
    /// playback got into the oldest queued item, or `None` when nothing
    /// was queued.
    fn halt_playback(&self) -> Option<PlaybackCursor>;

    /// True while decoded audio remains queued for the output device.
    fn is_playing(&self) -> bool;
}
