/// Failures on the audio side of a session.
///
/// None of these end the session; the affected capture or playback
/// operation simply does not proceed.
#[derive(Debug, thiserror::Error)]
pub enum AudioError {
    #[error("failed to construct resampler: {0}")]
    ResamplerConstruction(#[from] rubato::ResamplerConstructionError),

    #[error("resampling failed: {0}")]
    Resample(#[from] rubato::ResampleError),

    #[error("malformed audio payload: {0}")]
    MalformedPayload(String),

    #[error("no usable audio device")]
    NoDevice,

    #[error("audio stream error: {0}")]
    Stream(String),

    #[error("audio engine is not running")]
    EngineStopped,
}
