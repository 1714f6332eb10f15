use thiserror::Error;

/// Failures that stop the playback engine from starting or being reached.
#[derive(Debug, Error)]
pub enum EngineError {
    #[error("no audio output device: {0}")]
    OutputUnavailable(String),
    #[error("failed to spawn the audio thread: {0}")]
    Spawn(#[from] std::io::Error),
    #[error("audio thread is gone")]
    EngineGone,
}
