//! The single playable audio resource, seen from the controller.

use std::fmt;
use std::path::Path;

use thiserror::Error;

use crate::graph::GraphTap;

/// Ticket for one `play()` call. Its outcome arrives later as
/// [`ResourceEvent::PlayResolved`] carrying the same ticket.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct PlayRequest(pub u64);

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum MediaErrorKind {
    /// Loading was interrupted by the engine itself.
    Aborted,
    /// The source could not be fetched.
    Network,
    Decode,
    SourceNotSupported,
}

impl fmt::Display for MediaErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            MediaErrorKind::Aborted => "aborted",
            MediaErrorKind::Network => "network error",
            MediaErrorKind::Decode => "decode error",
            MediaErrorKind::SourceNotSupported => "source not supported",
        })
    }
}

#[derive(Debug, Clone, PartialEq, Error)]
#[error("{kind}: {message}")]
pub struct MediaError {
    pub kind: MediaErrorKind,
    pub message: String,
}

impl MediaError {
    pub fn new(kind: MediaErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }
}

/// Why a `play()` did not start playback.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum PlayFailure {
    /// The platform refused to start audio without a user gesture.
    #[error("playback not allowed")]
    NotAllowed,
    /// Superseded by a newer load or a teardown.
    #[error("playback aborted")]
    Aborted,
    #[error(transparent)]
    Media(#[from] MediaError),
}

#[derive(Debug, Clone, PartialEq)]
pub enum ResourceEvent {
    /// Playback position in seconds.
    TimeUpdate(f64),
    /// Duration in seconds. May arrive after the first time update.
    LoadedMetadata { duration: f64 },
    /// Playback reached the end of the source.
    Ended,
    Error(MediaError),
    PlayResolved {
        request: PlayRequest,
        result: Result<(), PlayFailure>,
    },
}

/// The one audio element the engine drives.
///
/// `load` is fire-and-forget; failures come back as [`ResourceEvent::Error`]
/// or as a failed play resolution.
pub trait AudioResource {
    fn load(&mut self, source: &Path);
    fn play(&mut self) -> PlayRequest;
    fn pause(&mut self);
    /// Seconds.
    fn position(&self) -> f64;
    fn set_position(&mut self, secs: f64);
    fn set_volume(&mut self, volume: f32);
    fn has_source(&self) -> bool;
    /// Detach the current source.
    fn clear(&mut self);
    /// Route subsequently loaded audio through a graph, or straight out.
    fn connect_graph(&mut self, tap: Option<GraphTap>);
    fn poll_event(&mut self) -> Option<ResourceEvent>;
}
