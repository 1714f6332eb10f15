//! Audio-related small types and handles.
//!
//! Commands sent to the audio thread, the snapshot it publishes, and the
//! handles collaborators use to read them.

use std::sync::{Arc, Mutex};

use crate::equalizer::EqualizerSettings;
use crate::graph::GraphTap;
use crate::library::{Track, TrackId};

use super::state::Phase;

#[derive(Debug, Copy, Clone, PartialEq, Eq, Default)]
pub enum LoopMode {
    /// Stop at the end of the queue.
    #[default]
    NoLoop,
    /// Wrap around to the start of the queue.
    LoopAll,
    /// Repeat the current track.
    LoopOne,
}

impl LoopMode {
    /// `NoLoop -> LoopAll -> LoopOne -> NoLoop`
    pub fn cycle(self) -> Self {
        match self {
            LoopMode::NoLoop => LoopMode::LoopAll,
            LoopMode::LoopAll => LoopMode::LoopOne,
            LoopMode::LoopOne => LoopMode::NoLoop,
        }
    }
}

#[derive(Debug)]
pub enum AudioCmd {
    /// Make `track` current and start it, replacing the queue when one is given.
    PlayTrack {
        track: Track,
        queue: Option<Vec<Track>>,
    },
    /// Pause when playing, resume otherwise.
    TogglePause,
    Play,
    Pause,
    /// Pause, rewind and clear the current track.
    Stop,
    /// Seek to an absolute position in seconds.
    Seek(f64),
    /// Seek by the specified number of seconds (positive or negative).
    SeekBy(i32),
    Next,
    Prev,
    SetVolume(f32),
    ToggleShuffle,
    SetShuffle(bool),
    /// Cycle the loop mode.
    ToggleLoop,
    SetLoopMode(LoopMode),
    SetEqualizer(EqualizerSettings),
    /// The library renamed a track.
    RenameTrack { id: TrackId, title: String },
    /// The library removed a track.
    ForgetTrack(TrackId),
    /// Reopen the output device and rebuild the graph around it.
    ResetOutput,
    /// Quit the audio thread, optionally fading out over `fade_out_ms` milliseconds.
    Quit { fade_out_ms: u64 },
}

/// Runtime playback information shared with the UI and MPRIS.
#[derive(Debug, Clone)]
pub struct PlaybackInfo {
    pub current: Option<Track>,
    pub phase: Phase,
    pub playing: bool,
    /// Seconds into the current track.
    pub current_time: f64,
    /// Seconds; 0 while unknown.
    pub duration: f64,
    pub volume: f32,
    pub loop_mode: LoopMode,
    pub shuffle: bool,
    pub queue: Arc<[Track]>,
    pub history_len: usize,
    pub equalizer: EqualizerSettings,
    /// Whether the equalizer/analyser graph is bound and alive.
    pub graph_active: bool,
    pub last_error: Option<String>,
}

impl Default for PlaybackInfo {
    fn default() -> Self {
        Self {
            current: None,
            phase: Phase::Idle,
            playing: false,
            current_time: 0.0,
            duration: 0.0,
            volume: 1.0,
            loop_mode: LoopMode::default(),
            shuffle: false,
            queue: Arc::from(Vec::new()),
            history_len: 0,
            equalizer: EqualizerSettings::default(),
            graph_active: false,
            last_error: None,
        }
    }
}

pub type PlaybackHandle = Arc<Mutex<PlaybackInfo>>;
pub type SpectrumHandle = Arc<Mutex<Option<GraphTap>>>;
