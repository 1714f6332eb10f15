//! Playback engine.
//!
//! A single audio thread owns the [`controller::Controller`], which owns the
//! transport state, the audio resource and the processing graph. Everyone
//! else talks to it through [`AudioCmd`]s and reads the published
//! [`PlaybackInfo`].

mod controller;
#[cfg(test)]
mod fake;
mod player;
mod resource;
mod sink;
mod state;
mod thread;
mod types;

pub use player::AudioPlayer;
pub use state::Phase;
pub use types::{AudioCmd, LoopMode, PlaybackHandle, PlaybackInfo};
