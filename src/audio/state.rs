//! Transport state and the pure rules for moving through the queue.

use rand::Rng;

use crate::library::{Track, TrackId};

use super::types::LoopMode;

#[derive(Debug, Copy, Clone, PartialEq, Eq, Default)]
pub enum Phase {
    #[default]
    Idle,
    /// A play request is in flight.
    Loading,
    Playing,
    Paused,
    /// The queue ran out with nothing to continue to.
    Ended,
}

/// What "next" (or a natural end) should do.
#[derive(Debug, Clone, PartialEq)]
pub enum Advance {
    Stay,
    RestartCurrent,
    Play(Track),
    Exhausted,
}

/// What "previous" should do.
#[derive(Debug, Clone, PartialEq)]
pub enum Retreat {
    Stay,
    RestartCurrent,
    Play(Track),
}

#[derive(Debug, Clone)]
pub struct TransportState {
    current: Option<Track>,
    queue: Vec<Track>,
    history: Vec<Track>,
    phase: Phase,
    current_time: f64,
    duration: f64,
    volume: f32,
    loop_mode: LoopMode,
    shuffle: bool,
}

impl Default for TransportState {
    fn default() -> Self {
        Self {
            current: None,
            queue: Vec::new(),
            history: Vec::new(),
            phase: Phase::Idle,
            current_time: 0.0,
            duration: 0.0,
            volume: 1.0,
            loop_mode: LoopMode::NoLoop,
            shuffle: false,
        }
    }
}

impl TransportState {
    pub fn current(&self) -> Option<&Track> {
        self.current.as_ref()
    }

    pub fn queue(&self) -> &[Track] {
        &self.queue
    }

    pub fn history(&self) -> &[Track] {
        &self.history
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn is_playing(&self) -> bool {
        self.phase == Phase::Playing
    }

    pub fn current_time(&self) -> f64 {
        self.current_time
    }

    pub fn duration(&self) -> f64 {
        self.duration
    }

    pub fn volume(&self) -> f32 {
        self.volume
    }

    pub fn loop_mode(&self) -> LoopMode {
        self.loop_mode
    }

    pub fn shuffle(&self) -> bool {
        self.shuffle
    }

    /// Position of the current track in the queue, matched by id.
    pub fn current_index(&self) -> Option<usize> {
        let id = self.current.as_ref()?.id;
        self.queue.iter().position(|t| t.id == id)
    }

    /// Make `track` current for a fresh start: recorded in history, clock
    /// reset, waiting on a play request.
    pub fn select(&mut self, track: Track) {
        self.history.push(track.clone());
        self.current = Some(track);
        self.current_time = 0.0;
        self.duration = 0.0;
        self.phase = Phase::Loading;
    }

    /// Make `track` current without starting it.
    pub fn set_current(&mut self, track: Track, phase: Phase) {
        self.current = Some(track);
        self.current_time = 0.0;
        self.duration = 0.0;
        self.phase = phase;
    }

    pub fn set_queue(&mut self, queue: Vec<Track>) {
        self.queue = queue;
    }

    pub fn set_phase(&mut self, phase: Phase) {
        self.phase = phase;
    }

    /// Clamped to the duration once the duration is known.
    pub fn set_time(&mut self, secs: f64) {
        if !secs.is_finite() {
            return;
        }
        let secs = secs.max(0.0);
        self.current_time = if self.duration > 0.0 {
            secs.min(self.duration)
        } else {
            secs
        };
    }

    pub fn set_duration(&mut self, secs: f64) {
        if secs.is_finite() && secs > 0.0 {
            self.duration = secs;
            self.current_time = self.current_time.min(secs);
        }
    }

    pub fn set_volume(&mut self, volume: f32) -> bool {
        if !volume.is_finite() {
            return false;
        }
        self.volume = volume.clamp(0.0, 1.0);
        true
    }

    pub fn set_shuffle(&mut self, on: bool) {
        self.shuffle = on;
    }

    pub fn toggle_shuffle(&mut self) -> bool {
        self.shuffle = !self.shuffle;
        self.shuffle
    }

    pub fn set_loop_mode(&mut self, mode: LoopMode) {
        self.loop_mode = mode;
    }

    pub fn cycle_loop_mode(&mut self) -> LoopMode {
        self.loop_mode = self.loop_mode.cycle();
        self.loop_mode
    }

    /// Drop the current track and rewind.
    pub fn clear(&mut self) {
        self.current = None;
        self.current_time = 0.0;
        self.duration = 0.0;
        self.phase = Phase::Idle;
    }

    /// Rename every held copy of the track.
    pub fn rename(&mut self, id: TrackId, title: &str) {
        let held = self
            .current
            .iter_mut()
            .chain(self.queue.iter_mut())
            .chain(self.history.iter_mut());
        for track in held.filter(|t| t.id == id) {
            track.rename(title);
        }
    }

    /// Remove the track from the queue. Returns whether it is the current one.
    pub fn forget(&mut self, id: TrackId) -> bool {
        self.queue.retain(|t| t.id != id);
        self.current.as_ref().is_some_and(|t| t.id == id)
    }

    /// Decide the move for "next" or a natural end.
    pub fn next_step<R: Rng + ?Sized>(&self, rng: &mut R) -> Advance {
        if self.current.is_none() || self.queue.is_empty() {
            return Advance::Stay;
        }
        if self.loop_mode == LoopMode::LoopOne {
            return Advance::RestartCurrent;
        }
        let Some(index) = self.current_index() else {
            return Advance::Stay;
        };

        let len = self.queue.len();
        let next = if self.shuffle {
            rng.gen_range(0..len)
        } else {
            index + 1
        };

        if next < len {
            Advance::Play(self.queue[next].clone())
        } else if self.loop_mode == LoopMode::LoopAll {
            Advance::Play(self.queue[0].clone())
        } else {
            Advance::Exhausted
        }
    }

    /// Decide the move for "previous" given the resource position.
    pub fn prev_step(&self, position: f64, restart_threshold: f64) -> Retreat {
        if self.current.is_none() || self.queue.is_empty() {
            return Retreat::Stay;
        }
        if position > restart_threshold {
            return Retreat::RestartCurrent;
        }
        let Some(index) = self.current_index() else {
            return Retreat::Stay;
        };
        let prev = if index == 0 {
            self.queue.len() - 1
        } else {
            index - 1
        };
        Retreat::Play(self.queue[prev].clone())
    }
}
