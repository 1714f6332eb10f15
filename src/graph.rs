//! The processing graph spliced between the decoded audio and the output.
//!
//! Signal path: source -> five equalizer stages -> analyser -> output.
//!
//! The graph owns a small context state machine (`Suspended`, `Running`,
//! `Closed`). Gains applied while the context is not running are remembered
//! and pushed to the filters on [`ProcessingGraph::resume`]. A closed graph is
//! never reused; callers check [`ProcessingGraph::is_alive`] and build a new
//! one instead.
//!
//! DSP runs on rodio's mixer thread through a [`GraphTap`], which shares the
//! graph core with the engine thread.

use std::sync::atomic::{AtomicU8, Ordering};
use std::sync::{Arc, Mutex};

use thiserror::Error;

use crate::config::GraphSettings;
use crate::equalizer::BAND_COUNT;

mod analyser;
mod chain;
mod source;

use analyser::Analyser;
use chain::FilterChain;
pub use source::GraphSource;

#[derive(Debug, Error)]
pub enum GraphError {
    #[error("band at {frequency_hz} Hz cannot be built at {sample_rate} Hz")]
    Band { frequency_hz: f32, sample_rate: u32 },
    #[error("analyser size {0} must be a power of two between 32 and 32768")]
    FftSize(usize),
    #[error("analyser decibel range [{min}, {max}] is empty")]
    DecibelRange { min: f32, max: f32 },
    #[error("processing graph is disabled")]
    Disabled,
    #[error("processing graph is closed")]
    Closed,
}

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
#[repr(u8)]
pub enum ContextState {
    Suspended = 0,
    Running = 1,
    Closed = 2,
}

impl ContextState {
    fn from_u8(v: u8) -> Self {
        match v {
            0 => ContextState::Suspended,
            1 => ContextState::Running,
            _ => ContextState::Closed,
        }
    }
}

struct GraphCore {
    state: AtomicU8,
    chain: Mutex<FilterChain>,
    analyser: Mutex<Analyser>,
}

impl GraphCore {
    fn state(&self) -> ContextState {
        ContextState::from_u8(self.state.load(Ordering::Acquire))
    }

    fn set_state(&self, state: ContextState) {
        self.state.store(state as u8, Ordering::Release);
    }
}

/// Handle the audio source uses to run samples through the graph.
#[derive(Clone)]
pub struct GraphTap(Arc<GraphCore>);

impl GraphTap {
    /// Run one interleaved block through the filter chain and feed the
    /// analyser. A closed graph leaves the block untouched.
    pub fn process(&self, block: &mut [f32], sample_rate: u32, channels: u16) {
        let state = self.0.state();
        if state == ContextState::Closed {
            return;
        }

        if let Ok(mut chain) = self.0.chain.lock() {
            chain.configure(sample_rate, channels);
            chain.process(block);
        }

        if state == ContextState::Running {
            // The mixer thread never waits on the UI reading the spectrum.
            if let Ok(mut analyser) = self.0.analyser.try_lock() {
                analyser.push_frames(block, channels);
            }
        }
    }

    #[cfg(test)]
    pub fn is_alive(&self) -> bool {
        self.0.state() != ContextState::Closed
    }

    /// Current spectrum, or `None` unless the graph is running.
    pub fn frequency_data(&self) -> Option<Vec<u8>> {
        if self.0.state() != ContextState::Running {
            return None;
        }
        let mut analyser = self.0.analyser.lock().ok()?;
        Some(analyser.frequency_data())
    }
}

impl std::fmt::Debug for GraphTap {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GraphTap")
            .field("state", &self.0.state())
            .finish()
    }
}

/// Engine-side owner of one graph instance.
pub struct ProcessingGraph {
    core: Arc<GraphCore>,
    targets: [f32; BAND_COUNT],
}

impl ProcessingGraph {
    /// Build a suspended graph. Every band filter and the analyser are
    /// validated up front so a bad configuration fails here and not on the
    /// mixer thread.
    pub fn build(settings: &GraphSettings) -> Result<Self, GraphError> {
        if !settings.enabled {
            return Err(GraphError::Disabled);
        }
        let chain = FilterChain::new(settings.sample_rate, settings.gain_time_constant)?;
        let analyser = Analyser::new(
            settings.fft_size,
            settings.smoothing,
            settings.min_decibels,
            settings.max_decibels,
        )?;

        Ok(Self {
            core: Arc::new(GraphCore {
                state: AtomicU8::new(ContextState::Suspended as u8),
                chain: Mutex::new(chain),
                analyser: Mutex::new(analyser),
            }),
            targets: [0.0; BAND_COUNT],
        })
    }

    #[cfg(test)]
    pub fn state(&self) -> ContextState {
        self.core.state()
    }

    pub fn is_alive(&self) -> bool {
        self.core.state() != ContextState::Closed
    }

    pub fn tap(&self) -> GraphTap {
        GraphTap(self.core.clone())
    }

    /// Move the context to `Running` and push the stored gain targets.
    pub fn resume(&mut self) -> Result<(), GraphError> {
        match self.core.state() {
            ContextState::Closed => Err(GraphError::Closed),
            ContextState::Running => Ok(()),
            ContextState::Suspended => {
                self.core.set_state(ContextState::Running);
                self.push_targets();
                Ok(())
            }
        }
    }

    /// Terminal. Audio still flowing through an old tap passes unprocessed.
    pub fn close(&mut self) {
        self.core.set_state(ContextState::Closed);
        if let Ok(mut analyser) = self.core.analyser.lock() {
            analyser.clear();
        }
    }

    /// Record new band targets. They reach the filters only while the
    /// context is running; returns whether they were applied now.
    pub fn apply_gains(&mut self, gains: &[f32; BAND_COUNT]) -> bool {
        self.targets = *gains;
        if self.core.state() != ContextState::Running {
            return false;
        }
        self.push_targets();
        true
    }

    #[cfg(test)]
    pub fn targets(&self) -> [f32; BAND_COUNT] {
        self.targets
    }

    /// Gains the filters are currently smoothing toward.
    #[cfg(test)]
    pub fn applied_targets(&self) -> Option<[f32; BAND_COUNT]> {
        self.core.chain.lock().ok().map(|chain| chain.targets())
    }

    #[cfg(test)]
    pub fn frequency_data(&self) -> Option<Vec<u8>> {
        self.tap().frequency_data()
    }

    fn push_targets(&self) {
        if let Ok(mut chain) = self.core.chain.lock() {
            chain.set_targets(&self.targets);
        }
    }
}
