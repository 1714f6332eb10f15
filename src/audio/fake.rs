//! Scripted stand-in for the audio device, driven entirely by the tests.

use std::collections::VecDeque;
use std::path::{Path, PathBuf};

use crate::graph::GraphTap;

use super::resource::{AudioResource, MediaError, PlayFailure, PlayRequest, ResourceEvent};

/// How the fake answers `play()`.
#[derive(Debug, Clone)]
pub enum PlayOutcome {
    Succeed,
    Block,
    Fail(MediaError),
    /// Leave the request open; the test resolves it.
    Manual,
}

pub struct FakeResource {
    pub source: Option<PathBuf>,
    pub position: f64,
    pub volume: f32,
    pub playing: bool,
    pub loads: Vec<PathBuf>,
    pub requests: Vec<PlayRequest>,
    pub tap: Option<GraphTap>,
    pub outcome: PlayOutcome,
    events: VecDeque<ResourceEvent>,
    next_request: u64,
}

impl FakeResource {
    pub fn new() -> Self {
        Self {
            source: None,
            position: 0.0,
            volume: 1.0,
            playing: false,
            loads: Vec::new(),
            requests: Vec::new(),
            tap: None,
            outcome: PlayOutcome::Succeed,
            events: VecDeque::new(),
            next_request: 1,
        }
    }

    pub fn with_outcome(outcome: PlayOutcome) -> Self {
        Self {
            outcome,
            ..Self::new()
        }
    }

    pub fn push_event(&mut self, event: ResourceEvent) {
        self.events.push_back(event);
    }

    pub fn resolve(&mut self, request: PlayRequest, result: Result<(), PlayFailure>) {
        if result.is_ok() {
            self.playing = true;
        }
        self.push_event(ResourceEvent::PlayResolved { request, result });
    }

    pub fn last_request(&self) -> PlayRequest {
        *self.requests.last().expect("no play request issued")
    }
}

impl AudioResource for FakeResource {
    fn load(&mut self, source: &Path) {
        self.source = Some(source.to_path_buf());
        self.loads.push(source.to_path_buf());
        self.position = 0.0;
        self.playing = false;
    }

    fn play(&mut self) -> PlayRequest {
        let request = PlayRequest(self.next_request);
        self.next_request += 1;
        self.requests.push(request);
        match self.outcome.clone() {
            PlayOutcome::Succeed => self.resolve(request, Ok(())),
            PlayOutcome::Block => self.resolve(request, Err(PlayFailure::NotAllowed)),
            PlayOutcome::Fail(err) => self.resolve(request, Err(PlayFailure::Media(err))),
            PlayOutcome::Manual => {}
        }
        request
    }

    fn pause(&mut self) {
        self.playing = false;
    }

    fn position(&self) -> f64 {
        self.position
    }

    fn set_position(&mut self, secs: f64) {
        self.position = secs;
    }

    fn set_volume(&mut self, volume: f32) {
        self.volume = volume;
    }

    fn has_source(&self) -> bool {
        self.source.is_some()
    }

    fn clear(&mut self) {
        self.source = None;
        self.playing = false;
    }

    fn connect_graph(&mut self, tap: Option<GraphTap>) {
        self.tap = tap;
    }

    fn poll_event(&mut self) -> Option<ResourceEvent> {
        self.events.pop_front()
    }
}
