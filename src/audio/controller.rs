//! Transport controller: the one owner of playback state, the audio resource
//! and the processing graph.
//!
//! Every public method runs to completion on the audio thread. The only
//! deferred outcome is `play()`, whose result comes back through [`pump`]
//! and is matched against the request that is still current.
//!
//! [`pump`]: Controller::pump

use std::sync::Arc;

use rand::SeedableRng;
use rand::rngs::StdRng;
use tracing::{debug, error, info, warn};

use crate::config::{AudioSettings, GraphSettings};
use crate::equalizer::EqualizerSettings;
use crate::graph::{GraphError, GraphTap, ProcessingGraph};
use crate::library::{Track, TrackId};

use super::resource::{AudioResource, MediaError, MediaErrorKind, PlayFailure, PlayRequest, ResourceEvent};
use super::state::{Advance, Phase, Retreat, TransportState};
use super::types::{LoopMode, PlaybackInfo};

#[derive(Debug, Copy, Clone)]
struct PendingPlay {
    request: PlayRequest,
    track: TrackId,
}

pub struct Controller<R: AudioResource> {
    state: TransportState,
    resource: R,
    graph: Option<ProcessingGraph>,
    graph_settings: GraphSettings,
    equalizer: EqualizerSettings,
    pending: Option<PendingPlay>,
    rng: StdRng,
    prev_restart_secs: f64,
    last_error: Option<String>,
    queue_snapshot: Option<Arc<[Track]>>,
}

impl<R: AudioResource> Controller<R> {
    pub fn new(resource: R, audio: &AudioSettings, graph_settings: GraphSettings) -> Self {
        Self::with_rng(resource, audio, graph_settings, StdRng::from_entropy())
    }

    /// Like [`Controller::new`] with a caller-chosen shuffle source.
    pub fn with_rng(
        resource: R,
        audio: &AudioSettings,
        graph_settings: GraphSettings,
        rng: StdRng,
    ) -> Self {
        let mut controller = Self {
            state: TransportState::default(),
            resource,
            graph: None,
            graph_settings,
            equalizer: EqualizerSettings::default(),
            pending: None,
            rng,
            prev_restart_secs: audio.prev_restart_secs,
            last_error: None,
            queue_snapshot: None,
        };
        controller.state.set_volume(audio.volume);
        controller.resource.set_volume(controller.state.volume());
        controller.bind_graph();
        controller
    }

    /// Build a fresh graph and route the resource through it. A graph that
    /// cannot be built leaves plain playback in place.
    fn bind_graph(&mut self) {
        match ProcessingGraph::build(&self.graph_settings) {
            Ok(mut graph) => {
                graph.apply_gains(&self.equalizer.gains);
                self.resource.connect_graph(Some(graph.tap()));
                self.graph = Some(graph);
            }
            Err(GraphError::Disabled) => {
                debug!("equalizer graph disabled by configuration");
                self.resource.connect_graph(None);
                self.graph = None;
            }
            Err(err) => {
                warn!(%err, "equalizer unavailable, continuing without it");
                self.resource.connect_graph(None);
                self.graph = None;
            }
        }
    }

    /// Bring the graph context to running before anything starts playing.
    fn resume_graph(&mut self) {
        if self.graph.as_ref().is_some_and(|g| !g.is_alive()) {
            debug!("graph was closed, building a new one");
            self.bind_graph();
        }
        if let Some(graph) = self.graph.as_mut() {
            if let Err(err) = graph.resume() {
                warn!(%err, "could not resume equalizer graph");
            }
        }
    }

    fn invalidate_queue(&mut self) {
        self.queue_snapshot = None;
    }

    fn issue_play(&mut self, track: TrackId) {
        let request = self.resource.play();
        self.pending = Some(PendingPlay { request, track });
        self.state.set_phase(Phase::Loading);
    }

    /// Make `track` current and start it. A given `queue` replaces the
    /// current one first.
    pub fn play_track(&mut self, track: Track, queue: Option<Vec<Track>>) {
        self.resume_graph();
        if let Some(queue) = queue {
            self.state.set_queue(queue);
            self.invalidate_queue();
        }

        if !track.has_source() {
            error!(id = %track.id, title = %track.title, "track has no audio source");
            self.pending = None;
            self.resource.pause();
            self.resource.clear();
            self.state.set_current(track, Phase::Paused);
            return;
        }

        debug!(id = %track.id, title = %track.title, "loading track");
        self.resource.load(&track.source);
        let id = track.id;
        self.state.select(track);
        self.issue_play(id);
    }

    /// Start or resume the current track.
    pub fn play(&mut self) {
        let Some(track) = self.state.current().cloned() else {
            return;
        };
        self.resume_graph();
        if !track.has_source() {
            error!(id = %track.id, title = %track.title, "track has no audio source");
            self.state.set_phase(Phase::Paused);
            return;
        }
        if !self.resource.has_source() {
            debug!(id = %track.id, "restoring lost source");
            self.resource.load(&track.source);
        }
        self.issue_play(track.id);
    }

    /// Immediate; any play request still in flight is dropped.
    pub fn pause(&mut self) {
        self.resource.pause();
        self.pending = None;
        if matches!(self.state.phase(), Phase::Playing | Phase::Loading) {
            self.state.set_phase(Phase::Paused);
        }
    }

    /// Pause when playing (or about to), resume otherwise.
    pub fn toggle_play(&mut self) {
        if self.state.current().is_none() {
            return;
        }
        match self.state.phase() {
            Phase::Playing | Phase::Loading => self.pause(),
            _ => self.play(),
        }
    }

    pub fn stop(&mut self) {
        self.resource.pause();
        self.resource.set_position(0.0);
        self.pending = None;
        self.state.clear();
    }

    /// Non-finite positions are ignored.
    pub fn seek(&mut self, secs: f64) {
        if !secs.is_finite() {
            return;
        }
        let mut target = secs.max(0.0);
        if self.state.duration() > 0.0 {
            target = target.min(self.state.duration());
        }
        self.resource.set_position(target);
        self.state.set_time(target);
    }

    pub fn seek_by(&mut self, delta_secs: f64) {
        self.seek(self.state.current_time() + delta_secs);
    }

    fn restart_current(&mut self) {
        self.resource.set_position(0.0);
        self.state.set_time(0.0);
    }

    pub fn next(&mut self) {
        let step = self.state.next_step(&mut self.rng);
        self.advance(step);
    }

    fn advance(&mut self, step: Advance) {
        match step {
            Advance::Stay => {}
            Advance::RestartCurrent => {
                self.restart_current();
                self.play();
            }
            Advance::Play(track) => self.play_track(track, None),
            Advance::Exhausted => {
                debug!("queue exhausted");
                self.resource.pause();
                self.pending = None;
                self.state.set_phase(Phase::Ended);
            }
        }
    }

    pub fn prev(&mut self) {
        let position = self.resource.position();
        match self.state.prev_step(position, self.prev_restart_secs) {
            Retreat::Stay => {}
            Retreat::RestartCurrent => self.restart_current(),
            Retreat::Play(track) => self.play_track(track, None),
        }
    }

    /// Clamped to `[0, 1]`; non-finite input is ignored.
    pub fn set_volume(&mut self, volume: f32) {
        if self.state.set_volume(volume) {
            self.resource.set_volume(self.state.volume());
        }
    }

    pub fn toggle_shuffle(&mut self) -> bool {
        self.state.toggle_shuffle()
    }

    pub fn set_shuffle(&mut self, on: bool) {
        self.state.set_shuffle(on);
    }

    pub fn toggle_loop(&mut self) -> LoopMode {
        self.state.cycle_loop_mode()
    }

    pub fn set_loop_mode(&mut self, mode: LoopMode) {
        self.state.set_loop_mode(mode);
    }

    /// Store the settings and hand the gains to the graph. Transport state is
    /// not touched.
    pub fn set_equalizer(&mut self, settings: EqualizerSettings) {
        self.equalizer = settings;
        if let Some(graph) = self.graph.as_mut() {
            graph.apply_gains(&self.equalizer.gains);
        }
    }

    pub fn rename_track(&mut self, id: TrackId, title: &str) {
        self.state.rename(id, title);
        self.invalidate_queue();
    }

    /// Drop a track the library removed; stops playback if it is current.
    pub fn forget_track(&mut self, id: TrackId) {
        let was_current = self.state.forget(id);
        self.invalidate_queue();
        if was_current {
            self.stop();
        }
    }

    #[cfg(test)]
    pub fn frequency_data(&self) -> Option<Vec<u8>> {
        self.graph.as_ref().and_then(ProcessingGraph::frequency_data)
    }

    /// Drain and apply everything the resource reported.
    pub fn pump(&mut self) {
        while let Some(event) = self.resource.poll_event() {
            self.handle_event(event);
        }
    }

    pub fn handle_event(&mut self, event: ResourceEvent) {
        match event {
            ResourceEvent::TimeUpdate(secs) => {
                if self.state.current().is_some() {
                    self.state.set_time(secs);
                }
            }
            ResourceEvent::LoadedMetadata { duration } => {
                if self.state.current().is_some() {
                    self.state.set_duration(duration);
                }
            }
            ResourceEvent::Ended => self.on_ended(),
            ResourceEvent::Error(err) => self.on_error(err),
            ResourceEvent::PlayResolved { request, result } => self.on_play_resolved(request, result),
        }
    }

    fn on_ended(&mut self) {
        if self.state.phase() != Phase::Playing {
            debug!(phase = ?self.state.phase(), "ignoring end of a track that is not playing");
            return;
        }
        match self.state.next_step(&mut self.rng) {
            Advance::Stay => {
                self.pending = None;
                self.state.set_phase(Phase::Ended);
            }
            step => self.advance(step),
        }
    }

    fn on_error(&mut self, err: MediaError) {
        if !self.resource.has_source() {
            // teardown clears the source and may still report
            debug!(%err, "ignoring error from a detached resource");
            return;
        }
        if err.kind == MediaErrorKind::Aborted {
            debug!("playback aborted");
            return;
        }
        error!(kind = %err.kind, message = %err.message, "audio playback error");
        self.last_error = Some(err.to_string());
        self.pending = None;
        if matches!(self.state.phase(), Phase::Playing | Phase::Loading) {
            self.state.set_phase(Phase::Paused);
        }
    }

    fn on_play_resolved(&mut self, request: PlayRequest, result: Result<(), PlayFailure>) {
        let current = self.state.current().map(|t| t.id);
        let pending = match self.pending {
            Some(p) if p.request == request && Some(p.track) == current => p,
            _ => {
                debug!(request = request.0, "dropping stale play result");
                return;
            }
        };
        self.pending = None;

        match result {
            Ok(()) => {
                self.state.set_phase(Phase::Playing);
                self.last_error = None;
                if self.state.duration() == 0.0 {
                    let known = self.state.current().and_then(|t| t.duration);
                    if let Some(d) = known {
                        self.state.set_duration(d.as_secs_f64());
                    }
                }
            }
            Err(PlayFailure::NotAllowed) => {
                info!(track = %pending.track, "playback blocked until the next explicit play");
                self.state.set_phase(Phase::Paused);
            }
            Err(PlayFailure::Aborted) => {
                debug!(track = %pending.track, "play aborted");
                self.state.set_phase(Phase::Paused);
            }
            Err(PlayFailure::Media(err)) if err.kind == MediaErrorKind::Aborted => {
                debug!(track = %pending.track, %err, "play aborted");
                self.state.set_phase(Phase::Paused);
            }
            Err(PlayFailure::Media(err)) => {
                warn!(track = %pending.track, %err, "playback start failed");
                self.last_error = Some(err.to_string());
                self.state.set_phase(Phase::Paused);
            }
        }
    }

    /// Deterministic teardown: pause, detach the source, disconnect and close
    /// the graph. The closed graph stays in place until a play path or
    /// [`Controller::rebind`] builds its replacement.
    pub fn shutdown(&mut self) {
        self.resource.pause();
        self.pending = None;
        self.resource.clear();
        self.resource.connect_graph(None);
        if let Some(graph) = self.graph.as_mut() {
            graph.close();
        }
        if matches!(self.state.phase(), Phase::Playing | Phase::Loading) {
            self.state.set_phase(Phase::Paused);
        }
    }

    /// Swap in a new resource (e.g. a reopened output device). The old one is
    /// torn down and returned; the current track is reloaded paused at the
    /// same position behind a freshly built graph.
    pub fn rebind(&mut self, resource: R) -> R {
        let position = self.resource.position();
        self.shutdown();
        let old = std::mem::replace(&mut self.resource, resource);

        self.resource.set_volume(self.state.volume());
        self.bind_graph();
        if let Some(track) = self.state.current() {
            if track.has_source() {
                self.resource.load(&track.source);
                self.resource.set_position(position);
            }
        }
        old
    }

    pub fn snapshot(&mut self) -> PlaybackInfo {
        let queue = match &self.queue_snapshot {
            Some(q) => q.clone(),
            None => {
                let q: Arc<[Track]> = Arc::from(self.state.queue());
                self.queue_snapshot = Some(q.clone());
                q
            }
        };
        PlaybackInfo {
            current: self.state.current().cloned(),
            phase: self.state.phase(),
            playing: self.state.is_playing(),
            current_time: self.state.current_time(),
            duration: self.state.duration(),
            volume: self.state.volume(),
            loop_mode: self.state.loop_mode(),
            shuffle: self.state.shuffle(),
            queue,
            history_len: self.state.history().len(),
            equalizer: self.equalizer.clone(),
            graph_active: self.graph.as_ref().is_some_and(ProcessingGraph::is_alive),
            last_error: self.last_error.clone(),
        }
    }

    #[cfg(test)]
    pub fn state(&self) -> &TransportState {
        &self.state
    }

    #[cfg(test)]
    pub fn graph(&self) -> Option<&ProcessingGraph> {
        self.graph.as_ref()
    }

    pub fn graph_tap(&self) -> Option<GraphTap> {
        self.graph.as_ref().map(ProcessingGraph::tap)
    }

    pub fn resource(&self) -> &R {
        &self.resource
    }

    #[cfg(test)]
    pub fn resource_mut(&mut self) -> &mut R {
        &mut self.resource
    }

    #[cfg(test)]
    pub fn last_error(&self) -> Option<&str> {
        self.last_error.as_deref()
    }
}
