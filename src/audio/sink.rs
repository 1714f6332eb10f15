//! The rodio-backed audio resource.
//!
//! One `Sink` per loaded source, decoded from a file and routed through the
//! processing graph. Seeking uses `Sink::try_seek` while playing and falls
//! back to rebuilding the sink with `Source::skip_duration`.

use std::collections::VecDeque;
use std::fs::File;
use std::io::{self, BufReader};
use std::path::{Path, PathBuf};
use std::thread;
use std::time::{Duration, Instant};

use rodio::decoder::DecoderError;
use rodio::{Decoder, OutputStream, OutputStreamBuilder, Sink, Source};

use crate::error::EngineError;
use crate::graph::{GraphSource, GraphTap};

use super::resource::{
    AudioResource, MediaError, MediaErrorKind, PlayFailure, PlayRequest, ResourceEvent,
};

const TIME_UPDATE_EVERY: Duration = Duration::from_millis(250);

fn open_error(path: &Path, err: &io::Error) -> MediaError {
    let kind = if err.kind() == io::ErrorKind::Interrupted {
        MediaErrorKind::Aborted
    } else {
        MediaErrorKind::Network
    };
    MediaError::new(kind, format!("{}: {err}", path.display()))
}

fn decode_error(path: &Path, err: &DecoderError) -> MediaError {
    let kind = if matches!(err, DecoderError::UnrecognizedFormat) {
        MediaErrorKind::SourceNotSupported
    } else {
        MediaErrorKind::Decode
    };
    MediaError::new(kind, format!("{}: {err}", path.display()))
}

/// Seek target for `secs`; negative or unrepresentable values mean the start.
fn seek_target(secs: f64) -> Duration {
    Duration::try_from_secs_f64(secs.max(0.0)).unwrap_or(Duration::ZERO)
}

/// Create a paused `Sink` for `path` that starts playback at `start_at`.
/// Also returns the decoder's idea of the total length.
fn create_sink_at(
    handle: &OutputStream,
    path: &Path,
    start_at: Duration,
    tap: Option<GraphTap>,
) -> Result<(Sink, Option<Duration>), MediaError> {
    let file = File::open(path).map_err(|e| open_error(path, &e))?;
    let decoder = Decoder::new(BufReader::new(file)).map_err(|e| decode_error(path, &e))?;
    let total = decoder.total_duration();

    // `skip_duration` is the fallback seeking primitive; even Duration::ZERO is fine.
    let source = GraphSource::new(decoder.skip_duration(start_at), tap);

    let sink = Sink::connect_new(handle.mixer());
    sink.append(source);
    sink.pause();
    Ok((sink, total))
}

/// What the sink looks like when the controller polls for events.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub(super) enum SinkStatus {
    Drained,
    Paused,
    Running,
}

impl SinkStatus {
    fn of(sink: &Sink) -> Self {
        if sink.empty() {
            SinkStatus::Drained
        } else if sink.is_paused() {
            SinkStatus::Paused
        } else {
            SinkStatus::Running
        }
    }
}

/// Event bookkeeping for one output, independent of the device.
#[derive(Debug)]
pub(super) struct SinkEvents {
    queued: VecDeque<ResourceEvent>,
    next_request: u64,
    ended_reported: bool,
    last_time_update: Option<Instant>,
}

impl Default for SinkEvents {
    fn default() -> Self {
        Self {
            queued: VecDeque::new(),
            next_request: 1,
            ended_reported: false,
            last_time_update: None,
        }
    }
}

impl SinkEvents {
    pub(super) fn push(&mut self, event: ResourceEvent) {
        self.queued.push_back(event);
    }

    /// Hand out a ticket and queue its outcome.
    pub(super) fn resolve_play(&mut self, result: Result<(), PlayFailure>) -> PlayRequest {
        let request = PlayRequest(self.next_request);
        self.next_request += 1;
        self.queued
            .push_back(ResourceEvent::PlayResolved { request, result });
        request
    }

    /// The source went away: outstanding tickets resolve as aborted and
    /// everything else queued for it is dropped.
    pub(super) fn abort_pending(&mut self) {
        self.queued = self
            .queued
            .drain(..)
            .filter_map(|event| match event {
                ResourceEvent::PlayResolved { request, .. } => Some(ResourceEvent::PlayResolved {
                    request,
                    result: Err(PlayFailure::Aborted),
                }),
                _ => None,
            })
            .collect();
    }

    /// A fresh sink starts with no end reported and an immediate time update.
    pub(super) fn restart_progress(&mut self) {
        self.ended_reported = false;
        self.last_time_update = None;
    }

    /// `play()` on a drained or finished sink has to start the file over.
    pub(super) fn needs_reload(&self, status: Option<SinkStatus>) -> bool {
        self.ended_reported || status == Some(SinkStatus::Drained)
    }

    pub(super) fn poll(
        &mut self,
        status: SinkStatus,
        now: Instant,
        position: impl FnOnce() -> f64,
    ) -> Option<ResourceEvent> {
        if let Some(event) = self.queued.pop_front() {
            return Some(event);
        }
        match status {
            SinkStatus::Drained if self.ended_reported => None,
            SinkStatus::Drained => {
                self.ended_reported = true;
                Some(ResourceEvent::Ended)
            }
            SinkStatus::Paused => None,
            SinkStatus::Running => {
                let due = self
                    .last_time_update
                    .is_none_or(|at| now.saturating_duration_since(at) >= TIME_UPDATE_EVERY);
                if !due {
                    return None;
                }
                self.last_time_update = Some(now);
                Some(ResourceEvent::TimeUpdate(position()))
            }
        }
    }

    /// Queued events only, for when no sink exists.
    pub(super) fn pop_queued(&mut self) -> Option<ResourceEvent> {
        self.queued.pop_front()
    }
}

pub struct RodioResource {
    stream: OutputStream,
    sink: Option<Sink>,
    source: Option<PathBuf>,
    tap: Option<GraphTap>,
    volume: f32,
    events: SinkEvents,
    load_error: Option<MediaError>,
    // position of the sink's start within the file
    offset: Duration,
}

impl RodioResource {
    /// Open the default output device.
    pub fn open() -> Result<Self, EngineError> {
        let mut stream = OutputStreamBuilder::open_default_stream()
            .map_err(|e| EngineError::OutputUnavailable(e.to_string()))?;
        // rodio logs to stderr when the stream is dropped, which would land
        // on top of the TUI.
        stream.log_on_drop(false);

        Ok(Self {
            stream,
            sink: None,
            source: None,
            tap: None,
            volume: 1.0,
            events: SinkEvents::default(),
            load_error: None,
            offset: Duration::ZERO,
        })
    }

    fn drop_sink(&mut self) {
        if let Some(sink) = self.sink.take() {
            sink.stop();
        }
    }

    fn status(&self) -> Option<SinkStatus> {
        self.sink.as_ref().map(SinkStatus::of)
    }

    /// Replace the sink with a fresh one starting at `start_at`.
    fn reload_at(&mut self, path: &Path, start_at: Duration, resume: bool) -> Option<Duration> {
        self.drop_sink();
        self.offset = start_at;
        self.events.restart_progress();

        match create_sink_at(&self.stream, path, start_at, self.tap.clone()) {
            Ok((sink, total)) => {
                sink.set_volume(self.volume);
                if resume {
                    sink.play();
                }
                self.sink = Some(sink);
                self.load_error = None;
                total
            }
            Err(err) => {
                tracing::debug!(%err, "could not open source");
                self.load_error = Some(err);
                None
            }
        }
    }

    /// Ramp the volume down over `fade_out_ms`, blocking the caller.
    pub fn fade_out(&self, fade_out_ms: u64) {
        let Some(sink) = self.sink.as_ref().filter(|s| !s.is_paused()) else {
            return;
        };
        if fade_out_ms == 0 {
            sink.set_volume(0.0);
            return;
        }
        let steps: u64 = 20;
        let step_ms = (fade_out_ms / steps).max(1);
        for step in 1..=steps {
            let t = step as f32 / steps as f32;
            sink.set_volume(self.volume * (1.0 - t));
            thread::sleep(Duration::from_millis(step_ms));
        }
        sink.set_volume(0.0);
    }
}

impl AudioResource for RodioResource {
    fn load(&mut self, source: &Path) {
        self.source = Some(source.to_path_buf());
        self.events.abort_pending();
        if let Some(total) = self.reload_at(source, Duration::ZERO, false) {
            self.events.push(ResourceEvent::LoadedMetadata {
                duration: total.as_secs_f64(),
            });
        }
    }

    fn play(&mut self) -> PlayRequest {
        if self.events.needs_reload(self.status()) {
            if let Some(path) = self.source.clone() {
                self.reload_at(&path, Duration::ZERO, false);
            }
        }

        let result = match (&self.sink, &self.load_error) {
            (_, Some(err)) => Err(PlayFailure::Media(err.clone())),
            (Some(sink), None) => {
                sink.play();
                self.events.restart_progress();
                Ok(())
            }
            (None, None) => Err(PlayFailure::Media(MediaError::new(
                MediaErrorKind::SourceNotSupported,
                "no source loaded",
            ))),
        };
        self.events.resolve_play(result)
    }

    fn pause(&mut self) {
        if let Some(sink) = &self.sink {
            sink.pause();
        }
    }

    fn position(&self) -> f64 {
        match &self.sink {
            Some(sink) => (self.offset + sink.get_pos()).as_secs_f64(),
            None => 0.0,
        }
    }

    fn set_position(&mut self, secs: f64) {
        let Some(path) = self.source.clone() else {
            return;
        };
        if self.load_error.is_some() {
            return;
        }
        let target = seek_target(secs);

        let playing = self.status() == Some(SinkStatus::Running);
        if playing {
            if let Some(sink) = &self.sink {
                match sink.try_seek(target) {
                    Ok(()) => {
                        self.offset = Duration::ZERO;
                        self.events.restart_progress();
                        return;
                    }
                    Err(err) => tracing::debug!(%err, "seek unsupported, rebuilding sink"),
                }
            }
        }
        self.reload_at(&path, target, playing);
    }

    fn set_volume(&mut self, volume: f32) {
        self.volume = volume;
        if let Some(sink) = &self.sink {
            sink.set_volume(volume);
        }
    }

    fn has_source(&self) -> bool {
        self.source.is_some()
    }

    fn clear(&mut self) {
        self.drop_sink();
        self.source = None;
        self.load_error = None;
        self.events.abort_pending();
        self.events.restart_progress();
        self.offset = Duration::ZERO;
    }

    /// Applies to sources loaded from now on.
    fn connect_graph(&mut self, tap: Option<GraphTap>) {
        self.tap = tap;
    }

    fn poll_event(&mut self) -> Option<ResourceEvent> {
        let status = match (&self.source, self.status()) {
            (Some(_), Some(status)) => status,
            _ => return self.events.pop_queued(),
        };
        let sink = self.sink.as_ref();
        let offset = self.offset;
        self.events.poll(status, Instant::now(), || {
            sink.map_or(0.0, |s| (offset + s.get_pos()).as_secs_f64())
        })
    }
}

#[cfg(test)]
mod tests;
