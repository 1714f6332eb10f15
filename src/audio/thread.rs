use std::sync::mpsc::{self, Receiver, RecvTimeoutError};
use std::thread::{self, JoinHandle};
use std::time::Duration;

use tracing::{debug, info, warn};

use crate::config::{AudioSettings, GraphSettings};
use crate::equalizer::EqualizerSettings;
use crate::error::EngineError;

use super::controller::Controller;
use super::resource::AudioResource;
use super::sink::RodioResource;
use super::types::{AudioCmd, PlaybackHandle, SpectrumHandle};

const TICK: Duration = Duration::from_millis(50);

/// Apply one command to the controller. Lifecycle commands (`Quit`,
/// `ResetOutput`) need the concrete device and are handled by the thread loop.
pub(super) fn apply_command<R: AudioResource>(c: &mut Controller<R>, cmd: AudioCmd) {
    match cmd {
        AudioCmd::PlayTrack { track, queue } => c.play_track(track, queue),
        AudioCmd::TogglePause => c.toggle_play(),
        AudioCmd::Play => c.play(),
        AudioCmd::Pause => c.pause(),
        AudioCmd::Stop => c.stop(),
        AudioCmd::Seek(secs) => c.seek(secs),
        AudioCmd::SeekBy(secs) => c.seek_by(f64::from(secs)),
        AudioCmd::Next => c.next(),
        AudioCmd::Prev => c.prev(),
        AudioCmd::SetVolume(v) => c.set_volume(v),
        AudioCmd::ToggleShuffle => {
            c.toggle_shuffle();
        }
        AudioCmd::SetShuffle(on) => c.set_shuffle(on),
        AudioCmd::ToggleLoop => {
            c.toggle_loop();
        }
        AudioCmd::SetLoopMode(mode) => c.set_loop_mode(mode),
        AudioCmd::SetEqualizer(settings) => c.set_equalizer(settings),
        AudioCmd::RenameTrack { id, title } => c.rename_track(id, &title),
        AudioCmd::ForgetTrack(id) => c.forget_track(id),
        AudioCmd::ResetOutput | AudioCmd::Quit { .. } => {}
    }
}

fn publish<R: AudioResource>(
    c: &mut Controller<R>,
    playback: &PlaybackHandle,
    spectrum: &SpectrumHandle,
) {
    let snapshot = c.snapshot();
    if let Ok(mut info) = playback.lock() {
        *info = snapshot;
    }
    if let Ok(mut tap) = spectrum.lock() {
        *tap = c.graph_tap();
    }
}

/// Spawn the engine thread. Returns once the output device is open, or with
/// the error that kept it from opening.
pub(super) fn spawn_audio_thread(
    rx: Receiver<AudioCmd>,
    playback: PlaybackHandle,
    spectrum: SpectrumHandle,
    audio: AudioSettings,
    graph: GraphSettings,
    equalizer: EqualizerSettings,
) -> Result<JoinHandle<()>, EngineError> {
    let (ready_tx, ready_rx) = mpsc::sync_channel::<Result<(), EngineError>>(1);

    let handle = thread::Builder::new()
        .name("nova-audio".into())
        .spawn(move || {
            let resource = match RodioResource::open() {
                Ok(resource) => {
                    let _ = ready_tx.send(Ok(()));
                    resource
                }
                Err(err) => {
                    let _ = ready_tx.send(Err(err));
                    return;
                }
            };

            let mut controller = Controller::new(resource, &audio, graph);
            controller.set_equalizer(equalizer);
            publish(&mut controller, &playback, &spectrum);
            info!("audio engine started");

            loop {
                match rx.recv_timeout(TICK) {
                    Ok(AudioCmd::Quit { fade_out_ms }) => {
                        controller.resource().fade_out(fade_out_ms);
                        controller.shutdown();
                        publish(&mut controller, &playback, &spectrum);
                        break;
                    }
                    Ok(AudioCmd::ResetOutput) => match RodioResource::open() {
                        Ok(fresh) => {
                            drop(controller.rebind(fresh));
                            info!("audio output reopened");
                        }
                        Err(err) => warn!(%err, "could not reopen audio output"),
                    },
                    Ok(cmd) => {
                        debug!(?cmd, "audio command");
                        apply_command(&mut controller, cmd);
                    }
                    Err(RecvTimeoutError::Timeout) => {}
                    Err(RecvTimeoutError::Disconnected) => {
                        controller.shutdown();
                        publish(&mut controller, &playback, &spectrum);
                        break;
                    }
                }

                controller.pump();
                publish(&mut controller, &playback, &spectrum);
            }
            info!("audio engine stopped");
        })?;

    match ready_rx.recv() {
        Ok(Ok(())) => Ok(handle),
        Ok(Err(err)) => {
            let _ = handle.join();
            Err(err)
        }
        Err(_) => {
            let _ = handle.join();
            Err(EngineError::EngineGone)
        }
    }
}
