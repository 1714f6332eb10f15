use std::sync::mpsc::{self, Sender};
use std::sync::{Arc, Mutex};
use std::thread::JoinHandle;
use std::time::Duration;

use crate::config::Settings;
use crate::error::EngineError;

use super::thread::spawn_audio_thread;
use super::types::{AudioCmd, PlaybackHandle, PlaybackInfo, SpectrumHandle};

/// Handle to the audio engine thread.
pub struct AudioPlayer {
    tx: Sender<AudioCmd>,
    playback: PlaybackHandle,
    spectrum: SpectrumHandle,
    join: Mutex<Option<JoinHandle<()>>>,
}

impl AudioPlayer {
    pub fn new(settings: &Settings) -> Result<Self, EngineError> {
        let (tx, rx) = mpsc::channel::<AudioCmd>();
        let playback: PlaybackHandle = Arc::new(Mutex::new(PlaybackInfo::default()));
        let spectrum: SpectrumHandle = Arc::new(Mutex::new(None));

        let handle = spawn_audio_thread(
            rx,
            playback.clone(),
            spectrum.clone(),
            settings.audio.clone(),
            settings.graph.clone(),
            settings.equalizer.clone(),
        )?;

        Ok(Self {
            tx,
            playback,
            spectrum,
            join: Mutex::new(Some(handle)),
        })
    }

    pub fn playback_handle(&self) -> PlaybackHandle {
        self.playback.clone()
    }

    /// Byte magnitudes of the current output, when the analyser is running.
    pub fn spectrum(&self) -> Option<Vec<u8>> {
        let tap = self.spectrum.lock().ok()?.clone()?;
        tap.frequency_data()
    }

    pub fn send(&self, cmd: AudioCmd) -> Result<(), EngineError> {
        self.tx.send(cmd).map_err(|_| EngineError::EngineGone)
    }

    pub fn quit_softly(&self, fade_out: Duration) {
        let _ = self.send(AudioCmd::Quit {
            fade_out_ms: fade_out.as_millis() as u64,
        });

        if let Ok(mut j) = self.join.lock() {
            if let Some(h) = j.take() {
                let _ = h.join();
            }
        }
    }
}
