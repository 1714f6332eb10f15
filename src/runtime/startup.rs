use crate::app::App;
use crate::audio::{AudioCmd, AudioPlayer, LoopMode};
use crate::config;

impl From<config::LoopModeSetting> for LoopMode {
    fn from(setting: config::LoopModeSetting) -> Self {
        match setting {
            config::LoopModeSetting::NoLoop => LoopMode::NoLoop,
            config::LoopModeSetting::LoopAll => LoopMode::LoopAll,
            config::LoopModeSetting::LoopOne => LoopMode::LoopOne,
        }
    }
}

/// Seed the app model from settings and hand the engine its initial
/// shuffle and loop mode. The queue arrives with the first play; volume and
/// equalizer travel with the engine's own construction.
pub fn apply_playback_defaults(
    app: &mut App,
    audio_player: &AudioPlayer,
    settings: &config::Settings,
) {
    app.follow_playback = settings.ui.follow_playback;
    app.show_spectrum = settings.ui.show_spectrum;
    app.equalizer = settings.equalizer.clone();

    let _ = audio_player.send(AudioCmd::SetShuffle(settings.playback.shuffle));
    let _ = audio_player.send(AudioCmd::SetLoopMode(settings.playback.loop_mode.into()));
}
