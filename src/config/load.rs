use std::{env, path::PathBuf};

use super::schema::Settings;

/// `Settings::load` reads an optional config file, then environment variables
/// (prefix `NOVA__`) on top, and falls back to struct defaults.
impl Settings {
    /// Load settings from environment and optional config file.
    pub fn load() -> Result<Self, ::config::ConfigError> {
        let config_path = resolve_config_path();

        let mut builder = ::config::Config::builder();

        if let Some(path) = &config_path {
            builder = builder.add_source(::config::File::from(path.as_path()).required(false));
        }

        builder = builder.add_source(
            ::config::Environment::with_prefix("NOVA")
                .separator("__")
                .try_parsing(true),
        );

        let cfg = builder.build()?;
        let mut settings: Settings = cfg.try_deserialize()?;
        settings.equalizer = settings.equalizer.normalized();
        Ok(settings)
    }

    /// Reject values the engine cannot run with.
    pub fn validate(&self) -> Result<(), String> {
        if !(0.0..=1.0).contains(&self.audio.volume) {
            return Err("audio.volume must be within [0, 1]".to_string());
        }
        if !(self.audio.prev_restart_secs.is_finite() && self.audio.prev_restart_secs >= 0.0) {
            return Err("audio.prev_restart_secs must be >= 0".to_string());
        }
        let g = &self.graph;
        if !(g.gain_time_constant.is_finite() && g.gain_time_constant > 0.0) {
            return Err("graph.gain_time_constant must be > 0".to_string());
        }
        if !g.fft_size.is_power_of_two() || !(32..=32_768).contains(&g.fft_size) {
            return Err("graph.fft_size must be a power of two in [32, 32768]".to_string());
        }
        if !(0.0..=1.0).contains(&g.smoothing) {
            return Err("graph.smoothing must be within [0, 1]".to_string());
        }
        if g.min_decibels >= g.max_decibels {
            return Err("graph.min_decibels must be below graph.max_decibels".to_string());
        }
        if !(self.controls.volume_step > 0.0 && self.controls.volume_step <= 1.0) {
            return Err("controls.volume_step must be within (0, 1]".to_string());
        }
        Ok(())
    }
}

/// Resolve the config path from `NOVA_CONFIG_PATH` or XDG defaults.
pub fn resolve_config_path() -> Option<PathBuf> {
    if let Some(p) = env::var_os("NOVA_CONFIG_PATH") {
        return Some(PathBuf::from(p));
    }
    default_config_path()
}

/// `$XDG_CONFIG_HOME/nova/config.toml`, or `~/.config/nova/config.toml` when
/// `XDG_CONFIG_HOME` is not set.
pub fn default_config_path() -> Option<PathBuf> {
    let config_home = if let Some(xdg) = env::var_os("XDG_CONFIG_HOME") {
        Some(PathBuf::from(xdg))
    } else {
        env::var_os("HOME").map(|home| PathBuf::from(home).join(".config"))
    };

    config_home.map(|d| d.join("nova").join("config.toml"))
}
