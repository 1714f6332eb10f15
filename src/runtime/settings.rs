use crate::config;

/// Load and validate settings. The error says why the defaults have to be
/// used instead; config is optional and never stops the app from starting.
pub fn load_settings() -> Result<config::Settings, String> {
    let settings =
        config::Settings::load().map_err(|e| format!("failed to load config: {e}"))?;
    settings
        .validate()
        .map_err(|msg| format!("invalid config: {msg}"))?;
    Ok(settings)
}
