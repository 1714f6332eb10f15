//! Equalizer settings: the five fixed bands, named presets and custom gains.
//!
//! This is the value the settings side hands to the engine. The engine only
//! reads it and forwards the gains to the processing graph.

use std::fmt;

use serde::Deserialize;

pub const BAND_COUNT: usize = 5;
pub const MIN_GAIN_DB: f32 = -12.0;
pub const MAX_GAIN_DB: f32 = 12.0;

/// Filter shape used by a band.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum BandKind {
    LowShelf,
    Peaking,
    HighShelf,
}

#[derive(Debug, Copy, Clone, PartialEq)]
pub struct EqualizerBand {
    pub frequency_hz: f32,
    pub kind: BandKind,
    pub label: &'static str,
}

/// The band layout, in signal order.
pub const BANDS: [EqualizerBand; BAND_COUNT] = [
    EqualizerBand {
        frequency_hz: 60.0,
        kind: BandKind::LowShelf,
        label: "60Hz",
    },
    EqualizerBand {
        frequency_hz: 250.0,
        kind: BandKind::Peaking,
        label: "250Hz",
    },
    EqualizerBand {
        frequency_hz: 1_000.0,
        kind: BandKind::Peaking,
        label: "1kHz",
    },
    EqualizerBand {
        frequency_hz: 4_000.0,
        kind: BandKind::Peaking,
        label: "4kHz",
    },
    EqualizerBand {
        frequency_hz: 12_000.0,
        kind: BandKind::HighShelf,
        label: "12kHz",
    },
];

#[derive(Debug, Copy, Clone, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum EqPreset {
    #[default]
    Flat,
    #[serde(alias = "bass_boost", alias = "bassboost", alias = "Bass Boost")]
    BassBoost,
    Vocal,
    Treble,
    Rock,
    Pop,
    Custom,
}

impl EqPreset {
    /// Presets in the order they are offered to the user.
    pub const ALL: [EqPreset; 7] = [
        EqPreset::Flat,
        EqPreset::BassBoost,
        EqPreset::Vocal,
        EqPreset::Treble,
        EqPreset::Rock,
        EqPreset::Pop,
        EqPreset::Custom,
    ];

    /// Band gains of a named preset. `Custom` has none of its own.
    pub fn gains(self) -> Option<[f32; BAND_COUNT]> {
        match self {
            EqPreset::Flat => Some([0.0, 0.0, 0.0, 0.0, 0.0]),
            EqPreset::BassBoost => Some([10.0, 6.0, 2.0, 0.0, 0.0]),
            EqPreset::Vocal => Some([-2.0, 2.0, 6.0, 4.0, 0.0]),
            EqPreset::Treble => Some([0.0, 0.0, 2.0, 6.0, 8.0]),
            EqPreset::Rock => Some([5.0, 3.0, -2.0, 4.0, 6.0]),
            EqPreset::Pop => Some([3.0, 4.0, 0.0, 3.0, 5.0]),
            EqPreset::Custom => None,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            EqPreset::Flat => "Flat",
            EqPreset::BassBoost => "Bass Boost",
            EqPreset::Vocal => "Vocal",
            EqPreset::Treble => "Treble",
            EqPreset::Rock => "Rock",
            EqPreset::Pop => "Pop",
            EqPreset::Custom => "Custom",
        }
    }

    /// The preset after `self` in [`EqPreset::ALL`], wrapping around.
    pub fn next(self) -> Self {
        let pos = Self::ALL.iter().position(|&p| p == self).unwrap_or(0);
        Self::ALL[(pos + 1) % Self::ALL.len()]
    }
}

impl fmt::Display for EqPreset {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Preset tag plus one gain (dB) per band.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct EqualizerSettings {
    pub preset: EqPreset,
    pub gains: [f32; BAND_COUNT],
}

impl Default for EqualizerSettings {
    fn default() -> Self {
        Self {
            preset: EqPreset::Flat,
            gains: [0.0; BAND_COUNT],
        }
    }
}

impl EqualizerSettings {
    /// Select a preset. Named presets overwrite every gain; `Custom` only
    /// switches the tag and keeps the current gains.
    pub fn set_preset(&mut self, preset: EqPreset) {
        if let Some(gains) = preset.gains() {
            self.gains = gains;
        }
        self.preset = preset;
    }

    /// Set one band's gain, clamped to the band range. Any direct edit turns
    /// the settings into `Custom`.
    ///
    /// Returns `false` (and changes nothing) for an unknown band or a
    /// non-finite gain.
    pub fn set_gain(&mut self, band: usize, gain_db: f32) -> bool {
        if band >= BAND_COUNT || !gain_db.is_finite() {
            return false;
        }
        self.gains[band] = gain_db.clamp(MIN_GAIN_DB, MAX_GAIN_DB);
        self.preset = EqPreset::Custom;
        true
    }

    /// Move one band's gain by `delta_db`.
    pub fn nudge_gain(&mut self, band: usize, delta_db: f32) -> bool {
        match self.gains.get(band).copied() {
            Some(current) => self.set_gain(band, current + delta_db),
            None => false,
        }
    }

    pub fn gain(&self, band: usize) -> Option<f32> {
        self.gains.get(band).copied()
    }

    /// Bring settings read from configuration into a consistent shape: named
    /// presets get their own gains, custom gains are clamped and NaNs zeroed.
    pub fn normalized(mut self) -> Self {
        match self.preset.gains() {
            Some(gains) => self.gains = gains,
            None => {
                for g in &mut self.gains {
                    *g = if g.is_finite() {
                        g.clamp(MIN_GAIN_DB, MAX_GAIN_DB)
                    } else {
                        0.0
                    };
                }
            }
        }
        self
    }
}

#[cfg(test)]
mod tests;
