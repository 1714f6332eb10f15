//! The five equalizer stages, one biquad per band and channel.

use biquad::{Biquad, Coefficients, DirectForm1, Hertz, Q_BUTTERWORTH_F32, Type};

use crate::equalizer::{BAND_COUNT, BANDS, BandKind, EqualizerBand};

use super::GraphError;

/// Coefficients are rebuilt once the smoothed gain has moved this far from
/// the gain they were last built for.
const RECALC_THRESHOLD_DB: f32 = 0.05;
/// Below this distance the smoothed gain snaps onto its target.
const SNAP_DB: f32 = 1e-3;
const PEAKING_Q: f32 = 1.0;

fn coefficients(
    band: &EqualizerBand,
    gain_db: f32,
    sample_rate: u32,
) -> Result<Coefficients<f32>, GraphError> {
    let err = || GraphError::Band {
        frequency_hz: band.frequency_hz,
        sample_rate,
    };
    let fs = Hertz::<f32>::from_hz(sample_rate as f32).map_err(|_| err())?;
    let f0 = Hertz::<f32>::from_hz(band.frequency_hz).map_err(|_| err())?;
    let (kind, q) = match band.kind {
        BandKind::LowShelf => (Type::LowShelf(gain_db), Q_BUTTERWORTH_F32),
        BandKind::Peaking => (Type::PeakingEQ(gain_db), PEAKING_Q),
        BandKind::HighShelf => (Type::HighShelf(gain_db), Q_BUTTERWORTH_F32),
    };
    Coefficients::<f32>::from_params(kind, fs, f0, q).map_err(|_| err())
}

/// One-pole smoothing factor for a time constant at a sample rate.
fn smoothing_alpha(time_constant: f32, sample_rate: u32) -> f32 {
    if !(time_constant.is_finite() && time_constant > 0.0) || sample_rate == 0 {
        return 1.0;
    }
    1.0 - (-1.0 / (time_constant * sample_rate as f32)).exp()
}

struct Stage {
    band: EqualizerBand,
    target_db: f32,
    current_db: f32,
    applied_db: f32,
    filters: Vec<DirectForm1<f32>>,
    // set when the band cannot be realised at the stream's rate
    bypass: bool,
}

impl Stage {
    fn rebuild(&mut self, sample_rate: u32, channels: u16) {
        match coefficients(&self.band, self.current_db, sample_rate) {
            Ok(coeffs) => {
                self.filters = (0..channels.max(1))
                    .map(|_| DirectForm1::<f32>::new(coeffs))
                    .collect();
                self.applied_db = self.current_db;
                self.bypass = false;
            }
            Err(err) => {
                tracing::debug!(%err, "bypassing equalizer band");
                self.filters.clear();
                self.bypass = true;
            }
        }
    }

    fn step_gain(&mut self, alpha: f32, sample_rate: u32) {
        if self.current_db != self.target_db {
            self.current_db += (self.target_db - self.current_db) * alpha;
            if (self.target_db - self.current_db).abs() < SNAP_DB {
                self.current_db = self.target_db;
            }
        }
        if self.bypass {
            return;
        }
        // Rebuild on drift, plus once when the target is finally reached.
        let drifted = (self.current_db - self.applied_db).abs() >= RECALC_THRESHOLD_DB;
        let settled = self.current_db == self.target_db && self.applied_db != self.current_db;
        if !drifted && !settled {
            return;
        }
        if let Ok(coeffs) = coefficients(&self.band, self.current_db, sample_rate) {
            for f in &mut self.filters {
                f.update_coefficients(coeffs);
            }
            self.applied_db = self.current_db;
        }
    }
}

pub struct FilterChain {
    stages: Vec<Stage>,
    sample_rate: u32,
    channels: u16,
    time_constant: f32,
    alpha: f32,
}

impl FilterChain {
    /// Build all bands at `sample_rate`. Fails if any band cannot be
    /// realised there (e.g. above Nyquist).
    pub fn new(sample_rate: u32, time_constant: f32) -> Result<Self, GraphError> {
        let channels = 2;
        let mut stages = Vec::with_capacity(BAND_COUNT);
        for band in BANDS {
            let coeffs = coefficients(&band, 0.0, sample_rate)?;
            stages.push(Stage {
                band,
                target_db: 0.0,
                current_db: 0.0,
                applied_db: 0.0,
                filters: (0..channels)
                    .map(|_| DirectForm1::<f32>::new(coeffs))
                    .collect(),
                bypass: false,
            });
        }
        Ok(Self {
            stages,
            sample_rate,
            channels,
            time_constant,
            alpha: smoothing_alpha(time_constant, sample_rate),
        })
    }

    /// Follow the format of the audio actually flowing. Filters are rebuilt
    /// only when the rate or channel count changes.
    pub fn configure(&mut self, sample_rate: u32, channels: u16) {
        if sample_rate == self.sample_rate && channels == self.channels {
            return;
        }
        self.sample_rate = sample_rate;
        self.channels = channels;
        self.alpha = smoothing_alpha(self.time_constant, sample_rate);
        for stage in &mut self.stages {
            stage.rebuild(sample_rate, channels);
        }
    }

    pub fn set_targets(&mut self, gains: &[f32; BAND_COUNT]) {
        for (stage, &gain) in self.stages.iter_mut().zip(gains) {
            stage.target_db = gain;
        }
    }

    #[cfg(test)]
    pub fn targets(&self) -> [f32; BAND_COUNT] {
        let mut out = [0.0; BAND_COUNT];
        for (o, stage) in out.iter_mut().zip(&self.stages) {
            *o = stage.target_db;
        }
        out
    }

    /// Smoothed gains as of the last processed frame.
    #[cfg(test)]
    pub fn current_gains(&self) -> [f32; BAND_COUNT] {
        let mut out = [0.0; BAND_COUNT];
        for (o, stage) in out.iter_mut().zip(&self.stages) {
            *o = stage.current_db;
        }
        out
    }

    #[cfg(test)]
    pub fn is_bypassed(&self, band: usize) -> bool {
        self.stages.get(band).is_some_and(|s| s.bypass)
    }

    /// Filter an interleaved block in place, advancing gain smoothing once
    /// per frame.
    pub fn process(&mut self, block: &mut [f32]) {
        let channels = usize::from(self.channels.max(1));
        let (alpha, sample_rate) = (self.alpha, self.sample_rate);
        for frame in block.chunks_mut(channels) {
            for stage in &mut self.stages {
                stage.step_gain(alpha, sample_rate);
                if stage.bypass {
                    continue;
                }
                for (sample, filter) in frame.iter_mut().zip(&mut stage.filters) {
                    *sample = filter.run(*sample);
                }
            }
        }
    }
}
