use std::collections::VecDeque;
use std::f32::consts::PI;
use std::sync::Arc;

use rustfft::num_complex::Complex;
use rustfft::{Fft, FftPlanner};

use super::GraphError;

const MIN_FFT_SIZE: usize = 32;
const MAX_FFT_SIZE: usize = 32_768;

/// Spectrum analyser over the post-equalizer signal.
///
/// Keeps a mono ring of the last `fft_size` frames and computes byte
/// magnitudes on demand: Blackman window, FFT, time smoothing, then the
/// `[min_db, max_db]` range mapped onto `0..=255`.
pub struct Analyser {
    fft_size: usize,
    smoothing: f32,
    min_db: f32,
    max_db: f32,
    ring: VecDeque<f32>,
    window: Vec<f32>,
    smoothed: Vec<f32>,
    fft: Arc<dyn Fft<f32>>,
}

impl Analyser {
    pub fn new(
        fft_size: usize,
        smoothing: f32,
        min_db: f32,
        max_db: f32,
    ) -> Result<Self, GraphError> {
        if !fft_size.is_power_of_two() || !(MIN_FFT_SIZE..=MAX_FFT_SIZE).contains(&fft_size) {
            return Err(GraphError::FftSize(fft_size));
        }
        if !(min_db.is_finite() && max_db.is_finite() && min_db < max_db) {
            return Err(GraphError::DecibelRange {
                min: min_db,
                max: max_db,
            });
        }

        let n = fft_size as f32;
        let window = (0..fft_size)
            .map(|i| {
                let x = i as f32 / n;
                0.42 - 0.5 * (2.0 * PI * x).cos() + 0.08 * (4.0 * PI * x).cos()
            })
            .collect();
        let fft = FftPlanner::<f32>::new().plan_fft_forward(fft_size);

        Ok(Self {
            fft_size,
            smoothing: if smoothing.is_finite() {
                smoothing.clamp(0.0, 1.0)
            } else {
                0.0
            },
            min_db,
            max_db,
            ring: VecDeque::with_capacity(fft_size),
            window,
            smoothed: vec![0.0; fft_size / 2],
            fft,
        })
    }

    #[cfg(test)]
    pub fn bin_count(&self) -> usize {
        self.fft_size / 2
    }

    /// Downmix an interleaved block to mono and append it to the ring.
    pub fn push_frames(&mut self, block: &[f32], channels: u16) {
        let channels = usize::from(channels.max(1));
        for frame in block.chunks(channels) {
            let mono = frame.iter().sum::<f32>() / frame.len() as f32;
            if self.ring.len() == self.fft_size {
                self.ring.pop_front();
            }
            self.ring.push_back(mono);
        }
    }

    pub fn clear(&mut self) {
        self.ring.clear();
        self.smoothed.iter_mut().for_each(|m| *m = 0.0);
    }

    pub fn frequency_data(&mut self) -> Vec<u8> {
        let pad = self.fft_size - self.ring.len();
        let mut buf: Vec<Complex<f32>> = std::iter::repeat_n(0.0, pad)
            .chain(self.ring.iter().copied())
            .zip(&self.window)
            .map(|(s, w)| Complex::new(s * w, 0.0))
            .collect();
        self.fft.process(&mut buf);

        let scale = 255.0 / (self.max_db - self.min_db);
        let n = self.fft_size as f32;
        let tau = self.smoothing;
        buf.iter()
            .zip(self.smoothed.iter_mut())
            .map(|(c, prev)| {
                let mag = c.norm() / n;
                *prev = tau * *prev + (1.0 - tau) * mag;
                if *prev <= 0.0 {
                    return 0;
                }
                let db = 20.0 * prev.log10();
                (scale * (db - self.min_db)).clamp(0.0, 255.0) as u8
            })
            .collect()
    }
}
