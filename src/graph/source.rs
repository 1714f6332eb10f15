use std::time::Duration;

use rodio::Source;

use super::GraphTap;

const BLOCK_FRAMES: usize = 256;

/// Runs a decoded source through the processing graph in small blocks.
///
/// Without a tap (graph unavailable) samples pass straight through.
pub struct GraphSource<S> {
    inner: S,
    tap: Option<GraphTap>,
    block: Vec<f32>,
    pos: usize,
    channels: u16,
    sample_rate: u32,
}

impl<S> GraphSource<S>
where
    S: Source<Item = f32>,
{
    pub fn new(inner: S, tap: Option<GraphTap>) -> Self {
        let channels = inner.channels();
        let sample_rate = inner.sample_rate();
        GraphSource {
            inner,
            tap,
            block: Vec::with_capacity(BLOCK_FRAMES * usize::from(channels.max(1))),
            pos: 0,
            channels,
            sample_rate,
        }
    }

    fn refill(&mut self) {
        self.block.clear();
        self.pos = 0;
        self.channels = self.inner.channels();
        self.sample_rate = self.inner.sample_rate();

        // Never read across a span boundary, the format may change there.
        let mut want = BLOCK_FRAMES * usize::from(self.channels.max(1));
        if let Some(span) = self.inner.current_span_len() {
            if span > 0 {
                want = want.min(span);
            }
        }
        self.block.extend(self.inner.by_ref().take(want));

        if let Some(tap) = &self.tap {
            tap.process(&mut self.block, self.sample_rate, self.channels);
        }
    }

    fn remaining(&self) -> usize {
        self.block.len() - self.pos
    }
}

impl<S> Iterator for GraphSource<S>
where
    S: Source<Item = f32>,
{
    type Item = f32;

    fn next(&mut self) -> Option<f32> {
        if self.remaining() == 0 {
            self.refill();
        }
        let sample = self.block.get(self.pos).copied()?;
        self.pos += 1;
        Some(sample)
    }
}

impl<S> Source for GraphSource<S>
where
    S: Source<Item = f32>,
{
    fn current_span_len(&self) -> Option<usize> {
        match self.remaining() {
            0 => self.inner.current_span_len(),
            n => Some(n),
        }
    }

    fn channels(&self) -> u16 {
        if self.remaining() == 0 {
            self.inner.channels()
        } else {
            self.channels
        }
    }

    fn sample_rate(&self) -> u32 {
        if self.remaining() == 0 {
            self.inner.sample_rate()
        } else {
            self.sample_rate
        }
    }

    fn total_duration(&self) -> Option<Duration> {
        self.inner.total_duration()
    }

    fn try_seek(&mut self, pos: Duration) -> Result<(), rodio::source::SeekError> {
        self.block.clear();
        self.pos = 0;
        self.inner.try_seek(pos)
    }
}
