use std::collections::VecDeque;

/// Bounded FIFO of interleaved audio frames between the device callback and
/// the audio capture loop.
///
/// Wrap in `Arc<parking_lot::Mutex<SampleBuffer>>` for cross-thread access.
/// Overflow drops the oldest frames; the number dropped is counted.
#[derive(Debug)]
pub struct SampleBuffer {
    samples: VecDeque<f32>,
    channels: usize,
    capacity_frames: usize,
    dropped_frames: u64,
}

impl SampleBuffer {
    pub fn new(channels: u16, capacity_frames: usize) -> Self {
        let channels = channels.max(1) as usize;
        let capacity_frames = capacity_frames.max(1);
        Self {
            samples: VecDeque::with_capacity(capacity_frames * channels),
            channels,
            capacity_frames,
            dropped_frames: 0,
        }
    }

    /// Append interleaved samples. A trailing partial frame is ignored.
    pub fn push(&mut self, interleaved: &[f32]) {
        let whole = interleaved.len() - interleaved.len() % self.channels;
        if whole == 0 {
            return;
        }

        let capacity = self.capacity_frames * self.channels;
        let incoming = if whole > capacity {
            self.dropped_frames += ((whole - capacity) / self.channels) as u64;
            &interleaved[whole - capacity..whole]
        } else {
            &interleaved[..whole]
        };

        let overflow = (self.samples.len() + incoming.len()).saturating_sub(capacity);
        if overflow > 0 {
            self.samples.drain(..overflow);
            self.dropped_frames += (overflow / self.channels) as u64;
        }
        self.samples.extend(incoming.iter().copied());
    }

    /// Remove exactly `frames` frames, or nothing if fewer are buffered.
    pub fn pop_block(&mut self, frames: usize) -> Option<Vec<f32>> {
        let wanted = frames * self.channels;
        if wanted == 0 || self.samples.len() < wanted {
            return None;
        }
        Some(self.samples.drain(..wanted).collect())
    }

    /// Remove everything buffered, including a partial block.
    pub fn drain_all(&mut self) -> Vec<f32> {
        self.samples.drain(..).collect()
    }

    pub fn frames_available(&self) -> usize {
        self.samples.len() / self.channels
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    pub fn channels(&self) -> u16 {
        self.channels as u16
    }

    /// Frames lost to overflow since creation.
    pub fn dropped_frames(&self) -> u64 {
        self.dropped_frames
    }
}
