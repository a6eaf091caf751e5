/// Converts interleaved device audio to the recording format.
///
/// Devices rarely deliver exactly what the WAV file wants, so every buffer is
/// brought to `target_rate` / `target_channels` before it is queued. The
/// resampler is stateful: the read position and the last input frame carry
/// over between buffers, so a stream split into many buffers produces the
/// same frames as one long buffer.
#[derive(Debug, Clone, PartialEq)]
pub struct SampleConverter {
    pub target_rate: u32,
    pub target_channels: u16,
    /// Rate of the stream the carried state belongs to.
    source_rate: u32,
    /// Next output position in source frames, relative to the first frame of
    /// the next buffer. Never below -1, the carried frame.
    position: f64,
    /// Last frame of the previous buffer, already in target channels.
    previous: Vec<f32>,
}

impl SampleConverter {
    pub fn new(target_rate: u32, target_channels: u16) -> Self {
        Self {
            target_rate,
            target_channels,
            source_rate: 0,
            position: 0.0,
            previous: Vec::new(),
        }
    }

    /// Resample and re-channel one interleaved buffer of a continuous stream.
    pub fn convert(&mut self, samples: &[f32], source_rate: u32, source_channels: u16) -> Vec<f32> {
        let adapted = adapt_channels(samples, source_channels, self.target_channels);
        if source_rate != self.source_rate {
            self.reset();
            self.source_rate = source_rate;
        }
        if source_rate == self.target_rate || source_rate == 0 {
            return adapted;
        }
        self.resample(&adapted)
    }

    /// Forget the carried position, e.g. before a new stream.
    pub fn reset(&mut self) {
        self.position = 0.0;
        self.previous.clear();
    }

    fn resample(&mut self, samples: &[f32]) -> Vec<f32> {
        let channels = self.target_channels.max(1) as usize;
        let frame_count = samples.len() / channels;
        if frame_count == 0 {
            return Vec::new();
        }

        let step = self.source_rate as f64 / self.target_rate as f64;
        let last_index = (frame_count - 1) as f64;
        let capacity = ((last_index - self.position) / step) as usize + 1;
        let mut output = Vec::with_capacity(capacity * channels);

        let mut position = self.position;
        while position <= last_index {
            let index = position.floor();
            let fraction = (position - index) as f32;
            let a = frame_at(samples, &self.previous, channels, index as isize);
            if fraction == 0.0 {
                output.extend_from_slice(a);
            } else {
                let b = frame_at(samples, &self.previous, channels, index as isize + 1);
                output.extend(a.iter().zip(b).map(|(a, b)| a * (1.0 - fraction) + b * fraction));
            }
            position += step;
        }

        self.position = position - frame_count as f64;
        self.previous = samples[(frame_count - 1) * channels..frame_count * channels].to_vec();
        output
    }
}

/// Frame `index` of `samples`; -1 is the frame carried from the previous buffer.
fn frame_at<'a>(samples: &'a [f32], previous: &'a [f32], channels: usize, index: isize) -> &'a [f32] {
    if index < 0 {
        previous
    } else {
        let start = index as usize * channels;
        &samples[start..start + channels]
    }
}

/// Bring interleaved audio from `from` channels to `to` channels.
///
/// Mono is duplicated into every output channel; multi-channel input
/// is averaged down to mono first when the channel counts differ.
pub fn adapt_channels(samples: &[f32], from: u16, to: u16) -> Vec<f32> {
    let from = from.max(1) as usize;
    let to = to.max(1) as usize;
    if from == to {
        return samples.to_vec();
    }

    let frames = samples.len() / from;
    let mut out = Vec::with_capacity(frames * to);
    for frame in samples.chunks_exact(from) {
        let value = if from == 1 {
            frame[0]
        } else {
            frame.iter().sum::<f32>() / from as f32
        };
        out.extend(std::iter::repeat(value).take(to));
    }
    out
}

/// Convert f32 samples `[-1.0, 1.0]` to 16-bit little-endian PCM.
///
/// Clamps out-of-range values. Output length = `samples.len() * 2` bytes.
pub fn to_pcm16(samples: &[f32]) -> Vec<u8> {
    let mut data = Vec::with_capacity(samples.len() * 2);
    for &sample in samples {
        let value = (sample.clamp(-1.0, 1.0) * i16::MAX as f32) as i16;
        data.extend_from_slice(&value.to_le_bytes());
    }
    data
}

/// Integer device samples to f32 in `[-1.0, 1.0)`.
pub fn i16_to_f32(samples: &[i16]) -> Vec<f32> {
    samples.iter().map(|&s| s as f32 / 32_768.0).collect()
}

pub fn u16_to_f32(samples: &[u16]) -> Vec<f32> {
    samples.iter().map(|&s| (s as f32 - 32_768.0) / 32_768.0).collect()
}

/// RMS level of samples (0.0–1.0 for normalized audio).
pub fn rms_level(samples: &[f32]) -> f32 {
    if samples.is_empty() {
        return 0.0;
    }
    let sum_sq: f32 = samples.iter().map(|s| s * s).sum();
    (sum_sq / samples.len() as f32).sqrt()
}

/// Peak absolute level of samples.
pub fn peak_level(samples: &[f32]) -> f32 {
    samples.iter().fold(0.0f32, |peak, s| peak.max(s.abs()))
}
