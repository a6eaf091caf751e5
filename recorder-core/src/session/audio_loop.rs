use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;

use crate::models::error::CaptureError;
use crate::models::media_models::AudioLevels;
use crate::processing::sample_buffer::SampleBuffer;
use crate::processing::sample_convert::{self, SampleConverter};
use crate::session::control::CaptureControl;
use crate::storage::wav_writer::WavFileWriter;
use crate::traits::capture_provider::AudioBufferCallback;

/// How often the loop checks the buffer for a full block.
pub const AUDIO_POLL_INTERVAL: Duration = Duration::from_millis(50);

/// Build the provider callback: convert every buffer to the recording format
/// and queue it, but only while the session is recording and no stop has
/// been requested.
///
/// The buffer lock is held across the accept decision, so once the loop has
/// drained the buffer after a stop nothing more is queued or counted.
pub fn audio_callback(
    control: Arc<CaptureControl>,
    buffer: Arc<Mutex<SampleBuffer>>,
    converter: SampleConverter,
) -> AudioBufferCallback {
    let channels = converter.target_channels.max(1) as usize;
    let converter = Mutex::new(converter);
    Arc::new(move |samples: &[f32], sample_rate: u32, source_channels: u16| {
        if samples.is_empty() || source_channels == 0 || sample_rate == 0 {
            return;
        }
        let levels = AudioLevels {
            level: sample_convert::rms_level(samples),
            peak: sample_convert::peak_level(samples),
        };
        let converted = converter.lock().convert(samples, sample_rate, source_channels);
        let frames = converted.len() / channels;

        let mut queue = buffer.lock();
        if control.on_audio_buffer(frames, levels) {
            queue.push(&converted);
        }
    })
}

/// Drain fixed-size blocks from `buffer` into `writer` until a stop is
/// requested, then flush whatever partial block remains.
///
/// The writer must already be open; closing it is left to the caller.
pub fn run_audio_loop(
    control: &CaptureControl,
    buffer: &Mutex<SampleBuffer>,
    writer: &mut WavFileWriter,
    block_frames: usize,
) -> Result<(), CaptureError> {
    log::debug!("Audio loop started: {} frames per block", block_frames);

    while control.should_run() {
        if control.is_paused() && !control.wait_while_paused(AUDIO_POLL_INTERVAL * 5) {
            break;
        }

        loop {
            let block = buffer.lock().pop_block(block_frames);
            let Some(block) = block else { break };
            write_block(control, writer, &block)?;
        }

        control.wait_for_stop(AUDIO_POLL_INTERVAL);
    }

    let (tail, dropped) = {
        let mut buffer = buffer.lock();
        (buffer.drain_all(), buffer.dropped_frames())
    };
    if !tail.is_empty() {
        write_block(control, writer, &tail)?;
    }
    if dropped > 0 {
        log::warn!("Audio buffer overflowed, {} frames dropped", dropped);
    }

    log::debug!(
        "Audio loop exited: {} frames, {} bytes",
        writer.frames_written(),
        writer.data_bytes()
    );
    Ok(())
}

fn write_block(control: &CaptureControl, writer: &mut WavFileWriter, block: &[f32]) -> Result<(), CaptureError> {
    let bytes = writer.write_samples(block)?;
    control.update_diagnostics(|d| {
        d.audio_blocks_written += 1;
        d.audio_bytes_written += bytes as u64;
    });
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::processing::wav_format::{self, WavSpec};
    use std::thread;

    const SPEC: WavSpec = WavSpec {
        sample_rate: 8_000,
        channels: 2,
        bit_depth: 16,
    };

    #[test]
    fn callback_queues_only_while_recording() {
        let control = Arc::new(CaptureControl::new());
        let buffer = Arc::new(Mutex::new(SampleBuffer::new(2, 1_000)));
        let callback = audio_callback(Arc::clone(&control), Arc::clone(&buffer), SampleConverter::new(8_000, 2));

        callback(&[0.5; 20], 8_000, 1);
        assert!(buffer.lock().is_empty());

        control.begin();
        callback(&[0.5; 20], 8_000, 1);
        assert_eq!(buffer.lock().frames_available(), 20);

        control.pause().unwrap();
        callback(&[0.5; 20], 8_000, 1);
        assert_eq!(buffer.lock().frames_available(), 20);

        // Buffers before the start belong to no recording; begin() resets the counters.
        let diagnostics = control.diagnostics();
        assert_eq!(diagnostics.audio_frames_received, 20);
        assert_eq!(diagnostics.audio_frames_discarded, 20);
        assert!(control.levels().peak > 0.49);
    }

    #[test]
    fn callback_rejects_buffers_after_stop_request() {
        let control = Arc::new(CaptureControl::new());
        let buffer = Arc::new(Mutex::new(SampleBuffer::new(2, 1_000)));
        let callback = audio_callback(Arc::clone(&control), Arc::clone(&buffer), SampleConverter::new(8_000, 2));

        control.begin();
        callback(&[0.5; 20], 8_000, 1);
        control.request_stop();
        assert!(control.is_recording());
        callback(&[0.5; 20], 8_000, 1);

        assert_eq!(buffer.lock().frames_available(), 20);
        let diagnostics = control.diagnostics();
        assert_eq!(diagnostics.audio_frames_received, 20);
        assert_eq!(diagnostics.audio_frames_discarded, 20);
    }

    #[test]
    fn callback_resamples_to_target_rate() {
        let control = Arc::new(CaptureControl::new());
        control.begin();
        let buffer = Arc::new(Mutex::new(SampleBuffer::new(2, 100_000)));
        let callback = audio_callback(Arc::clone(&control), Arc::clone(&buffer), SampleConverter::new(8_000, 2));

        callback(&vec![0.1; 16_000 * 2], 16_000, 2);
        let frames = buffer.lock().frames_available();
        assert!((7_990..=8_010).contains(&frames), "got {} frames", frames);
    }

    #[test]
    fn writes_full_blocks_and_flushes_tail() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("Recording.wav");
        let mut writer = WavFileWriter::new(path.clone(), SPEC);
        writer.open().unwrap();

        let control = Arc::new(CaptureControl::new());
        control.begin();
        let buffer = Arc::new(Mutex::new(SampleBuffer::new(2, 10_000)));
        // Two full 100-frame blocks and a 30-frame tail.
        buffer.lock().push(&vec![0.25; 230 * 2]);

        let stopper = {
            let control = Arc::clone(&control);
            thread::spawn(move || {
                thread::sleep(Duration::from_millis(150));
                control.request_stop();
            })
        };
        run_audio_loop(&control, &buffer, &mut writer, 100).unwrap();
        stopper.join().unwrap();

        assert_eq!(writer.frames_written(), 230);
        let diagnostics = control.diagnostics();
        assert_eq!(diagnostics.audio_blocks_written, 3);
        assert_eq!(diagnostics.audio_bytes_written, 230 * 4);

        writer.close().unwrap();
        let data = std::fs::read(&path).unwrap();
        let (_, data_size) = wav_format::parse_header(&data).unwrap();
        assert_eq!(data_size, 230 * 4);
    }

    #[test]
    fn stopped_loop_still_drains_buffer() {
        let dir = tempfile::tempdir().unwrap();
        let mut writer = WavFileWriter::new(dir.path().join("a.wav"), SPEC);
        writer.open().unwrap();

        let control = CaptureControl::new();
        control.request_stop();
        let buffer = Mutex::new(SampleBuffer::new(2, 1_000));
        buffer.lock().push(&[0.0; 10]);

        run_audio_loop(&control, &buffer, &mut writer, 8_000).unwrap();
        assert_eq!(writer.frames_written(), 5);
        assert!(buffer.lock().is_empty());
    }

    #[test]
    fn write_failure_propagates() {
        let control = CaptureControl::new();
        control.request_stop();
        let buffer = Mutex::new(SampleBuffer::new(2, 1_000));
        buffer.lock().push(&[0.0; 4]);
        let mut writer = WavFileWriter::new("never-opened.wav".into(), SPEC);

        assert!(matches!(
            run_audio_loop(&control, &buffer, &mut writer, 100),
            Err(CaptureError::StorageError(_))
        ));
    }
}
