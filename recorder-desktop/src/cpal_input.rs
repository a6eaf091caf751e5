//! Audio input provider backed by `cpal`.
//!
//! Opens the selected (or default) input device and delivers f32 samples via
//! the `AudioBufferCallback`. The `cpal::Stream` lives on a dedicated thread
//! for the whole recording because streams cannot cross threads on every
//! platform.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{mpsc, Arc};
use std::thread;
use std::time::Duration;

use cpal::traits::{DeviceTrait, StreamTrait};
use cpal::{SampleFormat, SampleRate, StreamConfig};
use parking_lot::Mutex;

use screen_recorder_core::models::error::CaptureError;
use screen_recorder_core::models::media_models::AudioSource;
use screen_recorder_core::processing::sample_convert;
use screen_recorder_core::traits::capture_provider::{AudioBufferCallback, AudioProvider};

use crate::device_enumerator::DeviceEnumerator;

const STARTUP_TIMEOUT: Duration = Duration::from_secs(5);
const PARK_INTERVAL: Duration = Duration::from_millis(100);

/// Microphone / line-in capture through `cpal`.
pub struct CpalAudioProvider {
    device_name: Option<String>,
    target_rate: u32,
    fallback_rate: u32,
    running: Arc<AtomicBool>,
    capture_handle: Mutex<Option<thread::JoinHandle<()>>>,
    stream_rate: Arc<Mutex<Option<u32>>>,
}

impl CpalAudioProvider {
    /// Capture from `device_name`, or the system default input for `None`.
    ///
    /// The stream asks for `target_rate` first, then `fallback_rate`, then
    /// whatever the device defaults to.
    pub fn new(device_name: Option<String>, target_rate: u32, fallback_rate: u32) -> Self {
        Self {
            device_name,
            target_rate,
            fallback_rate,
            running: Arc::new(AtomicBool::new(false)),
            capture_handle: Mutex::new(None),
            stream_rate: Arc::new(Mutex::new(None)),
        }
    }

    /// Rate the running stream was opened at.
    pub fn stream_rate(&self) -> Option<u32> {
        *self.stream_rate.lock()
    }
}

impl AudioProvider for CpalAudioProvider {
    fn is_available(&self) -> bool {
        DeviceEnumerator::new()
            .find_input_device(self.device_name.as_deref())
            .is_ok()
    }

    fn start(&mut self, callback: AudioBufferCallback) -> Result<(), CaptureError> {
        if self.running.load(Ordering::SeqCst) {
            return Err(CaptureError::InvalidState("audio input already running".into()));
        }

        self.running.store(true, Ordering::SeqCst);
        let running = Arc::clone(&self.running);
        let stream_rate = Arc::clone(&self.stream_rate);
        let device_name = self.device_name.clone();
        let (target_rate, fallback_rate) = (self.target_rate, self.fallback_rate);
        let (ready_tx, ready_rx) = mpsc::channel::<Result<u32, CaptureError>>();

        let handle = thread::Builder::new()
            .name("cpal-input".into())
            .spawn(move || {
                let stream = match open_stream(device_name.as_deref(), target_rate, fallback_rate, callback) {
                    Ok((stream, rate)) => {
                        *stream_rate.lock() = Some(rate);
                        let _ = ready_tx.send(Ok(rate));
                        stream
                    }
                    Err(e) => {
                        running.store(false, Ordering::SeqCst);
                        let _ = ready_tx.send(Err(e));
                        return;
                    }
                };

                while running.load(Ordering::SeqCst) {
                    thread::park_timeout(PARK_INTERVAL);
                }
                if let Err(e) = stream.pause() {
                    log::debug!("Failed to pause input stream: {}", e);
                }
                drop(stream);
                *stream_rate.lock() = None;
            })
            .map_err(|e| CaptureError::Unknown(format!("failed to spawn audio input thread: {}", e)))?;

        *self.capture_handle.lock() = Some(handle);

        match ready_rx.recv_timeout(STARTUP_TIMEOUT) {
            Ok(Ok(rate)) => {
                log::info!("Audio input started at {} Hz", rate);
                Ok(())
            }
            Ok(Err(e)) => {
                self.stop()?;
                Err(e)
            }
            Err(_) => {
                self.stop()?;
                Err(CaptureError::DeviceNotAvailable)
            }
        }
    }

    fn stop(&mut self) -> Result<(), CaptureError> {
        self.running.store(false, Ordering::SeqCst);
        if let Some(handle) = self.capture_handle.lock().take() {
            handle.thread().unpark();
            if handle.join().is_err() {
                return Err(CaptureError::Unknown("audio input thread panicked".into()));
            }
        }
        Ok(())
    }

    fn device_info(&self) -> AudioSource {
        let enumerator = DeviceEnumerator::new();
        let default_name = enumerator.default_input_device_name();
        let name = self
            .device_name
            .clone()
            .or_else(|| default_name.clone())
            .unwrap_or_else(|| "Default Input".into());
        AudioSource {
            id: name.clone(),
            is_default: self.device_name.is_none() || self.device_name == default_name,
            name,
        }
    }
}

/// Pick the stream rate: `target` if some supported range contains it, else
/// `fallback`, else the device default.
pub fn choose_sample_rate(supported: &[(u32, u32)], target: u32, fallback: u32, device_default: u32) -> u32 {
    let supports = |rate: u32| supported.iter().any(|&(min, max)| (min..=max).contains(&rate));
    if supports(target) {
        target
    } else if supports(fallback) {
        log::warn!("Input device does not support {} Hz, falling back to {} Hz", target, fallback);
        fallback
    } else {
        log::warn!(
            "Input device supports neither {} nor {} Hz, using its default {} Hz",
            target,
            fallback,
            device_default
        );
        device_default
    }
}

fn open_stream(
    device_name: Option<&str>,
    target_rate: u32,
    fallback_rate: u32,
    callback: AudioBufferCallback,
) -> Result<(cpal::Stream, u32), CaptureError> {
    let device = DeviceEnumerator::new().find_input_device(device_name)?;
    let default_config = device
        .default_input_config()
        .map_err(|e| CaptureError::ConfigurationFailed(format!("no input config: {}", e)))?;
    let format = default_config.sample_format();

    let supported: Vec<(u32, u32)> = device
        .supported_input_configs()
        .map(|configs| {
            configs
                .filter(|c| c.sample_format() == format && c.channels() == default_config.channels())
                .map(|c| (c.min_sample_rate().0, c.max_sample_rate().0))
                .collect()
        })
        .unwrap_or_default();
    let rate = choose_sample_rate(&supported, target_rate, fallback_rate, default_config.sample_rate().0);

    let config = StreamConfig {
        channels: default_config.channels(),
        sample_rate: SampleRate(rate),
        buffer_size: cpal::BufferSize::Default,
    };
    let channels = config.channels;
    let err_fn = |err: cpal::StreamError| log::error!("Audio input stream error: {}", err);

    let stream = match format {
        SampleFormat::F32 => device.build_input_stream(
            &config,
            move |data: &[f32], _: &cpal::InputCallbackInfo| callback(data, rate, channels),
            err_fn,
            None,
        ),
        SampleFormat::I16 => device.build_input_stream(
            &config,
            move |data: &[i16], _: &cpal::InputCallbackInfo| {
                callback(&sample_convert::i16_to_f32(data), rate, channels)
            },
            err_fn,
            None,
        ),
        SampleFormat::U16 => device.build_input_stream(
            &config,
            move |data: &[u16], _: &cpal::InputCallbackInfo| {
                callback(&sample_convert::u16_to_f32(data), rate, channels)
            },
            err_fn,
            None,
        ),
        other => {
            return Err(CaptureError::ConfigurationFailed(format!(
                "unsupported sample format: {:?}",
                other
            )))
        }
    }
    .map_err(|e| match e {
        cpal::BuildStreamError::DeviceNotAvailable => CaptureError::DeviceNotAvailable,
        other => CaptureError::ConfigurationFailed(format!("failed to build input stream: {}", other)),
    })?;

    stream
        .play()
        .map_err(|e| CaptureError::CaptureFailed(format!("failed to start input stream: {}", e)))?;
    Ok((stream, rate))
}
