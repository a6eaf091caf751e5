use std::fs;
use std::path::Path;
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::Duration;

use chrono::Local;
use parking_lot::Mutex;

use crate::models::config::RecorderSettings;
use crate::models::error::CaptureError;
use crate::models::media_models::{AudioLevels, CaptureDiagnostics};
use crate::models::recording_result::{MediaOutput, RecordingMetadata, RecordingResult, TrackInfo};
use crate::models::state::CaptureState;
use crate::processing::sample_buffer::SampleBuffer;
use crate::processing::sample_convert::SampleConverter;
use crate::processing::wav_format::WavSpec;
use crate::session::audio_loop::{self, audio_callback};
use crate::session::control::CaptureControl;
use crate::session::countdown::run_countdown;
use crate::session::video_loop::{run_video_loop, VideoLoopSummary};
use crate::storage::checksum::sha256_file;
use crate::storage::metadata::write_metadata;
use crate::storage::naming::OutputPaths;
use crate::storage::wav_writer::WavFileWriter;
use crate::traits::capture_delegate::CaptureDelegate;
use crate::traits::capture_provider::AudioProvider;
use crate::traits::capture_session::CaptureSession;
use crate::traits::clock::{Clock, SystemClock};
use crate::traits::frame_source::FrameSource;
use crate::traits::video_encoder::VideoEncoder;

const TIMER_INTERVAL: Duration = Duration::from_millis(250);
const COUNTDOWN_TICK: Duration = Duration::from_secs(1);
/// Seconds of converted audio the sample buffer holds before dropping.
const BUFFER_SECONDS: usize = 5;

type VideoWorker<F, E> = JoinHandle<(F, E, VideoLoopSummary)>;
type AudioWorker = JoinHandle<(WavFileWriter, Result<(), CaptureError>)>;

/// Screen and audio recording orchestrator.
///
/// Generic over the screenshot source, the audio input and the video
/// encoder. The source and encoder move into the video thread while
/// recording and come back when it is joined.
///
/// ```text
/// [FrameSource] → video thread → [BGR24] → [VideoEncoder] → Recording.avi
/// [AudioProvider] → callback → [SampleBuffer] → audio thread → [WavFileWriter] → Recording.wav
/// ```
pub struct RecordingSession<F, A, E>
where
    F: FrameSource + 'static,
    A: AudioProvider,
    E: VideoEncoder + 'static,
{
    video_parts: Option<(F, E)>,
    audio: A,
    settings: Option<RecorderSettings>,
    control: Arc<CaptureControl>,
    clock: Arc<dyn Clock>,
    countdown_tick: Duration,
    outputs: Option<OutputPaths>,
    /// Display and input device names of the current recording.
    source_names: (Option<String>, Option<String>),
    audio_started: bool,

    video_handle: Option<VideoWorker<F, E>>,
    audio_handle: Option<AudioWorker>,
    timer_handle: Option<JoinHandle<()>>,
}

impl<F, A, E> RecordingSession<F, A, E>
where
    F: FrameSource + 'static,
    A: AudioProvider,
    E: VideoEncoder + 'static,
{
    pub fn new(frame_source: F, audio: A, encoder: E) -> Self {
        Self {
            video_parts: Some((frame_source, encoder)),
            audio,
            settings: None,
            control: Arc::new(CaptureControl::new()),
            clock: Arc::new(SystemClock),
            countdown_tick: COUNTDOWN_TICK,
            outputs: None,
            source_names: (None, None),
            audio_started: false,
            video_handle: None,
            audio_handle: None,
            timer_handle: None,
        }
    }

    /// Replace the clock that paces the video loop.
    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    /// Replace the length of one countdown tick (one second by default).
    pub fn with_countdown_tick(mut self, tick: Duration) -> Self {
        self.countdown_tick = tick;
        self
    }

    pub fn set_delegate(&mut self, delegate: Arc<dyn CaptureDelegate>) {
        self.control.set_delegate(delegate);
    }

    /// Shared control handle, e.g. to cancel a countdown from another thread.
    pub fn control(&self) -> Arc<CaptureControl> {
        Arc::clone(&self.control)
    }

    pub fn state(&self) -> CaptureState {
        self.control.state()
    }

    pub fn settings(&self) -> Option<&RecorderSettings> {
        self.settings.as_ref()
    }

    pub fn current_levels(&self) -> AudioLevels {
        self.control.levels()
    }

    pub fn diagnostics(&self) -> CaptureDiagnostics {
        self.control.diagnostics()
    }

    /// Active recording time so far, pauses excluded.
    pub fn elapsed(&self) -> f64 {
        self.control.elapsed()
    }

    /// True once a capture loop failed or the duration limit was hit.
    /// The caller should then call `stop_capture`.
    pub fn stop_requested(&self) -> bool {
        self.control.state().is_active() && self.control.stop_requested()
    }

    /// Apply settings. Only allowed while idle.
    pub fn configure(&mut self, settings: RecorderSettings) -> Result<(), CaptureError> {
        if !self.control.state().is_idle() {
            return Err(CaptureError::InvalidState("can only configure while idle".into()));
        }
        settings.validate().map_err(CaptureError::ConfigurationFailed)?;
        log::info!(
            "Configured: video={} {} @ {} fps, audio={} {} Hz x{}, output={:?}",
            settings.enable_video,
            settings.video_resolution,
            settings.frame_rate,
            settings.enable_audio,
            settings.audio_sample_rate,
            settings.audio_channels,
            settings.output_directory
        );
        self.settings = Some(settings);
        Ok(())
    }

    /// Run the countdown, then start the capture threads.
    /// Transitions: idle → counting_down → recording.
    pub fn start_capture(&mut self) -> Result<(), CaptureError> {
        let settings = self
            .settings
            .clone()
            .ok_or_else(|| CaptureError::ConfigurationFailed("not configured".into()))?;
        if !self.control.state().is_idle() {
            return Err(CaptureError::InvalidState("can only start while idle".into()));
        }
        self.control.clear_stop();

        if let Err(e) = run_countdown(&self.control, settings.countdown_secs, self.countdown_tick) {
            self.control.reset_to_idle();
            return Err(e);
        }

        let video_ready = settings.enable_video
            && self
                .video_parts
                .as_ref()
                .is_some_and(|(source, _)| source.is_available());
        if settings.enable_video && !video_ready {
            log::warn!("Screen capture is not available, recording without video");
        }
        let audio_ready = settings.enable_audio && self.audio.is_available();
        if settings.enable_audio && !audio_ready {
            log::warn!("Audio input is not available, recording without audio");
        }
        if !video_ready && !audio_ready {
            self.control.reset_to_idle();
            return Err(CaptureError::DeviceNotAvailable);
        }

        let paths = OutputPaths::resolve(&settings, Local::now());
        if let Err(e) = fs::create_dir_all(&settings.output_directory) {
            self.control.reset_to_idle();
            return Err(CaptureError::StorageError(format!(
                "failed to create output directory {}: {}",
                settings.output_directory.display(),
                e
            )));
        }

        let writer = if audio_ready {
            let mut writer = WavFileWriter::new(
                paths.audio.clone(),
                WavSpec {
                    sample_rate: settings.audio_sample_rate,
                    channels: settings.audio_channels,
                    bit_depth: settings.bit_depth,
                },
            );
            if let Err(e) = writer.open() {
                self.control.reset_to_idle();
                return Err(e);
            }
            Some(writer)
        } else {
            None
        };

        let display = video_ready
            .then(|| self.video_parts.as_ref().map(|(source, _)| source.display_info().name))
            .flatten();
        let device = audio_ready.then(|| self.audio.device_info().name);
        self.control.begin();
        self.outputs = Some(paths.clone());
        self.source_names = (display, device);

        if let Some(writer) = writer {
            let capacity = (settings.audio_sample_rate as usize * BUFFER_SECONDS).max(settings.block_frames() * 2);
            let buffer = Arc::new(Mutex::new(SampleBuffer::new(settings.audio_channels, capacity)));
            let callback = audio_callback(
                Arc::clone(&self.control),
                Arc::clone(&buffer),
                SampleConverter::new(settings.audio_sample_rate, settings.audio_channels),
            );

            if let Err(e) = self.audio.start(callback) {
                log::error!("Failed to start audio input: {}", e);
                drop(writer);
                if let Err(remove_err) = fs::remove_file(&paths.audio) {
                    log::warn!("Failed to remove {:?}: {}", paths.audio, remove_err);
                }
                self.outputs = None;
                self.control.reset_to_idle();
                return Err(e);
            }
            self.audio_started = true;

            if let Err(e) = self.spawn_audio_worker(writer, buffer, settings.block_frames()) {
                return Err(self.abort_after_spawn_failure(e));
            }
        }

        if video_ready {
            if let Some(parts) = self.video_parts.take() {
                if let Err(e) = self.spawn_video_worker(parts, paths.video.clone(), settings.clone()) {
                    return Err(self.abort_after_spawn_failure(e));
                }
            }
        }

        if let Err(e) = self.spawn_timer(settings.max_duration_secs) {
            return Err(self.abort_after_spawn_failure(e));
        }

        log::info!(
            "Recording started: video={:?} from {:?}, audio={:?} from {:?}",
            video_ready.then_some(&paths.video),
            self.source_names.0,
            audio_ready.then_some(&paths.audio),
            self.source_names.1
        );
        Ok(())
    }

    /// Pause capture. Transitions: recording → paused.
    pub fn pause_capture(&mut self) -> Result<(), CaptureError> {
        let duration = self.control.pause()?;
        log::info!("Recording paused at {:.1}s", duration);
        Ok(())
    }

    /// Resume capture. Transitions: paused → recording.
    pub fn resume_capture(&mut self) -> Result<(), CaptureError> {
        let duration = self.control.resume()?;
        log::info!("Recording resumed at {:.1}s", duration);
        Ok(())
    }

    /// Pause if recording, resume if paused. Returns `true` if now paused.
    pub fn toggle_pause(&mut self) -> Result<bool, CaptureError> {
        match self.control.state() {
            CaptureState::Recording { .. } => self.pause_capture().map(|()| true),
            CaptureState::Paused { .. } => self.resume_capture().map(|()| false),
            other => Err(CaptureError::InvalidState(format!(
                "cannot pause or resume while {}",
                other.name()
            ))),
        }
    }

    /// Stop capture, finalize both files and write the metadata sidecar.
    /// Transitions: recording/paused → stopping → completed/failed → idle.
    pub fn stop_capture(&mut self) -> Result<RecordingResult, CaptureError> {
        if !self.control.state().is_active() {
            return Err(CaptureError::InvalidState(
                "can only stop while recording or paused".into(),
            ));
        }

        if self.audio_started {
            if let Err(e) = self.audio.stop() {
                log::warn!("Failed to stop audio input: {}", e);
            }
            self.audio_started = false;
        }

        self.control.set_state(CaptureState::Stopping);
        self.control.request_stop();

        let video_summary = self.join_video_worker();
        let (audio_output, audio_frames) = self.join_audio_worker();
        if let Some(handle) = self.timer_handle.take() {
            if handle.join().is_err() {
                log::error!("Duration timer thread panicked");
            }
        }

        let duration = self.control.elapsed();
        let outputs = self.outputs.take();

        let mut video_output = None;
        if let (Some(summary), Some(paths)) = (&video_summary, &outputs) {
            if let Some(e) = &summary.finish_error {
                self.control.record_error(e.clone());
            } else if summary.geometry.is_some() {
                match finished_output(&paths.video) {
                    Ok(output) => video_output = Some(output),
                    Err(e) => self.control.record_error(e),
                }
            }
        }

        if video_output.is_none() && audio_output.is_none() {
            let error = self
                .control
                .error()
                .unwrap_or_else(|| CaptureError::CaptureFailed("no media was captured".into()));
            log::error!("Recording failed: {}", error);
            self.control.set_state(CaptureState::Failed(error.clone()));
            self.control.reset_to_idle();
            return Err(error);
        }
        if let Some(error) = self.control.error() {
            log::warn!("Recording finished with a partial failure: {}", error);
        }

        let tracks = self.tracks(video_output.as_ref(), video_summary.as_ref(), audio_output.as_ref(), audio_frames);
        let result = RecordingResult {
            video: video_output,
            audio: audio_output,
            duration_secs: duration,
            metadata: RecordingMetadata::new(duration, tracks),
        };

        if let Some(primary) = result.primary_path() {
            match write_metadata(&result.metadata, primary) {
                Ok(path) => log::debug!("Metadata written to {:?}", path),
                Err(e) => log::warn!("Failed to write metadata: {}", e),
            }
        }

        log::info!(
            "Recording stopped after {:.1}s: {:?}",
            result.duration_secs,
            result.primary_path()
        );
        self.control.set_state(CaptureState::Completed(Box::new(result.clone())));
        self.control.notify_finished(&result);
        self.control.reset_to_idle();
        Ok(result)
    }

    fn tracks(
        &self,
        video: Option<&MediaOutput>,
        summary: Option<&VideoLoopSummary>,
        audio: Option<&MediaOutput>,
        audio_frames: u64,
    ) -> Vec<TrackInfo> {
        let mut tracks = Vec::new();
        if let (Some(output), Some(summary)) = (video, summary) {
            if let Some(geometry) = summary.geometry {
                tracks.push(TrackInfo::Video {
                    file_path: output.file_path.to_string_lossy().into_owned(),
                    width: geometry.output.width,
                    height: geometry.output.height,
                    frame_rate: geometry.frame_rate,
                    frame_count: summary.frames_written,
                    source: self.source_names.0.clone().unwrap_or_default(),
                    checksum: output.checksum.clone(),
                });
            }
        }
        if let (Some(output), Some(settings)) = (audio, &self.settings) {
            tracks.push(TrackInfo::Audio {
                file_path: output.file_path.to_string_lossy().into_owned(),
                sample_rate: settings.audio_sample_rate,
                channels: settings.audio_channels,
                bit_depth: settings.bit_depth,
                sample_frames: audio_frames,
                source: self.source_names.1.clone().unwrap_or_default(),
                checksum: output.checksum.clone(),
            });
        }
        tracks
    }

    fn spawn_audio_worker(
        &mut self,
        mut writer: WavFileWriter,
        buffer: Arc<Mutex<SampleBuffer>>,
        block_frames: usize,
    ) -> Result<(), CaptureError> {
        let control = Arc::clone(&self.control);
        let handle = thread::Builder::new()
            .name("audio-capture".into())
            .spawn(move || {
                let result = audio_loop::run_audio_loop(&control, &buffer, &mut writer, block_frames);
                if let Err(e) = &result {
                    control.record_error(e.clone());
                }
                (writer, result)
            })
            .map_err(|e| CaptureError::Unknown(format!("failed to spawn audio thread: {}", e)))?;
        self.audio_handle = Some(handle);
        Ok(())
    }

    fn spawn_video_worker(
        &mut self,
        (mut source, mut encoder): (F, E),
        path: std::path::PathBuf,
        settings: RecorderSettings,
    ) -> Result<(), CaptureError> {
        let control = Arc::clone(&self.control);
        let clock = Arc::clone(&self.clock);
        let handle = thread::Builder::new()
            .name("video-capture".into())
            .spawn(move || {
                let summary = run_video_loop(&control, &mut source, &mut encoder, &path, &settings, clock.as_ref());
                (source, encoder, summary)
            })
            .map_err(|e| CaptureError::Unknown(format!("failed to spawn video thread: {}", e)))?;
        self.video_handle = Some(handle);
        Ok(())
    }

    /// Duration/levels updates every 250 ms; enforces the duration limit.
    fn spawn_timer(&mut self, max_duration_secs: Option<f64>) -> Result<(), CaptureError> {
        let control = Arc::clone(&self.control);
        let handle = thread::Builder::new()
            .name("duration-timer".into())
            .spawn(move || {
                while !control.wait_for_stop(TIMER_INTERVAL) {
                    let duration = control.tick();
                    if let Some(max) = max_duration_secs {
                        if duration >= max {
                            log::info!("Maximum duration of {:.1}s reached", max);
                            control.request_stop();
                        }
                    }
                }
            })
            .map_err(|e| CaptureError::Unknown(format!("failed to spawn timer thread: {}", e)))?;
        self.timer_handle = Some(handle);
        Ok(())
    }

    /// Wind down whatever did start and hand back the spawn error.
    fn abort_after_spawn_failure(&mut self, error: CaptureError) -> CaptureError {
        self.control.record_error(error.clone());
        if let Err(stop_err) = self.stop_capture() {
            log::debug!("Stop after failed start: {}", stop_err);
        }
        error
    }

    fn join_video_worker(&mut self) -> Option<VideoLoopSummary> {
        let handle = self.video_handle.take()?;
        match handle.join() {
            Ok((source, encoder, summary)) => {
                self.video_parts = Some((source, encoder));
                Some(summary)
            }
            Err(_) => {
                self.control
                    .record_error(CaptureError::Unknown("video capture thread panicked".into()));
                None
            }
        }
    }

    fn join_audio_worker(&mut self) -> (Option<MediaOutput>, u64) {
        let Some(handle) = self.audio_handle.take() else {
            return (None, 0);
        };
        match handle.join() {
            Ok((mut writer, _)) => {
                let frames = writer.frames_written();
                if !writer.is_open() {
                    return (None, frames);
                }
                match writer.close() {
                    Ok(output) => (Some(output), frames),
                    Err(e) => {
                        self.control.record_error(e);
                        (None, frames)
                    }
                }
            }
            Err(_) => {
                self.control
                    .record_error(CaptureError::Unknown("audio capture thread panicked".into()));
                (None, 0)
            }
        }
    }
}

impl<F, A, E> Drop for RecordingSession<F, A, E>
where
    F: FrameSource + 'static,
    A: AudioProvider,
    E: VideoEncoder + 'static,
{
    fn drop(&mut self) {
        if self.control.state().is_active() {
            log::warn!("Recording session dropped while active, finalizing files");
            if let Err(e) = self.stop_capture() {
                log::error!("Failed to finalize recording on drop: {}", e);
            }
        }
    }
}

impl<F, A, E> CaptureSession for RecordingSession<F, A, E>
where
    F: FrameSource + 'static,
    A: AudioProvider,
    E: VideoEncoder + 'static,
{
    fn state(&self) -> CaptureState {
        RecordingSession::state(self)
    }

    fn configure(&mut self, settings: RecorderSettings) -> Result<(), CaptureError> {
        RecordingSession::configure(self, settings)
    }

    fn start_capture(&mut self) -> Result<(), CaptureError> {
        RecordingSession::start_capture(self)
    }

    fn pause_capture(&mut self) -> Result<(), CaptureError> {
        RecordingSession::pause_capture(self)
    }

    fn resume_capture(&mut self) -> Result<(), CaptureError> {
        RecordingSession::resume_capture(self)
    }

    fn stop_capture(&mut self) -> Result<RecordingResult, CaptureError> {
        RecordingSession::stop_capture(self)
    }
}

/// Size and checksum of a file another component finished writing.
fn finished_output(path: &Path) -> Result<MediaOutput, CaptureError> {
    let size_bytes = fs::metadata(path)
        .map_err(|e| CaptureError::StorageError(format!("missing output {}: {}", path.display(), e)))?
        .len();
    Ok(MediaOutput {
        file_path: path.to_path_buf(),
        size_bytes,
        checksum: sha256_file(path)?,
    })
}
