use std::fs::{self, File};
use std::io::Write;
use std::path::Path;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

use parking_lot::Mutex;

use screen_recorder_core::processing::wav_format;
use screen_recorder_core::storage::metadata::read_metadata;
use screen_recorder_core::{
    AudioBufferCallback, AudioLevels, AudioProvider, AudioSource, CaptureDelegate, CaptureError, CaptureSession,
    CaptureState, Clock, DisplayInfo, FileNaming, FrameGeometry, FrameSource, RecorderSettings, RecordingResult,
    RecordingSession, Resolution, TrackInfo, VideoEncoder, VideoFrame,
};

// --- test doubles ---

struct TestScreen {
    available: bool,
    fail_after: Option<u64>,
    grabs: u64,
}

impl TestScreen {
    fn new() -> Self {
        Self {
            available: true,
            fail_after: None,
            grabs: 0,
        }
    }
}

impl FrameSource for TestScreen {
    fn is_available(&self) -> bool {
        self.available
    }

    fn display_info(&self) -> DisplayInfo {
        DisplayInfo {
            id: 1,
            name: "test screen".into(),
            width: 9,
            height: 7,
            is_primary: true,
        }
    }

    fn capture_frame(&mut self) -> Result<VideoFrame, CaptureError> {
        if self.fail_after.is_some_and(|n| self.grabs >= n) {
            return Err(CaptureError::CaptureFailed("display went away".into()));
        }
        self.grabs += 1;
        Ok(VideoFrame::new(vec![200; 9 * 7 * 4], 9, 7))
    }
}

/// Writes raw frames straight to the output path.
struct RawFileEncoder {
    file: Option<File>,
    frames: Arc<AtomicU64>,
    geometry: Arc<Mutex<Option<FrameGeometry>>>,
}

impl RawFileEncoder {
    fn new() -> (Self, Arc<AtomicU64>, Arc<Mutex<Option<FrameGeometry>>>) {
        let frames = Arc::new(AtomicU64::new(0));
        let geometry = Arc::new(Mutex::new(None));
        let encoder = Self {
            file: None,
            frames: Arc::clone(&frames),
            geometry: Arc::clone(&geometry),
        };
        (encoder, frames, geometry)
    }
}

impl VideoEncoder for RawFileEncoder {
    fn open(&mut self, path: &Path, geometry: FrameGeometry, _settings: &RecorderSettings) -> Result<(), CaptureError> {
        let file = File::create(path).map_err(|e| CaptureError::EncodingFailed(e.to_string()))?;
        self.file = Some(file);
        *self.geometry.lock() = Some(geometry);
        Ok(())
    }

    fn write_frame(&mut self, bgr: &[u8]) -> Result<(), CaptureError> {
        let file = self
            .file
            .as_mut()
            .ok_or_else(|| CaptureError::EncodingFailed("not open".into()))?;
        file.write_all(bgr).map_err(|e| CaptureError::EncodingFailed(e.to_string()))?;
        self.frames.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    fn finish(&mut self) -> Result<(), CaptureError> {
        if let Some(file) = self.file.take() {
            file.sync_all().map_err(|e| CaptureError::EncodingFailed(e.to_string()))?;
        }
        Ok(())
    }

    fn frames_written(&self) -> u64 {
        self.frames.load(Ordering::SeqCst)
    }
}

/// Delivers 10 ms mono buffers of a constant signal from its own thread.
struct ToneInput {
    available: bool,
    fail_start: bool,
    sample_rate: u32,
    running: Arc<AtomicBool>,
    handle: Option<JoinHandle<()>>,
}

impl ToneInput {
    fn new(sample_rate: u32) -> Self {
        Self {
            available: true,
            fail_start: false,
            sample_rate,
            running: Arc::new(AtomicBool::new(false)),
            handle: None,
        }
    }
}

impl AudioProvider for ToneInput {
    fn is_available(&self) -> bool {
        self.available
    }

    fn start(&mut self, callback: AudioBufferCallback) -> Result<(), CaptureError> {
        if self.fail_start {
            return Err(CaptureError::PermissionDenied);
        }
        self.running.store(true, Ordering::SeqCst);
        let running = Arc::clone(&self.running);
        let rate = self.sample_rate;
        self.handle = Some(thread::spawn(move || {
            let buffer = vec![0.25f32; (rate / 100) as usize];
            while running.load(Ordering::SeqCst) {
                callback(&buffer, rate, 1);
                thread::sleep(Duration::from_millis(10));
            }
        }));
        Ok(())
    }

    fn stop(&mut self) -> Result<(), CaptureError> {
        self.running.store(false, Ordering::SeqCst);
        if let Some(handle) = self.handle.take() {
            let _ = handle.join();
        }
        Ok(())
    }

    fn device_info(&self) -> AudioSource {
        AudioSource {
            id: "tone".into(),
            name: "Tone".into(),
            is_default: true,
        }
    }
}

/// Real time, but counts how often the video loop asked to sleep.
#[derive(Default)]
struct CountingClock {
    sleeps: AtomicU64,
}

impl Clock for CountingClock {
    fn now(&self) -> Instant {
        Instant::now()
    }

    fn sleep(&self, duration: Duration) {
        self.sleeps.fetch_add(1, Ordering::SeqCst);
        thread::sleep(duration);
    }
}

#[derive(Default)]
struct EventLog {
    states: Mutex<Vec<&'static str>>,
    countdown: Mutex<Vec<u32>>,
    errors: Mutex<Vec<CaptureError>>,
    finished: Mutex<Vec<RecordingResult>>,
    level_updates: AtomicU64,
}

impl CaptureDelegate for EventLog {
    fn on_state_changed(&self, state: &CaptureState) {
        self.states.lock().push(state.name());
    }

    fn on_countdown(&self, remaining_secs: u32) {
        self.countdown.lock().push(remaining_secs);
    }

    fn on_levels_updated(&self, _levels: &AudioLevels, _duration_secs: f64) {
        self.level_updates.fetch_add(1, Ordering::SeqCst);
    }

    fn on_error(&self, error: &CaptureError) {
        self.errors.lock().push(error.clone());
    }

    fn on_capture_finished(&self, result: &RecordingResult) {
        self.finished.lock().push(result.clone());
    }
}

// --- helpers ---

type TestSession = RecordingSession<TestScreen, ToneInput, RawFileEncoder>;

fn settings(dir: &Path) -> RecorderSettings {
    RecorderSettings {
        output_directory: dir.to_path_buf(),
        audio_sample_rate: 8_000,
        fallback_sample_rate: 8_000,
        audio_channels: 2,
        audio_block_secs: 0.1,
        video_resolution: Resolution::new(320, 240),
        frame_rate: 50.0,
        countdown_secs: 0,
        ..Default::default()
    }
}

fn session_with(screen: TestScreen, input: ToneInput) -> (TestSession, Arc<AtomicU64>, Arc<EventLog>) {
    let (encoder, frames, _) = RawFileEncoder::new();
    let mut session = RecordingSession::new(screen, input, encoder).with_countdown_tick(Duration::from_millis(10));
    let events = Arc::new(EventLog::default());
    session.set_delegate(events.clone());
    (session, frames, events)
}

fn wait_until(timeout: Duration, condition: impl Fn() -> bool) -> bool {
    let deadline = Instant::now() + timeout;
    while Instant::now() < deadline {
        if condition() {
            return true;
        }
        thread::sleep(Duration::from_millis(10));
    }
    condition()
}

// --- tests ---

#[test]
fn record_pause_resume_stop() {
    let dir = tempfile::tempdir().unwrap();
    let (mut session, frames, events) = session_with(TestScreen::new(), ToneInput::new(8_000));
    session.configure(settings(dir.path())).unwrap();

    session.start_capture().unwrap();
    assert!(session.state().is_recording());
    thread::sleep(Duration::from_millis(300));

    session.pause_capture().unwrap();
    let frames_at_pause = frames.load(Ordering::SeqCst);
    thread::sleep(Duration::from_millis(300));
    // At most one frame already in flight when the pause landed.
    assert!(frames.load(Ordering::SeqCst) <= frames_at_pause + 1);

    session.resume_capture().unwrap();
    thread::sleep(Duration::from_millis(300));
    let result = session.stop_capture().unwrap();

    assert!(session.state().is_idle());
    assert!(
        result.duration_secs > 0.4 && result.duration_secs < 0.9,
        "duration {} should exclude the pause",
        result.duration_secs
    );

    let video = result.video.as_ref().unwrap();
    assert_eq!(video.file_path, dir.path().join("Recording.avi"));
    // 9x7 screenshots are even-cropped to 8x6 before encoding.
    let frame_count = frames.load(Ordering::SeqCst);
    assert!(frame_count > 5);
    assert_eq!(video.size_bytes, frame_count * 8 * 6 * 3);

    let audio = result.audio.as_ref().unwrap();
    assert_eq!(audio.file_path, dir.path().join("Recording.wav"));
    let wav = fs::read(&audio.file_path).unwrap();
    let (spec, data_size) = wav_format::parse_header(&wav).unwrap();
    assert_eq!(spec.sample_rate, 8_000);
    assert_eq!(spec.channels, 2);
    assert_eq!(data_size as usize, wav.len() - 44);
    assert!(data_size > 0);

    let metadata = read_metadata(&video.file_path).unwrap();
    assert_eq!(metadata, result.metadata);
    assert_eq!(metadata.tracks.len(), 2);
    match &metadata.tracks[0] {
        TrackInfo::Video {
            width,
            height,
            frame_count: written,
            source,
            ..
        } => {
            assert_eq!((*width, *height), (320, 240));
            assert_eq!(*written, frame_count);
            assert_eq!(source, "test screen");
        }
        other => panic!("expected video track, got {:?}", other),
    }
    match &metadata.tracks[1] {
        TrackInfo::Audio { source, sample_rate, .. } => {
            assert_eq!(source, "Tone");
            assert_eq!(*sample_rate, 8_000);
        }
        other => panic!("expected audio track, got {:?}", other),
    }

    let diagnostics = session.diagnostics();
    assert!(diagnostics.audio_frames_discarded > 0, "paused audio should be discarded");
    assert!(diagnostics.audio_frames_received > 0);

    assert_eq!(
        *events.states.lock(),
        vec!["recording", "paused", "recording", "stopping", "completed", "idle"]
    );
    assert_eq!(events.finished.lock().len(), 1);
    assert!(events.errors.lock().is_empty());
    assert!(events.level_updates.load(Ordering::SeqCst) > 0);
}

#[test]
fn countdown_runs_before_recording() {
    let dir = tempfile::tempdir().unwrap();
    let (mut session, _, events) = session_with(TestScreen::new(), ToneInput::new(8_000));
    session
        .configure(RecorderSettings {
            countdown_secs: 3,
            ..settings(dir.path())
        })
        .unwrap();

    session.start_capture().unwrap();
    assert_eq!(*events.countdown.lock(), vec![3, 2, 1]);
    assert_eq!(
        events.states.lock()[..4],
        ["counting_down", "counting_down", "counting_down", "recording"]
    );
    session.stop_capture().unwrap();
}

#[test]
fn cancelled_countdown_creates_no_files() {
    let dir = tempfile::tempdir().unwrap();
    let out = dir.path().join("out");
    let (encoder, _, _) = RawFileEncoder::new();
    let mut session = RecordingSession::new(TestScreen::new(), ToneInput::new(8_000), encoder)
        .with_countdown_tick(Duration::from_secs(5));
    session
        .configure(RecorderSettings {
            countdown_secs: 3,
            ..settings(&out)
        })
        .unwrap();

    let control = session.control();
    let canceller = thread::spawn(move || {
        thread::sleep(Duration::from_millis(50));
        control.request_stop();
    });

    assert_eq!(session.start_capture(), Err(CaptureError::Cancelled));
    canceller.join().unwrap();
    assert!(session.state().is_idle());
    assert!(!out.exists());
}

#[test]
fn audio_only_recording() {
    let dir = tempfile::tempdir().unwrap();
    let (mut session, frames, _) = session_with(TestScreen::new(), ToneInput::new(16_000));
    session
        .configure(RecorderSettings {
            enable_video: false,
            ..settings(dir.path())
        })
        .unwrap();

    session.start_capture().unwrap();
    thread::sleep(Duration::from_millis(250));
    let result = session.stop_capture().unwrap();

    assert!(result.video.is_none());
    assert_eq!(frames.load(Ordering::SeqCst), 0);
    assert!(!dir.path().join("Recording.avi").exists());
    let audio = result.audio.unwrap();
    assert_eq!(result.metadata.tracks.len(), 1);
    assert!(read_metadata(&audio.file_path).is_ok());
}

#[test]
fn video_only_when_audio_input_is_missing() {
    let dir = tempfile::tempdir().unwrap();
    let mut input = ToneInput::new(8_000);
    input.available = false;
    let (mut session, _, _) = session_with(TestScreen::new(), input);
    session.configure(settings(dir.path())).unwrap();

    session.start_capture().unwrap();
    thread::sleep(Duration::from_millis(150));
    let result = session.stop_capture().unwrap();

    assert!(result.video.is_some());
    assert!(result.audio.is_none());
    assert!(!dir.path().join("Recording.wav").exists());
}

#[test]
fn no_devices_is_an_error() {
    let dir = tempfile::tempdir().unwrap();
    let mut screen = TestScreen::new();
    screen.available = false;
    let mut input = ToneInput::new(8_000);
    input.available = false;
    let (mut session, _, _) = session_with(screen, input);
    session.configure(settings(dir.path())).unwrap();

    assert_eq!(session.start_capture(), Err(CaptureError::DeviceNotAvailable));
    assert!(session.state().is_idle());
}

#[test]
fn audio_start_failure_rolls_back() {
    let dir = tempfile::tempdir().unwrap();
    let mut input = ToneInput::new(8_000);
    input.fail_start = true;
    let (mut session, _, events) = session_with(TestScreen::new(), input);
    session.configure(settings(dir.path())).unwrap();

    assert_eq!(session.start_capture(), Err(CaptureError::PermissionDenied));
    assert!(session.state().is_idle());
    assert!(!dir.path().join("Recording.wav").exists());
    assert_eq!(events.states.lock().last(), Some(&"idle"));
}

#[test]
fn grab_failure_requests_stop_and_keeps_partial_output() {
    let dir = tempfile::tempdir().unwrap();
    let mut screen = TestScreen::new();
    screen.fail_after = Some(3);
    let (mut session, frames, events) = session_with(screen, ToneInput::new(8_000));
    session.configure(settings(dir.path())).unwrap();

    session.start_capture().unwrap();
    assert!(wait_until(Duration::from_secs(5), || session.stop_requested()));

    let result = session.stop_capture().unwrap();
    assert_eq!(frames.load(Ordering::SeqCst), 3);
    assert!(result.video.is_some());
    assert!(result.audio.is_some());
    assert!(matches!(events.errors.lock()[0], CaptureError::CaptureFailed(_)));
}

#[test]
fn total_failure_passes_through_failed_state() {
    let dir = tempfile::tempdir().unwrap();
    let mut screen = TestScreen::new();
    screen.fail_after = Some(0);
    let (mut session, _, events) = session_with(screen, ToneInput::new(8_000));
    session
        .configure(RecorderSettings {
            enable_audio: false,
            ..settings(dir.path())
        })
        .unwrap();

    session.start_capture().unwrap();
    assert!(wait_until(Duration::from_secs(5), || session.stop_requested()));

    let err = session.stop_capture().unwrap_err();
    assert!(matches!(err, CaptureError::CaptureFailed(_)));
    assert!(session.state().is_idle());
    let states = events.states.lock();
    assert_eq!(states[states.len() - 2..], ["failed", "idle"]);
    assert!(events.finished.lock().is_empty());
}

#[test]
fn maximum_duration_requests_stop() {
    let dir = tempfile::tempdir().unwrap();
    let (mut session, _, _) = session_with(TestScreen::new(), ToneInput::new(8_000));
    session
        .configure(RecorderSettings {
            max_duration_secs: Some(0.3),
            ..settings(dir.path())
        })
        .unwrap();

    session.start_capture().unwrap();
    assert!(wait_until(Duration::from_secs(5), || session.stop_requested()));
    let result = session.stop_capture().unwrap();
    assert!(result.duration_secs >= 0.3);
    assert!(result.duration_secs < 2.0);
}

#[test]
fn auto_stop_keeps_every_accepted_audio_frame() {
    let dir = tempfile::tempdir().unwrap();
    let (mut session, _, _) = session_with(TestScreen::new(), ToneInput::new(8_000));
    session
        .configure(RecorderSettings {
            max_duration_secs: Some(0.5),
            ..settings(dir.path())
        })
        .unwrap();

    session.start_capture().unwrap();
    assert!(wait_until(Duration::from_secs(5), || session.stop_requested()));
    // The caller notices the request some time later; input keeps arriving.
    thread::sleep(Duration::from_millis(600));
    let result = session.stop_capture().unwrap();

    let wav = fs::read(&result.audio.as_ref().unwrap().file_path).unwrap();
    let (_, data_size) = wav_format::parse_header(&wav).unwrap();
    let wav_frames = data_size as u64 / 4;
    let diagnostics = session.diagnostics();
    assert_eq!(diagnostics.audio_frames_received, wav_frames);
    assert!(diagnostics.audio_frames_discarded > 0);

    assert!(
        result.duration_secs >= 0.5 && result.duration_secs < 0.9,
        "duration {} should stop counting at the request",
        result.duration_secs
    );
}

#[test]
fn injected_clock_paces_video() {
    let dir = tempfile::tempdir().unwrap();
    let clock = Arc::new(CountingClock::default());
    let (encoder, frames, _) = RawFileEncoder::new();
    let mut session =
        RecordingSession::new(TestScreen::new(), ToneInput::new(8_000), encoder).with_clock(clock.clone());
    session
        .configure(RecorderSettings {
            enable_audio: false,
            ..settings(dir.path())
        })
        .unwrap();

    session.start_capture().unwrap();
    thread::sleep(Duration::from_millis(200));
    session.stop_capture().unwrap();

    assert!(clock.sleeps.load(Ordering::SeqCst) > 0);
    assert!(frames.load(Ordering::SeqCst) > 0);
}

#[test]
fn invalid_transitions_are_rejected() {
    let dir = tempfile::tempdir().unwrap();
    let (mut session, _, _) = session_with(TestScreen::new(), ToneInput::new(8_000));

    assert!(matches!(session.start_capture(), Err(CaptureError::ConfigurationFailed(_))));
    assert!(matches!(session.stop_capture(), Err(CaptureError::InvalidState(_))));
    assert!(matches!(session.pause_capture(), Err(CaptureError::InvalidState(_))));
    assert!(matches!(session.toggle_pause(), Err(CaptureError::InvalidState(_))));
    assert!(matches!(
        session.configure(RecorderSettings {
            frame_rate: 0.0,
            ..settings(dir.path())
        }),
        Err(CaptureError::ConfigurationFailed(_))
    ));

    session.configure(settings(dir.path())).unwrap();
    session.start_capture().unwrap();
    assert!(matches!(session.start_capture(), Err(CaptureError::InvalidState(_))));
    assert!(matches!(
        session.configure(settings(dir.path())),
        Err(CaptureError::InvalidState(_))
    ));
    assert!(matches!(session.resume_capture(), Err(CaptureError::InvalidState(_))));

    assert!(session.toggle_pause().unwrap());
    assert!(session.state().is_paused());
    assert!(!session.toggle_pause().unwrap());
    assert!(session.state().is_recording());

    session.stop_capture().unwrap();
}

#[test]
fn session_can_record_again() {
    let dir = tempfile::tempdir().unwrap();
    let (mut session, frames, _) = session_with(TestScreen::new(), ToneInput::new(8_000));
    session
        .configure(RecorderSettings {
            file_naming: FileNaming::Timestamped,
            base_name: "take".into(),
            ..settings(dir.path())
        })
        .unwrap();

    session.start_capture().unwrap();
    thread::sleep(Duration::from_millis(100));
    let first = session.stop_capture().unwrap();
    let after_first = frames.load(Ordering::SeqCst);

    session.start_capture().unwrap();
    thread::sleep(Duration::from_millis(100));
    let second = session.stop_capture().unwrap();

    assert!(frames.load(Ordering::SeqCst) > after_first);
    assert_ne!(first.metadata.id, second.metadata.id);
    let name = second.video.unwrap().file_path.file_name().unwrap().to_string_lossy().into_owned();
    assert!(name.starts_with("take_") && name.ends_with(".avi"), "unexpected name {}", name);
}

#[test]
fn usable_through_trait_object() {
    let dir = tempfile::tempdir().unwrap();
    let (session, _, _) = session_with(TestScreen::new(), ToneInput::new(8_000));
    let mut session: Box<dyn CaptureSession> = Box::new(session);

    session.configure(settings(dir.path())).unwrap();
    session.start_capture().unwrap();
    thread::sleep(Duration::from_millis(100));
    session.pause_capture().unwrap();
    session.resume_capture().unwrap();
    let result = session.stop_capture().unwrap();
    assert!(result.primary_path().is_some());
    assert!(session.state().is_idle());
}
