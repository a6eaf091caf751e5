use std::path::Path;
use std::time::Duration;

use crate::models::config::RecorderSettings;
use crate::models::error::CaptureError;
use crate::models::media_models::FrameGeometry;
use crate::processing::color;
use crate::processing::frame_pacer::FramePacer;
use crate::session::control::CaptureControl;
use crate::traits::clock::Clock;
use crate::traits::frame_source::FrameSource;
use crate::traits::video_encoder::VideoEncoder;

const PAUSE_POLL: Duration = Duration::from_millis(250);

/// What the video loop did, handed back to the session on join.
#[derive(Debug, Clone, Default)]
pub struct VideoLoopSummary {
    /// Geometry the encoder was opened with; `None` if no frame was ever written.
    pub geometry: Option<FrameGeometry>,
    pub frames_written: u64,
    pub late_frames: u64,
    /// Error from finalizing the container, reported separately from loop errors.
    pub finish_error: Option<CaptureError>,
}

/// Screenshot → BGR24 → encoder, paced at `settings.frame_rate`, until a stop
/// is requested. Loop failures are recorded on `control` and end the loop.
pub fn run_video_loop(
    control: &CaptureControl,
    source: &mut dyn FrameSource,
    encoder: &mut dyn VideoEncoder,
    path: &Path,
    settings: &RecorderSettings,
    clock: &dyn Clock,
) -> VideoLoopSummary {
    let mut pacer = FramePacer::new(settings.frame_rate);
    let mut summary = VideoLoopSummary::default();
    let mut bgr: Vec<u8> = Vec::new();
    let mut mismatch_logged = false;

    log::debug!("Video loop started for {:?}", path);

    while control.should_run() {
        if control.is_paused() {
            if !control.wait_while_paused(PAUSE_POLL) {
                break;
            }
            pacer.reset();
            continue;
        }

        pacer.wait(clock);
        if !control.should_run() {
            break;
        }
        if control.is_paused() {
            continue;
        }

        let frame = match source.capture_frame() {
            Ok(frame) => frame,
            Err(e) => {
                control.record_error(e);
                break;
            }
        };
        control.update_diagnostics(|d| d.frames_captured += 1);

        let geometry = match summary.geometry {
            Some(geometry) => geometry,
            None => {
                let input = color::even_dimensions(frame.width, frame.height);
                if input.width == 0 || input.height == 0 {
                    control.record_error(CaptureError::CaptureFailed(format!(
                        "screenshot too small to encode: {}x{}",
                        frame.width, frame.height
                    )));
                    break;
                }
                let geometry = FrameGeometry {
                    input,
                    output: settings.video_resolution,
                    frame_rate: settings.frame_rate,
                };
                if let Err(e) = encoder.open(path, geometry, settings) {
                    control.record_error(e);
                    break;
                }
                log::info!(
                    "Video encoder opened: {} → {} @ {} fps",
                    geometry.input,
                    geometry.output,
                    geometry.frame_rate
                );
                bgr = vec![0; geometry.bgr_frame_len()];
                summary.geometry = Some(geometry);
                geometry
            }
        };

        if !mismatch_logged && (frame.width != geometry.input.width || frame.height != geometry.input.height) {
            log::warn!(
                "Screenshot size changed to {}x{}, fitting to {}",
                frame.width,
                frame.height,
                geometry.input
            );
            mismatch_logged = true;
        }

        color::rgba_to_bgr24_into(&frame, geometry.input, &mut bgr);

        let write_started = clock.now();
        if let Err(e) = encoder.write_frame(&bgr) {
            control.record_error(e);
            break;
        }
        let slow = clock.now().saturating_duration_since(write_started) > pacer.interval();

        summary.frames_written += 1;
        let late_frames = pacer.late_frames();
        control.update_diagnostics(|d| {
            d.frames_written += 1;
            d.late_frames = late_frames;
            if slow {
                d.slow_writes += 1;
            }
        });
    }

    summary.late_frames = pacer.late_frames();
    if summary.geometry.is_some() {
        if let Err(e) = encoder.finish() {
            log::error!("Failed to finalize video: {}", e);
            summary.finish_error = Some(e);
        }
    }

    log::debug!(
        "Video loop exited: {} frames written, {} late",
        summary.frames_written,
        summary.late_frames
    );
    summary
}
