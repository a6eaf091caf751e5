pub const GUIDE: &str = "\
screen-recorder: record your screen and microphone

Recording
  Press r (record) in the control panel. After a short countdown the screen
  is captured to Recording.avi and the microphone to Recording.wav in the
  output directory. Press s during the countdown to cancel.

Stopping
  Press s (stop) or Ctrl-C. Both files are finalized and a summary is
  printed, along with a .json sidecar describing the recording.

Pausing
  Press p (pause) to pause video and audio together. Press p again (resume)
  to continue in the same files. Paused time is not counted.

Settings
  Press c (settings) while idle, or run `screen-recorder settings`, to change
  the output directory, audio sampling rate, video resolution, frame rate and
  countdown. Changes apply after you confirm saving them.
  `screen-recorder settings --show` prints the saved settings.

Unattended recording
  `screen-recorder record --duration 60` records for one minute and exits.
  Ctrl-C ends the recording early and keeps what was captured.
  Any setting can be overridden for a single run, see `record --help`.

Devices
  `screen-recorder devices` lists displays and audio inputs. Pass --display
  or --audio-device to record from a specific one.

Requirements
  Video is encoded by ffmpeg, which must be on PATH or named by the
  FFMPEG_PATH environment variable. Set RUST_LOG=debug for detailed logs.
";

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn guide_covers_every_button() {
        for key in ["r (record)", "s (stop)", "p (pause)", "c (settings)"] {
            assert!(GUIDE.contains(key), "guide is missing {}", key);
        }
    }
}
