use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

use screen_recorder_core::models::config::{MAX_SAMPLE_RATE, MIN_SAMPLE_RATE};
use screen_recorder_core::Resolution;

#[derive(Debug, Parser)]
#[command(name = "screen-recorder", version, about = "Record the screen and microphone to AVI + WAV")]
pub struct Cli {
    /// Settings file (default: <config dir>/screen-recorder/settings.json)
    #[arg(long, global = true, value_name = "PATH")]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Option<Command>,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Open the control panel, or record unattended with --duration (default)
    Record(RecordArgs),
    /// Edit, show or reset the saved settings
    Settings(SettingsArgs),
    /// List displays and audio input devices
    Devices,
    /// Print the usage guide
    Guide,
}

#[derive(Debug, Default, Clone, Args)]
pub struct RecordArgs {
    /// Directory to write recordings to
    #[arg(short, long, value_name = "DIR")]
    pub output_dir: Option<PathBuf>,

    /// Audio sample rate in Hz
    #[arg(
        long,
        value_name = "HZ",
        value_parser = clap::value_parser!(u32).range(MIN_SAMPLE_RATE as i64..=MAX_SAMPLE_RATE as i64)
    )]
    pub sample_rate: Option<u32>,

    /// Encoded video size, e.g. 1920x1080
    #[arg(short, long, value_name = "WxH")]
    pub resolution: Option<Resolution>,

    /// Video frames per second
    #[arg(long)]
    pub fps: Option<f64>,

    /// Seconds of countdown before recording starts
    #[arg(long, value_name = "SECS")]
    pub countdown: Option<u32>,

    /// Record audio only
    #[arg(long, conflicts_with = "no_audio")]
    pub no_video: bool,

    /// Record video only
    #[arg(long)]
    pub no_audio: bool,

    /// Record unattended for this many seconds, then exit
    #[arg(short, long, value_name = "SECS")]
    pub duration: Option<f64>,

    /// Display id to capture (see `devices`)
    #[arg(long, value_name = "ID")]
    pub display: Option<u32>,

    /// Audio input device name (see `devices`)
    #[arg(long, value_name = "NAME")]
    pub audio_device: Option<String>,

    /// Add a timestamp to file names instead of overwriting Recording.avi
    #[arg(long)]
    pub timestamped: bool,
}

#[derive(Debug, Args)]
pub struct SettingsArgs {
    /// Print the current settings as JSON
    #[arg(long, conflicts_with = "reset")]
    pub show: bool,

    /// Restore and save the defaults
    #[arg(long)]
    pub reset: bool,
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn record_is_optional() {
        let cli = Cli::try_parse_from(["screen-recorder"]).unwrap();
        assert!(cli.command.is_none());
    }

    #[test]
    fn record_flags_parse() {
        let cli = Cli::try_parse_from([
            "screen-recorder",
            "record",
            "--resolution",
            "1280x720",
            "--duration",
            "5",
            "--no-audio",
        ])
        .unwrap();
        let Some(Command::Record(args)) = cli.command else {
            panic!("expected record");
        };
        assert_eq!(args.resolution, Some(Resolution::new(1280, 720)));
        assert_eq!(args.duration, Some(5.0));
        assert!(args.no_audio);
    }

    #[test]
    fn conflicting_flags_rejected() {
        assert!(Cli::try_parse_from(["screen-recorder", "record", "--no-video", "--no-audio"]).is_err());
        assert!(Cli::try_parse_from(["screen-recorder", "settings", "--show", "--reset"]).is_err());
    }

    #[test]
    fn sample_rate_bounded() {
        assert!(Cli::try_parse_from(["screen-recorder", "record", "--sample-rate", "4000000000"]).is_err());
        assert!(Cli::try_parse_from(["screen-recorder", "record", "--sample-rate", "100"]).is_err());
        let cli = Cli::try_parse_from(["screen-recorder", "record", "--sample-rate", "48000"]).unwrap();
        let Some(Command::Record(args)) = cli.command else {
            panic!("expected record");
        };
        assert_eq!(args.sample_rate, Some(48_000));
    }

    #[test]
    fn bad_resolution_rejected() {
        assert!(Cli::try_parse_from(["screen-recorder", "record", "-r", "wide"]).is_err());
    }
}
