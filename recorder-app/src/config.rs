use std::path::PathBuf;

use anyhow::Context;

use screen_recorder_core::{RecorderSettings, SettingsStore};

use crate::cli::RecordArgs;

const APP_DIR: &str = "screen-recorder";
const SETTINGS_FILE: &str = "settings.json";

/// `<config dir>/screen-recorder/settings.json`.
pub fn default_settings_path() -> PathBuf {
    dirs_next::config_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(APP_DIR)
        .join(SETTINGS_FILE)
}

/// Recordings land in the home directory unless configured otherwise.
pub fn default_output_dir() -> PathBuf {
    dirs_next::home_dir().unwrap_or_else(|| PathBuf::from("."))
}

pub fn app_defaults() -> RecorderSettings {
    RecorderSettings {
        output_directory: default_output_dir(),
        ..Default::default()
    }
}

pub fn open_store(path: Option<PathBuf>) -> SettingsStore {
    SettingsStore::new(path.unwrap_or_else(default_settings_path))
}

pub fn load_settings(store: &SettingsStore) -> anyhow::Result<RecorderSettings> {
    store
        .load_or(app_defaults())
        .with_context(|| format!("failed to load settings from {}", store.path().display()))
}

/// Command-line flags win over the settings file.
pub fn apply_overrides(mut settings: RecorderSettings, args: &RecordArgs) -> RecorderSettings {
    if let Some(dir) = &args.output_dir {
        settings.output_directory = dir.clone();
    }
    if let Some(rate) = args.sample_rate {
        settings.audio_sample_rate = rate;
    }
    if let Some(resolution) = args.resolution {
        settings.video_resolution = resolution;
    }
    if let Some(fps) = args.fps {
        settings.frame_rate = fps;
    }
    if let Some(countdown) = args.countdown {
        settings.countdown_secs = countdown;
    }
    if args.no_video {
        settings.enable_video = false;
    }
    if args.no_audio {
        settings.enable_audio = false;
    }
    if let Some(duration) = args.duration {
        settings.max_duration_secs = Some(duration);
    }
    if args.display.is_some() {
        settings.display_id = args.display;
    }
    if args.audio_device.is_some() {
        settings.audio_device = args.audio_device.clone();
    }
    if args.timestamped {
        settings.file_naming = screen_recorder_core::FileNaming::Timestamped;
    }
    settings
}
