//! Interactive settings editor.
//!
//! Prompts for the output directory, audio sample rate, video resolution,
//! frame rate and countdown. Nothing is saved until the user confirms.

use std::path::PathBuf;

use dialoguer::theme::ColorfulTheme;
use dialoguer::{Confirm, Input};

use screen_recorder_core::models::config::{RecorderSettings, MAX_FRAME_RATE, MAX_SAMPLE_RATE, MIN_SAMPLE_RATE};
use screen_recorder_core::Resolution;

/// Rates offered as a hint; any rate in the supported range is accepted.
pub const COMMON_SAMPLE_RATES: [u32; 5] = [22_050, 32_000, 44_100, 48_000, 96_000];

/// Edit a copy of `current`. `None` if the user discards the changes.
pub fn edit(current: &RecorderSettings) -> anyhow::Result<Option<RecorderSettings>> {
    let theme = ColorfulTheme::default();
    let mut settings = current.clone();

    let output: String = Input::with_theme(&theme)
        .with_prompt("Output directory")
        .with_initial_text(current.output_directory.display().to_string())
        .validate_with(|input: &String| parse_output_dir(input).map(|_| ()))
        .interact_text()?;
    settings.output_directory = parse_output_dir(&output).map_err(anyhow::Error::msg)?;

    let rates = COMMON_SAMPLE_RATES.map(|r| r.to_string()).join(", ");
    let rate: String = Input::with_theme(&theme)
        .with_prompt(format!("Audio sample rate in Hz ({})", rates))
        .with_initial_text(current.audio_sample_rate.to_string())
        .validate_with(|input: &String| parse_sample_rate(input).map(|_| ()))
        .interact_text()?;
    settings.audio_sample_rate = parse_sample_rate(&rate).map_err(anyhow::Error::msg)?;

    let resolution: String = Input::with_theme(&theme)
        .with_prompt("Video resolution (WIDTHxHEIGHT)")
        .with_initial_text(current.video_resolution.to_string())
        .validate_with(|input: &String| parse_resolution(input).map(|_| ()))
        .interact_text()?;
    settings.video_resolution = parse_resolution(&resolution).map_err(anyhow::Error::msg)?;

    let fps: String = Input::with_theme(&theme)
        .with_prompt("Frames per second")
        .with_initial_text(current.frame_rate.to_string())
        .validate_with(|input: &String| parse_frame_rate(input).map(|_| ()))
        .interact_text()?;
    settings.frame_rate = parse_frame_rate(&fps).map_err(anyhow::Error::msg)?;

    settings.countdown_secs = Input::with_theme(&theme)
        .with_prompt("Countdown seconds")
        .default(current.countdown_secs)
        .interact_text()?;

    if let Err(reason) = settings.validate() {
        anyhow::bail!("settings rejected: {}", reason);
    }
    if settings == *current {
        return Ok(None);
    }

    let save = Confirm::with_theme(&theme)
        .with_prompt("Save these settings?")
        .default(true)
        .interact()?;
    Ok(save.then_some(settings))
}

pub fn parse_output_dir(input: &str) -> Result<PathBuf, String> {
    let trimmed = input.trim();
    if trimmed.is_empty() {
        return Err("output directory must not be empty".into());
    }
    let path = match trimmed.strip_prefix('~') {
        Some(rest) => match dirs_next::home_dir() {
            Some(home) => home.join(rest.trim_start_matches(['/', '\\'])),
            None => PathBuf::from(trimmed),
        },
        None => PathBuf::from(trimmed),
    };
    if path.exists() && !path.is_dir() {
        return Err(format!("{} is not a directory", path.display()));
    }
    Ok(path)
}

pub fn parse_sample_rate(input: &str) -> Result<u32, String> {
    match input.trim().parse::<u32>() {
        Ok(rate) if (MIN_SAMPLE_RATE..=MAX_SAMPLE_RATE).contains(&rate) => Ok(rate),
        Ok(rate) => Err(format!(
            "{} Hz is outside {}..={} Hz",
            rate, MIN_SAMPLE_RATE, MAX_SAMPLE_RATE
        )),
        Err(_) => Err(format!("'{}' is not a sample rate", input.trim())),
    }
}

pub fn parse_resolution(input: &str) -> Result<Resolution, String> {
    let resolution: Resolution = input.parse()?;
    if !resolution.is_even() {
        return Err(format!("{} must have even width and height", resolution));
    }
    Ok(resolution)
}

pub fn parse_frame_rate(input: &str) -> Result<f64, String> {
    match input.trim().parse::<f64>() {
        Ok(fps) if fps > 0.0 && fps <= MAX_FRAME_RATE => Ok(fps),
        _ => Err(format!("frame rate must be between 0 and {}", MAX_FRAME_RATE)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sample_rate_must_be_in_supported_range() {
        assert_eq!(parse_sample_rate(" 48000 "), Ok(48_000));
        assert!(parse_sample_rate("0").is_err());
        assert!(parse_sample_rate("44.1k").is_err());
        assert!(parse_sample_rate("4000000000").is_err());
        assert_eq!(parse_sample_rate("192000"), Ok(192_000));
    }

    #[test]
    fn resolution_must_be_even() {
        assert_eq!(parse_resolution("1280x720"), Ok(Resolution::new(1280, 720)));
        assert!(parse_resolution("1281x720").is_err());
        assert!(parse_resolution("big").is_err());
    }

    #[test]
    fn frame_rate_bounded() {
        assert_eq!(parse_frame_rate("20"), Ok(20.0));
        assert!(parse_frame_rate("0").is_err());
        assert!(parse_frame_rate("1000").is_err());
    }

    #[test]
    fn output_dir_expands_home() {
        if let Some(home) = dirs_next::home_dir() {
            assert_eq!(parse_output_dir("~/Videos"), Ok(home.join("Videos")));
            assert_eq!(parse_output_dir("~"), Ok(home));
        }
    }

    #[test]
    fn output_dir_rejects_files_and_blank() {
        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join("note.txt");
        std::fs::write(&file, b"x").unwrap();

        assert!(parse_output_dir("  ").is_err());
        assert!(parse_output_dir(file.to_str().unwrap()).is_err());
        assert_eq!(parse_output_dir(dir.path().to_str().unwrap()), Ok(dir.path().to_path_buf()));
    }
}
