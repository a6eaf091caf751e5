use std::path::PathBuf;

use chrono::{DateTime, Local};

use crate::models::config::{FileNaming, RecorderSettings, DEFAULT_BASE_NAME};

pub const VIDEO_EXTENSION: &str = "avi";
pub const AUDIO_EXTENSION: &str = "wav";

/// Where one recording's files go.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutputPaths {
    pub video: PathBuf,
    pub audio: PathBuf,
}

impl OutputPaths {
    /// Resolve output paths for a recording started at `started_at`.
    pub fn resolve(settings: &RecorderSettings, started_at: DateTime<Local>) -> Self {
        let mut stem = sanitize_filename(&settings.base_name);
        if stem.is_empty() {
            stem = DEFAULT_BASE_NAME.to_string();
        }
        if settings.file_naming == FileNaming::Timestamped {
            stem = format!("{}_{}", stem, started_at.format("%Y%m%d_%H%M%S"));
        }

        let dir = &settings.output_directory;
        Self {
            video: dir.join(format!("{}.{}", stem, VIDEO_EXTENSION)),
            audio: dir.join(format!("{}.{}", stem, AUDIO_EXTENSION)),
        }
    }
}

/// Replace characters that are unsafe in file names on common platforms.
pub fn sanitize_filename(name: &str) -> String {
    name.trim()
        .chars()
        .map(|c| match c {
            '/' | '\\' | ':' | '*' | '?' | '"' | '<' | '>' | '|' => '_',
            c if c.is_control() => '_',
            c => c,
        })
        .collect::<String>()
        .trim_matches('.')
        .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn at() -> DateTime<Local> {
        Local.with_ymd_and_hms(2024, 1, 31, 15, 45, 1).unwrap()
    }

    #[test]
    fn fixed_names() {
        let settings = RecorderSettings {
            output_directory: PathBuf::from("/out"),
            ..Default::default()
        };
        let paths = OutputPaths::resolve(&settings, at());
        assert_eq!(paths.video, PathBuf::from("/out/Recording.avi"));
        assert_eq!(paths.audio, PathBuf::from("/out/Recording.wav"));
    }

    #[test]
    fn timestamped_names() {
        let settings = RecorderSettings {
            output_directory: PathBuf::from("/out"),
            file_naming: FileNaming::Timestamped,
            base_name: "demo".into(),
            ..Default::default()
        };
        let paths = OutputPaths::resolve(&settings, at());
        assert_eq!(paths.video, PathBuf::from("/out/demo_20240131_154501.avi"));
        assert_eq!(paths.audio, PathBuf::from("/out/demo_20240131_154501.wav"));
    }

    #[test]
    fn unsafe_base_name_is_sanitized() {
        assert_eq!(sanitize_filename("  my:clip/1?  "), "my_clip_1_");
        assert_eq!(sanitize_filename("..hidden.."), "hidden");

        let settings = RecorderSettings {
            output_directory: PathBuf::from("/out"),
            base_name: "...".into(),
            ..Default::default()
        };
        let paths = OutputPaths::resolve(&settings, at());
        assert_eq!(paths.audio, PathBuf::from("/out/Recording.wav"));
    }
}
