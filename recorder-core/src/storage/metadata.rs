use std::fs;
use std::path::{Path, PathBuf};

use crate::models::error::CaptureError;
use crate::models::recording_result::RecordingMetadata;

/// Sidecar path for a recording: `Recording.avi` → `Recording.avi.metadata.json`.
pub fn metadata_path(recording_path: &Path) -> PathBuf {
    let mut name = recording_path.as_os_str().to_owned();
    name.push(".metadata.json");
    PathBuf::from(name)
}

/// Write recording metadata as a JSON sidecar file next to the recording.
pub fn write_metadata(metadata: &RecordingMetadata, recording_path: &Path) -> Result<PathBuf, CaptureError> {
    let path = metadata_path(recording_path);
    let json = serde_json::to_string_pretty(metadata)
        .map_err(|e| CaptureError::storage("failed to serialize metadata", e))?;
    fs::write(&path, json).map_err(|e| CaptureError::storage("failed to write metadata", e))?;
    Ok(path)
}

/// Read recording metadata from a JSON sidecar file.
pub fn read_metadata(recording_path: &Path) -> Result<RecordingMetadata, CaptureError> {
    let json = fs::read_to_string(metadata_path(recording_path))
        .map_err(|e| CaptureError::storage("failed to read metadata", e))?;
    serde_json::from_str(&json).map_err(|e| CaptureError::storage("failed to parse metadata", e))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::recording_result::TrackInfo;

    #[test]
    fn sidecar_keeps_original_extension() {
        assert_eq!(
            metadata_path(Path::new("/tmp/Recording.avi")),
            PathBuf::from("/tmp/Recording.avi.metadata.json")
        );
    }

    #[test]
    fn write_then_read() {
        let dir = tempfile::tempdir().unwrap();
        let recording = dir.path().join("Recording.avi");
        let metadata = RecordingMetadata::new(
            12.5,
            vec![TrackInfo::Video {
                file_path: recording.to_string_lossy().into_owned(),
                width: 1920,
                height: 1080,
                frame_rate: 20.0,
                frame_count: 250,
                source: "Display 1".into(),
                checksum: "00".into(),
            }],
        );

        let written = write_metadata(&metadata, &recording).unwrap();
        assert!(written.exists());
        assert_eq!(read_metadata(&recording).unwrap(), metadata);
    }

    #[test]
    fn missing_sidecar_is_error() {
        let dir = tempfile::tempdir().unwrap();
        assert!(read_metadata(&dir.path().join("nothing.wav")).is_err());
    }
}
