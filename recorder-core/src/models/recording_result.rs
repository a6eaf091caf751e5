use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

/// One finalized output file.
#[derive(Debug, Clone, PartialEq)]
pub struct MediaOutput {
    pub file_path: PathBuf,
    pub size_bytes: u64,
    pub checksum: String,
}

/// Result returned when a recording session completes.
#[derive(Debug, Clone, PartialEq)]
pub struct RecordingResult {
    pub video: Option<MediaOutput>,
    pub audio: Option<MediaOutput>,
    /// Active recording time, pauses excluded.
    pub duration_secs: f64,
    pub metadata: RecordingMetadata,
}

impl RecordingResult {
    /// The file the metadata sidecar is written next to: video if present, else audio.
    pub fn primary_path(&self) -> Option<&Path> {
        self.video
            .as_ref()
            .or(self.audio.as_ref())
            .map(|output| output.file_path.as_path())
    }
}

/// Description of one track in a recording.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum TrackInfo {
    Video {
        file_path: String,
        width: u32,
        height: u32,
        frame_rate: f64,
        frame_count: u64,
        /// Name of the captured display.
        #[serde(default)]
        source: String,
        checksum: String,
    },
    Audio {
        file_path: String,
        sample_rate: u32,
        channels: u16,
        bit_depth: u16,
        sample_frames: u64,
        /// Name of the input device.
        #[serde(default)]
        source: String,
        checksum: String,
    },
}

/// Metadata stored alongside a recording as a JSON sidecar.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecordingMetadata {
    pub id: String,
    pub created_at: String,
    pub duration_secs: f64,
    pub tracks: Vec<TrackInfo>,
}

impl RecordingMetadata {
    pub fn new(duration_secs: f64, tracks: Vec<TrackInfo>) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            created_at: chrono::Utc::now().to_rfc3339(),
            duration_secs,
            tracks,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tracks_serialize_with_type_tag() {
        let metadata = RecordingMetadata::new(
            1.5,
            vec![TrackInfo::Audio {
                file_path: "Recording.wav".into(),
                sample_rate: 44_100,
                channels: 2,
                bit_depth: 16,
                sample_frames: 66_150,
                source: "Built-in Microphone".into(),
                checksum: "abc".into(),
            }],
        );
        let json = serde_json::to_value(&metadata).unwrap();
        assert_eq!(json["tracks"][0]["type"], "audio");
        assert_eq!(json["tracks"][0]["sample_rate"], 44_100);
        assert_eq!(json["tracks"][0]["source"], "Built-in Microphone");
        assert!(!metadata.id.is_empty());
    }

    #[test]
    fn primary_path_prefers_video() {
        let audio = MediaOutput {
            file_path: PathBuf::from("a.wav"),
            size_bytes: 44,
            checksum: String::new(),
        };
        let mut result = RecordingResult {
            video: None,
            audio: Some(audio),
            duration_secs: 0.0,
            metadata: RecordingMetadata::new(0.0, Vec::new()),
        };
        assert_eq!(result.primary_path(), Some(Path::new("a.wav")));

        result.video = Some(MediaOutput {
            file_path: PathBuf::from("v.avi"),
            size_bytes: 10,
            checksum: String::new(),
        });
        assert_eq!(result.primary_path(), Some(Path::new("v.avi")));
    }
}
