use super::error::CaptureError;
use super::recording_result::RecordingResult;

/// Recording session state machine.
///
/// State transitions:
/// ```text
/// idle → counting_down → recording ↔ paused
///              ↓             ↓         ↓
///            idle         stopping → completed / failed → idle
/// ```
#[derive(Debug, Clone, PartialEq)]
pub enum CaptureState {
    Idle,
    CountingDown { remaining_secs: u32 },
    Recording { duration_secs: f64 },
    Paused { duration_secs: f64 },
    Stopping,
    Completed(Box<RecordingResult>),
    Failed(CaptureError),
}

impl CaptureState {
    pub fn is_idle(&self) -> bool {
        matches!(self, Self::Idle)
    }

    pub fn is_counting_down(&self) -> bool {
        matches!(self, Self::CountingDown { .. })
    }

    pub fn is_recording(&self) -> bool {
        matches!(self, Self::Recording { .. })
    }

    pub fn is_paused(&self) -> bool {
        matches!(self, Self::Paused { .. })
    }

    /// Recording or paused: capture threads are alive.
    pub fn is_active(&self) -> bool {
        self.is_recording() || self.is_paused()
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Completed(_) | Self::Failed(_))
    }

    /// Short lowercase name, used for status lines and logs.
    pub fn name(&self) -> &'static str {
        match self {
            Self::Idle => "idle",
            Self::CountingDown { .. } => "counting_down",
            Self::Recording { .. } => "recording",
            Self::Paused { .. } => "paused",
            Self::Stopping => "stopping",
            Self::Completed(_) => "completed",
            Self::Failed(_) => "failed",
        }
    }

    /// Returns the current duration if in a state that tracks it.
    pub fn duration(&self) -> Option<f64> {
        match self {
            Self::Recording { duration_secs } | Self::Paused { duration_secs } => Some(*duration_secs),
            Self::Completed(result) => Some(result.duration_secs),
            _ => None,
        }
    }
}
