use std::time::Duration;

use crate::models::error::CaptureError;
use crate::models::state::CaptureState;
use crate::session::control::CaptureControl;

/// Count down `seconds` ticks, one per `tick`, reporting `n..=1` to the
/// delegate. A stop request cancels with `CaptureError::Cancelled`.
pub fn run_countdown(control: &CaptureControl, seconds: u32, tick: Duration) -> Result<(), CaptureError> {
    for remaining in (1..=seconds).rev() {
        control.set_state(CaptureState::CountingDown {
            remaining_secs: remaining,
        });
        control.notify_countdown(remaining);
        log::debug!("Recording starts in {}", remaining);

        if control.wait_for_stop(tick) {
            log::info!("Countdown cancelled with {} seconds left", remaining);
            return Err(CaptureError::Cancelled);
        }
    }
    Ok(())
}
