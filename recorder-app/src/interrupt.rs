//! Ctrl-C handling.
//!
//! The handler stops the watched session through its control handle, so a
//! running recording is finalized by the usual `stop_requested` path and a
//! countdown is cancelled.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use anyhow::Context;
use parking_lot::Mutex;

use screen_recorder_core::CaptureControl;

#[derive(Clone, Default)]
pub struct Interrupt {
    received: Arc<AtomicBool>,
    target: Arc<Mutex<Option<Arc<CaptureControl>>>>,
}

impl Interrupt {
    /// Install the process-wide Ctrl-C handler. Call once.
    pub fn install() -> anyhow::Result<Self> {
        let interrupt = Self::default();
        let handler = interrupt.clone();
        ctrlc::set_handler(move || handler.trigger()).context("failed to install Ctrl-C handler")?;
        Ok(interrupt)
    }

    /// Stop this session on the next Ctrl-C, replacing any earlier one.
    pub fn watch(&self, control: Arc<CaptureControl>) {
        *self.target.lock() = Some(control);
    }

    pub fn trigger(&self) {
        self.received.store(true, Ordering::SeqCst);
        if let Some(control) = self.target.lock().as_ref() {
            log::info!("Interrupted, stopping");
            control.request_stop();
        }
    }

    pub fn is_set(&self) -> bool {
        self.received.load(Ordering::SeqCst)
    }
}
