//! Terminal control widget: record, stop, pause/resume and settings buttons
//! driven by single-letter commands on stdin.

use std::io::{self, BufRead};
use std::sync::mpsc::{self, Receiver, RecvTimeoutError, Sender};
use std::sync::Arc;
use std::thread;
use std::time::Duration;

use anyhow::Context;

use screen_recorder_core::{CaptureError, CaptureState, RecorderSettings, SettingsStore};

use crate::interrupt::Interrupt;
use crate::recorder::{self, DesktopSession};
use crate::settings_dialog;
use crate::terminal_delegate::{self, TerminalDelegate};

pub const STOPPED_MESSAGE: &str = "Recording Stopped";
pub const PAUSED_MESSAGE: &str = "Recording Paused";
pub const RESUMED_MESSAGE: &str = "Recording Resumed";

const POLL_INTERVAL: Duration = Duration::from_millis(200);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    Record,
    Stop,
    Pause,
    Settings,
    Help,
    Quit,
}

impl Action {
    pub fn parse(input: &str) -> Option<Self> {
        match input.trim().to_lowercase().as_str() {
            "r" | "record" => Some(Self::Record),
            "s" | "stop" => Some(Self::Stop),
            "p" | "pause" | "resume" => Some(Self::Pause),
            "c" | "settings" => Some(Self::Settings),
            "h" | "help" | "?" => Some(Self::Help),
            "q" | "quit" | "exit" => Some(Self::Quit),
            _ => None,
        }
    }
}

/// Which buttons accept a press in a given state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ButtonStates {
    pub record: bool,
    pub stop: bool,
    pub pause: bool,
    pub settings: bool,
}

impl ButtonStates {
    pub fn for_state(state: &CaptureState) -> Self {
        let active = state.is_active();
        let idle = state.is_idle() || state.is_terminal();
        Self {
            record: idle,
            stop: active || state.is_counting_down(),
            pause: active,
            settings: idle,
        }
    }

    pub fn allows(&self, action: Action) -> bool {
        match action {
            Action::Record => self.record,
            Action::Stop => self.stop,
            Action::Pause => self.pause,
            Action::Settings => self.settings,
            Action::Help | Action::Quit => true,
        }
    }
}

/// The pause button turns into a resume button while paused.
pub fn pause_label(state: &CaptureState) -> &'static str {
    if state.is_paused() {
        "resume"
    } else {
        "pause"
    }
}

/// Button row, disabled buttons in brackets.
pub fn render_buttons(state: &CaptureState) -> String {
    let buttons = ButtonStates::for_state(state);
    let button = |key: &str, label: &str, enabled: bool| {
        if enabled {
            format!("{}) {}", key, label)
        } else {
            format!("[{}) {}]", key, label)
        }
    };
    [
        button("r", "record", buttons.record),
        button("s", "stop", buttons.stop),
        button("p", pause_label(state), buttons.pause),
        button("c", "settings", buttons.settings),
        "h) help".to_string(),
        "q) quit".to_string(),
    ]
    .join("  ")
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Flow {
    Continue,
    Quit,
}

/// Message shown after the settings dialog closes. Errors are reported and
/// the panel keeps running.
pub fn settings_outcome(outcome: &anyhow::Result<bool>) -> String {
    match outcome {
        Ok(true) => "Settings saved".into(),
        Ok(false) => "Settings unchanged".into(),
        Err(e) => format!("Settings not saved: {:#}", e),
    }
}

pub struct ControlPanel {
    store: SettingsStore,
    settings: RecorderSettings,
    session: DesktopSession,
    delegate: Arc<TerminalDelegate>,
    interrupt: Interrupt,
}

impl ControlPanel {
    pub fn new(store: SettingsStore, settings: RecorderSettings, interrupt: Interrupt) -> anyhow::Result<Self> {
        let delegate = Arc::new(TerminalDelegate::new());
        let session = recorder::build_session(&settings, delegate.clone())?;
        interrupt.watch(session.control());
        Ok(Self {
            store,
            settings,
            session,
            delegate,
            interrupt,
        })
    }

    /// Read commands until quit, Ctrl-C or end of input. An active recording
    /// is stopped before returning.
    pub fn run(&mut self) -> anyhow::Result<()> {
        let mut input = LineReader::spawn()?;
        self.show_buttons();

        loop {
            match input.poll(POLL_INTERVAL) {
                Input::Line(line) => {
                    if line.trim().is_empty() {
                        continue;
                    }
                    let Some(action) = Action::parse(&line) else {
                        self.delegate.println(&format!("Unknown command '{}', h for help", line.trim()));
                        continue;
                    };
                    if self.handle(action, &mut input) == Flow::Quit {
                        break;
                    }
                }
                Input::Pending => {}
                Input::Closed => break,
            }

            if self.session.stop_requested() {
                self.stop();
            }
            if self.interrupt.is_set() {
                break;
            }
        }

        if self.session.state().is_active() {
            self.stop();
        }
        Ok(())
    }

    fn handle(&mut self, action: Action, input: &mut LineReader) -> Flow {
        let state = self.session.state();
        if !ButtonStates::for_state(&state).allows(action) {
            self.delegate
                .println(&format!("'{:?}' is not available while {}", action, state.name()));
            return Flow::Continue;
        }

        match action {
            Action::Record => return self.record(input),
            Action::Stop => self.stop(),
            Action::Pause => self.toggle_pause(),
            Action::Settings => self.edit_settings(),
            Action::Help => self.show_buttons(),
            Action::Quit => return Flow::Quit,
        }
        Flow::Continue
    }

    /// Start recording. The countdown runs on a scoped thread so stop, quit
    /// and Ctrl-C can cancel it.
    fn record(&mut self, input: &mut LineReader) -> Flow {
        if let Err(e) = recorder::check_permissions(&self.settings) {
            self.delegate.println(&format!("Could not start recording: {}", e));
            return Flow::Continue;
        }

        let control = self.session.control();
        let session = &mut self.session;
        let delegate = &self.delegate;
        let mut flow = Flow::Continue;

        let started = thread::scope(|scope| {
            let starter = scope.spawn(move || session.start_capture());
            while !starter.is_finished() {
                let cancel = match input.poll(POLL_INTERVAL) {
                    Input::Line(line) => match Action::parse(&line) {
                        Some(Action::Stop) => true,
                        Some(Action::Quit) => {
                            flow = Flow::Quit;
                            true
                        }
                        _ => {
                            if !line.trim().is_empty() {
                                delegate.println("Countdown running, s to cancel");
                            }
                            false
                        }
                    },
                    Input::Pending => false,
                    Input::Closed => {
                        flow = Flow::Quit;
                        true
                    }
                };
                if cancel {
                    control.request_stop();
                    break;
                }
            }
            starter
                .join()
                .unwrap_or_else(|_| Err(CaptureError::Unknown("start thread panicked".into())))
        });

        match started {
            Ok(()) if flow == Flow::Quit => {}
            Ok(()) => self.show_buttons(),
            Err(CaptureError::Cancelled) => {
                self.delegate.println("Recording cancelled");
                if flow == Flow::Continue {
                    self.show_buttons();
                }
            }
            Err(e) => self.delegate.println(&format!("Could not start recording: {}", e)),
        }
        flow
    }

    fn stop(&mut self) {
        match self.session.stop_capture() {
            Ok(result) => {
                log::debug!("Recording finished: {}", terminal_delegate::summary(&result));
                self.delegate.println(STOPPED_MESSAGE);
            }
            Err(e) => self.delegate.println(&format!("Recording failed: {}", e)),
        }
        self.show_buttons();
    }

    fn toggle_pause(&mut self) {
        match self.session.toggle_pause() {
            Ok(true) => self.delegate.println(PAUSED_MESSAGE),
            Ok(false) => self.delegate.println(RESUMED_MESSAGE),
            Err(e) => self.delegate.println(&format!("Error: {}", e)),
        }
        self.show_buttons();
    }

    fn edit_settings(&mut self) {
        let outcome = settings_dialog::edit(&self.settings).and_then(|updated| match updated {
            Some(updated) => self.apply_settings(updated).map(|()| true),
            None => Ok(false),
        });
        if let Err(e) = &outcome {
            log::warn!("Settings dialog failed: {:#}", e);
        }
        self.delegate.println(&settings_outcome(&outcome));
    }

    /// Rebuild the session for `updated`, then persist it. Nothing changes
    /// if either step fails.
    fn apply_settings(&mut self, updated: RecorderSettings) -> anyhow::Result<()> {
        let session = recorder::build_session(&updated, self.delegate.clone())?;
        self.store
            .save(&updated)
            .with_context(|| format!("failed to save settings to {}", self.store.path().display()))?;
        self.interrupt.watch(session.control());
        self.session = session;
        self.settings = updated;
        Ok(())
    }

    fn show_buttons(&self) {
        self.delegate.println(&render_buttons(&self.session.state()));
    }
}

enum Input {
    Line(String),
    Pending,
    Closed,
}

/// Reads stdin one line at a time, only when asked, so a settings dialog can
/// own the terminal between commands.
struct LineReader {
    requests: Sender<()>,
    lines: Receiver<Option<String>>,
    waiting: bool,
}

impl LineReader {
    fn spawn() -> anyhow::Result<Self> {
        let (request_tx, request_rx) = mpsc::channel::<()>();
        let (line_tx, line_rx) = mpsc::channel();

        thread::Builder::new()
            .name("stdin-reader".into())
            .spawn(move || {
                let stdin = io::stdin();
                for () in request_rx {
                    let mut line = String::new();
                    let read = stdin.lock().read_line(&mut line);
                    let eof = !matches!(read, Ok(n) if n > 0);
                    if line_tx.send((!eof).then_some(line)).is_err() || eof {
                        break;
                    }
                }
            })
            .context("failed to spawn stdin reader")?;

        Ok(Self {
            requests: request_tx,
            lines: line_rx,
            waiting: false,
        })
    }

    fn poll(&mut self, timeout: Duration) -> Input {
        if !self.waiting {
            if self.requests.send(()).is_err() {
                return Input::Closed;
            }
            self.waiting = true;
        }
        match self.lines.recv_timeout(timeout) {
            Ok(Some(line)) => {
                self.waiting = false;
                Input::Line(line)
            }
            Ok(None) | Err(RecvTimeoutError::Disconnected) => Input::Closed,
            Err(RecvTimeoutError::Timeout) => Input::Pending,
        }
    }
}
