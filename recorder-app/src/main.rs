mod cli;
mod config;
mod control_panel;
mod guide;
mod interrupt;
mod recorder;
mod settings_dialog;
mod terminal_delegate;

use anyhow::Context;
use clap::Parser;

use screen_recorder_core::SettingsStore;
use screen_recorder_desktop::permissions::{self, PermissionStatus};
use screen_recorder_desktop::DeviceEnumerator;

use cli::{Cli, Command, RecordArgs, SettingsArgs};
use control_panel::ControlPanel;
use interrupt::Interrupt;

fn main() -> anyhow::Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();

    let cli = Cli::parse();
    let store = config::open_store(cli.config);

    match cli.command.unwrap_or_else(|| Command::Record(RecordArgs::default())) {
        Command::Record(args) => record(&store, &args),
        Command::Settings(args) => settings(&store, &args),
        Command::Devices => devices(),
        Command::Guide => {
            print!("{}", guide::GUIDE);
            Ok(())
        }
    }
}

fn record(store: &SettingsStore, args: &RecordArgs) -> anyhow::Result<()> {
    let settings = config::apply_overrides(config::load_settings(store)?, args);
    let interrupt = Interrupt::install()?;

    if settings.max_duration_secs.is_some() {
        match recorder::record_unattended(&settings, &interrupt)? {
            Some(result) => log::info!("Recorded {:.1}s", result.duration_secs),
            None => println!("Recording cancelled"),
        }
        return Ok(());
    }

    let mut panel = ControlPanel::new(store.clone(), settings, interrupt)?;
    panel.run()
}

fn settings(store: &SettingsStore, args: &SettingsArgs) -> anyhow::Result<()> {
    if args.reset {
        store.save(&config::app_defaults())?;
        println!("Settings reset: {}", store.path().display());
        return Ok(());
    }

    let current = config::load_settings(store)?;
    if args.show {
        println!("{}", serde_json::to_string_pretty(&current)?);
        return Ok(());
    }

    match settings_dialog::edit(&current)? {
        Some(updated) => {
            store
                .save(&updated)
                .with_context(|| format!("failed to save settings to {}", store.path().display()))?;
            println!("Settings saved: {}", store.path().display());
        }
        None => println!("Settings unchanged"),
    }
    Ok(())
}

fn devices() -> anyhow::Result<()> {
    let enumerator = DeviceEnumerator::new();

    println!("Displays ({}):", describe(permissions::check_screen_capture_permission()));
    for display in enumerator.list_displays().unwrap_or_else(|e| {
        log::warn!("Failed to list displays: {}", e);
        Vec::new()
    }) {
        println!(
            "  {:>3}  {} {}x{}{}",
            display.id,
            display.name,
            display.width,
            display.height,
            if display.is_primary { " (primary)" } else { "" }
        );
    }

    println!("Audio inputs ({}):", describe(permissions::check_microphone_permission(None)));
    for source in enumerator.list_input_devices().unwrap_or_else(|e| {
        log::warn!("Failed to list audio inputs: {}", e);
        Vec::new()
    }) {
        println!("  {}{}", source.name, if source.is_default { " (default)" } else { "" });
    }
    Ok(())
}

fn describe(status: PermissionStatus) -> &'static str {
    match status {
        PermissionStatus::Granted => "access granted",
        PermissionStatus::Denied => "access denied",
        PermissionStatus::NoDevice => "none found",
    }
}
