//! Stemmix Player - multi-track stem mixer
//!
//! Entry point for the GUI application. It:
//! 1. Obtains the mix descriptor (from the metadata service or a file)
//! 2. Starts the audio output thread with the lock-free command queue
//! 3. Launches the iced GUI
//!
//! ## Usage
//!
//! `stemmix-player <mix-id>` fetches the descriptor from the
//! configured service; `stemmix-player <path/to/mix.json>` reads a
//! local descriptor instead (no backend needed).

mod config;
mod keybindings;
mod ui;

use std::path::Path;
use std::sync::Arc;

use anyhow::Context;
use iced::Size;

use stemmix_core::audio::start_output;
use stemmix_core::descriptor::MixDescriptor;
use stemmix_core::engine::{command_channel, CommandSender, PlaybackAtomics};
use stemmix_core::SAMPLE_RATE;

use ui::{Message, MixerApp};

fn main() -> iced::Result {
    // Initialize logger - set RUST_LOG=debug for verbose output
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"))
        .format_timestamp_millis()
        .init();

    log::info!("stemmix-player starting up");

    let config_path = config::default_config_path();
    let config: config::PlayerConfig = config::load_config(&config_path);
    let bindings = keybindings::load_keybindings(&keybindings::default_keybindings_path());

    // The mix to open: a backend id, or a local descriptor file
    let args: Vec<String> = std::env::args().collect();
    let Some(mix_arg) = args.get(1).cloned() else {
        eprintln!("Usage: stemmix-player <mix-id | descriptor.json>");
        return Ok(());
    };

    let descriptor = obtain_descriptor(&config, &mix_arg).map_err(|e| format!("{:#}", e));

    if let Ok(d) = &descriptor {
        log::info!(
            "Loaded mix descriptor: {} - {} ({:?})",
            d.title,
            d.artist,
            d.status
        );
    }

    // Engine plumbing: lock-free command queue in, atomics out
    let (producer, consumer) = command_channel(64);
    let command_sender = CommandSender::new(producer);
    let atomics = Arc::new(PlaybackAtomics::default());

    // Start the audio output thread; fall back to UI-only mode if no
    // device is available
    let (output, sample_rate) = match start_output(consumer, atomics.clone()) {
        Ok((handle, rate)) => (Some(handle), rate),
        Err(e) => {
            eprintln!("Warning: Could not start audio output: {}", e);
            eprintln!("Running in UI-only mode (no audio).");
            (None, SAMPLE_RATE)
        }
    };

    // Wrap resources in cells so the boot closure can be Fn (required
    // by iced; boot only runs once)
    let state_cell = std::cell::RefCell::new(Some((
        config,
        bindings,
        descriptor,
        command_sender,
        atomics,
        output,
    )));

    iced::application(
        move || {
            let (config, bindings, descriptor, command_sender, atomics, output) = state_cell
                .borrow_mut()
                .take()
                .expect("boot state already taken");

            let app = MixerApp::new(
                config,
                bindings,
                descriptor,
                Some(command_sender),
                atomics,
                output,
                sample_rate,
            );
            (app, iced::Task::none())
        },
        update,
        view,
    )
    .subscription(subscription)
    .title("Stemmix Player")
    .window_size(Size::new(760.0, 520.0))
    .run()

    // On exit the app is dropped: the output handle shuts the stream
    // down and joins the audio thread; an in-flight render is detached
    // and finishes with the process.
}

/// Resolve the command-line argument to a mix descriptor: a local
/// JSON file wins, anything else is treated as a backend mix id
fn obtain_descriptor(
    config: &config::PlayerConfig,
    arg: &str,
) -> anyhow::Result<MixDescriptor> {
    let path = Path::new(arg);
    if path.exists() {
        MixDescriptor::from_file(path)
            .with_context(|| format!("reading descriptor file {}", path.display()))
    } else {
        MixDescriptor::fetch(&config.service_url, arg)
            .with_context(|| format!("fetching mix {} from {}", arg, config.service_url))
    }
}

/// Update function for iced
fn update(app: &mut MixerApp, message: Message) -> iced::Task<Message> {
    app.update(message)
}

/// View function for iced
fn view(app: &MixerApp) -> iced::Element<'_, Message> {
    app.view()
}

/// Subscription function for iced
fn subscription(app: &MixerApp) -> iced::Subscription<Message> {
    app.subscription()
}
