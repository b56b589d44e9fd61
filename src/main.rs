//! clutch - foot pedal as a momentary modifier key
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────┐
//! │               Poll Loop                  │
//! ├──────────────────────────────────────────┤
//! │  Pedal (evdev, grabbed) → Dispatcher     │
//! │                              ↓           │
//! │              Handlers (keymap)           │
//! │                              ↓           │
//! │         Virtual keyboard (uinput)        │
//! └──────────────────────────────────────────┘
//! ```

mod config;
mod constants;
mod error;
mod handler;
mod input;
mod lifecycle;
mod output;
mod poll;
mod signals;
#[cfg(test)]
mod testing;

use anyhow::{bail, Context, Result};
use log::{info, warn};
use std::cell::RefCell;
use std::path::{Path, PathBuf};
use std::rc::Rc;

use config::Config;
use handler::{HandlerPair, Keymap, SharedKeymap};
use lifecycle::Session;
use output::VirtualKeyboard;
use poll::PollLoop;
use signals::{SignalStop, StopReason};

fn print_help() {
    println!(
        r#"clutch {} - foot pedal as a momentary modifier key

USAGE:
    clutch [OPTIONS]

OPTIONS:
    -h, --help              Print this help message
    -V, --version           Print version information
    -c, --config PATH       Use this config file instead of the lookup order
    --init-config[=system]  Generate config file (user, or /etc/clutch with =system)
    -f, --force             Overwrite config file without confirmation

DEFAULT MAPPING:
    pedal down  ->  Caps Lock up
    pedal up    ->  Caps Lock down

EXAMPLES:
    clutch                          Run with the default or configured mapping
    clutch --init-config            Generate ~/.config/clutch/config.toml
    sudo clutch --init-config=system
    RUST_LOG=debug clutch           Log every pedal transition

CONFIG FILE:
    $CLUTCH_CONFIG, ~/.config/clutch/config.toml, /etc/clutch/config.toml

Access to /dev/input/event* and /dev/uinput is required (root or the
input group plus a uinput udev rule).
"#,
        env!("CARGO_PKG_VERSION")
    );
}

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();

    if let Err(e) = run() {
        eprintln!("clutch: {:#}", e);
        std::process::exit(1);
    }
}

fn run() -> Result<()> {
    // Check command line arguments
    let args: Vec<String> = std::env::args().collect();

    // --help
    if args.iter().any(|a| a == "--help" || a == "-h") {
        print_help();
        return Ok(());
    }

    // --version
    if args.iter().any(|a| a == "--version" || a == "-V") {
        println!("clutch {}", env!("CARGO_PKG_VERSION"));
        return Ok(());
    }

    // Config file generation mode
    // --init-config or --init-config=system
    if let Some(arg) = args.iter().find(|a| a.starts_with("--init-config")) {
        let system = init_config_target(arg)?;
        let force = args.iter().any(|a| a == "--force" || a == "-f");
        return init_config(system, force);
    }

    let explicit_config = config_arg(&args)?;

    // Set up signal handlers before touching devices so Ctrl+C always cleans up
    signals::setup_signal_handlers();

    info!("clutch starting...");

    // Load config file
    let (cfg, config_path) = match explicit_config {
        Some(path) => (Config::load_from_file(&path)?, Some(path)),
        None => Config::load(),
    };

    let keymap: SharedKeymap = Rc::new(RefCell::new(
        Keymap::from_config(&cfg.mapping).context("Invalid key mapping")?,
    ));
    info!("Key mapping: {}", keymap.borrow());
    let handlers = HandlerPair::from_keymap(&keymap);

    // Virtual keyboard first: the session owns it and closes it on every exit path
    let output = VirtualKeyboard::create(&cfg.output.name)
        .context("Failed to create virtual keyboard (is /dev/uinput accessible?)")?;
    let mut session = Session::new(output);

    let pedals = input::compatible_devices(&cfg.devices.names)
        .context("Failed to open pedal device")?;
    if pedals.is_empty() {
        warn!(
            "No pedal found (looking for {:?}); waiting for shutdown",
            cfg.devices.names
        );
    }
    for pedal in pedals {
        session
            .acquire(pedal, handlers.clone())
            .context("Failed to grab pedal")?;
    }

    let mut poll = PollLoop::new(session, cfg.poll.idle());
    if let Some(path) = config_path {
        if let Some(hook) = mapping_reloader(path, Rc::clone(&keymap)) {
            poll = poll.with_idle_hook(hook);
        }
    }

    let _ = sd_notify::notify(false, &[sd_notify::NotifyState::Ready]);

    let reason = poll.run(&SignalStop).context("Pedal loop stopped")?;
    if let Some(message) = exit_message(reason) {
        println!("\n{}", message);
    }
    Ok(())
}

/// Line printed once cleanup is done; only an interactive Ctrl+C gets one
fn exit_message(reason: StopReason) -> Option<&'static str> {
    match reason {
        StopReason::Interrupt => Some("cleanup on CTRL-C complete"),
        StopReason::Terminate | StopReason::Hangup => None,
    }
}

/// `--init-config` writes the user config, `--init-config=system` the system one
fn init_config_target(arg: &str) -> Result<bool> {
    match arg {
        "--init-config" => Ok(false),
        "--init-config=system" => Ok(true),
        other => bail!("unknown option {:?} (expected --init-config or --init-config=system)", other),
    }
}

/// `-c PATH`, `--config PATH` or `--config=PATH`
fn config_arg(args: &[String]) -> Result<Option<PathBuf>> {
    let mut iter = args.iter().skip(1);
    while let Some(arg) = iter.next() {
        if let Some(path) = arg.strip_prefix("--config=") {
            return Ok(Some(PathBuf::from(path)));
        }
        if arg == "-c" || arg == "--config" {
            let path = iter
                .next()
                .with_context(|| format!("{} requires a path", arg))?;
            return Ok(Some(PathBuf::from(path)));
        }
    }
    Ok(None)
}

fn init_config(system: bool, force: bool) -> Result<()> {
    let config_path = Config::init_config_path(system)?;
    if config_path.exists() && !force {
        println!("Config file already exists: {}", config_path.display());
        print!("Overwrite? [y/N]: ");
        std::io::Write::flush(&mut std::io::stdout())?;

        let mut input = String::new();
        std::io::stdin().read_line(&mut input)?;
        let input = input.trim().to_lowercase();

        if input != "y" && input != "yes" {
            println!("Aborted.");
            return Ok(());
        }
    }

    let path = Config::write_default_config(system)?;
    println!("Config file generated: {}", path.display());
    Ok(())
}

/// Hook that swaps in the `[mapping]` section whenever the config file changes
#[cfg(target_os = "linux")]
fn mapping_reloader(path: PathBuf, keymap: SharedKeymap) -> Option<impl FnMut()> {
    let watcher = match config::ConfigWatcher::new(&path) {
        Ok(w) => w,
        Err(e) => {
            warn!("Config hot-reload disabled: {:#}", e);
            return None;
        }
    };
    info!("Config hot-reload enabled");

    Some(move || {
        if watcher.check_reload() {
            reload_mapping(&path, &keymap);
        }
    })
}

#[cfg(not(target_os = "linux"))]
fn mapping_reloader(_path: PathBuf, _keymap: SharedKeymap) -> Option<impl FnMut()> {
    None::<fn()>
}

fn reload_mapping(path: &Path, keymap: &SharedKeymap) {
    let reloaded = Config::load_from_file(path).and_then(|cfg| Keymap::from_config(&cfg.mapping));
    match reloaded {
        Ok(new_map) => {
            if *keymap.borrow() != new_map {
                info!("Key mapping reloaded: {}", new_map);
                *keymap.borrow_mut() = new_map;
            }
        }
        Err(e) => warn!("Keeping previous key mapping: {:#}", e),
    }
}
