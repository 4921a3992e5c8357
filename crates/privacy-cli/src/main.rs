//! `privacy-cli` – interactive shell for the privacy capability.
//!
//! 1. Initialises tracing (see [`telemetry`]).
//! 2. Loads `~/.privacy-bridge/config.toml`, writing defaults on first run.
//! 3. Injects a [`WsRelay`] for the configured relay URL into the host slot
//!    the [`RequestBridge`] watches.
//! 4. Drops the user into the slash-command REPL.

mod config;
mod repl;
mod telemetry;

use std::sync::Arc;

use colored::Colorize;
use privacy_bridge::{HostSlot, RequestBridge, WsRelay};
use tracing::{info, warn};

fn main() {
    let _telemetry = telemetry::init_tracing("privacy-cli");

    print_banner();

    let cfg = match config::load() {
        Ok(Some(cfg)) => {
            println!(
                "  Config loaded from {}",
                config::config_path().display().to_string().bold()
            );
            cfg
        }
        Ok(None) => {
            let mut cfg = config::Config::default();
            match config::save(&cfg) {
                Ok(()) => println!(
                    "  {} Default config written to {}",
                    "✓".green().bold(),
                    config::config_path().display().to_string().bold()
                ),
                Err(e) => warn!(error = %e, "could not write default config"),
            }
            config::apply_env_overrides(&mut cfg);
            cfg
        }
        Err(e) => {
            println!("{}: {}", "Config error".red(), e);
            println!("  Using default configuration.");
            let mut cfg = config::Config::default();
            config::apply_env_overrides(&mut cfg);
            cfg
        }
    };

    let runtime = match tokio::runtime::Runtime::new() {
        Ok(rt) => rt,
        Err(e) => {
            eprintln!("{}: {}", "Failed to start async runtime".red(), e);
            std::process::exit(1);
        }
    };

    let slot = HostSlot::new();
    let bridge = RequestBridge::new(slot.clone(), cfg.bridge.policy());
    if slot.install(Arc::new(WsRelay::new(cfg.relay_url.clone()))).is_err() {
        warn!("privacy capability was already installed");
    }
    info!(relay_url = %cfg.relay_url, "privacy relay installed");

    println!("  Relay: {}", cfg.relay_url.dimmed());
    println!("\n  Type {} for a list of commands.\n", "/help".bold().cyan());

    repl::run(&runtime, &bridge, &cfg);
}

fn print_banner() {
    println!();
    println!(
        "  {} {}",
        "privacy".bold().cyan(),
        format!("v{}", env!("CARGO_PKG_VERSION")).dimmed()
    );
    println!("  Typed shell for the injected privacy capability");
    println!();
}
