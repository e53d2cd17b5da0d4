//! # MCF Inspector
//!
//! Builds the parameter registry and signal table from a machine definition
//! and prints what was built. Used to check definition files before they are
//! deployed.
//!
//! # Usage
//!
//! ```bash
//! # Summary of instances, groups and signals
//! mcf --config machine.toml
//!
//! # Resolve dot-paths
//! mcf --config machine.toml --get axis1.motion.speed --get axis1.\$state
//!
//! # Verbose JSON logging
//! mcf --config machine.toml -v --json
//! ```

#![deny(warnings)]

use clap::Parser;
use mcf_core::config::{ConfigLoader, LogLevel, MachineDefinition};
use mcf_core::system::SystemState;
use std::path::PathBuf;
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

/// Machine definition inspector
#[derive(Parser, Debug)]
#[command(name = "mcf")]
#[command(author = "RTS007")]
#[command(version)]
#[command(about = "Builds a machine definition and resolves parameter dot-paths")]
#[command(long_about = None)]
struct Args {
    /// Path to the machine definition file.
    #[arg(short, long, default_value = "/etc/mcf/machine.toml")]
    config: PathBuf,

    /// Resolve a dot-path (`instance.group.parameter` or `instance.$state`).
    /// Can be specified multiple times.
    #[arg(short, long = "get", action = clap::ArgAction::Append)]
    paths: Vec<String>,

    /// Enable verbose logging (overrides the configured log level)
    #[arg(short, long)]
    verbose: bool,

    /// Output logs in JSON format
    #[arg(long)]
    json: bool,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    if let Err(e) = run() {
        error!("mcf failed: {}", e);
        eprintln!("error: {e}");
        std::process::exit(1);
    }
    Ok(())
}

fn run() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();

    let definition = MachineDefinition::load(&args.config)?;
    setup_tracing(&args, definition.shared.log_level);
    info!(
        "mcf v{} loaded {}",
        env!("CARGO_PKG_VERSION"),
        args.config.display()
    );

    let state = SystemState::from_definition(&definition)?;

    for line in summarize(&state) {
        println!("{line}");
    }

    let mut failed = 0usize;
    for path in &args.paths {
        match state.registry.resolve_value(path) {
            Ok(value) => println!("{path} = {value}"),
            Err(e) => {
                warn!(path = %path, "cannot resolve: {e}");
                println!("{path} ! {e}");
                failed += 1;
            }
        }
    }
    if failed > 0 {
        return Err(format!("{failed} path(s) could not be resolved").into());
    }
    Ok(())
}

/// One line per instance, group and signal.
fn summarize(state: &SystemState) -> Vec<String> {
    let mut lines = Vec::new();
    for name in state.registry.instance_names() {
        let Ok(handler) = state.registry.parameter_handler(&name) else {
            continue;
        };
        lines.push(format!("{name}: {}", handler.description()));
        for group in handler.groups() {
            lines.push(format!(
                "  {}.{} ({} parameters)",
                name,
                group.name(),
                group.parameter_count()
            ));
        }
        for signal in state.signals.signal_names(&name) {
            lines.push(format!("  signal {name}/{signal}"));
        }
    }
    lines
}

/// Setup tracing subscriber from CLI arguments and the configured level.
fn setup_tracing(args: &Args, configured: LogLevel) {
    let level = if args.verbose {
        LogLevel::Debug
    } else {
        configured
    };

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(level.as_filter()));

    if args.json {
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .json()
            .init();
    } else {
        tracing_subscriber::fmt().with_env_filter(filter).init();
    }
}
