// SPDX-License-Identifier: GPL-3.0-only

use camera_preview::Config;
use camera_preview::backends::camera::CameraBackendType;
use clap::{Parser, Subcommand};
use std::fs::OpenOptions;
use std::sync::Mutex;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

mod cli;

#[derive(Parser)]
#[command(name = "camera-preview")]
#[command(about = "List cameras and preview their live feed")]
#[command(version = env!("GIT_VERSION"))]
#[command(subcommand_required = false)]
struct Cli {
    /// Camera backend (overrides the configured one)
    #[arg(short, long, global = true, value_enum)]
    backend: Option<CameraBackendType>,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// List available cameras
    List {
        /// Print every device descriptor as JSON
        #[arg(long)]
        json: bool,
    },

    /// Preview a camera in the terminal (default)
    Preview {
        /// Device id to open instead of the default camera (from 'camera-preview list')
        #[arg(short, long)]
        device: Option<String>,
    },
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    let command = cli.command.unwrap_or(Commands::Preview { device: None });

    let loaded = Config::load_or_default();
    let mut config = loaded.config;

    let interactive = matches!(command, Commands::Preview { .. });
    init_logging(&config.log_level, interactive);

    if let Some(err) = loaded.error {
        warn!(error = %err, "Failed to load config, using defaults and leaving the file as is");
    }
    if let Some(backend) = cli.backend {
        config.backend = backend;
    }
    info!(backend = %config.backend, version = env!("GIT_VERSION"), "Starting");

    match command {
        Commands::List { json } => cli::list_devices(&config, json)?,
        Commands::Preview { device } => {
            camera_preview::terminal::run(config, device, loaded.save_path)?
        }
    }

    Ok(())
}

/// Set up tracing. `RUST_LOG` overrides the configured level.
///
/// While the terminal UI owns the screen, logs go to a file in the cache dir
/// (or nowhere if it cannot be opened).
fn init_logging(level: &str, to_file: bool) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));
    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_level(true);

    if !to_file {
        builder.with_writer(std::io::stderr).init();
        return;
    }

    let file = Config::log_path().and_then(|path| {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).ok()?;
        }
        OpenOptions::new().create(true).append(true).open(path).ok()
    });

    match file {
        Some(file) => builder.with_writer(Mutex::new(file)).with_ansi(false).init(),
        None => builder.with_writer(std::io::sink).init(),
    }
}
