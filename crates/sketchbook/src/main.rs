//! Sketchbook: a console voice-memo recorder with a take history, false
//! starts, markers and a live waveform.

mod app;
mod config;
mod console_command;
mod error;
mod snapshot_export;
mod status_view;
#[cfg(test)]
mod tests;

pub(crate) use {
    app::App,
    console_command::ConsoleCommand,
    error::{AppError, Result as AppResult},
};

use crate::config::Config;

use std::time::Duration;

use tracing::error;
use tracing_subscriber::EnvFilter;

/// Log filter used when `RUST_LOG` is not set.
const DEFAULT_LOG_FILTER: &str = "sketchbook=debug,sketchbook_core=info";

/// Grace period for blocking work (the console reader) on exit.
const RUNTIME_SHUTDOWN_TIMEOUT: Duration = Duration::from_millis(500);

/// Application entry point.
fn main() {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(DEFAULT_LOG_FILTER));

    // Logs go to stderr; stdout carries the console.
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    let config = match Config::load() {
        Ok(c) => c,
        Err(e) => {
            error!("Failed to load config: {:?}", e);
            std::process::exit(1);
        }
    };

    let rt = match tokio::runtime::Runtime::new() {
        Ok(rt) => rt,
        Err(e) => {
            error!("Failed to create tokio runtime: {:?}", e);
            std::process::exit(1);
        }
    };

    let result = rt.block_on(async {
        let app = App::start(config)?;
        app.run().await
    });

    // The stdin reader blocks a runtime thread until the next line.
    rt.shutdown_timeout(RUNTIME_SHUTDOWN_TIMEOUT);

    if let Err(e) = result {
        error!(error = ?e, "App error");
        std::process::exit(1);
    }
}
