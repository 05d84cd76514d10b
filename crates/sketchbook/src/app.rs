use crate::{
    AppError, AppResult, ConsoleCommand,
    config::Config,
    console_command::HELP,
    snapshot_export::export_png,
    status_view::{Headline, status_line},
};

use sketchbook_core::{
    CpalMicrophone, CpalPlaybackEngine, SessionController, SessionHandle, SharedCanvas,
    WavEncoder, format_clock,
};

use std::time::Duration;

use tokio::{
    io::{AsyncBufReadExt, BufReader},
    task::JoinHandle,
};
use tracing::{error, info, instrument, warn};
use uuid::Uuid;

/// How long the session controller gets to release its devices on exit.
const CONTROLLER_STOP_TIMEOUT: Duration = Duration::from_secs(1);

/// Main application state.
///
/// Owns the running session controller and drives it from console lines,
/// printing a status line whenever the session changes.
pub struct App {
    pub(crate) handle: SessionHandle,
    pub(crate) controller: JoinHandle<()>,
    pub(crate) canvas: SharedCanvas,
    pub(crate) config: Config,
}

impl App {
    /// Spawn the session controller on the current runtime with cpal devices.
    #[track_caller]
    #[instrument(skip(config))]
    pub(crate) fn start(config: Config) -> AppResult<Self> {
        let session_config = config.session_config()?;
        let waveform = &session_config.waveform;
        let canvas = SharedCanvas::new(waveform.width, waveform.height, waveform.device_pixel_ratio);

        let microphone = CpalMicrophone::new(config.audio.input_device.clone());
        let (handle, controller) = SessionController::spawn(
            session_config,
            microphone,
            WavEncoder,
            CpalPlaybackEngine,
            canvas.clone(),
        );

        info!(
            input_device = ?config.audio.input_device,
            max_takes = config.session.max_takes,
            "Session controller spawned"
        );

        Ok(Self {
            handle,
            controller,
            canvas,
            config,
        })
    }

    /// Run the console loop until `quit`, end of input, or controller exit.
    #[instrument(skip(self))]
    pub(crate) async fn run(self) -> AppResult<()> {
        info!("Sketchbook starting");
        println!("{}", HELP);

        let mut lines = BufReader::new(tokio::io::stdin()).lines();
        let mut snapshots = self.handle.subscribe();
        let mut last = Headline::of(&snapshots.borrow_and_update());

        loop {
            tokio::select! {
                line = lines.next_line() => {
                    match line {
                        Ok(Some(line)) => {
                            if line.trim().is_empty() {
                                continue;
                            }

                            match line.parse::<ConsoleCommand>() {
                                Ok(ConsoleCommand::Quit) => {
                                    info!("Quit requested");
                                    break;
                                }
                                Ok(command) => {
                                    if let Err(e) = self.execute(command).await {
                                        error!(error = ?e, "Command failed");
                                    }
                                }
                                Err(AppError::InvalidCommand { reason, .. }) => {
                                    println!("{}. Type 'help' for commands.", reason);
                                }
                                Err(e) => error!(error = ?e, "Failed to parse command"),
                            }
                        }
                        Ok(None) => {
                            info!("Console closed");
                            break;
                        }
                        Err(e) => {
                            error!(error = ?e, "Failed to read console");
                            break;
                        }
                    }
                }

                changed = snapshots.changed() => {
                    if changed.is_err() {
                        warn!("Session controller stopped");
                        break;
                    }

                    let snapshot = snapshots.borrow_and_update().clone();
                    let headline = Headline::of(&snapshot);
                    if headline != last {
                        println!("{}", status_line(&snapshot));
                        last = headline;
                    }
                }
            }
        }

        self.shutdown().await;
        Ok(())
    }

    /// Forward one console command to the session.
    #[instrument(skip(self))]
    async fn execute(&self, command: ConsoleCommand) -> AppResult<()> {
        match command {
            ConsoleCommand::Record => self.handle.start_recording().await?,
            ConsoleCommand::Stop => self.handle.stop_recording().await?,
            ConsoleCommand::Discard => self.handle.discard().await?,
            ConsoleCommand::Delete => self.handle.delete().await?,
            ConsoleCommand::Restart => self.handle.restart().await?,
            ConsoleCommand::Play => self.handle.play().await?,
            ConsoleCommand::Pause => self.handle.pause().await?,
            ConsoleCommand::Toggle => self.handle.toggle_playback().await?,
            ConsoleCommand::Halt => self.handle.stop_playback().await?,
            ConsoleCommand::Seek(seconds) => self.handle.seek(seconds).await?,
            ConsoleCommand::Marker => match self.handle.set_marker().await? {
                Some(marker) => println!(
                    "marker {} at {}",
                    marker.id,
                    format_clock(marker.time_seconds)
                ),
                None => println!("Markers can only be set while recording."),
            },
            ConsoleCommand::NextMarker => self.handle.next_marker().await?,
            ConsoleCommand::PreviousMarker => self.handle.previous_marker().await?,
            ConsoleCommand::Repeat(enabled) => self.handle.set_repeat_one(enabled).await?,
            ConsoleCommand::Dismiss => self.handle.dismiss_error().await?,
            ConsoleCommand::Retry => self.handle.retry().await?,
            ConsoleCommand::Status => println!("{}", status_line(&self.handle.snapshot())),
            ConsoleCommand::Snapshot(path) => {
                let path = match path {
                    Some(path) => path,
                    None => self
                        .config
                        .snapshot_dir()?
                        .join(format!("waveform-{}.png", Uuid::new_v4())),
                };
                export_png(&self.canvas.snapshot(), &path)?;
                println!("Snapshot written to {}", path.display());
            }
            ConsoleCommand::Help => println!("{}", HELP),
            ConsoleCommand::Quit => {}
        }

        Ok(())
    }

    async fn shutdown(self) {
        if let Err(e) = self.handle.shutdown().await {
            warn!(error = ?e, "Session controller already stopped");
        }

        match tokio::time::timeout(CONTROLLER_STOP_TIMEOUT, self.controller).await {
            Ok(Ok(())) => info!("Session controller stopped cleanly"),
            Ok(Err(e)) => error!(error = ?e, "Session controller task panicked"),
            Err(_) => warn!("Session controller did not stop within timeout"),
        }

        info!("Sketchbook shut down");
    }
}
