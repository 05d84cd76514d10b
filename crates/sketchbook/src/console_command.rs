use crate::{AppError, AppResult};

use std::{panic::Location, path::PathBuf, str::FromStr};

use error_location::ErrorLocation;

/// Help text listing every console command.
pub(crate) const HELP: &str = "\
commands:
  record              start a new recording
  stop                stop recording and keep the take
  discard             stop recording without keeping it
  delete              drop the current take
  restart             keep the attempt as a false start and record again
  play | pause        transport
  toggle              play or pause
  halt                stop playback and rewind
  seek <seconds>      move the playback position
  marker              mark the current recording time
  next | prev         seek to the adjacent marker
  repeat on|off       loop the current take
  dismiss | retry     clear a fault
  status              print the session state
  snapshot [path]     export the live waveform as PNG
  help                this text
  quit                release the microphone and exit";

/// One line typed at the console.
#[derive(Debug, Clone, PartialEq)]
pub enum ConsoleCommand {
    /// Start a new recording.
    Record,
    /// Stop recording and keep the take.
    Stop,
    /// Stop recording without a take.
    Discard,
    /// Drop the current take.
    Delete,
    /// Restart the recording.
    Restart,
    /// Play the current take.
    Play,
    /// Pause playback.
    Pause,
    /// Play or pause.
    Toggle,
    /// Stop playback and rewind.
    Halt,
    /// Seek playback.
    Seek(f64),
    /// Set a marker.
    Marker,
    /// Seek to the next marker.
    NextMarker,
    /// Seek to the previous marker.
    PreviousMarker,
    /// Set repeat-one.
    Repeat(bool),
    /// Dismiss the fault.
    Dismiss,
    /// Retry after a fault.
    Retry,
    /// Print the state.
    Status,
    /// Export the waveform; `None` picks a file in the snapshot dir.
    Snapshot(Option<PathBuf>),
    /// Print the command list.
    Help,
    /// Exit.
    Quit,
}

impl FromStr for ConsoleCommand {
    type Err = AppError;

    #[track_caller]
    fn from_str(line: &str) -> AppResult<Self> {
        let mut words = line.split_whitespace();
        let Some(name) = words.next() else {
            return Err(invalid("empty line".to_string()));
        };
        let argument = words.next();
        if words.next().is_some() {
            return Err(invalid(format!("too many arguments to '{}'", name)));
        }

        let command = match (name.to_ascii_lowercase().as_str(), argument) {
            ("record" | "rec" | "r", None) => ConsoleCommand::Record,
            ("stop" | "s", None) => ConsoleCommand::Stop,
            ("discard", None) => ConsoleCommand::Discard,
            ("delete" | "del", None) => ConsoleCommand::Delete,
            ("restart", None) => ConsoleCommand::Restart,
            ("play" | "p", None) => ConsoleCommand::Play,
            ("pause", None) => ConsoleCommand::Pause,
            ("toggle" | "t", None) => ConsoleCommand::Toggle,
            ("halt", None) => ConsoleCommand::Halt,
            ("seek", Some(seconds)) => ConsoleCommand::Seek(parse_seconds(seconds)?),
            ("marker" | "m", None) => ConsoleCommand::Marker,
            ("next" | "n", None) => ConsoleCommand::NextMarker,
            ("prev" | "previous", None) => ConsoleCommand::PreviousMarker,
            ("repeat", Some(flag)) => ConsoleCommand::Repeat(parse_flag(flag)?),
            ("dismiss", None) => ConsoleCommand::Dismiss,
            ("retry", None) => ConsoleCommand::Retry,
            ("status", None) => ConsoleCommand::Status,
            ("snapshot", path) => ConsoleCommand::Snapshot(path.map(PathBuf::from)),
            ("help" | "?", None) => ConsoleCommand::Help,
            ("quit" | "exit" | "q", None) => ConsoleCommand::Quit,
            ("seek" | "repeat", None) => {
                return Err(invalid(format!("'{}' needs an argument", name)));
            }
            (_, Some(_)) if is_known(name) => {
                return Err(invalid(format!("'{}' takes no argument", name)));
            }
            _ => return Err(invalid(format!("unknown command '{}'", name))),
        };

        Ok(command)
    }
}

/// Command words that take no argument.
const BARE_COMMANDS: [&str; 17] = [
    "record", "stop", "discard", "delete", "restart", "play", "pause", "toggle", "halt",
    "marker", "next", "prev", "dismiss", "retry", "status", "help", "quit",
];

fn is_known(name: &str) -> bool {
    BARE_COMMANDS.iter().any(|word| word.eq_ignore_ascii_case(name))
}

#[track_caller]
fn parse_seconds(text: &str) -> AppResult<f64> {
    match text.parse::<f64>() {
        Ok(seconds) if seconds.is_finite() && seconds >= 0.0 => Ok(seconds),
        _ => Err(invalid(format!("'{}' is not a position in seconds", text))),
    }
}

#[track_caller]
fn parse_flag(text: &str) -> AppResult<bool> {
    match text.to_ascii_lowercase().as_str() {
        "on" | "true" | "1" => Ok(true),
        "off" | "false" | "0" => Ok(false),
        _ => Err(invalid(format!("expected on or off, got '{}'", text))),
    }
}

#[track_caller]
fn invalid(reason: String) -> AppError {
    AppError::InvalidCommand {
        reason,
        location: ErrorLocation::from(Location::caller()),
    }
}
