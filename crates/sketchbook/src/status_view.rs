use sketchbook_core::{SessionSnapshot, SessionState, format_clock, progress_percent};

/// Fields whose change is worth a new status line.
///
/// Playback position is left out so a playing take does not print ten
/// lines a second.
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct Headline {
    state: SessionState,
    elapsed_seconds: u64,
    takes: usize,
    markers: usize,
    repeat_one: bool,
    has_fault: bool,
}

impl Headline {
    pub(crate) fn of(snapshot: &SessionSnapshot) -> Self {
        Self {
            state: snapshot.state,
            elapsed_seconds: snapshot.elapsed_seconds,
            takes: snapshot.takes.len(),
            markers: snapshot.markers.len(),
            repeat_one: snapshot.repeat_one,
            has_fault: snapshot.fault.is_some(),
        }
    }
}

/// One-line summary of a snapshot for the console.
pub(crate) fn status_line(snapshot: &SessionSnapshot) -> String {
    let history = history_label(snapshot);

    match snapshot.state {
        SessionState::Idle => format!("idle | {}", history),
        SessionState::Armed => "armed | waiting for microphone".to_string(),
        SessionState::Recording => format!(
            "recording {} | markers {} | {}",
            format_clock(snapshot.elapsed_seconds as f64),
            snapshot.markers.len(),
            history
        ),
        SessionState::Stopped | SessionState::Playing => {
            let verb = if snapshot.state == SessionState::Playing {
                "playing"
            } else {
                "stopped"
            };
            let repeat = if snapshot.repeat_one { " | repeat" } else { "" };
            format!(
                "{} {} / {} ({:.0}%) | {}{}",
                verb,
                format_clock(snapshot.position_seconds),
                format_clock(snapshot.duration_seconds),
                progress_percent(snapshot.position_seconds, snapshot.duration_seconds),
                history,
                repeat
            )
        }
        SessionState::Error => match &snapshot.fault {
            Some(fault) => format!("error: {} (dismiss or retry)", fault.message),
            None => "error".to_string(),
        },
    }
}

fn history_label(snapshot: &SessionSnapshot) -> String {
    let false_starts = snapshot.takes.iter().filter(|t| t.false_start).count();

    match false_starts {
        0 => format!("takes {}", snapshot.takes.len()),
        n => format!("takes {} ({} fs)", snapshot.takes.len(), n),
    }
}
