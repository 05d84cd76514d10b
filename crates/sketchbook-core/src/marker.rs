use serde::Serialize;

/// Rewind grace for previous-marker navigation: a marker closer than this
/// behind the cursor is skipped so repeated presses keep walking back.
pub const MARKER_REWIND_GRACE_SECONDS: f64 = 0.75;

/// A point-in-time annotation made during a recording.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Marker {
    /// Id unique within the recording.
    pub id: u32,
    /// Seconds since the recording began.
    pub time_seconds: f64,
}

/// Markers of the most recent recording, in creation order.
#[derive(Debug, Clone, Default)]
pub struct MarkerTrack {
    markers: Vec<Marker>,
    next_id: u32,
}

impl MarkerTrack {
    /// Empty track.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a marker at `time_seconds`.
    pub fn add(&mut self, time_seconds: f64) -> Marker {
        let marker = Marker {
            id: self.next_id,
            time_seconds: time_seconds.max(0.0),
        };
        self.next_id += 1;
        self.markers.push(marker);
        marker
    }

    /// Forget every marker. Ids restart at zero.
    pub fn clear(&mut self) {
        self.markers.clear();
        self.next_id = 0;
    }

    /// All markers.
    pub fn markers(&self) -> &[Marker] {
        &self.markers
    }

    /// Earliest marker strictly after `position`.
    pub fn next_after(&self, position: f64) -> Option<Marker> {
        self.markers
            .iter()
            .filter(|m| m.time_seconds > position)
            .min_by(|a, b| a.time_seconds.total_cmp(&b.time_seconds))
            .copied()
    }

    /// Latest marker at least the rewind grace before `position`.
    pub fn previous_before(&self, position: f64) -> Option<Marker> {
        let limit = position - MARKER_REWIND_GRACE_SECONDS;
        self.markers
            .iter()
            .filter(|m| m.time_seconds <= limit)
            .max_by(|a, b| a.time_seconds.total_cmp(&b.time_seconds))
            .copied()
    }
}
