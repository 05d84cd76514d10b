/// Smallest amplitude fed to the decibel conversion.
pub const DB_EPSILON: f32 = 1e-4;

/// Peak absolute amplitude of a sample window.
pub fn peak_amplitude(samples: &[f32]) -> f32 {
    samples
        .iter()
        .filter(|s| s.is_finite())
        .fold(0.0_f32, |peak, s| peak.max(s.abs()))
}

/// Convert a linear amplitude to dBFS.
pub fn amplitude_to_db(amplitude: f32) -> f32 {
    20.0 * amplitude.max(DB_EPSILON).log10()
}

/// Maps envelope values to bar heights in `[0, 1]`.
///
/// Three zones:
/// - at or below `dead_db` the bar is zero
/// - between `dead_db` and `floor_db` the previous bar fades by `fade_factor`
///   and snaps to zero below `fade_snap`
/// - above `floor_db` the level is linear between the floor and 0 dB
#[derive(Debug, Clone)]
pub struct LevelNormalizer {
    dead_db: f32,
    floor_db: f32,
    fade_factor: f32,
    fade_snap: f32,
    last: f32,
}

impl LevelNormalizer {
    /// Build a normalizer. `floor_db` is raised to `dead_db` if configured below it.
    pub fn new(dead_db: f32, floor_db: f32, fade_factor: f32, fade_snap: f32) -> Self {
        Self {
            dead_db,
            floor_db: floor_db.max(dead_db),
            fade_factor: fade_factor.clamp(0.0, 1.0),
            fade_snap: fade_snap.max(0.0),
            last: 0.0,
        }
    }

    /// Normalize one decibel reading.
    pub fn normalize(&mut self, db: f32) -> f32 {
        let value = if db.is_nan() || db <= self.dead_db {
            0.0
        } else if db < self.floor_db {
            let faded = self.last * self.fade_factor;
            if faded < self.fade_snap { 0.0 } else { faded }
        } else if self.floor_db >= 0.0 {
            1.0
        } else {
            ((db - self.floor_db) / (0.0 - self.floor_db)).clamp(0.0, 1.0)
        };

        self.last = value;
        value
    }

    /// Normalize the peak of a sample window.
    pub fn normalize_window(&mut self, samples: &[f32]) -> f32 {
        self.normalize(amplitude_to_db(peak_amplitude(samples)))
    }

    /// Value of the previous bar.
    pub fn last(&self) -> f32 {
        self.last
    }

    /// Forget the previous bar.
    pub fn reset(&mut self) {
        self.last = 0.0;
    }
}
