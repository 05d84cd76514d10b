use crate::waveform::{LevelNormalizer, amplitude_to_db, peak_amplitude};

const DEAD_DB: f32 = -80.0;
const FLOOR_DB: f32 = -70.0;
const FADE: f32 = 0.6;
const SNAP: f32 = 0.02;
const TOLERANCE: f32 = 1e-4;

fn normalizer() -> LevelNormalizer {
    LevelNormalizer::new(DEAD_DB, FLOOR_DB, FADE, SNAP)
}

/// WHAT: Peak is the largest absolute sample
/// WHY: Bars represent the envelope of the window
#[test]
fn given_window_when_taking_peak_then_largest_magnitude() {
    // Given/When: A window with a negative extreme
    let peak = peak_amplitude(&[0.1, -0.7, 0.3, f32::NAN]);

    // Then: The magnitude of the extreme, NaN ignored
    assert!((peak - 0.7).abs() < TOLERANCE);
}

/// WHAT: Readings above the floor map linearly to [0, 1]
/// WHY: Full scale fills the bar, the floor empties it
#[test]
fn given_loud_readings_when_normalizing_then_linear_between_floor_and_zero() {
    // Given: A normalizer
    let mut levels = normalizer();

    // When/Then: 0 dB is full, -35 dB is half
    assert!((levels.normalize(0.0) - 1.0).abs() < TOLERANCE);
    assert!((levels.normalize(-35.0) - 0.5).abs() < TOLERANCE);
    assert!((levels.normalize_window(&[1.0]) - 1.0).abs() < TOLERANCE);
}

/// WHAT: Readings in the fade zone decay from the previous bar
/// WHY: Near-silence must fade out instead of flickering
#[test]
fn given_previous_bar_when_reading_in_fade_zone_then_decays_then_snaps() {
    // Given: A previous bar at 0.5
    let mut levels = normalizer();
    levels.normalize(-35.0);

    // When: Three readings in the fade zone
    let first = levels.normalize(-75.0);
    let second = levels.normalize(-75.0);
    let mut value = second;
    for _ in 0..10 {
        value = levels.normalize(-75.0);
    }

    // Then: 0.3, 0.18, then snapped to zero
    assert!((first - 0.3).abs() < TOLERANCE);
    assert!((second - 0.18).abs() < TOLERANCE);
    assert_eq!(value, 0.0);
}

/// WHAT: Readings at or below the dead threshold are silent
/// WHY: Background noise below -80 dB never draws a bar
#[test]
fn given_dead_reading_when_normalizing_then_zero_regardless_of_history() {
    // Given: A loud previous bar
    let mut levels = normalizer();
    levels.normalize(0.0);

    // When: A silent window arrives
    let value = levels.normalize_window(&[0.0; 64]);

    // Then: Zero, since silence clamps to the epsilon level below the dead zone
    assert!(amplitude_to_db(0.0) <= DEAD_DB);
    assert_eq!(value, 0.0);
}

/// WHAT: A reading exactly at the floor is in the linear zone
/// WHY: The floor is the bottom of the linear range, not part of the fade
#[test]
fn given_previous_bar_when_reading_at_floor_then_zero_not_faded() {
    // Given: A loud previous bar
    let mut levels = normalizer();
    levels.normalize(0.0);

    // When: A reading exactly at the floor
    let value = levels.normalize(FLOOR_DB);

    // Then: The linear mapping gives zero, not 0.6 of the previous bar
    assert_eq!(value, 0.0);
}
