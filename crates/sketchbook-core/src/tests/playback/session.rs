use crate::{
    device::{EndedSignal, PlaybackEngine},
    playback::{EndedOutcome, PlaybackSession, PlaybackStatus, SeekOutcome},
    take::EncodedAudio,
    tests::fakes::{FakeEngine, FakePlayer},
};

use tokio::sync::mpsc;
use uuid::Uuid;

const TAKE_DURATION: f64 = 100.0;

/// A session bound to a fake player with a probed duration.
fn bound_session(engine: &FakeEngine) -> PlaybackSession<FakePlayer> {
    let (tx, _rx) = mpsc::unbounded_channel();
    let mut session = PlaybackSession::new();
    let generation = session.prepare_rebind();

    let audio = EncodedAudio::new(vec![0; 8], "audio/wav");
    let player = engine
        .load(&audio, EndedSignal::new(tx, generation))
        .unwrap();
    assert!(session.bind(generation, Uuid::new_v4(), player));
    assert!(session.set_duration(generation, TAKE_DURATION));
    session
}

/// WHAT: Duration reads 0 until the probe reports, and stale probes are ignored
/// WHY: A rebind must never show the previous take's duration
#[test]
fn given_fresh_binding_when_probing_then_duration_follows_current_generation() {
    // Given: A take bound without a probed duration
    let engine = FakeEngine::default();
    let (tx, _rx) = mpsc::unbounded_channel();
    let mut session = PlaybackSession::new();
    let first = session.prepare_rebind();
    let audio = EncodedAudio::new(vec![0; 8], "audio/wav");
    let player = engine
        .load(&audio, EndedSignal::new(tx.clone(), first))
        .unwrap();
    assert!(session.bind(first, Uuid::new_v4(), player));
    assert_eq!(session.duration(), 0.0);

    // When: The history changes before the first probe lands
    let second = session.prepare_rebind();
    let player = engine
        .load(&audio, EndedSignal::new(tx, second))
        .unwrap();
    assert!(session.bind(second, Uuid::new_v4(), player));
    let stale = session.set_duration(first, 42.0);
    let current = session.set_duration(second, 7.5);

    // Then: Only the current generation's probe is applied
    assert!(!stale);
    assert!(current);
    assert_eq!(session.duration(), 7.5);
    assert_eq!(session.position(), 0.0);
}

/// WHAT: Seeking while halted only previews the position
/// WHY: Scrubbing must not start playback
#[test]
fn given_loaded_take_when_seeking_then_position_moves_without_playing() {
    // Given: A bound 100s take, not playing
    let engine = FakeEngine::default();
    let mut session = bound_session(&engine);

    // When: Seeking to 40s
    let outcome = session.seek(40.0);

    // Then: Position is 40 and playback has not started
    assert_eq!(outcome, SeekOutcome::Previewed(40.0));
    assert_eq!(session.position(), 40.0);
    assert!(!session.is_playing());
    assert!(!engine.latest_playing());
}

/// WHAT: Seeking clamps to the take
/// WHY: Positions outside [0, duration] are meaningless
#[test]
fn given_loaded_take_when_seeking_out_of_range_then_clamped() {
    // Given: A bound 100s take
    let engine = FakeEngine::default();
    let mut session = bound_session(&engine);

    // When/Then: Both ends clamp
    assert_eq!(session.seek(250.0), SeekOutcome::Previewed(TAKE_DURATION));
    assert_eq!(session.seek(-5.0), SeekOutcome::Previewed(0.0));
}

/// WHAT: Seeking while playing relocates the decode cursor
/// WHY: Playback continues from the new position
#[test]
fn given_playing_when_seeking_then_relocated() {
    // Given: Playback running
    let engine = FakeEngine::default();
    let mut session = bound_session(&engine);
    session.play();

    // When: Seeking to 40s and sampling
    let outcome = session.seek(40.0);
    session.sample();

    // Then: Cursor relocated and playback continues
    assert_eq!(outcome, SeekOutcome::Relocated(40.0));
    assert_eq!(session.position(), 40.0);
    assert!(session.is_playing());
}

/// WHAT: Natural end without repeat resets to zero and stops
/// WHY: The transport returns to its start state
#[test]
fn given_playing_when_clip_ends_then_position_zero_and_not_playing() {
    // Given: Playing after a seek to 40s
    let engine = FakeEngine::default();
    let mut session = bound_session(&engine);
    session.play();
    session.seek(40.0);
    let generation = session.generation();

    // When: The clip ends
    let outcome = session.on_ended(generation);

    // Then: Reset and halted, binding kept
    assert_eq!(outcome, EndedOutcome::Finished);
    assert_eq!(session.position(), 0.0);
    assert!(!session.is_playing());
    assert_eq!(session.status(), PlaybackStatus::Loaded);
    assert!(session.is_bound());
}

/// WHAT: Natural end with repeat-one loops
/// WHY: Repeat-one keeps the take playing from zero
#[test]
fn given_repeat_one_when_clip_ends_then_loops_from_zero() {
    // Given: Repeat-one playback at 30s
    let engine = FakeEngine::default();
    let mut session = bound_session(&engine);
    session.set_repeat_one(true);
    session.play();
    session.seek(30.0);

    // When: The clip ends
    let outcome = session.on_ended(session.generation());

    // Then: Still playing from zero
    assert_eq!(outcome, EndedOutcome::Looped);
    assert!(session.is_playing());
    assert_eq!(session.position(), 0.0);
    assert!(engine.latest_playing());
}

/// WHAT: End-of-clip from a replaced binding is ignored
/// WHY: A rebind must not be disturbed by the previous player's events
#[test]
fn given_rebound_session_when_old_clip_ends_then_ignored() {
    // Given: A playing session whose generation is remembered, then unbound
    let engine = FakeEngine::default();
    let mut session = bound_session(&engine);
    session.play();
    let old = session.generation();
    session.unbind();

    // When: The old player reports completion
    let outcome = session.on_ended(old);

    // Then: Ignored, and unbinding reset everything
    assert_eq!(outcome, EndedOutcome::Ignored);
    assert_eq!(session.status(), PlaybackStatus::Idle);
    assert_eq!(session.duration(), 0.0);
    assert_eq!(session.position(), 0.0);
}

/// WHAT: Play without a take is a no-op
/// WHY: Transport controls on an absent take are benign
#[test]
fn given_no_take_when_playing_or_seeking_then_nothing_happens() {
    // Given: An unbound session
    let mut session: PlaybackSession<FakePlayer> = PlaybackSession::new();

    // When/Then: Nothing changes
    assert!(!session.play());
    assert_eq!(session.seek(10.0), SeekOutcome::NoTake);
    assert_eq!(session.position(), 0.0);
    assert_eq!(session.status(), PlaybackStatus::Idle);
}

/// WHAT: Pause freezes the position and play resumes from it
/// WHY: Resuming must not re-decode or rewind
#[test]
fn given_playing_when_pausing_and_resuming_then_position_kept() {
    // Given: Playback advanced to 12s
    let engine = FakeEngine::default();
    let mut session = bound_session(&engine);
    session.play();
    engine.advance_latest(12.0);

    // When: Pausing then playing again
    session.pause();
    let paused_at = session.position();
    session.play();

    // Then: Position kept, same player resumed
    assert_eq!(paused_at, 12.0);
    assert!(session.is_playing());
    assert_eq!(engine.loads(), 1);
    assert_eq!(engine.latest_play_calls(), 2);
}

/// WHAT: Stop rewinds but keeps the binding
/// WHY: Stop differs from unloading on empty history
#[test]
fn given_playing_when_stopping_then_rewound_and_bound() {
    // Given: Playback at 20s
    let engine = FakeEngine::default();
    let mut session = bound_session(&engine);
    session.play();
    session.seek(20.0);

    // When: Stopping
    session.stop();

    // Then: Rewound, halted, still bound
    assert_eq!(session.position(), 0.0);
    assert_eq!(session.status(), PlaybackStatus::Loaded);
    assert!(session.is_bound());
    assert!(!engine.latest_playing());
}
