use crate::{
    CaptureStatus, FALSE_START_LABEL, MAX_TAKES, PlaybackStatus, RendererStatus, SessionState,
    WAV_MIME,
    tests::fakes::{FakeEncoder, FakeEngine, FakeMicrophone, Rig},
};

use std::time::Duration;

const SHORT_TAKE: Duration = Duration::from_millis(200);
const DURATION_TOLERANCE: f64 = 0.25;

/// WHAT: Stopping a recording stores a take and binds playback to it
/// WHY: The most recent take is always the one the transport plays
#[tokio::test]
async fn given_idle_when_recording_and_stopping_then_take_stored_and_bound() {
    // Given: An idle session
    let rig = Rig::start();

    // When: Recording half a second
    let snapshot = rig.record_take(Duration::from_millis(500)).await;

    // Then: One normal take, bound and probed to about the recorded length
    assert_eq!(snapshot.state, SessionState::Stopped);
    assert_eq!(snapshot.takes.len(), 1);
    let take = &snapshot.takes[0];
    assert!(!take.false_start);
    assert_eq!(take.mime, WAV_MIME);
    assert_eq!(snapshot.bound_take, Some(take.id));
    assert_eq!(snapshot.playback, PlaybackStatus::Loaded);
    assert_eq!(snapshot.position_seconds, 0.0);
    assert!(
        (snapshot.duration_seconds - 0.5).abs() < DURATION_TOLERANCE,
        "duration {}",
        snapshot.duration_seconds
    );

    // And: Every device handle was released
    assert_eq!(snapshot.renderer, RendererStatus::Inactive);
    assert_eq!(rig.mic.live_streams(), 0);
    assert_eq!(rig.mic.live_taps(), 0);

    rig.shutdown().await;
}

/// WHAT: The elapsed counter shows whole seconds and freezes on stop
/// WHY: The timer is the only progress shown while recording
#[tokio::test]
async fn given_recording_past_one_second_when_stopping_then_elapsed_frozen() {
    // Given: A recording that has passed one second
    let rig = Rig::start();
    rig.handle.start_recording().await.unwrap();
    rig.until(|s| s.state == SessionState::Recording && s.elapsed_seconds == 1)
        .await;

    // When: Stopping
    rig.handle.stop_recording().await.unwrap();
    let snapshot = rig
        .until(|s| s.capture == CaptureStatus::Idle && s.takes.len() == 1)
        .await;

    // Then: The counter keeps its last value
    assert_eq!(snapshot.elapsed_seconds, 1);

    rig.shutdown().await;
}

/// WHAT: Delete during recording drops the in-progress take only
/// WHY: The previous take must stay current and playable
#[tokio::test]
async fn given_take_a_when_deleting_mid_recording_then_a_still_current() {
    // Given: Take A, then a new recording in progress
    let rig = Rig::start();
    let first = rig.record_take(SHORT_TAKE).await;
    let take_a = first.takes[0].id;

    rig.handle.start_recording().await.unwrap();
    rig.until(|s| s.state == SessionState::Recording).await;
    tokio::time::sleep(SHORT_TAKE).await;

    // When: Deleting
    rig.handle.delete().await.unwrap();
    let snapshot = rig
        .until(|s| s.capture == CaptureStatus::Idle && s.pending_finalizes == 0)
        .await;

    // Then: The capture was finalized and dropped, A is still current
    assert_eq!(rig.encoder.calls(), 2);
    assert_eq!(snapshot.takes.len(), 1);
    assert_eq!(snapshot.takes[0].id, take_a);
    assert_eq!(snapshot.bound_take, Some(take_a));
    assert_eq!(snapshot.state, SessionState::Stopped);
    assert_eq!(rig.mic.live_streams(), 0);

    rig.shutdown().await;
}

/// WHAT: Delete while a finalize is still encoding drops that take when it lands
/// WHY: The finalize completion is the only place that decides a take's fate
#[tokio::test]
async fn given_slow_finalize_when_deleting_then_take_never_appears() {
    // Given: A slow encoder and a stopped recording still encoding
    let encoder = FakeEncoder::default();
    encoder.set_delay(Duration::from_millis(300));
    let rig = Rig::with(FakeMicrophone::default(), encoder, FakeEngine::default());

    rig.handle.start_recording().await.unwrap();
    rig.until(|s| s.state == SessionState::Recording).await;
    tokio::time::sleep(SHORT_TAKE).await;
    rig.handle.stop_recording().await.unwrap();
    rig.until(|s| s.pending_finalizes == 1).await;

    // When: Deleting before the encode completes
    rig.handle.delete().await.unwrap();
    let snapshot = rig
        .until(|s| s.pending_finalizes == 0 && s.capture == CaptureStatus::Idle)
        .await;

    // Then: Nothing was stored
    assert_eq!(rig.encoder.calls(), 1);
    assert!(snapshot.takes.is_empty());
    assert_eq!(snapshot.state, SessionState::Idle);
    assert_eq!(snapshot.bound_take, None);

    rig.shutdown().await;
}

/// WHAT: Restart keeps the attempt as a false start and records again at once
/// WHY: A stumbled opening should not need a separate stop and start
#[tokio::test]
async fn given_recording_when_restarting_then_false_start_and_fresh_recording() {
    // Given: A recording past one second
    let rig = Rig::start();
    rig.handle.start_recording().await.unwrap();
    rig.until(|s| s.state == SessionState::Recording && s.elapsed_seconds == 1)
        .await;

    // When: Restarting
    rig.handle.restart().await.unwrap();
    let snapshot = rig
        .until(|s| {
            s.takes.len() == 1
                && s.capture == CaptureStatus::Recording
                && s.elapsed_seconds == 0
        })
        .await;

    // Then: A labelled false start and a new recording from zero
    assert_eq!(snapshot.state, SessionState::Recording);
    assert!(snapshot.takes[0].false_start);
    assert_eq!(snapshot.takes[0].label.as_deref(), Some(FALSE_START_LABEL));
    assert_eq!(rig.mic.open_calls(), 2);

    // And: Stopping the new recording appends a normal take after it
    rig.handle.stop_recording().await.unwrap();
    let snapshot = rig
        .until(|s| {
            s.takes.len() == 2
                && s.capture == CaptureStatus::Idle
                && s.bound_take == s.current_take().map(|t| t.id)
        })
        .await;
    assert!(snapshot.takes[0].false_start);
    assert!(!snapshot.takes[1].false_start);
    assert_eq!(snapshot.state, SessionState::Stopped);

    rig.shutdown().await;
}

/// WHAT: The recording after a restart starts without the false start's markers
/// WHY: Markers belong to the capture they were set in
#[tokio::test]
async fn given_marker_in_false_start_when_restarting_then_new_recording_has_no_markers() {
    // Given: A recording with one marker
    let rig = Rig::start();
    rig.handle.start_recording().await.unwrap();
    rig.until(|s| s.state == SessionState::Recording).await;
    tokio::time::sleep(SHORT_TAKE).await;
    let marker = rig.handle.set_marker().await.unwrap();
    assert!(marker.is_some());

    // When: Restarting
    rig.handle.restart().await.unwrap();
    let snapshot = rig
        .until(|s| {
            s.takes.len() == 1
                && s.capture == CaptureStatus::Recording
                && s.elapsed_seconds == 0
        })
        .await;

    // Then: The new recording carries no markers
    assert!(snapshot.markers.is_empty(), "markers {:?}", snapshot.markers);
    assert_eq!(rig.mic.open_calls(), 2);

    rig.handle.discard().await.unwrap();
    rig.shutdown().await;
}

/// WHAT: Starting a recording while a restart is encoding cancels the reacquisition
/// WHY: The pending restart must never close the recording the user started
#[tokio::test]
async fn given_restart_encoding_when_starting_recording_then_user_capture_survives() {
    // Given: A slow encoder and a restart whose false start is still encoding
    let encoder = FakeEncoder::default();
    encoder.set_delay(Duration::from_millis(300));
    let rig = Rig::with(FakeMicrophone::default(), encoder, FakeEngine::default());

    rig.handle.start_recording().await.unwrap();
    rig.until(|s| s.state == SessionState::Recording).await;
    tokio::time::sleep(SHORT_TAKE).await;
    rig.handle.restart().await.unwrap();

    // When: Starting a fresh recording before the encode finishes
    rig.handle.start_recording().await.unwrap();
    rig.until(|s| s.takes.len() == 1 && s.pending_finalizes == 0)
        .await;
    tokio::time::sleep(Duration::from_millis(200)).await;

    // Then: The false start is stored and only the user's capture reopened the microphone
    let snapshot = rig.handle.snapshot();
    assert!(snapshot.takes[0].false_start);
    assert_eq!(snapshot.capture, CaptureStatus::Recording);
    assert_eq!(rig.mic.open_calls(), 2);

    // And: Stopping keeps the user's recording as a normal take
    rig.handle.stop_recording().await.unwrap();
    let snapshot = rig
        .until(|s| s.takes.len() == 2 && s.pending_finalizes == 0)
        .await;
    assert!(!snapshot.takes[1].false_start);
    assert_eq!(rig.mic.open_calls(), 2);

    rig.shutdown().await;
}

/// WHAT: A streaming recording paints the shared canvas
/// WHY: The live waveform is drawn while audio is captured
#[tokio::test]
async fn given_streaming_renderer_when_recording_then_canvas_painted() {
    // Given: A recording with the analysis tap attached
    let rig = Rig::start();
    rig.handle.start_recording().await.unwrap();
    rig.until(|s| s.renderer == RendererStatus::Streaming).await;

    // When: Enough time passes for several bars to scroll in
    tokio::time::sleep(Duration::from_millis(500)).await;

    // Then: Pixels were painted through the shared canvas
    assert!(rig.canvas.snapshot().painted_pixels() > 0);

    rig.handle.discard().await.unwrap();
    rig.shutdown().await;
}

/// WHAT: Stop during the restart gap keeps the attempt as a normal take
/// WHY: Stop means keep what was recorded and record nothing more
#[tokio::test]
async fn given_restart_in_flight_when_stopping_then_normal_take_and_no_new_capture() {
    // Given: A slow encoder and a restart whose false start is still encoding
    let encoder = FakeEncoder::default();
    encoder.set_delay(Duration::from_millis(200));
    let rig = Rig::with(FakeMicrophone::default(), encoder, FakeEngine::default());

    rig.handle.start_recording().await.unwrap();
    rig.until(|s| s.state == SessionState::Recording).await;
    tokio::time::sleep(SHORT_TAKE).await;
    rig.handle.restart().await.unwrap();

    // When: Stopping during the gap
    rig.handle.stop_recording().await.unwrap();
    let snapshot = rig
        .until(|s| s.takes.len() == 1 && s.pending_finalizes == 0)
        .await;

    // Then: One normal take and the microphone was not reopened
    assert!(!snapshot.takes[0].false_start);
    tokio::time::sleep(Duration::from_millis(100)).await;
    let snapshot = rig.handle.snapshot();
    assert_eq!(snapshot.capture, CaptureStatus::Idle);
    assert_eq!(snapshot.state, SessionState::Stopped);
    assert_eq!(rig.mic.open_calls(), 1);

    rig.shutdown().await;
}

/// WHAT: Discard releases the microphone without creating a take
/// WHY: A discarded recording leaves no trace in history
#[tokio::test]
async fn given_recording_when_discarding_then_no_take() {
    // Given: A recording in progress
    let rig = Rig::start();
    rig.handle.start_recording().await.unwrap();
    rig.until(|s| s.state == SessionState::Recording).await;
    tokio::time::sleep(SHORT_TAKE).await;

    // When: Discarding
    rig.handle.discard().await.unwrap();
    let snapshot = rig.until(|s| s.capture == CaptureStatus::Idle).await;

    // Then: Nothing was encoded or stored
    assert_eq!(snapshot.state, SessionState::Idle);
    assert!(snapshot.takes.is_empty());
    assert_eq!(rig.encoder.calls(), 0);
    assert_eq!(rig.mic.live_streams(), 0);

    rig.shutdown().await;
}

/// WHAT: Starting a recording halts playback first
/// WHY: Playback and capture never run together
#[tokio::test]
async fn given_playing_take_when_starting_recording_then_playback_halted() {
    // Given: A take that is playing
    let rig = Rig::start();
    rig.record_take(SHORT_TAKE).await;
    rig.handle.play().await.unwrap();
    rig.until(|s| s.state == SessionState::Playing).await;

    // When: Starting a new recording
    rig.handle.start_recording().await.unwrap();
    let snapshot = rig.until(|s| s.state == SessionState::Recording).await;

    // Then: The player is halted but still bound
    assert_eq!(snapshot.playback, PlaybackStatus::Loaded);
    assert!(!rig.engine.latest_playing());
    assert!(snapshot.bound_take.is_some());

    rig.handle.discard().await.unwrap();
    rig.shutdown().await;
}

/// WHAT: Markers are stamped while recording and reset by the next recording
/// WHY: Markers belong to the most recent recording only
#[tokio::test]
async fn given_recording_when_setting_markers_then_kept_until_next_recording() {
    // Given: A recording in progress
    let rig = Rig::start();
    rig.handle.start_recording().await.unwrap();
    rig.until(|s| s.state == SessionState::Recording).await;
    tokio::time::sleep(SHORT_TAKE).await;

    // When: Setting two markers
    let first = rig.handle.set_marker().await.unwrap().unwrap();
    let second = rig.handle.set_marker().await.unwrap().unwrap();

    // Then: Sequential ids at increasing recording times
    assert_eq!((first.id, second.id), (0, 1));
    assert!(first.time_seconds > 0.0);
    assert!(second.time_seconds >= first.time_seconds);

    // And: They outlive the stop, but markers cannot be set afterwards
    rig.handle.stop_recording().await.unwrap();
    rig.until(|s| s.takes.len() == 1 && s.capture == CaptureStatus::Idle)
        .await;
    let snapshot = rig.flush().await;
    assert_eq!(snapshot.markers, vec![first, second]);

    // And: The next recording starts without markers
    rig.handle.start_recording().await.unwrap();
    rig.until(|s| s.state == SessionState::Recording && s.markers.is_empty())
        .await;

    rig.handle.discard().await.unwrap();
    rig.shutdown().await;
}

/// WHAT: A microphone grant arriving after discard is released
/// WHY: A stale grant must never keep the device open
#[tokio::test]
async fn given_slow_grant_when_discarding_while_requesting_then_grant_released() {
    // Given: A microphone that takes a while to open
    let rig = Rig::start();
    rig.mic.set_open_delay(Duration::from_millis(200));
    rig.handle.start_recording().await.unwrap();
    rig.until(|s| s.capture == CaptureStatus::RequestingDevice)
        .await;

    // When: Discarding before the grant arrives
    rig.handle.discard().await.unwrap();
    rig.until(|s| s.capture == CaptureStatus::Idle).await;
    tokio::time::sleep(Duration::from_millis(400)).await;

    // Then: The late stream was closed and recording never began
    let snapshot = rig.flush().await;
    assert_eq!(snapshot.state, SessionState::Idle);
    assert_eq!(rig.mic.open_calls(), 1);
    assert_eq!(rig.mic.live_streams(), 0);

    rig.shutdown().await;
}

/// WHAT: Deleting the current take rebinds playback to the previous one
/// WHY: History behaves as a stack
#[tokio::test]
async fn given_two_takes_when_deleting_then_previous_bound() {
    // Given: Two takes
    let rig = Rig::start();
    let first = rig.record_take(SHORT_TAKE).await;
    let take_a = first.takes[0].id;
    rig.record_take(SHORT_TAKE).await;

    // When: Deleting the current take
    rig.handle.delete().await.unwrap();
    let snapshot = rig
        .until(|s| s.takes.len() == 1 && s.bound_take == Some(take_a) && s.duration_seconds > 0.0)
        .await;

    // Then: A is current again and loaded a second time
    assert_eq!(snapshot.state, SessionState::Stopped);
    assert_eq!(rig.engine.loads(), 3);

    // And: Deleting the last take unbinds playback
    rig.handle.delete().await.unwrap();
    let snapshot = rig.until(|s| s.takes.is_empty()).await;
    assert_eq!(snapshot.state, SessionState::Idle);
    assert_eq!(snapshot.bound_take, None);
    assert_eq!(snapshot.playback, PlaybackStatus::Idle);

    rig.shutdown().await;
}

/// WHAT: History keeps at most the configured number of takes
/// WHY: The oldest take is evicted to bound memory
#[tokio::test]
async fn given_full_history_when_recording_then_oldest_evicted() {
    // Given: A full history
    let rig = Rig::start();
    let first = rig.record_take(Duration::from_millis(30)).await;
    let oldest = first.takes[0].id;
    for _ in 1..MAX_TAKES {
        rig.record_take(Duration::from_millis(30)).await;
    }

    // When: Recording one more
    let snapshot = rig.record_take(Duration::from_millis(30)).await;

    // Then: Still full, the oldest gone
    assert_eq!(snapshot.takes.len(), MAX_TAKES);
    assert!(snapshot.takes.iter().all(|t| t.id != oldest));

    rig.shutdown().await;
}
