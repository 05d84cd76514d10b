use crate::{
    FaultKind,
    audio::{CpalMicrophone, capture::classify_backend_error},
    device::{AnalysisTap, InputStream, Microphone},
};

use std::{thread::sleep, time::Duration};

const ANALYSIS_WINDOW: usize = 256;
const CAPTURE_TIME: Duration = Duration::from_millis(300);

/// WHAT: Permission-like backend text maps to PermissionDenied
/// WHY: Backends report refusals as free-form text; the banner depends on the category
#[test]
fn given_permission_text_when_classifying_then_permission_denied() {
    // Given: Refusal messages in the shapes backends produce
    let messages = ["Permission denied (os error 13)", "Access DENIED by policy"];

    // When/Then: Each maps to the permission category
    for message in messages {
        let error = classify_backend_error(message.to_string());
        assert_eq!(error.kind(), FaultKind::PermissionDenied, "{message}");
    }
}

/// WHAT: Other backend text maps to a device error
/// WHY: Only genuine refusals should tell the user to check permissions
#[test]
fn given_unrelated_backend_text_when_classifying_then_device_error() {
    // Given: A backend failure unrelated to permissions
    let message = "The requested stream configuration is not supported".to_string();

    // When: Classifying it
    let error = classify_backend_error(message);

    // Then: It is a plain device error
    assert_eq!(error.kind(), FaultKind::Device);
}

/// WHAT: A real microphone buffers audio and releases it on close
/// WHY: Validates the cpal capture path end to end on hardware
#[test]
#[cfg_attr(not(feature = "integration-tests"), ignore)]
fn given_default_microphone_when_capturing_then_chunks_drained() {
    // Given: The default input device
    let microphone = CpalMicrophone::new(None);
    let mut stream = microphone.open().unwrap();

    // When: Capturing briefly
    sleep(CAPTURE_TIME);
    let chunks = stream.drain_chunks();
    stream.close();
    stream.close();

    // Then: Audio arrived in the reported format
    assert!(stream.format().sample_rate > 0);
    assert!(chunks.iter().map(|c| c.len()).sum::<usize>() > 0);
}

/// WHAT: A real analysis tap fills its window and survives repeated release
/// WHY: The waveform tears the tap down on every exit path
#[test]
#[cfg_attr(not(feature = "integration-tests"), ignore)]
fn given_default_microphone_when_tapping_then_window_filled_and_release_idempotent() {
    // Given: An analysis tap on the default device
    let microphone = CpalMicrophone::new(None);
    let mut tap = microphone.open_analysis(ANALYSIS_WINDOW).unwrap();
    sleep(CAPTURE_TIME);

    // When: Reading and releasing twice
    let mut window = vec![f32::NAN; ANALYSIS_WINDOW];
    tap.read_time_domain(&mut window);
    for _ in 0..2 {
        tap.disconnect();
        tap.stop_tracks();
        tap.close();
    }

    // Then: Every slot holds a finite sample
    assert!(window.iter().all(|s| s.is_finite()));
}
