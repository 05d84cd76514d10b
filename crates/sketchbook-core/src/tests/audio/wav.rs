use crate::{
    FaultKind, WAV_MIME, WavEncoder,
    audio::{decode_mono, probe_duration},
    device::{AudioChunk, Encoder, StreamFormat},
    take::EncodedAudio,
};

const SAMPLE_RATE: u32 = 8000;
const DURATION_TOLERANCE: f64 = 1e-6;

fn mono() -> StreamFormat {
    StreamFormat {
        sample_rate: SAMPLE_RATE,
        channels: 1,
    }
}

/// WHAT: Finalized WAV reports the captured duration
/// WHY: The transport shows the probed duration of every take
#[test]
fn given_two_seconds_of_chunks_when_finalizing_then_probe_reports_two_seconds() {
    // Given: Two seconds of mono audio split over several chunks
    let chunks: Vec<AudioChunk> = (0..4)
        .map(|_| AudioChunk::new(vec![0.25; SAMPLE_RATE as usize / 2]))
        .collect();

    // When: Finalizing and probing
    let audio = WavEncoder.finalize(mono(), chunks).unwrap();
    let duration = probe_duration(&audio).unwrap();

    // Then: Duration matches and the mime tag is set
    assert!((duration - 2.0).abs() < DURATION_TOLERANCE, "got {duration}");
    assert_eq!(audio.mime(), WAV_MIME);
}

/// WHAT: Finalizing nothing fails with an encode error
/// WHY: A failed finalize must never produce a zero-length take
#[test]
fn given_no_samples_when_finalizing_then_encode_error() {
    // Given: Only empty chunks
    let chunks = vec![AudioChunk::default(), AudioChunk::default()];

    // When: Finalizing
    let result = WavEncoder.finalize(mono(), chunks);

    // Then: Encode error
    assert_eq!(result.unwrap_err().kind(), FaultKind::Encode);
}

/// WHAT: A trailing partial frame is dropped
/// WHY: Interleaved streams can be cut mid-frame when capture stops
#[test]
fn given_stereo_with_partial_frame_when_finalizing_then_whole_frames_kept() {
    // Given: Five stereo samples (two frames plus one stray)
    let format = StreamFormat {
        sample_rate: SAMPLE_RATE,
        channels: 2,
    };
    let chunks = vec![AudioChunk::new(vec![0.5, -0.5, 0.5, -0.5, 0.9])];

    // When: Finalizing and decoding to mono
    let audio = WavEncoder.finalize(format, chunks).unwrap();
    let (samples, rate) = decode_mono(&audio).unwrap();

    // Then: Two frames remain, each averaged to silence
    assert_eq!(rate, SAMPLE_RATE);
    assert_eq!(samples.len(), 2);
    assert!(samples.iter().all(|s| s.abs() < 1e-3));
}

/// WHAT: Garbage bytes fail to probe with a decode error
/// WHY: Corrupt takes surface as DecodeError rather than a bogus duration
#[test]
fn given_corrupt_payload_when_probing_then_decode_error() {
    // Given: Bytes that are not WAV
    let audio = EncodedAudio::new(b"definitely not riff".to_vec(), WAV_MIME);

    // When: Probing and decoding
    let probed = probe_duration(&audio);
    let decoded = decode_mono(&audio);

    // Then: Both report decode errors
    assert_eq!(probed.unwrap_err().kind(), FaultKind::Decode);
    assert_eq!(decoded.unwrap_err().kind(), FaultKind::Decode);
}
