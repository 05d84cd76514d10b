pub(crate) mod capture;
mod player;
mod resampler;
mod wav;

pub use {
    capture::{CpalAnalysisTap, CpalInputStream, CpalMicrophone},
    player::{CpalPlaybackEngine, CpalPlayer},
    resampler::{Resampler, match_rate},
    wav::{WAV_MIME, WavEncoder, decode_mono, probe_duration},
};
