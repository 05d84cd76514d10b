mod audio_config;
#[allow(clippy::module_inception)]
mod config;
mod session_config;
mod snapshot_config;
mod waveform_config;

pub(crate) use {
    audio_config::AudioConfig, config::Config, session_config::SessionSection,
    snapshot_config::SnapshotConfig, waveform_config::WaveformSection,
};

pub(crate) const CONFIG_FILE_NAME: &str = "config.toml";
pub(crate) const DEFAULT_SNAPSHOT_DIR_NAME: &str = "snapshots";
