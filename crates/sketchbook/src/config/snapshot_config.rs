use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Waveform snapshot export configuration.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SnapshotConfig {
    /// Directory for exported PNGs (None = `snapshots` under the data dir).
    #[serde(default)]
    pub directory: Option<PathBuf>,
}
