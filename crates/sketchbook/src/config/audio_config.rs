use serde::{Deserialize, Serialize};

/// Audio device configuration.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AudioConfig {
    /// Input device name (None = host default device).
    #[serde(default)]
    pub input_device: Option<String>,
}
