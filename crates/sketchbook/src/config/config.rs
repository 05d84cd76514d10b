//! Configuration management for sketchbook.
//!
//! Handles loading and saving TOML configuration files with cross-platform
//! paths, serde defaults for every field, and atomic write operations.

use crate::{
    AppError, AppResult,
    config::{
        AudioConfig, CONFIG_FILE_NAME, DEFAULT_SNAPSHOT_DIR_NAME, SessionSection, SnapshotConfig,
        WaveformSection,
    },
};

use sketchbook_core::SessionConfig;

use std::{
    fs,
    io::Write,
    panic::Location,
    path::{Path, PathBuf},
    time::Duration,
};

use directories::ProjectDirs;
use error_location::ErrorLocation;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, instrument};

/// Main configuration struct.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Config {
    /// Audio device configuration.
    #[serde(default)]
    pub audio: AudioConfig,
    /// Session timings and history size.
    #[serde(default)]
    pub session: SessionSection,
    /// Live waveform settings.
    #[serde(default)]
    pub waveform: WaveformSection,
    /// Snapshot export settings.
    #[serde(default)]
    pub snapshot: SnapshotConfig,
}

impl Config {
    /// Load configuration from the platform config dir, creating a default
    /// file if none exists.
    #[track_caller]
    #[instrument]
    pub fn load() -> AppResult<Self> {
        let config_path = Self::config_path()?;

        if config_path.exists() {
            Self::load_from(&config_path)
        } else {
            info!("No config found, creating default");
            let config = Self::default();
            config.save()?;
            Ok(config)
        }
    }

    /// Load configuration from `path`. Missing fields take their defaults.
    #[track_caller]
    #[instrument]
    pub fn load_from(path: &Path) -> AppResult<Self> {
        let contents = fs::read_to_string(path).map_err(|e| AppError::ConfigError {
            reason: format!("Failed to read config: {}", e),
            location: ErrorLocation::from(Location::caller()),
        })?;

        let config: Config = toml::from_str(&contents).map_err(|e| AppError::ConfigError {
            reason: format!("Failed to parse config: {}", e),
            location: ErrorLocation::from(Location::caller()),
        })?;

        info!(config_path = ?path, "Configuration loaded");

        Ok(config)
    }

    /// Save configuration to the platform config dir.
    #[track_caller]
    #[instrument(skip(self))]
    pub fn save(&self) -> AppResult<()> {
        let config_path = Self::config_path()?;
        self.save_to(&config_path)
    }

    /// Save configuration to `path` using atomic write pattern.
    ///
    /// Writes to a temporary file first, then renames to prevent corruption
    /// if the process crashes during the write.
    #[track_caller]
    #[instrument(skip(self))]
    pub fn save_to(&self, path: &Path) -> AppResult<()> {
        let contents = toml::to_string_pretty(self).map_err(|e| AppError::ConfigError {
            reason: format!("Failed to serialize config: {}", e),
            location: ErrorLocation::from(Location::caller()),
        })?;

        let temp_path = path.with_extension("toml.tmp");

        let mut temp_file = fs::File::create(&temp_path).map_err(|e| AppError::ConfigError {
            reason: format!("Failed to create temp config file: {}", e),
            location: ErrorLocation::from(Location::caller()),
        })?;

        temp_file
            .write_all(contents.as_bytes())
            .map_err(|e| AppError::ConfigError {
                reason: format!("Failed to write temp config file: {}", e),
                location: ErrorLocation::from(Location::caller()),
            })?;

        temp_file.sync_all().map_err(|e| AppError::ConfigError {
            reason: format!("Failed to sync temp config file: {}", e),
            location: ErrorLocation::from(Location::caller()),
        })?;

        fs::rename(&temp_path, path).map_err(|e| AppError::ConfigError {
            reason: format!("Failed to rename temp config to final: {}", e),
            location: ErrorLocation::from(Location::caller()),
        })?;

        info!(config_path = ?path, "Configuration saved (atomic write)");

        Ok(())
    }

    /// Controller configuration built from the `[session]` and `[waveform]`
    /// sections.
    ///
    /// # Errors
    ///
    /// `ConfigError` when the waveform colours do not parse.
    #[track_caller]
    pub fn session_config(&self) -> AppResult<SessionConfig> {
        let session = &self.session;

        Ok(SessionConfig {
            max_takes: session.max_takes,
            arm_delay: Duration::from_millis(session.arm_delay_ms),
            restart_settle: Duration::from_millis(session.restart_settle_ms),
            record_tick: Duration::from_millis(session.record_tick_ms),
            playback_tick: Duration::from_millis(session.playback_tick_ms),
            frame_interval: Duration::from_millis(session.frame_interval_ms),
            waveform: self.waveform.to_waveform_config()?,
        })
    }

    /// Directory exported snapshots are written to, created if missing.
    #[track_caller]
    pub fn snapshot_dir(&self) -> AppResult<PathBuf> {
        let dir = match &self.snapshot.directory {
            Some(dir) => dir.clone(),
            None => Self::project_dirs()?
                .data_dir()
                .join(DEFAULT_SNAPSHOT_DIR_NAME),
        };

        if !dir.exists() {
            fs::create_dir_all(&dir)?;
            debug!(snapshot_dir = ?dir, "Created snapshot directory");
        }

        Ok(dir)
    }

    #[track_caller]
    fn config_path() -> AppResult<PathBuf> {
        let proj_dirs = Self::project_dirs()?;
        let config_dir = proj_dirs.config_dir();

        if !config_dir.exists() {
            fs::create_dir_all(config_dir)?;
            debug!(config_dir = ?config_dir, "Created config directory");
        }

        Ok(config_dir.join(CONFIG_FILE_NAME))
    }

    #[track_caller]
    fn project_dirs() -> AppResult<ProjectDirs> {
        ProjectDirs::from("com", "sketchbook", "Sketchbook").ok_or_else(|| {
            AppError::ConfigError {
                reason: "Failed to get project directories".to_string(),
                location: ErrorLocation::from(Location::caller()),
            }
        })
    }
}
