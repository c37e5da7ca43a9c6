//! Where settings live between runs.

use std::path::{Path, PathBuf};

use tracing::info;

use crate::settings::Settings;
use crate::{SettingsResult, load_or_default, save};

pub const DEFAULT_FILE_NAME: &str = "pumplab.ini";

/// Owner of the current settings that can persist them.
pub trait SettingsStore {
    fn settings(&self) -> &Settings;
    fn settings_mut(&mut self) -> &mut Settings;
    /// Write the current settings out.
    fn persist(&mut self) -> SettingsResult<()>;
}

/// Settings backed by a file on disk.
#[derive(Debug, Clone)]
pub struct SettingsFile {
    path: PathBuf,
    settings: Settings,
}

impl SettingsFile {
    /// Open `path`, creating it with defaults when it does not exist yet.
    pub fn open(path: impl Into<PathBuf>) -> SettingsResult<Self> {
        let path = path.into();
        let settings = load_or_default(&path)?;
        Ok(Self { path, settings })
    }

    /// `$HOME/pumplab.ini`, or the working directory when no home is set.
    pub fn default_path() -> PathBuf {
        std::env::var_os("HOME")
            .or_else(|| std::env::var_os("USERPROFILE"))
            .map(PathBuf::from)
            .unwrap_or_default()
            .join(DEFAULT_FILE_NAME)
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn reset_to_defaults(&mut self) -> SettingsResult<()> {
        self.settings = Settings::default();
        info!(path = %self.path.display(), "settings reset to defaults");
        self.persist()
    }
}

impl SettingsStore for SettingsFile {
    fn settings(&self) -> &Settings {
        &self.settings
    }

    fn settings_mut(&mut self) -> &mut Settings {
        &mut self.settings
    }

    fn persist(&mut self) -> SettingsResult<()> {
        save(&self.path, &self.settings)
    }
}

/// Settings kept in memory only; counts how often they were persisted.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    pub settings: Settings,
    pub persist_count: usize,
}

impl SettingsStore for MemoryStore {
    fn settings(&self) -> &Settings {
        &self.settings
    }

    fn settings_mut(&mut self) -> &mut Settings {
        &mut self.settings
    }

    fn persist(&mut self) -> SettingsResult<()> {
        self.persist_count += 1;
        Ok(())
    }
}
