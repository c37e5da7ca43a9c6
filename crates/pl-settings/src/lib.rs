//! pl-settings: user preferences stored as a flat `key = value` file.
//!
//! Contains:
//! - settings (typed options, tolerant parser, text form)
//! - store (the `SettingsStore` seam, file and in-memory stores)

pub mod settings;
pub mod store;

use std::path::Path;

use tracing::info;

pub use settings::{ButtonBackground, ButtonStyle, MAX_VOLUME, Settings, SkipReason};
pub use store::{MemoryStore, SettingsFile, SettingsStore};

pub type SettingsResult<T> = Result<T, SettingsError>;

#[derive(thiserror::Error, Debug)]
pub enum SettingsError {
    #[error("Settings file {path}: {source}")]
    Io {
        path: std::path::PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Read settings from `path`. A missing file yields the defaults, which are
/// written back so the next run finds a complete file.
pub fn load_or_default(path: &Path) -> SettingsResult<Settings> {
    match std::fs::read_to_string(path) {
        Ok(content) => Ok(Settings::parse(&content)),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            let settings = Settings::default();
            save(path, &settings)?;
            info!(path = %path.display(), "settings file created with defaults");
            Ok(settings)
        }
        Err(source) => Err(SettingsError::Io {
            path: path.to_path_buf(),
            source,
        }),
    }
}

pub fn save(path: &Path, settings: &Settings) -> SettingsResult<()> {
    std::fs::write(path, settings.to_file_string()).map_err(|source| SettingsError::Io {
        path: path.to_path_buf(),
        source,
    })
}
