//! pl-dataset: the recorded bench data and its validation.
//!
//! A dataset directory holds one file per part (`controls`, `states`,
//! `tutorial`, `equipment` and the optional `pump_curve`), each as JSON or
//! YAML. Loading is all-or-nothing: a missing or unreadable part is fatal.

pub mod schema;
pub mod validate;

use std::path::{Path, PathBuf};

use serde::de::DeserializeOwned;
use tracing::{debug, info};

pub use schema::*;
pub use validate::{ValidationError, check_table_order, validate_dataset};

pub type DatasetResult<T> = Result<T, DatasetError>;

#[derive(thiserror::Error, Debug)]
pub enum DatasetError {
    #[error("Missing data file: {path}")]
    MissingDataFile {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse {path}: {message}")]
    Parse { path: PathBuf, message: String },

    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),
}

const EXTENSIONS: [&str; 3] = ["json", "yaml", "yml"];

/// Load and validate every part of the dataset in `dir`.
pub fn load_dataset(dir: &Path) -> DatasetResult<Dataset> {
    let controls: ControlsDef = load_part(dir, "controls")?;
    let states: Vec<StateRecord> = load_part(dir, "states")?;
    let tutorial: Vec<TutorialStep> = load_part(dir, "tutorial")?;
    let equipment: Vec<EquipmentTable> = load_part(dir, "equipment")?;
    let pump_curve: PumpCurve = load_optional_part(dir, "pump_curve")?.unwrap_or_default();

    let dataset = Dataset {
        controls,
        states,
        tutorial,
        equipment,
        pump_curve,
    };
    validate_dataset(&dataset)?;

    info!(
        dir = %dir.display(),
        controls = dataset.controls.controls.len(),
        states = dataset.states.len(),
        "dataset loaded"
    );
    Ok(dataset)
}

fn find_part(dir: &Path, stem: &str) -> Option<PathBuf> {
    EXTENSIONS
        .iter()
        .map(|ext| dir.join(format!("{stem}.{ext}")))
        .find(|path| path.is_file())
}

fn load_part<T: DeserializeOwned>(dir: &Path, stem: &str) -> DatasetResult<T> {
    match find_part(dir, stem) {
        Some(path) => read_part(&path),
        None => Err(DatasetError::MissingDataFile {
            path: dir.join(format!("{stem}.json")),
            source: std::io::Error::new(std::io::ErrorKind::NotFound, "no JSON or YAML file"),
        }),
    }
}

fn load_optional_part<T: DeserializeOwned>(dir: &Path, stem: &str) -> DatasetResult<Option<T>> {
    match find_part(dir, stem) {
        Some(path) => read_part(&path).map(Some),
        None => {
            debug!(stem, "optional dataset part absent");
            Ok(None)
        }
    }
}

fn read_part<T: DeserializeOwned>(path: &Path) -> DatasetResult<T> {
    let content = std::fs::read_to_string(path).map_err(|source| DatasetError::MissingDataFile {
        path: path.to_path_buf(),
        source,
    })?;

    let is_json = path.extension().and_then(|e| e.to_str()) == Some("json");
    let parsed = if is_json {
        serde_json::from_str(&content).map_err(|e| e.to_string())
    } else {
        serde_yaml::from_str(&content).map_err(|e| e.to_string())
    };
    parsed.map_err(|message| DatasetError::Parse {
        path: path.to_path_buf(),
        message,
    })
}
