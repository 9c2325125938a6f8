pub mod analyze;
pub mod diff;
pub mod history;
pub mod plan;

use gcdelta_core::errors::DeltaError;
use gcdelta_core::RecordLayout;
use std::path::Path;

pub type CommandResult = Result<(), Box<dyn std::error::Error>>;

/// Layout from `--layout`, or the GenericCode default
pub fn load_layout(path: Option<&Path>) -> Result<RecordLayout, Box<dyn std::error::Error>> {
    match path {
        Some(path) => Ok(RecordLayout::load(path)?),
        None => Ok(RecordLayout::default()),
    }
}

pub fn read_text(path: &Path) -> Result<String, DeltaError> {
    std::fs::read_to_string(path).map_err(|e| DeltaError::Io {
        path: path.display().to_string(),
        message: e.to_string(),
    })
}

pub fn write_text(path: &Path, text: &str) -> Result<(), DeltaError> {
    std::fs::write(path, text).map_err(|e| DeltaError::Io {
        path: path.display().to_string(),
        message: e.to_string(),
    })
}
