//! Progress checkpoint for resuming a failed traversal.
//!
//! A failed run records the position it stopped at and the output file it
//! was appending to. `--resume` reads it back so the next run continues the
//! same file from the same article.

use crate::error::Result;
use crate::models::Position;
use chrono::Local;
use serde::{Deserialize, Serialize};
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use tracing::{info, instrument};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Checkpoint {
    pub position: Position,
    pub output: PathBuf,
    /// RFC 3339 local time the checkpoint was written.
    pub recorded_at: String,
}

impl Checkpoint {
    pub fn new(position: Position, output: impl Into<PathBuf>) -> Self {
        Self {
            position,
            output: output.into(),
            recorded_at: Local::now().to_rfc3339(),
        }
    }

    /// Write the checkpoint as pretty JSON, replacing any previous one.
    #[instrument(level = "info", skip_all, fields(path = %path.as_ref().display()))]
    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let json = serde_json::to_string_pretty(self)?;
        fs::write(path.as_ref(), json)?;
        info!(position = %self.position, "Saved checkpoint");
        Ok(())
    }

    /// Read a checkpoint, or `None` if the file does not exist.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Option<Self>> {
        match fs::read_to_string(path.as_ref()) {
            Ok(json) => Ok(Some(serde_json::from_str(&json)?)),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    /// Remove the checkpoint after a completed run. Missing files are fine.
    pub fn clear<P: AsRef<Path>>(path: P) -> Result<()> {
        match fs::remove_file(path.as_ref()) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }
}
