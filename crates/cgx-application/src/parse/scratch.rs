//! Scratch files for pipelined import.
//!
//! Chunk payloads are spilled to disk between worker completion and store
//! import so results do not pile up in memory while earlier imports are in
//! flight. Names follow `<prefix>-<epochMs>-<16hex>.json`, and the file is
//! removed on drop, including every error path.

use std::path::{Path, PathBuf};

use cgx_domain::error::{Error, Result};
use cgx_domain::ports::parser::ChunkParseOutput;
use rand::Rng;
use tracing::warn;

/// A self-deleting spill file holding one chunk payload.
pub struct ScratchFile {
    path: PathBuf,
}

impl ScratchFile {
    /// Serialise `output` into a fresh scratch file under `dir`.
    ///
    /// # Errors
    ///
    /// Fails when the file cannot be created or written.
    pub fn spill(dir: &Path, prefix: &str, output: &ChunkParseOutput) -> Result<Self> {
        let epoch_ms = chrono::Utc::now().timestamp_millis();
        let token: u64 = rand::rng().random();
        let path = dir.join(format!("{prefix}-{epoch_ms}-{token:016x}.json"));

        let payload = serde_json::to_vec(output)?;
        std::fs::write(&path, payload).map_err(|e| {
            Error::io_with_source(format!("Failed to write scratch file {}", path.display()), e)
        })?;
        Ok(Self { path })
    }

    /// Read the payload back.
    ///
    /// # Errors
    ///
    /// Fails when the file cannot be read or deserialised.
    pub fn load(&self) -> Result<ChunkParseOutput> {
        let bytes = std::fs::read(&self.path).map_err(|e| {
            Error::io_with_source(format!("Failed to read scratch file {}", self.path.display()), e)
        })?;
        Ok(serde_json::from_slice(&bytes)?)
    }

    /// Location of the spill file.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl Drop for ScratchFile {
    fn drop(&mut self) {
        if let Err(e) = std::fs::remove_file(&self.path) {
            if e.kind() != std::io::ErrorKind::NotFound {
                warn!(path = %self.path.display(), error = %e, "Failed to remove scratch file");
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use regex::Regex;

    #[test]
    fn name_format_and_round_trip() {
        let dir = tempfile::tempdir().expect("tempdir");
        let output = ChunkParseOutput {
            files_processed: 2,
            ..Default::default()
        };

        let scratch = ScratchFile::spill(dir.path(), "cgx-chunk", &output).expect("spill");
        let name = scratch
            .path()
            .file_name()
            .expect("file name")
            .to_string_lossy()
            .into_owned();
        let pattern = Regex::new(r"^cgx-chunk-\d+-[0-9a-f]{16}\.json$").expect("static pattern");
        assert!(pattern.is_match(&name), "unexpected name: {name}");

        let loaded = scratch.load().expect("load");
        assert_eq!(loaded.files_processed, 2);
    }

    #[test]
    fn file_is_removed_on_drop() {
        let dir = tempfile::tempdir().expect("tempdir");
        let output = ChunkParseOutput::default();
        let path = {
            let scratch = ScratchFile::spill(dir.path(), "cgx-chunk", &output).expect("spill");
            scratch.path().to_path_buf()
        };
        assert!(!path.exists(), "scratch file must be removed on drop");
    }
}
