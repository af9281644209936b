//! Single-slot store for the previous counter sample.
//!
//! One file per configuration instance lives in the scratch directory. Each run
//! reads the prior sample and overwrites it with the new one. The file is written
//! through a temporary file in the same directory and renamed into place, so a
//! reader never sees a half-written sample. Concurrent writers are not supported.

use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use tempfile::NamedTempFile;
use tracing::{debug, warn};

use super::model::Snapshot;

const FILE_PREFIX: &str = "monitor-pdns-auth";

/// Persisted prior sample for one configuration instance.
#[derive(Debug, Clone)]
pub struct SampleStore {
    dir: PathBuf,
    path: PathBuf,
}

impl SampleStore {
    /// Creates a store under `scratch_dir`. An empty `config_name` selects the
    /// default file, otherwise the name is appended to the file name so several
    /// instances on one host do not share a sample.
    pub fn new(scratch_dir: impl AsRef<Path>, config_name: &str) -> Self {
        let dir = scratch_dir.as_ref().to_path_buf();
        let file_name = if config_name.is_empty() {
            FILE_PREFIX.to_string()
        } else {
            format!("{}-{}", FILE_PREFIX, config_name)
        };
        let path = dir.join(file_name);
        Self { dir, path }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Loads the prior sample.
    ///
    /// Returns `None` when there is no usable sample: first run, unreadable file
    /// or a file this version cannot decode.
    pub fn load(&self) -> Option<Snapshot> {
        let data = match fs::read(&self.path) {
            Ok(data) => data,
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                debug!("no prior sample at {}", self.path.display());
                return None;
            }
            Err(e) => {
                warn!("failed to read prior sample {}: {}", self.path.display(), e);
                return None;
            }
        };

        match bincode::deserialize::<Snapshot>(&data) {
            Ok(snapshot) => {
                debug!(
                    "loaded prior sample: {} counters at epoch {}",
                    snapshot.len(),
                    snapshot.epoch
                );
                Some(snapshot)
            }
            Err(e) => {
                warn!("discarding corrupt sample {}: {}", self.path.display(), e);
                None
            }
        }
    }

    /// Replaces the stored sample with `snapshot`.
    pub fn save(&self, snapshot: &Snapshot) -> io::Result<()> {
        let encoded = bincode::serialize(snapshot).map_err(io::Error::other)?;

        let mut tmp = NamedTempFile::new_in(&self.dir)?;
        tmp.write_all(&encoded)?;
        tmp.as_file().sync_all()?;
        tmp.persist(&self.path).map_err(|e| e.error)?;

        debug!(
            "saved sample: {} counters at epoch {} to {}",
            snapshot.len(),
            snapshot.epoch,
            self.path.display()
        );
        Ok(())
    }
}
