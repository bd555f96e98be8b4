//! File-backed artifact store.
//!
//! Layout: `<root>/<year>/<kind>.json`. Writes go to a temporary sibling
//! first and are renamed into place, so a failed write never leaves a
//! truncated artifact behind. Floats are written with `serde_json`'s
//! round-trip formatting; a reload reproduces every value bit for bit.
use std::{
    fs::{self, File},
    io::{BufReader, BufWriter, Write},
    path::{Path, PathBuf},
};

use crate::{
    mrio::errors::{MrioError, MrioResult},
    store::artifact::{Artifact, ArtifactKind, ArtifactStore},
};

/// `JsonStore` — artifacts as JSON files under a data root.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JsonStore {
    root: PathBuf,
}

impl JsonStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        JsonStore { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Path of the artifact file for `(kind, year)`.
    pub fn path(&self, kind: ArtifactKind, year: u16) -> PathBuf {
        self.root.join(year.to_string()).join(format!("{}.json", kind.stem()))
    }
}

fn io_error(path: &Path, err: impl std::fmt::Display) -> MrioError {
    MrioError::Persistence { path: path.display().to_string(), text: err.to_string() }
}

impl ArtifactStore for JsonStore {
    fn save<A: Artifact>(&self, year: u16, artifact: &A) -> MrioResult<()> {
        let path = self.path(A::KIND, year);
        if let Some(dir) = path.parent() {
            fs::create_dir_all(dir).map_err(|e| io_error(dir, e))?;
        }
        let tmp = path.with_extension("json.tmp");
        let file = File::create(&tmp).map_err(|e| io_error(&tmp, e))?;
        let mut writer = BufWriter::new(file);
        serde_json::to_writer(&mut writer, artifact).map_err(|e| io_error(&tmp, e))?;
        writer.flush().map_err(|e| io_error(&tmp, e))?;
        drop(writer);
        fs::rename(&tmp, &path).map_err(|e| io_error(&path, e))?;
        log::debug!("Saved {} for {} to {}", A::KIND, year, path.display());
        Ok(())
    }

    fn load<A: Artifact>(&self, year: u16) -> MrioResult<A> {
        let path = self.path(A::KIND, year);
        let file = File::open(&path).map_err(|e| io_error(&path, e))?;
        let artifact: A = serde_json::from_reader(BufReader::new(file)).map_err(|e| io_error(&path, e))?;
        artifact.validate()?;
        log::debug!("Loaded {} for {} from {}", A::KIND, year, path.display());
        Ok(artifact)
    }

    fn contains(&self, kind: ArtifactKind, year: u16) -> bool {
        self.path(kind, year).is_file()
    }
}
