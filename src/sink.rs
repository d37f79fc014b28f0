use std::fs;
use std::io::Write;
use std::path::Path;

use camino::{Utf8Path, Utf8PathBuf};
use tempfile::Builder;

use crate::error::PathogenError;

pub const TRIPLES_EXT: &str = "nt";

/// Flat output directory holding one `<run_accession>.nt` file per row.
#[derive(Debug, Clone)]
pub struct OutputSink {
    root: Utf8PathBuf,
}

impl OutputSink {
    pub fn new(root: impl AsRef<Path>) -> Result<Self, PathogenError> {
        let root = Utf8PathBuf::from_path_buf(root.as_ref().to_path_buf())
            .map_err(|_| PathogenError::Filesystem("output directory is not UTF-8".to_string()))?;
        Ok(Self { root })
    }

    pub fn root(&self) -> &Utf8Path {
        &self.root
    }

    /// `<root>/<run_accession>.nt`. The accession must be a plain file name.
    pub fn path_for(&self, run_accession: &str) -> Result<Utf8PathBuf, PathogenError> {
        let name = run_accession.trim();
        let unsafe_name = name.is_empty()
            || name == "."
            || name == ".."
            || name.contains(['/', '\\', '\0']);
        if unsafe_name {
            return Err(PathogenError::Filesystem(format!(
                "run accession `{run_accession}` is not a usable file name"
            )));
        }
        Ok(self.root.join(format!("{name}.{TRIPLES_EXT}")))
    }

    pub fn ensure_root(&self) -> Result<(), PathogenError> {
        fs::create_dir_all(self.root.as_std_path())
            .map_err(|err| PathogenError::Filesystem(err.to_string()))
    }

    pub fn exists(&self, path: &Utf8Path) -> bool {
        path.as_std_path().exists()
    }

    /// Writes through a temp file in the same directory, then renames over
    /// `path`.
    pub fn write_atomic(&self, path: &Utf8Path, content: &[u8]) -> Result<(), PathogenError> {
        let parent = path.parent().unwrap_or(&self.root);
        fs::create_dir_all(parent.as_std_path())
            .map_err(|err| PathogenError::Filesystem(err.to_string()))?;
        let mut temp = Builder::new()
            .prefix("pathogen-rdf")
            .suffix(".tmp")
            .tempfile_in(parent.as_std_path())
            .map_err(|err| PathogenError::Filesystem(err.to_string()))?;
        temp.write_all(content)
            .map_err(|err| PathogenError::Filesystem(err.to_string()))?;
        temp.persist(path.as_std_path())
            .map_err(|err| PathogenError::Filesystem(err.to_string()))?;
        Ok(())
    }
}
