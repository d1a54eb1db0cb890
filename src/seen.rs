//! Tracking of links that have already been notified.
//!
//! [`NullRegistry`] is the stateless mode: nothing is ever seen and nothing
//! is remembered. [`FileRegistry`] keeps the set in a JSON file between runs.
//! The pipeline only talks to the [`SeenRegistry`] trait.

use std::collections::BTreeSet;
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use tracing::debug;

use crate::error::RegistryError;

pub trait SeenRegistry {
    fn contains(&self, link: &str) -> bool;

    /// Add links and persist. Called only after a confirmed send.
    fn record(&mut self, links: &[String]) -> Result<(), RegistryError>;
}

/// Always empty, discards writes.
#[derive(Debug, Default)]
pub struct NullRegistry;

impl SeenRegistry for NullRegistry {
    fn contains(&self, _link: &str) -> bool {
        false
    }

    fn record(&mut self, _links: &[String]) -> Result<(), RegistryError> {
        Ok(())
    }
}

/// Seen links stored as a sorted JSON array of strings.
#[derive(Debug)]
pub struct FileRegistry {
    path: PathBuf,
    links: BTreeSet<String>,
}

impl FileRegistry {
    /// Load the registry. A missing file is an empty registry; an unreadable
    /// or corrupt one is an error so it is never overwritten.
    pub fn open(path: impl Into<PathBuf>) -> Result<Self, RegistryError> {
        let path = path.into();
        let links = match fs::read(&path) {
            Ok(bytes) => {
                serde_json::from_slice(&bytes).map_err(|source| RegistryError::Corrupt {
                    path: path.display().to_string(),
                    source,
                })?
            }
            Err(e) if e.kind() == ErrorKind::NotFound => BTreeSet::new(),
            Err(source) => {
                return Err(RegistryError::Io {
                    path: path.display().to_string(),
                    source,
                })
            }
        };
        debug!(path = %path.display(), links = links.len(), "seen registry loaded");
        Ok(Self { path, links })
    }

    pub fn len(&self) -> usize {
        self.links.len()
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Write via a sibling temp file and rename, so a crash mid-write leaves
    /// the previous registry intact.
    fn persist(&self) -> Result<(), RegistryError> {
        let io_err = |source: std::io::Error| RegistryError::Io {
            path: self.path.display().to_string(),
            source,
        };

        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).map_err(io_err)?;
        }

        let json = serde_json::to_vec_pretty(&self.links).map_err(|e| RegistryError::Io {
            path: self.path.display().to_string(),
            source: e.into(),
        })?;

        let mut tmp = self.path.clone().into_os_string();
        tmp.push(".tmp");
        let tmp = PathBuf::from(tmp);
        fs::write(&tmp, json).map_err(io_err)?;
        fs::rename(&tmp, &self.path).map_err(io_err)
    }
}

impl SeenRegistry for FileRegistry {
    fn contains(&self, link: &str) -> bool {
        self.links.contains(link)
    }

    fn record(&mut self, links: &[String]) -> Result<(), RegistryError> {
        if links.is_empty() {
            return Ok(());
        }
        self.links.extend(links.iter().cloned());
        self.persist()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn null_registry_never_remembers() {
        let mut registry = NullRegistry;
        registry.record(&["https://x/1".to_string()]).unwrap();
        assert!(!registry.contains("https://x/1"));
    }

    #[test]
    fn missing_file_is_empty() {
        let dir = tempfile::tempdir().unwrap();
        let registry = FileRegistry::open(dir.path().join("seen.json")).unwrap();
        assert_eq!(registry.len(), 0);
        assert!(!registry.contains("https://x/1"));
    }

    #[test]
    fn record_persists_across_opens() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("state").join("seen.json");

        let mut registry = FileRegistry::open(&path).unwrap();
        registry
            .record(&["https://x/2".to_string(), "https://x/1".to_string()])
            .unwrap();

        let reopened = FileRegistry::open(&path).unwrap();
        assert_eq!(reopened.len(), 2);
        assert!(reopened.contains("https://x/1"));
        assert!(reopened.contains("https://x/2"));

        let stored: Vec<String> =
            serde_json::from_slice(&fs::read(&path).unwrap()).unwrap();
        assert_eq!(stored, ["https://x/1", "https://x/2"]);
    }

    #[test]
    fn corrupt_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("seen.json");
        fs::write(&path, "{not json").unwrap();
        assert!(matches!(
            FileRegistry::open(&path),
            Err(RegistryError::Corrupt { .. })
        ));
    }

    #[test]
    fn empty_record_does_not_create_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("seen.json");
        let mut registry = FileRegistry::open(&path).unwrap();
        registry.record(&[]).unwrap();
        assert!(!path.exists());
    }
}
