use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};

use uuid::Uuid;

use crate::error::CaptureError;

/// Where finished animations are published. A reference stays valid until it
/// is revoked.
pub trait ArtifactStore {
    /// Store `bytes` and return a reference the user can open
    fn publish(&mut self, bytes: Vec<u8>) -> Result<String, CaptureError>;

    fn revoke(&mut self, reference: &str) -> Result<(), CaptureError>;
}

/// Writes each capture to `capture-<uuid>.gif` inside a directory
#[derive(Debug, Clone)]
pub struct FileArtifactStore {
    dir: PathBuf,
}

impl FileArtifactStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }
}

impl ArtifactStore for FileArtifactStore {
    fn publish(&mut self, bytes: Vec<u8>) -> Result<String, CaptureError> {
        fs::create_dir_all(&self.dir)?;
        let path = self.dir.join(format!("capture-{}.gif", Uuid::new_v4()));
        fs::write(&path, bytes)?;
        log::info!("Capture written to {}", path.display());
        Ok(path.display().to_string())
    }

    fn revoke(&mut self, reference: &str) -> Result<(), CaptureError> {
        let path = Path::new(reference);
        if !path.starts_with(&self.dir) {
            return Err(CaptureError::UnknownArtifact(reference.to_owned()));
        }
        match fs::remove_file(path) {
            Ok(()) => Ok(()),
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => {
                Err(CaptureError::UnknownArtifact(reference.to_owned()))
            }
            Err(err) => Err(err.into()),
        }
    }
}

/// Keeps captures in memory under `memory://capture-<uuid>` references
#[derive(Debug, Default)]
pub struct MemoryArtifactStore {
    artifacts: HashMap<String, Vec<u8>>,
}

impl MemoryArtifactStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, reference: &str) -> Option<&[u8]> {
        self.artifacts.get(reference).map(Vec::as_slice)
    }

    pub fn len(&self) -> usize {
        self.artifacts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.artifacts.is_empty()
    }
}

impl ArtifactStore for MemoryArtifactStore {
    fn publish(&mut self, bytes: Vec<u8>) -> Result<String, CaptureError> {
        let reference = format!("memory://capture-{}", Uuid::new_v4());
        self.artifacts.insert(reference.clone(), bytes);
        Ok(reference)
    }

    fn revoke(&mut self, reference: &str) -> Result<(), CaptureError> {
        self.artifacts
            .remove(reference)
            .map(|_| ())
            .ok_or_else(|| CaptureError::UnknownArtifact(reference.to_owned()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn memory_store_publish_and_revoke() {
        let mut store = MemoryArtifactStore::new();
        let reference = store.publish(b"GIF89a".to_vec()).unwrap();
        assert!(reference.starts_with("memory://capture-"));
        assert_eq!(store.get(&reference), Some(&b"GIF89a"[..]));

        store.revoke(&reference).unwrap();
        assert!(store.is_empty());
        assert!(matches!(
            store.revoke(&reference),
            Err(CaptureError::UnknownArtifact(_))
        ));
    }

    #[test]
    fn file_store_writes_and_removes() {
        let dir = std::env::temp_dir().join(format!("blob-paint-test-{}", Uuid::new_v4()));
        let mut store = FileArtifactStore::new(&dir);

        let reference = store.publish(vec![1, 2, 3]).unwrap();
        assert_eq!(fs::read(&reference).unwrap(), vec![1, 2, 3]);
        assert!(reference.ends_with(".gif"));

        store.revoke(&reference).unwrap();
        assert!(!Path::new(&reference).exists());

        let _ = fs::remove_dir_all(&dir);
    }

    #[test]
    fn file_store_rejects_foreign_paths() {
        let mut store = FileArtifactStore::new(std::env::temp_dir().join("blob-paint-none"));
        assert!(matches!(
            store.revoke("/etc/passwd"),
            Err(CaptureError::UnknownArtifact(_))
        ));
    }
}
