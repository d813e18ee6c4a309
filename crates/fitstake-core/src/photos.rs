//! Opaque photo storage.
//!
//! The core only moves references around; image bytes are never
//! inspected. References are relative file names scoped to the
//! participant, so a reference leaks nothing about the host layout.

use std::fs;
use std::io;
use std::path::PathBuf;

use uuid::Uuid;

/// Which of the four required angles a photo covers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PhotoSlot {
    Front,
    Left,
    Right,
    Back,
}

impl PhotoSlot {
    pub fn as_str(&self) -> &'static str {
        match self {
            PhotoSlot::Front => "front",
            PhotoSlot::Left => "left",
            PhotoSlot::Right => "right",
            PhotoSlot::Back => "back",
        }
    }
}

pub trait PhotoStore {
    /// Persist raw bytes, returning an opaque reference.
    fn save(&self, bytes: &[u8], participant_id: i64, slot: PhotoSlot) -> io::Result<String>;

    /// Fetch the bytes behind a previously returned reference.
    fn load(&self, reference: &str) -> io::Result<Vec<u8>>;
}

/// Photo store backed by a flat directory tree, one subdirectory per
/// participant.
pub struct FsPhotoStore {
    root: PathBuf,
}

impl FsPhotoStore {
    pub fn new(root: PathBuf) -> Self {
        Self { root }
    }

    fn resolve(&self, reference: &str) -> PathBuf {
        self.root.join(reference)
    }
}

impl PhotoStore for FsPhotoStore {
    fn save(&self, bytes: &[u8], participant_id: i64, slot: PhotoSlot) -> io::Result<String> {
        let dir = self.root.join(participant_id.to_string());
        fs::create_dir_all(&dir)?;
        let name = format!("{}-{}.jpg", slot.as_str(), Uuid::new_v4());
        fs::write(dir.join(&name), bytes)?;
        Ok(format!("{participant_id}/{name}"))
    }

    fn load(&self, reference: &str) -> io::Result<Vec<u8>> {
        fs::read(self.resolve(reference))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn save_load_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let store = FsPhotoStore::new(dir.path().to_path_buf());
        let reference = store.save(b"jpeg bytes", 7, PhotoSlot::Front).unwrap();
        assert!(reference.starts_with("7/front-"));
        assert_eq!(store.load(&reference).unwrap(), b"jpeg bytes");
    }

    #[test]
    fn references_are_unique_per_save() {
        let dir = tempfile::tempdir().unwrap();
        let store = FsPhotoStore::new(dir.path().to_path_buf());
        let a = store.save(b"a", 7, PhotoSlot::Back).unwrap();
        let b = store.save(b"b", 7, PhotoSlot::Back).unwrap();
        assert_ne!(a, b);
        assert_eq!(store.load(&a).unwrap(), b"a");
        assert_eq!(store.load(&b).unwrap(), b"b");
    }
}
