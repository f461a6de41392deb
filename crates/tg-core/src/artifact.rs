//! Artifact resolution and content loading
//!
//! The engine queries the store once per artifact per run. "Not found" is a
//! first-class outcome that flows into verification, never an error.

use sha2::{Digest, Sha256};
use std::collections::BTreeMap;
use std::path::PathBuf;
use std::sync::mpsc;
use std::thread;
use std::time::Duration;

/// Outcome of one artifact content load
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LoadOutcome {
    Loaded(Vec<u8>),
    Missing,
    Unreadable(String),
    TimedOut,
}

impl LoadOutcome {
    pub fn is_loaded(&self) -> bool {
        matches!(self, LoadOutcome::Loaded(_))
    }
}

/// Lookup service mapping an artifact identifier to its current content
pub trait ArtifactStore: Send + Sync {
    fn load(&self, id: &str) -> LoadOutcome;
}

/// Filesystem-backed store rooted at a directory
///
/// The timeout bounds only the content read; checks themselves are bounded
/// by construction and run untimed.
pub struct FsArtifactStore {
    root: PathBuf,
    load_timeout: Duration,
}

impl FsArtifactStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self::with_timeout(root, Duration::from_millis(5_000))
    }

    pub fn with_timeout(root: impl Into<PathBuf>, load_timeout: Duration) -> Self {
        Self {
            root: root.into(),
            load_timeout,
        }
    }
}

impl ArtifactStore for FsArtifactStore {
    fn load(&self, id: &str) -> LoadOutcome {
        let path = self.root.join(id);
        if !path.is_file() {
            return LoadOutcome::Missing;
        }

        let (tx, rx) = mpsc::channel();
        thread::spawn(move || {
            let _ = tx.send(std::fs::read(&path));
        });

        match rx.recv_timeout(self.load_timeout) {
            Ok(Ok(data)) => LoadOutcome::Loaded(data),
            Ok(Err(e)) => LoadOutcome::Unreadable(e.to_string()),
            Err(_) => LoadOutcome::TimedOut,
        }
    }
}

/// In-memory store for tests and embedding
#[derive(Debug, Default)]
pub struct MemoryArtifactStore {
    files: BTreeMap<String, Vec<u8>>,
}

impl MemoryArtifactStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, id: impl Into<String>, content: impl Into<Vec<u8>>) {
        self.files.insert(id.into(), content.into());
    }
}

impl ArtifactStore for MemoryArtifactStore {
    fn load(&self, id: &str) -> LoadOutcome {
        match self.files.get(id) {
            Some(data) => LoadOutcome::Loaded(data.clone()),
            None => LoadOutcome::Missing,
        }
    }
}

/// SHA-256 hex digest of artifact content
pub fn content_hash(data: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(data);
    hex::encode(hasher.finalize())
}
