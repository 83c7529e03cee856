//! The stored session blob.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use sidetree_core::Index;

use crate::error::TransitionError;
use crate::state::State;

/// Where the session for one working directory lives.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Session {
    pub workdir: PathBuf,
    pub storage: PathBuf,
}

impl Session {
    pub fn new(workdir: PathBuf, storage: PathBuf) -> Self {
        Self { workdir, storage }
    }

    /// Blob location, keyed by a hash of the working directory.
    pub fn path(&self) -> PathBuf {
        let hash = blake3::hash(self.workdir.to_string_lossy().as_bytes());
        self.storage.join(format!("{}.json", hash.to_hex()))
    }
}

/// What survives a restart.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoredSession {
    pub index: Index,
    pub show_hidden: Option<bool>,
}

/// Read the stored session. Missing or undecodable blobs count as absent.
pub async fn load(session: &Session) -> Option<StoredSession> {
    let path = session.path();
    let loaded = tokio::task::spawn_blocking(move || {
        let bytes = std::fs::read(&path).ok()?;
        match serde_json::from_slice::<StoredSession>(&bytes) {
            Ok(stored) => Some(stored),
            Err(err) => {
                tracing::warn!(path = %path.display(), error = %err, "discarding stored session");
                None
            }
        }
    })
    .await;
    loaded.ok().flatten()
}

/// Write the index and hidden flag of `state` to its session blob.
pub async fn dump(state: &State) -> Result<(), TransitionError> {
    let stored = StoredSession {
        index: state.index.as_ref().clone(),
        show_hidden: Some(state.show_hidden),
    };
    let bytes = serde_json::to_vec_pretty(&stored)?;
    let path = state.session.path();

    tokio::task::spawn_blocking(move || -> Result<(), TransitionError> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(|source| TransitionError::Session {
                path: parent.to_path_buf(),
                source,
            })?;
        }
        std::fs::write(&path, bytes).map_err(|source| TransitionError::Session {
            path: path.clone(),
            source,
        })?;
        tracing::debug!(path = %path.display(), "session saved");
        Ok(())
    })
    .await
    .map_err(|e| TransitionError::Session {
        path: state.session.path(),
        source: std::io::Error::other(e.to_string()),
    })?
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_path_depends_on_workdir() {
        let a = Session::new(PathBuf::from("/a"), PathBuf::from("/s"));
        let b = Session::new(PathBuf::from("/b"), PathBuf::from("/s"));
        assert_ne!(a.path(), b.path());
        assert_eq!(a.path(), a.clone().path());
        assert!(a.path().starts_with("/s"));
    }

    #[tokio::test]
    async fn test_missing_and_corrupt_blobs_are_absent() {
        let temp = TempDir::new().unwrap();
        let session = Session::new(PathBuf::from("/w"), temp.path().to_path_buf());
        assert!(load(&session).await.is_none());

        std::fs::write(session.path(), b"{not json").unwrap();
        assert!(load(&session).await.is_none());
    }

    #[tokio::test]
    async fn test_load_reads_written_blob() {
        let temp = TempDir::new().unwrap();
        let session = Session::new(PathBuf::from("/w"), temp.path().to_path_buf());
        let stored = StoredSession {
            index: Index::from([PathBuf::from("/w/src")]),
            show_hidden: Some(true),
        };
        std::fs::write(session.path(), serde_json::to_vec(&stored).unwrap()).unwrap();

        assert_eq!(load(&session).await, Some(stored));
    }
}
