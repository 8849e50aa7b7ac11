//! Artifact store
//!
//! Durable key to blob storage for the fitted scaler and the fitted cluster model. Keys are plain
//! file names. Typed artifacts are wrapped in a JSON envelope naming their kind and format
//! version, so a model is never read back as a scaler and an artifact written by an incompatible
//! release is rejected instead of misread.
use std::collections::HashMap;
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, PoisonError};

use clusterflow::Float;
use clusterflow_clustering::KMeans;
use clusterflow_preprocessing::FittedMinMaxScaler;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{PipelineError, Result};

/// Version of the envelope and payload layout written by [`save_artifact`]
pub const FORMAT_VERSION: u32 = 1;

/// Key to blob storage
///
/// `put` overwrites any previous value stored under the key, `get` returns exactly the bytes
/// last put and fails with [`PipelineError::ArtifactNotFound`] for a key never written.
pub trait ArtifactStore {
    fn put(&self, key: &str, bytes: &[u8]) -> Result<()>;

    fn get(&self, key: &str) -> Result<Vec<u8>>;
}

/// One file per key in a root directory
#[derive(Clone, Debug)]
pub struct FsArtifactStore {
    root: PathBuf,
}

impl FsArtifactStore {
    /// The directory is created on the first write
    pub fn new<P: Into<PathBuf>>(root: P) -> Self {
        FsArtifactStore { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn path(&self, key: &str) -> Result<PathBuf> {
        let is_file_name = Path::new(key).file_name().map_or(false, |name| name == key);
        if is_file_name && key != "." && key != ".." {
            Ok(self.root.join(key))
        } else {
            Err(PipelineError::InvalidKey(key.to_string()))
        }
    }
}

impl ArtifactStore for FsArtifactStore {
    fn put(&self, key: &str, bytes: &[u8]) -> Result<()> {
        let path = self.path(key)?;
        fs::create_dir_all(&self.root)?;

        // a reader never sees a partially written artifact
        let partial = self.root.join(format!(".{}.partial", key));
        fs::write(&partial, bytes)?;
        fs::rename(&partial, &path)?;

        debug!(key, path = %path.display(), bytes = bytes.len(), "stored artifact");
        Ok(())
    }

    fn get(&self, key: &str) -> Result<Vec<u8>> {
        let path = self.path(key)?;
        fs::read(&path).map_err(|err| match err.kind() {
            ErrorKind::NotFound => PipelineError::ArtifactNotFound(key.to_string()),
            _ => PipelineError::Io(err),
        })
    }
}

/// In-process store, used by tests and by single process runs
#[derive(Debug, Default)]
pub struct MemoryArtifactStore {
    blobs: Mutex<HashMap<String, Vec<u8>>>,
}

impl MemoryArtifactStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Keys currently stored, sorted
    pub fn keys(&self) -> Vec<String> {
        let blobs = self.blobs.lock().unwrap_or_else(PoisonError::into_inner);
        let mut keys = blobs.keys().cloned().collect::<Vec<_>>();
        keys.sort();
        keys
    }
}

impl ArtifactStore for MemoryArtifactStore {
    fn put(&self, key: &str, bytes: &[u8]) -> Result<()> {
        self.blobs
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(key.to_string(), bytes.to_vec());
        Ok(())
    }

    fn get(&self, key: &str) -> Result<Vec<u8>> {
        self.blobs
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .get(key)
            .cloned()
            .ok_or_else(|| PipelineError::ArtifactNotFound(key.to_string()))
    }
}

/// A fitted object which can be committed to an [`ArtifactStore`]
pub trait Artifact: Serialize + DeserializeOwned {
    /// Name of the artifact kind, written in the envelope
    const KIND: &'static str;
}

impl<F: Float + Serialize + DeserializeOwned> Artifact for FittedMinMaxScaler<F> {
    const KIND: &'static str = "scaler";
}

impl<F: Float + Serialize + DeserializeOwned> Artifact for KMeans<F> {
    const KIND: &'static str = "cluster_model";
}

#[derive(Serialize, Deserialize)]
struct Envelope<T> {
    kind: String,
    format_version: u32,
    payload: T,
}

/// Serialize `artifact` in its envelope and store it under `key`
pub fn save_artifact<T: Artifact>(
    store: &dyn ArtifactStore,
    key: &str,
    artifact: &T,
) -> Result<()> {
    let envelope = Envelope {
        kind: T::KIND.to_string(),
        format_version: FORMAT_VERSION,
        payload: artifact,
    };
    let bytes = serde_json::to_vec(&envelope)?;
    store.put(key, &bytes)
}

/// Load the artifact stored under `key`, checking its kind and format version
pub fn load_artifact<T: Artifact>(store: &dyn ArtifactStore, key: &str) -> Result<T> {
    let bytes = store.get(key)?;
    let envelope: Envelope<serde_json::Value> = serde_json::from_slice(&bytes)?;

    if envelope.kind != T::KIND {
        return Err(PipelineError::ArtifactKind {
            key: key.to_string(),
            expected: T::KIND.to_string(),
            found: envelope.kind,
        });
    }
    if envelope.format_version != FORMAT_VERSION {
        return Err(PipelineError::ArtifactVersion {
            key: key.to_string(),
            found: envelope.format_version,
            supported: FORMAT_VERSION,
        });
    }

    Ok(serde_json::from_value(envelope.payload)?)
}
