// Index snapshots: gzip JSON payload plus a checksummed manifest
use atomicwrites::{AtomicFile, OverwriteBehavior};
use chrono::{DateTime, Utc};
use flate2::read::GzDecoder;
use flate2::write::GzEncoder;
use flate2::Compression;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::fmt::Display;
use std::fs;
use std::io::{Read, Write};
use std::path::Path;
use tabvec_core::{Error, Result};
use tabvec_index::{FlatIndex, VectorIndex};
use tracing::{debug, info};

pub const INDEX_FILE: &str = "index.json.gz";
pub const MANIFEST_FILE: &str = "manifest.json";
pub const FORMAT_VERSION: u32 = 1;

/// Persists an index at a location and reads it back
pub trait IndexStore {
    type Index: VectorIndex;

    fn save(&self, index: &Self::Index, location: &Path) -> Result<SnapshotManifest>;

    fn load(&self, location: &Path) -> Result<Self::Index>;
}

/// Describes a saved index; written next to the payload
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SnapshotManifest {
    pub format_version: u32,
    pub model_id: String,
    pub dimension: usize,
    pub document_count: usize,
    /// sha256 of the gzip payload, lowercase hex
    pub checksum: String,
    pub created_at: DateTime<Utc>,
}

/// Stores a [`FlatIndex`] as a directory holding `index.json.gz` and
/// `manifest.json`. Both files are replaced atomically.
#[derive(Debug, Clone)]
pub struct SnapshotStore {
    compression: Compression,
}

impl Default for SnapshotStore {
    fn default() -> Self {
        Self {
            compression: Compression::default(),
        }
    }
}

impl SnapshotStore {
    pub fn new(compression: Compression) -> Self {
        Self { compression }
    }

    pub fn read_manifest(&self, location: &Path) -> Result<SnapshotManifest> {
        let path = location.join(MANIFEST_FILE);
        let data = fs::read(&path).map_err(persistence(&path))?;
        let manifest: SnapshotManifest = serde_json::from_slice(&data).map_err(persistence(&path))?;
        if manifest.format_version != FORMAT_VERSION {
            return Err(Error::Persistence(format!(
                "unsupported snapshot format {} (expected {})",
                manifest.format_version, FORMAT_VERSION
            )));
        }
        Ok(manifest)
    }
}

impl IndexStore for SnapshotStore {
    type Index = FlatIndex;

    fn save(&self, index: &FlatIndex, location: &Path) -> Result<SnapshotManifest> {
        fs::create_dir_all(location).map_err(persistence(location))?;

        let json = serde_json::to_vec(index).map_err(|e| Error::Persistence(e.to_string()))?;
        let mut encoder = GzEncoder::new(Vec::new(), self.compression);
        encoder.write_all(&json)?;
        let payload = encoder.finish()?;

        let manifest = SnapshotManifest {
            format_version: FORMAT_VERSION,
            model_id: index.model_id().to_string(),
            dimension: index.dimension(),
            document_count: index.len(),
            checksum: format!("{:x}", Sha256::digest(&payload)),
            created_at: Utc::now(),
        };
        let manifest_json =
            serde_json::to_vec_pretty(&manifest).map_err(|e| Error::Persistence(e.to_string()))?;

        write_atomic(&location.join(INDEX_FILE), &payload)?;
        write_atomic(&location.join(MANIFEST_FILE), &manifest_json)?;

        info!(
            "saved {} documents to {} ({} bytes compressed)",
            manifest.document_count,
            location.display(),
            payload.len()
        );
        Ok(manifest)
    }

    fn load(&self, location: &Path) -> Result<FlatIndex> {
        let manifest = self.read_manifest(location)?;

        let path = location.join(INDEX_FILE);
        let payload = fs::read(&path).map_err(persistence(&path))?;
        let checksum = format!("{:x}", Sha256::digest(&payload));
        if checksum != manifest.checksum {
            return Err(Error::Persistence(format!(
                "checksum mismatch for {}: manifest {}, file {}",
                path.display(),
                manifest.checksum,
                checksum
            )));
        }

        let mut json = Vec::new();
        GzDecoder::new(payload.as_slice())
            .read_to_end(&mut json)
            .map_err(persistence(&path))?;
        let index: FlatIndex = serde_json::from_slice(&json).map_err(persistence(&path))?;
        index.check_entries().map_err(persistence(&path))?;

        if index.len() != manifest.document_count
            || index.dimension() != manifest.dimension
            || index.model_id() != manifest.model_id
        {
            return Err(Error::Persistence(format!(
                "{} does not match its manifest",
                path.display()
            )));
        }

        debug!("loaded {} documents from {}", index.len(), location.display());
        Ok(index)
    }
}

fn write_atomic(path: &Path, bytes: &[u8]) -> Result<()> {
    AtomicFile::new(path, OverwriteBehavior::AllowOverwrite)
        .write(|f| f.write_all(bytes))
        .map_err(persistence(path))
}

fn persistence<E: Display>(path: &Path) -> impl FnOnce(E) -> Error + '_ {
    move |e| Error::Persistence(format!("{}: {}", path.display(), e))
}
