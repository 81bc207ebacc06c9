//! On-disk index format: a 4-byte magic, the BLAKE3 digest of the payload,
//! then a bincode payload carrying a format version, the header and every
//! (chunk, vector) pair in build order.
use std::fs;
use std::io::{ErrorKind, Write};
use std::path::Path;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tempfile::NamedTempFile;
use tracing::info;

use docqa_core::traits::Embedder;
use docqa_core::types::Chunk;
use docqa_core::{Error, Result};

use crate::index::{Entry, IndexHeader, VectorIndex};

const MAGIC: &[u8; 4] = b"DQIX";
const FORMAT_VERSION: u32 = 1;
const DIGEST_LEN: usize = 32;

#[derive(Serialize)]
struct PersistedRef<'a> {
    version: u32,
    header: &'a IndexHeader,
    entries: Vec<(&'a Chunk, &'a [f32])>,
}

#[derive(Deserialize)]
struct Persisted {
    version: u32,
    header: IndexHeader,
    entries: Vec<(Chunk, Vec<f32>)>,
}

impl VectorIndex {
    /// Write the index to `path` atomically: the blob is written to a
    /// temporary file next to `path` and renamed into place.
    pub fn persist(&self, path: &Path) -> Result<()> {
        let dir = match path.parent() {
            Some(p) if !p.as_os_str().is_empty() => p,
            _ => Path::new("."),
        };
        fs::create_dir_all(dir)?;

        let persisted = PersistedRef {
            version: FORMAT_VERSION,
            header: &self.header,
            entries: self.entries.iter().map(|e| (&e.chunk, e.vector.as_slice())).collect(),
        };
        let payload = bincode::serde::encode_to_vec(&persisted, bincode::config::standard())
            .map_err(|e| Error::Operation(format!("failed to encode index: {e}")))?;
        let digest = blake3::hash(&payload);

        let mut tmp = NamedTempFile::new_in(dir)?;
        tmp.write_all(MAGIC)?;
        tmp.write_all(digest.as_bytes())?;
        tmp.write_all(&payload)?;
        tmp.as_file().sync_all()?;
        tmp.persist(path).map_err(|e| Error::Io(e.error))?;
        info!(path = %path.display(), chunks = self.len(), bytes = payload.len(), "index persisted");
        Ok(())
    }

    /// Load a persisted index for use with `embedder`. The stored dimension
    /// is checked before the stored model id.
    pub fn load(path: &Path, embedder: Arc<dyn Embedder>) -> Result<Self> {
        let persisted = read_persisted(path)?;
        let header = persisted.header;
        if header.dim != embedder.dim() {
            return Err(Error::DimensionMismatch { index: header.dim, provider: embedder.dim() });
        }
        if header.embedder_id != embedder.model_id() {
            return Err(Error::ModelMismatch {
                index: header.embedder_id,
                provider: embedder.model_id().to_string(),
            });
        }
        let entries: Vec<Entry> = persisted.entries.into_iter().map(|(c, v)| Entry::new(c, v)).collect();
        info!(path = %path.display(), chunks = entries.len(), model = %header.embedder_id, "index loaded");
        Ok(Self::from_parts(header, entries, embedder))
    }

    /// Read only the header of a persisted index (no provider required).
    pub fn read_header(path: &Path) -> Result<IndexHeader> {
        read_persisted(path).map(|p| p.header)
    }
}

fn read_persisted(path: &Path) -> Result<Persisted> {
    let bytes = match fs::read(path) {
        Ok(b) => b,
        Err(e) if e.kind() == ErrorKind::NotFound => {
            return Err(Error::NotFound(format!("index file {}", path.display())));
        }
        Err(source) => return Err(Error::Read { path: path.to_path_buf(), source }),
    };
    let payload = verify(&bytes)?;
    let (persisted, _): (Persisted, usize) = bincode::serde::decode_from_slice(payload, bincode::config::standard())
        .map_err(|e| Error::corrupt(format!("undecodable payload: {e}")))?;
    if persisted.version != FORMAT_VERSION {
        return Err(Error::corrupt(format!(
            "unsupported format version {} (expected {})",
            persisted.version, FORMAT_VERSION
        )));
    }
    let header = &persisted.header;
    if persisted.entries.len() != header.chunk_count {
        return Err(Error::corrupt(format!(
            "header lists {} chunks, payload holds {}",
            header.chunk_count,
            persisted.entries.len()
        )));
    }
    if let Some((chunk, v)) = persisted.entries.iter().find(|(_, v)| v.len() != header.dim) {
        return Err(Error::corrupt(format!("vector for {} has {} values, expected {}", chunk.id, v.len(), header.dim)));
    }
    Ok(persisted)
}

/// Check magic and digest, returning the payload slice.
fn verify(bytes: &[u8]) -> Result<&[u8]> {
    let prefix = MAGIC.len() + DIGEST_LEN;
    if bytes.len() < prefix || &bytes[..MAGIC.len()] != MAGIC {
        return Err(Error::corrupt("not an index file"));
    }
    let mut stored = [0u8; DIGEST_LEN];
    stored.copy_from_slice(&bytes[MAGIC.len()..prefix]);
    let payload = &bytes[prefix..];
    if blake3::hash(payload) != blake3::Hash::from(stored) {
        return Err(Error::corrupt("checksum mismatch"));
    }
    Ok(payload)
}
