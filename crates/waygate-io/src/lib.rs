//! Persistence backends for portal records.
#![forbid(unsafe_code)]

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use serde_json::Value;

pub const DOCUMENT_VERSION: u32 = 1;

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("i/o error on {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("malformed document {path}: {source}")]
    Malformed {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
    #[error("unsupported document version {found}")]
    Version { found: u32 },
}

/// Load-all / save-all surface over structured records.
///
/// Records are opaque here; decoding (and per-record failure isolation) is the
/// caller's job.
pub trait RecordStore {
    fn load_all(&self) -> Result<Vec<Value>, StoreError>;
    fn save_all(&mut self, records: &[Value]) -> Result<(), StoreError>;
}

#[derive(Serialize, Deserialize)]
struct Document {
    version: u32,
    #[serde(default)]
    records: Vec<Value>,
}

/// JSON document on disk. A missing file loads as empty.
#[derive(Debug, Clone)]
pub struct JsonFileStore {
    path: PathBuf,
}

impl JsonFileStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn io_err(&self, source: io::Error) -> StoreError {
        StoreError::Io {
            path: self.path.clone(),
            source,
        }
    }
}

impl RecordStore for JsonFileStore {
    fn load_all(&self) -> Result<Vec<Value>, StoreError> {
        let text = match fs::read_to_string(&self.path) {
            Ok(t) => t,
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                log::info!("no portal data at {}; starting empty", self.path.display());
                return Ok(Vec::new());
            }
            Err(e) => return Err(self.io_err(e)),
        };
        let doc: Document = serde_json::from_str(&text).map_err(|source| StoreError::Malformed {
            path: self.path.clone(),
            source,
        })?;
        if doc.version != DOCUMENT_VERSION {
            return Err(StoreError::Version { found: doc.version });
        }
        log::debug!("read {} record(s) from {}", doc.records.len(), self.path.display());
        Ok(doc.records)
    }

    fn save_all(&mut self, records: &[Value]) -> Result<(), StoreError> {
        let doc = Document {
            version: DOCUMENT_VERSION,
            records: records.to_vec(),
        };
        let text = serde_json::to_string_pretty(&doc).map_err(|source| StoreError::Malformed {
            path: self.path.clone(),
            source,
        })?;
        if let Some(dir) = self.path.parent().filter(|d| !d.as_os_str().is_empty()) {
            fs::create_dir_all(dir).map_err(|e| self.io_err(e))?;
        }
        // Write beside the target then rename so a crash never leaves a torn file.
        let tmp = self.path.with_extension("json.tmp");
        fs::write(&tmp, text).map_err(|e| self.io_err(e))?;
        fs::rename(&tmp, &self.path).map_err(|e| self.io_err(e))?;
        log::debug!("wrote {} record(s) to {}", records.len(), self.path.display());
        Ok(())
    }
}

/// Records held in memory; used by tests and embedding hosts.
#[derive(Debug, Default, Clone)]
pub struct MemoryStore {
    pub records: Vec<Value>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_records(records: Vec<Value>) -> Self {
        Self { records }
    }
}

impl RecordStore for MemoryStore {
    fn load_all(&self) -> Result<Vec<Value>, StoreError> {
        Ok(self.records.clone())
    }

    fn save_all(&mut self, records: &[Value]) -> Result<(), StoreError> {
        self.records = records.to_vec();
        Ok(())
    }
}
