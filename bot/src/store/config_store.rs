use std::collections::{BTreeMap, BTreeSet};
use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::sync::{Arc, PoisonError, RwLock};

use serde::{Deserialize, Serialize};
use tracing::{info, warn};

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("IO error on {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Access rule for one chat server. An empty channel set means every
/// channel of the server may use the command.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServerAccessRule {
    #[serde(default)]
    pub like_channels: BTreeSet<String>,
}

/// The persisted access configuration, keyed by server id.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConfigDocument {
    #[serde(default)]
    pub servers: BTreeMap<String, ServerAccessRule>,
}

/// JSON file backed store for [`ConfigDocument`].
///
/// Readers take a cheap [`Arc`] snapshot; writers replace the file atomically
/// (temp file + rename) before publishing the new document. One process owns
/// the file.
pub struct ConfigStore {
    path: PathBuf,
    current: RwLock<Arc<ConfigDocument>>,
}

impl ConfigStore {
    /// Open the store at `path`, creating or resetting the file if needed.
    pub fn open(path: impl Into<PathBuf>) -> Result<Self, StoreError> {
        let path = path.into();
        let doc = Self::load(&path)?;
        Ok(Self {
            path,
            current: RwLock::new(Arc::new(doc)),
        })
    }

    /// Read the document from disk.
    ///
    /// A missing file is initialized with an empty document. A file that is
    /// not a valid document is logged and overwritten with an empty one.
    pub fn load(path: &Path) -> Result<ConfigDocument, StoreError> {
        match fs::read_to_string(path) {
            Ok(contents) => match serde_json::from_str::<ConfigDocument>(&contents) {
                Ok(doc) => return Ok(doc),
                Err(e) => {
                    warn!(path = %path.display(), error = %e, "access config is corrupt, resetting");
                }
            },
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                info!(path = %path.display(), "no access config found, creating empty one");
            }
            Err(source) => {
                return Err(StoreError::Io {
                    path: path.to_path_buf(),
                    source,
                });
            }
        }

        let doc = ConfigDocument::default();
        write_atomic(path, &doc)?;
        Ok(doc)
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Current document as seen by request handling.
    pub fn snapshot(&self) -> Arc<ConfigDocument> {
        self.current
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Persist `doc` and make it the current document.
    pub fn save(&self, doc: ConfigDocument) -> Result<(), StoreError> {
        write_atomic(&self.path, &doc)?;
        *self.current.write().unwrap_or_else(PoisonError::into_inner) = Arc::new(doc);
        Ok(())
    }

    /// Apply `f` to a copy of the current document and save the result.
    pub fn update<F>(&self, f: F) -> Result<(), StoreError>
    where
        F: FnOnce(&mut ConfigDocument),
    {
        let mut doc = (*self.snapshot()).clone();
        f(&mut doc);
        self.save(doc)
    }

    // ── Admin operations ────────────────────────────────────────────

    /// Authorize a server. Existing channel restrictions are kept.
    pub fn authorize_server(&self, server_id: &str) -> Result<(), StoreError> {
        self.update(|doc| {
            doc.servers.entry(server_id.to_string()).or_default();
        })
    }

    /// Restrict a server to `channel_id` (in addition to any channels already
    /// allowed). Authorizes the server if it wasn't yet.
    pub fn allow_channel(&self, server_id: &str, channel_id: &str) -> Result<(), StoreError> {
        self.update(|doc| {
            doc.servers
                .entry(server_id.to_string())
                .or_default()
                .like_channels
                .insert(channel_id.to_string());
        })
    }

    /// Remove one allowed channel. Returns false if it wasn't listed.
    /// Removing the last channel opens the server to all channels.
    pub fn revoke_channel(&self, server_id: &str, channel_id: &str) -> Result<bool, StoreError> {
        let mut removed = false;
        self.update(|doc| {
            if let Some(rule) = doc.servers.get_mut(server_id) {
                removed = rule.like_channels.remove(channel_id);
            }
        })?;
        Ok(removed)
    }

    /// Drop a server's authorization entirely. Returns false if it wasn't
    /// authorized.
    pub fn revoke_server(&self, server_id: &str) -> Result<bool, StoreError> {
        let mut removed = false;
        self.update(|doc| {
            removed = doc.servers.remove(server_id).is_some();
        })?;
        Ok(removed)
    }
}

fn temp_path(path: &Path) -> PathBuf {
    let mut name = path.file_name().unwrap_or_default().to_os_string();
    name.push(".tmp");
    path.with_file_name(name)
}

/// Write `doc` next to `path` and rename it into place.
fn write_atomic(path: &Path, doc: &ConfigDocument) -> Result<(), StoreError> {
    let io_err = |source| StoreError::Io {
        path: path.to_path_buf(),
        source,
    };

    let mut buf = Vec::new();
    let formatter = serde_json::ser::PrettyFormatter::with_indent(b"    ");
    let mut ser = serde_json::Serializer::with_formatter(&mut buf, formatter);
    doc.serialize(&mut ser)?;

    if let Some(parent) = path.parent()
        && !parent.as_os_str().is_empty()
    {
        fs::create_dir_all(parent).map_err(io_err)?;
    }

    let tmp = temp_path(path);
    let mut file = fs::File::create(&tmp).map_err(io_err)?;
    file.write_all(&buf).map_err(io_err)?;
    file.sync_all().map_err(io_err)?;
    drop(file);

    fs::rename(&tmp, path).map_err(io_err)
}
