//! Content-addressed evidence vault
//!
//! Uploaded files are stored under the uploads directory as
//! `sha256-<hex>[.<ext>]`. The client's filename only contributes a short
//! alphanumeric extension, so it can never steer the write path. Identical
//! uploads converge on the same key.

use std::path::{Path, PathBuf};

use bytes::Bytes;
use sha2::{Digest, Sha256};
use tracing::{debug, info};

use crate::forms::UploadedFile;
use crate::types::HrmError;

/// Public URL prefix under which stored files are served
pub const EVIDENCE_ROUTE: &str = "/evidence/";

const MAX_EXTENSION_LEN: usize = 8;

/// A file persisted in the vault
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredEvidence {
    pub key: String,
    pub url: String,
    pub size: usize,
}

/// Evidence storage rooted at the uploads directory
#[derive(Debug, Clone)]
pub struct EvidenceVault {
    root: PathBuf,
}

impl EvidenceVault {
    /// Open the vault, creating the directory when needed
    pub async fn open(root: impl Into<PathBuf>) -> Result<Self, HrmError> {
        let root = root.into();
        tokio::fs::create_dir_all(&root).await.map_err(|e| {
            HrmError::Storage(format!("Cannot create uploads dir {}: {}", root.display(), e))
        })?;
        info!(path = %root.display(), "Evidence vault ready");
        Ok(Self { root })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Vault key for a file's content and original name
    pub fn key_for(data: &[u8], filename: Option<&str>) -> String {
        let mut hasher = Sha256::new();
        hasher.update(data);
        let digest = format!("sha256-{:x}", hasher.finalize());

        match filename.and_then(safe_extension) {
            Some(ext) => format!("{}.{}", digest, ext),
            None => digest,
        }
    }

    /// Whether a string has the shape of a vault key
    pub fn is_valid_key(key: &str) -> bool {
        let (stem, ext) = match key.split_once('.') {
            Some((stem, ext)) => (stem, Some(ext)),
            None => (key, None),
        };
        let hex_ok = stem
            .strip_prefix("sha256-")
            .map(|h| h.len() == 64 && h.bytes().all(|b| matches!(b, b'0'..=b'9' | b'a'..=b'f')))
            .unwrap_or(false);
        let ext_ok = ext.map_or(true, |e| safe_extension_str(e).is_some());
        hex_ok && ext_ok
    }

    /// Persist an upload and return where it can be fetched
    pub async fn store(&self, file: &UploadedFile) -> Result<StoredEvidence, HrmError> {
        let key = Self::key_for(&file.data, file.filename.as_deref());
        let target = self.root.join(&key);

        if tokio::fs::try_exists(&target).await? {
            debug!(key = %key, "Evidence already stored");
        } else {
            // Unique temp name so concurrent writers never share a file
            let temp = self.root.join(format!(".tmp-{}", uuid::Uuid::new_v4()));
            tokio::fs::write(&temp, &file.data).await?;
            if let Err(e) = tokio::fs::rename(&temp, &target).await {
                let _ = tokio::fs::remove_file(&temp).await;
                return Err(e.into());
            }
            info!(key = %key, size = file.data.len(), "Stored evidence");
        }

        Ok(StoredEvidence {
            url: format!("{}{}", EVIDENCE_ROUTE, key),
            key,
            size: file.data.len(),
        })
    }

    /// Read a stored file; `None` when absent
    pub async fn load(&self, key: &str) -> Result<Option<Bytes>, HrmError> {
        if !Self::is_valid_key(key) {
            return Err(HrmError::BadRequest(format!("Invalid evidence key: {}", key)));
        }
        match tokio::fs::read(self.root.join(key)).await {
            Ok(data) => Ok(Some(Bytes::from(data))),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }
}

/// MIME type to serve a key with, from its extension
pub fn content_type_for(key: &str) -> &'static str {
    let ext = key.rsplit_once('.').map(|(_, e)| e).unwrap_or_default();
    match ext {
        "png" => "image/png",
        "jpg" | "jpeg" => "image/jpeg",
        "gif" => "image/gif",
        "webp" => "image/webp",
        "pdf" => "application/pdf",
        "txt" => "text/plain; charset=utf-8",
        "mp4" => "video/mp4",
        "mp3" => "audio/mpeg",
        "wav" => "audio/wav",
        _ => "application/octet-stream",
    }
}

fn safe_extension(filename: &str) -> Option<String> {
    let (_, ext) = filename.rsplit_once('.')?;
    safe_extension_str(ext).map(|e| e.to_ascii_lowercase())
}

fn safe_extension_str(ext: &str) -> Option<&str> {
    let ok = !ext.is_empty()
        && ext.len() <= MAX_EXTENSION_LEN
        && ext.bytes().all(|b| b.is_ascii_alphanumeric());
    ok.then_some(ext)
}
