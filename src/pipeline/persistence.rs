//! Flat-file storage for finished pages.
//!
//! Each page is written to its own pretty-printed JSON file. Writes are
//! independent: a failure on one page leaves earlier files on disk.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use tokio::fs;
use tokio::io::AsyncWriteExt;

use crate::agents::{AgentError, AgentResult};
use crate::models::{Page, PageKind};

/// Record of one page file on disk.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WrittenPage {
    pub kind: PageKind,
    pub path: PathBuf,
    /// Length of the file in bytes.
    pub bytes: usize,
    /// Hex-encoded SHA-256 of the file contents.
    pub sha256: String,
}

/// Hex SHA-256 of `content`.
pub fn content_digest(content: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(content);
    hex::encode(hasher.finalize())
}

/// Writes pages into one output directory.
#[derive(Debug, Clone)]
pub struct PageStore {
    base_path: PathBuf,
}

impl PageStore {
    pub fn new(base_path: impl Into<PathBuf>) -> Self {
        Self {
            base_path: base_path.into(),
        }
    }

    pub fn base_path(&self) -> &Path {
        &self.base_path
    }

    /// Where a page of `kind` is stored.
    pub fn page_path(&self, kind: PageKind) -> PathBuf {
        self.base_path.join(kind.file_name())
    }

    async fn ensure_directory(&self) -> AgentResult<()> {
        fs::create_dir_all(&self.base_path)
            .await
            .map_err(|source| AgentError::Persistence {
                path: self.base_path.clone(),
                source,
            })
    }

    /// Serializes and writes one page, replacing any previous file.
    pub async fn save(&self, page: &Page) -> AgentResult<WrittenPage> {
        self.ensure_directory().await?;

        let path = self.page_path(page.kind());
        let json = serde_json::to_string_pretty(page)?;

        let persistence = |source| AgentError::Persistence {
            path: path.clone(),
            source,
        };
        let mut file = fs::File::create(&path).await.map_err(persistence)?;
        file.write_all(json.as_bytes()).await.map_err(persistence)?;
        file.sync_all().await.map_err(persistence)?;

        Ok(WrittenPage {
            kind: page.kind(),
            bytes: json.len(),
            sha256: content_digest(json.as_bytes()),
            path,
        })
    }

    /// Reads a previously written page back.
    pub async fn load(&self, kind: PageKind) -> AgentResult<Page> {
        let path = self.page_path(kind);
        let contents = fs::read_to_string(&path)
            .await
            .map_err(|source| AgentError::Persistence { path, source })?;
        Ok(serde_json::from_str(&contents)?)
    }
}
