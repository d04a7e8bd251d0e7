use std::path::{Path, PathBuf};

use axum::{
    body::Bytes,
    http::{HeaderMap, header::HOST},
};
use tracing::{debug, warn};
use uuid::Uuid;

use crate::error::AppResult;

pub const ACTORS_CONTAINER: &str = "actors";
pub const MOVIES_CONTAINER: &str = "movies";

/// An image received in a multipart form.
#[derive(Clone, Debug)]
pub struct UploadedFile {
    pub file_name: String,
    pub bytes: Bytes,
}

/// Stores uploads under `root/{container}/` and hands out public URLs for them.
///
/// The same root is mounted as the static file fallback of the router.
#[derive(Clone, Debug)]
pub struct FileStorage {
    root: PathBuf,
}

impl FileStorage {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Writes `file` under a fresh name, keeping its extension.
    pub async fn store(
        &self,
        container: &str,
        file: &UploadedFile,
        base_url: &str,
    ) -> AppResult<String> {
        let name = match Path::new(&file.file_name).extension().and_then(|e| e.to_str()) {
            Some(ext) => format!("{}.{}", Uuid::new_v4(), ext.to_ascii_lowercase()),
            None => Uuid::new_v4().to_string(),
        };

        let folder = self.root.join(container);
        tokio::fs::create_dir_all(&folder).await?;
        tokio::fs::write(folder.join(&name), &file.bytes).await?;

        let url = format!("{}/{}/{}", base_url.trim_end_matches('/'), container, name);
        debug!(container, bytes = file.bytes.len(), url = %url, "file stored");
        Ok(url)
    }

    /// Removes the file a stored URL points to. Blank references and files
    /// that are already gone are ignored.
    pub async fn delete(&self, url: Option<&str>, container: &str) -> AppResult<()> {
        let Some(url) = url.map(str::trim).filter(|u| !u.is_empty()) else {
            return Ok(());
        };
        let Some(name) = url.rsplit('/').next().filter(|n| !n.is_empty() && *n != "..") else {
            return Ok(());
        };

        let path = self.root.join(container).join(name);
        match tokio::fs::remove_file(&path).await {
            Ok(()) => {
                debug!(container, path = %path.display(), "file deleted");
                Ok(())
            },
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => {
                warn!(container, path = %path.display(), "file to delete was already gone");
                Ok(())
            },
            Err(err) => Err(err.into()),
        }
    }
}

/// Base URL for stored files: the configured public URL, or the request host.
pub fn public_base_url(configured: Option<&str>, headers: &HeaderMap) -> String {
    if let Some(url) = configured {
        return url.to_string();
    }
    let host = headers.get(HOST).and_then(|h| h.to_str().ok()).unwrap_or("localhost");
    format!("http://{host}")
}
