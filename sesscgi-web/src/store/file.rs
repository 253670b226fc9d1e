//! One file per session token under a root directory

use async_trait::async_trait;
use sesscgi_core::{storage_error, SessionResult, SessionStore, SessionToken};
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use tokio::fs;
use tracing::debug;

const COMPONENT: &str = "file_store";

/// File-backed session store.
///
/// The token is the file name. Writes go to a dot-prefixed temp file in the
/// same directory and are renamed into place, so a reader never observes a
/// partially written value. Temp names cannot collide with tokens because
/// tokens never contain `.`.
#[derive(Debug, Clone)]
pub struct FileSessionStore {
    root: PathBuf,
}

impl FileSessionStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn slot_path(&self, token: &SessionToken) -> PathBuf {
        self.root.join(token.as_str())
    }

    fn temp_path(&self, token: &SessionToken) -> PathBuf {
        self.root.join(format!(
            ".{}.{}.tmp",
            token,
            uuid::Uuid::new_v4().simple()
        ))
    }
}

#[async_trait]
impl SessionStore for FileSessionStore {
    async fn read(&self, token: &SessionToken) -> SessionResult<Option<String>> {
        let path = self.slot_path(token);

        match fs::read(&path).await {
            Ok(bytes) if bytes.is_empty() => Ok(None),
            Ok(bytes) => Ok(Some(String::from_utf8_lossy(&bytes).into_owned())),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(e) => Err(storage_error!(
                format!("Failed to read session file {}: {}", path.display(), e),
                COMPONENT,
                e
            )),
        }
    }

    async fn write(&self, token: &SessionToken, value: &str) -> SessionResult<()> {
        fs::create_dir_all(&self.root).await.map_err(|e| {
            storage_error!(
                format!(
                    "Failed to create session directory {}: {}",
                    self.root.display(),
                    e
                ),
                COMPONENT,
                e
            )
        })?;

        let path = self.slot_path(token);
        let temp = self.temp_path(token);

        if let Err(e) = fs::write(&temp, value.as_bytes()).await {
            let _ = fs::remove_file(&temp).await;
            return Err(storage_error!(
                format!("Failed to write temporary session file {}: {}", temp.display(), e),
                COMPONENT,
                e
            ));
        }

        // owner-only before the record becomes visible under its token
        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            let mode = std::fs::Permissions::from_mode(0o600);
            if let Err(e) = fs::set_permissions(&temp, mode).await {
                let _ = fs::remove_file(&temp).await;
                return Err(storage_error!(
                    format!("Failed to restrict session file {}: {}", temp.display(), e),
                    COMPONENT,
                    e
                ));
            }
        }

        if let Err(e) = fs::rename(&temp, &path).await {
            let _ = fs::remove_file(&temp).await;
            return Err(storage_error!(
                format!("Failed to move session file into place {}: {}", path.display(), e),
                COMPONENT,
                e
            ));
        }

        debug!(path = %path.display(), bytes = value.len(), "Session record written");
        Ok(())
    }

    async fn delete(&self, token: &SessionToken) -> SessionResult<()> {
        let path = self.slot_path(token);

        match fs::remove_file(&path).await {
            Ok(()) => {
                debug!(path = %path.display(), "Session record removed");
                Ok(())
            }
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
            Err(e) => Err(storage_error!(
                format!("Failed to remove session file {}: {}", path.display(), e),
                COMPONENT,
                e
            )),
        }
    }

    fn backend_name(&self) -> &'static str {
        "file"
    }
}
