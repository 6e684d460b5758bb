//! Local-filesystem storage rooted at a configured directory.
//!
//! Containers map to top-level directories under the root; paths within a
//! container may carry subdirectories (`<adventure>/Recap.md`). Path
//! segments are validated so a crafted path cannot escape the root.

use crate::errors::EngineError;
use crate::storage::FileStorage;
use async_trait::async_trait;
use std::path::{Component, Path, PathBuf};

pub struct LocalStorage {
    root: PathBuf,
}

impl LocalStorage {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    fn resolve(&self, container: &str, path: &str) -> Result<PathBuf, EngineError> {
        let relative = Path::new(container).join(path);
        for component in relative.components() {
            match component {
                Component::Normal(_) => {}
                _ => {
                    return Err(EngineError::Storage(format!(
                        "invalid storage path '{}/{}'",
                        container, path
                    )))
                }
            }
        }
        Ok(self.root.join(relative))
    }
}

#[async_trait]
impl FileStorage for LocalStorage {
    async fn load_text_or_default(
        &self,
        container: &str,
        path: &str,
    ) -> Result<Option<String>, EngineError> {
        let full_path = self.resolve(container, path)?;
        match tokio::fs::read_to_string(&full_path).await {
            Ok(text) => Ok(Some(text)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(EngineError::Storage(format!(
                "failed to read {}: {}",
                full_path.display(),
                e
            ))),
        }
    }

    async fn save_text(
        &self,
        container: &str,
        path: &str,
        text: &str,
    ) -> Result<(), EngineError> {
        let full_path = self.resolve(container, path)?;
        if let Some(parent) = full_path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }
        tokio::fs::write(&full_path, text).await?;
        Ok(())
    }
}
