//! Persistent storage abstraction for adventure artifacts and user records.
//!
//! The engine treats everything it loads as opaque text blobs addressed by
//! a container name and a path within it. Missing artifacts are a normal
//! outcome (`Ok(None)`), not an error; callers decide whether absence is
//! fatal.

use crate::errors::EngineError;
use async_trait::async_trait;

pub mod local;

pub use local::LocalStorage;

#[async_trait]
pub trait FileStorage: Send + Sync {
    /// Load a text blob, returning `None` when it does not exist.
    async fn load_text_or_default(
        &self,
        container: &str,
        path: &str,
    ) -> Result<Option<String>, EngineError>;

    /// Write a text blob, creating the container/path as needed.
    async fn save_text(
        &self,
        container: &str,
        path: &str,
        text: &str,
    ) -> Result<(), EngineError>;
}
