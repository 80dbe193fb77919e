//! Local filesystem implementation of the `FileReader` port.

use std::path::Path;

use anyhow::{Context, Result};

use crate::application::ports::FileReader;

/// Reads project files straight from the local filesystem.
pub struct LocalFileReader;

impl FileReader for LocalFileReader {
    async fn read(&self, path: &Path) -> Result<Vec<u8>> {
        tokio::fs::read(path)
            .await
            .with_context(|| format!("reading {}", path.display()))
    }
}
