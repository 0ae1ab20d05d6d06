//! Filesystem helpers shared by the registry and the note store.

use std::path::Path;

use rand::Rng;
use tokio::fs;
use tokio::io::AsyncWriteExt;

use crate::error::{Result, StoreError};

/// Longest id accepted as a file name stem.
const MAX_ID_LEN: usize = 128;

/// Check that a notepad id is safe to use as a file name inside the data directory.
///
/// Only ASCII alphanumerics, `-` and `_` are accepted, which rules out path
/// separators, `..` and hidden files.
pub fn validate_id(id: &str) -> Result<()> {
    let reason = if id.is_empty() {
        "id is empty"
    } else if id.len() > MAX_ID_LEN {
        "id is too long"
    } else if !id
        .bytes()
        .all(|b| b.is_ascii_alphanumeric() || b == b'-' || b == b'_')
    {
        "id may only contain letters, digits, '-' and '_'"
    } else {
        return Ok(());
    };

    Err(StoreError::InvalidId {
        id: id.to_string(),
        reason,
    })
}

/// Generate a random hex string for temp file names.
fn random_hex() -> String {
    let bytes: [u8; 8] = rand::rng().random();
    hex::encode(bytes)
}

/// Write `content` to a fresh file and flush it to disk.
async fn write_synced(path: &Path, content: &str) -> std::io::Result<()> {
    let mut file = fs::File::create(path).await?;
    file.write_all(content.as_bytes()).await?;
    file.sync_all().await
}

/// Durable atomic write: synced temp file, then rename over the target.
///
/// The target is either fully replaced or left untouched, and the new
/// content is on disk before the rename makes it visible.
pub async fn atomic_write(path: &Path, content: &str) -> std::io::Result<()> {
    let temp_path = path.with_extension(format!("{}.tmp", random_hex()));

    let result = match write_synced(&temp_path, content).await {
        Ok(()) => fs::rename(&temp_path, path).await,
        Err(e) => Err(e),
    };
    if result.is_err() {
        let _ = fs::remove_file(&temp_path).await;
    }
    result
}
