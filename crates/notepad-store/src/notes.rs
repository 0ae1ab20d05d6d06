//! Per-notepad text content, one plain-text file per notepad id.

use std::io::ErrorKind;
use std::path::PathBuf;

use tokio::fs;

use crate::error::Result;
use crate::fs::{atomic_write, validate_id};

/// Plain-text note bodies stored as `<data_dir>/<id>.txt`.
///
/// The store is keyed independently of the registry: any valid id can be
/// read or written whether or not a notepad with that id exists.
#[derive(Debug, Clone)]
pub struct NoteStore {
    data_dir: PathBuf,
}

impl NoteStore {
    pub fn new(data_dir: PathBuf) -> Self {
        Self { data_dir }
    }

    fn note_path(&self, id: &str) -> Result<PathBuf> {
        validate_id(id)?;
        Ok(self.data_dir.join(format!("{}.txt", id)))
    }

    /// Read the content for `id`. A note that was never written reads as empty.
    pub async fn read(&self, id: &str) -> Result<String> {
        let path = self.note_path(id)?;
        match fs::read_to_string(&path).await {
            Ok(content) => Ok(content),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(String::new()),
            Err(e) => Err(e.into()),
        }
    }

    /// Replace the content for `id`, creating the file if needed.
    pub async fn write(&self, id: &str, content: &str) -> Result<()> {
        let path = self.note_path(id)?;
        fs::create_dir_all(&self.data_dir).await?;
        atomic_write(&path, content).await?;
        Ok(())
    }

    /// Create an empty file for `id` unless one already exists.
    pub async fn touch(&self, id: &str) -> Result<()> {
        let path = self.note_path(id)?;
        fs::create_dir_all(&self.data_dir).await?;
        fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(&path)
            .await?;
        Ok(())
    }

    /// Remove the content for `id`. Removing a missing note is not an error.
    pub async fn remove(&self, id: &str) -> Result<()> {
        let path = self.note_path(id)?;
        match fs::remove_file(&path).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }
}
