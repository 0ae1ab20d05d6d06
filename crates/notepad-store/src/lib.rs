//! notepad-store: file-backed notepad registry and note content.
//!
//! All state lives in one data directory:
//! - `notepads.json` - the registry (ordered `{id, name}` entries)
//! - `<id>.txt` - the plain-text body of each notepad

pub mod error;
pub mod fs;
pub mod notes;
pub mod registry;

pub use error::{Result, StoreError};
pub use notes::NoteStore;
pub use registry::{Notepad, NotepadRegistry, Registry, DEFAULT_NOTEPAD_ID, DEFAULT_NOTEPAD_NAME};
